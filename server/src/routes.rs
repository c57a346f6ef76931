use axum::{
    http::Uri,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::AppError;
use crate::health::health_check;
use crate::{cart, catalog, purchase, wishlist, AppState};

pub fn app(state: AppState, cors_allow_any: bool) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .merge(catalog_routes())
        .merge(cart_routes())
        .merge(purchase_routes())
        .merge(wishlist_routes())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_allow_any {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/carousel", post(catalog::carousel_add_handler))
        .route("/courses", post(catalog::courses_add_handler))
        .route("/courses/latest", get(catalog::latest_courses_handler))
        .route("/courses/title/{title}", get(catalog::courses_by_title_handler))
        .route("/images/latest", get(catalog::latest_images_handler))
}

// Everything below requires a bearer token via the AuthUser extractor
fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::get_cart_handler))
        .route("/cart/add", post(cart::add_to_cart_handler))
        .route("/cart/remove", post(cart::remove_from_cart_handler))
        .route("/cart/clear", delete(cart::clear_cart_handler))
}

fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/purchase/single", post(purchase::purchase_single_handler))
        .route("/purchase/cart", post(purchase::purchase_cart_handler))
        .route("/mycourses", post(purchase::owned_courses_handler))
}

fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/wishlist", get(wishlist::get_wishlist_handler))
        .route("/wishlist/add", post(wishlist::add_to_wishlist_handler))
        .route("/wishlist/remove", post(wishlist::remove_from_wishlist_handler))
        .route("/wishlist/clear", delete(wishlist::clear_wishlist_handler))
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
