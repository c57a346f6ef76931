use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::{AppJson, Result};
use crate::store::{Store, models::CartItem};
use crate::AppState;

/// Body for adding a line to a cart or wishlist.
#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    pub title: String,
    pub image: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct TitleRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Adds one unit of the item, bumping the existing line for its title.
pub async fn add_to_cart(store: &dyn Store, email: &str, item: ItemRequest) -> Result<()> {
    let line = CartItem {
        title: item.title,
        image: item.image,
        price: item.price,
        quantity: 1,
    };
    store.add_cart_item(email, &line).await?;

    tracing::info!("Added {} to cart of {}", line.title, email);
    Ok(())
}

pub async fn get_cart(store: &dyn Store, email: &str) -> Result<Vec<CartItem>> {
    Ok(store
        .load_cart(email)
        .await?
        .map(|cart| cart.items)
        .unwrap_or_default())
}

/// Returns whether anything was dropped. A missing cart removes nothing.
pub async fn remove_from_cart(store: &dyn Store, email: &str, title: &str) -> Result<bool> {
    let removed = store.pull_cart_title(email, title).await?;
    if removed {
        tracing::info!("Removed {} from cart of {}", title, email);
    }
    Ok(removed)
}

pub async fn clear_cart(store: &dyn Store, email: &str) -> Result<bool> {
    let existed = store.delete_cart(email).await?;
    tracing::info!("Cleared cart of {} (existed: {})", email, existed);
    Ok(existed)
}

pub async fn add_to_cart_handler(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<ItemRequest>,
) -> Result<Json<MessageResponse>> {
    add_to_cart(state.store.as_ref(), &user.email, payload).await?;
    Ok(Json(MessageResponse {
        message: "Item added to cart",
    }))
}

pub async fn get_cart_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<CartItem>>> {
    Ok(Json(get_cart(state.store.as_ref(), &user.email).await?))
}

pub async fn remove_from_cart_handler(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<TitleRequest>,
) -> Result<Json<MessageResponse>> {
    remove_from_cart(state.store.as_ref(), &user.email, &payload.title).await?;
    Ok(Json(MessageResponse {
        message: "Item removed from cart",
    }))
}

pub async fn clear_cart_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MessageResponse>> {
    clear_cart(state.store.as_ref(), &user.email).await?;
    Ok(Json(MessageResponse {
        message: "Cart cleared",
    }))
}
