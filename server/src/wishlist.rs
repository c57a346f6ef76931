use axum::{extract::State, Json};

use crate::auth::AuthUser;
use crate::cart::{ItemRequest, MessageResponse, TitleRequest};
use crate::error::{AppJson, Result};
use crate::store::{Store, models::WishlistItem};
use crate::AppState;

/// Returns false when the title was already on the wishlist.
pub async fn add_to_wishlist(store: &dyn Store, email: &str, item: ItemRequest) -> Result<bool> {
    let entry = WishlistItem {
        title: item.title,
        image: item.image,
        price: item.price,
    };
    let added = store.add_wishlist_item(email, &entry).await?;
    if added {
        tracing::info!("Wishlist of {}: saved {}", email, entry.title);
    }
    Ok(added)
}

pub async fn get_wishlist(store: &dyn Store, email: &str) -> Result<Vec<WishlistItem>> {
    Ok(store
        .load_wishlist(email)
        .await?
        .map(|wishlist| wishlist.items)
        .unwrap_or_default())
}

pub async fn remove_from_wishlist(store: &dyn Store, email: &str, title: &str) -> Result<bool> {
    store.pull_wishlist_title(email, title).await
}

pub async fn clear_wishlist(store: &dyn Store, email: &str) -> Result<bool> {
    store.delete_wishlist(email).await
}

pub async fn add_to_wishlist_handler(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<ItemRequest>,
) -> Result<Json<MessageResponse>> {
    let message = if add_to_wishlist(state.store.as_ref(), &user.email, payload).await? {
        "Item added to wishlist"
    } else {
        "Item already in wishlist"
    };
    Ok(Json(MessageResponse { message }))
}

pub async fn get_wishlist_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<WishlistItem>>> {
    Ok(Json(get_wishlist(state.store.as_ref(), &user.email).await?))
}

pub async fn remove_from_wishlist_handler(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<TitleRequest>,
) -> Result<Json<MessageResponse>> {
    remove_from_wishlist(state.store.as_ref(), &user.email, &payload.title).await?;
    Ok(Json(MessageResponse {
        message: "Item removed from wishlist",
    }))
}

pub async fn clear_wishlist_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MessageResponse>> {
    clear_wishlist(state.store.as_ref(), &user.email).await?;
    Ok(Json(MessageResponse {
        message: "Wishlist cleared",
    }))
}
