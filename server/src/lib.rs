pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod health;
pub mod purchase;
pub mod routes;
pub mod store;
pub mod wishlist;

use std::sync::Arc;

use auth::TokenVerifier;
use store::Store;

/// Shared by every handler; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub verifier: Arc<TokenVerifier>,
}
