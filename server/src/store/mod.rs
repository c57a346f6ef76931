pub mod memory;
pub mod models;
pub mod mongo;
#[cfg(test)]
pub(crate) mod testing;

use anyhow::{Context, Result};
use async_trait::async_trait;
use mongodb::{Client, Database, bson::oid::ObjectId};

use crate::error;
use models::{Cart, CartItem, Course, Image, OwnedCourse, OwnedCourses, Wishlist, WishlistItem};

/// Create MongoDB connection
pub async fn create_client(uri: &str) -> Result<Client> {
    let client = Client::with_uri_str(uri)
        .await
        .context("Failed to connect to MongoDB")?;

    // Ping to verify connection
    client
        .database("admin")
        .run_command(mongodb::bson::doc! {"ping": 1})
        .await
        .context("Failed to ping MongoDB")?;

    tracing::info!("Successfully connected to MongoDB");
    Ok(client)
}

/// Get database handle
pub fn get_database(client: &Client, db_name: &str) -> Database {
    client.database(db_name)
}

/// Persistence primitives behind every operation.
///
/// Catalog entries are append-only collections. Carts, wishlists and owned
/// courses are keyed by user email, one document each. Every per-user change
/// is a single targeted update on that document, so concurrent requests for
/// the same user never overwrite each other's lines.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> error::Result<()>;

    async fn insert_image(&self, image: &Image) -> error::Result<ObjectId>;
    async fn insert_course(&self, course: &Course) -> error::Result<ObjectId>;
    /// Newest first.
    async fn latest_images(&self, limit: i64) -> error::Result<Vec<Image>>;
    /// Newest first.
    async fn latest_courses(&self, limit: i64) -> error::Result<Vec<Course>>;
    /// Exact, case-sensitive title match.
    async fn courses_by_title(&self, title: &str) -> error::Result<Vec<Course>>;

    async fn load_cart(&self, email: &str) -> error::Result<Option<Cart>>;
    /// Increments the quantity of the line with `item.title`, or appends
    /// `item` as given, creating the cart when absent.
    async fn add_cart_item(&self, email: &str, item: &CartItem) -> error::Result<()>;
    /// Pulls every line with the title. Returns whether the cart changed.
    async fn pull_cart_title(&self, email: &str, title: &str) -> error::Result<bool>;
    async fn delete_cart(&self, email: &str) -> error::Result<bool>;

    async fn load_wishlist(&self, email: &str) -> error::Result<Option<Wishlist>>;
    /// Set-insert by title, creating the wishlist when absent. Returns false
    /// when the title was already saved.
    async fn add_wishlist_item(&self, email: &str, item: &WishlistItem) -> error::Result<bool>;
    async fn pull_wishlist_title(&self, email: &str, title: &str) -> error::Result<bool>;
    async fn delete_wishlist(&self, email: &str) -> error::Result<bool>;

    async fn load_owned_courses(&self, email: &str) -> error::Result<Option<OwnedCourses>>;
    /// Set-insert by title into the owner's document, creating it when
    /// absent. Returns how many of `courses` were actually added.
    async fn add_owned_courses(&self, email: &str, courses: &[OwnedCourse])
    -> error::Result<usize>;
}
