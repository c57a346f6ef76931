//! Test support shared by the store backends and the operation modules.

use async_trait::async_trait;
use mongodb::bson::{DateTime, oid::ObjectId};

use super::Store;
use super::memory::MemoryStore;
use super::models::*;
use crate::error::Result;

/// A [`MemoryStore`] that hands control back to the runtime before every
/// call, so operations joined on one task interleave the way concurrent
/// requests do against a real database.
#[derive(Default)]
pub(crate) struct YieldingStore {
    inner: MemoryStore,
}

#[async_trait]
impl Store for YieldingStore {
    async fn ping(&self) -> Result<()> {
        tokio::task::yield_now().await;
        self.inner.ping().await
    }

    async fn insert_image(&self, image: &Image) -> Result<ObjectId> {
        tokio::task::yield_now().await;
        self.inner.insert_image(image).await
    }

    async fn insert_course(&self, course: &Course) -> Result<ObjectId> {
        tokio::task::yield_now().await;
        self.inner.insert_course(course).await
    }

    async fn latest_images(&self, limit: i64) -> Result<Vec<Image>> {
        tokio::task::yield_now().await;
        self.inner.latest_images(limit).await
    }

    async fn latest_courses(&self, limit: i64) -> Result<Vec<Course>> {
        tokio::task::yield_now().await;
        self.inner.latest_courses(limit).await
    }

    async fn courses_by_title(&self, title: &str) -> Result<Vec<Course>> {
        tokio::task::yield_now().await;
        self.inner.courses_by_title(title).await
    }

    async fn load_cart(&self, email: &str) -> Result<Option<Cart>> {
        tokio::task::yield_now().await;
        self.inner.load_cart(email).await
    }

    async fn add_cart_item(&self, email: &str, item: &CartItem) -> Result<()> {
        tokio::task::yield_now().await;
        self.inner.add_cart_item(email, item).await
    }

    async fn pull_cart_title(&self, email: &str, title: &str) -> Result<bool> {
        tokio::task::yield_now().await;
        self.inner.pull_cart_title(email, title).await
    }

    async fn delete_cart(&self, email: &str) -> Result<bool> {
        tokio::task::yield_now().await;
        self.inner.delete_cart(email).await
    }

    async fn load_wishlist(&self, email: &str) -> Result<Option<Wishlist>> {
        tokio::task::yield_now().await;
        self.inner.load_wishlist(email).await
    }

    async fn add_wishlist_item(&self, email: &str, item: &WishlistItem) -> Result<bool> {
        tokio::task::yield_now().await;
        self.inner.add_wishlist_item(email, item).await
    }

    async fn pull_wishlist_title(&self, email: &str, title: &str) -> Result<bool> {
        tokio::task::yield_now().await;
        self.inner.pull_wishlist_title(email, title).await
    }

    async fn delete_wishlist(&self, email: &str) -> Result<bool> {
        tokio::task::yield_now().await;
        self.inner.delete_wishlist(email).await
    }

    async fn load_owned_courses(&self, email: &str) -> Result<Option<OwnedCourses>> {
        tokio::task::yield_now().await;
        self.inner.load_owned_courses(email).await
    }

    async fn add_owned_courses(&self, email: &str, courses: &[OwnedCourse]) -> Result<usize> {
        tokio::task::yield_now().await;
        self.inner.add_owned_courses(email, courses).await
    }
}

pub(crate) fn cart_line(title: &str) -> CartItem {
    CartItem {
        title: title.to_string(),
        image: Some(format!("{}.png", title.to_lowercase())),
        price: Some(20.0),
        quantity: 1,
    }
}

pub(crate) fn owned_course(title: &str) -> OwnedCourse {
    OwnedCourse {
        title: title.to_string(),
        image: None,
        price: Some(10.0),
        purchased_at: DateTime::now(),
    }
}

fn titles<'a>(entries: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    entries.collect()
}

/// Repeat adds bump one line; other titles keep their own lines; pulls remove
/// exactly the named title.
pub(crate) async fn cart_lines_are_merged_by_title(store: &dyn Store) {
    let email = "cart@example.com";
    store.add_cart_item(email, &cart_line("Rust")).await.unwrap();
    store.add_cart_item(email, &cart_line("Go")).await.unwrap();
    store.add_cart_item(email, &cart_line("Rust")).await.unwrap();

    let cart = store.load_cart(email).await.unwrap().unwrap();
    assert_eq!(
        titles(cart.items.iter().map(|line| line.title.as_str())),
        ["Rust", "Go"]
    );
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(cart.items[1].quantity, 1);

    assert!(store.pull_cart_title(email, "Rust").await.unwrap());
    assert!(!store.pull_cart_title(email, "Rust").await.unwrap());
    assert!(!store.pull_cart_title("nobody@example.com", "Go").await.unwrap());

    let cart = store.load_cart(email).await.unwrap().unwrap();
    assert_eq!(titles(cart.items.iter().map(|line| line.title.as_str())), ["Go"]);
}

/// Wishlist entries are unique by title even when the rest of the entry differs.
pub(crate) async fn wishlist_set_insert_by_title(store: &dyn Store) {
    let email = "wish@example.com";
    let item = WishlistItem {
        title: "Rust".into(),
        image: None,
        price: Some(20.0),
    };
    assert!(store.add_wishlist_item(email, &item).await.unwrap());

    let repriced = WishlistItem {
        price: Some(25.0),
        ..item.clone()
    };
    assert!(!store.add_wishlist_item(email, &repriced).await.unwrap());

    let other = WishlistItem {
        title: "Go".into(),
        ..item
    };
    assert!(store.add_wishlist_item(email, &other).await.unwrap());

    let wishlist = store.load_wishlist(email).await.unwrap().unwrap();
    assert_eq!(
        titles(wishlist.items.iter().map(|saved| saved.title.as_str())),
        ["Rust", "Go"]
    );
    assert_eq!(wishlist.items[0].price, Some(20.0));

    assert!(store.pull_wishlist_title(email, "Rust").await.unwrap());
    assert!(!store.pull_wishlist_title(email, "Rust").await.unwrap());
}

/// Owned courses are unique by title; a second purchase of the same title at a
/// later time adds nothing.
pub(crate) async fn owned_courses_set_insert_by_title(store: &dyn Store) {
    let email = "owner@example.com";
    let first = owned_course("Rust");
    assert_eq!(store.add_owned_courses(email, &[first]).await.unwrap(), 1);

    let later = OwnedCourse {
        purchased_at: DateTime::from_millis(DateTime::now().timestamp_millis() + 60_000),
        ..owned_course("Rust")
    };
    let added = store
        .add_owned_courses(email, &[later, owned_course("Go")])
        .await
        .unwrap();
    assert_eq!(added, 1);
    assert_eq!(store.add_owned_courses(email, &[]).await.unwrap(), 0);

    let owned = store.load_owned_courses(email).await.unwrap().unwrap();
    assert_eq!(
        titles(owned.courses.iter().map(|course| course.title.as_str())),
        ["Rust", "Go"]
    );
}
