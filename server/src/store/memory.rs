use std::collections::HashMap;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::Store;
use super::models::*;
use crate::error::Result;

/// Volatile store used for local runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

#[derive(Default)]
struct Collections {
    images: Vec<Image>,
    courses: Vec<Course>,
    carts: HashMap<String, Cart>,
    wishlists: HashMap<String, Wishlist>,
    owned_courses: HashMap<String, OwnedCourses>,
}

fn newest_first<T: Clone>(documents: &[T], limit: i64) -> Vec<T> {
    let limit = usize::try_from(limit).unwrap_or(0);
    documents.iter().rev().take(limit).cloned().collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_image(&self, image: &Image) -> Result<ObjectId> {
        let id = ObjectId::new();
        let mut stored = image.clone();
        stored.id = Some(id);
        self.inner.write().await.images.push(stored);
        Ok(id)
    }

    async fn insert_course(&self, course: &Course) -> Result<ObjectId> {
        let id = ObjectId::new();
        let mut stored = course.clone();
        stored.id = Some(id);
        self.inner.write().await.courses.push(stored);
        Ok(id)
    }

    async fn latest_images(&self, limit: i64) -> Result<Vec<Image>> {
        Ok(newest_first(&self.inner.read().await.images, limit))
    }

    async fn latest_courses(&self, limit: i64) -> Result<Vec<Course>> {
        Ok(newest_first(&self.inner.read().await.courses, limit))
    }

    async fn courses_by_title(&self, title: &str) -> Result<Vec<Course>> {
        let inner = self.inner.read().await;
        Ok(inner
            .courses
            .iter()
            .filter(|course| course.title.as_deref() == Some(title))
            .cloned()
            .collect())
    }

    async fn load_cart(&self, email: &str) -> Result<Option<Cart>> {
        Ok(self.inner.read().await.carts.get(email).cloned())
    }

    async fn add_cart_item(&self, email: &str, item: &CartItem) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .carts
            .entry(email.to_string())
            .or_insert_with(|| Cart::new(email))
            .add_item(item.clone());
        Ok(())
    }

    async fn pull_cart_title(&self, email: &str, title: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .carts
            .get_mut(email)
            .is_some_and(|cart| cart.remove_title(title) > 0))
    }

    async fn delete_cart(&self, email: &str) -> Result<bool> {
        Ok(self.inner.write().await.carts.remove(email).is_some())
    }

    async fn load_wishlist(&self, email: &str) -> Result<Option<Wishlist>> {
        Ok(self.inner.read().await.wishlists.get(email).cloned())
    }

    async fn add_wishlist_item(&self, email: &str, item: &WishlistItem) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .wishlists
            .entry(email.to_string())
            .or_insert_with(|| Wishlist::new(email))
            .add_item(item.clone()))
    }

    async fn pull_wishlist_title(&self, email: &str, title: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .wishlists
            .get_mut(email)
            .is_some_and(|wishlist| wishlist.remove_title(title) > 0))
    }

    async fn delete_wishlist(&self, email: &str) -> Result<bool> {
        Ok(self.inner.write().await.wishlists.remove(email).is_some())
    }

    async fn load_owned_courses(&self, email: &str) -> Result<Option<OwnedCourses>> {
        Ok(self.inner.read().await.owned_courses.get(email).cloned())
    }

    async fn add_owned_courses(&self, email: &str, courses: &[OwnedCourse]) -> Result<usize> {
        if courses.is_empty() {
            return Ok(0);
        }
        let mut inner = self.inner.write().await;
        let owned = inner
            .owned_courses
            .entry(email.to_string())
            .or_insert_with(|| OwnedCourses::new(email));
        Ok(courses
            .iter()
            .filter(|course| owned.insert((*course).clone()))
            .count())
    }
}
