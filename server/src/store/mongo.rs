use async_trait::async_trait;
use mongodb::{
    Collection, Cursor, Database, IndexModel,
    bson::{Bson, doc, oid::ObjectId},
    options::IndexOptions,
};
use serde::de::DeserializeOwned;

use super::Store;
use super::models::*;
use crate::error::{AppError, Result, is_duplicate_key};

const IMAGES: &str = "images";
const COURSES: &str = "courses";
const CARTS: &str = "carts";
const WISHLISTS: &str = "wishlists";
const OWNED_COURSES: &str = "mycourses";

/// Rounds of conditional updates before a per-user write gives up.
const UPDATE_ATTEMPTS: usize = 3;

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn images(&self) -> Collection<Image> {
        self.db.collection::<Image>(IMAGES)
    }

    fn courses(&self) -> Collection<Course> {
        self.db.collection::<Course>(COURSES)
    }

    fn carts(&self) -> Collection<Cart> {
        self.db.collection::<Cart>(CARTS)
    }

    fn wishlists(&self) -> Collection<Wishlist> {
        self.db.collection::<Wishlist>(WISHLISTS)
    }

    fn owned_courses(&self) -> Collection<OwnedCourses> {
        self.db.collection::<OwnedCourses>(OWNED_COURSES)
    }

    /// One document per email in each per-user collection. Concurrent upserts
    /// for a new user collide on this index instead of creating twins.
    pub async fn ensure_indexes(&self) -> Result<()> {
        for name in [CARTS, WISHLISTS, OWNED_COURSES] {
            let index = IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.db
                .collection::<mongodb::bson::Document>(name)
                .create_index(index)
                .await?;
        }
        Ok(())
    }
}

fn inserted_object_id(id: Bson) -> Result<ObjectId> {
    id.as_object_id()
        .ok_or_else(|| AppError::Upstream(format!("Unexpected inserted id: {}", id)))
}

async fn collect<T>(mut cursor: Cursor<T>) -> Result<Vec<T>>
where
    T: DeserializeOwned + Send + Sync,
{
    let mut documents = Vec::new();
    while cursor.advance().await? {
        documents.push(cursor.deserialize_current()?);
    }
    Ok(documents)
}

/// Creates the owner's document holding just `entry` in `field`. Returns false
/// when the document already existed, including when a concurrent upsert won.
async fn create_with_entry<T>(
    collection: &Collection<T>,
    email: &str,
    field: &str,
    entry: &Bson,
) -> Result<bool>
where
    T: Send + Sync,
{
    let created = collection
        .update_one(
            doc! { "email": email },
            doc! { "$setOnInsert": { field: [entry.clone()] } },
        )
        .upsert(true)
        .await;
    match created {
        Ok(result) => Ok(result.upserted_id.is_some()),
        Err(err) if is_duplicate_key(&err) => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Appends `entry` to the array `field` unless an element with the same title
/// is already there. Returns false when the title was present.
async fn set_insert_by_title<T>(
    collection: &Collection<T>,
    email: &str,
    field: &str,
    title: &str,
    entry: Bson,
) -> Result<bool>
where
    T: Send + Sync,
{
    let title_path = format!("{}.title", field);
    for _ in 0..UPDATE_ATTEMPTS {
        let pushed = collection
            .update_one(
                doc! { "email": email, title_path.clone(): { "$ne": title } },
                doc! { "$push": { field: entry.clone() } },
            )
            .await?;
        if pushed.matched_count > 0 {
            return Ok(true);
        }
        if create_with_entry(collection, email, field, &entry).await? {
            return Ok(true);
        }
        let present = collection
            .count_documents(doc! { "email": email, title_path.clone(): title })
            .await?;
        if present > 0 {
            return Ok(false);
        }
    }
    Err(AppError::Conflict(format!(
        "{} of {} changed during update",
        field, email
    )))
}

async fn pull_title<T>(
    collection: &Collection<T>,
    email: &str,
    field: &str,
    title: &str,
) -> Result<bool>
where
    T: Send + Sync,
{
    let result = collection
        .update_one(
            doc! { "email": email },
            doc! { "$pull": { field: { "title": title } } },
        )
        .await?;
    Ok(result.modified_count > 0)
}

#[async_trait]
impl Store for MongoStore {
    async fn ping(&self) -> Result<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn insert_image(&self, image: &Image) -> Result<ObjectId> {
        let result = self.images().insert_one(image).await?;
        inserted_object_id(result.inserted_id)
    }

    async fn insert_course(&self, course: &Course) -> Result<ObjectId> {
        let result = self.courses().insert_one(course).await?;
        inserted_object_id(result.inserted_id)
    }

    async fn latest_images(&self, limit: i64) -> Result<Vec<Image>> {
        let cursor = self
            .images()
            .find(doc! {})
            .sort(doc! { "_id": -1 })
            .limit(limit)
            .await?;
        collect(cursor).await
    }

    async fn latest_courses(&self, limit: i64) -> Result<Vec<Course>> {
        let cursor = self
            .courses()
            .find(doc! {})
            .sort(doc! { "_id": -1 })
            .limit(limit)
            .await?;
        collect(cursor).await
    }

    async fn courses_by_title(&self, title: &str) -> Result<Vec<Course>> {
        let cursor = self.courses().find(doc! { "title": title }).await?;
        collect(cursor).await
    }

    async fn load_cart(&self, email: &str) -> Result<Option<Cart>> {
        Ok(self.carts().find_one(doc! { "email": email }).await?)
    }

    async fn add_cart_item(&self, email: &str, item: &CartItem) -> Result<()> {
        let carts = self.carts();
        let line = mongodb::bson::to_bson(item)?;
        for _ in 0..UPDATE_ATTEMPTS {
            let bumped = carts
                .update_one(
                    doc! { "email": email, "items.title": item.title.as_str() },
                    doc! { "$inc": { "items.$.quantity": 1 } },
                )
                .await?;
            if bumped.matched_count > 0 {
                return Ok(());
            }
            let pushed = carts
                .update_one(
                    doc! { "email": email, "items.title": { "$ne": item.title.as_str() } },
                    doc! { "$push": { "items": line.clone() } },
                )
                .await?;
            if pushed.matched_count > 0 {
                return Ok(());
            }
            if create_with_entry(&carts, email, "items", &line).await? {
                return Ok(());
            }
        }
        Err(AppError::Conflict(format!(
            "Cart of {} changed during update",
            email
        )))
    }

    async fn pull_cart_title(&self, email: &str, title: &str) -> Result<bool> {
        pull_title(&self.carts(), email, "items", title).await
    }

    async fn delete_cart(&self, email: &str) -> Result<bool> {
        let result = self.carts().delete_one(doc! { "email": email }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn load_wishlist(&self, email: &str) -> Result<Option<Wishlist>> {
        Ok(self.wishlists().find_one(doc! { "email": email }).await?)
    }

    async fn add_wishlist_item(&self, email: &str, item: &WishlistItem) -> Result<bool> {
        let entry = mongodb::bson::to_bson(item)?;
        set_insert_by_title(&self.wishlists(), email, "items", &item.title, entry).await
    }

    async fn pull_wishlist_title(&self, email: &str, title: &str) -> Result<bool> {
        pull_title(&self.wishlists(), email, "items", title).await
    }

    async fn delete_wishlist(&self, email: &str) -> Result<bool> {
        let result = self.wishlists().delete_one(doc! { "email": email }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn load_owned_courses(&self, email: &str) -> Result<Option<OwnedCourses>> {
        Ok(self.owned_courses().find_one(doc! { "email": email }).await?)
    }

    async fn add_owned_courses(&self, email: &str, courses: &[OwnedCourse]) -> Result<usize> {
        let collection = self.owned_courses();
        let mut added = 0;
        for course in courses {
            let entry = mongodb::bson::to_bson(course)?;
            if set_insert_by_title(&collection, email, "courses", &course.title, entry).await? {
                added += 1;
            }
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{self, testing};

    /// Runs `check` against a throwaway database on the server named by
    /// `MONGODB_URI`, then drops it.
    async fn with_scratch_store<F, Fut>(check: F)
    where
        F: FnOnce(MongoStore) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        let uri = std::env::var("MONGODB_URI").expect("MONGODB_URI must be set");
        let client = store::create_client(&uri).await.unwrap();
        let name = format!("course_shop_test_{}", ObjectId::new().to_hex());
        let db = store::get_database(&client, &name);

        let mongo = MongoStore::new(db.clone());
        mongo.ensure_indexes().await.unwrap();
        check(mongo).await;

        db.drop().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "needs MONGODB_URI pointing at a disposable server"]
    async fn test_cart_lines_are_merged_by_title() {
        with_scratch_store(|mongo| async move {
            testing::cart_lines_are_merged_by_title(&mongo).await;
        })
        .await;
    }

    #[tokio::test]
    #[ignore = "needs MONGODB_URI pointing at a disposable server"]
    async fn test_wishlist_set_insert_by_title() {
        with_scratch_store(|mongo| async move {
            testing::wishlist_set_insert_by_title(&mongo).await;
        })
        .await;
    }

    #[tokio::test]
    #[ignore = "needs MONGODB_URI pointing at a disposable server"]
    async fn test_owned_courses_set_insert_by_title() {
        with_scratch_store(|mongo| async move {
            testing::owned_courses_set_insert_by_title(&mongo).await;
        })
        .await;
    }

    #[tokio::test]
    #[ignore = "needs MONGODB_URI pointing at a disposable server"]
    async fn test_concurrent_cart_adds_keep_every_line() {
        with_scratch_store(|mongo| async move {
            let email = "race@example.com";
            mongo
                .add_cart_item(email, &testing::cart_line("Seed"))
                .await
                .unwrap();

            let line_a = testing::cart_line("A");
            let line_b = testing::cart_line("B");
            let (a, b) = tokio::join!(
                mongo.add_cart_item(email, &line_a),
                mongo.add_cart_item(email, &line_b),
            );
            a.unwrap();
            b.unwrap();

            let cart = mongo.load_cart(email).await.unwrap().unwrap();
            let mut titles: Vec<_> = cart.items.iter().map(|line| line.title.as_str()).collect();
            titles.sort_unstable();
            assert_eq!(titles, ["A", "B", "Seed"]);
        })
        .await;
    }
}
