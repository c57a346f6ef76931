use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize, Serializer};

/// Renders an ObjectId as its 24-character hex string.
fn serialize_hex_id<S>(id: &Option<ObjectId>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match id {
        Some(oid) => serializer.serialize_str(&oid.to_hex()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Image {
    #[serde(
        rename = "_id",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_hex_id"
    )]
    pub id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Course {
    #[serde(
        rename = "_id",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_hex_id"
    )]
    pub id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub title: String,
    pub image: Option<String>,
    pub price: Option<f64>,
    pub quantity: i32,
}

/// A user's pending purchases, one document per email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    #[serde(rename = "_id", default, skip_serializing)]
    pub id: Option<ObjectId>,
    pub email: String,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub title: String,
    pub image: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wishlist {
    #[serde(rename = "_id", default, skip_serializing)]
    pub id: Option<ObjectId>,
    pub email: String,
    #[serde(default)]
    pub items: Vec<WishlistItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedCourse {
    pub title: String,
    pub image: Option<String>,
    pub price: Option<f64>,
    pub purchased_at: DateTime,
}

/// Completed purchases ("mycourses"), one document per email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnedCourses {
    #[serde(rename = "_id", default, skip_serializing)]
    pub id: Option<ObjectId>,
    pub email: String,
    #[serde(default)]
    pub courses: Vec<OwnedCourse>,
}

impl Cart {
    pub fn new(email: &str) -> Self {
        Self {
            id: None,
            email: email.to_string(),
            items: Vec::new(),
        }
    }

    /// Bumps the quantity of an existing line or appends the new one as given.
    /// Returns the resulting quantity for that title.
    pub fn add_item(&mut self, item: CartItem) -> i32 {
        if let Some(line) = self.items.iter_mut().find(|line| line.title == item.title) {
            line.quantity += 1;
            return line.quantity;
        }
        let quantity = item.quantity;
        self.items.push(item);
        quantity
    }

    /// Drops every line with the given title, returning how many went.
    pub fn remove_title(&mut self, title: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|line| line.title != title);
        before - self.items.len()
    }
}

impl Wishlist {
    pub fn new(email: &str) -> Self {
        Self {
            id: None,
            email: email.to_string(),
            items: Vec::new(),
        }
    }

    /// Returns false when the title was already saved.
    pub fn add_item(&mut self, item: WishlistItem) -> bool {
        if self.items.iter().any(|saved| saved.title == item.title) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn remove_title(&mut self, title: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|saved| saved.title != title);
        before - self.items.len()
    }
}

impl OwnedCourses {
    pub fn new(email: &str) -> Self {
        Self {
            id: None,
            email: email.to_string(),
            courses: Vec::new(),
        }
    }

    pub fn owns(&self, title: &str) -> bool {
        self.courses.iter().any(|course| course.title == title)
    }

    /// Set-insert keyed by title. Returns false if the title was present.
    pub fn insert(&mut self, course: OwnedCourse) -> bool {
        if self.owns(&course.title) {
            return false;
        }
        self.courses.push(course);
        true
    }
}
