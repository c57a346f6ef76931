use std::collections::HashSet;

use axum::{extract::State, Json};
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::{AppError, AppJson, Result};
use crate::store::{models::OwnedCourse, Store};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SinglePurchaseRequest {
    pub title: Option<String>,
    pub image: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SinglePurchaseResponse {
    pub success: bool,
    pub message: &'static str,
    pub already_purchased: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPurchaseResponse {
    pub success: bool,
    pub message: &'static str,
    pub new_purchases: usize,
    pub existing_courses: usize,
}

/// An owned course as clients see it, with `purchasedAt` in RFC 3339.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedCourseView {
    pub title: String,
    pub image: Option<String>,
    pub price: Option<f64>,
    pub purchased_at: String,
}

impl TryFrom<OwnedCourse> for OwnedCourseView {
    type Error = AppError;

    fn try_from(course: OwnedCourse) -> Result<Self> {
        let purchased_at = course.purchased_at.try_to_rfc3339_string().map_err(|e| {
            AppError::Upstream(format!("Unrepresentable purchase time: {}", e))
        })?;
        Ok(Self {
            title: course.title,
            image: course.image,
            price: course.price,
            purchased_at,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct OwnedCoursesResponse {
    pub success: bool,
    pub count: usize,
    pub courses: Vec<OwnedCourseView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartPurchase {
    pub new_purchases: usize,
    pub existing_courses: usize,
}

/// Buys one course outside the cart flow.
///
/// Returns `true` when the title was already owned, in which case nothing is
/// written. Otherwise the course is recorded and its title pulled from the
/// cart; other cart lines stay where they are.
pub async fn purchase_single(
    store: &dyn Store,
    email: &str,
    title: String,
    image: String,
    price: f64,
) -> Result<bool> {
    let course = OwnedCourse {
        title,
        image: Some(image),
        price: Some(price),
        purchased_at: DateTime::now(),
    };
    let added = store
        .add_owned_courses(email, std::slice::from_ref(&course))
        .await?;
    if added == 0 {
        tracing::info!("{} already owns {}", email, course.title);
        return Ok(true);
    }

    // Not atomic with the write above.
    store.pull_cart_title(email, &course.title).await?;

    tracing::info!("{} purchased {}", email, course.title);
    Ok(false)
}

/// Converts the whole cart into owned courses and deletes the cart.
///
/// Titles already owned are counted and dropped with the cart.
pub async fn purchase_cart(store: &dyn Store, email: &str) -> Result<CartPurchase> {
    let cart = store
        .load_cart(email)
        .await?
        .filter(|cart| !cart.items.is_empty())
        .ok_or_else(|| AppError::Validation("Cart is empty".to_string()))?;

    let owned_titles: HashSet<String> = store
        .load_owned_courses(email)
        .await?
        .map(|owned| owned.courses.into_iter().map(|c| c.title).collect())
        .unwrap_or_default();

    let purchased_at = DateTime::now();
    let mut seen = HashSet::new();
    let mut fresh = Vec::new();
    let mut existing_courses = 0;
    for item in cart.items {
        if owned_titles.contains(&item.title) {
            existing_courses += 1;
        } else if seen.insert(item.title.clone()) {
            fresh.push(OwnedCourse {
                title: item.title,
                image: item.image,
                price: item.price,
                purchased_at,
            });
        }
    }

    let new_purchases = store.add_owned_courses(email, &fresh).await?;
    // Titles bought elsewhere since the owned set was read.
    existing_courses += fresh.len() - new_purchases;
    store.delete_cart(email).await?;

    tracing::info!(
        "{} checked out cart: {} new, {} already owned",
        email,
        new_purchases,
        existing_courses
    );
    Ok(CartPurchase {
        new_purchases,
        existing_courses,
    })
}

pub async fn owned_courses(store: &dyn Store, email: &str) -> Result<Vec<OwnedCourse>> {
    Ok(store
        .load_owned_courses(email)
        .await?
        .map(|owned| owned.courses)
        .unwrap_or_default())
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn purchase_single_handler(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<SinglePurchaseRequest>,
) -> Result<Json<SinglePurchaseResponse>> {
    let (Some(title), Some(image), Some(price)) =
        (present(payload.title), present(payload.image), payload.price)
    else {
        return Err(AppError::Validation(
            "Missing required fields: title, image, price".to_string(),
        ));
    };

    let already_purchased =
        purchase_single(state.store.as_ref(), &user.email, title, image, price).await?;
    let message = if already_purchased {
        "Course already purchased"
    } else {
        "Course purchased successfully"
    };
    Ok(Json(SinglePurchaseResponse {
        success: true,
        message,
        already_purchased,
    }))
}

pub async fn purchase_cart_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<CartPurchaseResponse>> {
    let outcome = purchase_cart(state.store.as_ref(), &user.email).await?;
    Ok(Json(CartPurchaseResponse {
        success: true,
        message: "Cart purchased successfully",
        new_purchases: outcome.new_purchases,
        existing_courses: outcome.existing_courses,
    }))
}

pub async fn owned_courses_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<OwnedCoursesResponse>> {
    let courses = owned_courses(state.store.as_ref(), &user.email)
        .await?
        .into_iter()
        .map(OwnedCourseView::try_from)
        .collect::<Result<Vec<_>>>()?;
    Ok(Json(OwnedCoursesResponse {
        success: true,
        count: courses.len(),
        courses,
    }))
}
