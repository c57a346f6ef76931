use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::{AppJson, Result};
use crate::store::{
    models::{Course, Image},
    Store,
};
use crate::AppState;

const LATEST_COURSES_LIMIT: i64 = 6;
const LATEST_IMAGES_LIMIT: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct CarouselRequest {
    pub image: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CourseRequest {
    pub title: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub id: String,
}

pub async fn add_carousel_image(
    store: &dyn Store,
    image: Option<String>,
    url: Option<String>,
) -> Result<ObjectId> {
    let id = store
        .insert_image(&Image {
            id: None,
            image,
            url,
        })
        .await?;
    tracing::info!("Carousel image {} added", id);
    Ok(id)
}

pub async fn add_course(store: &dyn Store, request: CourseRequest) -> Result<ObjectId> {
    let course = Course {
        id: None,
        title: request.title,
        image: request.image,
        url: request.url,
        price: request.price,
    };
    let id = store.insert_course(&course).await?;
    tracing::info!("Course {} added with title {:?}", id, course.title);
    Ok(id)
}

pub async fn latest_courses(store: &dyn Store) -> Result<Vec<Course>> {
    store.latest_courses(LATEST_COURSES_LIMIT).await
}

pub async fn latest_images(store: &dyn Store) -> Result<Vec<Image>> {
    store.latest_images(LATEST_IMAGES_LIMIT).await
}

pub async fn courses_by_title(store: &dyn Store, title: &str) -> Result<Vec<Course>> {
    store.courses_by_title(title).await
}

pub async fn carousel_add_handler(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CarouselRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let id = add_carousel_image(state.store.as_ref(), payload.image, payload.url).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Carousel image added",
            id: id.to_hex(),
        }),
    ))
}

pub async fn courses_add_handler(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CourseRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let id = add_course(state.store.as_ref(), payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Course added",
            id: id.to_hex(),
        }),
    ))
}

pub async fn latest_courses_handler(State(state): State<AppState>) -> Result<Json<Vec<Course>>> {
    Ok(Json(latest_courses(state.store.as_ref()).await?))
}

pub async fn latest_images_handler(State(state): State<AppState>) -> Result<Json<Vec<Image>>> {
    Ok(Json(latest_images(state.store.as_ref()).await?))
}

pub async fn courses_by_title_handler(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<Json<Vec<Course>>> {
    Ok(Json(courses_by_title(state.store.as_ref(), &title).await?))
}
