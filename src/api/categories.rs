use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::extract::ApiJson;
use super::validation::{parse_category_name, validate_id};
use super::{ApiError, ApiResponse, AppState, CategoryDto, CategoryRequest};
use crate::domain::CategoryId;

/// `GET /api/categories`
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CategoryDto>>>, ApiError> {
    let categories = state.catalog_service().list_categories().await?;
    Ok(Json(ApiResponse::success(
        categories.into_iter().map(CategoryDto::from).collect(),
    )))
}

/// `GET /api/categories/{id}`
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CategoryDto>>, ApiError> {
    let id = CategoryId::new(validate_id("category", id)?);
    let category = state.catalog_service().get_category(id).await?;
    Ok(Json(ApiResponse::success(category.into())))
}

/// `POST /api/categories`
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryDto>>), ApiError> {
    let name = parse_category_name(payload.name.as_deref())?;
    let category = state.catalog_service().create_category(name).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(category.into())),
    ))
}

/// `PUT /api/categories/{id}`
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<CategoryRequest>,
) -> Result<Json<ApiResponse<CategoryDto>>, ApiError> {
    let id = CategoryId::new(validate_id("category", id)?);
    let name = parse_category_name(payload.name.as_deref())?;

    let category = state
        .catalog_service()
        .update_category(id, payload.id.map(CategoryId::new), name)
        .await?;

    Ok(Json(ApiResponse::success(category.into())))
}

/// `DELETE /api/categories/{id}`
///
/// Fails with 409 while products still belong to the category.
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = CategoryId::new(validate_id("category", id)?);
    state.catalog_service().delete_category(id).await?;
    Ok(Json(ApiResponse::success(())))
}
