use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::extract::ApiJson;
use super::validation::{validate_id, validate_product_request};
use super::{ApiError, ApiResponse, AppState, ProductDto, ProductFilterQuery, ProductRequest};
use crate::domain::{CategoryId, ProductId};
use crate::models::catalog::ProductFilter;
use crate::services::CatalogError;

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::ProductNotFound(id) => Self::not_found("Product", id),
            CatalogError::CategoryNotFound(id) => Self::not_found("Category", id),
            CatalogError::Validation(msg) => Self::validation(msg),
            CatalogError::Conflict(msg) => Self::Conflict(msg),
            CatalogError::Database(msg) => Self::DatabaseError(msg),
            CatalogError::Internal(msg) => Self::internal(msg),
        }
    }
}

impl From<ProductFilterQuery> for ProductFilter {
    fn from(query: ProductFilterQuery) -> Self {
        Self {
            category_id: query.category_id.map(CategoryId::new),
            spiciness: query.spiciness,
            min_spiciness: query.min_spiciness,
            max_spiciness: query.max_spiciness,
            contains_nuts: query.contains_nuts,
            is_vegetarian: query.is_vegetarian,
        }
    }
}

/// Lists products, optionally filtered.
///
/// # Endpoint
/// `GET /api/products` (also `/api/products/filtered`)
///
/// # Query Parameters
/// `category_id`, `spiciness`, `min_spiciness`, `max_spiciness`,
/// `contains_nuts`, `is_vegetarian`. Omitted parameters are not applied.
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductFilterQuery>,
) -> Result<Json<ApiResponse<Vec<ProductDto>>>, ApiError> {
    let products = state
        .catalog_service()
        .list_products(ProductFilter::from(query))
        .await?;

    Ok(Json(ApiResponse::success(
        products.into_iter().map(ProductDto::from).collect(),
    )))
}

/// `GET /api/products/{id}` (also `/api/dish/{id}`)
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ProductDto>>, ApiError> {
    let id = ProductId::new(validate_id("product", id)?);
    let product = state.catalog_service().get_product(id).await?;
    Ok(Json(ApiResponse::success(product.into())))
}

/// `POST /api/products` (also `/api/dish/add`)
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<ProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductDto>>), ApiError> {
    let (_, input) = validate_product_request(payload)?;
    let product = state.catalog_service().create_product(input).await?;

    tracing::info!("Created product {} ({})", product.id, product.name);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(product.into())),
    ))
}

/// `PUT /api/products/{id}`
///
/// A body `id` that differs from the path is rejected with 409.
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<ProductRequest>,
) -> Result<Json<ApiResponse<ProductDto>>, ApiError> {
    let id = ProductId::new(validate_id("product", id)?);
    let (body_id, input) = validate_product_request(payload)?;

    let product = state
        .catalog_service()
        .update_product(id, body_id, input)
        .await?;

    Ok(Json(ApiResponse::success(product.into())))
}

/// `DELETE /api/products/{id}`
///
/// Basket lines holding the product are removed with it.
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = ProductId::new(validate_id("product", id)?);
    state.catalog_service().delete_product(id).await?;
    Ok(Json(ApiResponse::success(())))
}
