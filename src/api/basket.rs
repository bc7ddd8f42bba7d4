use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::extract::ApiJson;
use super::validation::validate_id;
use super::{
    AddBasketItemRequest, ApiError, ApiResponse, AppState, BasketItemDto, BasketLineDto,
    UpdateQuantityRequest,
};
use crate::domain::{BasketItemId, ProductId};
use crate::models::basket::AddBasketItem;
use crate::services::{AuthUser, BasketError};

impl From<BasketError> for ApiError {
    fn from(err: BasketError) -> Self {
        match err {
            BasketError::ProductNotFound(id) => Self::not_found("Product", id),
            BasketError::ItemNotFound(id) => Self::not_found("Basket item", id),
            BasketError::Validation(msg) => Self::validation(msg),
            BasketError::Unauthenticated => Self::unauthorized("Authentication required"),
            BasketError::Database(msg) => Self::DatabaseError(msg),
            BasketError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// Returns the caller's basket with product details.
///
/// # Endpoint
/// `GET /api/basket`
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<BasketLineDto>>>, ApiError> {
    let lines = state.basket_service().list_items(&user.id).await?;
    Ok(Json(ApiResponse::success(
        lines.into_iter().map(BasketLineDto::from).collect(),
    )))
}

/// Adds a product to the caller's basket.
///
/// # Endpoint
/// `POST /api/basket`
///
/// # Response
/// The basket line after merging: adding a product that is already in the
/// basket increases its quantity instead of creating a second line.
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<AddBasketItemRequest>,
) -> Result<Json<ApiResponse<BasketItemDto>>, ApiError> {
    let request = AddBasketItem {
        product_id: payload.product_id.map(ProductId::new),
        quantity: payload.quantity,
    };

    let item = state.basket_service().add_item(&user.id, request).await?;
    Ok(Json(ApiResponse::success(item.into())))
}

/// `PUT /api/basket/{id}`
pub async fn update_quantity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<UpdateQuantityRequest>,
) -> Result<Json<ApiResponse<BasketItemDto>>, ApiError> {
    let id = BasketItemId::new(validate_id("basket item", id)?);
    let quantity = payload
        .quantity
        .ok_or_else(|| ApiError::validation("quantity is required"))?;

    let item = state
        .basket_service()
        .update_quantity(&user.id, id, quantity)
        .await?;

    Ok(Json(ApiResponse::success(item.into())))
}

/// `DELETE /api/basket/{id}`
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = BasketItemId::new(validate_id("basket item", id)?);
    state.basket_service().remove_item(&user.id, id).await?;
    Ok(Json(ApiResponse::success(())))
}
