use super::ApiError;
use super::types::ProductRequest;
use crate::domain::{CategoryId, CategoryType, Price, ProductId};
use crate::models::catalog::ProductInput;

const MAX_NAME_LEN: usize = 200;

pub fn validate_id(resource: &str, id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {resource} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

pub fn validate_product_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Product name cannot be empty"));
    }

    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::validation(format!(
            "Product name must be {MAX_NAME_LEN} characters or less"
        )));
    }

    Ok(trimmed)
}

/// Converts a create/update body into validated product fields.
/// Returns the body id separately so callers can compare it to the path.
pub fn validate_product_request(
    payload: ProductRequest,
) -> Result<(Option<ProductId>, ProductInput), ApiError> {
    let name = validate_product_name(payload.name.as_deref().unwrap_or_default())?.to_string();

    let amount = payload
        .price
        .ok_or_else(|| ApiError::validation("Price is required"))?;
    let price = Price::from_decimal(amount).ok_or_else(|| {
        ApiError::validation(format!(
            "Invalid price: {amount}. Price must be positive with at most 2 decimal places"
        ))
    })?;

    let category_id = payload
        .category_id
        .ok_or_else(|| ApiError::validation("category_id is required"))?;
    let category_id = CategoryId::new(validate_id("category", category_id)?);

    let image_url = payload
        .image_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty());

    let input = ProductInput {
        name,
        price,
        spiciness: payload.spiciness.unwrap_or(0),
        contains_nuts: payload.contains_nuts.unwrap_or(false),
        is_vegetarian: payload.is_vegetarian.unwrap_or(false),
        image_url,
        category_id,
    };

    Ok((payload.id.map(ProductId::new), input))
}

pub fn parse_category_name(name: Option<&str>) -> Result<CategoryType, ApiError> {
    let name = name.ok_or_else(|| ApiError::validation("Category name is required"))?;

    name.parse::<CategoryType>().map_err(|e| {
        let allowed: Vec<&str> = CategoryType::ALL.iter().map(CategoryType::as_str).collect();
        ApiError::validation(format!("{e}. Expected one of: {}", allowed.join(", ")))
    })
}
