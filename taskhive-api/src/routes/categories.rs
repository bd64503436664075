/// Category endpoints
///
/// # Endpoints
///
/// - `GET    /api/categories` - List with creator names
/// - `GET    /api/categories/:id`
/// - `POST   /api/categories` - Create (admin/manager)
/// - `PUT    /api/categories/:id` - Update (admin/manager)
/// - `DELETE /api/categories/:id` - Delete (admin/manager)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::ApiResponse,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskhive_shared::{
    auth::{authorization::require_role, middleware::CurrentUser},
    models::{
        category::{Category, CategoryWithCreator, CreateCategory, UpdateCategory},
        user::Role,
    },
};
use uuid::Uuid;
use validator::Validate;

const DEFAULT_COLOR: &str = "#228BE6";

/// Create category request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, message = "Category name is required"))]
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Update category request
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<Option<String>>,
}

/// "#RRGGBB" with hex digits
fn is_valid_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn validate_color(color: &Option<String>) -> ApiResult<()> {
    if let Some(color) = color {
        if !is_valid_hex_color(color) {
            return Err(ApiError::BadRequest("Invalid color format".to_string()));
        }
    }
    Ok(())
}

/// List all categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<CategoryWithCreator>>>> {
    let categories = Category::list(&state.db).await?;
    Ok(Json(ApiResponse::data(categories)))
}

/// Fetch a category
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<CategoryWithCreator>>> {
    let category = Category::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(Json(ApiResponse::data(category)))
}

/// Create a category (admin/manager)
pub async fn create_category(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Category>>)> {
    require_role(&current, &[Role::Admin, Role::Manager])?;
    req.validate().map_err(ApiError::from_validation)?;
    validate_color(&req.color)?;

    let category = Category::create(
        &state.db,
        CreateCategory {
            name: req.name,
            color: req.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            icon: req.icon,
            created_by: current.id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::data(category))))
}

/// Update a category (admin/manager)
pub async fn update_category(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCategoryRequest>,
) -> ApiResult<Json<ApiResponse<Category>>> {
    require_role(&current, &[Role::Admin, Role::Manager])?;
    validate_color(&req.color)?;

    let update = UpdateCategory {
        name: req.name,
        color: req.color,
        icon: req.icon,
    };

    if update.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let category = Category::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(Json(ApiResponse::data(category)))
}

/// Delete a category (admin/manager)
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    require_role(&current, &[Role::Admin, Role::Manager])?;

    if !Category::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Category not found".to_string()));
    }

    Ok(Json(ApiResponse::message("Category deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color_validation() {
        assert!(is_valid_hex_color("#228BE6"));
        assert!(is_valid_hex_color("#ffffff"));
        assert!(!is_valid_hex_color("228BE6"));
        assert!(!is_valid_hex_color("#228BE"));
        assert!(!is_valid_hex_color("#228BEG"));
        assert!(!is_valid_hex_color("#228BE6F"));
    }
}
