/// User management endpoints
///
/// # Endpoints
///
/// - `GET    /api/users` - List users (role/activity filters)
/// - `GET    /api/users/:id` - User with settings
/// - `PUT    /api/users/:id` - Update (self or admin)
/// - `DELETE /api/users/:id` - Deactivate (admin only)
/// - `GET    /api/users/:id/tasks` - The user's assigned tasks
/// - `PUT    /api/users/:id/settings` - Update settings (self only)
/// - `POST   /api/users/change-password` - Change own password

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{ApiResponse, PageParams, Pagination},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use taskhive_shared::{
    auth::{
        authorization::{require_role, require_self_or_admin},
        middleware::CurrentUser,
        password,
    },
    models::{
        settings::{EmailPrefs, UserSettings},
        task::{Task, TaskDetail, TaskFilter},
        user::{Role, UpdateUser, User, UserProfile},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Query parameters for the user list
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// Update user request
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<Option<String>>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// Update settings request
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub theme: Option<String>,
    pub email_notifications: Option<EmailPrefs>,
    pub timezone: Option<String>,
    pub language: Option<String>,
}

/// Change password request
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 6, message = "New password must be at least 6 characters"))]
    pub new_password: String,
}

/// List users with optional role/activity filters
pub async fn list_users(
    State(state): State<AppState>,
    Query(page_params): Query<PageParams>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<User>>>> {
    let (page, limit, offset) = page_params.resolve();

    if let Some(ref role) = query.role {
        role.parse::<Role>()
            .map_err(|_| ApiError::BadRequest(format!("Invalid role: {}", role)))?;
    }

    let users = User::list(
        &state.db,
        query.role.as_deref(),
        query.is_active,
        limit,
        offset,
    )
    .await?;
    let total = User::count(&state.db, query.role.as_deref(), query.is_active).await?;

    Ok(Json(ApiResponse::paginated(
        users,
        Pagination::new(page, limit, total),
    )))
}

/// Fetch a user with their settings
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let profile = User::find_profile(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::data(profile)))
}

/// Update a user
///
/// Self or admin only; `role` and `is_active` changes are restricted to
/// admins and silently ignored otherwise.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<ApiResponse<User>>> {
    require_self_or_admin(&current, id)?;

    let is_admin = current.role == Role::Admin;

    let role = match req.role {
        Some(ref role) if is_admin => Some(
            role.parse::<Role>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid role: {}", role)))?,
        ),
        _ => None,
    };

    let update = UpdateUser {
        username: req.username,
        email: req.email,
        full_name: req.full_name,
        avatar_url: req.avatar_url,
        role,
        is_active: if is_admin { req.is_active } else { None },
    };

    if update.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let user = User::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::data(user)))
}

/// Deactivate a user (admin only)
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    require_role(&current, &[Role::Admin])?;

    if !User::deactivate(&state.db, id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(Json(ApiResponse::message("User deactivated successfully")))
}

/// List tasks assigned to a user
pub async fn get_user_tasks(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<ApiResponse<Vec<TaskDetail>>>> {
    let (page_num, limit, offset) = page.resolve();

    let tasks = Task::list_for_assignee(&state.db, id, limit, offset).await?;
    let total = Task::count(
        &state.db,
        &TaskFilter {
            assigned_to: Some(id),
            ..Default::default()
        },
    )
    .await?;

    Ok(Json(ApiResponse::paginated(
        tasks,
        Pagination::new(page_num, limit, total),
    )))
}

/// Update a user's settings (self only)
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSettingsRequest>,
) -> ApiResult<Json<ApiResponse<UserSettings>>> {
    if current.id != id {
        return Err(ApiError::Forbidden(
            "Not authorized to update settings for this user".to_string(),
        ));
    }

    if let Some(ref theme) = req.theme {
        if theme != "light" && theme != "dark" {
            return Err(ApiError::BadRequest("Invalid theme".to_string()));
        }
    }

    let update = taskhive_shared::models::settings::UpdateSettings {
        theme: req.theme,
        email_notifications: req.email_notifications,
        timezone: req.timezone,
        language: req.language,
    };

    if update.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let settings = UserSettings::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Settings not found".to_string()))?;

    Ok(Json(ApiResponse::data(settings)))
}

/// Change the caller's password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    req.validate().map_err(ApiError::from_validation)?;

    let user = User::find_by_id(&state.db, current.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !password::verify_password(&req.current_password, &user.password_hash)? {
        return Err(ApiError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = password::hash_password(&req.new_password)?;
    User::update_password(&state.db, current.id, &new_hash).await?;

    Ok(Json(ApiResponse::message("Password changed successfully")))
}
