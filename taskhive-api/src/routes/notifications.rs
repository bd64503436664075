/// Notification endpoints
///
/// All routes operate on the caller's own notifications.
///
/// # Endpoints
///
/// - `GET    /api/notifications` - Paginated list (optional `is_read` filter)
/// - `GET    /api/notifications/unread-count`
/// - `PATCH  /api/notifications/:id/read`
/// - `PATCH  /api/notifications/read-all`
/// - `DELETE /api/notifications/:id`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{ApiResponse, PageParams, Pagination},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskhive_shared::{
    auth::middleware::CurrentUser,
    models::notification::{Notification, NotificationWithTask},
};
use uuid::Uuid;

/// Query parameters for the notification list
#[derive(Debug, Deserialize)]
pub struct NotificationListQuery {
    pub is_read: Option<bool>,
}

/// Unread-count response body
#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

/// List the caller's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(page_params): Query<PageParams>,
    Query(query): Query<NotificationListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<NotificationWithTask>>>> {
    let (page, limit, offset) = page_params.resolve_with_default(20);

    let notifications =
        Notification::list_for_user(&state.db, current.id, query.is_read, limit, offset).await?;
    let total = Notification::count_for_user(&state.db, current.id, query.is_read).await?;

    Ok(Json(ApiResponse::paginated(
        notifications,
        Pagination::new(page, limit, total),
    )))
}

/// Count the caller's unread notifications
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<ApiResponse<UnreadCount>>> {
    let count = Notification::unread_count(&state.db, current.id).await?;
    Ok(Json(ApiResponse::data(UnreadCount { count })))
}

/// Mark one notification as read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Notification>>> {
    let notification = Notification::mark_read(&state.db, id, current.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    Ok(Json(ApiResponse::data(notification)))
}

/// Mark all of the caller's notifications as read
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<ApiResponse<()>>> {
    Notification::mark_all_read(&state.db, current.id).await?;
    Ok(Json(ApiResponse::message("All notifications marked as read")))
}

/// Delete one of the caller's notifications
pub async fn delete_notification(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    Notification::delete(&state.db, id, current.id).await?;
    Ok(Json(ApiResponse::message("Notification deleted successfully")))
}
