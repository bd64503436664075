/// Task endpoints
///
/// # Endpoints
///
/// - `GET    /api/tasks` - Filtered, paginated list (users see their own)
/// - `POST   /api/tasks` - Create (admin/manager)
/// - `GET    /api/tasks/:id` - Detail with joined names
/// - `PUT    /api/tasks/:id` - Partial update with audit trail
/// - `DELETE /api/tasks/:id` - Soft-archive (admin/manager)
/// - `GET    /api/tasks/:id/history` - Field-level audit rows
/// - `GET/POST /api/tasks/:id/comments` - Threaded comments
/// - `POST   /api/tasks/:id/attachments` - Multipart upload
/// - `DELETE /api/tasks/:id/attachments/:file_id` - Remove file + row
///
/// Side effects follow the notification pipeline: assignment, status change,
/// and comments insert a notification for the assignee and, when email is
/// enabled, send the matching template. Email failures are logged, never
/// surfaced.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{ApiResponse, PageParams, Pagination},
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskhive_shared::{
    auth::{authorization::require_role, middleware::CurrentUser},
    mailer::templates,
    models::{
        attachment::{Attachment, CreateAttachment},
        comment::{Comment, CommentWithAuthor, CreateComment},
        history::{HistoryAction, HistoryEntry, TaskHistory},
        notification::{CreateNotification, Notification, NotificationType},
        task::{
            CreateTask, RecurrencePattern, Task, TaskDetail, TaskFilter, TaskPriority, TaskStatus,
            TaskType, UpdateTask,
        },
        user::{Role, User},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Query parameters for the task list
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub task_type: Option<String>,
    pub search: Option<String>,
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub description: Option<String>,
    pub task_type: Option<String>,
    pub priority: Option<String>,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
}

/// Update task request; `null` clears a nullable field, absence leaves it alone
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub task_type: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub category_id: Option<Option<Uuid>>,
    pub tags: Option<Vec<String>>,
    pub assigned_to: Option<Option<Uuid>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub start_date: Option<Option<DateTime<Utc>>>,
    pub is_recurring: Option<bool>,
    pub recurrence_pattern: Option<Option<RecurrencePattern>>,
}

/// Add comment request
#[derive(Debug, Deserialize, Validate)]
pub struct AddCommentRequest {
    #[validate(length(min = 1, message = "Comment content is required"))]
    pub content: String,
    pub parent_comment_id: Option<Uuid>,
}

fn parse_status(value: &str) -> ApiResult<TaskStatus> {
    value
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid status: {}", value)))
}

fn parse_priority(value: &str) -> ApiResult<TaskPriority> {
    value
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid priority: {}", value)))
}

fn parse_task_type(value: &str) -> ApiResult<TaskType> {
    value
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid task type: {}", value)))
}

/// List tasks with filters
///
/// `user`-role callers are always restricted to their own assignments.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(page_params): Query<PageParams>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<TaskDetail>>>> {
    let (page, limit, offset) = page_params.resolve();

    let mut filter = TaskFilter {
        status: query.status.as_deref().map(parse_status).transpose()?,
        priority: query.priority.as_deref().map(parse_priority).transpose()?,
        category_id: query.category_id,
        assigned_to: query.assigned_to,
        task_type: query.task_type.as_deref().map(parse_task_type).transpose()?,
        search: query.search,
    };

    if current.role == Role::User {
        filter.assigned_to = Some(current.id);
    }

    let tasks = Task::list(&state.db, &filter, limit, offset).await?;
    let total = Task::count(&state.db, &filter).await?;

    Ok(Json(ApiResponse::paginated(
        tasks,
        Pagination::new(page, limit, total),
    )))
}

/// Fetch a task with joined names
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<TaskDetail>>> {
    let task = Task::find_detail(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(ApiResponse::data(task)))
}

/// Notifies (and optionally emails) the assignee about a new assignment
async fn notify_assignment(state: &AppState, task: &Task, assigned_by: &CurrentUser, assignee_id: Uuid) {
    let result = Notification::create(
        &state.db,
        CreateNotification {
            user_id: assignee_id,
            task_id: Some(task.id),
            notification_type: NotificationType::TaskAssignment,
            title: format!("New Task: {}", task.title),
            message: format!("You have been assigned a task by {}", assigned_by.full_name),
            email_sent: state.config.email.enabled,
        },
    )
    .await;

    if let Err(e) = result {
        tracing::warn!(error = %e, task_id = %task.id, "Failed to insert assignment notification");
        return;
    }

    if state.config.email.enabled {
        match User::find_by_id(&state.db, assignee_id).await {
            Ok(Some(assignee)) => {
                let content = templates::task_assignment(
                    task,
                    &assigned_by.full_name,
                    &assignee.full_name,
                    &state.config.api.frontend_url,
                );
                if let Err(e) = state.mailer.send(content.to(&assignee.email)).await {
                    tracing::warn!(error = %e, task_id = %task.id, "Failed to send assignment email");
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load assignee for email");
            }
        }
    }
}

/// Create a task (admin/manager)
pub async fn create_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Task>>)> {
    require_role(&current, &[Role::Admin, Role::Manager])?;
    req.validate().map_err(ApiError::from_validation)?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            task_type: req
                .task_type
                .as_deref()
                .map(parse_task_type)
                .transpose()?
                .unwrap_or(TaskType::Utility),
            priority: req
                .priority
                .as_deref()
                .map(parse_priority)
                .transpose()?
                .unwrap_or(TaskPriority::Medium),
            category_id: req.category_id,
            tags: req.tags,
            created_by: current.id,
            assigned_to: req.assigned_to,
            due_date: req.due_date,
            start_date: req.start_date,
            is_recurring: req.is_recurring,
            recurrence_pattern: req.recurrence_pattern,
        },
    )
    .await?;

    TaskHistory::record(&state.db, task.id, current.id, HistoryAction::Created).await?;

    if let Some(assignee_id) = task.assigned_to {
        if assignee_id != current.id {
            notify_assignment(&state, &task, &current, assignee_id).await;
        }
    }

    tracing::info!(task_id = %task.id, created_by = %current.id, "Task created");

    Ok((StatusCode::CREATED, Json(ApiResponse::data(task))))
}

/// Update a task
///
/// Writes one audit row per changed field. A status change with an assignee
/// also triggers the status-update notification/email.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    let old_task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let update = UpdateTask {
        title: req.title,
        description: req.description,
        task_type: req.task_type.as_deref().map(parse_task_type).transpose()?,
        priority: req.priority.as_deref().map(parse_priority).transpose()?,
        status: req.status.as_deref().map(parse_status).transpose()?,
        category_id: req.category_id,
        tags: req.tags,
        assigned_to: req.assigned_to,
        due_date: req.due_date,
        start_date: req.start_date,
        is_recurring: req.is_recurring,
        recurrence_pattern: req.recurrence_pattern,
    };

    if update.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let changes = update.changes(&old_task);
    let status_changed = changes.iter().any(|c| c.field == "status");

    let task = Task::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    for change in &changes {
        TaskHistory::record_field_change(
            &state.db,
            id,
            current.id,
            change.field,
            &change.old,
            &change.new,
        )
        .await?;
    }

    if status_changed {
        if let Some(assignee_id) = old_task.assigned_to {
            let result = Notification::create(
                &state.db,
                CreateNotification {
                    user_id: assignee_id,
                    task_id: Some(id),
                    notification_type: NotificationType::StatusUpdate,
                    title: "Task Status Updated".to_string(),
                    message: format!("Status changed to {}", task.status),
                    email_sent: state.config.email.enabled,
                },
            )
            .await;

            if let Err(e) = result {
                tracing::warn!(error = %e, task_id = %id, "Failed to insert status notification");
            } else if state.config.email.enabled {
                if let Ok(Some(assignee)) = User::find_by_id(&state.db, assignee_id).await {
                    let content = templates::status_update(
                        &task,
                        &assignee.full_name,
                        &old_task.status,
                        &task.status,
                        &current.full_name,
                        &state.config.api.frontend_url,
                    );
                    if let Err(e) = state.mailer.send(content.to(&assignee.email)).await {
                        tracing::warn!(error = %e, task_id = %id, "Failed to send status email");
                    }
                }
            }
        }
    }

    Ok(Json(ApiResponse::data(task)))
}

/// Soft-archive a task (admin/manager)
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    require_role(&current, &[Role::Admin, Role::Manager])?;

    Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Task::archive(&state.db, id).await?;
    TaskHistory::record(&state.db, id, current.id, HistoryAction::Archived).await?;

    Ok(Json(ApiResponse::message("Task archived successfully")))
}

/// List a task's audit trail
pub async fn get_task_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<HistoryEntry>>>> {
    let history = TaskHistory::list_for_task(&state.db, id).await?;
    Ok(Json(ApiResponse::data(history)))
}

/// List a task's comments
pub async fn get_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<CommentWithAuthor>>>> {
    let comments = Comment::list_for_task(&state.db, id).await?;
    Ok(Json(ApiResponse::data(comments)))
}

/// Post a comment on a task
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddCommentRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Comment>>)> {
    req.validate().map_err(ApiError::from_validation)?;

    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let comment = Comment::create(
        &state.db,
        CreateComment {
            task_id: id,
            user_id: current.id,
            content: req.content,
            parent_comment_id: req.parent_comment_id,
        },
    )
    .await?;

    if let Some(assignee_id) = task.assigned_to {
        if assignee_id != current.id {
            let result = Notification::create(
                &state.db,
                CreateNotification {
                    user_id: assignee_id,
                    task_id: Some(id),
                    notification_type: NotificationType::Comment,
                    title: "New Comment".to_string(),
                    message: format!("{} commented on your task", current.full_name),
                    email_sent: state.config.email.enabled,
                },
            )
            .await;

            if let Err(e) = result {
                tracing::warn!(error = %e, task_id = %id, "Failed to insert comment notification");
            } else if state.config.email.enabled {
                if let Ok(Some(assignee)) = User::find_by_id(&state.db, assignee_id).await {
                    let content = templates::comment_added(
                        &task,
                        &current.full_name,
                        &assignee.full_name,
                        &comment.content,
                        &state.config.api.frontend_url,
                    );
                    if let Err(e) = state.mailer.send(content.to(&assignee.email)).await {
                        tracing::warn!(error = %e, task_id = %id, "Failed to send comment email");
                    }
                }
            }
        }
    }

    Ok((StatusCode::CREATED, Json(ApiResponse::data(comment))))
}

/// Upload an attachment (multipart field "file")
pub async fn upload_attachment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ApiResponse<Attachment>>)> {
    Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let mut uploaded: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let file_name = field
                .file_name()
                .unwrap_or("attachment")
                .to_string();
            let content_type = field.content_type().map(|ct| ct.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

            uploaded = Some((file_name, content_type, data.to_vec()));
            break;
        }
    }

    let Some((file_name, content_type, data)) = uploaded else {
        return Err(ApiError::BadRequest("No file uploaded".to_string()));
    };

    if data.is_empty() {
        return Err(ApiError::BadRequest("No file uploaded".to_string()));
    }

    // Store under a generated name; the original name only lives in the row
    let extension = std::path::Path::new(&file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    let stored_name = format!("{}{}", Uuid::new_v4(), extension);

    let upload_dir = std::path::Path::new(&state.config.uploads.dir);
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to create upload dir: {}", e)))?;
    tokio::fs::write(upload_dir.join(&stored_name), &data)
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to store upload: {}", e)))?;

    let attachment = Attachment::create(
        &state.db,
        CreateAttachment {
            task_id: id,
            file_name,
            file_url: format!("/uploads/{}", stored_name),
            file_size: data.len() as i64,
            file_type: content_type,
            uploaded_by: current.id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::data(attachment))))
}

/// Delete an attachment and its file
pub async fn delete_attachment(
    State(state): State<AppState>,
    Path((id, file_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let attachment = Attachment::find_by_id_and_task(&state.db, file_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attachment not found".to_string()))?;

    // The row is the source of truth; a missing file on disk is not an error
    if let Some(stored_name) = attachment.file_url.strip_prefix("/uploads/") {
        let path = std::path::Path::new(&state.config.uploads.dir).join(stored_name);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(error = %e, path = %path.display(), "Failed to remove attachment file");
        }
    }

    Attachment::delete(&state.db, file_id).await?;

    Ok(Json(ApiResponse::message("Attachment deleted successfully")))
}
