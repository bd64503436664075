/// Task model and database operations
///
/// Tasks are the core entity. Everything here is a parameterized statement;
/// list endpoints build their WHERE clause dynamically from [`TaskFilter`].
/// Archived tasks (`archived_at IS NOT NULL`) are invisible to list queries,
/// dashboards, and scheduler sweeps.
///
/// # Lifecycle
///
/// ```text
/// not_started → in_progress → completed
///            ↘ on_hold     ↘ cancelled
/// completed + is_recurring → regenerated copy (scheduler), source archived
/// completed > 30 days      → archived (scheduler)
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::task::{CreateTask, Task, TaskPriority, TaskType};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, me: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     title: "Review pull requests".to_string(),
///     priority: TaskPriority::High,
///     task_type: TaskType::Utility,
///     created_by: me,
///     ..CreateTask::new("Review pull requests", me)
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, title, description, task_type, priority, status, category_id, \
                            tags, created_by, assigned_to, due_date, start_date, completed_date, \
                            is_recurring, recurrence_pattern, archived_at, created_at, updated_at";

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// Status as its database string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::OnHold => "on_hold",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// True for statuses that still need work (reminder-eligible)
    pub fn is_open(&self) -> bool {
        !matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(TaskStatus::NotStarted),
            "in_progress" => Ok(TaskStatus::InProgress),
            "on_hold" => Ok(TaskStatus::OnHold),
            "completed" => Ok(TaskStatus::Completed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(format!("Unknown task status: {}", other)),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    /// Priority as its database string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            "urgent" => Ok(TaskPriority::Urgent),
            other => Err(format!("Unknown task priority: {}", other)),
        }
    }
}

/// Task type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    File,
    Reminder,
    Utility,
}

impl TaskType {
    /// Type as its database string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::File => "file",
            TaskType::Reminder => "reminder",
            TaskType::Utility => "utility",
        }
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(TaskType::File),
            "reminder" => Ok(TaskType::Reminder),
            "utility" => Ok(TaskType::Utility),
            other => Err(format!("Unknown task type: {}", other)),
        }
    }
}

/// Recurrence frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceFrequency {
    Daily,
    Weekly,
    Monthly,
}

/// Recurrence descriptor stored in `tasks.recurrence_pattern`
///
/// A completed task carrying a pattern is regenerated by the nightly job
/// with its due date advanced by `frequency × interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrencePattern {
    /// How often the task repeats
    pub frequency: RecurrenceFrequency,

    /// Multiplier on the frequency (e.g. weekly × 2 = every 14 days)
    #[serde(default = "default_interval")]
    pub interval: u32,
}

fn default_interval() -> u32 {
    1
}

impl RecurrencePattern {
    /// Parses a pattern from its JSONB representation
    pub fn from_value(value: &JsonValue) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Computes the next due date after `from`
    ///
    /// Monthly recurrence uses calendar months (chrono clamps the day for
    /// short months, so Jan 31 + 1 month = Feb 28/29).
    pub fn next_due_date(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        let interval = self.interval.max(1);
        match self.frequency {
            RecurrenceFrequency::Daily => from + Duration::days(i64::from(interval)),
            RecurrenceFrequency::Weekly => from + Duration::days(7 * i64::from(interval)),
            RecurrenceFrequency::Monthly => from
                .checked_add_months(Months::new(interval))
                .unwrap_or(from),
        }
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Task title
    pub title: String,

    /// Optional long description
    pub description: Option<String>,

    /// Type string (see [`TaskType`])
    pub task_type: String,

    /// Priority string (see [`TaskPriority`])
    pub priority: String,

    /// Status string (see [`TaskStatus`])
    pub status: String,

    /// Category, at most one
    pub category_id: Option<Uuid>,

    /// Free-form tags (JSON array of strings)
    pub tags: JsonValue,

    /// Creator
    pub created_by: Option<Uuid>,

    /// Assignee, at most one
    pub assigned_to: Option<Uuid>,

    /// When the task is due
    pub due_date: Option<DateTime<Utc>>,

    /// When work should start
    pub start_date: Option<DateTime<Utc>>,

    /// Set when the task transitions to completed
    pub completed_date: Option<DateTime<Utc>>,

    /// Whether the task regenerates on completion
    pub is_recurring: bool,

    /// Recurrence descriptor (see [`RecurrencePattern`])
    pub recurrence_pattern: Option<JsonValue>,

    /// Soft-delete timestamp; archived tasks leave default queries
    pub archived_at: Option<DateTime<Utc>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Task joined with assignee/creator/category names, for list and detail views
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TaskDetail {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub task_type: String,
    pub priority: String,
    pub status: String,
    pub category_id: Option<Uuid>,
    pub tags: JsonValue,
    pub created_by: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<JsonValue>,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assigned_to_name: Option<String>,
    pub assigned_to_email: Option<String>,
    pub created_by_name: Option<String>,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
}

const DETAIL_SELECT: &str = r#"
    SELECT t.id, t.title, t.description, t.task_type, t.priority, t.status, t.category_id,
           t.tags, t.created_by, t.assigned_to, t.due_date, t.start_date, t.completed_date,
           t.is_recurring, t.recurrence_pattern, t.archived_at, t.created_at, t.updated_at,
           u.full_name AS assigned_to_name, u.email AS assigned_to_email,
           creator.full_name AS created_by_name,
           c.name AS category_name, c.color AS category_color
    FROM tasks t
    LEFT JOIN users u ON t.assigned_to = u.id
    LEFT JOIN users creator ON t.created_by = creator.id
    LEFT JOIN categories c ON t.category_id = c.id
"#;

/// Filters for the task list endpoint
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category_id: Option<Uuid>,
    /// Assignee filter; list handlers force this to the caller for `user` roles
    pub assigned_to: Option<Uuid>,
    pub task_type: Option<TaskType>,
    /// Case-insensitive substring over title and description
    pub search: Option<String>,
}

impl TaskFilter {
    /// Appends this filter's conditions to a WHERE clause
    ///
    /// Placeholders are numbered starting at `bind`; returns the next free
    /// bind index. Callers must bind values in the same field order.
    fn push_sql(&self, query: &mut String, mut bind: usize) -> usize {
        if self.status.is_some() {
            query.push_str(&format!(" AND t.status = ${}", bind));
            bind += 1;
        }
        if self.priority.is_some() {
            query.push_str(&format!(" AND t.priority = ${}", bind));
            bind += 1;
        }
        if self.category_id.is_some() {
            query.push_str(&format!(" AND t.category_id = ${}", bind));
            bind += 1;
        }
        if self.assigned_to.is_some() {
            query.push_str(&format!(" AND t.assigned_to = ${}", bind));
            bind += 1;
        }
        if self.task_type.is_some() {
            query.push_str(&format!(" AND t.task_type = ${}", bind));
            bind += 1;
        }
        if self.search.is_some() {
            query.push_str(&format!(
                " AND (t.title ILIKE ${0} OR t.description ILIKE ${0})",
                bind
            ));
            bind += 1;
        }
        bind
    }
}

/// Whose tasks a dashboard query covers
///
/// Admins and managers see everything; `user` roles see their assignments.
#[derive(Debug, Clone, Copy)]
pub enum TaskScope {
    All,
    AssignedTo(Uuid),
}

/// Dashboard stat counters
#[derive(Debug, Clone, Serialize)]
pub struct DashboardCounts {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub overdue_tasks: i64,
    pub due_today: i64,
    pub due_this_week: i64,
    pub in_progress: i64,
    /// Completed over total, 0.0–100.0, one decimal
    pub completion_rate: f64,
}

impl DashboardCounts {
    /// Completion rate as a percentage with one decimal place
    pub fn rate(completed: i64, total: i64) -> f64 {
        if total > 0 {
            ((completed as f64 / total as f64) * 1000.0).round() / 10.0
        } else {
            0.0
        }
    }
}

/// Grouped count rows for the chart endpoints
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GroupCount {
    pub label: Option<String>,
    pub count: i64,
}

/// Category chart row (label plus display color)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub name: Option<String>,
    pub color: Option<String>,
    pub count: i64,
}

/// Per-day completion row for the completion chart
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: i64,
}

/// Reminder-eligible task joined with its assignee's contact details
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DueTask {
    pub id: Uuid,
    pub title: String,
    pub priority: String,
    pub status: String,
    pub due_date: DateTime<Utc>,
    pub assigned_to: Uuid,
    pub email: String,
    pub full_name: String,
}

/// Compact task row for the daily digest email
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DigestTask {
    pub id: Uuid,
    pub title: String,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: String,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub task_type: TaskType,
    pub priority: TaskPriority,
    pub category_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
}

impl CreateTask {
    /// A minimal task with defaults matching the schema
    pub fn new(title: &str, created_by: Uuid) -> Self {
        Self {
            title: title.to_string(),
            description: None,
            task_type: TaskType::Utility,
            priority: TaskPriority::Medium,
            category_id: None,
            tags: Vec::new(),
            created_by,
            assigned_to: None,
            due_date: None,
            start_date: None,
            is_recurring: false,
            recurrence_pattern: None,
        }
    }
}

/// A recorded field change, for the audit trail
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: &'static str,
    pub old: String,
    pub new: String,
}

/// Input for updating a task; only `Some` fields are written
///
/// Double-`Option` fields distinguish "leave alone" (`None`) from "clear"
/// (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub task_type: Option<TaskType>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub category_id: Option<Option<Uuid>>,
    pub tags: Option<Vec<String>>,
    pub assigned_to: Option<Option<Uuid>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub start_date: Option<Option<DateTime<Utc>>>,
    pub is_recurring: Option<bool>,
    pub recurrence_pattern: Option<Option<RecurrencePattern>>,
}

fn fmt_opt<T: std::fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "null".to_string(),
    }
}

impl UpdateTask {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.task_type.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.category_id.is_none()
            && self.tags.is_none()
            && self.assigned_to.is_none()
            && self.due_date.is_none()
            && self.start_date.is_none()
            && self.is_recurring.is_none()
            && self.recurrence_pattern.is_none()
    }

    /// Diffs this update against the current row for the audit trail
    ///
    /// Returns one entry per field whose value actually changes.
    pub fn changes(&self, current: &Task) -> Vec<FieldChange> {
        let mut changes = Vec::new();

        if let Some(ref title) = self.title {
            if *title != current.title {
                changes.push(FieldChange {
                    field: "title",
                    old: current.title.clone(),
                    new: title.clone(),
                });
            }
        }
        if let Some(ref description) = self.description {
            if *description != current.description {
                changes.push(FieldChange {
                    field: "description",
                    old: fmt_opt(&current.description),
                    new: fmt_opt(description),
                });
            }
        }
        if let Some(task_type) = self.task_type {
            if task_type.as_str() != current.task_type {
                changes.push(FieldChange {
                    field: "task_type",
                    old: current.task_type.clone(),
                    new: task_type.as_str().to_string(),
                });
            }
        }
        if let Some(priority) = self.priority {
            if priority.as_str() != current.priority {
                changes.push(FieldChange {
                    field: "priority",
                    old: current.priority.clone(),
                    new: priority.as_str().to_string(),
                });
            }
        }
        if let Some(status) = self.status {
            if status.as_str() != current.status {
                changes.push(FieldChange {
                    field: "status",
                    old: current.status.clone(),
                    new: status.as_str().to_string(),
                });
            }
        }
        if let Some(category_id) = self.category_id {
            if category_id != current.category_id {
                changes.push(FieldChange {
                    field: "category_id",
                    old: fmt_opt(&current.category_id),
                    new: fmt_opt(&category_id),
                });
            }
        }
        if let Some(assigned_to) = self.assigned_to {
            if assigned_to != current.assigned_to {
                changes.push(FieldChange {
                    field: "assigned_to",
                    old: fmt_opt(&current.assigned_to),
                    new: fmt_opt(&assigned_to),
                });
            }
        }
        if let Some(due_date) = self.due_date {
            if due_date != current.due_date {
                changes.push(FieldChange {
                    field: "due_date",
                    old: fmt_opt(&current.due_date),
                    new: fmt_opt(&due_date),
                });
            }
        }
        if let Some(start_date) = self.start_date {
            if start_date != current.start_date {
                changes.push(FieldChange {
                    field: "start_date",
                    old: fmt_opt(&current.start_date),
                    new: fmt_opt(&start_date),
                });
            }
        }
        if let Some(is_recurring) = self.is_recurring {
            if is_recurring != current.is_recurring {
                changes.push(FieldChange {
                    field: "is_recurring",
                    old: current.is_recurring.to_string(),
                    new: is_recurring.to_string(),
                });
            }
        }

        changes
    }
}

impl Task {
    /// Creates a new task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let pattern = data
            .recurrence_pattern
            .map(|p| serde_json::to_value(p).unwrap_or(JsonValue::Null));

        sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, task_type, priority, category_id, tags,
                               created_by, assigned_to, due_date, start_date, is_recurring,
                               recurrence_pattern)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.task_type.as_str())
        .bind(data.priority.as_str())
        .bind(data.category_id)
        .bind(serde_json::to_value(data.tags).unwrap_or(JsonValue::Array(Vec::new())))
        .bind(data.created_by)
        .bind(data.assigned_to)
        .bind(data.due_date)
        .bind(data.start_date)
        .bind(data.is_recurring)
        .bind(pattern)
        .fetch_one(pool)
        .await
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a task with assignee/creator/category names joined
    pub async fn find_detail(pool: &PgPool, id: Uuid) -> Result<Option<TaskDetail>, sqlx::Error> {
        sqlx::query_as::<_, TaskDetail>(&format!("{DETAIL_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists unarchived tasks matching the filter, newest first
    pub async fn list(
        pool: &PgPool,
        filter: &TaskFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TaskDetail>, sqlx::Error> {
        let mut query = format!("{DETAIL_SELECT} WHERE t.archived_at IS NULL");
        let next_bind = filter.push_sql(&mut query, 1);
        query.push_str(&format!(
            " ORDER BY t.created_at DESC LIMIT ${} OFFSET ${}",
            next_bind,
            next_bind + 1
        ));

        let mut q = sqlx::query_as::<_, TaskDetail>(&query);
        if let Some(status) = filter.status {
            q = q.bind(status.as_str());
        }
        if let Some(priority) = filter.priority {
            q = q.bind(priority.as_str());
        }
        if let Some(category_id) = filter.category_id {
            q = q.bind(category_id);
        }
        if let Some(assigned_to) = filter.assigned_to {
            q = q.bind(assigned_to);
        }
        if let Some(task_type) = filter.task_type {
            q = q.bind(task_type.as_str());
        }
        if let Some(ref search) = filter.search {
            q = q.bind(format!("%{}%", search));
        }

        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Counts unarchived tasks matching the filter
    pub async fn count(pool: &PgPool, filter: &TaskFilter) -> Result<i64, sqlx::Error> {
        let mut query =
            String::from("SELECT COUNT(*) FROM tasks t WHERE t.archived_at IS NULL");
        filter.push_sql(&mut query, 1);

        let mut q = sqlx::query_as::<_, (i64,)>(&query);
        if let Some(status) = filter.status {
            q = q.bind(status.as_str());
        }
        if let Some(priority) = filter.priority {
            q = q.bind(priority.as_str());
        }
        if let Some(category_id) = filter.category_id {
            q = q.bind(category_id);
        }
        if let Some(assigned_to) = filter.assigned_to {
            q = q.bind(assigned_to);
        }
        if let Some(task_type) = filter.task_type {
            q = q.bind(task_type.as_str());
        }
        if let Some(ref search) = filter.search {
            q = q.bind(format!("%{}%", search));
        }

        let (count,) = q.fetch_one(pool).await?;
        Ok(count)
    }

    /// Updates a task; only `Some` fields in `data` are written
    ///
    /// `updated_at` is always stamped. Setting status to completed also
    /// stamps `completed_date`, which the digest and archive jobs key on.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let mut fields = vec!["updated_at = NOW()".to_string()];
        let mut bind = 2;

        if data.title.is_some() {
            fields.push(format!("title = ${}", bind));
            bind += 1;
        }
        if data.description.is_some() {
            fields.push(format!("description = ${}", bind));
            bind += 1;
        }
        if data.task_type.is_some() {
            fields.push(format!("task_type = ${}", bind));
            bind += 1;
        }
        if data.priority.is_some() {
            fields.push(format!("priority = ${}", bind));
            bind += 1;
        }
        if let Some(status) = data.status {
            fields.push(format!("status = ${}", bind));
            bind += 1;
            if status == TaskStatus::Completed {
                fields.push("completed_date = NOW()".to_string());
            }
        }
        if data.category_id.is_some() {
            fields.push(format!("category_id = ${}", bind));
            bind += 1;
        }
        if data.tags.is_some() {
            fields.push(format!("tags = ${}", bind));
            bind += 1;
        }
        if data.assigned_to.is_some() {
            fields.push(format!("assigned_to = ${}", bind));
            bind += 1;
        }
        if data.due_date.is_some() {
            fields.push(format!("due_date = ${}", bind));
            bind += 1;
        }
        if data.start_date.is_some() {
            fields.push(format!("start_date = ${}", bind));
            bind += 1;
        }
        if data.is_recurring.is_some() {
            fields.push(format!("is_recurring = ${}", bind));
            bind += 1;
        }
        if data.recurrence_pattern.is_some() {
            fields.push(format!("recurrence_pattern = ${}", bind));
        }

        let query = format!(
            "UPDATE tasks SET {} WHERE id = $1 RETURNING {TASK_COLUMNS}",
            fields.join(", ")
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(task_type) = data.task_type {
            q = q.bind(task_type.as_str());
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority.as_str());
        }
        if let Some(status) = data.status {
            q = q.bind(status.as_str());
        }
        if let Some(category_id) = data.category_id {
            q = q.bind(category_id);
        }
        if let Some(tags) = data.tags {
            q = q.bind(serde_json::to_value(tags).unwrap_or(JsonValue::Array(Vec::new())));
        }
        if let Some(assigned_to) = data.assigned_to {
            q = q.bind(assigned_to);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(start_date) = data.start_date {
            q = q.bind(start_date);
        }
        if let Some(is_recurring) = data.is_recurring {
            q = q.bind(is_recurring);
        }
        if let Some(pattern) = data.recurrence_pattern {
            q = q.bind(pattern.map(|p| serde_json::to_value(p).unwrap_or(JsonValue::Null)));
        }

        q.fetch_optional(pool).await
    }

    /// Soft-archives a task
    pub async fn archive(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET archived_at = NOW() WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a user's unarchived assigned tasks, newest first
    pub async fn list_for_assignee(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TaskDetail>, sqlx::Error> {
        sqlx::query_as::<_, TaskDetail>(&format!(
            "{DETAIL_SELECT} WHERE t.assigned_to = $1 AND t.archived_at IS NULL \
             ORDER BY t.created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    // ---- dashboard ---------------------------------------------------------

    async fn scoped_count(
        pool: &PgPool,
        scope: TaskScope,
        extra: &str,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = match scope {
            TaskScope::All => {
                let query =
                    format!("SELECT COUNT(*) FROM tasks WHERE archived_at IS NULL{extra}");
                sqlx::query_as(&query).fetch_one(pool).await?
            }
            TaskScope::AssignedTo(user_id) => {
                let query = format!(
                    "SELECT COUNT(*) FROM tasks WHERE archived_at IS NULL AND assigned_to = $1{extra}"
                );
                sqlx::query_as(&query).bind(user_id).fetch_one(pool).await?
            }
        };

        Ok(count)
    }

    /// Computes the dashboard stat block for a scope
    pub async fn dashboard_counts(
        pool: &PgPool,
        scope: TaskScope,
    ) -> Result<DashboardCounts, sqlx::Error> {
        let total_tasks = Self::scoped_count(pool, scope, "").await?;
        let completed_tasks = Self::scoped_count(pool, scope, " AND status = 'completed'").await?;
        let overdue_tasks = Self::scoped_count(
            pool,
            scope,
            " AND due_date < NOW() AND status NOT IN ('completed', 'cancelled')",
        )
        .await?;
        let due_today = Self::scoped_count(pool, scope, " AND due_date::date = CURRENT_DATE").await?;
        let due_this_week = Self::scoped_count(
            pool,
            scope,
            " AND due_date >= CURRENT_DATE AND due_date < CURRENT_DATE + INTERVAL '7 days'",
        )
        .await?;
        let in_progress = Self::scoped_count(pool, scope, " AND status = 'in_progress'").await?;

        Ok(DashboardCounts {
            total_tasks,
            completed_tasks,
            overdue_tasks,
            due_today,
            due_this_week,
            in_progress,
            completion_rate: DashboardCounts::rate(completed_tasks, total_tasks),
        })
    }

    /// Completed-task counts per day over the last `days` days (sparse)
    pub async fn completion_by_day(
        pool: &PgPool,
        scope: TaskScope,
        days: i32,
    ) -> Result<Vec<DailyCount>, sqlx::Error> {
        match scope {
            TaskScope::All => {
                sqlx::query_as::<_, DailyCount>(
                    r#"
                    SELECT updated_at::date AS day, COUNT(*) AS count
                    FROM tasks
                    WHERE archived_at IS NULL AND status = 'completed'
                      AND updated_at >= CURRENT_DATE - make_interval(days => $1)
                    GROUP BY day
                    ORDER BY day ASC
                    "#,
                )
                .bind(days)
                .fetch_all(pool)
                .await
            }
            TaskScope::AssignedTo(user_id) => {
                sqlx::query_as::<_, DailyCount>(
                    r#"
                    SELECT updated_at::date AS day, COUNT(*) AS count
                    FROM tasks
                    WHERE archived_at IS NULL AND status = 'completed' AND assigned_to = $2
                      AND updated_at >= CURRENT_DATE - make_interval(days => $1)
                    GROUP BY day
                    ORDER BY day ASC
                    "#,
                )
                .bind(days)
                .bind(user_id)
                .fetch_all(pool)
                .await
            }
        }
    }

    /// Task counts grouped by priority, urgent first
    pub async fn counts_by_priority(
        pool: &PgPool,
        scope: TaskScope,
    ) -> Result<Vec<GroupCount>, sqlx::Error> {
        const ORDER: &str = "ORDER BY CASE label \
                             WHEN 'urgent' THEN 1 WHEN 'high' THEN 2 \
                             WHEN 'medium' THEN 3 WHEN 'low' THEN 4 END";

        match scope {
            TaskScope::All => {
                sqlx::query_as::<_, GroupCount>(&format!(
                    "SELECT priority AS label, COUNT(*) AS count FROM tasks \
                     WHERE archived_at IS NULL GROUP BY priority {ORDER}"
                ))
                .fetch_all(pool)
                .await
            }
            TaskScope::AssignedTo(user_id) => {
                sqlx::query_as::<_, GroupCount>(&format!(
                    "SELECT priority AS label, COUNT(*) AS count FROM tasks \
                     WHERE archived_at IS NULL AND assigned_to = $1 GROUP BY priority {ORDER}"
                ))
                .bind(user_id)
                .fetch_all(pool)
                .await
            }
        }
    }

    /// Task counts grouped by category, largest first
    pub async fn counts_by_category(
        pool: &PgPool,
        scope: TaskScope,
    ) -> Result<Vec<CategoryCount>, sqlx::Error> {
        match scope {
            TaskScope::All => {
                sqlx::query_as::<_, CategoryCount>(
                    r#"
                    SELECT c.name, c.color, COUNT(t.id) AS count
                    FROM tasks t
                    LEFT JOIN categories c ON t.category_id = c.id
                    WHERE t.archived_at IS NULL
                    GROUP BY c.id, c.name, c.color
                    ORDER BY count DESC
                    "#,
                )
                .fetch_all(pool)
                .await
            }
            TaskScope::AssignedTo(user_id) => {
                sqlx::query_as::<_, CategoryCount>(
                    r#"
                    SELECT c.name, c.color, COUNT(t.id) AS count
                    FROM tasks t
                    LEFT JOIN categories c ON t.category_id = c.id
                    WHERE t.archived_at IS NULL AND t.assigned_to = $1
                    GROUP BY c.id, c.name, c.color
                    ORDER BY count DESC
                    "#,
                )
                .bind(user_id)
                .fetch_all(pool)
                .await
            }
        }
    }

    /// Task counts grouped by status in kanban column order
    pub async fn counts_by_status(
        pool: &PgPool,
        scope: TaskScope,
    ) -> Result<Vec<GroupCount>, sqlx::Error> {
        const ORDER: &str = "ORDER BY CASE label \
                             WHEN 'not_started' THEN 1 WHEN 'in_progress' THEN 2 \
                             WHEN 'on_hold' THEN 3 WHEN 'completed' THEN 4 \
                             WHEN 'cancelled' THEN 5 END";

        match scope {
            TaskScope::All => {
                sqlx::query_as::<_, GroupCount>(&format!(
                    "SELECT status AS label, COUNT(*) AS count FROM tasks \
                     WHERE archived_at IS NULL GROUP BY status {ORDER}"
                ))
                .fetch_all(pool)
                .await
            }
            TaskScope::AssignedTo(user_id) => {
                sqlx::query_as::<_, GroupCount>(&format!(
                    "SELECT status AS label, COUNT(*) AS count FROM tasks \
                     WHERE archived_at IS NULL AND assigned_to = $1 GROUP BY status {ORDER}"
                ))
                .bind(user_id)
                .fetch_all(pool)
                .await
            }
        }
    }

    // ---- scheduler ---------------------------------------------------------

    /// Tasks due within 24 hours whose assignee opted into reminders
    pub async fn due_within_24h(pool: &PgPool) -> Result<Vec<DueTask>, sqlx::Error> {
        sqlx::query_as::<_, DueTask>(
            r#"
            SELECT t.id, t.title, t.priority, t.status, t.due_date, t.assigned_to,
                   u.email, u.full_name
            FROM tasks t
            JOIN users u ON t.assigned_to = u.id
            JOIN user_settings s ON u.id = s.user_id
            WHERE t.due_date BETWEEN NOW() AND NOW() + INTERVAL '24 hours'
              AND t.status NOT IN ('completed', 'cancelled')
              AND t.archived_at IS NULL
              AND s.email_notifications->>'due_date_reminder' = 'true'
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Digest counter: tasks due today for a user
    pub async fn due_today_count(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        Self::scoped_count(
            pool,
            TaskScope::AssignedTo(user_id),
            " AND due_date::date = CURRENT_DATE",
        )
        .await
    }

    /// Digest counter: tasks the user completed today
    pub async fn completed_today_count(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tasks WHERE assigned_to = $1 AND status = 'completed' \
             AND completed_date::date = CURRENT_DATE",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Digest counter: the user's overdue open tasks
    pub async fn overdue_count(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        Self::scoped_count(
            pool,
            TaskScope::AssignedTo(user_id),
            " AND due_date < NOW() AND status NOT IN ('completed', 'cancelled')",
        )
        .await
    }

    /// Digest counter: the user's in-progress tasks
    pub async fn in_progress_count(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        Self::scoped_count(
            pool,
            TaskScope::AssignedTo(user_id),
            " AND status = 'in_progress'",
        )
        .await
    }

    /// Up to `limit` of the user's tasks due today, most urgent first
    pub async fn due_today_list(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<DigestTask>, sqlx::Error> {
        sqlx::query_as::<_, DigestTask>(
            r#"
            SELECT id, title, due_date, priority
            FROM tasks
            WHERE assigned_to = $1 AND due_date::date = CURRENT_DATE AND archived_at IS NULL
            ORDER BY CASE priority
                     WHEN 'urgent' THEN 1 WHEN 'high' THEN 2
                     WHEN 'medium' THEN 3 WHEN 'low' THEN 4 END,
                     due_date ASC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Archives completed tasks whose completion is older than `cutoff`
    ///
    /// Returns the number of tasks archived.
    pub async fn archive_completed_before(
        pool: &PgPool,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET archived_at = NOW() \
             WHERE status = 'completed' AND completed_date < $1 AND archived_at IS NULL",
        )
        .bind(cutoff)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Completed, unarchived recurring tasks awaiting regeneration
    pub async fn list_completed_recurring(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE is_recurring = TRUE AND status = 'completed' AND archived_at IS NULL"
        ))
        .fetch_all(pool)
        .await
    }

    /// Clones a recurring task with a new due date and fresh start date
    ///
    /// The copy inherits everything else (including the pattern) and starts
    /// in the default `not_started` status. Returns the new task's ID.
    pub async fn spawn_next_occurrence(
        pool: &PgPool,
        source_id: Uuid,
        new_due: DateTime<Utc>,
        new_start: DateTime<Utc>,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO tasks (title, description, task_type, priority, category_id, tags,
                               created_by, assigned_to, due_date, start_date, is_recurring,
                               recurrence_pattern)
            SELECT title, description, task_type, priority, category_id, tags,
                   created_by, assigned_to, $2, $3, is_recurring, recurrence_pattern
            FROM tasks WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(source_id)
        .bind(new_due)
        .bind(new_start)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|(id,)| id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_task() -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Write report".to_string(),
            description: Some("Quarterly numbers".to_string()),
            task_type: "utility".to_string(),
            priority: "medium".to_string(),
            status: "not_started".to_string(),
            category_id: None,
            tags: serde_json::json!([]),
            created_by: Some(Uuid::new_v4()),
            assigned_to: None,
            due_date: None,
            start_date: None,
            completed_date: None,
            is_recurring: false,
            recurrence_pattern: None,
            archived_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_roundtrip_and_openness() {
        for status in [
            TaskStatus::NotStarted,
            TaskStatus::InProgress,
            TaskStatus::OnHold,
            TaskStatus::Completed,
            TaskStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }

        assert!(TaskStatus::NotStarted.is_open());
        assert!(TaskStatus::OnHold.is_open());
        assert!(!TaskStatus::Completed.is_open());
        assert!(!TaskStatus::Cancelled.is_open());
    }

    #[test]
    fn test_priority_and_type_parse() {
        assert_eq!("urgent".parse::<TaskPriority>().unwrap(), TaskPriority::Urgent);
        assert!("critical".parse::<TaskPriority>().is_err());
        assert_eq!("reminder".parse::<TaskType>().unwrap(), TaskType::Reminder);
        assert!("chore".parse::<TaskType>().is_err());
    }

    #[test]
    fn test_recurrence_daily() {
        let pattern = RecurrencePattern {
            frequency: RecurrenceFrequency::Daily,
            interval: 3,
        };
        let from = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(
            pattern.next_due_date(from),
            Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_recurrence_weekly_interval_two_is_fourteen_days() {
        let pattern = RecurrencePattern {
            frequency: RecurrenceFrequency::Weekly,
            interval: 2,
        };
        let from = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        assert_eq!(
            pattern.next_due_date(from),
            Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_recurrence_monthly_clamps_short_months() {
        let pattern = RecurrencePattern {
            frequency: RecurrenceFrequency::Monthly,
            interval: 1,
        };
        let from = Utc.with_ymd_and_hms(2024, 1, 31, 8, 0, 0).unwrap();
        // 2024 is a leap year
        assert_eq!(
            pattern.next_due_date(from),
            Utc.with_ymd_and_hms(2024, 2, 29, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_recurrence_zero_interval_treated_as_one() {
        let pattern = RecurrencePattern {
            frequency: RecurrenceFrequency::Daily,
            interval: 0,
        };
        let from = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(pattern.next_due_date(from), from + Duration::days(1));
    }

    #[test]
    fn test_recurrence_from_value() {
        let value = serde_json::json!({"frequency": "weekly", "interval": 2});
        let pattern = RecurrencePattern::from_value(&value).unwrap();
        assert_eq!(pattern.frequency, RecurrenceFrequency::Weekly);
        assert_eq!(pattern.interval, 2);

        // interval defaults to 1 when absent
        let value = serde_json::json!({"frequency": "daily"});
        assert_eq!(RecurrencePattern::from_value(&value).unwrap().interval, 1);

        assert!(RecurrencePattern::from_value(&serde_json::json!("weekly")).is_none());
    }

    #[test]
    fn test_filter_sql_numbering() {
        let filter = TaskFilter {
            status: Some(TaskStatus::InProgress),
            search: Some("report".to_string()),
            ..Default::default()
        };

        let mut query = String::from("WHERE t.archived_at IS NULL");
        let next = filter.push_sql(&mut query, 1);

        assert_eq!(next, 3);
        assert!(query.contains("t.status = $1"));
        assert!(query.contains("t.title ILIKE $2 OR t.description ILIKE $2"));
    }

    #[test]
    fn test_filter_sql_empty() {
        let mut query = String::from("WHERE TRUE");
        let next = TaskFilter::default().push_sql(&mut query, 1);
        assert_eq!(next, 1);
        assert_eq!(query, "WHERE TRUE");
    }

    #[test]
    fn test_completion_rate() {
        assert_eq!(DashboardCounts::rate(0, 0), 0.0);
        assert_eq!(DashboardCounts::rate(1, 3), 33.3);
        assert_eq!(DashboardCounts::rate(3, 3), 100.0);
    }

    #[test]
    fn test_update_changes_diff() {
        let task = sample_task();
        let update = UpdateTask {
            title: Some("Write report".to_string()), // unchanged
            status: Some(TaskStatus::InProgress),
            priority: Some(TaskPriority::High),
            ..Default::default()
        };

        let changes = update.changes(&task);
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().any(|c| c.field == "status"
            && c.old == "not_started"
            && c.new == "in_progress"));
        assert!(changes.iter().any(|c| c.field == "priority" && c.new == "high"));
    }

    #[test]
    fn test_update_changes_clearing_field() {
        let mut task = sample_task();
        task.assigned_to = Some(Uuid::new_v4());

        let update = UpdateTask {
            assigned_to: Some(None),
            ..Default::default()
        };

        let changes = update.changes(&task);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "assigned_to");
        assert_eq!(changes[0].new, "null");
    }

    #[test]
    fn test_update_task_is_empty() {
        assert!(UpdateTask::default().is_empty());
        assert!(!UpdateTask {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        }
        .is_empty());
    }
}
