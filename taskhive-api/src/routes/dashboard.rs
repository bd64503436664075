/// Dashboard endpoints
///
/// Admins and managers see the whole workspace; `user` roles see their own
/// assignments.
///
/// # Endpoints
///
/// - `GET /api/dashboard/stats` - Counters and completion rate
/// - `GET /api/dashboard/recent` - Recent activity on the caller's tasks
/// - `GET /api/dashboard/charts?type=completion|priority|category|status&days=N`
/// - `GET /api/dashboard/tasks-by-status` - Kanban column counts

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::ApiResponse,
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use taskhive_shared::{
    auth::middleware::CurrentUser,
    models::{
        history::{HistoryEntry, TaskHistory},
        task::{CategoryCount, DailyCount, DashboardCounts, GroupCount, Task, TaskScope},
        user::Role,
    },
};

/// Query parameters for recent activity
#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

/// Query parameters for chart data
#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    #[serde(rename = "type")]
    pub chart_type: Option<String>,
    pub days: Option<i32>,
}

/// One point on the completion chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub count: i64,
}

/// Chart payload, one variant per chart type
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ChartData {
    Completion(Vec<DailyPoint>),
    Groups(Vec<GroupCount>),
    Categories(Vec<CategoryCount>),
}

fn scope_for(user: &CurrentUser) -> TaskScope {
    match user.role {
        Role::Admin | Role::Manager => TaskScope::All,
        Role::User => TaskScope::AssignedTo(user.id),
    }
}

/// Zero-fills the sparse per-day completion rows over the last `days` days
fn fill_missing_days(rows: &[DailyCount], days: i32, today: NaiveDate) -> Vec<DailyPoint> {
    (0..days.max(1))
        .rev()
        .map(|offset| {
            let date = today - Duration::days(i64::from(offset));
            let count = rows
                .iter()
                .find(|r| r.day == date)
                .map(|r| r.count)
                .unwrap_or(0);
            DailyPoint { date, count }
        })
        .collect()
}

/// Dashboard counters and completion rate
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<ApiResponse<DashboardCounts>>> {
    let counts = Task::dashboard_counts(&state.db, scope_for(&current)).await?;
    Ok(Json(ApiResponse::data(counts)))
}

/// Recent activity on the caller's created or assigned tasks
pub async fn get_recent_activity(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<ApiResponse<Vec<HistoryEntry>>>> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let entries = TaskHistory::recent_for_user(&state.db, current.id, limit).await?;
    Ok(Json(ApiResponse::data(entries)))
}

/// Chart data by type
pub async fn get_chart_data(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ChartQuery>,
) -> ApiResult<Json<ApiResponse<ChartData>>> {
    let scope = scope_for(&current);
    let chart_type = query.chart_type.as_deref().unwrap_or("completion");

    let data = match chart_type {
        "completion" => {
            let days = query.days.unwrap_or(7).clamp(1, 365);
            let rows = Task::completion_by_day(&state.db, scope, days).await?;
            ChartData::Completion(fill_missing_days(&rows, days, Utc::now().date_naive()))
        }
        "priority" => ChartData::Groups(Task::counts_by_priority(&state.db, scope).await?),
        "category" => ChartData::Categories(Task::counts_by_category(&state.db, scope).await?),
        "status" => ChartData::Groups(Task::counts_by_status(&state.db, scope).await?),
        other => {
            return Err(ApiError::BadRequest(format!(
                "Invalid chart type: {}",
                other
            )))
        }
    };

    Ok(Json(ApiResponse::data(data)))
}

/// Task counts per status in kanban order
pub async fn get_tasks_by_status(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<ApiResponse<Vec<GroupCount>>>> {
    let counts = Task::counts_by_status(&state.db, scope_for(&current)).await?;
    Ok(Json(ApiResponse::data(counts)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_missing_days_zero_fills() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let rows = vec![DailyCount {
            day: NaiveDate::from_ymd_opt(2024, 6, 9).unwrap(),
            count: 4,
        }];

        let points = fill_missing_days(&rows, 3, today);

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 6, 8).unwrap());
        assert_eq!(points[0].count, 0);
        assert_eq!(points[1].count, 4);
        assert_eq!(points[2].date, today);
        assert_eq!(points[2].count, 0);
    }

    #[test]
    fn test_fill_missing_days_minimum_one_day() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let points = fill_missing_days(&[], 0, today);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, today);
    }
}
