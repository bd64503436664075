/// HTML email templates
///
/// Each template renders a subject plus standalone HTML body. Markup is
/// inline-styled for mail clients; links point back into the frontend via the
/// configured `FRONTEND_URL`.

use crate::models::task::{DigestTask, DueTask, Task};
use chrono::{DateTime, Utc};

/// A rendered subject and body, addressed by the caller
#[derive(Debug, Clone)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
}

impl EmailContent {
    /// Addresses this content to a recipient
    pub fn to(self, recipient: &str) -> super::EmailMessage {
        super::EmailMessage {
            to: recipient.to_string(),
            subject: self.subject,
            html: self.html,
        }
    }
}

/// Summary figures for the daily digest email
#[derive(Debug, Clone, Default)]
pub struct DigestData {
    pub due_today: i64,
    pub completed: i64,
    pub overdue: i64,
    pub in_progress: i64,
    pub tasks: Vec<DigestTask>,
}

/// Display color for a priority level
fn priority_color(priority: &str) -> &'static str {
    match priority {
        "urgent" => "#FA5252",
        "high" => "#FD7E14",
        "medium" => "#FAB005",
        _ => "#40C057",
    }
}

/// "in_progress" -> "IN PROGRESS"
fn humanize_status(status: &str) -> String {
    status.replace('_', " ").to_uppercase()
}

fn fmt_date(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(d) => d.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => "Not set".to_string(),
    }
}

fn task_link(frontend_url: &str, task_id: uuid::Uuid) -> String {
    format!(
        r#"<p><a href="{frontend_url}/tasks/{task_id}" style="background-color: #228BE6; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px; display: inline-block;">View Task</a></p>"#
    )
}

/// Email sent when a task is assigned to someone else
pub fn task_assignment(
    task: &Task,
    assigned_by: &str,
    recipient_name: &str,
    frontend_url: &str,
) -> EmailContent {
    let description = match &task.description {
        Some(d) => format!("<p><strong>Description:</strong></p><div>{}</div>", d),
        None => String::new(),
    };

    EmailContent {
        subject: format!("New Task Assigned: {}", task.title),
        html: format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #228BE6;">New Task Assigned</h2>
  <p>Hi {recipient_name},</p>
  <p>You have been assigned a new task by <strong>{assigned_by}</strong>:</p>
  <div style="background-color: #f5f5f5; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <h3 style="margin-top: 0;">{title}</h3>
    <p><strong>Priority:</strong> <span style="color: {color};">{priority}</span></p>
    <p><strong>Due Date:</strong> {due}</p>
    {description}
  </div>
  {link}
</div>"#,
            title = task.title,
            color = priority_color(&task.priority),
            priority = task.priority.to_uppercase(),
            due = fmt_date(task.due_date),
            link = task_link(frontend_url, task.id),
        ),
    }
}

/// Email sent to the assignee when a task's status changes
pub fn status_update(
    task: &Task,
    recipient_name: &str,
    old_status: &str,
    new_status: &str,
    changed_by: &str,
    frontend_url: &str,
) -> EmailContent {
    EmailContent {
        subject: format!("Task Status Updated: {}", task.title),
        html: format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #40C057;">Task Status Updated</h2>
  <p>Hi {recipient_name},</p>
  <p>The status of your task has been updated by <strong>{changed_by}</strong>:</p>
  <div style="background-color: #f5f5f5; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <h3 style="margin-top: 0;">{title}</h3>
    <p>Status changed from <strong>{old}</strong> to <strong style="color: #40C057;">{new}</strong></p>
  </div>
  {link}
</div>"#,
            title = task.title,
            old = humanize_status(old_status),
            new = humanize_status(new_status),
            link = task_link(frontend_url, task.id),
        ),
    }
}

/// Email sent to the assignee when someone comments on their task
pub fn comment_added(
    task: &Task,
    commenter: &str,
    recipient_name: &str,
    content: &str,
    frontend_url: &str,
) -> EmailContent {
    EmailContent {
        subject: format!("New Comment on: {}", task.title),
        html: format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #228BE6;">New Comment</h2>
  <p>Hi {recipient_name},</p>
  <p><strong>{commenter}</strong> commented on your task <strong>{title}</strong>:</p>
  <div style="background-color: #f8f9fa; padding: 15px; border-radius: 8px; border-left: 4px solid #228BE6; margin: 20px 0;">
    {content}
  </div>
  {link}
</div>"#,
            title = task.title,
            link = task_link(frontend_url, task.id),
        ),
    }
}

/// Reminder email for a task due within 24 hours
pub fn due_date_reminder(task: &DueTask, frontend_url: &str) -> EmailContent {
    EmailContent {
        subject: format!("Reminder: Task \"{}\" is due soon", task.title),
        html: format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #FAB005;">⏰ Task Due Date Reminder</h2>
  <p>Hi {name},</p>
  <p>This is a friendly reminder that your task is due soon:</p>
  <div style="background-color: #fff9db; padding: 20px; border-radius: 8px; margin: 20px 0; border-left: 4px solid #FAB005;">
    <h3 style="margin-top: 0;">{title}</h3>
    <p><strong>Due Date:</strong> {due}</p>
    <p><strong>Priority:</strong> <span style="color: {color};">{priority}</span></p>
    <p><strong>Status:</strong> {status}</p>
  </div>
  {link}
  <p>Don't forget to update the status when completed!</p>
</div>"#,
            name = task.full_name,
            title = task.title,
            due = fmt_date(Some(task.due_date)),
            color = priority_color(&task.priority),
            priority = task.priority.to_uppercase(),
            status = humanize_status(&task.status),
            link = task_link(frontend_url, task.id),
        ),
    }
}

/// Morning summary email of a user's task state
pub fn daily_digest(recipient_name: &str, data: &DigestData) -> EmailContent {
    let task_list = if data.tasks.is_empty() {
        String::new()
    } else {
        let items: String = data
            .tasks
            .iter()
            .map(|t| {
                format!(
                    r#"<li style="background-color: #f8f9fa; padding: 10px; margin: 10px 0; border-radius: 4px;"><strong>{}</strong><br><small>Due: {} | Priority: {}</small></li>"#,
                    t.title,
                    fmt_date(t.due_date),
                    t.priority
                )
            })
            .collect();
        format!(
            r#"<h3>Your Tasks:</h3><ul style="list-style: none; padding: 0;">{items}</ul>"#
        )
    };

    EmailContent {
        subject: format!(
            "Your Daily Task Summary - {}",
            Utc::now().format("%Y-%m-%d")
        ),
        html: format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #228BE6;">📋 Daily Task Summary</h2>
  <p>Hi {recipient_name},</p>
  <p>Here's your task summary for today:</p>
  <div style="margin: 20px 0;">
    <div style="background-color: #e7f5ff; padding: 15px; border-radius: 8px; text-align: center; margin: 10px 0;">
      <h3 style="margin: 0; color: #228BE6;">{due_today}</h3><p style="margin: 5px 0 0 0;">Due Today</p>
    </div>
    <div style="background-color: #d3f9d8; padding: 15px; border-radius: 8px; text-align: center; margin: 10px 0;">
      <h3 style="margin: 0; color: #40C057;">{completed}</h3><p style="margin: 5px 0 0 0;">Completed</p>
    </div>
    <div style="background-color: #ffe3e3; padding: 15px; border-radius: 8px; text-align: center; margin: 10px 0;">
      <h3 style="margin: 0; color: #FA5252;">{overdue}</h3><p style="margin: 5px 0 0 0;">Overdue</p>
    </div>
    <div style="background-color: #fff3bf; padding: 15px; border-radius: 8px; text-align: center; margin: 10px 0;">
      <h3 style="margin: 0; color: #FAB005;">{in_progress}</h3><p style="margin: 5px 0 0 0;">In Progress</p>
    </div>
  </div>
  {task_list}
</div>"#,
            due_today = data.due_today,
            completed = data.completed,
            overdue = data.overdue,
            in_progress = data.in_progress,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_task() -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Deploy release".to_string(),
            description: Some("Ship v2".to_string()),
            task_type: "utility".to_string(),
            priority: "urgent".to_string(),
            status: "in_progress".to_string(),
            category_id: None,
            tags: serde_json::json!([]),
            created_by: Some(Uuid::new_v4()),
            assigned_to: Some(Uuid::new_v4()),
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
    fn test_priority_color_mapping() {
        assert_eq!(priority_color("urgent"), "#FA5252");
        assert_eq!(priority_color("high"), "#FD7E14");
        assert_eq!(priority_color("medium"), "#FAB005");
        assert_eq!(priority_color("low"), "#40C057");
        assert_eq!(priority_color("whatever"), "#40C057");
    }

    #[test]
    fn test_humanize_status() {
        assert_eq!(humanize_status("in_progress"), "IN PROGRESS");
        assert_eq!(humanize_status("completed"), "COMPLETED");
    }

    #[test]
    fn test_task_assignment_template() {
        let task = sample_task();
        let content = task_assignment(&task, "Alice Admin", "Bob", "http://localhost:3000");

        assert_eq!(content.subject, "New Task Assigned: Deploy release");
        assert!(content.html.contains("Alice Admin"));
        assert!(content.html.contains("Hi Bob"));
        assert!(content.html.contains("URGENT"));
        assert!(content.html.contains(&format!("/tasks/{}", task.id)));
    }

    #[test]
    fn test_status_update_template() {
        let task = sample_task();
        let content = status_update(
            &task,
            "Bob",
            "not_started",
            "in_progress",
            "Alice Admin",
            "http://localhost:3000",
        );

        assert!(content.subject.contains("Deploy release"));
        assert!(content.html.contains("NOT STARTED"));
        assert!(content.html.contains("IN PROGRESS"));
    }

    #[test]
    fn test_daily_digest_template() {
        let data = DigestData {
            due_today: 2,
            completed: 1,
            overdue: 3,
            in_progress: 4,
            tasks: vec![DigestTask {
                id: Uuid::new_v4(),
                title: "Prepare slides".to_string(),
                due_date: Some(Utc::now()),
                priority: "high".to_string(),
            }],
        };

        let content = daily_digest("Bob", &data);
        assert!(content.subject.starts_with("Your Daily Task Summary"));
        assert!(content.html.contains("Prepare slides"));
        assert!(content.html.contains("Due Today"));
    }

    #[test]
    fn test_daily_digest_without_tasks_omits_list() {
        let content = daily_digest("Bob", &DigestData::default());
        assert!(!content.html.contains("Your Tasks:"));
    }

    #[test]
    fn test_email_content_addressing() {
        let message = EmailContent {
            subject: "s".to_string(),
            html: "<p>b</p>".to_string(),
        }
        .to("x@y.z");

        assert_eq!(message.to, "x@y.z");
        assert_eq!(message.subject, "s");
    }
}
