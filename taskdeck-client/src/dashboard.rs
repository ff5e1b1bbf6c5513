//! Terminal dashboard
//!
//! Loads the first workspace, its first project and that project's tasks,
//! then renders them as plain text.

use std::fmt::Write;

use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::ClientResult;
use crate::types::{Attachment, AttachmentSummary, Project, ProjectDetail, Task, TaskStats, Workspace};

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub workspaces: Vec<Workspace>,
    pub selected_workspace: Option<Uuid>,
    pub projects: Vec<Project>,
    pub selected_project: Option<ProjectDetail>,
    pub tasks: Vec<Task>,
}

/// Loads the dashboard, optionally selecting a workspace or project other
/// than the first one
pub async fn load_dashboard(
    client: &ApiClient,
    workspace_id: Option<Uuid>,
    project_id: Option<Uuid>,
) -> ClientResult<Dashboard> {
    let workspaces = client.workspaces().await?;
    let selected_workspace = workspace_id.or_else(|| workspaces.first().map(|w| w.id));

    let projects = match selected_workspace {
        Some(id) => client.projects(Some(id)).await?,
        None => Vec::new(),
    };

    let (selected_project, tasks) = match project_id.or_else(|| projects.first().map(|p| p.id)) {
        Some(id) => {
            let detail = client.project(id).await?;
            let tasks = client.tasks(Some(id)).await?;
            (Some(detail), tasks)
        }
        None => (None, Vec::new()),
    };

    tracing::debug!(
        workspaces = workspaces.len(),
        projects = projects.len(),
        tasks = tasks.len(),
        "Dashboard loaded"
    );

    Ok(Dashboard {
        workspaces,
        selected_workspace,
        projects,
        selected_project,
        tasks,
    })
}

fn marker(selected: bool) -> &'static str {
    if selected {
        "*"
    } else {
        " "
    }
}

pub fn render_dashboard(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    let selected_project = dashboard.selected_project.as_ref().map(|p| p.project.id);

    let _ = writeln!(out, "Workspaces");
    if dashboard.workspaces.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for workspace in &dashboard.workspaces {
        let _ = writeln!(
            out,
            "{} {}  {}",
            marker(dashboard.selected_workspace == Some(workspace.id)),
            workspace.name,
            workspace.id
        );
    }

    let _ = writeln!(out, "\nProjects");
    if dashboard.projects.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for project in &dashboard.projects {
        let _ = writeln!(
            out,
            "{} {}  {}",
            marker(selected_project == Some(project.id)),
            project.name,
            project.id
        );
    }

    if let Some(detail) = &dashboard.selected_project {
        let _ = writeln!(out, "\n{}", detail.project.name);
        out.push_str(&render_stats(&detail.stats));
    }

    let _ = writeln!(out, "\nTasks");
    if dashboard.tasks.is_empty() {
        let _ = writeln!(out, "No tasks in this project.");
    } else {
        out.push_str(&render_tasks(&dashboard.tasks));
    }

    out
}

/// Stats card for one project
pub fn render_stats(stats: &TaskStats) -> String {
    format!(
        "  Total {}  |  To do {}  |  In progress {}  |  Done {}  |  High priority {}\n",
        stats.total, stats.todo, stats.in_progress, stats.done, stats.high_priority
    )
}

pub fn render_projects(projects: &[Project]) -> String {
    if projects.is_empty() {
        return "No projects.\n".to_string();
    }

    let mut out = String::new();
    for project in projects {
        let _ = writeln!(
            out,
            "{}  {:<30}  {}",
            project.id,
            project.name,
            project.description.as_deref().unwrap_or("")
        );
    }
    out
}

/// Task table: id, status, priority, due date, title
pub fn render_tasks(tasks: &[Task]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<36}  {:<11}  {:<8}  {:<10}  TITLE",
        "ID", "STATUS", "PRIORITY", "DUE"
    );

    for task in tasks {
        let due = task
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());

        let _ = writeln!(
            out,
            "{:<36}  {:<11}  {:<8}  {:<10}  {}",
            task.id,
            task.status.to_string(),
            task.priority.to_string(),
            due,
            task.title
        );
    }
    out
}

pub fn render_task(task: &Task) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", task.title);
    let _ = writeln!(out, "  id        {}", task.id);
    let _ = writeln!(out, "  project   {}", task.project_id);
    let _ = writeln!(out, "  status    {}", task.status);
    let _ = writeln!(out, "  priority  {}", task.priority);
    if let Some(due) = task.due_date {
        let _ = writeln!(out, "  due       {}", due.to_rfc3339());
    }
    if let Some(assignee) = task.assignee_id {
        let _ = writeln!(out, "  assignee  {}", assignee);
    }
    if let Some(description) = &task.description {
        let _ = writeln!(out, "\n  {}", description);
    }
    out
}

pub fn render_attachment(attachment: &Attachment) -> String {
    format!(
        "{}  {}  {} ({} bytes)\n",
        attachment.id, attachment.file_name, attachment.content_type, attachment.size_bytes
    )
}

pub fn render_attachments(attachments: &[AttachmentSummary]) -> String {
    if attachments.is_empty() {
        return "No attachments.\n".to_string();
    }

    let mut out = String::new();
    for attachment in attachments {
        let _ = writeln!(
            out,
            "{}  {}  {}",
            attachment.id,
            attachment.created_at.format("%Y-%m-%d %H:%M"),
            attachment.file_name
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TaskPriority, TaskStatus};
    use chrono::{TimeZone, Utc};

    fn task(title: &str, status: TaskStatus) -> Task {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        Task {
            id: Uuid::nil(),
            title: title.to_string(),
            description: None,
            status,
            priority: TaskPriority::High,
            due_date: Some(at),
            assignee_id: None,
            project_id: Uuid::nil(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_task_table_rows() {
        let table = render_tasks(&[task("Ship it", TaskStatus::InProgress)]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].contains("in_progress"));
        assert!(lines[1].contains("high"));
        assert!(lines[1].contains("2026-03-01"));
        assert!(lines[1].ends_with("Ship it"));
    }

    #[test]
    fn test_stats_card() {
        let stats = TaskStats {
            total: 3,
            todo: 1,
            in_progress: 1,
            done: 1,
            high_priority: 2,
        };

        let card = render_stats(&stats);
        assert!(card.contains("Total 3"));
        assert!(card.contains("High priority 2"));
    }

    #[test]
    fn test_empty_dashboard() {
        let dashboard = Dashboard {
            workspaces: Vec::new(),
            selected_workspace: None,
            projects: Vec::new(),
            selected_project: None,
            tasks: Vec::new(),
        };

        let out = render_dashboard(&dashboard);
        assert!(out.contains("No tasks in this project."));
        assert_eq!(out.matches("(none)").count(), 2);
    }
}
