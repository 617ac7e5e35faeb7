//! Plain-text rendering of boards, projects, and comment threads.
//!
//! Functions return strings so commands decide where output goes; styling
//! degrades to plain text when stdout is not a terminal.

use std::fmt::Write;

use console::{Style, style};
use uuid::Uuid;

use taskflow_common::{Comment, InvalidTaskRow, Priority, Profile, Project, Task};

use super::icons;
use crate::board::{BoardView, ColumnView};

/// Characters of a UUID shown in listings; also accepted as a task reference.
pub const SHORT_ID_LEN: usize = 8;

pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..SHORT_ID_LEN].to_string()
}

/// Up to two initials from a display name or email address.
pub fn initials(name: &str) -> String {
    let name = name.split('@').next().unwrap_or(name);
    name.split(|c: char| c.is_whitespace() || c == '.' || c == '_' || c == '-')
        .filter_map(|part| part.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

pub fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::Low => Style::new().dim(),
        Priority::Medium => Style::new().yellow(),
        Priority::High => Style::new().color256(208),
        Priority::Urgent => Style::new().red().bold(),
    }
}

pub fn task_line(task: &Task) -> String {
    let mut line = format!(
        "{} {}{}  {}",
        style(short_id(&task.id)).dim(),
        icons::task_type(task.task_type),
        task.title,
        priority_style(task.priority).apply_to(task.priority.as_str()),
    );
    if let Some(assignee) = &task.assignee {
        let _ = write!(line, "  {}{}", icons::USER, assignee.display_name());
    }
    line
}

fn column_block(column: &ColumnView) -> String {
    let mut out = format!(
        "{} {}\n",
        style(column.label()).bold(),
        style(format!("({})", column.count())).dim()
    );
    if column.is_empty() {
        let _ = writeln!(out, "  {}", style(ColumnView::EMPTY_LABEL).dim());
    }
    for task in &column.tasks {
        let _ = writeln!(out, "  {}", task_line(task));
        if let Some(description) = &task.description {
            let first = description.lines().next().unwrap_or_default();
            let _ = writeln!(out, "      {}", style(first).dim());
        }
    }
    out
}

pub fn board(view: &BoardView) -> String {
    let mut out = String::new();
    if let Some(project) = &view.project {
        let _ = writeln!(
            out,
            "{}{} {}",
            icons::FOLDER,
            style(&project.name).bold(),
            style(format!("[{}]", project.key)).cyan()
        );
        if let Some(description) = &project.description {
            let _ = writeln!(out, "{}", style(description).dim());
        }
        out.push('\n');
    }
    for column in &view.columns {
        out.push_str(&column_block(column));
        out.push('\n');
    }
    for invalid in &view.rejected {
        let _ = writeln!(
            out,
            "{}{} skipped: unknown {} '{}'",
            icons::WARN,
            short_id(&invalid.task_id),
            invalid.field,
            invalid.value
        );
    }
    out
}

pub fn task_detail(task: &Task) -> String {
    let mut out = format!(
        "{}{}\n",
        icons::task_type(task.task_type),
        style(&task.title).bold()
    );
    let _ = writeln!(out, "  id:       {}", task.id);
    let _ = writeln!(out, "  status:   {}", task.status.label());
    let _ = writeln!(
        out,
        "  priority: {}",
        priority_style(task.priority).apply_to(task.priority.as_str())
    );
    let _ = writeln!(out, "  type:     {}", task.task_type);
    if let Some(assignee) = &task.assignee {
        let _ = writeln!(out, "  assignee: {}", assignee.display_name());
    }
    let _ = writeln!(out, "  created:  {}", task.created_at.format("%b %-d, %Y"));
    if let Some(description) = &task.description {
        let _ = writeln!(out, "\n{}", description);
    }
    out
}

/// Detail view for a row that could not be placed in a column.
pub fn rejected_detail(invalid: &InvalidTaskRow) -> String {
    let mut out = format!(
        "{}{}\n",
        icons::WARN,
        style("Task cannot be placed on the board").yellow().bold()
    );
    let _ = writeln!(out, "  id:       {}", invalid.task_id);
    let _ = writeln!(
        out,
        "  {:<9} '{}' is not recognized",
        format!("{}:", invalid.field),
        invalid.value
    );
    let hint = format!(
        "taskflow task update <project> {} --{} <value>",
        short_id(&invalid.task_id),
        invalid.field
    );
    let _ = writeln!(out, "  Set a valid value with {}", style(hint).cyan());
    out
}

pub fn projects(projects: &[Project]) -> String {
    if projects.is_empty() {
        return format!(
            "No projects yet. Create one with {}\n",
            style("taskflow project create").cyan()
        );
    }
    let mut out = String::new();
    for project in projects {
        let _ = writeln!(
            out,
            "{}{:<10} {}  {}",
            icons::FOLDER,
            style(&project.key).cyan().bold(),
            project.name,
            style(project.created_at.format("%b %-d, %Y")).dim()
        );
        if let Some(description) = &project.description {
            let _ = writeln!(out, "   {}", style(description).dim());
        }
    }
    out
}

pub fn members(profiles: &[Profile]) -> String {
    let mut out = String::new();
    for profile in profiles {
        let _ = writeln!(
            out,
            "{}{} {}",
            icons::USER,
            profile.display_name(),
            style(format!("<{}>", profile.email)).dim()
        );
    }
    out
}

pub fn comments(comments: &[Comment]) -> String {
    if comments.is_empty() {
        return format!("{}\n", style("No comments yet").dim());
    }
    let mut out = String::new();
    for comment in comments {
        let author = comment.author_name();
        let _ = writeln!(
            out,
            "{}{} {} {}",
            icons::COMMENT,
            style(format!("[{}]", initials(author))).cyan(),
            style(author).bold(),
            style(comment.created_at.format("%b %-d, %Y %H:%M")).dim()
        );
        let _ = writeln!(out, "   {}", comment.content);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::partition_by_status;
    use chrono::Utc;
    use taskflow_common::{InvalidTaskRow, ProfileSummary, TaskStatus, TaskType};

    fn task(title: &str, status: TaskStatus) -> Task {
        Task {
            id: Uuid::new_v4(),
            project_id: Uuid::nil(),
            title: title.into(),
            description: None,
            status,
            priority: Priority::High,
            task_type: TaskType::Bug,
            assignee_id: None,
            reporter_id: Uuid::nil(),
            position: 0,
            created_at: Utc::now(),
            assignee: Some(ProfileSummary {
                full_name: Some("Grace Hopper".into()),
                email: "grace@example.com".into(),
            }),
        }
    }

    #[test]
    fn test_short_id_is_prefix_of_simple_form() {
        let id = Uuid::new_v4();
        let short = short_id(&id);
        assert_eq!(short.len(), SHORT_ID_LEN);
        assert!(id.simple().to_string().starts_with(&short));
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("Grace Hopper"), "GH");
        assert_eq!(initials("ada.lovelace@example.com"), "AL");
        assert_eq!(initials("dev@example.com"), "D");
        assert_eq!(initials("Jean Claude Van Damme"), "JC");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn test_task_line_includes_title_priority_and_assignee() {
        let line = task_line(&task("Crash on save", TaskStatus::Todo));
        assert!(line.contains("Crash on save"));
        assert!(line.contains("high"));
        assert!(line.contains("Grace Hopper"));
    }

    #[test]
    fn test_board_shows_labels_counts_and_empty_state() {
        let tasks = vec![task("One", TaskStatus::Todo)];
        let view = BoardView {
            project: None,
            columns: partition_by_status(&tasks),
            rejected: vec![InvalidTaskRow {
                task_id: Uuid::new_v4(),
                field: "status",
                value: "archived".into(),
            }],
        };
        let out = board(&view);
        assert!(out.contains("To Do"));
        assert!(out.contains("(1)"));
        assert!(out.contains("Blocked"));
        assert_eq!(out.matches(ColumnView::EMPTY_LABEL).count(), 3);
        assert!(out.contains("unknown status 'archived'"));
    }

    #[test]
    fn test_rejected_detail_names_field_and_fix() {
        let invalid = InvalidTaskRow {
            task_id: Uuid::new_v4(),
            field: "priority",
            value: "critical".into(),
        };
        let out = rejected_detail(&invalid);
        assert!(out.contains(&invalid.task_id.to_string()));
        assert!(out.contains("'critical' is not recognized"));
        assert!(out.contains("--priority <value>"));
    }

    #[test]
    fn test_empty_project_list_hint() {
        assert!(projects(&[]).contains("taskflow project create"));
    }

    #[test]
    fn test_comments_fall_back_to_unknown_author() {
        let comment = Comment {
            id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            content: "Looks good".into(),
            created_at: Utc::now(),
            author: None,
        };
        let out = comments(&[comment]);
        assert!(out.contains("unknown"));
        assert!(out.contains("Looks good"));
    }
}
