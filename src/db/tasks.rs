//! Task CRUD. Tasks are ordered within their list by `position`.

use super::assignments::{assignees_for_task, ensure_users_exist};
use super::lists::check_position;
use super::positions::{OrderedKind, ensure_parent, move_internal, next_position_internal};
use super::tags::{TagScope, ensure_tags_exist, tags_for_task};
use super::{Database, Table, new_id, now_ms, required_text, row_exists};
use crate::error::ApiError;
use crate::types::{Task, TaskDetail, TaskPriority, TaskStatus, enum_column};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Unix milliseconds.
    #[serde(default)]
    pub due_date: Option<i64>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
}

/// Partial update. A new `list_id` moves the task, appending it unless
/// `position` is also given.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<i64>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub assignee_id: Option<String>,
    pub position: Option<i64>,
    pub list_id: Option<String>,
    /// Replaces the tag set when present.
    pub tag_ids: Option<Vec<String>>,
}

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        list_id: row.get("list_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        due_date: row.get("due_date")?,
        priority: enum_column(row, "priority")?,
        status: enum_column(row, "status")?,
        position: row.get("position")?,
        assignee_id: row.get("assignee_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
pub(crate) fn get_task_internal(conn: &Connection, task_id: &str) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            "SELECT * FROM tasks WHERE id = ?1",
            params![task_id],
            parse_task_row,
        )
        .optional()?;
    Ok(task)
}

pub(crate) fn tasks_for_list(conn: &Connection, list_id: &str) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM tasks WHERE list_id = ?1 ORDER BY position ASC, created_at ASC",
    )?;
    let tasks = stmt
        .query_map(params![list_id], parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

pub(crate) fn task_detail(conn: &Connection, task: Task) -> Result<TaskDetail> {
    let tags = tags_for_task(conn, &task.id)?;
    let assignees = assignees_for_task(conn, &task.id)?;
    Ok(TaskDetail {
        task,
        tags,
        assignees,
    })
}

/// Sync task tags to the task_tags junction table.
/// Replaces all existing tags for the task.
pub(crate) fn sync_task_tags(conn: &Connection, task_id: &str, tag_ids: &[String]) -> Result<()> {
    ensure_tags_exist(conn, tag_ids, TagScope::Active)?;
    conn.execute("DELETE FROM task_tags WHERE task_id = ?1", params![task_id])?;
    for tag_id in tag_ids {
        conn.execute(
            "INSERT OR IGNORE INTO task_tags (task_id, tag_id) VALUES (?1, ?2)",
            params![task_id, tag_id],
        )?;
    }
    Ok(())
}

fn ensure_assignee(conn: &Connection, assignee_id: Option<&str>) -> Result<()> {
    if let Some(id) = assignee_id {
        if !row_exists(conn, Table::Users, id)? {
            return Err(ApiError::user_not_found(id).into());
        }
    }
    Ok(())
}

impl Database {
    /// Tasks of a list in position order, with tags and assignees.
    pub fn tasks_for_list(&self, list_id: &str) -> Result<Vec<TaskDetail>> {
        self.with_conn(|conn| {
            ensure_parent(conn, OrderedKind::Task, list_id)?;
            tasks_for_list(conn, list_id)?
                .into_iter()
                .map(|task| task_detail(conn, task))
                .collect()
        })
    }

    pub fn get_task(&self, task_id: &str) -> Result<Option<TaskDetail>> {
        self.with_conn(|conn| match get_task_internal(conn, task_id)? {
            Some(task) => Ok(Some(task_detail(conn, task)?)),
            None => Ok(None),
        })
    }

    /// Create a task on a list.
    pub fn create_task(&self, list_id: &str, input: NewTask) -> Result<TaskDetail> {
        let title = required_text("title", &input.title)?;
        let priority = match input.priority.as_deref() {
            Some(p) => p.parse::<TaskPriority>()?,
            None => TaskPriority::default(),
        };
        check_position(input.position)?;
        let task_id = new_id();
        let now = now_ms();

        let detail = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let position = match input.position {
                Some(p) => {
                    ensure_parent(&tx, OrderedKind::Task, list_id)?;
                    p
                }
                None => next_position_internal(&tx, OrderedKind::Task, list_id)?,
            };
            ensure_assignee(&tx, input.assignee_id.as_deref())?;

            tx.execute(
                "INSERT INTO tasks (
                    id, list_id, title, description, due_date, priority, status,
                    position, assignee_id, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                params![
                    &task_id,
                    list_id,
                    &title,
                    &input.description,
                    input.due_date,
                    priority.as_str(),
                    TaskStatus::default().as_str(),
                    position,
                    &input.assignee_id,
                    now,
                ],
            )?;

            if !input.tag_ids.is_empty() {
                sync_task_tags(&tx, &task_id, &input.tag_ids)?;
            }

            let task = get_task_internal(&tx, &task_id)?
                .ok_or_else(|| ApiError::task_not_found(&task_id))?;
            let detail = task_detail(&tx, task)?;
            tx.commit()?;
            Ok(detail)
        })?;

        info!(
            task_id = %detail.task.id,
            list_id,
            position = detail.task.position,
            "task created"
        );
        Ok(detail)
    }

    /// Apply a partial update to a task.
    pub fn update_task(&self, task_id: &str, update: TaskUpdate) -> Result<TaskDetail> {
        let priority = update
            .priority
            .as_deref()
            .map(str::parse::<TaskPriority>)
            .transpose()?;
        let status = update
            .status
            .as_deref()
            .map(str::parse::<TaskStatus>)
            .transpose()?;
        check_position(update.position)?;
        let now = now_ms();

        let detail = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut task =
                get_task_internal(&tx, task_id)?.ok_or_else(|| ApiError::task_not_found(task_id))?;

            if let Some(ref v) = update.title {
                task.title = required_text("title", v)?;
            }
            if let Some(v) = update.description {
                task.description = Some(v);
            }
            if let Some(v) = update.due_date {
                task.due_date = Some(v);
            }
            if let Some(v) = priority {
                task.priority = v;
            }
            if let Some(v) = status {
                task.status = v;
            }
            if let Some(v) = update.assignee_id {
                ensure_assignee(&tx, Some(&v))?;
                task.assignee_id = Some(v);
            }

            tx.execute(
                "UPDATE tasks SET title = ?1, description = ?2, due_date = ?3, priority = ?4,
                 status = ?5, assignee_id = ?6, updated_at = ?7 WHERE id = ?8",
                params![
                    &task.title,
                    &task.description,
                    task.due_date,
                    task.priority.as_str(),
                    task.status.as_str(),
                    &task.assignee_id,
                    now,
                    task_id,
                ],
            )?;

            match update.list_id {
                Some(ref new_list) if *new_list != task.list_id => {
                    move_internal(&tx, OrderedKind::Task, task_id, new_list, update.position)?;
                    debug!(task_id, from = %task.list_id, to = %new_list, "task moved by update");
                }
                _ => {
                    if let Some(p) = update.position {
                        tx.execute(
                            "UPDATE tasks SET position = ?1 WHERE id = ?2",
                            params![p, task_id],
                        )?;
                    }
                }
            }

            if let Some(ref tag_ids) = update.tag_ids {
                sync_task_tags(&tx, task_id, tag_ids)?;
            }

            let task =
                get_task_internal(&tx, task_id)?.ok_or_else(|| ApiError::task_not_found(task_id))?;
            let detail = task_detail(&tx, task)?;
            tx.commit()?;
            Ok(detail)
        })?;

        info!(task_id, list_id = %detail.task.list_id, "task updated");
        Ok(detail)
    }

    /// Delete a task. Remaining siblings keep their positions.
    pub fn delete_task(&self, task_id: &str) -> Result<()> {
        let deleted = self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?)
        })?;
        if deleted == 0 {
            return Err(ApiError::task_not_found(task_id).into());
        }
        info!(task_id, "task deleted");
        Ok(())
    }

    /// Replace the set of users assigned to a task.
    pub fn set_task_assignees(&self, task_id: &str, user_ids: &[String]) -> Result<TaskDetail> {
        let now = now_ms();

        let detail = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let task =
                get_task_internal(&tx, task_id)?.ok_or_else(|| ApiError::task_not_found(task_id))?;
            ensure_users_exist(&tx, user_ids)?;

            tx.execute(
                "DELETE FROM task_assignments WHERE task_id = ?1",
                params![task_id],
            )?;
            for user_id in user_ids {
                tx.execute(
                    "INSERT OR IGNORE INTO task_assignments (id, task_id, user_id, assigned_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![new_id(), task_id, user_id, now],
                )?;
            }

            let detail = task_detail(&tx, task)?;
            tx.commit()?;
            Ok(detail)
        })?;

        info!(task_id, count = detail.assignees.len(), "task assignees replaced");
        Ok(detail)
    }
}
