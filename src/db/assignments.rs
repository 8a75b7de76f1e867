//! Task assignments: the many-to-many link between tasks and users.
//!
//! Separate from `tasks.assignee_id`, which names a single primary assignee.

use super::{Database, Table, new_id, now_ms, row_exists};
use crate::error::ApiError;
use crate::types::{TaskAssignment, UserSummary};
use anyhow::Result;
use rusqlite::{Connection, Row, params};
use tracing::info;

fn parse_assignment_row(row: &Row) -> rusqlite::Result<TaskAssignment> {
    Ok(TaskAssignment {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        user_id: row.get("user_id")?,
        assigned_at: row.get("assigned_at")?,
    })
}

/// Fail with a validation error naming any user ids that do not exist.
pub(crate) fn ensure_users_exist(conn: &Connection, user_ids: &[String]) -> Result<()> {
    let mut unknown = Vec::new();
    for user_id in user_ids {
        if !row_exists(conn, Table::Users, user_id)? {
            unknown.push(user_id.as_str());
        }
    }
    if !unknown.is_empty() {
        return Err(ApiError::invalid_value(
            "user_ids",
            format!("unknown users: {}", unknown.join(", ")),
        )
        .into());
    }
    Ok(())
}

pub(crate) fn assignees_for_task(conn: &Connection, task_id: &str) -> Result<Vec<UserSummary>> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.full_name, u.email, u.avatar FROM users u
         INNER JOIN task_assignments a ON a.user_id = u.id
         WHERE a.task_id = ?1
         ORDER BY a.assigned_at ASC, u.id ASC",
    )?;
    let users = stmt
        .query_map(params![task_id], |row| {
            Ok(UserSummary {
                id: row.get(0)?,
                full_name: row.get(1)?,
                email: row.get(2)?,
                avatar: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(users)
}

impl Database {
    pub fn assignments_for_task(&self, task_id: &str) -> Result<Vec<TaskAssignment>> {
        self.with_conn(|conn| {
            if !row_exists(conn, Table::Tasks, task_id)? {
                return Err(ApiError::task_not_found(task_id).into());
            }
            let mut stmt = conn.prepare(
                "SELECT * FROM task_assignments WHERE task_id = ?1 ORDER BY assigned_at ASC, id ASC",
            )?;
            let rows = stmt
                .query_map(params![task_id], parse_assignment_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    pub fn assignments_for_user(&self, user_id: &str) -> Result<Vec<TaskAssignment>> {
        self.with_conn(|conn| {
            if !row_exists(conn, Table::Users, user_id)? {
                return Err(ApiError::user_not_found(user_id).into());
            }
            let mut stmt = conn.prepare(
                "SELECT * FROM task_assignments WHERE user_id = ?1 ORDER BY assigned_at ASC, id ASC",
            )?;
            let rows = stmt
                .query_map(params![user_id], parse_assignment_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// Assign users to a task. Existing assignments are kept and
    /// repeated ids are ignored.
    pub fn assign_users(&self, task_id: &str, user_ids: &[String]) -> Result<Vec<TaskAssignment>> {
        if user_ids.is_empty() {
            return Err(ApiError::missing_field("user_ids").into());
        }
        let now = now_ms();

        let rows = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if !row_exists(&tx, Table::Tasks, task_id)? {
                return Err(ApiError::task_not_found(task_id).into());
            }
            ensure_users_exist(&tx, user_ids)?;

            for user_id in user_ids {
                tx.execute(
                    "INSERT OR IGNORE INTO task_assignments (id, task_id, user_id, assigned_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![new_id(), task_id, user_id, now],
                )?;
            }

            let mut stmt = tx.prepare(
                "SELECT * FROM task_assignments WHERE task_id = ?1 ORDER BY assigned_at ASC, id ASC",
            )?;
            let rows = stmt
                .query_map(params![task_id], parse_assignment_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            drop(stmt);
            tx.commit()?;
            Ok(rows)
        })?;

        info!(task_id, count = user_ids.len(), "users assigned");
        Ok(rows)
    }

    pub fn remove_assignment(&self, assignment_id: &str) -> Result<()> {
        let deleted = self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM task_assignments WHERE id = ?1",
                params![assignment_id],
            )?)
        })?;
        if deleted == 0 {
            return Err(ApiError::assignment_not_found(assignment_id).into());
        }
        info!(assignment_id, "assignment removed");
        Ok(())
    }
}
