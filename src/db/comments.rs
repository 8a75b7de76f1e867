//! Task comments, newest first.

use super::users::parse_joined_user;
use super::{Database, Table, new_id, now_ms, required_text, row_exists};
use crate::error::ApiError;
use crate::types::TaskComment;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Deserialize;
use tracing::info;

const COMMENT_SELECT: &str = "SELECT c.*, u.id AS user_ref, u.full_name AS user_full_name,
        u.email AS user_email, u.avatar AS user_avatar
     FROM task_comments c
     LEFT JOIN users u ON u.id = c.user_id";

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub task_id: String,
    pub user_id: String,
    pub content: String,
}

fn parse_comment_row(row: &Row) -> rusqlite::Result<TaskComment> {
    Ok(TaskComment {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        user_id: row.get("user_id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        user: parse_joined_user(row)?,
    })
}

fn get_comment_internal(conn: &Connection, comment_id: &str) -> Result<Option<TaskComment>> {
    let sql = format!("{} WHERE c.id = ?1", COMMENT_SELECT);
    let comment = conn
        .query_row(&sql, params![comment_id], parse_comment_row)
        .optional()?;
    Ok(comment)
}

impl Database {
    pub fn comments_for_task(&self, task_id: &str) -> Result<Vec<TaskComment>> {
        self.with_conn(|conn| {
            if !row_exists(conn, Table::Tasks, task_id)? {
                return Err(ApiError::task_not_found(task_id).into());
            }
            let sql = format!(
                "{} WHERE c.task_id = ?1 ORDER BY c.created_at DESC, c.id DESC",
                COMMENT_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let comments = stmt
                .query_map(params![task_id], parse_comment_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(comments)
        })
    }

    pub fn get_comment(&self, comment_id: &str) -> Result<Option<TaskComment>> {
        self.with_conn(|conn| get_comment_internal(conn, comment_id))
    }

    pub fn create_comment(&self, input: NewComment) -> Result<TaskComment> {
        let content = required_text("content", &input.content)?;
        let id = new_id();
        let now = now_ms();

        let comment = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if !row_exists(&tx, Table::Tasks, &input.task_id)? {
                return Err(ApiError::task_not_found(&input.task_id).into());
            }
            if !row_exists(&tx, Table::Users, &input.user_id)? {
                return Err(ApiError::user_not_found(&input.user_id).into());
            }

            tx.execute(
                "INSERT INTO task_comments (id, task_id, user_id, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![&id, &input.task_id, &input.user_id, &content, now],
            )?;

            let comment =
                get_comment_internal(&tx, &id)?.ok_or_else(|| ApiError::comment_not_found(&id))?;
            tx.commit()?;
            Ok(comment)
        })?;

        info!(comment_id = %comment.id, task_id = %comment.task_id, "comment added");
        Ok(comment)
    }

    pub fn update_comment(&self, comment_id: &str, content: &str) -> Result<TaskComment> {
        let content = required_text("content", content)?;
        let now = now_ms();

        let comment = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let updated = tx.execute(
                "UPDATE task_comments SET content = ?1, updated_at = ?2 WHERE id = ?3",
                params![&content, now, comment_id],
            )?;
            if updated == 0 {
                return Err(ApiError::comment_not_found(comment_id).into());
            }

            let comment = get_comment_internal(&tx, comment_id)?
                .ok_or_else(|| ApiError::comment_not_found(comment_id))?;
            tx.commit()?;
            Ok(comment)
        })?;

        info!(comment_id, "comment updated");
        Ok(comment)
    }

    pub fn delete_comment(&self, comment_id: &str) -> Result<()> {
        let deleted = self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM task_comments WHERE id = ?1",
                params![comment_id],
            )?)
        })?;
        if deleted == 0 {
            return Err(ApiError::comment_not_found(comment_id).into());
        }
        info!(comment_id, "comment deleted");
        Ok(())
    }
}
