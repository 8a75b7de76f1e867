//! List CRUD. Lists are ordered within their board by `position`.

use super::positions::{OrderedKind, ensure_parent, next_position_internal};
use super::tasks::tasks_for_list;
use super::{Database, new_id, now_ms, required_text};
use crate::error::ApiError;
use crate::types::{List, ListWithTasks};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct NewList {
    pub title: String,
    /// Explicit position; appended after the last list when omitted.
    #[serde(default)]
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUpdate {
    pub title: Option<String>,
    pub position: Option<i64>,
}

pub fn parse_list_row(row: &Row) -> rusqlite::Result<List> {
    Ok(List {
        id: row.get("id")?,
        board_id: row.get("board_id")?,
        title: row.get("title")?,
        position: row.get("position")?,
        created_at: row.get("created_at")?,
    })
}

fn get_list_internal(conn: &Connection, list_id: &str) -> Result<Option<List>> {
    let list = conn
        .query_row(
            "SELECT * FROM lists WHERE id = ?1",
            params![list_id],
            parse_list_row,
        )
        .optional()?;
    Ok(list)
}

pub(crate) fn check_position(position: Option<i64>) -> Result<()> {
    match position {
        Some(p) if p < 0 => {
            Err(ApiError::invalid_value("position", "position must be >= 0").into())
        }
        _ => Ok(()),
    }
}

impl Database {
    /// Lists of a board in position order, each with its tasks.
    pub fn lists_for_board(&self, board_id: &str) -> Result<Vec<ListWithTasks>> {
        self.with_conn(|conn| {
            ensure_parent(conn, OrderedKind::List, board_id)?;
            let mut stmt = conn.prepare(
                "SELECT * FROM lists WHERE board_id = ?1 ORDER BY position ASC, created_at ASC",
            )?;
            let lists = stmt
                .query_map(params![board_id], parse_list_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            lists
                .into_iter()
                .map(|list| {
                    let tasks = tasks_for_list(conn, &list.id)?;
                    Ok(ListWithTasks { list, tasks })
                })
                .collect()
        })
    }

    pub fn get_list(&self, list_id: &str) -> Result<Option<ListWithTasks>> {
        self.with_conn(|conn| {
            let Some(list) = get_list_internal(conn, list_id)? else {
                return Ok(None);
            };
            let tasks = tasks_for_list(conn, list_id)?;
            Ok(Some(ListWithTasks { list, tasks }))
        })
    }

    /// Create a list on a board.
    pub fn create_list(&self, board_id: &str, input: NewList) -> Result<List> {
        let title = required_text("title", &input.title)?;
        check_position(input.position)?;
        let id = new_id();
        let now = now_ms();

        let list = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let position = match input.position {
                Some(p) => {
                    ensure_parent(&tx, OrderedKind::List, board_id)?;
                    p
                }
                None => next_position_internal(&tx, OrderedKind::List, board_id)?,
            };

            tx.execute(
                "INSERT INTO lists (id, board_id, title, position, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![&id, board_id, &title, position, now],
            )?;

            tx.commit()?;

            Ok(List {
                id,
                board_id: board_id.to_string(),
                title,
                position,
                created_at: now,
            })
        })?;

        info!(list_id = %list.id, board_id, position = list.position, "list created");
        Ok(list)
    }

    /// Rename a list or set its position directly.
    ///
    /// A direct position write does not shift siblings; use
    /// [`Database::reorder`] to rewrite the whole order.
    pub fn update_list(&self, list_id: &str, update: ListUpdate) -> Result<List> {
        check_position(update.position)?;

        let list = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut list =
                get_list_internal(&tx, list_id)?.ok_or_else(|| ApiError::list_not_found(list_id))?;

            if let Some(ref v) = update.title {
                list.title = required_text("title", v)?;
            }
            if let Some(p) = update.position {
                list.position = p;
            }

            tx.execute(
                "UPDATE lists SET title = ?1, position = ?2 WHERE id = ?3",
                params![&list.title, list.position, list_id],
            )?;

            tx.commit()?;
            Ok(list)
        })?;

        info!(list_id, position = list.position, "list updated");
        Ok(list)
    }

    /// Delete a list and its tasks. Remaining siblings keep their positions.
    pub fn delete_list(&self, list_id: &str) -> Result<()> {
        let deleted = self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM lists WHERE id = ?1", params![list_id])?)
        })?;
        if deleted == 0 {
            return Err(ApiError::list_not_found(list_id).into());
        }
        info!(list_id, "list deleted");
        Ok(())
    }
}
