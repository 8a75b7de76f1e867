//! Tags and the task/tag junction.
//!
//! Deleting a tag only marks it inactive. Names are unique among active tags.

use super::tasks::{get_task_internal, parse_task_row};
use super::{Database, Table, new_id, now_ms, required_text, row_exists};
use crate::error::ApiError;
use crate::types::{Tag, Task};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct NewTag {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
}

pub fn parse_tag_row(row: &Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get("id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        is_active: row.get("is_active")?,
        created_at: row.get("created_at")?,
    })
}

fn get_tag_internal(conn: &Connection, tag_id: &str) -> Result<Option<Tag>> {
    let tag = conn
        .query_row(
            "SELECT * FROM tags WHERE id = ?1",
            params![tag_id],
            parse_tag_row,
        )
        .optional()?;
    Ok(tag)
}

fn active_name_taken(conn: &Connection, name: &str, except_id: Option<&str>) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tags
         WHERE name = ?1 COLLATE NOCASE AND is_active = 1 AND id != COALESCE(?2, '')",
        params![name, except_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Which tags count as present when validating a batch of ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagScope {
    /// Only tags that have not been deleted; used when attaching.
    Active,
    /// Any stored tag, deleted or not; used when detaching.
    Stored,
}

/// Fail with a validation error naming any tag ids outside `scope`.
pub(crate) fn ensure_tags_exist(conn: &Connection, tag_ids: &[String], scope: TagScope) -> Result<()> {
    let sql = match scope {
        TagScope::Active => "SELECT COUNT(*) FROM tags WHERE id = ?1 AND is_active = 1",
        TagScope::Stored => "SELECT COUNT(*) FROM tags WHERE id = ?1",
    };
    let mut stmt = conn.prepare(sql)?;
    let mut unknown = Vec::new();
    for tag_id in tag_ids {
        let count: i64 = stmt.query_row(params![tag_id], |row| row.get(0))?;
        if count == 0 {
            unknown.push(tag_id.as_str());
        }
    }
    if !unknown.is_empty() {
        return Err(ApiError::invalid_value(
            "tag_ids",
            format!("unknown tags: {}", unknown.join(", ")),
        )
        .into());
    }
    Ok(())
}

pub(crate) fn tags_for_task(conn: &Connection, task_id: &str) -> Result<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT t.* FROM tags t
         INNER JOIN task_tags tt ON tt.tag_id = t.id
         WHERE tt.task_id = ?1
         ORDER BY t.name ASC",
    )?;
    let tags = stmt
        .query_map(params![task_id], parse_tag_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tags)
}

impl Database {
    /// Active tags ordered by name.
    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM tags WHERE is_active = 1 ORDER BY name ASC")?;
            let tags = stmt
                .query_map([], parse_tag_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tags)
        })
    }

    pub fn get_tag(&self, tag_id: &str) -> Result<Option<Tag>> {
        self.with_conn(|conn| get_tag_internal(conn, tag_id))
    }

    pub fn create_tag(&self, input: NewTag) -> Result<Tag> {
        let name = required_text("name", &input.name)?;
        let id = new_id();
        let now = now_ms();

        let tag = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if active_name_taken(&tx, &name, None)? {
                return Err(ApiError::already_exists(format!("Tag already exists: {}", name))
                    .with_field("name")
                    .into());
            }

            tx.execute(
                "INSERT INTO tags (id, name, color, is_active, created_at)
                 VALUES (?1, ?2, ?3, 1, ?4)",
                params![&id, &name, &input.color, now],
            )?;
            tx.commit()?;

            Ok(Tag {
                id,
                name,
                color: input.color,
                is_active: true,
                created_at: now,
            })
        })?;

        info!(tag_id = %tag.id, name = %tag.name, "tag created");
        Ok(tag)
    }

    pub fn update_tag(&self, tag_id: &str, update: TagUpdate) -> Result<Tag> {
        let tag = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut tag =
                get_tag_internal(&tx, tag_id)?.ok_or_else(|| ApiError::tag_not_found(tag_id))?;

            if let Some(ref v) = update.name {
                let name = required_text("name", v)?;
                if tag.is_active && active_name_taken(&tx, &name, Some(tag_id))? {
                    return Err(ApiError::already_exists(format!("Tag already exists: {}", name))
                        .with_field("name")
                        .into());
                }
                tag.name = name;
            }
            if let Some(v) = update.color {
                tag.color = Some(v);
            }

            tx.execute(
                "UPDATE tags SET name = ?1, color = ?2 WHERE id = ?3",
                params![&tag.name, &tag.color, tag_id],
            )?;
            tx.commit()?;
            Ok(tag)
        })?;

        info!(tag_id, name = %tag.name, "tag updated");
        Ok(tag)
    }

    /// Mark a tag inactive. Existing task links are kept.
    pub fn delete_tag(&self, tag_id: &str) -> Result<()> {
        let updated = self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE tags SET is_active = 0 WHERE id = ?1 AND is_active = 1",
                params![tag_id],
            )?)
        })?;
        if updated == 0 {
            return Err(ApiError::tag_not_found(tag_id).into());
        }
        info!(tag_id, "tag deactivated");
        Ok(())
    }

    /// Tasks carrying a tag, in list then position order.
    pub fn tasks_with_tag(&self, tag_id: &str) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            if !row_exists(conn, Table::Tags, tag_id)? {
                return Err(ApiError::tag_not_found(tag_id).into());
            }
            let mut stmt = conn.prepare(
                "SELECT t.* FROM tasks t
                 INNER JOIN task_tags tt ON tt.task_id = t.id
                 WHERE tt.tag_id = ?1
                 ORDER BY t.list_id ASC, t.position ASC",
            )?;
            let tasks = stmt
                .query_map(params![tag_id], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    pub fn task_tags(&self, task_id: &str) -> Result<Vec<Tag>> {
        self.with_conn(|conn| {
            if !row_exists(conn, Table::Tasks, task_id)? {
                return Err(ApiError::task_not_found(task_id).into());
            }
            tags_for_task(conn, task_id)
        })
    }

    /// Attach tags to a task, keeping the ones it already has.
    pub fn add_task_tags(&self, task_id: &str, tag_ids: &[String]) -> Result<Vec<Tag>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            get_task_internal(&tx, task_id)?.ok_or_else(|| ApiError::task_not_found(task_id))?;
            ensure_tags_exist(&tx, tag_ids, TagScope::Active)?;

            for tag_id in tag_ids {
                tx.execute(
                    "INSERT OR IGNORE INTO task_tags (task_id, tag_id) VALUES (?1, ?2)",
                    params![task_id, tag_id],
                )?;
            }

            let tags = tags_for_task(&tx, task_id)?;
            tx.commit()?;
            Ok(tags)
        })
    }

    /// Detach tags from a task and return the ones that remain.
    pub fn remove_task_tags(&self, task_id: &str, tag_ids: &[String]) -> Result<Vec<Tag>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            get_task_internal(&tx, task_id)?.ok_or_else(|| ApiError::task_not_found(task_id))?;
            ensure_tags_exist(&tx, tag_ids, TagScope::Stored)?;

            for tag_id in tag_ids {
                tx.execute(
                    "DELETE FROM task_tags WHERE task_id = ?1 AND tag_id = ?2",
                    params![task_id, tag_id],
                )?;
            }

            let tags = tags_for_task(&tx, task_id)?;
            tx.commit()?;
            Ok(tags)
        })
    }
}
