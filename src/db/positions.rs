//! Sibling ordering for lists within a board and tasks within a list.
//!
//! Every ordered item carries an integer `position` scoped to its parent.
//! New items are appended at `max + 1`; `reorder` rewrites the whole sibling
//! set to `0..n` in one transaction. Deleting or moving an item away leaves a
//! gap behind: remaining siblings are only compacted by the next `reorder`.

use super::{Database, Table, now_ms, row_exists};
use crate::error::ApiError;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

/// Kind of ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderedKind {
    /// Lists ordered within a board.
    List,
    /// Tasks ordered within a list.
    Task,
}

impl OrderedKind {
    fn item_table(self) -> Table {
        match self {
            OrderedKind::List => Table::Lists,
            OrderedKind::Task => Table::Tasks,
        }
    }

    fn parent_table(self) -> Table {
        match self {
            OrderedKind::List => Table::Boards,
            OrderedKind::Task => Table::Lists,
        }
    }

    fn parent_column(self) -> &'static str {
        match self {
            OrderedKind::List => "board_id",
            OrderedKind::Task => "list_id",
        }
    }

    fn parent_label(self) -> &'static str {
        match self {
            OrderedKind::List => "board",
            OrderedKind::Task => "list",
        }
    }

    fn item_not_found(self, id: &str) -> ApiError {
        match self {
            OrderedKind::List => ApiError::list_not_found(id),
            OrderedKind::Task => ApiError::task_not_found(id),
        }
    }

    fn parent_not_found(self, id: &str) -> ApiError {
        match self {
            OrderedKind::List => ApiError::board_not_found(id),
            OrderedKind::Task => ApiError::list_not_found(id),
        }
    }
}

/// Fail with the kind-specific not-found error unless the parent exists.
pub(crate) fn ensure_parent(conn: &Connection, kind: OrderedKind, parent_id: &str) -> Result<()> {
    if !row_exists(conn, kind.parent_table(), parent_id)? {
        return Err(kind.parent_not_found(parent_id).into());
    }
    Ok(())
}

/// Position for an item appended to `parent_id`: `max + 1`, or 0 when empty.
pub(crate) fn next_position_internal(
    conn: &Connection,
    kind: OrderedKind,
    parent_id: &str,
) -> Result<i64> {
    ensure_parent(conn, kind, parent_id)?;
    let sql = format!(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM {} WHERE {} = ?1",
        kind.item_table().name(),
        kind.parent_column()
    );
    let next: i64 = conn.query_row(&sql, params![parent_id], |row| row.get(0))?;
    Ok(next)
}

/// Ids of the current siblings under `parent_id`, in position order.
pub(crate) fn sibling_ids(conn: &Connection, kind: OrderedKind, parent_id: &str) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT id FROM {} WHERE {} = ?1 ORDER BY position ASC, created_at ASC",
        kind.item_table().name(),
        kind.parent_column()
    );
    let mut stmt = conn.prepare(&sql)?;
    let ids = stmt
        .query_map(params![parent_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

fn set_position(
    conn: &Connection,
    kind: OrderedKind,
    item_id: &str,
    parent_id: &str,
    position: i64,
) -> Result<()> {
    match kind {
        OrderedKind::List => conn.execute(
            "UPDATE lists SET board_id = ?1, position = ?2 WHERE id = ?3",
            params![parent_id, position, item_id],
        )?,
        OrderedKind::Task => conn.execute(
            "UPDATE tasks SET list_id = ?1, position = ?2, updated_at = ?3 WHERE id = ?4",
            params![parent_id, position, now_ms(), item_id],
        )?,
    };
    Ok(())
}

/// Compare a requested order against the current sibling set.
///
/// Returns a description of every discrepancy, or `None` when `ordered_ids`
/// is a permutation of `current`.
fn describe_mismatch(current: &[String], ordered_ids: &[String]) -> Option<String> {
    let current_set: HashSet<&str> = current.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut duplicate = Vec::new();
    let mut unknown = Vec::new();

    for id in ordered_ids {
        if !seen.insert(id.as_str()) {
            duplicate.push(id.as_str());
        } else if !current_set.contains(id.as_str()) {
            unknown.push(id.as_str());
        }
    }

    let missing: Vec<&str> = current
        .iter()
        .map(String::as_str)
        .filter(|id| !seen.contains(id))
        .collect();

    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing: {}", missing.join(", ")));
    }
    if !unknown.is_empty() {
        parts.push(format!("unknown: {}", unknown.join(", ")));
    }
    if !duplicate.is_empty() {
        parts.push(format!("duplicate: {}", duplicate.join(", ")));
    }

    if parts.is_empty() { None } else { Some(parts.join("; ")) }
}

/// Assign `position = index` to every id. Caller owns the transaction.
pub(crate) fn reorder_internal(
    conn: &Connection,
    kind: OrderedKind,
    parent_id: &str,
    ordered_ids: &[String],
) -> Result<()> {
    ensure_parent(conn, kind, parent_id)?;

    let current = sibling_ids(conn, kind, parent_id)?;
    if let Some(details) = describe_mismatch(&current, ordered_ids) {
        let parent = format!("{} {}", kind.parent_label(), parent_id);
        return Err(ApiError::order_mismatch(&parent, details).into());
    }

    for (index, item_id) in ordered_ids.iter().enumerate() {
        let position = i64::try_from(index)?;
        set_position(conn, kind, item_id, parent_id, position)?;
    }

    Ok(())
}

/// Relocate an item under `new_parent_id`. Caller owns the transaction.
///
/// Returns the position assigned to the item.
pub(crate) fn move_internal(
    conn: &Connection,
    kind: OrderedKind,
    item_id: &str,
    new_parent_id: &str,
    position: Option<i64>,
) -> Result<i64> {
    if let Some(p) = position {
        if p < 0 {
            return Err(ApiError::invalid_value("position", "position must be >= 0").into());
        }
    }

    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?1",
        kind.parent_column(),
        kind.item_table().name()
    );
    let current_parent: Option<String> = conn
        .query_row(&sql, params![item_id], |row| row.get(0))
        .optional()?;
    if current_parent.is_none() {
        return Err(kind.item_not_found(item_id).into());
    }

    let position = match position {
        Some(p) => {
            ensure_parent(conn, kind, new_parent_id)?;
            p
        }
        None => next_position_internal(conn, kind, new_parent_id)?,
    };

    set_position(conn, kind, item_id, new_parent_id, position)?;
    Ok(position)
}

impl Database {
    /// Position a new item appended to `parent_id` would receive.
    pub fn next_position(&self, kind: OrderedKind, parent_id: &str) -> Result<i64> {
        self.with_conn(|conn| next_position_internal(conn, kind, parent_id))
    }

    /// Rewrite the order of all siblings under `parent_id`.
    ///
    /// `ordered_ids` must contain every current sibling exactly once and
    /// nothing else; otherwise nothing is changed.
    pub fn reorder(&self, kind: OrderedKind, parent_id: &str, ordered_ids: &[String]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            reorder_internal(&tx, kind, parent_id, ordered_ids)?;
            tx.commit()?;
            Ok(())
        })?;

        info!(
            kind = ?kind,
            parent_id,
            count = ordered_ids.len(),
            "siblings reordered"
        );
        Ok(())
    }

    /// Move an item to another parent, appending when `position` is `None`.
    pub fn move_to_parent(
        &self,
        kind: OrderedKind,
        item_id: &str,
        new_parent_id: &str,
        position: Option<i64>,
    ) -> Result<i64> {
        let assigned = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let assigned = move_internal(&tx, kind, item_id, new_parent_id, position)?;
            tx.commit()?;
            Ok(assigned)
        })?;

        info!(kind = ?kind, item_id, new_parent_id, position = assigned, "item moved");
        Ok(assigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn permutation_has_no_mismatch() {
        let current = ids(&["a", "b", "c"]);
        assert!(describe_mismatch(&current, &ids(&["c", "a", "b"])).is_none());
    }

    #[test]
    fn empty_collection_accepts_empty_order() {
        assert!(describe_mismatch(&[], &[]).is_none());
    }

    #[test]
    fn mismatch_reports_missing_unknown_and_duplicate() {
        let current = ids(&["a", "b", "c"]);
        let details = describe_mismatch(&current, &ids(&["a", "a", "x"])).unwrap();
        assert_eq!(details, "missing: b, c; unknown: x; duplicate: a");
    }

    #[test]
    fn duplicate_with_correct_cardinality_is_rejected() {
        let current = ids(&["a", "b"]);
        let details = describe_mismatch(&current, &ids(&["a", "a"])).unwrap();
        assert!(details.contains("missing: b"));
        assert!(details.contains("duplicate: a"));
    }
}
