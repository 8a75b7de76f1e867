//! Activation cascades and ownership transfer.
//!
//! Deactivating an owner (user, project or board) flips every dependent row
//! to `inactive` in the same transaction; reactivating runs the same steps
//! with `active`. Reactivation does not remember which dependents were
//! already inactive before the cascade ran, so those come back as well.

use super::{Database, Table, now_ms, row_exists};
use crate::error::ApiError;
use crate::types::{MemberRole, Status};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Entity kinds whose activation state cascades to dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    User,
    Project,
    Board,
}

/// One update in a cascade.
///
/// `sql` binds `?1` to the owner id and `?2` to the target status text.
/// Steps with `stamps_updated_at` also bind `?3` to the current timestamp.
#[derive(Debug)]
pub struct CascadeStep {
    /// Label reported back in [`CascadeReport`].
    pub entity: &'static str,
    pub sql: &'static str,
    pub stamps_updated_at: bool,
}

const USER_STEPS: &[CascadeStep] = &[
    CascadeStep {
        entity: "projects",
        sql: "UPDATE projects SET status = ?2 WHERE owner_id = ?1",
        stamps_updated_at: false,
    },
    CascadeStep {
        entity: "owned_boards",
        sql: "UPDATE boards SET status = ?2 WHERE owner_id = ?1",
        stamps_updated_at: false,
    },
    CascadeStep {
        entity: "project_boards",
        sql: "UPDATE boards SET status = ?2
              WHERE project_id IN (SELECT id FROM projects WHERE owner_id = ?1)",
        stamps_updated_at: false,
    },
    CascadeStep {
        entity: "memberships",
        sql: "UPDATE board_members SET status = ?2 WHERE user_id = ?1",
        stamps_updated_at: false,
    },
    CascadeStep {
        entity: "user",
        sql: "UPDATE users SET is_active = (?2 = 'active'), updated_at = ?3 WHERE id = ?1",
        stamps_updated_at: true,
    },
];

const PROJECT_STEPS: &[CascadeStep] = &[
    CascadeStep {
        entity: "boards",
        sql: "UPDATE boards SET status = ?2 WHERE project_id = ?1",
        stamps_updated_at: false,
    },
    CascadeStep {
        entity: "project",
        sql: "UPDATE projects SET status = ?2 WHERE id = ?1",
        stamps_updated_at: false,
    },
];

const BOARD_STEPS: &[CascadeStep] = &[
    CascadeStep {
        entity: "memberships",
        sql: "UPDATE board_members SET status = ?2 WHERE board_id = ?1",
        stamps_updated_at: false,
    },
    CascadeStep {
        entity: "board",
        sql: "UPDATE boards SET status = ?2 WHERE id = ?1",
        stamps_updated_at: false,
    },
];

impl OwnerKind {
    /// Ordered update steps; the owner row itself is always last.
    pub fn cascade_steps(self) -> &'static [CascadeStep] {
        match self {
            OwnerKind::User => USER_STEPS,
            OwnerKind::Project => PROJECT_STEPS,
            OwnerKind::Board => BOARD_STEPS,
        }
    }

    fn table(self) -> Table {
        match self {
            OwnerKind::User => Table::Users,
            OwnerKind::Project => Table::Projects,
            OwnerKind::Board => Table::Boards,
        }
    }

    fn not_found(self, id: &str) -> ApiError {
        match self {
            OwnerKind::User => ApiError::user_not_found(id),
            OwnerKind::Project => ApiError::project_not_found(id),
            OwnerKind::Board => ApiError::board_not_found(id),
        }
    }
}

/// Rows touched by each step of a cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeReport {
    pub owner_kind: OwnerKind,
    pub owner_id: String,
    pub status: Status,
    pub affected: Vec<AffectedRows>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffectedRows {
    pub entity: String,
    pub rows: usize,
}

impl CascadeReport {
    /// Rows changed by the step labelled `entity`.
    pub fn rows_for(&self, entity: &str) -> usize {
        self.affected
            .iter()
            .filter(|a| a.entity == entity)
            .map(|a| a.rows)
            .sum()
    }
}

/// Run every cascade step for `owner_id`. Caller owns the transaction.
pub(crate) fn apply_cascade(
    conn: &Connection,
    kind: OwnerKind,
    owner_id: &str,
    status: Status,
) -> Result<CascadeReport> {
    if !row_exists(conn, kind.table(), owner_id)? {
        return Err(kind.not_found(owner_id).into());
    }

    let now = now_ms();
    let mut affected = Vec::with_capacity(kind.cascade_steps().len());
    for step in kind.cascade_steps() {
        let rows = if step.stamps_updated_at {
            conn.execute(step.sql, params![owner_id, status.as_str(), now])?
        } else {
            conn.execute(step.sql, params![owner_id, status.as_str()])?
        };
        debug!(entity = step.entity, rows, "cascade step applied");
        affected.push(AffectedRows {
            entity: step.entity.to_string(),
            rows,
        });
    }

    Ok(CascadeReport {
        owner_kind: kind,
        owner_id: owner_id.to_string(),
        status,
        affected,
    })
}

/// Outcome for one board owned by a deleted user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BoardDisposition {
    /// Ownership passed to another member, who was promoted to owner.
    Transferred {
        board_id: String,
        new_owner_id: String,
        previous_role: MemberRole,
    },
    /// No other member existed; the board was deleted.
    Deleted { board_id: String },
}

/// Result of deleting a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDeletionReport {
    pub user_id: String,
    pub boards_transferred: usize,
    pub boards_deleted: usize,
    pub memberships_removed: usize,
    pub boards: Vec<BoardDisposition>,
}

/// Pick the member who inherits a board: earliest admin, else earliest member.
fn find_successor(
    conn: &Connection,
    board_id: &str,
    departing_user: &str,
) -> Result<Option<(String, String, MemberRole)>> {
    let successor = conn
        .query_row(
            "SELECT id, user_id, role FROM board_members
             WHERE board_id = ?1 AND user_id != ?2
             ORDER BY CASE role WHEN 'admin' THEN 0 ELSE 1 END, joined_at ASC, id ASC
             LIMIT 1",
            params![board_id, departing_user],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    crate::types::enum_column::<MemberRole>(row, "role")?,
                ))
            },
        )
        .optional()?;
    Ok(successor)
}

fn delete_user_internal(conn: &Connection, user_id: &str) -> Result<UserDeletionReport> {
    if !row_exists(conn, Table::Users, user_id)? {
        return Err(ApiError::user_not_found(user_id).into());
    }

    let owned_boards: Vec<String> = {
        let mut stmt =
            conn.prepare("SELECT id FROM boards WHERE owner_id = ?1 ORDER BY created_at, id")?;
        stmt.query_map(params![user_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?
    };

    let mut boards = Vec::with_capacity(owned_boards.len());
    for board_id in owned_boards {
        match find_successor(conn, &board_id, user_id)? {
            Some((membership_id, new_owner_id, previous_role)) => {
                conn.execute(
                    "UPDATE board_members SET role = 'owner' WHERE id = ?1",
                    params![membership_id],
                )?;
                conn.execute(
                    "UPDATE boards SET owner_id = ?1 WHERE id = ?2",
                    params![new_owner_id, board_id],
                )?;
                boards.push(BoardDisposition::Transferred {
                    board_id,
                    new_owner_id,
                    previous_role,
                });
            }
            None => {
                conn.execute("DELETE FROM boards WHERE id = ?1", params![board_id])?;
                boards.push(BoardDisposition::Deleted { board_id });
            }
        }
    }

    let memberships_removed = conn.execute(
        "DELETE FROM board_members WHERE user_id = ?1",
        params![user_id],
    )?;
    conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;

    let boards_transferred = boards
        .iter()
        .filter(|b| matches!(b, BoardDisposition::Transferred { .. }))
        .count();

    Ok(UserDeletionReport {
        user_id: user_id.to_string(),
        boards_transferred,
        boards_deleted: boards.len() - boards_transferred,
        memberships_removed,
        boards,
    })
}

impl Database {
    /// Mark an owner and all of its dependents inactive.
    pub fn deactivate_owner(&self, kind: OwnerKind, owner_id: &str) -> Result<CascadeReport> {
        self.set_owner_status(kind, owner_id, Status::Inactive)
    }

    /// Mark an owner and all of its dependents active again.
    pub fn reactivate_owner(&self, kind: OwnerKind, owner_id: &str) -> Result<CascadeReport> {
        self.set_owner_status(kind, owner_id, Status::Active)
    }

    fn set_owner_status(
        &self,
        kind: OwnerKind,
        owner_id: &str,
        status: Status,
    ) -> Result<CascadeReport> {
        let report = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let report = apply_cascade(&tx, kind, owner_id, status)?;
            tx.commit()?;
            Ok(report)
        })?;

        info!(
            owner_kind = ?kind,
            owner_id,
            status = %status,
            steps = report.affected.len(),
            "owner status cascaded"
        );
        Ok(report)
    }

    /// Delete a user, handing each owned board to another member first.
    ///
    /// Admins are preferred over plain members; boards with no other member
    /// are deleted along with their lists and tasks.
    pub fn delete_user_and_transfer_ownership(&self, user_id: &str) -> Result<UserDeletionReport> {
        let report = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let report = delete_user_internal(&tx, user_id)?;
            tx.commit()?;
            Ok(report)
        })?;

        info!(
            user_id,
            transferred = report.boards_transferred,
            deleted = report.boards_deleted,
            "user deleted"
        );
        Ok(report)
    }
}
