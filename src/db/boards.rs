//! Board CRUD.
//!
//! Creating a board also records the creator as its `owner` member.

use super::members::members_for_board;
use super::{Database, Table, new_id, now_ms, required_text, row_exists};
use crate::error::ApiError;
use crate::types::{Board, BoardWithMembers, Status, Visibility, enum_column};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct NewBoard {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `public` or `private` (default).
    #[serde(default)]
    pub visibility: Option<String>,
    pub owner_id: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub visibility: Option<String>,
}

pub fn parse_board_row(row: &Row) -> rusqlite::Result<Board> {
    Ok(Board {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        visibility: enum_column(row, "visibility")?,
        status: enum_column(row, "status")?,
        owner_id: row.get("owner_id")?,
        project_id: row.get("project_id")?,
        created_at: row.get("created_at")?,
    })
}

pub(crate) fn get_board_internal(conn: &Connection, board_id: &str) -> Result<Option<Board>> {
    let board = conn
        .query_row(
            "SELECT * FROM boards WHERE id = ?1",
            params![board_id],
            parse_board_row,
        )
        .optional()?;
    Ok(board)
}

pub(crate) fn boards_for_project(conn: &Connection, project_id: &str) -> Result<Vec<Board>> {
    let mut stmt =
        conn.prepare("SELECT * FROM boards WHERE project_id = ?1 ORDER BY created_at ASC, id ASC")?;
    let boards = stmt
        .query_map(params![project_id], parse_board_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(boards)
}

impl Database {
    /// Create a board and its owner membership in one transaction.
    pub fn create_board(&self, input: NewBoard) -> Result<BoardWithMembers> {
        let name = required_text("name", &input.name)?;
        let owner_id = required_text("owner_id", &input.owner_id)?;
        let visibility = match input.visibility.as_deref() {
            Some(v) => v.parse::<Visibility>()?,
            None => Visibility::default(),
        };
        let board_id = new_id();
        let now = now_ms();

        let board = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if !row_exists(&tx, Table::Users, &owner_id)? {
                return Err(ApiError::user_not_found(&owner_id).into());
            }
            if let Some(ref project_id) = input.project_id {
                if !row_exists(&tx, Table::Projects, project_id)? {
                    return Err(ApiError::project_not_found(project_id).into());
                }
            }

            tx.execute(
                "INSERT INTO boards (
                    id, name, description, visibility, status, owner_id, project_id, created_at
                ) VALUES (?1, ?2, ?3, ?4, 'active', ?5, ?6, ?7)",
                params![
                    &board_id,
                    &name,
                    &input.description,
                    visibility.as_str(),
                    &owner_id,
                    &input.project_id,
                    now,
                ],
            )?;

            tx.execute(
                "INSERT INTO board_members (id, board_id, user_id, role, status, joined_at)
                 VALUES (?1, ?2, ?3, 'owner', 'active', ?4)",
                params![new_id(), &board_id, &owner_id, now],
            )?;

            let members = members_for_board(&tx, &board_id)?;
            tx.commit()?;

            Ok(BoardWithMembers {
                board: Board {
                    id: board_id.clone(),
                    name,
                    description: input.description,
                    visibility,
                    status: Status::Active,
                    owner_id: Some(owner_id.clone()),
                    project_id: input.project_id,
                    created_at: now,
                },
                members,
            })
        })?;

        info!(board_id = %board.board.id, owner_id = %owner_id, "board created");
        Ok(board)
    }

    /// Get a board with its members.
    pub fn get_board(&self, board_id: &str) -> Result<Option<BoardWithMembers>> {
        self.with_conn(|conn| {
            let Some(board) = get_board_internal(conn, board_id)? else {
                return Ok(None);
            };
            let members = members_for_board(conn, board_id)?;
            Ok(Some(BoardWithMembers { board, members }))
        })
    }

    pub fn list_boards(&self) -> Result<Vec<Board>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM boards ORDER BY created_at ASC, id ASC")?;
            let boards = stmt
                .query_map([], parse_board_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(boards)
        })
    }

    /// Boards on which the user holds any membership.
    pub fn list_boards_for_user(&self, user_id: &str) -> Result<Vec<Board>> {
        self.with_conn(|conn| {
            if !row_exists(conn, Table::Users, user_id)? {
                return Err(ApiError::user_not_found(user_id).into());
            }
            let mut stmt = conn.prepare(
                "SELECT b.* FROM boards b
                 INNER JOIN board_members m ON m.board_id = b.id
                 WHERE m.user_id = ?1
                 ORDER BY b.created_at ASC, b.id ASC",
            )?;
            let boards = stmt
                .query_map(params![user_id], parse_board_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(boards)
        })
    }

    pub fn update_board(&self, board_id: &str, update: BoardUpdate) -> Result<Board> {
        let visibility = update
            .visibility
            .as_deref()
            .map(str::parse::<Visibility>)
            .transpose()?;

        let board = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut board = get_board_internal(&tx, board_id)?
                .ok_or_else(|| ApiError::board_not_found(board_id))?;

            if let Some(ref v) = update.name {
                board.name = required_text("name", v)?;
            }
            if let Some(v) = update.description {
                board.description = Some(v);
            }
            if let Some(v) = visibility {
                board.visibility = v;
            }

            tx.execute(
                "UPDATE boards SET name = ?1, description = ?2, visibility = ?3 WHERE id = ?4",
                params![
                    &board.name,
                    &board.description,
                    board.visibility.as_str(),
                    board_id,
                ],
            )?;

            tx.commit()?;
            Ok(board)
        })?;

        info!(board_id, "board updated");
        Ok(board)
    }

    /// Delete a board with its memberships, lists and tasks.
    pub fn delete_board(&self, board_id: &str) -> Result<()> {
        let deleted = self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM boards WHERE id = ?1", params![board_id])?)
        })?;
        if deleted == 0 {
            return Err(ApiError::board_not_found(board_id).into());
        }
        info!(board_id, "board deleted");
        Ok(())
    }
}
