//! Board membership management.
//!
//! The `owner` membership is created with the board and can only change
//! hands through user deletion; it cannot be added, re-roled or removed here.

use super::users::parse_joined_user;
use super::{Database, Table, new_id, now_ms, row_exists};
use crate::error::ApiError;
use crate::types::{BoardMember, MemberRole, Status, enum_column};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Deserialize;
use tracing::info;

const MEMBER_SELECT: &str = "SELECT m.*, u.id AS user_ref, u.full_name AS user_full_name,
        u.email AS user_email, u.avatar AS user_avatar
     FROM board_members m
     LEFT JOIN users u ON u.id = m.user_id";

#[derive(Debug, Clone, Deserialize)]
pub struct NewMember {
    pub board_id: String,
    pub user_id: String,
    /// `admin` or `member` (default).
    #[serde(default)]
    pub role: Option<String>,
}

fn parse_member_row(row: &Row) -> rusqlite::Result<BoardMember> {
    Ok(BoardMember {
        id: row.get("id")?,
        board_id: row.get("board_id")?,
        user_id: row.get("user_id")?,
        role: enum_column(row, "role")?,
        status: enum_column(row, "status")?,
        joined_at: row.get("joined_at")?,
        user: parse_joined_user(row)?,
    })
}

/// Roles that may be granted directly.
fn assignable_role(raw: Option<&str>) -> Result<MemberRole> {
    let role = match raw {
        Some(r) => r.parse::<MemberRole>()?,
        None => MemberRole::Member,
    };
    if role == MemberRole::Owner {
        return Err(ApiError::invalid_value("role", "role must be admin or member").into());
    }
    Ok(role)
}

pub(crate) fn members_for_board(conn: &Connection, board_id: &str) -> Result<Vec<BoardMember>> {
    let sql = format!("{} WHERE m.board_id = ?1 ORDER BY m.joined_at ASC, m.id ASC", MEMBER_SELECT);
    let mut stmt = conn.prepare(&sql)?;
    let members = stmt
        .query_map(params![board_id], parse_member_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(members)
}

fn find_member(conn: &Connection, board_id: &str, user_id: &str) -> Result<Option<BoardMember>> {
    let sql = format!("{} WHERE m.board_id = ?1 AND m.user_id = ?2", MEMBER_SELECT);
    let member = conn
        .query_row(&sql, params![board_id, user_id], parse_member_row)
        .optional()?;
    Ok(member)
}

impl Database {
    pub fn list_board_members(&self, board_id: &str) -> Result<Vec<BoardMember>> {
        self.with_conn(|conn| {
            if !row_exists(conn, Table::Boards, board_id)? {
                return Err(ApiError::board_not_found(board_id).into());
            }
            members_for_board(conn, board_id)
        })
    }

    /// Add a user to a board as `admin` or `member`.
    pub fn add_board_member(&self, input: NewMember) -> Result<BoardMember> {
        let role = assignable_role(input.role.as_deref())?;
        let now = now_ms();

        let member = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if !row_exists(&tx, Table::Boards, &input.board_id)? {
                return Err(ApiError::board_not_found(&input.board_id).into());
            }
            if !row_exists(&tx, Table::Users, &input.user_id)? {
                return Err(ApiError::user_not_found(&input.user_id).into());
            }
            if find_member(&tx, &input.board_id, &input.user_id)?.is_some() {
                return Err(ApiError::already_exists(format!(
                    "User {} is already a member of board {}",
                    input.user_id, input.board_id
                ))
                .into());
            }

            tx.execute(
                "INSERT INTO board_members (id, board_id, user_id, role, status, joined_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    new_id(),
                    &input.board_id,
                    &input.user_id,
                    role.as_str(),
                    Status::Active.as_str(),
                    now,
                ],
            )?;

            let member = find_member(&tx, &input.board_id, &input.user_id)?
                .ok_or_else(|| ApiError::member_not_found(&input.board_id, &input.user_id))?;
            tx.commit()?;
            Ok(member)
        })?;

        info!(board_id = %member.board_id, user_id = %member.user_id, role = %member.role, "member added");
        Ok(member)
    }

    /// Change a member's role between `admin` and `member`.
    pub fn update_member_role(&self, board_id: &str, user_id: &str, role: &str) -> Result<BoardMember> {
        let role = assignable_role(Some(role))?;

        let member = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut member = find_member(&tx, board_id, user_id)?
                .ok_or_else(|| ApiError::member_not_found(board_id, user_id))?;
            if member.role == MemberRole::Owner {
                return Err(ApiError::owner_protected(board_id).into());
            }

            tx.execute(
                "UPDATE board_members SET role = ?1 WHERE id = ?2",
                params![role.as_str(), &member.id],
            )?;
            tx.commit()?;

            member.role = role;
            Ok(member)
        })?;

        info!(board_id, user_id, role = %member.role, "member role updated");
        Ok(member)
    }

    /// Remove a non-owner member from a board.
    pub fn remove_board_member(&self, board_id: &str, user_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let member = find_member(&tx, board_id, user_id)?
                .ok_or_else(|| ApiError::member_not_found(board_id, user_id))?;
            if member.role == MemberRole::Owner {
                return Err(ApiError::owner_protected(board_id).into());
            }

            tx.execute("DELETE FROM board_members WHERE id = ?1", params![&member.id])?;
            tx.commit()?;
            Ok(())
        })?;

        info!(board_id, user_id, "member removed");
        Ok(())
    }
}
