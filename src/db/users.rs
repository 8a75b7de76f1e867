//! User CRUD.
//!
//! Deactivation, reactivation and deletion go through [`super::cascade`].

use super::{Database, new_id, now_ms, required_text};
use crate::error::ApiError;
use crate::types::{User, UserSummary};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Deserialize;
use tracing::info;

/// Fields accepted when creating a user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Partial update; `None` keeps the current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
}

pub fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        full_name: row.get("full_name")?,
        email: row.get("email")?,
        avatar: row.get("avatar")?,
        is_active: row.get("is_active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Parse the `user_*` columns produced by a join on `users`.
pub(crate) fn parse_joined_user(row: &Row) -> rusqlite::Result<Option<UserSummary>> {
    let id: Option<String> = row.get("user_ref")?;
    match id {
        Some(id) => Ok(Some(UserSummary {
            id,
            full_name: row.get("user_full_name")?,
            email: row.get("user_email")?,
            avatar: row.get("user_avatar")?,
        })),
        None => Ok(None),
    }
}

fn validate_email(email: &str) -> Result<String> {
    let email = required_text("email", email)?;
    if !email.contains('@') {
        return Err(ApiError::invalid_value("email", "email must contain '@'").into());
    }
    Ok(email)
}

fn email_taken(conn: &Connection, email: &str, except_id: Option<&str>) -> Result<bool> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM users WHERE email = ?1 COLLATE NOCASE",
            params![email],
            |row| row.get(0),
        )
        .optional()?;
    Ok(match (existing, except_id) {
        (Some(id), Some(except)) => id != except,
        (Some(_), None) => true,
        (None, _) => false,
    })
}

pub(crate) fn get_user_internal(conn: &Connection, user_id: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT * FROM users WHERE id = ?1",
            params![user_id],
            parse_user_row,
        )
        .optional()?;
    Ok(user)
}

impl Database {
    /// Register a new user. Emails are unique, compared case-insensitively.
    pub fn create_user(&self, input: NewUser) -> Result<User> {
        let full_name = required_text("full_name", &input.full_name)?;
        let email = validate_email(&input.email)?;
        let id = new_id();
        let now = now_ms();

        let user = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if email_taken(&tx, &email, None)? {
                return Err(ApiError::already_exists(format!("Email already registered: {}", email))
                    .with_field("email")
                    .into());
            }

            tx.execute(
                "INSERT INTO users (id, full_name, email, avatar, is_active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
                params![&id, &full_name, &email, &input.avatar, now],
            )?;

            tx.commit()?;

            Ok(User {
                id,
                full_name,
                email,
                avatar: input.avatar,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
        })?;

        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    /// Get a user by ID.
    pub fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.with_conn(|conn| get_user_internal(conn, user_id))
    }

    /// List all users, oldest first.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM users ORDER BY created_at ASC, id ASC")?;
            let users = stmt
                .query_map([], parse_user_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
    }

    /// Apply a partial update to a user.
    pub fn update_user(&self, user_id: &str, update: UserUpdate) -> Result<User> {
        let full_name = update
            .full_name
            .as_deref()
            .map(|v| required_text("full_name", v))
            .transpose()?;
        let email = update.email.as_deref().map(validate_email).transpose()?;
        let now = now_ms();

        let user = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut user =
                get_user_internal(&tx, user_id)?.ok_or_else(|| ApiError::user_not_found(user_id))?;

            if let Some(email) = email {
                if email_taken(&tx, &email, Some(user_id))? {
                    return Err(ApiError::already_exists(format!(
                        "Email already registered: {}",
                        email
                    ))
                    .with_field("email")
                    .into());
                }
                user.email = email;
            }
            if let Some(full_name) = full_name {
                user.full_name = full_name;
            }
            if let Some(avatar) = update.avatar {
                user.avatar = Some(avatar);
            }
            user.updated_at = now;

            tx.execute(
                "UPDATE users SET full_name = ?1, email = ?2, avatar = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![&user.full_name, &user.email, &user.avatar, now, user_id],
            )?;

            tx.commit()?;
            Ok(user)
        })?;

        info!(user_id, "user updated");
        Ok(user)
    }
}
