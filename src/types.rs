//! Core types for the Kanban API.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a string-backed enum with `as_str`, `Display` and `FromStr`.
///
/// Parsing failures surface as `InvalidFieldValue` errors naming `$field`.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ApiError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => {
                        let allowed: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        Err(ApiError::invalid_value(
                            $field,
                            format!("'{}' is not one of: {}", other, allowed.join(", ")),
                        ))
                    }
                }
            }
        }
    };
}

string_enum! {
    /// Activation state shared by projects, boards and memberships.
    Status, "status" {
        Active => "active",
        Inactive => "inactive",
    }
}

impl Status {
    pub fn from_active(active: bool) -> Self {
        if active { Status::Active } else { Status::Inactive }
    }

    pub fn is_active(self) -> bool {
        self == Status::Active
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Active
    }
}

string_enum! {
    /// Role of a user on a board.
    MemberRole, "role" {
        Owner => "owner",
        Admin => "admin",
        Member => "member",
    }
}

string_enum! {
    Visibility, "visibility" {
        Public => "public",
        Private => "private",
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Private
    }
}

string_enum! {
    /// Work state of a task (independent of activation state).
    TaskStatus, "status" {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

string_enum! {
    TaskPriority, "priority" {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// Read a string-enum column, mapping bad values to a conversion error.
pub(crate) fn enum_column<T: FromStr>(row: &rusqlite::Row, column: &str) -> rusqlite::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(column)?;
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A project groups boards under one owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub other_category: Option<String>,
    pub color: String,
    pub owner_id: Option<String>,
    pub status: Status,
    pub created_at: i64,
}

/// Project with its boards attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectWithBoards {
    #[serde(flatten)]
    pub project: Project,
    pub boards: Vec<Board>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    pub status: Status,
    pub owner_id: Option<String>,
    pub project_id: Option<String>,
    pub created_at: i64,
}

/// Board with its memberships attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardWithMembers {
    #[serde(flatten)]
    pub board: Board,
    pub members: Vec<BoardMember>,
}

/// Membership of a user on a board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardMember {
    pub id: String,
    pub board_id: String,
    pub user_id: String,
    pub role: MemberRole,
    pub status: Status,
    pub joined_at: i64,
    /// Display fields of the member, when joined in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

/// Public subset of a user embedded in other resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub avatar: Option<String>,
}

/// A column on a board. Ordered among its siblings by `position`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    pub id: String,
    pub board_id: String,
    pub title: String,
    pub position: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListWithTasks {
    #[serde(flatten)]
    pub list: List,
    pub tasks: Vec<Task>,
}

/// A card on a list. Ordered among its siblings by `position`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub list_id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<i64>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub position: i64,
    pub assignee_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Task with tags and assignees attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub tags: Vec<Tag>,
    pub assignees: Vec<UserSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskComment {
    pub id: String,
    pub task_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignment {
    pub id: String,
    pub task_id: String,
    pub user_id: String,
    pub assigned_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Admin".parse::<MemberRole>().unwrap(), MemberRole::Admin);
        assert_eq!(" IN_PROGRESS ".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
    }

    #[test]
    fn parse_rejects_unknown_values() {
        let err = "superuser".parse::<MemberRole>().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldValue);
        assert_eq!(err.field.as_deref(), Some("role"));
        assert!(err.message.contains("owner, admin, member"));
    }

    #[test]
    fn defaults_match_schema_defaults() {
        assert_eq!(Status::default(), Status::Active);
        assert_eq!(Visibility::default(), Visibility::Private);
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn serde_uses_storage_names() {
        assert_eq!(serde_json::to_value(TaskStatus::InProgress).unwrap(), "in_progress");
        assert_eq!(serde_json::to_value(Status::Inactive).unwrap(), "inactive");
    }

    #[test]
    fn status_from_active_flag() {
        assert_eq!(Status::from_active(true), Status::Active);
        assert!(!Status::from_active(false).is_active());
    }
}
