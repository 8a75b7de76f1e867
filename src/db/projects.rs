//! Project CRUD.

use super::boards::boards_for_project;
use super::{Database, Table, new_id, now_ms, required_text, row_exists};
use crate::error::ApiError;
use crate::types::{Project, ProjectWithBoards, Status, enum_column};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub other_category: Option<String>,
    pub color: String,
    #[serde(default)]
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub other_category: Option<String>,
    pub color: Option<String>,
}

pub fn parse_project_row(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        category: row.get("category")?,
        other_category: row.get("other_category")?,
        color: row.get("color")?,
        owner_id: row.get("owner_id")?,
        status: enum_column(row, "status")?,
        created_at: row.get("created_at")?,
    })
}

fn get_project_internal(conn: &Connection, project_id: &str) -> Result<Option<Project>> {
    let project = conn
        .query_row(
            "SELECT * FROM projects WHERE id = ?1",
            params![project_id],
            parse_project_row,
        )
        .optional()?;
    Ok(project)
}

impl Database {
    pub fn create_project(&self, input: NewProject) -> Result<ProjectWithBoards> {
        let name = required_text("name", &input.name)?;
        let description = required_text("description", &input.description)?;
        let category = required_text("category", &input.category)?;
        let color = required_text("color", &input.color)?;
        let id = new_id();
        let now = now_ms();

        let project = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if let Some(ref owner_id) = input.owner_id {
                if !row_exists(&tx, Table::Users, owner_id)? {
                    return Err(ApiError::user_not_found(owner_id).into());
                }
            }

            tx.execute(
                "INSERT INTO projects (
                    id, name, description, category, other_category, color, owner_id, status, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'active', ?8)",
                params![
                    &id,
                    &name,
                    &description,
                    &category,
                    &input.other_category,
                    &color,
                    &input.owner_id,
                    now,
                ],
            )?;

            tx.commit()?;

            Ok(Project {
                id,
                name,
                description,
                category,
                other_category: input.other_category,
                color,
                owner_id: input.owner_id,
                status: Status::Active,
                created_at: now,
            })
        })?;

        info!(project_id = %project.id, "project created");
        Ok(ProjectWithBoards {
            project,
            boards: Vec::new(),
        })
    }

    /// Get a project with its boards.
    pub fn get_project(&self, project_id: &str) -> Result<Option<ProjectWithBoards>> {
        self.with_conn(|conn| {
            let Some(project) = get_project_internal(conn, project_id)? else {
                return Ok(None);
            };
            let boards = boards_for_project(conn, project_id)?;
            Ok(Some(ProjectWithBoards { project, boards }))
        })
    }

    /// List all projects with their boards, newest first.
    pub fn list_projects(&self) -> Result<Vec<ProjectWithBoards>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM projects ORDER BY created_at DESC, id DESC")?;
            let projects = stmt
                .query_map([], parse_project_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            projects
                .into_iter()
                .map(|project| {
                    let boards = boards_for_project(conn, &project.id)?;
                    Ok(ProjectWithBoards { project, boards })
                })
                .collect()
        })
    }

    pub fn update_project(&self, project_id: &str, update: ProjectUpdate) -> Result<ProjectWithBoards> {
        let project = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut project = get_project_internal(&tx, project_id)?
                .ok_or_else(|| ApiError::project_not_found(project_id))?;

            if let Some(ref v) = update.name {
                project.name = required_text("name", v)?;
            }
            if let Some(ref v) = update.description {
                project.description = required_text("description", v)?;
            }
            if let Some(ref v) = update.category {
                project.category = required_text("category", v)?;
            }
            if let Some(v) = update.other_category {
                project.other_category = Some(v);
            }
            if let Some(ref v) = update.color {
                project.color = required_text("color", v)?;
            }

            tx.execute(
                "UPDATE projects SET name = ?1, description = ?2, category = ?3,
                 other_category = ?4, color = ?5 WHERE id = ?6",
                params![
                    &project.name,
                    &project.description,
                    &project.category,
                    &project.other_category,
                    &project.color,
                    project_id,
                ],
            )?;

            let boards = boards_for_project(&tx, project_id)?;
            tx.commit()?;
            Ok(ProjectWithBoards { project, boards })
        })?;

        info!(project_id, "project updated");
        Ok(project)
    }

    /// Delete a project. Its boards, lists and tasks go with it.
    pub fn delete_project(&self, project_id: &str) -> Result<()> {
        let deleted = self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM projects WHERE id = ?1", params![project_id])?)
        })?;
        if deleted == 0 {
            return Err(ApiError::project_not_found(project_id).into());
        }
        info!(project_id, "project deleted");
        Ok(())
    }
}
