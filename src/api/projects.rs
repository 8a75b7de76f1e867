use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use super::{ApiJson, ApiServer};
use crate::db::cascade::{CascadeReport, OwnerKind};
use crate::db::projects::{NewProject, ProjectUpdate};
use crate::error::{ApiError, ApiResult};
use crate::types::ProjectWithBoards;

pub(super) async fn list(State(state): State<ApiServer>) -> ApiResult<Json<Vec<ProjectWithBoards>>> {
    Ok(Json(state.db().list_projects()?))
}

pub(super) async fn get_one(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProjectWithBoards>> {
    let project = state
        .db()
        .get_project(&id)?
        .ok_or_else(|| ApiError::project_not_found(&id))?;
    Ok(Json(project))
}

pub(super) async fn create(
    State(state): State<ApiServer>,
    ApiJson(body): ApiJson<NewProject>,
) -> ApiResult<(StatusCode, Json<ProjectWithBoards>)> {
    let project = state.db().create_project(body)?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub(super) async fn update(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ProjectUpdate>,
) -> ApiResult<Json<ProjectWithBoards>> {
    Ok(Json(state.db().update_project(&id, body)?))
}

pub(super) async fn delete(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db().delete_project(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn deactivate(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<Json<CascadeReport>> {
    Ok(Json(state.db().deactivate_owner(OwnerKind::Project, &id)?))
}

pub(super) async fn reactivate(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<Json<CascadeReport>> {
    Ok(Json(state.db().reactivate_owner(OwnerKind::Project, &id)?))
}
