use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use super::{ApiJson, ApiServer};
use crate::error::ApiResult;
use crate::types::TaskAssignment;

#[derive(Debug, Deserialize)]
pub(super) struct AssignBody {
    #[serde(default, alias = "userIds")]
    user_ids: Vec<String>,
}

pub(super) async fn list_for_task(
    State(state): State<ApiServer>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Vec<TaskAssignment>>> {
    Ok(Json(state.db().assignments_for_task(&task_id)?))
}

pub(super) async fn list_for_user(
    State(state): State<ApiServer>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<TaskAssignment>>> {
    Ok(Json(state.db().assignments_for_user(&user_id)?))
}

pub(super) async fn assign(
    State(state): State<ApiServer>,
    Path(task_id): Path<String>,
    ApiJson(body): ApiJson<AssignBody>,
) -> ApiResult<(StatusCode, Json<Vec<TaskAssignment>>)> {
    let rows = state.db().assign_users(&task_id, &body.user_ids)?;
    Ok((StatusCode::CREATED, Json(rows)))
}

pub(super) async fn remove(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db().remove_assignment(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
