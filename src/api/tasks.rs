use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use super::{ApiJson, ApiServer};
use crate::db::positions::OrderedKind;
use crate::db::tasks::{NewTask, TaskUpdate};
use crate::error::{ApiError, ApiResult};
use crate::types::TaskDetail;

#[derive(Debug, Deserialize)]
pub(super) struct ReorderTasksBody {
    #[serde(default, alias = "taskIds")]
    task_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MoveTaskBody {
    #[serde(alias = "listId")]
    list_id: String,
    #[serde(default)]
    position: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AssigneesBody {
    #[serde(default, alias = "userIds")]
    user_ids: Vec<String>,
}

pub(super) async fn list_for_list(
    State(state): State<ApiServer>,
    Path(list_id): Path<String>,
) -> ApiResult<Json<Vec<TaskDetail>>> {
    Ok(Json(state.db().tasks_for_list(&list_id)?))
}

pub(super) async fn get_one(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskDetail>> {
    let task = state
        .db()
        .get_task(&id)?
        .ok_or_else(|| ApiError::task_not_found(&id))?;
    Ok(Json(task))
}

pub(super) async fn create(
    State(state): State<ApiServer>,
    Path(list_id): Path<String>,
    ApiJson(body): ApiJson<NewTask>,
) -> ApiResult<(StatusCode, Json<TaskDetail>)> {
    let task = state.db().create_task(&list_id, body)?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub(super) async fn update(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<TaskUpdate>,
) -> ApiResult<Json<TaskDetail>> {
    Ok(Json(state.db().update_task(&id, body)?))
}

pub(super) async fn delete(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db().delete_task(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rewrite a list's task order; returns the tasks in their new order.
pub(super) async fn reorder(
    State(state): State<ApiServer>,
    Path(list_id): Path<String>,
    ApiJson(body): ApiJson<ReorderTasksBody>,
) -> ApiResult<Json<Vec<TaskDetail>>> {
    state
        .db()
        .reorder(OrderedKind::Task, &list_id, &body.task_ids)?;
    Ok(Json(state.db().tasks_for_list(&list_id)?))
}

pub(super) async fn move_task(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<MoveTaskBody>,
) -> ApiResult<Json<TaskDetail>> {
    state
        .db()
        .move_to_parent(OrderedKind::Task, &id, &body.list_id, body.position)?;
    let task = state
        .db()
        .get_task(&id)?
        .ok_or_else(|| ApiError::task_not_found(&id))?;
    Ok(Json(task))
}

pub(super) async fn set_assignees(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<AssigneesBody>,
) -> ApiResult<Json<TaskDetail>> {
    Ok(Json(state.db().set_task_assignees(&id, &body.user_ids)?))
}
