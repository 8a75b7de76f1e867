use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use super::{ApiJson, ApiServer};
use crate::db::comments::NewComment;
use crate::error::{ApiError, ApiResult};
use crate::types::TaskComment;

/// Comment body when the task comes from the path.
#[derive(Debug, Deserialize)]
pub(super) struct TaskCommentBody {
    user_id: String,
    content: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ContentBody {
    content: String,
}

pub(super) async fn list_for_task(
    State(state): State<ApiServer>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Vec<TaskComment>>> {
    Ok(Json(state.db().comments_for_task(&task_id)?))
}

pub(super) async fn create_for_task(
    State(state): State<ApiServer>,
    Path(task_id): Path<String>,
    ApiJson(body): ApiJson<TaskCommentBody>,
) -> ApiResult<(StatusCode, Json<TaskComment>)> {
    let comment = state.db().create_comment(NewComment {
        task_id,
        user_id: body.user_id,
        content: body.content,
    })?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub(super) async fn create(
    State(state): State<ApiServer>,
    ApiJson(body): ApiJson<NewComment>,
) -> ApiResult<(StatusCode, Json<TaskComment>)> {
    let comment = state.db().create_comment(body)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub(super) async fn get_one(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskComment>> {
    let comment = state
        .db()
        .get_comment(&id)?
        .ok_or_else(|| ApiError::comment_not_found(&id))?;
    Ok(Json(comment))
}

pub(super) async fn update(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ContentBody>,
) -> ApiResult<Json<TaskComment>> {
    Ok(Json(state.db().update_comment(&id, &body.content)?))
}

pub(super) async fn delete(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db().delete_comment(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
