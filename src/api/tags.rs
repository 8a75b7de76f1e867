use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use super::{ApiJson, ApiServer};
use crate::db::tags::{NewTag, TagUpdate};
use crate::error::{ApiError, ApiResult};
use crate::types::{Tag, Task};

#[derive(Debug, Deserialize)]
pub(super) struct TagIdsBody {
    #[serde(default, alias = "tagIds")]
    tag_ids: Vec<String>,
}

pub(super) async fn list(State(state): State<ApiServer>) -> ApiResult<Json<Vec<Tag>>> {
    Ok(Json(state.db().list_tags()?))
}

pub(super) async fn get_one(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<Json<Tag>> {
    let tag = state
        .db()
        .get_tag(&id)?
        .ok_or_else(|| ApiError::tag_not_found(&id))?;
    Ok(Json(tag))
}

pub(super) async fn create(
    State(state): State<ApiServer>,
    ApiJson(body): ApiJson<NewTag>,
) -> ApiResult<(StatusCode, Json<Tag>)> {
    let tag = state.db().create_tag(body)?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub(super) async fn update(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<TagUpdate>,
) -> ApiResult<Json<Tag>> {
    Ok(Json(state.db().update_tag(&id, body)?))
}

pub(super) async fn delete(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db().delete_tag(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn tasks_with_tag(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.db().tasks_with_tag(&id)?))
}

pub(super) async fn list_for_task(
    State(state): State<ApiServer>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Vec<Tag>>> {
    Ok(Json(state.db().task_tags(&task_id)?))
}

pub(super) async fn add_to_task(
    State(state): State<ApiServer>,
    Path(task_id): Path<String>,
    ApiJson(body): ApiJson<TagIdsBody>,
) -> ApiResult<Json<Vec<Tag>>> {
    if body.tag_ids.is_empty() {
        return Err(ApiError::missing_field("tag_ids"));
    }
    Ok(Json(state.db().add_task_tags(&task_id, &body.tag_ids)?))
}

pub(super) async fn remove_from_task(
    State(state): State<ApiServer>,
    Path(task_id): Path<String>,
    ApiJson(body): ApiJson<TagIdsBody>,
) -> ApiResult<Json<Vec<Tag>>> {
    if body.tag_ids.is_empty() {
        return Err(ApiError::missing_field("tag_ids"));
    }
    Ok(Json(state.db().remove_task_tags(&task_id, &body.tag_ids)?))
}
