use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use super::{ApiJson, ApiServer};
use crate::db::lists::{ListUpdate, NewList};
use crate::db::positions::OrderedKind;
use crate::error::{ApiError, ApiResult};
use crate::types::{List, ListWithTasks};

#[derive(Debug, Deserialize)]
pub(super) struct ReorderListsBody {
    #[serde(default, alias = "listIds")]
    list_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MoveListBody {
    #[serde(alias = "boardId")]
    board_id: String,
    #[serde(default)]
    position: Option<i64>,
}

pub(super) async fn list_for_board(
    State(state): State<ApiServer>,
    Path(board_id): Path<String>,
) -> ApiResult<Json<Vec<ListWithTasks>>> {
    Ok(Json(state.db().lists_for_board(&board_id)?))
}

pub(super) async fn get_one(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<Json<ListWithTasks>> {
    let list = state
        .db()
        .get_list(&id)?
        .ok_or_else(|| ApiError::list_not_found(&id))?;
    Ok(Json(list))
}

pub(super) async fn create(
    State(state): State<ApiServer>,
    Path(board_id): Path<String>,
    ApiJson(body): ApiJson<NewList>,
) -> ApiResult<(StatusCode, Json<List>)> {
    let list = state.db().create_list(&board_id, body)?;
    Ok((StatusCode::CREATED, Json(list)))
}

pub(super) async fn update(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ListUpdate>,
) -> ApiResult<Json<List>> {
    Ok(Json(state.db().update_list(&id, body)?))
}

pub(super) async fn delete(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db().delete_list(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rewrite a board's list order; returns the lists in their new order.
pub(super) async fn reorder(
    State(state): State<ApiServer>,
    Path(board_id): Path<String>,
    ApiJson(body): ApiJson<ReorderListsBody>,
) -> ApiResult<Json<Vec<ListWithTasks>>> {
    state
        .db()
        .reorder(OrderedKind::List, &board_id, &body.list_ids)?;
    Ok(Json(state.db().lists_for_board(&board_id)?))
}

pub(super) async fn move_list(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<MoveListBody>,
) -> ApiResult<Json<ListWithTasks>> {
    state
        .db()
        .move_to_parent(OrderedKind::List, &id, &body.board_id, body.position)?;
    let list = state
        .db()
        .get_list(&id)?
        .ok_or_else(|| ApiError::list_not_found(&id))?;
    Ok(Json(list))
}
