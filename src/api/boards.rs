use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use super::{ApiJson, ApiServer};
use crate::db::boards::{BoardUpdate, NewBoard};
use crate::db::cascade::{CascadeReport, OwnerKind};
use crate::db::members::NewMember;
use crate::error::{ApiError, ApiResult};
use crate::types::{Board, BoardMember, BoardWithMembers};

#[derive(Debug, Deserialize)]
pub(super) struct AddMemberBody {
    user_id: String,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RoleBody {
    role: String,
}

pub(super) async fn list(State(state): State<ApiServer>) -> ApiResult<Json<Vec<Board>>> {
    Ok(Json(state.db().list_boards()?))
}

pub(super) async fn list_for_user(
    State(state): State<ApiServer>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<Board>>> {
    Ok(Json(state.db().list_boards_for_user(&user_id)?))
}

pub(super) async fn get_one(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<Json<BoardWithMembers>> {
    let board = state
        .db()
        .get_board(&id)?
        .ok_or_else(|| ApiError::board_not_found(&id))?;
    Ok(Json(board))
}

pub(super) async fn create(
    State(state): State<ApiServer>,
    ApiJson(body): ApiJson<NewBoard>,
) -> ApiResult<(StatusCode, Json<BoardWithMembers>)> {
    let board = state.db().create_board(body)?;
    Ok((StatusCode::CREATED, Json(board)))
}

pub(super) async fn update(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<BoardUpdate>,
) -> ApiResult<Json<Board>> {
    Ok(Json(state.db().update_board(&id, body)?))
}

pub(super) async fn delete(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db().delete_board(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn deactivate(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<Json<CascadeReport>> {
    Ok(Json(state.db().deactivate_owner(OwnerKind::Board, &id)?))
}

pub(super) async fn reactivate(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<Json<CascadeReport>> {
    Ok(Json(state.db().reactivate_owner(OwnerKind::Board, &id)?))
}

pub(super) async fn list_members(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<BoardMember>>> {
    Ok(Json(state.db().list_board_members(&id)?))
}

pub(super) async fn add_member(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<AddMemberBody>,
) -> ApiResult<(StatusCode, Json<BoardMember>)> {
    let member = state.db().add_board_member(NewMember {
        board_id: id,
        user_id: body.user_id,
        role: body.role,
    })?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub(super) async fn update_member(
    State(state): State<ApiServer>,
    Path((id, user_id)): Path<(String, String)>,
    ApiJson(body): ApiJson<RoleBody>,
) -> ApiResult<Json<BoardMember>> {
    Ok(Json(state.db().update_member_role(&id, &user_id, &body.role)?))
}

pub(super) async fn remove_member(
    State(state): State<ApiServer>,
    Path((id, user_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.db().remove_board_member(&id, &user_id)?;
    Ok(StatusCode::NO_CONTENT)
}
