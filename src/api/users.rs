use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use super::{ApiJson, ApiServer};
use crate::db::cascade::{CascadeReport, OwnerKind, UserDeletionReport};
use crate::db::users::{NewUser, UserUpdate};
use crate::error::{ApiError, ApiResult};
use crate::types::User;

pub(super) async fn list(State(state): State<ApiServer>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.db().list_users()?))
}

pub(super) async fn get_one(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    let user = state
        .db()
        .get_user(&id)?
        .ok_or_else(|| ApiError::user_not_found(&id))?;
    Ok(Json(user))
}

pub(super) async fn create(
    State(state): State<ApiServer>,
    ApiJson(body): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.db().create_user(body)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub(super) async fn update(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UserUpdate>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.db().update_user(&id, body)?))
}

/// Deleting a user hands each owned board to a successor or deletes it.
pub(super) async fn delete(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserDeletionReport>> {
    Ok(Json(state.db().delete_user_and_transfer_ownership(&id)?))
}

pub(super) async fn deactivate(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<Json<CascadeReport>> {
    Ok(Json(state.db().deactivate_owner(OwnerKind::User, &id)?))
}

pub(super) async fn reactivate(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<Json<CascadeReport>> {
    Ok(Json(state.db().reactivate_owner(OwnerKind::User, &id)?))
}
