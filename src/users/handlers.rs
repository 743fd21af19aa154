use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{DeletedCount, UserBody, UserResponse};
use super::repo_types::{NewUser, UserFields};
use crate::{error::ApiError, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            post(create_user).get(list_users).delete(delete_users),
        )
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// POST /users
#[instrument(skip(state, body))]
pub async fn create_user(
    State(state): State<AppState>,
    UserBody(body): UserBody,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let new_user = NewUser::try_from(body)?;
    let user = state.users.create_user(new_user).await?;
    info!(user_id = %user.id, "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /users?name=&age=&email=&phoneNumber=
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(filter): Query<UserFields>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.users.find_users(&filter).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .find_user_by_id(&id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user.into()))
}

/// PUT /users/:id, changes only the fields present in the body.
#[instrument(skip(state, updates))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    UserBody(updates): UserBody,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .update_user(&id, &updates)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(user_id = %user.id, "user updated");
    Ok(Json(user.into()))
}

/// DELETE /users?name=&age=&email=&phoneNumber=
///
/// With no query parameters every user is deleted.
#[instrument(skip(state))]
pub async fn delete_users(
    State(state): State<AppState>,
    Query(filter): Query<UserFields>,
) -> Result<Json<DeletedCount>, ApiError> {
    let deleted_count = state.users.delete_users(&filter).await?;
    info!(deleted_count, "users deleted");
    Ok(Json(DeletedCount { deleted_count }))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let user = state
        .users
        .delete_user_by_id(&id)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(user_id = %user.id, "user deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}
