use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{CreateUserRequest, UpdateUserRequest, UserResponse};
use super::services;
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = services::list_users(&state).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<UserResponse>> {
    let Path(id) = path?;
    services::get_user(&state, id)
        .await?
        .map(|u| Json(UserResponse::from(u)))
        .ok_or_else(|| AppError::NotFound(format!("User with ID {id} not found.")))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> AppResult<(StatusCode, [(header::HeaderName, String); 1], Json<UserResponse>)> {
    let Json(req) = payload?;
    let user = services::create_user(&state, req).await?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/users/{}", user.id))],
        Json(UserResponse::from(user)),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    let Json(req) = payload?;
    if req.id.is_some_and(|body_id| body_id != id) {
        return Err(AppError::InvalidPayload("User ID mismatch".into()));
    }
    services::update_user(&state, id, req).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    services::delete_user(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
