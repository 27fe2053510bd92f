use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::instrument;

use super::dto::{LoginRequest, TokenResponse};
use super::services::authenticate;
use crate::{error::AppResult, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/authentication/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<TokenResponse>> {
    let Json(payload) = payload?;
    let user = authenticate(&state, &payload.user_name, &payload.password).await?;
    let token = state.jwt.issue(&user.user_name)?;
    Ok(Json(TokenResponse { token }))
}
