use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use sea_orm::EntityTrait;

use crate::{
    dto::auth::{ChangePasswordRequest, LoginRequest, LoginResponse, UpdateProfileRequest},
    entity::users::{Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::{CallerIdentity, RequestMeta},
    response::Ack,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/profile", put(update_profile))
        .route("/password", put(change_password))
}

#[utoipa::path(post, path = "/v1/auth/login", tag = "Auth")]
pub async fn login(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    Ok(Json(auth_service::login(&state, &meta, payload).await?))
}

#[utoipa::path(get, path = "/v1/auth/me", tag = "Auth")]
pub async fn me(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> AppResult<Json<UserModel>> {
    Users::find_by_id(caller.user_id)
        .one(&state.orm)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("User"))
}

#[utoipa::path(put, path = "/v1/auth/profile", tag = "Auth")]
pub async fn update_profile(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<UserModel>> {
    Ok(Json(
        auth_service::update_profile(&state, &caller, &meta, payload).await?,
    ))
}

#[utoipa::path(put, path = "/v1/auth/password", tag = "Auth")]
pub async fn change_password(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<Ack>> {
    Ok(Json(
        auth_service::change_password(&state, &caller, &meta, payload).await?,
    ))
}
