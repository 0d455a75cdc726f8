use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    audit::log_activity,
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::{CallerIdentity, RequestMeta},
    response::{Ack, Paginated},
    routes::params::ListParams,
    services::auth_service,
    state::AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UserListQuery {
    #[serde(flatten)]
    pub params: ListParams,
    pub role: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
    pub status: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
}

#[utoipa::path(get, path = "/v1/users", tag = "Users")]
pub async fn list_users(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<Paginated<UserModel>>> {
    let (page, limit, offset) = query.params.normalize(10);

    let mut condition = Condition::all();
    if let Some(search) = query.params.search_term() {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(UserCol::Name).ilike(pattern.clone()))
                .add(Expr::col(UserCol::Email).ilike(pattern)),
        );
    }
    if let Some(role) = query.role.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(UserCol::Role.eq(role.clone()));
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(UserCol::Status.eq(status.clone()));
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(UserCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    Ok(Json(Paginated::new(total, page, limit, items)))
}

#[utoipa::path(get, path = "/v1/users/{id}", tag = "Users")]
pub async fn get_user(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserModel>> {
    Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("User"))
}

#[utoipa::path(post, path = "/v1/users", tag = "Users")]
pub async fn create_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<Json<UserModel>> {
    if auth_service::email_taken(&state.orm, &payload.email, None).await? {
        return Err(AppError::validation(
            "Email is already taken",
            "email",
            "must be unique",
        ));
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        email: Set(payload.email),
        password_hash: Set(auth_service::hash_password(&payload.password)?),
        role: Set(payload.role.unwrap_or_else(|| "user".into())),
        status: Set(payload.status.unwrap_or_else(|| "active".into())),
        phone: Set(payload.phone),
        avatar: Set(payload.avatar),
        last_login: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "create",
        "User",
        Some(user.id),
        Some(&format!("Created user: {}", user.email)),
        None,
    )
    .await;

    Ok(Json(user))
}

#[utoipa::path(put, path = "/v1/users/{id}", tag = "Users")]
pub async fn update_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserModel>> {
    let user = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    if let Some(email) = payload.email.as_deref() {
        if email != user.email && auth_service::email_taken(&state.orm, email, Some(id)).await? {
            return Err(AppError::validation(
                "Email is already taken",
                "email",
                "must be unique",
            ));
        }
    }

    let mut active: UserActive = user.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(email) = payload.email {
        active.email = Set(email);
    }
    if let Some(password) = payload.password.filter(|p| !p.is_empty()) {
        active.password_hash = Set(auth_service::hash_password(&password)?);
    }
    if let Some(role) = payload.role {
        active.role = Set(role);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(avatar) = payload.avatar {
        active.avatar = Set(Some(avatar));
    }
    active.updated_at = Set(Utc::now().into());

    let user = active.update(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "update",
        "User",
        Some(user.id),
        Some(&format!("Updated user: {}", user.email)),
        None,
    )
    .await;

    Ok(Json(user))
}

#[utoipa::path(delete, path = "/v1/users/{id}", tag = "Users")]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Ack>> {
    let user = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let email = user.email.clone();
    Users::delete_by_id(id).exec(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "delete",
        "User",
        Some(id),
        Some(&format!("Deleted user: {email}")),
        None,
    )
    .await;

    Ok(Json(Ack::new("User deleted successfully")))
}
