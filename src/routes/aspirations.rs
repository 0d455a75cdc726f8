use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
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
    entity::aspirations::{
        ActiveModel as AspirationActive, Column as AspirationCol, Entity as Aspirations,
        Model as AspirationModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{CallerIdentity, RequestMeta},
    response::{Ack, Paginated},
    routes::params::ListParams,
    state::AppState,
};

const ASPIRATION_STATUSES: [&str; 3] = ["pending", "reviewed", "resolved"];

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AspirationListQuery {
    #[serde(flatten)]
    pub params: ListParams,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAspirationRequest {
    pub user_name: String,
    pub category: Option<String>,
    pub content: String,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAspirationStatusRequest {
    pub status: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_aspirations).post(create_aspiration))
        .route("/{id}", get(get_aspiration).delete(delete_aspiration))
        .route("/{id}/status", patch(update_status))
}

fn validate_status(status: &str) -> AppResult<()> {
    if !ASPIRATION_STATUSES.contains(&status) {
        return Err(AppError::validation(
            "Invalid aspiration payload",
            "status",
            "must be one of: pending, reviewed, resolved",
        ));
    }
    Ok(())
}

#[utoipa::path(get, path = "/v1/aspirations", tag = "Aspirations")]
pub async fn list_aspirations(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<AspirationListQuery>,
) -> AppResult<Json<Paginated<AspirationModel>>> {
    let (page, limit, offset) = query.params.normalize(10);

    let mut condition = Condition::all();
    if let Some(search) = query.params.search_term() {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(AspirationCol::UserName).ilike(pattern.clone()))
                .add(Expr::col(AspirationCol::Content).ilike(pattern)),
        );
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(AspirationCol::Status.eq(status.clone()));
    }

    let finder = Aspirations::find()
        .filter(condition)
        .order_by_desc(AspirationCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    Ok(Json(Paginated::new(total, page, limit, items)))
}

#[utoipa::path(get, path = "/v1/aspirations/{id}", tag = "Aspirations")]
pub async fn get_aspiration(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AspirationModel>> {
    Aspirations::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Aspiration"))
}

#[utoipa::path(post, path = "/v1/aspirations", tag = "Aspirations")]
pub async fn create_aspiration(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Json(payload): Json<CreateAspirationRequest>,
) -> AppResult<(StatusCode, Json<AspirationModel>)> {
    let status = payload.status.unwrap_or_else(|| "pending".into());
    validate_status(&status)?;

    let aspiration = AspirationActive {
        id: Set(Uuid::new_v4()),
        user_name: Set(payload.user_name),
        category: Set(payload.category),
        content: Set(payload.content),
        status: Set(status),
        date: Set(Utc::now().date_naive()),
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
        "Aspiration",
        Some(aspiration.id),
        Some(&format!("Created aspiration from: {}", aspiration.user_name)),
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(aspiration)))
}

/// Status is the only mutable field once an aspiration is filed.
#[utoipa::path(patch, path = "/v1/aspirations/{id}/status", tag = "Aspirations")]
pub async fn update_status(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAspirationStatusRequest>,
) -> AppResult<Json<AspirationModel>> {
    validate_status(&payload.status)?;

    let aspiration = Aspirations::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Aspiration"))?;

    let mut active: AspirationActive = aspiration.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());

    let aspiration = active.update(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "update",
        "Aspiration",
        Some(aspiration.id),
        Some(&format!("Marked aspiration as {}", aspiration.status)),
        None,
    )
    .await;

    Ok(Json(aspiration))
}

#[utoipa::path(delete, path = "/v1/aspirations/{id}", tag = "Aspirations")]
pub async fn delete_aspiration(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Ack>> {
    let aspiration = Aspirations::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Aspiration"))?;

    let user_name = aspiration.user_name.clone();
    Aspirations::delete_by_id(id).exec(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "delete",
        "Aspiration",
        Some(id),
        Some(&format!("Deleted aspiration from: {user_name}")),
        None,
    )
    .await;

    Ok(Json(Ack::new("Aspiration deleted successfully")))
}
