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
    entity::discounts::{
        ActiveModel as DiscountActive, Column as DiscountCol, Entity as Discounts,
        Model as DiscountModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{CallerIdentity, RequestMeta},
    response::{Ack, Paginated},
    routes::params::ListParams,
    state::AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DiscountListQuery {
    #[serde(flatten)]
    pub params: ListParams,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiscountRequest {
    pub name: String,
    pub description: Option<String>,
    pub discount_type: Option<String>,
    pub discount_value: i64,
    #[serde(default)]
    pub min_purchase: i64,
    pub max_discount: Option<i64>,
    pub applicable_to: Option<String>,
    #[serde(default)]
    pub applicable_ids: Vec<Uuid>,
    pub start_date: Option<chrono::DateTime<Utc>>,
    pub end_date: Option<chrono::DateTime<Utc>>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDiscountRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub discount_type: Option<String>,
    pub discount_value: Option<i64>,
    pub min_purchase: Option<i64>,
    pub max_discount: Option<i64>,
    pub applicable_to: Option<String>,
    pub applicable_ids: Option<Vec<Uuid>>,
    pub start_date: Option<chrono::DateTime<Utc>>,
    pub end_date: Option<chrono::DateTime<Utc>>,
    pub status: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_discounts).post(create_discount))
        .route("/active", get(list_active_discounts))
        .route(
            "/{id}",
            get(get_discount).put(update_discount).delete(delete_discount),
        )
}

#[utoipa::path(get, path = "/v1/discounts", tag = "Discounts")]
pub async fn list_discounts(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<DiscountListQuery>,
) -> AppResult<Json<Paginated<DiscountModel>>> {
    let (page, limit, offset) = query.params.normalize(10);

    let mut condition = Condition::all();
    if let Some(search) = query.params.search_term() {
        condition = condition.add(Expr::col(DiscountCol::Name).ilike(format!("%{search}%")));
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(DiscountCol::Status.eq(status.clone()));
    }

    let finder = Discounts::find()
        .filter(condition)
        .order_by_desc(DiscountCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    Ok(Json(Paginated::new(total, page, limit, items)))
}

/// Discounts currently in force: status is active and `now` falls inside
/// the validity window. Open-ended bounds count as satisfied, and both
/// window checks must hold at once.
#[utoipa::path(get, path = "/v1/discounts/active", tag = "Discounts")]
pub async fn list_active_discounts(
    State(state): State<AppState>,
    _caller: CallerIdentity,
) -> AppResult<Json<Vec<DiscountModel>>> {
    let now = Utc::now();

    let condition = Condition::all()
        .add(DiscountCol::Status.eq("active"))
        .add(
            Condition::any()
                .add(DiscountCol::StartDate.is_null())
                .add(DiscountCol::StartDate.lte(now)),
        )
        .add(
            Condition::any()
                .add(DiscountCol::EndDate.is_null())
                .add(DiscountCol::EndDate.gte(now)),
        );

    let items = Discounts::find()
        .filter(condition)
        .order_by_desc(DiscountCol::CreatedAt)
        .all(&state.orm)
        .await?;

    Ok(Json(items))
}

#[utoipa::path(get, path = "/v1/discounts/{id}", tag = "Discounts")]
pub async fn get_discount(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DiscountModel>> {
    Discounts::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Discount"))
}

#[utoipa::path(post, path = "/v1/discounts", tag = "Discounts")]
pub async fn create_discount(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Json(payload): Json<CreateDiscountRequest>,
) -> AppResult<Json<DiscountModel>> {
    let discount = DiscountActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
        discount_type: Set(payload.discount_type.unwrap_or_else(|| "percentage".into())),
        discount_value: Set(payload.discount_value),
        min_purchase: Set(payload.min_purchase),
        max_discount: Set(payload.max_discount),
        applicable_to: Set(payload.applicable_to.unwrap_or_else(|| "all".into())),
        applicable_ids: Set(serde_json::to_value(&payload.applicable_ids)
            .map_err(|e| AppError::Internal(e.into()))?),
        start_date: Set(payload.start_date.map(Into::into)),
        end_date: Set(payload.end_date.map(Into::into)),
        status: Set(payload.status.unwrap_or_else(|| "active".into())),
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
        "Discount",
        Some(discount.id),
        Some(&format!("Created discount: {}", discount.name)),
        None,
    )
    .await;

    Ok(Json(discount))
}

#[utoipa::path(put, path = "/v1/discounts/{id}", tag = "Discounts")]
pub async fn update_discount(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDiscountRequest>,
) -> AppResult<Json<DiscountModel>> {
    let discount = Discounts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Discount"))?;

    let mut active: DiscountActive = discount.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(discount_type) = payload.discount_type {
        active.discount_type = Set(discount_type);
    }
    if let Some(discount_value) = payload.discount_value {
        active.discount_value = Set(discount_value);
    }
    if let Some(min_purchase) = payload.min_purchase {
        active.min_purchase = Set(min_purchase);
    }
    if let Some(max_discount) = payload.max_discount {
        active.max_discount = Set(Some(max_discount));
    }
    if let Some(applicable_to) = payload.applicable_to {
        active.applicable_to = Set(applicable_to);
    }
    if let Some(applicable_ids) = payload.applicable_ids {
        active.applicable_ids = Set(serde_json::to_value(&applicable_ids)
            .map_err(|e| AppError::Internal(e.into()))?);
    }
    if let Some(start_date) = payload.start_date {
        active.start_date = Set(Some(start_date.into()));
    }
    if let Some(end_date) = payload.end_date {
        active.end_date = Set(Some(end_date.into()));
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    active.updated_at = Set(Utc::now().into());

    let discount = active.update(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "update",
        "Discount",
        Some(discount.id),
        Some(&format!("Updated discount: {}", discount.name)),
        None,
    )
    .await;

    Ok(Json(discount))
}

#[utoipa::path(delete, path = "/v1/discounts/{id}", tag = "Discounts")]
pub async fn delete_discount(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Ack>> {
    let discount = Discounts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Discount"))?;

    let name = discount.name.clone();
    Discounts::delete_by_id(id).exec(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "delete",
        "Discount",
        Some(id),
        Some(&format!("Deleted discount: {name}")),
        None,
    )
    .await;

    Ok(Json(Ack::new("Discount deleted successfully")))
}
