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
    dto::vouchers::{CreateVoucherRequest, UpdateVoucherRequest},
    entity::vouchers::{
        ActiveModel as VoucherActive, Column as VoucherCol, Entity as Vouchers,
        Model as VoucherModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{CallerIdentity, RequestMeta},
    response::{Ack, Paginated},
    routes::params::ListParams,
    services::voucher_service,
    state::AppState,
};

const DISCOUNT_TYPES: &[&str] = &["percentage", "fixed"];

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct VoucherListQuery {
    #[serde(flatten)]
    pub params: ListParams,
    pub status: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vouchers).post(create_voucher))
        .route("/code/{code}", get(get_voucher_by_code))
        .route(
            "/{id}",
            get(get_voucher).put(update_voucher).delete(delete_voucher),
        )
}

#[utoipa::path(get, path = "/v1/vouchers", tag = "Vouchers")]
pub async fn list_vouchers(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<VoucherListQuery>,
) -> AppResult<Json<Paginated<VoucherModel>>> {
    let (page, limit, offset) = query.params.normalize(10);

    let mut condition = Condition::all();
    if let Some(search) = query.params.search_term() {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(VoucherCol::Code).ilike(pattern.clone()))
                .add(Expr::col(VoucherCol::Name).ilike(pattern)),
        );
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(VoucherCol::Status.eq(status.clone()));
    }

    let finder = Vouchers::find()
        .filter(condition)
        .order_by_desc(VoucherCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    Ok(Json(Paginated::new(total, page, limit, items)))
}

#[utoipa::path(get, path = "/v1/vouchers/{id}", tag = "Vouchers")]
pub async fn get_voucher(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<VoucherModel>> {
    Vouchers::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Voucher"))
}

/// Read-only lookup used at the point of sale; rejects with the reason
/// instead of returning an unusable voucher.
#[utoipa::path(get, path = "/v1/vouchers/code/{code}", tag = "Vouchers")]
pub async fn get_voucher_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<VoucherModel>> {
    let voucher = Vouchers::find()
        .filter(VoucherCol::Code.eq(code.trim().to_uppercase()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Voucher"))?;

    voucher_service::check_validity(&voucher, Utc::now())
        .map_err(|reason| AppError::Invalid(reason.message().into()))?;

    Ok(Json(voucher))
}

#[utoipa::path(post, path = "/v1/vouchers", tag = "Vouchers")]
pub async fn create_voucher(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Json(payload): Json<CreateVoucherRequest>,
) -> AppResult<Json<VoucherModel>> {
    let discount_type = payload.discount_type.unwrap_or_else(|| "percentage".into());
    if !DISCOUNT_TYPES.contains(&discount_type.as_str()) {
        return Err(AppError::validation(
            "Invalid voucher payload",
            "discountType",
            "must be one of percentage, fixed",
        ));
    }
    if payload.discount_value < 0 {
        return Err(AppError::validation(
            "Invalid voucher payload",
            "discountValue",
            "must not be negative",
        ));
    }

    let code = payload.code.trim().to_uppercase();
    let exists = Vouchers::find()
        .filter(VoucherCol::Code.eq(&code))
        .one(&state.orm)
        .await?
        .is_some();
    if exists {
        return Err(AppError::validation(
            "Voucher code is already taken",
            "code",
            "must be unique",
        ));
    }

    let voucher = VoucherActive {
        id: Set(Uuid::new_v4()),
        code: Set(code),
        name: Set(payload.name),
        description: Set(payload.description),
        discount_type: Set(discount_type),
        discount_value: Set(payload.discount_value),
        min_purchase: Set(payload.min_purchase),
        max_discount: Set(payload.max_discount),
        usage_limit: Set(payload.usage_limit),
        used_count: Set(0),
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
        "Voucher",
        Some(voucher.id),
        Some(&format!("Created voucher: {}", voucher.code)),
        None,
    )
    .await;

    Ok(Json(voucher))
}

#[utoipa::path(put, path = "/v1/vouchers/{id}", tag = "Vouchers")]
pub async fn update_voucher(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVoucherRequest>,
) -> AppResult<Json<VoucherModel>> {
    let voucher = Vouchers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Voucher"))?;

    if let Some(discount_type) = payload.discount_type.as_deref() {
        if !DISCOUNT_TYPES.contains(&discount_type) {
            return Err(AppError::validation(
                "Invalid voucher payload",
                "discountType",
                "must be one of percentage, fixed",
            ));
        }
    }

    let mut active: VoucherActive = voucher.into();
    if let Some(code) = payload.code {
        active.code = Set(code.trim().to_uppercase());
    }
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
    if let Some(usage_limit) = payload.usage_limit {
        active.usage_limit = Set(Some(usage_limit));
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

    let voucher = active.update(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "update",
        "Voucher",
        Some(voucher.id),
        Some(&format!("Updated voucher: {}", voucher.code)),
        None,
    )
    .await;

    Ok(Json(voucher))
}

#[utoipa::path(delete, path = "/v1/vouchers/{id}", tag = "Vouchers")]
pub async fn delete_voucher(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Ack>> {
    let voucher = Vouchers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Voucher"))?;

    let code = voucher.code.clone();
    Vouchers::delete_by_id(id).exec(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "delete",
        "Voucher",
        Some(id),
        Some(&format!("Deleted voucher: {code}")),
        None,
    )
    .await;

    Ok(Json(Ack::new("Voucher deleted successfully")))
}
