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
    entity::product_categories::{
        ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories,
        Model as CategoryModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{CallerIdentity, RequestMeta},
    response::{Ack, Paginated},
    routes::params::ListParams,
    state::AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CategoryListQuery {
    #[serde(flatten)]
    pub params: ListParams,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<Uuid>,
    pub status: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<Uuid>,
    pub status: Option<String>,
    pub sort_order: Option<i32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

#[utoipa::path(get, path = "/v1/product-categories", tag = "Product Categories")]
pub async fn list_categories(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<CategoryListQuery>,
) -> AppResult<Json<Paginated<CategoryModel>>> {
    let (page, limit, offset) = query.params.normalize(10);

    let mut condition = Condition::all();
    if let Some(search) = query.params.search_term() {
        condition = condition.add(Expr::col(CategoryCol::Name).ilike(format!("%{search}%")));
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(CategoryCol::Status.eq(status.clone()));
    }

    let finder = Categories::find()
        .filter(condition)
        .order_by_asc(CategoryCol::SortOrder)
        .order_by_asc(CategoryCol::Name);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    Ok(Json(Paginated::new(total, page, limit, items)))
}

#[utoipa::path(get, path = "/v1/product-categories/{id}", tag = "Product Categories")]
pub async fn get_category(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CategoryModel>> {
    Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Product category"))
}

#[utoipa::path(post, path = "/v1/product-categories", tag = "Product Categories")]
pub async fn create_category(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<Json<CategoryModel>> {
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
        image: Set(payload.image),
        parent_id: Set(payload.parent_id),
        status: Set(payload.status.unwrap_or_else(|| "active".into())),
        sort_order: Set(payload.sort_order),
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
        "ProductCategory",
        Some(category.id),
        Some(&format!("Created product category: {}", category.name)),
        None,
    )
    .await;

    Ok(Json(category))
}

#[utoipa::path(put, path = "/v1/product-categories/{id}", tag = "Product Categories")]
pub async fn update_category(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> AppResult<Json<CategoryModel>> {
    let category = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Product category"))?;

    let mut active: CategoryActive = category.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    if let Some(parent_id) = payload.parent_id {
        active.parent_id = Set(Some(parent_id));
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(sort_order) = payload.sort_order {
        active.sort_order = Set(sort_order);
    }
    active.updated_at = Set(Utc::now().into());

    let category = active.update(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "update",
        "ProductCategory",
        Some(category.id),
        Some(&format!("Updated product category: {}", category.name)),
        None,
    )
    .await;

    Ok(Json(category))
}

#[utoipa::path(delete, path = "/v1/product-categories/{id}", tag = "Product Categories")]
pub async fn delete_category(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Ack>> {
    let category = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Product category"))?;

    let name = category.name.clone();
    Categories::delete_by_id(id).exec(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "delete",
        "ProductCategory",
        Some(id),
        Some(&format!("Deleted product category: {name}")),
        None,
    )
    .await;

    Ok(Json(Ack::new("Product category deleted successfully")))
}
