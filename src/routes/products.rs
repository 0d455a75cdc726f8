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
    entity::products::{
        ActiveModel as ProductActive, Column as ProductCol, Entity as Products,
        Model as ProductModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{CallerIdentity, RequestMeta},
    response::{Ack, Paginated},
    routes::params::ListParams,
    state::AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    #[serde(flatten)]
    pub params: ListParams,
    pub category: Option<String>,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub price: i64,
    pub category: Option<String>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub category: Option<String>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub stock: Option<i32>,
    pub images: Option<Vec<String>>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[utoipa::path(get, path = "/v1/products", tag = "Products")]
pub async fn list_products(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Json<Paginated<ProductModel>>> {
    let (page, limit, offset) = query.params.normalize(10);

    let mut condition = Condition::all();
    if let Some(search) = query.params.search_term() {
        condition = condition.add(Expr::col(ProductCol::Name).ilike(format!("%{search}%")));
    }
    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(ProductCol::Category.eq(category.clone()));
    }
    if let Some(category_id) = query.category_id {
        condition = condition.add(ProductCol::CategoryId.eq(category_id));
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_desc(ProductCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    Ok(Json(Paginated::new(total, page, limit, items)))
}

#[utoipa::path(get, path = "/v1/products/{id}", tag = "Products")]
pub async fn get_product(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProductModel>> {
    Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Product"))
}

#[utoipa::path(post, path = "/v1/products", tag = "Products")]
pub async fn create_product(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<Json<ProductModel>> {
    if payload.price < 0 {
        return Err(AppError::validation(
            "Invalid product payload",
            "price",
            "must not be negative",
        ));
    }
    if payload.stock < 0 {
        return Err(AppError::validation(
            "Invalid product payload",
            "stock",
            "must not be negative",
        ));
    }

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        price: Set(payload.price),
        category: Set(payload.category),
        category_id: Set(payload.category_id),
        description: Set(payload.description),
        stock: Set(payload.stock),
        images: Set(serde_json::to_value(&payload.images)
            .map_err(|e| AppError::Internal(e.into()))?),
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
        "Product",
        Some(product.id),
        Some(&format!("Created product: {}", product.name)),
        None,
    )
    .await;

    Ok(Json(product))
}

#[utoipa::path(put, path = "/v1/products/{id}", tag = "Products")]
pub async fn update_product(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ProductModel>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    let mut active: ProductActive = product.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::validation(
                "Invalid product payload",
                "price",
                "must not be negative",
            ));
        }
        active.price = Set(price);
    }
    if let Some(category) = payload.category {
        active.category = Set(Some(category));
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(images) = payload.images {
        active.images =
            Set(serde_json::to_value(&images).map_err(|e| AppError::Internal(e.into()))?);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "update",
        "Product",
        Some(product.id),
        Some(&format!("Updated product: {}", product.name)),
        None,
    )
    .await;

    Ok(Json(product))
}

#[utoipa::path(delete, path = "/v1/products/{id}", tag = "Products")]
pub async fn delete_product(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Ack>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    let name = product.name.clone();
    Products::delete_by_id(id).exec(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "delete",
        "Product",
        Some(id),
        Some(&format!("Deleted product: {name}")),
        None,
    )
    .await;

    Ok(Json(Ack::new("Product deleted successfully")))
}
