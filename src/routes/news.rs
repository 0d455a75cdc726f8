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
    entity::news::{ActiveModel as NewsActive, Column as NewsCol, Entity as News, Model as NewsModel},
    error::{AppError, AppResult},
    middleware::auth::{CallerIdentity, RequestMeta},
    response::{Ack, Paginated},
    routes::params::ListParams,
    state::AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct NewsListQuery {
    #[serde(flatten)]
    pub params: ListParams,
    pub category: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateNewsRequest {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub status: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateNewsRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub image: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_news).post(create_news))
        .route("/{id}", get(get_news).put(update_news).delete(delete_news))
}

#[utoipa::path(get, path = "/v1/news", tag = "News")]
pub async fn list_news(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<NewsListQuery>,
) -> AppResult<Json<Paginated<NewsModel>>> {
    let (page, limit, offset) = query.params.normalize(10);

    let mut condition = Condition::all();
    if let Some(search) = query.params.search_term() {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(NewsCol::Title).ilike(pattern.clone()))
                .add(Expr::col(NewsCol::Content).ilike(pattern)),
        );
    }
    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(NewsCol::Category.eq(category.clone()));
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(NewsCol::Status.eq(status.clone()));
    }

    let finder = News::find()
        .filter(condition)
        .order_by_desc(NewsCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    Ok(Json(Paginated::new(total, page, limit, items)))
}

#[utoipa::path(get, path = "/v1/news/{id}", tag = "News")]
pub async fn get_news(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<NewsModel>> {
    News::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("News article"))
}

#[utoipa::path(post, path = "/v1/news", tag = "News")]
pub async fn create_news(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Json(payload): Json<CreateNewsRequest>,
) -> AppResult<Json<NewsModel>> {
    let article = NewsActive {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title),
        category: Set(payload.category),
        content: Set(payload.content),
        status: Set(payload.status.unwrap_or_else(|| "draft".into())),
        image: Set(payload.image),
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
        "News",
        Some(article.id),
        Some(&format!("Created news article: {}", article.title)),
        None,
    )
    .await;

    Ok(Json(article))
}

#[utoipa::path(put, path = "/v1/news/{id}", tag = "News")]
pub async fn update_news(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNewsRequest>,
) -> AppResult<Json<NewsModel>> {
    let article = News::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("News article"))?;

    let mut active: NewsActive = article.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(content) = payload.content {
        active.content = Set(content);
    }
    if let Some(category) = payload.category {
        active.category = Set(Some(category));
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    active.updated_at = Set(Utc::now().into());

    let article = active.update(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "update",
        "News",
        Some(article.id),
        Some(&format!("Updated news article: {}", article.title)),
        None,
    )
    .await;

    Ok(Json(article))
}

#[utoipa::path(delete, path = "/v1/news/{id}", tag = "News")]
pub async fn delete_news(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Ack>> {
    let article = News::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("News article"))?;

    let title = article.title.clone();
    News::delete_by_id(id).exec(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "delete",
        "News",
        Some(id),
        Some(&format!("Deleted news article: {title}")),
        None,
    )
    .await;

    Ok(Json(Ack::new("News article deleted successfully")))
}
