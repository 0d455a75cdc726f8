use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::{NaiveDate, NaiveTime, Utc};
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
    entity::events::{ActiveModel as EventActive, Column as EventCol, Entity as Events, Model as EventModel},
    error::{AppError, AppResult},
    middleware::auth::{CallerIdentity, RequestMeta},
    response::{Ack, Paginated},
    routes::params::ListParams,
    state::AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct EventListQuery {
    #[serde(flatten)]
    pub params: ListParams,
    pub category: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub location: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub location: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/{id}", get(get_event).put(update_event).delete(delete_event))
}

#[utoipa::path(get, path = "/v1/events", tag = "Events")]
pub async fn list_events(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<EventListQuery>,
) -> AppResult<Json<Paginated<EventModel>>> {
    let (page, limit, offset) = query.params.normalize(10);

    let mut condition = Condition::all();
    if let Some(search) = query.params.search_term() {
        condition = condition.add(Expr::col(EventCol::Title).ilike(format!("%{search}%")));
    }
    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(EventCol::Category.eq(category.clone()));
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(EventCol::Status.eq(status.clone()));
    }

    // Upcoming-first calendar ordering.
    let finder = Events::find()
        .filter(condition)
        .order_by_asc(EventCol::Date)
        .order_by_asc(EventCol::Time);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    Ok(Json(Paginated::new(total, page, limit, items)))
}

#[utoipa::path(get, path = "/v1/events/{id}", tag = "Events")]
pub async fn get_event(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EventModel>> {
    Events::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Event"))
}

#[utoipa::path(post, path = "/v1/events", tag = "Events")]
pub async fn create_event(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Json(payload): Json<CreateEventRequest>,
) -> AppResult<Json<EventModel>> {
    let event = EventActive {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title),
        description: Set(payload.description),
        date: Set(payload.date),
        time: Set(payload.time),
        location: Set(payload.location),
        image: Set(payload.image),
        category: Set(payload.category),
        status: Set(payload.status.unwrap_or_else(|| "upcoming".into())),
        created_by: Set(Some(caller.user_id)),
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
        "Event",
        Some(event.id),
        Some(&format!("Created event: {}", event.title)),
        None,
    )
    .await;

    Ok(Json(event))
}

#[utoipa::path(put, path = "/v1/events/{id}", tag = "Events")]
pub async fn update_event(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEventRequest>,
) -> AppResult<Json<EventModel>> {
    let event = Events::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Event"))?;

    let mut active: EventActive = event.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(date) = payload.date {
        active.date = Set(date);
    }
    if let Some(time) = payload.time {
        active.time = Set(Some(time));
    }
    if let Some(location) = payload.location {
        active.location = Set(Some(location));
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    if let Some(category) = payload.category {
        active.category = Set(Some(category));
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    active.updated_at = Set(Utc::now().into());

    let event = active.update(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "update",
        "Event",
        Some(event.id),
        Some(&format!("Updated event: {}", event.title)),
        None,
    )
    .await;

    Ok(Json(event))
}

#[utoipa::path(delete, path = "/v1/events/{id}", tag = "Events")]
pub async fn delete_event(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Ack>> {
    let event = Events::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Event"))?;

    let title = event.title.clone();
    Events::delete_by_id(id).exec(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "delete",
        "Event",
        Some(id),
        Some(&format!("Deleted event: {title}")),
        None,
    )
    .await;

    Ok(Json(Ack::new("Event deleted successfully")))
}
