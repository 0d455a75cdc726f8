use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::notifications::{
        ActiveModel as NotificationActive, Column as NotificationCol, Entity as Notifications,
        Model as NotificationModel,
    },
    error::{AppError, AppResult},
    middleware::auth::CallerIdentity,
    response::{Ack, Paginated},
    routes::params::ListParams,
    state::AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListQuery {
    #[serde(flatten)]
    pub params: ListParams,
    pub status: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    pub user_id: Option<Uuid>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub status: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications).post(create_notification))
        .route("/{id}", axum::routing::delete(delete_notification))
        .route("/{id}/read", patch(mark_read))
}

#[utoipa::path(get, path = "/v1/notifications", tag = "Notifications")]
pub async fn list_notifications(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<NotificationListQuery>,
) -> AppResult<Json<Paginated<NotificationModel>>> {
    let (page, limit, offset) = query.params.normalize(10);

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(NotificationCol::Status.eq(status.clone()));
    }
    if let Some(user_id) = query.user_id {
        condition = condition.add(NotificationCol::UserId.eq(user_id));
    }

    let finder = Notifications::find()
        .filter(condition)
        .order_by_desc(NotificationCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    Ok(Json(Paginated::new(total, page, limit, items)))
}

#[utoipa::path(post, path = "/v1/notifications", tag = "Notifications")]
pub async fn create_notification(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Json(payload): Json<CreateNotificationRequest>,
) -> AppResult<Json<NotificationModel>> {
    let notification = NotificationActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(payload.user_id),
        title: Set(payload.title),
        message: Set(payload.message),
        status: Set(payload.status.unwrap_or_else(|| "Unread".into())),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(Json(notification))
}

#[utoipa::path(patch, path = "/v1/notifications/{id}/read", tag = "Notifications")]
pub async fn mark_read(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<NotificationModel>> {
    let notification = Notifications::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Notification"))?;

    let mut active: NotificationActive = notification.into();
    active.status = Set("Read".into());
    active.updated_at = Set(Utc::now().into());

    Ok(Json(active.update(&state.orm).await?))
}

#[utoipa::path(delete, path = "/v1/notifications/{id}", tag = "Notifications")]
pub async fn delete_notification(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Ack>> {
    let result = Notifications::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Notification"));
    }
    Ok(Json(Ack::new("Notification deleted successfully")))
}
