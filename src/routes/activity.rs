use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    entity::activity_logs::{Column as LogCol, Entity as ActivityLogs, Model as LogModel},
    error::AppResult,
    middleware::auth::CallerIdentity,
    response::Paginated,
    routes::params::ListParams,
    state::AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ActivityListQuery {
    #[serde(flatten)]
    pub params: ListParams,
    pub action: Option<String>,
    pub entity: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_activity))
}

#[utoipa::path(get, path = "/v1/activity-log", tag = "Activity")]
pub async fn list_activity(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<ActivityListQuery>,
) -> AppResult<Json<Paginated<LogModel>>> {
    let (page, limit, offset) = query.params.normalize(10);

    let mut condition = Condition::all();
    if let Some(action) = query.action.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(LogCol::Action.eq(action.clone()));
    }
    if let Some(entity) = query.entity.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(LogCol::Entity.eq(entity.clone()));
    }

    let finder = ActivityLogs::find()
        .filter(condition)
        .order_by_desc(LogCol::Timestamp);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    Ok(Json(Paginated::new(total, page, limit, items)))
}
