use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    audit::log_activity,
    entity::{
        poll_options::{
            ActiveModel as OptionActive, Column as OptionCol, Entity as PollOptions,
            Model as OptionModel,
        },
        polls::{ActiveModel as PollActive, Column as PollCol, Entity as Polls, Model as PollModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{CallerIdentity, RequestMeta},
    response::{Ack, Paginated},
    routes::params::ListParams,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    pub question: String,
    pub end_date: Option<DateTime<Utc>>,
    pub options: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePollRequest {
    pub question: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct PollWithOptions {
    #[serde(flatten)]
    pub poll: PollModel,
    pub options: Vec<OptionModel>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_polls).post(create_poll))
        .route("/{id}", get(get_poll).put(update_poll).delete(delete_poll))
}

#[utoipa::path(get, path = "/v1/polls", tag = "Polls")]
pub async fn list_polls(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Paginated<PollWithOptions>>> {
    let (page, limit, offset) = params.normalize(10);

    let finder = Polls::find().order_by_desc(PollCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let polls = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = polls.iter().map(|p| p.id).collect();
    let mut by_poll: HashMap<Uuid, Vec<OptionModel>> = HashMap::new();
    if !ids.is_empty() {
        let options = PollOptions::find()
            .filter(OptionCol::PollId.is_in(ids))
            .order_by_asc(OptionCol::CreatedAt)
            .all(&state.orm)
            .await?;
        for option in options {
            by_poll.entry(option.poll_id).or_default().push(option);
        }
    }

    let items = polls
        .into_iter()
        .map(|poll| {
            let options = by_poll.remove(&poll.id).unwrap_or_default();
            PollWithOptions { poll, options }
        })
        .collect();

    Ok(Json(Paginated::new(total, page, limit, items)))
}

#[utoipa::path(get, path = "/v1/polls/{id}", tag = "Polls")]
pub async fn get_poll(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PollWithOptions>> {
    let poll = Polls::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Poll"))?;

    let options = PollOptions::find()
        .filter(OptionCol::PollId.eq(id))
        .order_by_asc(OptionCol::CreatedAt)
        .all(&state.orm)
        .await?;

    Ok(Json(PollWithOptions { poll, options }))
}

/// Poll and its options are inserted on one transaction.
#[utoipa::path(post, path = "/v1/polls", tag = "Polls")]
pub async fn create_poll(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Json(payload): Json<CreatePollRequest>,
) -> AppResult<Json<PollWithOptions>> {
    if payload.options.len() < 2 {
        return Err(AppError::validation(
            "Invalid poll payload",
            "options",
            "must contain at least two options",
        ));
    }

    let txn = state.orm.begin().await?;

    let poll = PollActive {
        id: Set(Uuid::new_v4()),
        question: Set(payload.question),
        end_date: Set(payload.end_date.map(Into::into)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut options = Vec::with_capacity(payload.options.len());
    for text in payload.options {
        let option = OptionActive {
            id: Set(Uuid::new_v4()),
            poll_id: Set(poll.id),
            text: Set(text),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        options.push(option);
    }

    txn.commit().await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "create",
        "Poll",
        Some(poll.id),
        Some(&format!("Created poll: {}", poll.question)),
        None,
    )
    .await;

    Ok(Json(PollWithOptions { poll, options }))
}

#[utoipa::path(put, path = "/v1/polls/{id}", tag = "Polls")]
pub async fn update_poll(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePollRequest>,
) -> AppResult<Json<PollModel>> {
    let poll = Polls::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Poll"))?;

    let mut active: PollActive = poll.into();
    if let Some(question) = payload.question {
        active.question = Set(question);
    }
    if let Some(end_date) = payload.end_date {
        active.end_date = Set(Some(end_date.into()));
    }
    active.updated_at = Set(Utc::now().into());

    let poll = active.update(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "update",
        "Poll",
        Some(poll.id),
        Some(&format!("Updated poll: {}", poll.question)),
        None,
    )
    .await;

    Ok(Json(poll))
}

#[utoipa::path(delete, path = "/v1/polls/{id}", tag = "Polls")]
pub async fn delete_poll(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Ack>> {
    let txn = state.orm.begin().await?;

    let poll = Polls::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Poll"))?;
    let question = poll.question.clone();

    PollOptions::delete_many()
        .filter(OptionCol::PollId.eq(id))
        .exec(&txn)
        .await?;
    Polls::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "delete",
        "Poll",
        Some(id),
        Some(&format!("Deleted poll: {question}")),
        None,
    )
    .await;

    Ok(Json(Ack::new("Poll deleted successfully")))
}
