use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::chat_messages::{
        ActiveModel as MessageActive, Column as MessageCol, Entity as ChatMessages,
        Model as MessageModel,
    },
    error::AppResult,
    middleware::auth::CallerIdentity,
    response::Ack,
    routes::params::lenient_i64,
    state::AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ChatHistoryQuery {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub text: String,
    #[serde(rename = "type")]
    pub message_type: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{session_id}/messages",
        get(session_history)
            .post(send_message)
            .delete(clear_session),
    )
}

/// Oldest-first so the transcript renders in order.
#[utoipa::path(get, path = "/v1/chat/{session_id}/messages", tag = "Chat")]
pub async fn session_history(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(session_id): Path<String>,
    Query(query): Query<ChatHistoryQuery>,
) -> AppResult<Json<Vec<MessageModel>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);

    let messages = ChatMessages::find()
        .filter(MessageCol::SessionId.eq(&session_id))
        .order_by_asc(MessageCol::CreatedAt)
        .limit(limit as u64)
        .all(&state.orm)
        .await?;

    Ok(Json(messages))
}

#[utoipa::path(post, path = "/v1/chat/{session_id}/messages", tag = "Chat")]
pub async fn send_message(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(session_id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<MessageModel>)> {
    let message = MessageActive {
        id: Set(Uuid::new_v4()),
        session_id: Set(session_id),
        text: Set(payload.text),
        message_type: Set(payload.message_type.unwrap_or_else(|| "text".into())),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

#[utoipa::path(delete, path = "/v1/chat/{session_id}/messages", tag = "Chat")]
pub async fn clear_session(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(session_id): Path<String>,
) -> AppResult<Json<Ack>> {
    ChatMessages::delete_many()
        .filter(MessageCol::SessionId.eq(&session_id))
        .exec(&state.orm)
        .await?;

    Ok(Json(Ack::new("Chat history cleared")))
}
