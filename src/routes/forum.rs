use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{forum_comments::Model as CommentModel, forums::Model as ForumModel},
    error::AppResult,
    middleware::auth::{CallerIdentity, RequestMeta},
    response::{Ack, Paginated},
    routes::params::ListParams,
    services::forum_service,
    state::AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ForumListQuery {
    #[serde(flatten)]
    pub params: ListParams,
    pub category: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateForumRequest {
    pub title: String,
    pub content: String,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub status: Option<String>,
    pub is_pinned: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateForumRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub status: Option<String>,
    pub is_pinned: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentRequest {
    pub user_id: Uuid,
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub message: &'static str,
    pub like_count: i32,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_forums).post(create_forum))
        .route("/{id}", get(get_forum).put(update_forum).delete(delete_forum))
        .route("/{id}/like", post(like_forum))
        .route("/{id}/comments", get(list_comments).post(add_comment))
        .route(
            "/{id}/comments/{comment_id}",
            axum::routing::put(update_comment).delete(delete_comment),
        )
}

#[utoipa::path(get, path = "/v1/forum", tag = "Forums")]
pub async fn list_forums(
    State(state): State<AppState>,
    Query(query): Query<ForumListQuery>,
) -> AppResult<Json<Paginated<ForumModel>>> {
    Ok(Json(forum_service::list_forums(&state, query).await?))
}

#[utoipa::path(get, path = "/v1/forum/{id}", tag = "Forums")]
pub async fn get_forum(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ForumModel>> {
    Ok(Json(forum_service::get_forum(&state, id).await?))
}

#[utoipa::path(post, path = "/v1/forum", tag = "Forums")]
pub async fn create_forum(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Json(payload): Json<CreateForumRequest>,
) -> AppResult<Json<ForumModel>> {
    Ok(Json(
        forum_service::create_forum(&state, &caller, &meta, payload).await?,
    ))
}

#[utoipa::path(put, path = "/v1/forum/{id}", tag = "Forums")]
pub async fn update_forum(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateForumRequest>,
) -> AppResult<Json<ForumModel>> {
    Ok(Json(
        forum_service::update_forum(&state, &caller, &meta, id, payload).await?,
    ))
}

#[utoipa::path(delete, path = "/v1/forum/{id}", tag = "Forums")]
pub async fn delete_forum(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Ack>> {
    Ok(Json(
        forum_service::delete_forum(&state, &caller, &meta, id).await?,
    ))
}

#[utoipa::path(post, path = "/v1/forum/{id}/like", tag = "Forums")]
pub async fn like_forum(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<LikeResponse>> {
    let forum = forum_service::like_forum(&state, id).await?;
    Ok(Json(LikeResponse {
        message: "Forum post liked",
        like_count: forum.like_count,
    }))
}

#[utoipa::path(get, path = "/v1/forum/{id}/comments", tag = "Forums")]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Paginated<CommentModel>>> {
    let (page, limit, offset) = params.normalize(20);
    Ok(Json(
        forum_service::list_comments(&state, id, page, limit, offset).await?,
    ))
}

#[utoipa::path(post, path = "/v1/forum/{id}/comments", tag = "Forums")]
pub async fn add_comment(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddCommentRequest>,
) -> AppResult<Json<CommentModel>> {
    Ok(Json(forum_service::add_comment(&state, id, payload).await?))
}

#[utoipa::path(put, path = "/v1/forum/{id}/comments/{comment_id}", tag = "Forums")]
pub async fn update_comment(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path((id, comment_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateCommentRequest>,
) -> AppResult<Json<CommentModel>> {
    Ok(Json(
        forum_service::update_comment(&state, id, comment_id, payload.content).await?,
    ))
}

#[utoipa::path(delete, path = "/v1/forum/{id}/comments/{comment_id}", tag = "Forums")]
pub async fn delete_comment(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path((id, comment_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Ack>> {
    Ok(Json(
        forum_service::delete_comment(&state, id, comment_id).await?,
    ))
}
