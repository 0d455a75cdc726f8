use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    audit::log_activity,
    entity::media::{ActiveModel as MediaActive, Column as MediaCol, Entity as Media, Model as MediaModel},
    error::{AppError, AppResult},
    middleware::auth::{CallerIdentity, RequestMeta},
    response::{Ack, Paginated},
    routes::params::ListParams,
    state::AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MediaListQuery {
    #[serde(flatten)]
    pub params: ListParams,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

/// Registers a file that already exists under the upload directory; the
/// public URL is derived from the filename, never taken from the client.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterMediaRequest {
    pub filename: String,
    pub original_name: Option<String>,
    pub mime_type: Option<String>,
    pub size: Option<i64>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_media).post(register_media))
        .route("/{id}", get(get_media).delete(delete_media))
}

fn classify(mime_type: Option<&str>) -> &'static str {
    match mime_type {
        Some(m) if m.starts_with("image/") => "image",
        Some(m) if m.starts_with("video/") => "video",
        _ => "file",
    }
}

#[utoipa::path(get, path = "/v1/media", tag = "Media")]
pub async fn list_media(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<MediaListQuery>,
) -> AppResult<Json<Paginated<MediaModel>>> {
    let (page, limit, offset) = query.params.normalize(20);

    let mut condition = Condition::all();
    if let Some(media_type) = query.media_type.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(MediaCol::MediaType.eq(media_type.clone()));
    }

    let finder = Media::find()
        .filter(condition)
        .order_by_desc(MediaCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    Ok(Json(Paginated::new(total, page, limit, items)))
}

#[utoipa::path(get, path = "/v1/media/{id}", tag = "Media")]
pub async fn get_media(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MediaModel>> {
    Media::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Media"))
}

#[utoipa::path(post, path = "/v1/media", tag = "Media")]
pub async fn register_media(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Json(payload): Json<RegisterMediaRequest>,
) -> AppResult<Json<MediaModel>> {
    let filename = payload.filename.trim().to_string();
    if filename.is_empty() || filename.contains('/') || filename.contains("..") {
        return Err(AppError::validation(
            "Invalid media payload",
            "filename",
            "must be a bare filename",
        ));
    }

    let media_type = payload
        .media_type
        .unwrap_or_else(|| classify(payload.mime_type.as_deref()).to_string());

    let media = MediaActive {
        id: Set(Uuid::new_v4()),
        url: Set(format!("/uploads/{filename}")),
        filename: Set(filename),
        original_name: Set(payload.original_name),
        mime_type: Set(payload.mime_type),
        size: Set(payload.size),
        media_type: Set(media_type),
        user_id: Set(Some(caller.user_id)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "create",
        "Media",
        Some(media.id),
        Some(&format!("Registered media: {}", media.filename)),
        None,
    )
    .await;

    Ok(Json(media))
}

#[utoipa::path(delete, path = "/v1/media/{id}", tag = "Media")]
pub async fn delete_media(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Ack>> {
    let media = Media::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Media"))?;

    let filename = media.filename.clone();
    Media::delete_by_id(id).exec(&state.orm).await?;

    // File removal is best effort; a missing file does not fail the
    // request once the row is gone.
    let path = state.upload_dir.join(&filename);
    if let Err(err) = tokio::fs::remove_file(&path).await {
        tracing::warn!(error = %err, file = %path.display(), "failed to remove media file");
    }

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "delete",
        "Media",
        Some(id),
        Some(&format!("Deleted media: {filename}")),
        None,
    )
    .await;

    Ok(Json(Ack::new("Media deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_follows_mime_prefix() {
        assert_eq!(classify(Some("image/png")), "image");
        assert_eq!(classify(Some("video/mp4")), "video");
        assert_eq!(classify(Some("application/pdf")), "file");
        assert_eq!(classify(None), "file");
    }
}
