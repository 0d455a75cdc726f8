use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    audit::log_activity,
    entity::social_media::{
        ActiveModel as LinkActive, Column as LinkCol, Entity as SocialMedia, Model as LinkModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{CallerIdentity, RequestMeta},
    response::Ack,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    pub platform: String,
    pub url: String,
    pub icon: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLinkRequest {
    pub platform: Option<String>,
    pub url: Option<String>,
    pub icon: Option<String>,
    pub status: Option<String>,
    pub sort_order: Option<i32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_links).post(create_link))
        .route("/{id}", get(get_link).put(update_link).delete(delete_link))
}

/// The full set is small and rendered as one footer block, so no
/// pagination here.
#[utoipa::path(get, path = "/v1/social-media", tag = "Social Media")]
pub async fn list_links(
    State(state): State<AppState>,
    _caller: CallerIdentity,
) -> AppResult<Json<Vec<LinkModel>>> {
    let links = SocialMedia::find()
        .order_by_asc(LinkCol::SortOrder)
        .order_by_asc(LinkCol::Platform)
        .all(&state.orm)
        .await?;
    Ok(Json(links))
}

#[utoipa::path(get, path = "/v1/social-media/{id}", tag = "Social Media")]
pub async fn get_link(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<LinkModel>> {
    SocialMedia::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Social media link"))
}

#[utoipa::path(post, path = "/v1/social-media", tag = "Social Media")]
pub async fn create_link(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Json(payload): Json<CreateLinkRequest>,
) -> AppResult<Json<LinkModel>> {
    let exists = SocialMedia::find()
        .filter(LinkCol::Platform.eq(&payload.platform))
        .one(&state.orm)
        .await?
        .is_some();
    if exists {
        return Err(AppError::validation(
            "Platform already registered",
            "platform",
            "must be unique",
        ));
    }

    let link = LinkActive {
        id: Set(Uuid::new_v4()),
        platform: Set(payload.platform),
        url: Set(payload.url),
        icon: Set(payload.icon),
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
        "SocialMedia",
        Some(link.id),
        Some(&format!("Created social media link: {}", link.platform)),
        None,
    )
    .await;

    Ok(Json(link))
}

#[utoipa::path(put, path = "/v1/social-media/{id}", tag = "Social Media")]
pub async fn update_link(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLinkRequest>,
) -> AppResult<Json<LinkModel>> {
    let link = SocialMedia::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Social media link"))?;

    let mut active: LinkActive = link.into();
    if let Some(platform) = payload.platform {
        active.platform = Set(platform);
    }
    if let Some(url) = payload.url {
        active.url = Set(url);
    }
    if let Some(icon) = payload.icon {
        active.icon = Set(Some(icon));
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(sort_order) = payload.sort_order {
        active.sort_order = Set(sort_order);
    }
    active.updated_at = Set(Utc::now().into());

    let link = active.update(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "update",
        "SocialMedia",
        Some(link.id),
        Some(&format!("Updated social media link: {}", link.platform)),
        None,
    )
    .await;

    Ok(Json(link))
}

#[utoipa::path(delete, path = "/v1/social-media/{id}", tag = "Social Media")]
pub async fn delete_link(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Ack>> {
    let link = SocialMedia::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Social media link"))?;

    let platform = link.platform.clone();
    SocialMedia::delete_by_id(id).exec(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(&caller),
        &meta,
        "delete",
        "SocialMedia",
        Some(id),
        Some(&format!("Deleted social media link: {platform}")),
        None,
    )
    .await;

    Ok(Json(Ack::new("Social media link deleted successfully")))
}
