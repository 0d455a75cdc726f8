use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_activity,
    entity::{
        forum_comments::{
            ActiveModel as CommentActive, Column as CommentCol, Entity as ForumComments,
            Model as CommentModel,
        },
        forums::{ActiveModel as ForumActive, Column as ForumCol, Entity as Forums, Model as ForumModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{CallerIdentity, RequestMeta},
    response::{Ack, Paginated},
    routes::forum::{AddCommentRequest, CreateForumRequest, ForumListQuery, UpdateForumRequest},
    state::AppState,
};

pub async fn list_forums(
    state: &AppState,
    query: ForumListQuery,
) -> AppResult<Paginated<ForumModel>> {
    let (page, limit, offset) = query.params.normalize(10);

    let mut condition = Condition::all();
    if let Some(search) = query.params.search_term() {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(ForumCol::Title).ilike(pattern.clone()))
                .add(Expr::col(ForumCol::Content).ilike(pattern)),
        );
    }
    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(ForumCol::Category.eq(category.clone()));
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(ForumCol::Status.eq(status.clone()));
    }

    // Pinned posts surface first.
    let finder = Forums::find()
        .filter(condition)
        .order_by_desc(ForumCol::IsPinned)
        .order_by_desc(ForumCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    Ok(Paginated::new(total, page, limit, items))
}

/// Fetches a post and bumps its view counter in one atomic column
/// expression.
pub async fn get_forum(state: &AppState, id: Uuid) -> AppResult<ForumModel> {
    let result = Forums::update_many()
        .col_expr(ForumCol::ViewCount, Expr::col(ForumCol::ViewCount).add(1))
        .filter(ForumCol::Id.eq(id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Forum post"));
    }

    Forums::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Forum post"))
}

pub async fn create_forum(
    state: &AppState,
    caller: &CallerIdentity,
    meta: &RequestMeta,
    payload: CreateForumRequest,
) -> AppResult<ForumModel> {
    let forum = ForumActive {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title),
        content: Set(payload.content),
        user_id: Set(payload.user_id),
        user_name: Set(payload.user_name),
        category: Set(payload.category),
        image: Set(payload.image),
        view_count: Set(0),
        like_count: Set(0),
        comment_count: Set(0),
        status: Set(payload.status.unwrap_or_else(|| "active".into())),
        is_pinned: Set(payload.is_pinned.unwrap_or(false)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    log_activity(
        &state.pool,
        Some(caller),
        meta,
        "create",
        "Forum",
        Some(forum.id),
        Some(&format!("Created forum post: {}", forum.title)),
        None,
    )
    .await;

    Ok(forum)
}

pub async fn update_forum(
    state: &AppState,
    caller: &CallerIdentity,
    meta: &RequestMeta,
    id: Uuid,
    payload: UpdateForumRequest,
) -> AppResult<ForumModel> {
    let forum = Forums::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Forum post"))?;

    let mut active: ForumActive = forum.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(content) = payload.content {
        active.content = Set(content);
    }
    if let Some(category) = payload.category {
        active.category = Set(Some(category));
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(is_pinned) = payload.is_pinned {
        active.is_pinned = Set(is_pinned);
    }
    active.updated_at = Set(Utc::now().into());

    let forum = active.update(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(caller),
        meta,
        "update",
        "Forum",
        Some(forum.id),
        Some(&format!("Updated forum post: {}", forum.title)),
        None,
    )
    .await;

    Ok(forum)
}

/// Deleting a post cascades to its comments; both deletes run on one
/// transaction.
pub async fn delete_forum(
    state: &AppState,
    caller: &CallerIdentity,
    meta: &RequestMeta,
    id: Uuid,
) -> AppResult<Ack> {
    let txn = state.orm.begin().await?;

    let forum = Forums::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Forum post"))?;
    let title = forum.title.clone();

    ForumComments::delete_many()
        .filter(CommentCol::ForumId.eq(id))
        .exec(&txn)
        .await?;
    Forums::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    log_activity(
        &state.pool,
        Some(caller),
        meta,
        "delete",
        "Forum",
        Some(id),
        Some(&format!("Deleted forum post: {title}")),
        None,
    )
    .await;

    Ok(Ack::new("Forum post deleted successfully"))
}

pub async fn like_forum(state: &AppState, id: Uuid) -> AppResult<ForumModel> {
    let result = Forums::update_many()
        .col_expr(ForumCol::LikeCount, Expr::col(ForumCol::LikeCount).add(1))
        .filter(ForumCol::Id.eq(id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Forum post"));
    }

    Forums::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Forum post"))
}

pub async fn list_comments(
    state: &AppState,
    forum_id: Uuid,
    page: i64,
    limit: i64,
    offset: i64,
) -> AppResult<Paginated<CommentModel>> {
    let finder = ForumComments::find()
        .filter(CommentCol::ForumId.eq(forum_id))
        .order_by_asc(CommentCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    Ok(Paginated::new(total, page, limit, items))
}

/// Inserting the comment and bumping the denormalized counter commit
/// together.
pub async fn add_comment(
    state: &AppState,
    forum_id: Uuid,
    payload: AddCommentRequest,
) -> AppResult<CommentModel> {
    let txn = state.orm.begin().await?;

    Forums::find_by_id(forum_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Forum post"))?;

    let comment = CommentActive {
        id: Set(Uuid::new_v4()),
        forum_id: Set(forum_id),
        user_id: Set(payload.user_id),
        content: Set(payload.content),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    Forums::update_many()
        .col_expr(
            ForumCol::CommentCount,
            Expr::col(ForumCol::CommentCount).add(1),
        )
        .filter(ForumCol::Id.eq(forum_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    Ok(comment)
}

pub async fn update_comment(
    state: &AppState,
    forum_id: Uuid,
    comment_id: Uuid,
    content: String,
) -> AppResult<CommentModel> {
    let comment = ForumComments::find()
        .filter(CommentCol::Id.eq(comment_id))
        .filter(CommentCol::ForumId.eq(forum_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Comment"))?;

    let mut active: CommentActive = comment.into();
    active.content = Set(content);
    active.updated_at = Set(Utc::now().into());

    Ok(active.update(&state.orm).await?)
}

pub async fn delete_comment(
    state: &AppState,
    forum_id: Uuid,
    comment_id: Uuid,
) -> AppResult<Ack> {
    let txn = state.orm.begin().await?;

    let result = ForumComments::delete_many()
        .filter(CommentCol::Id.eq(comment_id))
        .filter(CommentCol::ForumId.eq(forum_id))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Comment"));
    }

    // Guarded so the counter never goes below zero.
    Forums::update_many()
        .col_expr(
            ForumCol::CommentCount,
            Expr::col(ForumCol::CommentCount).sub(1),
        )
        .filter(ForumCol::Id.eq(forum_id))
        .filter(ForumCol::CommentCount.gt(0))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    Ok(Ack::new("Comment deleted successfully"))
}
