use axum::{Json, Router, extract::State, routing::get};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    entity::{Events, Forums, News, Products, Transactions, Users},
    error::AppResult,
    middleware::auth::CallerIdentity,
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_users: i64,
    pub total_products: i64,
    pub total_news: i64,
    pub total_forums: i64,
    pub total_events: i64,
    pub total_transactions: i64,
    pub paid_transactions: i64,
    pub total_revenue: i64,
    pub average_transaction: i64,
    pub transactions_today: i64,
    pub revenue_today: i64,
    pub new_users_today: i64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/summary", get(summary))
}

#[utoipa::path(get, path = "/v1/dashboard/summary", tag = "Dashboard")]
pub async fn summary(
    State(state): State<AppState>,
    _caller: CallerIdentity,
) -> AppResult<Json<DashboardSummary>> {
    let total_users = Users::find().count(&state.orm).await? as i64;
    let total_products = Products::find().count(&state.orm).await? as i64;
    let total_news = News::find().count(&state.orm).await? as i64;
    let total_forums = Forums::find().count(&state.orm).await? as i64;
    let total_events = Events::find().count(&state.orm).await? as i64;
    let total_transactions = Transactions::find().count(&state.orm).await? as i64;

    // Revenue only counts settled payments.
    let (total_revenue, paid_transactions): (i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(total), 0)::BIGINT, COUNT(*) FROM transactions \
         WHERE payment_status = 'paid'",
    )
    .fetch_one(&state.pool)
    .await?;

    let (revenue_today, transactions_today): (i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(total), 0)::BIGINT, COUNT(*) FROM transactions \
         WHERE created_at >= date_trunc('day', now())",
    )
    .fetch_one(&state.pool)
    .await?;

    let (new_users_today,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM users WHERE created_at >= date_trunc('day', now())",
    )
    .fetch_one(&state.pool)
    .await?;

    let average_transaction = if paid_transactions > 0 {
        total_revenue / paid_transactions
    } else {
        0
    };

    Ok(Json(DashboardSummary {
        total_users,
        total_products,
        total_news,
        total_forums,
        total_events,
        total_transactions,
        paid_transactions,
        total_revenue,
        average_transaction,
        transactions_today,
        revenue_today,
        new_users_today,
    }))
}
