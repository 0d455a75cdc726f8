use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::transactions::{CreateTransactionRequest, UpdateTransactionRequest},
    entity::transactions::Model as TransactionModel,
    error::AppResult,
    middleware::auth::{CallerIdentity, RequestMeta},
    response::{Ack, Paginated},
    routes::params::ListParams,
    services::transaction_service,
    state::AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListQuery {
    #[serde(flatten)]
    pub params: ListParams,
    pub user_id: Option<Uuid>,
    pub status: Option<String>,
    pub payment_status: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route("/number/{number}", get(get_transaction_by_number))
        .route(
            "/{id}",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
}

#[utoipa::path(get, path = "/v1/transactions", tag = "Transactions")]
pub async fn list_transactions(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<TransactionListQuery>,
) -> AppResult<Json<Paginated<TransactionModel>>> {
    Ok(Json(
        transaction_service::list_transactions(&state, query).await?,
    ))
}

#[utoipa::path(post, path = "/v1/transactions", tag = "Transactions")]
pub async fn create_transaction(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Json(payload): Json<CreateTransactionRequest>,
) -> AppResult<(StatusCode, Json<TransactionModel>)> {
    let sale = transaction_service::create_transaction(&state, &caller, &meta, payload).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

#[utoipa::path(get, path = "/v1/transactions/{id}", tag = "Transactions")]
pub async fn get_transaction(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TransactionModel>> {
    Ok(Json(transaction_service::get_transaction(&state, id).await?))
}

#[utoipa::path(get, path = "/v1/transactions/number/{number}", tag = "Transactions")]
pub async fn get_transaction_by_number(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(number): Path<String>,
) -> AppResult<Json<TransactionModel>> {
    Ok(Json(
        transaction_service::get_transaction_by_number(&state, &number).await?,
    ))
}

#[utoipa::path(put, path = "/v1/transactions/{id}", tag = "Transactions")]
pub async fn update_transaction(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> AppResult<Json<TransactionModel>> {
    Ok(Json(
        transaction_service::update_transaction(&state, &caller, &meta, id, payload).await?,
    ))
}

#[utoipa::path(delete, path = "/v1/transactions/{id}", tag = "Transactions")]
pub async fn delete_transaction(
    State(state): State<AppState>,
    caller: CallerIdentity,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Ack>> {
    Ok(Json(
        transaction_service::delete_transaction(&state, &caller, &meta, id).await?,
    ))
}
