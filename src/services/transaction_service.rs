use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_activity,
    dto::transactions::{CreateTransactionRequest, UpdateTransactionRequest},
    entity::transactions::{
        ActiveModel as TransactionActive, Column as TrxCol, Entity as Transactions,
        Model as TransactionModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{CallerIdentity, RequestMeta},
    response::{Ack, Paginated},
    routes::transactions::TransactionListQuery,
    services::voucher_service,
    state::AppState,
};

const PAYMENT_METHODS: &[&str] = &["cash", "credit_card", "debit_card", "e_wallet", "bank_transfer"];
const PAYMENT_STATUSES: &[&str] = &["pending", "paid", "failed", "refunded"];
const STATUSES: &[&str] = &["pending", "processing", "completed", "cancelled"];

pub async fn list_transactions(
    state: &AppState,
    query: TransactionListQuery,
) -> AppResult<Paginated<TransactionModel>> {
    let (page, limit, offset) = query.params.normalize(10);

    let mut condition = Condition::all();
    if let Some(user_id) = query.user_id {
        condition = condition.add(TrxCol::UserId.eq(user_id));
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(TrxCol::Status.eq(status.clone()));
    }
    if let Some(payment_status) = query.payment_status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(TrxCol::PaymentStatus.eq(payment_status.clone()));
    }

    let finder = Transactions::find()
        .filter(condition)
        .order_by_desc(TrxCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    Ok(Paginated::new(total, page, limit, items))
}

pub async fn get_transaction(state: &AppState, id: Uuid) -> AppResult<TransactionModel> {
    Transactions::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Transaction"))
}

pub async fn get_transaction_by_number(
    state: &AppState,
    number: &str,
) -> AppResult<TransactionModel> {
    Transactions::find()
        .filter(TrxCol::TransactionNumber.eq(number))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Transaction"))
}

/// Creates a sale record. Voucher redemption, sequence reservation and
/// the insert all run on one database transaction: either every side
/// effect commits or none do.
pub async fn create_transaction(
    state: &AppState,
    caller: &CallerIdentity,
    meta: &RequestMeta,
    payload: CreateTransactionRequest,
) -> AppResult<TransactionModel> {
    validate_payload(&payload)?;

    let voucher_code = payload
        .voucher_code
        .as_deref()
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty());

    let txn = state.orm.begin().await?;

    let mut voucher_discount = 0;
    if let Some(code) = voucher_code.as_deref() {
        match voucher_service::redeem(&txn, code, payload.subtotal).await? {
            Ok(discount) => voucher_discount = discount,
            // Invalid vouchers degrade to zero discount instead of
            // rejecting the sale.
            Err(reason) => {
                tracing::debug!(code, reason = reason.message(), "voucher not applied");
            }
        }
    }

    let total = compute_total(
        payload.subtotal,
        payload.discount_amount,
        voucher_discount,
        payload.tax,
    );

    let today = Utc::now().date_naive();
    let sequence = reserve_daily_sequence(&txn, today).await?;
    let transaction_number = format_transaction_number(today, sequence);

    let transaction = TransactionActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(payload.user_id),
        transaction_number: Set(transaction_number),
        items: Set(serde_json::to_value(&payload.items)
            .map_err(|e| AppError::Internal(e.into()))?),
        subtotal: Set(payload.subtotal),
        discount_amount: Set(payload.discount_amount),
        voucher_code: Set(voucher_code),
        voucher_discount: Set(voucher_discount),
        tax: Set(payload.tax),
        total: Set(total),
        payment_method: Set(payload.payment_method.unwrap_or_else(|| "cash".into())),
        payment_status: Set("pending".into()),
        status: Set("pending".into()),
        notes: Set(payload.notes),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    log_activity(
        &state.pool,
        Some(caller),
        meta,
        "create",
        "Transaction",
        Some(transaction.id),
        Some(&format!(
            "Created transaction {}",
            transaction.transaction_number
        )),
        None,
    )
    .await;

    Ok(transaction)
}

pub async fn update_transaction(
    state: &AppState,
    caller: &CallerIdentity,
    meta: &RequestMeta,
    id: Uuid,
    payload: UpdateTransactionRequest,
) -> AppResult<TransactionModel> {
    let existing = Transactions::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Transaction"))?;

    if let Some(status) = payload.status.as_deref() {
        if !STATUSES.contains(&status) {
            return Err(AppError::validation(
                "Invalid transaction status",
                "status",
                "must be one of pending, processing, completed, cancelled",
            ));
        }
    }
    if let Some(payment_status) = payload.payment_status.as_deref() {
        if !PAYMENT_STATUSES.contains(&payment_status) {
            return Err(AppError::validation(
                "Invalid payment status",
                "paymentStatus",
                "must be one of pending, paid, failed, refunded",
            ));
        }
    }

    let mut active: TransactionActive = existing.into();
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(payment_status) = payload.payment_status {
        active.payment_status = Set(payment_status);
    }
    if let Some(notes) = payload.notes {
        active.notes = Set(Some(notes));
    }
    active.updated_at = Set(Utc::now().into());

    let transaction = active.update(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(caller),
        meta,
        "update",
        "Transaction",
        Some(transaction.id),
        Some(&format!(
            "Updated transaction {}",
            transaction.transaction_number
        )),
        None,
    )
    .await;

    Ok(transaction)
}

pub async fn delete_transaction(
    state: &AppState,
    caller: &CallerIdentity,
    meta: &RequestMeta,
    id: Uuid,
) -> AppResult<Ack> {
    let transaction = Transactions::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Transaction"))?;

    let number = transaction.transaction_number.clone();
    Transactions::delete_by_id(id).exec(&state.orm).await?;

    log_activity(
        &state.pool,
        Some(caller),
        meta,
        "delete",
        "Transaction",
        Some(id),
        Some(&format!("Deleted transaction {number}")),
        None,
    )
    .await;

    Ok(Ack::new("Transaction deleted successfully"))
}

/// Total never goes negative, even when a fixed voucher exceeds the
/// subtotal.
pub fn compute_total(subtotal: i64, discount_amount: i64, voucher_discount: i64, tax: i64) -> i64 {
    (subtotal - discount_amount - voucher_discount + tax).max(0)
}

pub fn format_transaction_number(day: NaiveDate, sequence: i64) -> String {
    format!("TRX{}{:04}", day.format("%Y%m%d"), sequence)
}

/// Atomically reserves the next per-day sequence number. The upsert
/// serializes concurrent same-day creations on the counter row, so two
/// requests can never observe the same value.
async fn reserve_daily_sequence<C: ConnectionTrait>(conn: &C, day: NaiveDate) -> AppResult<i64> {
    let stmt = Statement::from_sql_and_values(
        conn.get_database_backend(),
        r#"
        INSERT INTO transaction_counters (day, value) VALUES ($1, 1)
        ON CONFLICT (day) DO UPDATE SET value = transaction_counters.value + 1
        RETURNING value
        "#,
        [day.into()],
    );

    let row = conn
        .query_one(stmt)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("sequence upsert returned no row")))?;

    Ok(row.try_get("", "value")?)
}

fn validate_payload(payload: &CreateTransactionRequest) -> AppResult<()> {
    let mut fields = HashMap::new();

    if payload.items.is_empty() {
        fields.insert("items".to_string(), "must contain at least one item".to_string());
    }
    for (idx, item) in payload.items.iter().enumerate() {
        if item.name.trim().is_empty() {
            fields.insert(format!("items[{idx}].name"), "must not be empty".to_string());
        }
        if item.price < 0 {
            fields.insert(format!("items[{idx}].price"), "must not be negative".to_string());
        }
        if item.quantity <= 0 {
            fields.insert(
                format!("items[{idx}].quantity"),
                "must be greater than zero".to_string(),
            );
        }
    }
    if payload.subtotal < 0 {
        fields.insert("subtotal".to_string(), "must not be negative".to_string());
    }
    if payload.discount_amount < 0 {
        fields.insert("discountAmount".to_string(), "must not be negative".to_string());
    }
    if payload.tax < 0 {
        fields.insert("tax".to_string(), "must not be negative".to_string());
    }
    if let Some(method) = payload.payment_method.as_deref() {
        if !PAYMENT_METHODS.contains(&method) {
            fields.insert(
                "paymentMethod".to_string(),
                "must be one of cash, credit_card, debit_card, e_wallet, bank_transfer".to_string(),
            );
        }
    }

    if !fields.is_empty() {
        return Err(AppError::Validation {
            message: "Invalid transaction payload".to_string(),
            fields,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::transactions::TransactionItem;

    #[test]
    fn total_is_floored_at_zero() {
        assert_eq!(compute_total(100, 50, 80, 0), 0);
        assert_eq!(compute_total(100, 20, 30, 10), 60);
        assert_eq!(compute_total(10_000, 0, 20_000, 0), 0);
    }

    #[test]
    fn transaction_number_format() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(format_transaction_number(day, 1), "TRX202403070001");
        assert_eq!(format_transaction_number(day, 42), "TRX202403070042");
        assert_eq!(format_transaction_number(day, 12345), "TRX2024030712345");
    }

    fn base_request(items: Vec<TransactionItem>) -> CreateTransactionRequest {
        CreateTransactionRequest {
            user_id: Uuid::new_v4(),
            items,
            subtotal: 1000,
            discount_amount: 0,
            voucher_code: None,
            tax: 0,
            payment_method: None,
            notes: None,
        }
    }

    #[test]
    fn empty_items_fail_validation() {
        let err = validate_payload(&base_request(vec![])).unwrap_err();
        match err {
            AppError::Validation { fields, .. } => assert!(fields.contains_key("items")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn bad_quantity_and_method_are_reported_per_field() {
        let mut request = base_request(vec![TransactionItem {
            product_id: Uuid::new_v4(),
            name: "Widget".into(),
            price: 500,
            quantity: 0,
        }]);
        request.payment_method = Some("barter".into());

        let err = validate_payload(&request).unwrap_err();
        match err {
            AppError::Validation { fields, .. } => {
                assert!(fields.contains_key("items[0].quantity"));
                assert!(fields.contains_key("paymentMethod"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_payload_passes() {
        let request = base_request(vec![TransactionItem {
            product_id: Uuid::new_v4(),
            name: "Widget".into(),
            price: 500,
            quantity: 2,
        }]);
        assert!(validate_payload(&request).is_ok());
    }
}
