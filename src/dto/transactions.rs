use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Line item snapshot stored verbatim on the transaction; not a live
/// reference to a product row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub user_id: Uuid,
    pub items: Vec<TransactionItem>,
    pub subtotal: i64,
    #[serde(default)]
    pub discount_amount: i64,
    pub voucher_code: Option<String>,
    #[serde(default)]
    pub tax: i64,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

/// Pricing fields are immutable after creation; only these survive an
/// update.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub notes: Option<String>,
}
