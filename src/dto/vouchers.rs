use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVoucherRequest {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub discount_type: Option<String>,
    pub discount_value: i64,
    #[serde(default)]
    pub min_purchase: i64,
    pub max_discount: Option<i64>,
    pub usage_limit: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVoucherRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub discount_type: Option<String>,
    pub discount_value: Option<i64>,
    pub min_purchase: Option<i64>,
    pub max_discount: Option<i64>,
    pub usage_limit: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
}
