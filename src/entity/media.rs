use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "media")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub filename: String,
    pub original_name: Option<String>,
    pub mime_type: Option<String>,
    pub size: Option<i64>,
    pub url: String,
    #[sea_orm(column_name = "media_type")]
    #[serde(rename = "type")]
    pub media_type: String,
    pub user_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
