use sea_orm::entity::prelude::*;
use serde::Serialize;

// Append-only; no update or delete path exists for this table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "activity_logs")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    // Display-name snapshot; "System" when no caller was authenticated.
    #[serde(rename = "user")]
    pub user_name: String,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<Uuid>,
    pub target: Option<String>,
    pub details: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
