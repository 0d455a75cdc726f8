use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "forums")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    // Denormalized counters, adjusted with atomic column expressions.
    pub view_count: i32,
    pub like_count: i32,
    pub comment_count: i32,
    pub status: String,
    pub is_pinned: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::forum_comments::Entity")]
    ForumComments,
}

impl Related<super::forum_comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ForumComments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
