use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const KIND_LOW_STOCK: &str = "LOW_STOCK";

/// In-app notification shown to practice users.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub practice_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub item_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
