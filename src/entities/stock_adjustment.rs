use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const REASON_GOODS_RECEIPT: &str = "Goods Receipt";
pub const REASON_MANUAL: &str = "Manual Adjustment";
pub const REASON_TRANSFER_OUT: &str = "Transfer Out";
pub const REASON_TRANSFER_IN: &str = "Transfer In";

/// Append-only record of a signed stock change. Rows are never updated or
/// deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_adjustments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub practice_id: Uuid,
    pub location_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub reason: String,
    pub note: Option<String>,
    pub created_by_id: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
