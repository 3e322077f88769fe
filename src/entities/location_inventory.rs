use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// On-hand quantity of one item at one location.
///
/// The table carries `CHECK (quantity >= 0)`; the ledger's guarded update is
/// the application-side half of the same invariant.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "location_inventory")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub location_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub item_id: Uuid,
    pub practice_id: Uuid,
    pub quantity: i32,
    pub reorder_point: Option<i32>,
    pub reorder_quantity: Option<i32>,
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// True when a reorder point is configured and stock is at or below it.
    pub fn is_low_stock(&self) -> bool {
        matches!(self.reorder_point, Some(point) if self.quantity <= point)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
