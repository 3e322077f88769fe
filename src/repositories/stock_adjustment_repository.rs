use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use super::{fetch_page, Page, PracticeScoped};
use crate::auth::PracticeScope;
use crate::entities::{stock_adjustment, stock_transfer};

#[derive(Debug, Clone)]
pub struct NewStockAdjustment {
    pub location_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub reason: String,
    pub note: Option<String>,
    pub created_by_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewStockTransfer {
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub note: Option<String>,
    pub created_by_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct AdjustmentFilter {
    pub location_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
}

/// Appends one adjustment row. There is deliberately no update or delete
/// counterpart.
pub async fn record<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    new: NewStockAdjustment,
) -> Result<stock_adjustment::Model, DbErr> {
    stock_adjustment::ActiveModel {
        id: Set(Uuid::new_v4()),
        practice_id: Set(scope.practice_id()),
        location_id: Set(new.location_id),
        item_id: Set(new.item_id),
        quantity: Set(new.quantity),
        reason: Set(new.reason),
        note: Set(new.note),
        created_by_id: Set(new.created_by_id),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
}

pub async fn record_transfer<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    new: NewStockTransfer,
) -> Result<stock_transfer::Model, DbErr> {
    stock_transfer::ActiveModel {
        id: Set(Uuid::new_v4()),
        practice_id: Set(scope.practice_id()),
        from_location_id: Set(new.from_location_id),
        to_location_id: Set(new.to_location_id),
        item_id: Set(new.item_id),
        quantity: Set(new.quantity),
        note: Set(new.note),
        created_by_id: Set(new.created_by_id),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
}

/// Newest first.
pub async fn list<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    filter: AdjustmentFilter,
    page: u64,
    limit: u64,
) -> Result<Page<stock_adjustment::Model>, DbErr> {
    let mut select = stock_adjustment::Entity::find_scoped(scope);
    if let Some(location_id) = filter.location_id {
        select = select.filter(stock_adjustment::Column::LocationId.eq(location_id));
    }
    if let Some(item_id) = filter.item_id {
        select = select.filter(stock_adjustment::Column::ItemId.eq(item_id));
    }
    let select = select.order_by_desc(stock_adjustment::Column::CreatedAt);

    fetch_page(db, select, page, limit).await
}
