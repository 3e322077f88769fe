use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder,
};
use std::collections::HashMap;
use uuid::Uuid;

use super::{fetch_page, Page, PracticeScoped};
use crate::auth::PracticeScope;
use crate::entities::{goods_receipt, goods_receipt_line, GoodsReceiptStatus};

#[derive(Debug, Clone, Default)]
pub struct ReceiptFilter {
    pub status: Option<GoodsReceiptStatus>,
    pub order_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

pub async fn list<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    filter: ReceiptFilter,
    page: u64,
    limit: u64,
) -> Result<Page<goods_receipt::Model>, DbErr> {
    let mut select = goods_receipt::Entity::find_scoped(scope);
    if let Some(status) = filter.status {
        select = select.filter(goods_receipt::Column::Status.eq(status));
    }
    if let Some(order_id) = filter.order_id {
        select = select.filter(goods_receipt::Column::OrderId.eq(order_id));
    }
    if let Some(location_id) = filter.location_id {
        select = select.filter(goods_receipt::Column::LocationId.eq(location_id));
    }
    let select = select.order_by_desc(goods_receipt::Column::CreatedAt);

    fetch_page(db, select, page, limit).await
}

/// Lines of a receipt that was already loaded through a scoped lookup, in
/// the order they were first scanned.
pub async fn lines<C: ConnectionTrait>(
    db: &C,
    receipt: &goods_receipt::Model,
) -> Result<Vec<goods_receipt_line::Model>, DbErr> {
    receipt
        .find_related(goods_receipt_line::Entity)
        .order_by_asc(goods_receipt_line::Column::CreatedAt)
        .order_by_asc(goods_receipt_line::Column::Id)
        .all(db)
        .await
}

pub async fn find_line_for_item<C: ConnectionTrait>(
    db: &C,
    receipt: &goods_receipt::Model,
    item_id: Uuid,
) -> Result<Option<goods_receipt_line::Model>, DbErr> {
    receipt
        .find_related(goods_receipt_line::Entity)
        .filter(goods_receipt_line::Column::ItemId.eq(item_id))
        .one(db)
        .await
}

/// A line together with its receipt, only when the receipt belongs to the
/// practice.
pub async fn find_line_scoped<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    line_id: Uuid,
) -> Result<Option<(goods_receipt_line::Model, goods_receipt::Model)>, DbErr> {
    let found = goods_receipt_line::Entity::find_by_id(line_id)
        .find_also_related(goods_receipt::Entity)
        .filter(goods_receipt::Column::PracticeId.eq(scope.practice_id()))
        .one(db)
        .await?;

    Ok(found.and_then(|(line, receipt)| receipt.map(|r| (line, r))))
}

pub async fn delete_with_lines<C: ConnectionTrait>(
    db: &C,
    receipt: goods_receipt::Model,
) -> Result<(), DbErr> {
    goods_receipt_line::Entity::delete_many()
        .filter(goods_receipt_line::Column::ReceiptId.eq(receipt.id))
        .exec(db)
        .await?;
    receipt.delete(db).await?;
    Ok(())
}

/// Total received per item over every CONFIRMED receipt of `order_id`, plus
/// `including_receipt` whatever its status.
pub async fn received_quantities<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    order_id: Uuid,
    including_receipt: Uuid,
) -> Result<HashMap<Uuid, i64>, DbErr> {
    let lines = goods_receipt_line::Entity::find()
        .inner_join(goods_receipt::Entity)
        .filter(goods_receipt::Column::PracticeId.eq(scope.practice_id()))
        .filter(goods_receipt::Column::OrderId.eq(order_id))
        .filter(
            Condition::any()
                .add(goods_receipt::Column::Status.eq(GoodsReceiptStatus::Confirmed))
                .add(goods_receipt::Column::Id.eq(including_receipt)),
        )
        .all(db)
        .await?;

    let mut totals: HashMap<Uuid, i64> = HashMap::new();
    for line in lines {
        *totals.entry(line.item_id).or_insert(0) += i64::from(line.quantity);
    }
    Ok(totals)
}
