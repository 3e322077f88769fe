use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

use super::{fetch_page, Page, PracticeScoped};
use crate::auth::PracticeScope;
use crate::entities::{goods_receipt, order, order_item, GoodsReceiptStatus, OrderStatus};

pub async fn list<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    status: Option<OrderStatus>,
    page: u64,
    limit: u64,
) -> Result<Page<order::Model>, DbErr> {
    let mut select = order::Entity::find_scoped(scope);
    if let Some(status) = status {
        select = select.filter(order::Column::Status.eq(status));
    }
    let select = select.order_by_desc(order::Column::CreatedAt);

    fetch_page(db, select, page, limit).await
}

/// Items of an order that was already loaded through a scoped lookup.
pub async fn items<C: ConnectionTrait>(
    db: &C,
    order: &order::Model,
) -> Result<Vec<order_item::Model>, DbErr> {
    order
        .find_related(order_item::Entity)
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await
}

pub async fn find_item<C: ConnectionTrait>(
    db: &C,
    order: &order::Model,
    order_item_id: Uuid,
) -> Result<Option<order_item::Model>, DbErr> {
    order
        .find_related(order_item::Entity)
        .filter(order_item::Column::Id.eq(order_item_id))
        .one(db)
        .await
}

pub async fn find_item_for_product<C: ConnectionTrait>(
    db: &C,
    order: &order::Model,
    item_id: Uuid,
) -> Result<Option<order_item::Model>, DbErr> {
    order
        .find_related(order_item::Entity)
        .filter(order_item::Column::ItemId.eq(item_id))
        .one(db)
        .await
}

pub async fn delete_items<C: ConnectionTrait>(db: &C, order: &order::Model) -> Result<u64, DbErr> {
    let result = order_item::Entity::delete_many()
        .filter(order_item::Column::OrderId.eq(order.id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn count_confirmed_receipts<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    order_id: Uuid,
) -> Result<u64, DbErr> {
    goods_receipt::Entity::find_scoped(scope)
        .filter(goods_receipt::Column::OrderId.eq(order_id))
        .filter(goods_receipt::Column::Status.eq(GoodsReceiptStatus::Confirmed))
        .count(db)
        .await
}

/// Clears `order_id` on the order's draft and cancelled receipts.
pub async fn detach_unconfirmed_receipts<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    order_id: Uuid,
) -> Result<u64, DbErr> {
    let result = goods_receipt::Entity::update_many()
        .col_expr(goods_receipt::Column::OrderId, Expr::value(Option::<Uuid>::None))
        .filter(goods_receipt::Column::PracticeId.eq(scope.practice_id()))
        .filter(goods_receipt::Column::OrderId.eq(order_id))
        .filter(goods_receipt::Column::Status.ne(GoodsReceiptStatus::Confirmed))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
