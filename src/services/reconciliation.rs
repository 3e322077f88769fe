/*!
 * Receiving reconciliation
 *
 * Applies a confirmed goods receipt to inventory. Everything here runs on
 * the caller's transaction in a fixed order:
 *
 * 1. add each line's quantity to the location's inventory
 * 2. append a stock adjustment per line
 * 3. run the low-stock check per line
 * 4. re-derive the linked order's status from its full receipt history
 * 5. write one audit entry
 * 6. flip the receipt to CONFIRMED
 *
 * A failure at any step rolls the whole confirmation back.
 */

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    Set,
};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::auth::{AuthContext, PracticeScope};
use crate::entities::{
    goods_receipt, goods_receipt_line, item, order, order_item, stock_adjustment,
    GoodsReceiptStatus, OrderStatus,
};
use crate::errors::ServiceError;
use crate::repositories::audit_log_repository::{self, AuditEntry};
use crate::repositories::inventory_repository::{self, LedgerMovement};
use crate::repositories::stock_adjustment_repository::{self, NewStockAdjustment};
use crate::repositories::scope::{ensure_goods_receipt, ensure_order};
use crate::repositories::{goods_receipt_repository, order_repository, PracticeScoped};
use crate::services::notifications::{LowStockCheck, LowStockNotifier};

pub const AUDIT_ENTITY_GOODS_RECEIPT: &str = "GoodsReceipt";
pub const AUDIT_ACTION_CONFIRMED: &str = "CONFIRMED";

/// Order status implied by cumulative receipts.
///
/// `ordered` holds one entry per order item, `received` the total received
/// per item across every confirmed receipt. Over-receipt covers an item.
/// Returns `None` when there is nothing to decide: no items, or nothing
/// received against any of them yet.
pub fn derive_order_status(
    ordered: &[(Uuid, i32)],
    received: &HashMap<Uuid, i64>,
) -> Option<OrderStatus> {
    if ordered.is_empty() {
        return None;
    }

    let received_for = |item_id: &Uuid| received.get(item_id).copied().unwrap_or(0);

    let all_covered = ordered
        .iter()
        .all(|(item_id, quantity)| received_for(item_id) >= i64::from(*quantity));
    if all_covered {
        return Some(OrderStatus::Received);
    }

    let any_received = ordered.iter().any(|(item_id, _)| received_for(item_id) > 0);
    if any_received {
        Some(OrderStatus::PartiallyReceived)
    } else {
        None
    }
}

/// `"Goods receipt <id>"`, with `" (batch <n>)"` when the line has a batch.
pub fn adjustment_note(receipt_id: Uuid, batch_number: Option<&str>) -> String {
    match batch_number {
        Some(batch) if !batch.is_empty() => format!("Goods receipt {} (batch {})", receipt_id, batch),
        _ => format!("Goods receipt {}", receipt_id),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTransition {
    pub order_id: Uuid,
    pub from: OrderStatus,
    pub to: OrderStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationOutcome {
    pub receipt: goods_receipt::Model,
    pub lines: Vec<goods_receipt_line::Model>,
    pub movements: Vec<LedgerMovement>,
    pub order_transition: Option<OrderTransition>,
    pub total_quantity: i64,
}

/// Runs steps 1-6 for a DRAFT receipt and its non-empty, validated lines.
#[instrument(skip(txn, ctx, receipt, lines, notifier), fields(receipt_id = %receipt.id, line_count = lines.len()))]
pub async fn reconcile_receipt(
    txn: &DatabaseTransaction,
    ctx: &AuthContext,
    receipt: goods_receipt::Model,
    lines: Vec<goods_receipt_line::Model>,
    notifier: &dyn LowStockNotifier,
) -> Result<ReconciliationOutcome, ServiceError> {
    let scope = ctx.scope();
    let now = Utc::now();

    // Steps 1-3, line by line.
    let mut movements = Vec::with_capacity(lines.len());
    for line in &lines {
        let movement = inventory_repository::apply_delta(
            txn,
            scope,
            receipt.location_id,
            line.item_id,
            line.quantity,
        )
        .await?;

        stock_adjustment_repository::record(
            txn,
            scope,
            NewStockAdjustment {
                location_id: receipt.location_id,
                item_id: line.item_id,
                quantity: line.quantity,
                reason: stock_adjustment::REASON_GOODS_RECEIPT.to_string(),
                note: Some(adjustment_note(receipt.id, line.batch_number.as_deref())),
                created_by_id: ctx.user_id,
            },
        )
        .await?;

        notifier
            .check_and_create_low_stock_notification(
                txn,
                LowStockCheck {
                    scope,
                    item_id: line.item_id,
                    location_id: receipt.location_id,
                    new_quantity: movement.new_quantity,
                    reorder_point: movement.reorder_point,
                },
            )
            .await?;

        movements.push(movement);
    }

    // Step 4.
    let order_transition = match receipt.order_id {
        Some(order_id) => recompute_order_status(txn, scope, order_id, receipt.id).await?,
        None => None,
    };

    // Step 5.
    let total_quantity: i64 = lines.iter().map(|l| i64::from(l.quantity)).sum();
    let names = item_names(txn, scope, &lines).await?;
    let line_snapshots: Vec<_> = lines
        .iter()
        .map(|line| {
            json!({
                "item_id": line.item_id,
                "item_name": names.get(&line.item_id),
                "quantity": line.quantity,
                "batch_number": line.batch_number,
                "expiry_date": line.expiry_date,
            })
        })
        .collect();

    audit_log_repository::record(
        txn,
        scope,
        AuditEntry {
            actor_id: ctx.user_id,
            entity_type: AUDIT_ENTITY_GOODS_RECEIPT,
            entity_id: receipt.id,
            action: AUDIT_ACTION_CONFIRMED,
            changes: json!({
                "line_count": lines.len(),
                "total_quantity": total_quantity,
                "lines": line_snapshots,
            }),
            metadata: Some(json!({
                "location_id": receipt.location_id,
                "order_id": receipt.order_id,
                "supplier_id": receipt.supplier_id,
            })),
        },
    )
    .await?;

    // Step 6. Guarded on DRAFT so a concurrent confirmation of the same
    // receipt rolls back instead of applying inventory twice.
    let flipped = goods_receipt::Entity::update_many()
        .col_expr(
            goods_receipt::Column::Status,
            Expr::value(GoodsReceiptStatus::Confirmed),
        )
        .col_expr(goods_receipt::Column::ReceivedAt, Expr::value(Some(now)))
        .col_expr(goods_receipt::Column::UpdatedAt, Expr::value(now))
        .filter(goods_receipt::Column::Id.eq(receipt.id))
        .filter(goods_receipt::Column::PracticeId.eq(scope.practice_id()))
        .filter(goods_receipt::Column::Status.eq(GoodsReceiptStatus::Draft))
        .exec(txn)
        .await?;
    if flipped.rows_affected != 1 {
        return Err(ServiceError::InvalidState(format!(
            "Goods receipt {} is no longer a draft",
            receipt.id
        )));
    }

    let receipt = ensure_goods_receipt(txn, scope, receipt.id).await?;

    info!(
        total_quantity,
        order_transition = ?order_transition,
        "Goods receipt reconciled into inventory"
    );

    Ok(ReconciliationOutcome {
        receipt,
        lines,
        movements,
        order_transition,
        total_quantity,
    })
}

async fn recompute_order_status(
    txn: &DatabaseTransaction,
    scope: PracticeScope,
    order_id: Uuid,
    receipt_id: Uuid,
) -> Result<Option<OrderTransition>, ServiceError> {
    let order = ensure_order(txn, scope, order_id).await?;
    if !order.status.accepts_receipts() {
        debug!(status = %order.status, "Linked order not open for receiving; status left as is");
        return Ok(None);
    }

    let items: Vec<order_item::Model> = order_repository::items(txn, &order).await?;
    let ordered: Vec<(Uuid, i32)> = items.iter().map(|i| (i.item_id, i.quantity)).collect();
    let received =
        goods_receipt_repository::received_quantities(txn, scope, order.id, receipt_id).await?;

    let Some(next) = derive_order_status(&ordered, &received) else {
        return Ok(None);
    };
    if next == order.status || !order.status.can_transition_to(next) {
        return Ok(None);
    }

    let from = order.status;
    let now = Utc::now();
    let mut active: order::ActiveModel = order.into();
    active.status = Set(next);
    active.updated_at = Set(now);
    if next == OrderStatus::Received {
        active.received_at = Set(Some(now));
    }
    active.update(txn).await?;

    Ok(Some(OrderTransition {
        order_id,
        from,
        to: next,
    }))
}

async fn item_names(
    txn: &DatabaseTransaction,
    scope: PracticeScope,
    lines: &[goods_receipt_line::Model],
) -> Result<HashMap<Uuid, String>, ServiceError> {
    let ids: Vec<Uuid> = lines.iter().map(|l| l.item_id).collect();
    let items = item::Entity::find_scoped(scope)
        .filter(item::Column::Id.is_in(ids))
        .all(txn)
        .await?;
    Ok(items.into_iter().map(|i| (i.id, i.name)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ids() -> (Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn no_items_means_no_decision() {
        assert_eq!(derive_order_status(&[], &HashMap::new()), None);
    }

    #[rstest]
    #[case(0, 0, None)]
    #[case(10, 0, Some(OrderStatus::PartiallyReceived))]
    #[case(5, 20, Some(OrderStatus::PartiallyReceived))]
    #[case(10, 20, Some(OrderStatus::Received))]
    #[case(15, 25, Some(OrderStatus::Received))]
    fn derives_from_cumulative_receipts(
        #[case] received_a: i64,
        #[case] received_b: i64,
        #[case] expected: Option<OrderStatus>,
    ) {
        let (a, b) = ids();
        let ordered = vec![(a, 10), (b, 20)];
        let mut received = HashMap::new();
        received.insert(a, received_a);
        received.insert(b, received_b);

        assert_eq!(derive_order_status(&ordered, &received), expected);
    }

    #[test]
    fn items_not_on_the_order_do_not_count() {
        let (a, stray) = ids();
        let mut received = HashMap::new();
        received.insert(stray, 50);

        assert_eq!(derive_order_status(&[(a, 10)], &received), None);
    }

    #[test]
    fn note_mentions_batch_when_present() {
        let id = Uuid::nil();
        assert_eq!(
            adjustment_note(id, Some("B-7")),
            format!("Goods receipt {} (batch B-7)", id)
        );
        assert_eq!(adjustment_note(id, None), format!("Goods receipt {}", id));
        assert_eq!(adjustment_note(id, Some("")), format!("Goods receipt {}", id));
    }
}
