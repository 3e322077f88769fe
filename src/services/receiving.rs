use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, ModelTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthContext, Role};
use crate::db::with_transaction;
use crate::entities::{goods_receipt, goods_receipt_line, GoodsReceiptStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::repositories::goods_receipt_repository::{self, ReceiptFilter};
use crate::repositories::scope::{
    ensure_goods_receipt, ensure_item, ensure_location, ensure_order, ensure_supplier,
};
use crate::repositories::Page;
use crate::services::notifications::LowStockNotifier;
use crate::services::reconciliation::{self, OrderTransition};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGoodsReceiptInput {
    pub location_id: Uuid,
    pub order_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddReceiptLineInput {
    pub item_id: Uuid,
    #[validate(range(min = 1, max = 1_000_000))]
    pub quantity: i32,
    #[validate(length(max = 100))]
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    #[validate(length(max = 64))]
    pub scanned_gtin: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Partial update of a draft line. Absent fields are left unchanged; an
/// explicit `null` clears an optional field (`Some(None)`).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateReceiptLineInput {
    #[validate(range(min = 1, max = 1_000_000))]
    pub quantity: Option<i32>,
    #[validate(length(max = 100))]
    #[serde(default, with = "crate::services::double_option")]
    pub batch_number: Option<Option<String>>,
    #[serde(default, with = "crate::services::double_option")]
    pub expiry_date: Option<Option<NaiveDate>>,
    #[validate(length(max = 64))]
    #[serde(default, with = "crate::services::double_option")]
    pub scanned_gtin: Option<Option<String>>,
    #[validate(length(max = 2000))]
    #[serde(default, with = "crate::services::double_option")]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListGoodsReceiptsQuery {
    pub status: Option<GoodsReceiptStatus>,
    pub order_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// What to do with a scanned line when the receipt may already hold the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineMergeDecision {
    /// Fold into the existing line: quantities add, each optional field
    /// takes the incoming value when one is given.
    Merge {
        line_id: Uuid,
        quantity: i32,
        batch_number: Option<String>,
        expiry_date: Option<NaiveDate>,
        scanned_gtin: Option<String>,
        notes: Option<String>,
    },
    Insert,
}

/// Re-scanning an item during one receiving session accumulates onto its
/// line instead of replacing it. A sum that does not fit the line's
/// quantity column is rejected.
pub fn decide_line_merge(
    existing: Option<&goods_receipt_line::Model>,
    incoming: &AddReceiptLineInput,
) -> Result<LineMergeDecision, ServiceError> {
    let Some(line) = existing else {
        return Ok(LineMergeDecision::Insert);
    };
    let quantity = line.quantity.checked_add(incoming.quantity).ok_or_else(|| {
        ServiceError::ValidationError(format!(
            "Line {} cannot take {} more units: quantity {} is at its limit",
            line.id, incoming.quantity, line.quantity
        ))
    })?;

    Ok(LineMergeDecision::Merge {
        line_id: line.id,
        quantity,
        batch_number: incoming
            .batch_number
            .clone()
            .or_else(|| line.batch_number.clone()),
        expiry_date: incoming.expiry_date.or(line.expiry_date),
        scanned_gtin: incoming
            .scanned_gtin
            .clone()
            .or_else(|| line.scanned_gtin.clone()),
        notes: incoming.notes.clone().or_else(|| line.notes.clone()),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct GoodsReceiptWithLines {
    #[serde(flatten)]
    pub receipt: goods_receipt::Model,
    pub lines: Vec<goods_receipt_line::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmedReceipt {
    pub receipt: goods_receipt::Model,
    pub lines: Vec<goods_receipt_line::Model>,
    pub total_quantity: i64,
    /// Status change of the linked order. `None` when there is no linked
    /// order or its status stayed as it was.
    pub order_transition: Option<OrderTransition>,
}

fn require_draft(receipt: &goods_receipt::Model, action: &str) -> Result<(), ServiceError> {
    if receipt.is_draft() {
        Ok(())
    } else {
        Err(ServiceError::InvalidState(format!(
            "Cannot {} goods receipt {} in status {}",
            action, receipt.id, receipt.status
        )))
    }
}

/// Goods receipt lifecycle: draft editing, confirmation, cancellation.
#[derive(Clone)]
pub struct GoodsReceiptService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<Arc<EventSender>>,
    notifier: Arc<dyn LowStockNotifier>,
}

impl GoodsReceiptService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Option<Arc<EventSender>>,
        notifier: Arc<dyn LowStockNotifier>,
    ) -> Self {
        Self {
            db,
            event_sender,
            notifier,
        }
    }

    async fn publish(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(event).await;
        }
    }

    #[instrument(skip(self, ctx, input), fields(practice_id = %ctx.practice_id, location_id = %input.location_id))]
    pub async fn create_goods_receipt(
        &self,
        ctx: &AuthContext,
        input: CreateGoodsReceiptInput,
    ) -> Result<goods_receipt::Model, ServiceError> {
        let scope = ctx.require(Role::Staff)?;
        input.validate()?;

        let db = self.db.as_ref();
        ensure_location(db, scope, input.location_id).await?;

        let mut supplier_id = None;
        if let Some(order_id) = input.order_id {
            let order = ensure_order(db, scope, order_id).await?;
            supplier_id = Some(order.practice_supplier_id);
        }
        if let Some(id) = input.supplier_id {
            ensure_supplier(db, scope, id).await?;
            supplier_id = Some(id);
        }

        let now = Utc::now();
        let receipt = goods_receipt::ActiveModel {
            id: Set(Uuid::new_v4()),
            practice_id: Set(scope.practice_id()),
            location_id: Set(input.location_id),
            order_id: Set(input.order_id),
            supplier_id: Set(supplier_id),
            status: Set(GoodsReceiptStatus::Draft),
            notes: Set(input.notes),
            received_at: Set(None),
            created_by_id: Set(ctx.user_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(receipt_id = %receipt.id, "Goods receipt created");
        self.publish(Event::GoodsReceiptCreated {
            practice_id: scope.practice_id(),
            receipt_id: receipt.id,
        })
        .await;

        Ok(receipt)
    }

    #[instrument(skip(self, ctx, input), fields(practice_id = %ctx.practice_id, item_id = %input.item_id))]
    pub async fn add_receipt_line(
        &self,
        ctx: &AuthContext,
        receipt_id: Uuid,
        input: AddReceiptLineInput,
    ) -> Result<goods_receipt_line::Model, ServiceError> {
        let scope = ctx.require(Role::Staff)?;
        input.validate()?;

        with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let receipt = ensure_goods_receipt(txn, scope, receipt_id).await?;
                require_draft(&receipt, "add lines to")?;
                ensure_item(txn, scope, input.item_id).await?;

                let existing =
                    goods_receipt_repository::find_line_for_item(txn, &receipt, input.item_id)
                        .await?;
                let now = Utc::now();

                let line = match decide_line_merge(existing.as_ref(), &input)? {
                    LineMergeDecision::Merge {
                        line_id,
                        quantity,
                        batch_number,
                        expiry_date,
                        scanned_gtin,
                        notes,
                    } => {
                        goods_receipt_line::ActiveModel {
                            id: Set(line_id),
                            quantity: Set(quantity),
                            batch_number: Set(batch_number),
                            expiry_date: Set(expiry_date),
                            scanned_gtin: Set(scanned_gtin),
                            notes: Set(notes),
                            updated_at: Set(now),
                            ..Default::default()
                        }
                        .update(txn)
                        .await?
                    }
                    LineMergeDecision::Insert => {
                        goods_receipt_line::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            receipt_id: Set(receipt.id),
                            item_id: Set(input.item_id),
                            quantity: Set(input.quantity),
                            batch_number: Set(input.batch_number),
                            expiry_date: Set(input.expiry_date),
                            scanned_gtin: Set(input.scanned_gtin),
                            notes: Set(input.notes),
                            created_at: Set(now),
                            updated_at: Set(now),
                        }
                        .insert(txn)
                        .await?
                    }
                };

                Ok(line)
            })
        })
        .await
    }

    #[instrument(skip(self, ctx, input), fields(practice_id = %ctx.practice_id))]
    pub async fn update_receipt_line(
        &self,
        ctx: &AuthContext,
        line_id: Uuid,
        input: UpdateReceiptLineInput,
    ) -> Result<goods_receipt_line::Model, ServiceError> {
        let scope = ctx.require(Role::Staff)?;
        input.validate()?;

        with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let (line, receipt) = goods_receipt_repository::find_line_scoped(txn, scope, line_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Goods receipt line", line_id))?;
                require_draft(&receipt, "edit lines of")?;

                let mut active: goods_receipt_line::ActiveModel = line.into();
                if let Some(quantity) = input.quantity {
                    active.quantity = Set(quantity);
                }
                if let Some(batch_number) = input.batch_number {
                    active.batch_number = Set(batch_number);
                }
                if let Some(expiry_date) = input.expiry_date {
                    active.expiry_date = Set(expiry_date);
                }
                if let Some(scanned_gtin) = input.scanned_gtin {
                    active.scanned_gtin = Set(scanned_gtin);
                }
                if let Some(notes) = input.notes {
                    active.notes = Set(notes);
                }
                active.updated_at = Set(Utc::now());

                Ok(active.update(txn).await?)
            })
        })
        .await
    }

    #[instrument(skip(self, ctx), fields(practice_id = %ctx.practice_id))]
    pub async fn remove_receipt_line(
        &self,
        ctx: &AuthContext,
        line_id: Uuid,
    ) -> Result<(), ServiceError> {
        let scope = ctx.require(Role::Staff)?;

        with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let (line, receipt) = goods_receipt_repository::find_line_scoped(txn, scope, line_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Goods receipt line", line_id))?;
                require_draft(&receipt, "remove lines from")?;

                line.delete(txn).await?;
                Ok(())
            })
        })
        .await
    }

    /// Confirms a draft receipt and reconciles it into inventory in a single
    /// transaction. Events go out only after the commit.
    #[instrument(skip(self, ctx), fields(practice_id = %ctx.practice_id, user_id = %ctx.user_id))]
    pub async fn confirm_goods_receipt(
        &self,
        ctx: &AuthContext,
        receipt_id: Uuid,
    ) -> Result<ConfirmedReceipt, ServiceError> {
        let scope = ctx.require(Role::Staff)?;
        let start = std::time::Instant::now();
        let notifier = self.notifier.clone();
        let txn_ctx = ctx.clone();

        let outcome = with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let receipt = ensure_goods_receipt(txn, scope, receipt_id).await?;
                require_draft(&receipt, "confirm")?;

                let lines = goods_receipt_repository::lines(txn, &receipt).await?;
                if lines.is_empty() {
                    return Err(ServiceError::ValidationError(format!(
                        "Goods receipt {} has no lines",
                        receipt_id
                    )));
                }
                if let Some(bad) = lines.iter().find(|l| l.quantity <= 0) {
                    return Err(ServiceError::ValidationError(format!(
                        "Line {} has non-positive quantity {}",
                        bad.id, bad.quantity
                    )));
                }

                reconciliation::reconcile_receipt(txn, &txn_ctx, receipt, lines, notifier.as_ref())
                    .await
            })
        })
        .await?;

        metrics::counter!("procurement.goods_receipts.confirmed", 1);
        metrics::histogram!("procurement.goods_receipts.confirm_duration", start.elapsed());
        info!(
            receipt_id = %outcome.receipt.id,
            total_quantity = outcome.total_quantity,
            "Goods receipt confirmed"
        );

        self.publish(Event::GoodsReceiptConfirmed {
            practice_id: scope.practice_id(),
            receipt_id: outcome.receipt.id,
            order_id: outcome.receipt.order_id,
            line_count: outcome.lines.len(),
            total_quantity: outcome.total_quantity,
        })
        .await;
        if let Some(OrderTransition { order_id, from, to }) = outcome.order_transition {
            self.publish(Event::OrderStatusChanged {
                practice_id: scope.practice_id(),
                order_id,
                old_status: from,
                new_status: to,
            })
            .await;
        }

        Ok(ConfirmedReceipt {
            receipt: outcome.receipt,
            lines: outcome.lines,
            total_quantity: outcome.total_quantity,
            order_transition: outcome.order_transition,
        })
    }

    #[instrument(skip(self, ctx), fields(practice_id = %ctx.practice_id))]
    pub async fn cancel_goods_receipt(
        &self,
        ctx: &AuthContext,
        receipt_id: Uuid,
    ) -> Result<goods_receipt::Model, ServiceError> {
        let scope = ctx.require(Role::Staff)?;

        let receipt = with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let receipt = ensure_goods_receipt(txn, scope, receipt_id).await?;
                require_draft(&receipt, "cancel")?;

                let mut active: goods_receipt::ActiveModel = receipt.into();
                active.status = Set(GoodsReceiptStatus::Cancelled);
                active.updated_at = Set(Utc::now());
                Ok(active.update(txn).await?)
            })
        })
        .await?;

        self.publish(Event::GoodsReceiptCancelled {
            practice_id: scope.practice_id(),
            receipt_id,
        })
        .await;
        Ok(receipt)
    }

    /// Deletes a DRAFT or CANCELLED receipt with its lines. A confirmed
    /// receipt backs inventory and its audit trail, so it stays.
    #[instrument(skip(self, ctx), fields(practice_id = %ctx.practice_id))]
    pub async fn delete_goods_receipt(
        &self,
        ctx: &AuthContext,
        receipt_id: Uuid,
    ) -> Result<(), ServiceError> {
        let scope = ctx.require(Role::Staff)?;

        with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let receipt = ensure_goods_receipt(txn, scope, receipt_id).await?;
                if receipt.status == GoodsReceiptStatus::Confirmed {
                    return Err(ServiceError::BusinessRuleViolation(format!(
                        "Cannot delete confirmed goods receipt {}",
                        receipt_id
                    )));
                }
                goods_receipt_repository::delete_with_lines(txn, receipt).await?;
                Ok(())
            })
        })
        .await?;

        info!(%receipt_id, "Goods receipt deleted");
        Ok(())
    }

    pub async fn find_goods_receipt(
        &self,
        ctx: &AuthContext,
        receipt_id: Uuid,
    ) -> Result<GoodsReceiptWithLines, ServiceError> {
        let scope = ctx.require(Role::Viewer)?;
        let db = self.db.as_ref();

        let receipt = ensure_goods_receipt(db, scope, receipt_id).await?;
        let lines = goods_receipt_repository::lines(db, &receipt).await?;
        Ok(GoodsReceiptWithLines { receipt, lines })
    }

    pub async fn list_goods_receipts(
        &self,
        ctx: &AuthContext,
        query: ListGoodsReceiptsQuery,
        limit: u64,
    ) -> Result<Page<goods_receipt::Model>, ServiceError> {
        let scope = ctx.require(Role::Viewer)?;
        let filter = ReceiptFilter {
            status: query.status,
            order_id: query.order_id,
            location_id: query.location_id,
        };

        Ok(goods_receipt_repository::list(
            self.db.as_ref(),
            scope,
            filter,
            query.page.unwrap_or(1),
            limit,
        )
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn incoming(quantity: i32) -> AddReceiptLineInput {
        AddReceiptLineInput {
            item_id: Uuid::new_v4(),
            quantity,
            batch_number: None,
            expiry_date: None,
            scanned_gtin: None,
            notes: None,
        }
    }

    fn existing_line(quantity: i32) -> goods_receipt_line::Model {
        let now = Utc::now();
        goods_receipt_line::Model {
            id: Uuid::new_v4(),
            receipt_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            quantity,
            batch_number: Some("OLD".into()),
            expiry_date: NaiveDate::from_ymd_opt(2030, 1, 1),
            scanned_gtin: Some("0001".into()),
            notes: Some("first scan".into()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn first_scan_inserts() {
        assert_eq!(
            decide_line_merge(None, &incoming(3)).unwrap(),
            LineMergeDecision::Insert
        );
    }

    #[test]
    fn rescan_adds_quantity_and_keeps_old_fields_when_new_are_absent() {
        let line = existing_line(4);
        let decision = decide_line_merge(Some(&line), &incoming(3)).unwrap();

        assert_eq!(
            decision,
            LineMergeDecision::Merge {
                line_id: line.id,
                quantity: 7,
                batch_number: Some("OLD".into()),
                expiry_date: NaiveDate::from_ymd_opt(2030, 1, 1),
                scanned_gtin: Some("0001".into()),
                notes: Some("first scan".into()),
            }
        );
    }

    #[test]
    fn rescan_prefers_new_values_when_given() {
        let line = existing_line(1);
        let mut input = incoming(2);
        input.batch_number = Some("NEW".into());
        input.expiry_date = NaiveDate::from_ymd_opt(2031, 6, 30);
        input.notes = Some("second scan".into());

        match decide_line_merge(Some(&line), &input).unwrap() {
            LineMergeDecision::Merge {
                quantity,
                batch_number,
                expiry_date,
                scanned_gtin,
                notes,
                ..
            } => {
                assert_eq!(quantity, 3);
                assert_eq!(batch_number.as_deref(), Some("NEW"));
                assert_eq!(expiry_date, NaiveDate::from_ymd_opt(2031, 6, 30));
                assert_eq!(scanned_gtin.as_deref(), Some("0001"));
                assert_eq!(notes.as_deref(), Some("second scan"));
            }
            other => panic!("expected merge, got {:?}", other),
        }
    }

    #[test]
    fn rescan_past_the_quantity_limit_is_rejected() {
        let line = existing_line(i32::MAX - 10);
        let input = incoming(1_000_000);
        assert!(input.validate().is_ok());

        assert_matches!(
            decide_line_merge(Some(&line), &input),
            Err(ServiceError::ValidationError(msg)) if msg.contains(&line.id.to_string())
        );
    }

    #[test]
    fn rescan_up_to_the_limit_still_merges() {
        let line = existing_line(i32::MAX - 10);
        assert_matches!(
            decide_line_merge(Some(&line), &incoming(10)),
            Ok(LineMergeDecision::Merge { quantity, .. }) if quantity == i32::MAX
        );
    }

    #[test]
    fn line_patch_tells_null_from_absent() {
        let untouched: UpdateReceiptLineInput = serde_json::from_str(r#"{"quantity":2}"#).unwrap();
        assert_eq!(untouched.batch_number, None);
        assert_eq!(untouched.expiry_date, None);

        let cleared: UpdateReceiptLineInput =
            serde_json::from_str(r#"{"batch_number":null,"expiry_date":null}"#).unwrap();
        assert_eq!(cleared.batch_number, Some(None));
        assert_eq!(cleared.expiry_date, Some(None));
        assert_eq!(cleared.notes, None);

        let set: UpdateReceiptLineInput =
            serde_json::from_str(r#"{"batch_number":"LOT-9","expiry_date":"2031-02-28"}"#).unwrap();
        assert_eq!(set.batch_number, Some(Some("LOT-9".to_string())));
        assert_eq!(set.expiry_date, Some(NaiveDate::from_ymd_opt(2031, 2, 28)));
    }

    #[test]
    fn line_patch_still_checks_lengths() {
        let patch = UpdateReceiptLineInput {
            batch_number: Some(Some("x".repeat(101))),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
        assert!(UpdateReceiptLineInput {
            batch_number: Some(None),
            ..Default::default()
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn line_input_rejects_zero_quantity() {
        assert!(incoming(0).validate().is_err());
        assert!(incoming(1).validate().is_ok());
    }
}
