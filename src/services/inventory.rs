use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use sea_orm::{DatabaseConnection, DatabaseTransaction};

use crate::auth::{AuthContext, PracticeScope, Role};
use crate::db::with_transaction;
use crate::entities::{location_inventory, stock_adjustment, stock_transfer};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::repositories::audit_log_repository::{self, AuditEntry};
use crate::repositories::inventory_repository::{self, LedgerMovement};
use crate::repositories::scope::{ensure_item, ensure_location};
use crate::repositories::stock_adjustment_repository::{
    self, AdjustmentFilter, NewStockAdjustment, NewStockTransfer,
};
use crate::repositories::Page;
use crate::services::notifications::{LowStockCheck, LowStockNotifier};

fn validate_non_zero(value: i32) -> Result<(), ValidationError> {
    if value == 0 {
        let mut err = ValidationError::new("non_zero");
        err.message = Some("delta must not be zero".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdjustStockInput {
    pub location_id: Uuid,
    pub item_id: Uuid,
    #[validate(custom = "validate_non_zero", range(min = -1_000_000, max = 1_000_000))]
    pub delta: i32,
    #[validate(length(min = 1, max = 100))]
    pub reason: Option<String>,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ReorderSettingsInput {
    #[validate(range(min = 0))]
    pub reorder_point: Option<i32>,
    #[validate(range(min = 1))]
    pub reorder_quantity: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TransferStockInput {
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
    pub item_id: Uuid,
    #[validate(range(min = 1, max = 1_000_000))]
    pub quantity: i32,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAdjustmentsQuery {
    pub location_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockAdjustmentResult {
    pub adjustment: stock_adjustment::Model,
    pub previous_quantity: i32,
    pub new_quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockTransferResult {
    pub transfer: stock_transfer::Model,
    pub source_quantity: i32,
    pub destination_quantity: i32,
}

/// Ledger write plus its adjustment row and low-stock check, on `txn`.
async fn move_stock(
    txn: &DatabaseTransaction,
    scope: PracticeScope,
    notifier: &dyn LowStockNotifier,
    adjustment: NewStockAdjustment,
) -> Result<(stock_adjustment::Model, LedgerMovement), ServiceError> {
    let movement = inventory_repository::apply_delta(
        txn,
        scope,
        adjustment.location_id,
        adjustment.item_id,
        adjustment.quantity,
    )
    .await?;

    let location_id = adjustment.location_id;
    let item_id = adjustment.item_id;
    let row = stock_adjustment_repository::record(txn, scope, adjustment).await?;

    notifier
        .check_and_create_low_stock_notification(
            txn,
            LowStockCheck {
                scope,
                item_id,
                location_id,
                new_quantity: movement.new_quantity,
                reorder_point: movement.reorder_point,
            },
        )
        .await?;

    Ok((row, movement))
}

/// Manual stock operations on the location inventory ledger.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<Arc<EventSender>>,
    notifier: Arc<dyn LowStockNotifier>,
}

impl InventoryService {
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

    pub async fn get_location_inventory(
        &self,
        ctx: &AuthContext,
        item_id: Uuid,
        location_id: Uuid,
    ) -> Result<location_inventory::Model, ServiceError> {
        let scope = ctx.require(Role::Viewer)?;

        inventory_repository::find(self.db.as_ref(), scope, location_id, item_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Inventory for item {} at location {} not found",
                    item_id, location_id
                ))
            })
    }

    pub async fn list_location_inventory(
        &self,
        ctx: &AuthContext,
        location_id: Uuid,
    ) -> Result<Vec<location_inventory::Model>, ServiceError> {
        let scope = ctx.require(Role::Viewer)?;
        let db = self.db.as_ref();

        ensure_location(db, scope, location_id).await?;
        Ok(inventory_repository::list_for_location(db, scope, location_id).await?)
    }

    #[instrument(skip(self, ctx, input), fields(practice_id = %ctx.practice_id, location_id = %input.location_id, item_id = %input.item_id, delta = input.delta))]
    pub async fn adjust_stock(
        &self,
        ctx: &AuthContext,
        input: AdjustStockInput,
    ) -> Result<StockAdjustmentResult, ServiceError> {
        let scope = ctx.require(Role::Staff)?;
        input.validate()?;

        let user_id = ctx.user_id;
        let notifier = self.notifier.clone();

        let result = with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                ensure_location(txn, scope, input.location_id).await?;
                ensure_item(txn, scope, input.item_id).await?;

                let reason = input
                    .reason
                    .unwrap_or_else(|| stock_adjustment::REASON_MANUAL.to_string());
                let (adjustment, movement) = move_stock(
                    txn,
                    scope,
                    notifier.as_ref(),
                    NewStockAdjustment {
                        location_id: input.location_id,
                        item_id: input.item_id,
                        quantity: input.delta,
                        reason: reason.clone(),
                        note: input.note,
                        created_by_id: user_id,
                    },
                )
                .await?;

                audit_log_repository::record(
                    txn,
                    scope,
                    AuditEntry {
                        actor_id: user_id,
                        entity_type: "StockAdjustment",
                        entity_id: adjustment.id,
                        action: "ADJUSTED",
                        changes: json!({
                            "location_id": input.location_id,
                            "item_id": input.item_id,
                            "delta": input.delta,
                            "previous_quantity": movement.previous_quantity,
                            "new_quantity": movement.new_quantity,
                            "reason": reason,
                        }),
                        metadata: None,
                    },
                )
                .await?;

                Ok(StockAdjustmentResult {
                    adjustment,
                    previous_quantity: movement.previous_quantity,
                    new_quantity: movement.new_quantity,
                })
            })
        })
        .await?;

        metrics::counter!("procurement.stock_adjustments.applied", 1);
        info!(new_quantity = result.new_quantity, "Stock adjusted");

        self.publish(Event::StockAdjusted {
            practice_id: scope.practice_id(),
            location_id: result.adjustment.location_id,
            item_id: result.adjustment.item_id,
            delta: result.adjustment.quantity,
            new_quantity: result.new_quantity,
        })
        .await;

        Ok(result)
    }

    /// Sets reorder point and quantity for one item at one location,
    /// creating an empty inventory row when needed.
    #[instrument(skip(self, ctx, input), fields(practice_id = %ctx.practice_id))]
    pub async fn set_reorder_settings(
        &self,
        ctx: &AuthContext,
        location_id: Uuid,
        item_id: Uuid,
        input: ReorderSettingsInput,
    ) -> Result<location_inventory::Model, ServiceError> {
        let scope = ctx.require(Role::Staff)?;
        input.validate()?;

        with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                ensure_location(txn, scope, location_id).await?;
                ensure_item(txn, scope, item_id).await?;

                Ok(inventory_repository::upsert_reorder_settings(
                    txn,
                    scope,
                    location_id,
                    item_id,
                    input.reorder_point,
                    input.reorder_quantity,
                )
                .await?)
            })
        })
        .await
    }

    #[instrument(skip(self, ctx, input), fields(practice_id = %ctx.practice_id, item_id = %input.item_id, quantity = input.quantity))]
    pub async fn transfer_stock(
        &self,
        ctx: &AuthContext,
        input: TransferStockInput,
    ) -> Result<StockTransferResult, ServiceError> {
        let scope = ctx.require(Role::Staff)?;
        input.validate()?;
        if input.from_location_id == input.to_location_id {
            return Err(ServiceError::ValidationError(
                "Source and destination locations must differ".to_string(),
            ));
        }

        let user_id = ctx.user_id;
        let notifier = self.notifier.clone();

        let result = with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                ensure_location(txn, scope, input.from_location_id).await?;
                ensure_location(txn, scope, input.to_location_id).await?;
                ensure_item(txn, scope, input.item_id).await?;

                let (_, source) = move_stock(
                    txn,
                    scope,
                    notifier.as_ref(),
                    NewStockAdjustment {
                        location_id: input.from_location_id,
                        item_id: input.item_id,
                        quantity: -input.quantity,
                        reason: stock_adjustment::REASON_TRANSFER_OUT.to_string(),
                        note: input.note.clone(),
                        created_by_id: user_id,
                    },
                )
                .await?;

                let (_, destination) = move_stock(
                    txn,
                    scope,
                    notifier.as_ref(),
                    NewStockAdjustment {
                        location_id: input.to_location_id,
                        item_id: input.item_id,
                        quantity: input.quantity,
                        reason: stock_adjustment::REASON_TRANSFER_IN.to_string(),
                        note: input.note.clone(),
                        created_by_id: user_id,
                    },
                )
                .await?;

                let transfer = stock_adjustment_repository::record_transfer(
                    txn,
                    scope,
                    NewStockTransfer {
                        from_location_id: input.from_location_id,
                        to_location_id: input.to_location_id,
                        item_id: input.item_id,
                        quantity: input.quantity,
                        note: input.note,
                        created_by_id: user_id,
                    },
                )
                .await?;

                audit_log_repository::record(
                    txn,
                    scope,
                    AuditEntry {
                        actor_id: user_id,
                        entity_type: "StockTransfer",
                        entity_id: transfer.id,
                        action: "TRANSFERRED",
                        changes: json!({
                            "item_id": transfer.item_id,
                            "quantity": transfer.quantity,
                            "from_location_id": transfer.from_location_id,
                            "to_location_id": transfer.to_location_id,
                            "source_quantity": source.new_quantity,
                            "destination_quantity": destination.new_quantity,
                        }),
                        metadata: None,
                    },
                )
                .await?;

                Ok(StockTransferResult {
                    transfer,
                    source_quantity: source.new_quantity,
                    destination_quantity: destination.new_quantity,
                })
            })
        })
        .await?;

        metrics::counter!("procurement.stock_transfers.applied", 1);
        self.publish(Event::StockTransferred {
            practice_id: scope.practice_id(),
            transfer_id: result.transfer.id,
            item_id: result.transfer.item_id,
            quantity: result.transfer.quantity,
        })
        .await;

        Ok(result)
    }

    pub async fn list_stock_adjustments(
        &self,
        ctx: &AuthContext,
        query: ListAdjustmentsQuery,
        limit: u64,
    ) -> Result<Page<stock_adjustment::Model>, ServiceError> {
        let scope = ctx.require(Role::Viewer)?;
        let filter = AdjustmentFilter {
            location_id: query.location_id,
            item_id: query.item_id,
        };

        Ok(stock_adjustment_repository::list(
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

    #[test]
    fn zero_delta_is_rejected() {
        let input = AdjustStockInput {
            location_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            delta: 0,
            reason: None,
            note: None,
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("delta"));
    }

    #[test]
    fn reorder_settings_bounds() {
        let ok = ReorderSettingsInput {
            reorder_point: Some(0),
            reorder_quantity: Some(1),
        };
        assert!(ok.validate().is_ok());

        let bad_point = ReorderSettingsInput {
            reorder_point: Some(-1),
            reorder_quantity: None,
        };
        assert!(bad_point.validate().is_err());

        let bad_quantity = ReorderSettingsInput {
            reorder_point: None,
            reorder_quantity: Some(0),
        };
        assert!(bad_quantity.validate().is_err());
    }
}
