use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseTransaction, PaginatorTrait, QueryFilter, Set};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::auth::PracticeScope;
use crate::entities::{item, location, notification};
use crate::errors::ServiceError;
use crate::repositories::scope::find_scoped_by_id;
use crate::repositories::PracticeScoped;

/// Everything a low-stock check needs about one ledger write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LowStockCheck {
    pub scope: PracticeScope,
    pub item_id: Uuid,
    pub location_id: Uuid,
    pub new_quantity: i32,
    /// Reorder point read before the write.
    pub reorder_point: Option<i32>,
}

impl LowStockCheck {
    pub fn practice_id(&self) -> Uuid {
        self.scope.practice_id()
    }

    pub fn is_low(&self) -> bool {
        matches!(self.reorder_point, Some(point) if self.new_quantity <= point)
    }
}

/// Invoked once per ledger write on the caller's transaction. An error
/// aborts that transaction.
#[async_trait]
pub trait LowStockNotifier: Send + Sync {
    async fn check_and_create_low_stock_notification(
        &self,
        txn: &DatabaseTransaction,
        check: LowStockCheck,
    ) -> Result<(), ServiceError>;
}

/// Writes an in-app LOW_STOCK notification unless an unread one already
/// exists for the same item and location.
#[derive(Debug, Default, Clone, Copy)]
pub struct InAppLowStockNotifier;

#[async_trait]
impl LowStockNotifier for InAppLowStockNotifier {
    #[instrument(skip(self, txn), fields(item_id = %check.item_id, location_id = %check.location_id))]
    async fn check_and_create_low_stock_notification(
        &self,
        txn: &DatabaseTransaction,
        check: LowStockCheck,
    ) -> Result<(), ServiceError> {
        let Some(reorder_point) = check.reorder_point else {
            return Ok(());
        };
        if !check.is_low() {
            return Ok(());
        }

        let open = notification::Entity::find_scoped(check.scope)
            .filter(notification::Column::Kind.eq(notification::KIND_LOW_STOCK))
            .filter(notification::Column::ItemId.eq(check.item_id))
            .filter(notification::Column::LocationId.eq(check.location_id))
            .filter(notification::Column::Read.eq(false))
            .count(txn)
            .await?;
        if open > 0 {
            debug!("Unread low-stock notification already exists");
            return Ok(());
        }

        let item_name = find_scoped_by_id::<item::Entity, _>(txn, check.scope, check.item_id)
            .await?
            .map(|i| i.name)
            .unwrap_or_else(|| check.item_id.to_string());
        let location_name =
            find_scoped_by_id::<location::Entity, _>(txn, check.scope, check.location_id)
                .await?
                .map(|l| l.name)
                .unwrap_or_else(|| check.location_id.to_string());

        notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            practice_id: Set(check.practice_id()),
            kind: Set(notification::KIND_LOW_STOCK.to_string()),
            title: Set(format!("Low stock: {}", item_name)),
            message: Set(format!(
                "{} at {} is at {} (reorder point {})",
                item_name, location_name, check.new_quantity, reorder_point
            )),
            item_id: Set(Some(check.item_id)),
            location_id: Set(Some(check.location_id)),
            read: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(txn)
        .await?;

        metrics::counter!("procurement.notifications.low_stock", 1);
        debug!(new_quantity = check.new_quantity, reorder_point, "Created low-stock notification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthContext, Role};

    fn check(new_quantity: i32, reorder_point: Option<i32>) -> LowStockCheck {
        let ctx = AuthContext::new(Uuid::new_v4(), Uuid::new_v4(), Role::Staff);
        LowStockCheck {
            scope: ctx.scope(),
            item_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            new_quantity,
            reorder_point,
        }
    }

    #[test]
    fn low_when_at_or_below_reorder_point() {
        assert!(check(5, Some(5)).is_low());
        assert!(check(0, Some(2)).is_low());
        assert!(!check(6, Some(5)).is_low());
        assert!(!check(0, None).is_low());
    }
}
