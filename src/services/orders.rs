use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, ModelTrait, Set};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::auth::{AuthContext, Role};
use crate::db::with_transaction;
use crate::entities::{order, order_item, OrderStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::repositories::order_repository;
use crate::repositories::scope::{ensure_item, ensure_order, ensure_supplier};
use crate::repositories::Page;

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        let mut err = ValidationError::new("unit_price");
        err.message = Some("unit_price must not be negative".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderItemInput {
    pub item_id: Uuid,
    #[validate(range(min = 1, max = 1_000_000))]
    pub quantity: i32,
    #[serde(default)]
    #[validate(custom = "validate_price")]
    pub unit_price: Decimal,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderInput {
    pub practice_supplier_id: Uuid,
    #[validate(length(max = 100))]
    pub reference: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[serde(default)]
    #[validate]
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateOrderItemInput {
    #[validate(range(min = 1, max = 1_000_000))]
    pub quantity: Option<i32>,
    #[validate(custom = "validate_price")]
    pub unit_price: Option<Decimal>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Sums quantities of repeated items; the first occurrence keeps its price
/// and notes. Order of first appearance is kept. Fails when a sum does not
/// fit an order item's quantity.
pub fn merge_duplicate_items(
    items: Vec<OrderItemInput>,
) -> Result<Vec<OrderItemInput>, ServiceError> {
    let mut position: BTreeMap<Uuid, usize> = BTreeMap::new();
    let mut merged: Vec<OrderItemInput> = Vec::with_capacity(items.len());

    for item in items {
        match position.get(&item.item_id) {
            Some(&idx) => {
                let target = &mut merged[idx];
                target.quantity = target.quantity.checked_add(item.quantity).ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "Total quantity of item {} is too large",
                        item.item_id
                    ))
                })?;
            }
            None => {
                position.insert(item.item_id, merged.len());
                merged.push(item);
            }
        }
    }
    Ok(merged)
}

fn require_status(order: &order::Model, allowed: &[OrderStatus], action: &str) -> Result<(), ServiceError> {
    if allowed.contains(&order.status) {
        Ok(())
    } else {
        Err(ServiceError::InvalidState(format!(
            "Cannot {} order {} in status {}",
            action, order.id, order.status
        )))
    }
}

fn new_item(order_id: Uuid, input: OrderItemInput) -> order_item::ActiveModel {
    order_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        item_id: Set(input.item_id),
        quantity: Set(input.quantity),
        unit_price: Set(input.unit_price),
        notes: Set(input.notes),
    }
}

/// Purchase order lifecycle outside of receiving.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    async fn publish(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(event).await;
        }
    }

    #[instrument(skip(self, ctx, input), fields(practice_id = %ctx.practice_id, supplier_id = %input.practice_supplier_id))]
    pub async fn create_order(
        &self,
        ctx: &AuthContext,
        input: CreateOrderInput,
    ) -> Result<OrderWithItems, ServiceError> {
        let scope = ctx.require(Role::Staff)?;
        input.validate()?;
        let user_id = ctx.user_id;

        let created = with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                ensure_supplier(txn, scope, input.practice_supplier_id).await?;
                let items = merge_duplicate_items(input.items)?;
                for item in &items {
                    ensure_item(txn, scope, item.item_id).await?;
                }

                let now = Utc::now();
                let order = order::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    practice_id: Set(scope.practice_id()),
                    practice_supplier_id: Set(input.practice_supplier_id),
                    status: Set(OrderStatus::Draft),
                    reference: Set(input.reference),
                    notes: Set(input.notes),
                    created_by_id: Set(user_id),
                    sent_at: Set(None),
                    received_at: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(txn)
                .await?;

                let mut rows = Vec::with_capacity(items.len());
                for item in items {
                    rows.push(new_item(order.id, item).insert(txn).await?);
                }

                Ok(OrderWithItems { order, items: rows })
            })
        })
        .await?;

        info!(order_id = %created.order.id, items = created.items.len(), "Order created");
        self.publish(Event::OrderCreated {
            practice_id: scope.practice_id(),
            order_id: created.order.id,
        })
        .await;
        Ok(created)
    }

    #[instrument(skip(self, ctx, input), fields(practice_id = %ctx.practice_id, item_id = %input.item_id))]
    pub async fn add_order_item(
        &self,
        ctx: &AuthContext,
        order_id: Uuid,
        input: OrderItemInput,
    ) -> Result<order_item::Model, ServiceError> {
        let scope = ctx.require(Role::Staff)?;
        input.validate()?;

        with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let order = ensure_order(txn, scope, order_id).await?;
                require_status(&order, &[OrderStatus::Draft], "add items to")?;
                ensure_item(txn, scope, input.item_id).await?;

                if order_repository::find_item_for_product(txn, &order, input.item_id)
                    .await?
                    .is_some()
                {
                    return Err(ServiceError::ValidationError(format!(
                        "Item {} is already on order {}",
                        input.item_id, order_id
                    )));
                }

                let row = new_item(order.id, input).insert(txn).await?;
                touch(txn, order).await?;
                Ok(row)
            })
        })
        .await
    }

    #[instrument(skip(self, ctx, input), fields(practice_id = %ctx.practice_id))]
    pub async fn update_order_item(
        &self,
        ctx: &AuthContext,
        order_id: Uuid,
        order_item_id: Uuid,
        input: UpdateOrderItemInput,
    ) -> Result<order_item::Model, ServiceError> {
        let scope = ctx.require(Role::Staff)?;
        input.validate()?;

        with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let order = ensure_order(txn, scope, order_id).await?;
                require_status(&order, &[OrderStatus::Draft], "edit items of")?;
                let row = order_repository::find_item(txn, &order, order_item_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Order item", order_item_id))?;

                let mut active: order_item::ActiveModel = row.into();
                if let Some(quantity) = input.quantity {
                    active.quantity = Set(quantity);
                }
                if let Some(price) = input.unit_price {
                    active.unit_price = Set(price);
                }
                if let Some(notes) = input.notes {
                    active.notes = Set(Some(notes));
                }
                let updated = active.update(txn).await?;
                touch(txn, order).await?;
                Ok(updated)
            })
        })
        .await
    }

    #[instrument(skip(self, ctx), fields(practice_id = %ctx.practice_id))]
    pub async fn remove_order_item(
        &self,
        ctx: &AuthContext,
        order_id: Uuid,
        order_item_id: Uuid,
    ) -> Result<(), ServiceError> {
        let scope = ctx.require(Role::Staff)?;

        with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let order = ensure_order(txn, scope, order_id).await?;
                require_status(&order, &[OrderStatus::Draft], "remove items from")?;
                let row = order_repository::find_item(txn, &order, order_item_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Order item", order_item_id))?;

                row.delete(txn).await?;
                touch(txn, order).await?;
                Ok(())
            })
        })
        .await
    }

    /// DRAFT with at least one item becomes SENT.
    #[instrument(skip(self, ctx), fields(practice_id = %ctx.practice_id))]
    pub async fn send_order(&self, ctx: &AuthContext, order_id: Uuid) -> Result<order::Model, ServiceError> {
        let scope = ctx.require(Role::Staff)?;

        let order = with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let order = ensure_order(txn, scope, order_id).await?;
                require_status(&order, &[OrderStatus::Draft], "send")?;
                if order_repository::items(txn, &order).await?.is_empty() {
                    return Err(ServiceError::ValidationError(format!(
                        "Order {} has no items",
                        order_id
                    )));
                }
                transition(txn, order, OrderStatus::Sent).await
            })
        })
        .await?;

        self.publish_transition(scope.practice_id(), order_id, OrderStatus::Draft, &order)
            .await;
        Ok(order)
    }

    #[instrument(skip(self, ctx), fields(practice_id = %ctx.practice_id))]
    pub async fn cancel_order(&self, ctx: &AuthContext, order_id: Uuid) -> Result<order::Model, ServiceError> {
        let scope = ctx.require(Role::Staff)?;

        let (from, order) = with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let order = ensure_order(txn, scope, order_id).await?;
                require_status(&order, &[OrderStatus::Draft, OrderStatus::Sent], "cancel")?;
                let from = order.status;
                Ok((from, transition(txn, order, OrderStatus::Cancelled).await?))
            })
        })
        .await?;

        self.publish_transition(scope.practice_id(), order_id, from, &order)
            .await;
        Ok(order)
    }

    /// Short-closes a partially received order.
    #[instrument(skip(self, ctx), fields(practice_id = %ctx.practice_id))]
    pub async fn close_order(&self, ctx: &AuthContext, order_id: Uuid) -> Result<order::Model, ServiceError> {
        let scope = ctx.require(Role::Staff)?;

        let order = with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let order = ensure_order(txn, scope, order_id).await?;
                require_status(&order, &[OrderStatus::PartiallyReceived], "close")?;
                transition(txn, order, OrderStatus::Received).await
            })
        })
        .await?;

        self.publish_transition(
            scope.practice_id(),
            order_id,
            OrderStatus::PartiallyReceived,
            &order,
        )
        .await;
        Ok(order)
    }

    /// Deletes an order that has never been received against. Unconfirmed
    /// receipts pointing at it are detached rather than deleted.
    #[instrument(skip(self, ctx), fields(practice_id = %ctx.practice_id))]
    pub async fn delete_order(&self, ctx: &AuthContext, order_id: Uuid) -> Result<(), ServiceError> {
        let scope = ctx.require(Role::Staff)?;

        with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let order = ensure_order(txn, scope, order_id).await?;
                if order.status == OrderStatus::Received {
                    return Err(ServiceError::BusinessRuleViolation(format!(
                        "Cannot delete received order {}",
                        order_id
                    )));
                }
                let confirmed = order_repository::count_confirmed_receipts(txn, scope, order_id).await?;
                if confirmed > 0 {
                    return Err(ServiceError::BusinessRuleViolation(format!(
                        "Cannot delete order {}: it has {} confirmed goods receipt(s)",
                        order_id, confirmed
                    )));
                }

                order_repository::detach_unconfirmed_receipts(txn, scope, order_id).await?;
                order_repository::delete_items(txn, &order).await?;
                order.delete(txn).await?;
                Ok(())
            })
        })
        .await?;

        info!(%order_id, "Order deleted");
        Ok(())
    }

    pub async fn find_order(&self, ctx: &AuthContext, order_id: Uuid) -> Result<OrderWithItems, ServiceError> {
        let scope = ctx.require(Role::Viewer)?;
        let db = self.db.as_ref();

        let order = ensure_order(db, scope, order_id).await?;
        let items = order_repository::items(db, &order).await?;
        Ok(OrderWithItems { order, items })
    }

    pub async fn list_orders(
        &self,
        ctx: &AuthContext,
        query: ListOrdersQuery,
        limit: u64,
    ) -> Result<Page<order::Model>, ServiceError> {
        let scope = ctx.require(Role::Viewer)?;
        Ok(order_repository::list(
            self.db.as_ref(),
            scope,
            query.status,
            query.page.unwrap_or(1),
            limit,
        )
        .await?)
    }

    async fn publish_transition(
        &self,
        practice_id: Uuid,
        order_id: Uuid,
        from: OrderStatus,
        order: &order::Model,
    ) {
        self.publish(Event::OrderStatusChanged {
            practice_id,
            order_id,
            old_status: from,
            new_status: order.status,
        })
        .await;
    }
}

async fn transition(
    txn: &sea_orm::DatabaseTransaction,
    order: order::Model,
    next: OrderStatus,
) -> Result<order::Model, ServiceError> {
    if !order.status.can_transition_to(next) {
        return Err(ServiceError::InvalidState(format!(
            "Order {} cannot move from {} to {}",
            order.id, order.status, next
        )));
    }

    let now = Utc::now();
    let mut active: order::ActiveModel = order.into();
    active.status = Set(next);
    active.updated_at = Set(now);
    match next {
        OrderStatus::Sent => active.sent_at = Set(Some(now)),
        OrderStatus::Received => active.received_at = Set(Some(now)),
        _ => {}
    }
    Ok(active.update(txn).await?)
}

async fn touch(txn: &sea_orm::DatabaseTransaction, order: order::Model) -> Result<(), ServiceError> {
    let mut active: order::ActiveModel = order.into();
    active.updated_at = Set(Utc::now());
    active.update(txn).await?;
    Ok(())
}
