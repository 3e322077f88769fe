use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::auth::PracticeScope;
use crate::entities::location_inventory::{self, ActiveModel, Column, Entity, Model};
use crate::errors::ServiceError;

/// Outcome of one ledger write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerMovement {
    pub previous_quantity: i32,
    pub new_quantity: i32,
    /// Reorder point as it stood before the write.
    pub reorder_point: Option<i32>,
}

pub async fn find<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    location_id: Uuid,
    item_id: Uuid,
) -> Result<Option<Model>, DbErr> {
    Entity::find_by_id((location_id, item_id))
        .filter(Column::PracticeId.eq(scope.practice_id()))
        .one(db)
        .await
}

pub async fn list_for_location<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    location_id: Uuid,
) -> Result<Vec<Model>, DbErr> {
    Entity::find()
        .filter(Column::PracticeId.eq(scope.practice_id()))
        .filter(Column::LocationId.eq(location_id))
        .order_by_asc(Column::ItemId)
        .all(db)
        .await
}

/// Adds `delta` to the on-hand quantity of `(location_id, item_id)`.
///
/// An existing row is changed with a single guarded statement,
/// `quantity = quantity + delta WHERE quantity + delta >= 0`, so concurrent
/// writers serialize on the row and never lose an update. A missing row is
/// created with `quantity = delta`. Either way a result below zero is
/// `InsufficientStock` and nothing is written.
pub async fn apply_delta<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    location_id: Uuid,
    item_id: Uuid,
    delta: i32,
) -> Result<LedgerMovement, ServiceError> {
    let now = Utc::now();

    match find(db, scope, location_id, item_id).await? {
        Some(existing) => {
            let result = Entity::update_many()
                .col_expr(Column::Quantity, Expr::col(Column::Quantity).add(delta))
                .col_expr(Column::UpdatedAt, Expr::value(now))
                .filter(Column::LocationId.eq(location_id))
                .filter(Column::ItemId.eq(item_id))
                .filter(Column::PracticeId.eq(scope.practice_id()))
                .filter(Expr::expr(Expr::col(Column::Quantity).add(delta)).gte(0))
                .exec(db)
                .await?;

            if result.rows_affected == 0 {
                return Err(ServiceError::InsufficientStock(format!(
                    "Cannot apply {} to item {} at location {}: only {} on hand",
                    delta, item_id, location_id, existing.quantity
                )));
            }

            let updated = find(db, scope, location_id, item_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Inventory record", item_id))?;

            debug!(
                %location_id,
                %item_id,
                delta,
                new_quantity = updated.quantity,
                "Applied inventory delta"
            );

            Ok(LedgerMovement {
                previous_quantity: updated.quantity - delta,
                new_quantity: updated.quantity,
                reorder_point: existing.reorder_point,
            })
        }
        None => {
            if delta < 0 {
                return Err(ServiceError::InsufficientStock(format!(
                    "Cannot apply {} to item {} at location {}: nothing on hand",
                    delta, item_id, location_id
                )));
            }

            let row = ActiveModel {
                location_id: Set(location_id),
                item_id: Set(item_id),
                practice_id: Set(scope.practice_id()),
                quantity: Set(delta),
                reorder_point: Set(None),
                reorder_quantity: Set(None),
                updated_at: Set(now),
            };
            Entity::insert(row).exec_without_returning(db).await?;

            debug!(%location_id, %item_id, delta, "Created inventory record");

            Ok(LedgerMovement {
                previous_quantity: 0,
                new_quantity: delta,
                reorder_point: None,
            })
        }
    }
}

/// Sets reorder settings, creating an empty row when none exists. Quantity
/// is left as it is.
pub async fn upsert_reorder_settings<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    location_id: Uuid,
    item_id: Uuid,
    reorder_point: Option<i32>,
    reorder_quantity: Option<i32>,
) -> Result<Model, DbErr> {
    let now = Utc::now();

    match find(db, scope, location_id, item_id).await? {
        Some(existing) => {
            let mut active: location_inventory::ActiveModel = existing.into();
            active.reorder_point = Set(reorder_point);
            active.reorder_quantity = Set(reorder_quantity);
            active.updated_at = Set(now);
            active.update(db).await
        }
        None => {
            ActiveModel {
                location_id: Set(location_id),
                item_id: Set(item_id),
                practice_id: Set(scope.practice_id()),
                quantity: Set(0),
                reorder_point: Set(reorder_point),
                reorder_quantity: Set(reorder_quantity),
                updated_at: Set(now),
            }
            .insert(db)
            .await
        }
    }
}
