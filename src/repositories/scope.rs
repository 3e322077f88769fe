//! Tenant filtering for every practice-owned table.

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Select};
use uuid::Uuid;

use crate::auth::PracticeScope;
use crate::entities::{
    audit_log, count_session, goods_receipt, item, location, notification, order,
    practice_supplier, stock_adjustment, stock_transfer,
};
use crate::errors::ServiceError;

/// An entity with an owning `practice_id` and a UUID `id`.
pub trait PracticeScoped: EntityTrait {
    fn practice_column() -> Self::Column;
    fn id_column() -> Self::Column;

    /// `SELECT` already restricted to the caller's practice.
    fn find_scoped(scope: PracticeScope) -> Select<Self> {
        Self::find().filter(Self::practice_column().eq(scope.practice_id()))
    }
}

macro_rules! practice_scoped {
    ($($module:ident),+ $(,)?) => {
        $(
            impl PracticeScoped for $module::Entity {
                fn practice_column() -> Self::Column {
                    $module::Column::PracticeId
                }
                fn id_column() -> Self::Column {
                    $module::Column::Id
                }
            }
        )+
    };
}

practice_scoped!(
    audit_log,
    count_session,
    goods_receipt,
    item,
    location,
    notification,
    order,
    practice_supplier,
    stock_adjustment,
    stock_transfer,
);

/// Looks up one row by id within the practice. Rows owned by another
/// practice come back as `None`, exactly like absent ones.
pub async fn find_scoped_by_id<E, C>(
    db: &C,
    scope: PracticeScope,
    id: Uuid,
) -> Result<Option<E::Model>, DbErr>
where
    E: PracticeScoped,
    C: ConnectionTrait,
{
    E::find_scoped(scope)
        .filter(E::id_column().eq(id))
        .one(db)
        .await
}

/// Like [`find_scoped_by_id`] but absent is a `NotFound` naming the entity.
pub async fn require_scoped<E, C>(
    db: &C,
    scope: PracticeScope,
    id: Uuid,
    entity: &str,
) -> Result<E::Model, ServiceError>
where
    E: PracticeScoped,
    C: ConnectionTrait,
{
    find_scoped_by_id::<E, C>(db, scope, id)
        .await?
        .ok_or_else(|| ServiceError::not_found(entity, id))
}

pub async fn ensure_location<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    location_id: Uuid,
) -> Result<location::Model, ServiceError> {
    require_scoped::<location::Entity, C>(db, scope, location_id, "Location").await
}

pub async fn ensure_item<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    item_id: Uuid,
) -> Result<item::Model, ServiceError> {
    require_scoped::<item::Entity, C>(db, scope, item_id, "Item").await
}

pub async fn ensure_supplier<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    supplier_id: Uuid,
) -> Result<practice_supplier::Model, ServiceError> {
    require_scoped::<practice_supplier::Entity, C>(db, scope, supplier_id, "Supplier").await
}

pub async fn ensure_order<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    order_id: Uuid,
) -> Result<order::Model, ServiceError> {
    require_scoped::<order::Entity, C>(db, scope, order_id, "Order").await
}

pub async fn ensure_goods_receipt<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    receipt_id: Uuid,
) -> Result<goods_receipt::Model, ServiceError> {
    require_scoped::<goods_receipt::Entity, C>(db, scope, receipt_id, "Goods receipt").await
}
