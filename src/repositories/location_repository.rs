use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::{fetch_page, Page, PracticeScoped};
use crate::auth::PracticeScope;
use crate::entities::{
    count_session, goods_receipt, location, location_inventory, stock_adjustment, stock_transfer,
};

/// How many rows still reference a location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocationUsage {
    pub inventory_records: u64,
    pub stock_adjustments: u64,
    pub stock_transfers: u64,
    pub goods_receipts: u64,
    pub count_sessions: u64,
    pub child_locations: u64,
}

impl LocationUsage {
    pub fn is_unused(&self) -> bool {
        *self == LocationUsage::default()
    }

    /// Human readable list of the non-zero counts, e.g.
    /// `"3 inventory records, 1 child location"`.
    pub fn describe(&self) -> String {
        let parts = [
            (self.inventory_records, "inventory record", "inventory records"),
            (self.stock_adjustments, "stock adjustment", "stock adjustments"),
            (self.stock_transfers, "stock transfer", "stock transfers"),
            (self.goods_receipts, "goods receipt", "goods receipts"),
            (self.count_sessions, "count session", "count sessions"),
            (self.child_locations, "child location", "child locations"),
        ];

        parts
            .iter()
            .filter(|(n, _, _)| *n > 0)
            .map(|(n, one, many)| format!("{} {}", n, if *n == 1 { one } else { many }))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub async fn list<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    page: u64,
    limit: u64,
) -> Result<Page<location::Model>, DbErr> {
    let select = location::Entity::find_scoped(scope).order_by_asc(location::Column::Name);
    fetch_page(db, select, page, limit).await
}

/// Ids of every location below `root` in the tree, excluding `root`.
pub async fn descendant_ids<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    root: Uuid,
) -> Result<HashSet<Uuid>, DbErr> {
    let all = location::Entity::find_scoped(scope).all(db).await?;

    let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for loc in &all {
        if let Some(parent) = loc.parent_id {
            children.entry(parent).or_default().push(loc.id);
        }
    }

    let mut found = HashSet::new();
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        if let Some(kids) = children.get(&current) {
            for kid in kids {
                if found.insert(*kid) {
                    stack.push(*kid);
                }
            }
        }
    }
    found.remove(&root);
    Ok(found)
}

pub async fn usage<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    location_id: Uuid,
) -> Result<LocationUsage, DbErr> {
    let practice_id = scope.practice_id();

    let inventory_records = location_inventory::Entity::find()
        .filter(location_inventory::Column::PracticeId.eq(practice_id))
        .filter(location_inventory::Column::LocationId.eq(location_id))
        .count(db)
        .await?;

    let stock_adjustments = stock_adjustment::Entity::find_scoped(scope)
        .filter(stock_adjustment::Column::LocationId.eq(location_id))
        .count(db)
        .await?;

    let stock_transfers = stock_transfer::Entity::find_scoped(scope)
        .filter(
            Condition::any()
                .add(stock_transfer::Column::FromLocationId.eq(location_id))
                .add(stock_transfer::Column::ToLocationId.eq(location_id)),
        )
        .count(db)
        .await?;

    let goods_receipts = goods_receipt::Entity::find_scoped(scope)
        .filter(goods_receipt::Column::LocationId.eq(location_id))
        .count(db)
        .await?;

    let count_sessions = count_session::Entity::find_scoped(scope)
        .filter(count_session::Column::LocationId.eq(location_id))
        .count(db)
        .await?;

    let child_locations = location::Entity::find_scoped(scope)
        .filter(location::Column::ParentId.eq(location_id))
        .count(db)
        .await?;

    Ok(LocationUsage {
        inventory_records,
        stock_adjustments,
        stock_transfers,
        goods_receipts,
        count_sessions,
        child_locations,
    })
}
