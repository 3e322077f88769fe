pub mod goods_receipts;
pub mod inventory;
pub mod locations;
pub mod orders;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    inventory::InventoryService,
    locations::LocationService,
    notifications::{InAppLowStockNotifier, LowStockNotifier},
    orders::OrderService,
    receiving::GoodsReceiptService,
};

pub use crate::AppState;

/// Services layer used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub goods_receipts: Arc<GoodsReceiptService>,
    pub inventory: Arc<InventoryService>,
    pub locations: Arc<LocationService>,
    pub orders: Arc<OrderService>,
}

impl AppServices {
    /// Wires every service with the in-app low-stock notifier.
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self::with_notifier(db_pool, event_sender, Arc::new(InAppLowStockNotifier))
    }

    pub fn with_notifier(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        notifier: Arc<dyn LowStockNotifier>,
    ) -> Self {
        let goods_receipts = Arc::new(GoodsReceiptService::new(
            db_pool.clone(),
            event_sender.clone(),
            notifier.clone(),
        ));
        let inventory = Arc::new(InventoryService::new(
            db_pool.clone(),
            event_sender.clone(),
            notifier,
        ));
        let locations = Arc::new(LocationService::new(db_pool.clone()));
        let orders = Arc::new(OrderService::new(db_pool, event_sender));

        Self {
            goods_receipts,
            inventory,
            locations,
            orders,
        }
    }
}
