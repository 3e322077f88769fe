use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::OrderStatus;

/// Handle for publishing domain events onto the in-process channel.
#[derive(Clone, Debug)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event after a commit. A failure is logged and swallowed since
    /// the committed state stands regardless.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "Dropping event after commit");
        }
    }
}

/// Events published once the owning transaction has committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    GoodsReceiptCreated {
        practice_id: Uuid,
        receipt_id: Uuid,
    },
    GoodsReceiptConfirmed {
        practice_id: Uuid,
        receipt_id: Uuid,
        order_id: Option<Uuid>,
        line_count: usize,
        total_quantity: i64,
    },
    GoodsReceiptCancelled {
        practice_id: Uuid,
        receipt_id: Uuid,
    },
    OrderCreated {
        practice_id: Uuid,
        order_id: Uuid,
    },
    OrderStatusChanged {
        practice_id: Uuid,
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    StockAdjusted {
        practice_id: Uuid,
        location_id: Uuid,
        item_id: Uuid,
        delta: i32,
        new_quantity: i32,
    },
    StockTransferred {
        practice_id: Uuid,
        transfer_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::GoodsReceiptCreated { .. } => "goods_receipt.created",
            Event::GoodsReceiptConfirmed { .. } => "goods_receipt.confirmed",
            Event::GoodsReceiptCancelled { .. } => "goods_receipt.cancelled",
            Event::OrderCreated { .. } => "order.created",
            Event::OrderStatusChanged { .. } => "order.status_changed",
            Event::StockAdjusted { .. } => "inventory.adjusted",
            Event::StockTransferred { .. } => "inventory.transferred",
        }
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        metrics::counter!("procurement.events.processed", 1, "event" => event.name());

        match &event {
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
                ..
            } => {
                info!(%order_id, %old_status, %new_status, "Order status changed");
            }
            Event::GoodsReceiptConfirmed {
                receipt_id,
                order_id,
                total_quantity,
                ..
            } => {
                info!(%receipt_id, ?order_id, total_quantity, "Goods receipt confirmed");
            }
            other => info!(event = other.name(), "Received event: {:?}", other),
        }
    }

    info!("Event channel closed; event processing loop stopped");
}
