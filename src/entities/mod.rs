pub mod audit_log;
pub mod count_session;
pub mod goods_receipt;
pub mod goods_receipt_line;
pub mod item;
pub mod location;
pub mod location_inventory;
pub mod notification;
pub mod order;
pub mod order_item;
pub mod practice;
pub mod practice_supplier;
pub mod stock_adjustment;
pub mod stock_transfer;

pub use goods_receipt::GoodsReceiptStatus;
pub use order::OrderStatus;
