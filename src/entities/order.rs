use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "SENT")]
    Sent,
    #[sea_orm(string_value = "PARTIALLY_RECEIVED")]
    PartiallyReceived,
    #[sea_orm(string_value = "RECEIVED")]
    Received,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl OrderStatus {
    /// Allowed lifecycle moves. RECEIVED and CANCELLED are terminal.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Draft, Sent)
                | (Draft, Cancelled)
                | (Sent, PartiallyReceived)
                | (Sent, Received)
                | (Sent, Cancelled)
                | (PartiallyReceived, PartiallyReceived)
                | (PartiallyReceived, Received)
        )
    }

    /// Whether confirming a receipt may move this order forward.
    pub fn accepts_receipts(self) -> bool {
        matches!(self, OrderStatus::Sent | OrderStatus::PartiallyReceived)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Received | OrderStatus::Cancelled)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub practice_id: Uuid,
    pub practice_supplier_id: Uuid,
    pub status: OrderStatus,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_by_id: Uuid,
    pub sent_at: Option<DateTimeUtc>,
    pub received_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::OrderStatus::{self, *};
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case(Draft, Sent, true)]
    #[case(Draft, Cancelled, true)]
    #[case(Draft, Received, false)]
    #[case(Sent, PartiallyReceived, true)]
    #[case(Sent, Received, true)]
    #[case(Sent, Draft, false)]
    #[case(PartiallyReceived, Received, true)]
    #[case(PartiallyReceived, Cancelled, false)]
    #[case(Received, PartiallyReceived, false)]
    #[case(Received, Cancelled, false)]
    #[case(Cancelled, Sent, false)]
    fn transition_table(#[case] from: OrderStatus, #[case] to: OrderStatus, #[case] allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn only_open_orders_accept_receipts() {
        assert!(Sent.accepts_receipts());
        assert!(PartiallyReceived.accepts_receipts());
        assert!(!Draft.accepts_receipts());
        assert!(!Received.accepts_receipts());
        assert!(!Cancelled.accepts_receipts());
    }

    #[test]
    fn status_strings_are_upper_snake_case() {
        assert_eq!(PartiallyReceived.to_string(), "PARTIALLY_RECEIVED");
        assert_eq!(OrderStatus::from_str("SENT").unwrap(), Sent);
        assert_eq!(
            serde_json::to_string(&Received).unwrap(),
            "\"RECEIVED\""
        );
    }
}
