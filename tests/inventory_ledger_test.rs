mod common;

use assert_matches::assert_matches;
use practice_procurement::{
    entities::{audit_log, notification, stock_adjustment, stock_transfer},
    errors::ServiceError,
    services::inventory::{
        AdjustStockInput, ListAdjustmentsQuery, ReorderSettingsInput, TransferStockInput,
    },
};
use rstest::rstest;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use common::{seed_location, seed_practice, seed_stock, services, setup_db};

fn adjust(location_id: Uuid, item_id: Uuid, delta: i32) -> AdjustStockInput {
    AdjustStockInput {
        location_id,
        item_id,
        delta,
        reason: None,
        note: None,
    }
}

#[tokio::test]
async fn adjustment_creates_row_and_records_history() {
    let db = setup_db().await;
    let svc = services(db.clone());
    let p = seed_practice(&db, "Harbour Dental").await;

    let result = svc
        .inventory
        .adjust_stock(&p.staff(), adjust(p.location_id, p.gloves, 12))
        .await
        .unwrap();
    assert_eq!(result.previous_quantity, 0);
    assert_eq!(result.new_quantity, 12);
    assert_eq!(result.adjustment.reason, stock_adjustment::REASON_MANUAL);

    let result = svc
        .inventory
        .adjust_stock(
            &p.staff(),
            AdjustStockInput {
                reason: Some("Expired".to_string()),
                ..adjust(p.location_id, p.gloves, -5)
            },
        )
        .await
        .unwrap();
    assert_eq!(result.previous_quantity, 12);
    assert_eq!(result.new_quantity, 7);
    assert_eq!(result.adjustment.quantity, -5);

    let row = svc
        .inventory
        .get_location_inventory(&p.viewer(), p.gloves, p.location_id)
        .await
        .unwrap();
    assert_eq!(row.quantity, 7);

    let history = svc
        .inventory
        .list_stock_adjustments(
            &p.viewer(),
            ListAdjustmentsQuery {
                item_id: Some(p.gloves),
                ..Default::default()
            },
            20,
        )
        .await
        .unwrap();
    assert_eq!(history.total, 2);

    let audits = audit_log::Entity::find()
        .filter(audit_log::Column::PracticeId.eq(p.id))
        .filter(audit_log::Column::EntityType.eq("StockAdjustment"))
        .count(db.as_ref())
        .await
        .unwrap();
    assert_eq!(audits, 2);
}

#[rstest]
#[case(3, -4)]
#[case(0, -1)]
#[tokio::test]
async fn stock_never_goes_negative(#[case] on_hand: i32, #[case] delta: i32) {
    let db = setup_db().await;
    let svc = services(db.clone());
    let p = seed_practice(&db, "Harbour Dental").await;
    seed_stock(&db, p.id, p.location_id, p.gloves, on_hand, None).await;

    let err = svc
        .inventory
        .adjust_stock(&p.staff(), adjust(p.location_id, p.gloves, delta))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    let row = svc
        .inventory
        .get_location_inventory(&p.viewer(), p.gloves, p.location_id)
        .await
        .unwrap();
    assert_eq!(row.quantity, on_hand);
    let adjustments = stock_adjustment::Entity::find()
        .filter(stock_adjustment::Column::PracticeId.eq(p.id))
        .count(db.as_ref())
        .await
        .unwrap();
    assert_eq!(adjustments, 0);
}

#[tokio::test]
async fn negative_adjustment_without_a_row_is_insufficient_stock() {
    let db = setup_db().await;
    let svc = services(db.clone());
    let p = seed_practice(&db, "Harbour Dental").await;

    let err = svc
        .inventory
        .adjust_stock(&p.staff(), adjust(p.location_id, p.syringes, -1))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    let missing = svc
        .inventory
        .get_location_inventory(&p.viewer(), p.syringes, p.location_id)
        .await;
    assert_matches!(missing, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn zero_delta_is_a_validation_error() {
    let db = setup_db().await;
    let svc = services(db.clone());
    let p = seed_practice(&db, "Harbour Dental").await;

    let err = svc
        .inventory
        .adjust_stock(&p.staff(), adjust(p.location_id, p.gloves, 0))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[rstest]
#[case(Some(-1), None)]
#[case(None, Some(0))]
#[tokio::test]
async fn invalid_reorder_settings_are_rejected(
    #[case] reorder_point: Option<i32>,
    #[case] reorder_quantity: Option<i32>,
) {
    let db = setup_db().await;
    let svc = services(db.clone());
    let p = seed_practice(&db, "Harbour Dental").await;

    let err = svc
        .inventory
        .set_reorder_settings(
            &p.staff(),
            p.location_id,
            p.gloves,
            ReorderSettingsInput {
                reorder_point,
                reorder_quantity,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn reorder_settings_keep_quantity_and_drive_low_stock_alerts() {
    let db = setup_db().await;
    let svc = services(db.clone());
    let p = seed_practice(&db, "Harbour Dental").await;
    seed_stock(&db, p.id, p.location_id, p.gloves, 20, None).await;

    let row = svc
        .inventory
        .set_reorder_settings(
            &p.staff(),
            p.location_id,
            p.gloves,
            ReorderSettingsInput {
                reorder_point: Some(10),
                reorder_quantity: Some(50),
            },
        )
        .await
        .unwrap();
    assert_eq!(row.quantity, 20);
    assert_eq!(row.reorder_point, Some(10));
    assert!(!row.is_low_stock());

    svc.inventory
        .adjust_stock(&p.staff(), adjust(p.location_id, p.gloves, -12))
        .await
        .unwrap();

    let alerts = notification::Entity::find()
        .filter(notification::Column::PracticeId.eq(p.id))
        .filter(notification::Column::Kind.eq(notification::KIND_LOW_STOCK))
        .count(db.as_ref())
        .await
        .unwrap();
    assert_eq!(alerts, 1);
}

#[tokio::test]
async fn transfer_moves_stock_between_locations() {
    let db = setup_db().await;
    let svc = services(db.clone());
    let p = seed_practice(&db, "Harbour Dental").await;
    let surgery = seed_location(&db, p.id, "Surgery 1", Some(p.location_id)).await;
    seed_stock(&db, p.id, p.location_id, p.gloves, 30, None).await;

    let result = svc
        .inventory
        .transfer_stock(
            &p.staff(),
            TransferStockInput {
                from_location_id: p.location_id,
                to_location_id: surgery,
                item_id: p.gloves,
                quantity: 8,
                note: Some("Weekly top-up".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(result.source_quantity, 22);
    assert_eq!(result.destination_quantity, 8);

    let adjustments = stock_adjustment::Entity::find()
        .filter(stock_adjustment::Column::PracticeId.eq(p.id))
        .all(db.as_ref())
        .await
        .unwrap();
    assert_eq!(adjustments.len(), 2);
    assert!(adjustments
        .iter()
        .any(|a| a.reason == stock_adjustment::REASON_TRANSFER_OUT && a.quantity == -8));
    assert!(adjustments
        .iter()
        .any(|a| a.reason == stock_adjustment::REASON_TRANSFER_IN && a.quantity == 8));

    let transfers = stock_transfer::Entity::find()
        .filter(stock_transfer::Column::PracticeId.eq(p.id))
        .count(db.as_ref())
        .await
        .unwrap();
    assert_eq!(transfers, 1);
}

#[tokio::test]
async fn failed_transfer_leaves_both_sides_untouched() {
    let db = setup_db().await;
    let svc = services(db.clone());
    let p = seed_practice(&db, "Harbour Dental").await;
    let surgery = seed_location(&db, p.id, "Surgery 1", None).await;
    seed_stock(&db, p.id, p.location_id, p.gloves, 3, None).await;

    let err = svc
        .inventory
        .transfer_stock(
            &p.staff(),
            TransferStockInput {
                from_location_id: p.location_id,
                to_location_id: surgery,
                item_id: p.gloves,
                quantity: 5,
                note: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    let source = svc
        .inventory
        .get_location_inventory(&p.viewer(), p.gloves, p.location_id)
        .await
        .unwrap();
    assert_eq!(source.quantity, 3);
    let destination = svc
        .inventory
        .get_location_inventory(&p.viewer(), p.gloves, surgery)
        .await;
    assert_matches!(destination, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn transfer_to_the_same_location_is_rejected() {
    let db = setup_db().await;
    let svc = services(db.clone());
    let p = seed_practice(&db, "Harbour Dental").await;

    let err = svc
        .inventory
        .transfer_stock(
            &p.staff(),
            TransferStockInput {
                from_location_id: p.location_id,
                to_location_id: p.location_id,
                item_id: p.gloves,
                quantity: 1,
                note: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}
