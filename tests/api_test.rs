mod common;

use axum::http::{Method, StatusCode};
use practice_procurement::auth::AuthContext;
use serde_json::json;
use uuid::Uuid;

use common::{seed_practice, seed_stock, TestApp};

#[tokio::test]
async fn health_reports_database_status() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"], "healthy");
}

#[tokio::test]
async fn missing_identity_headers_are_unauthorized() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(Method::GET, "/api/v1/orders", None, None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
    assert!(body["message"].as_str().unwrap().contains("x-user-id"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn caller_without_role_is_forbidden() {
    let app = TestApp::new().await;
    let p = seed_practice(&app.db, "Harbour Dental").await;
    let ctx = AuthContext {
        user_id: p.user_id,
        practice_id: p.id,
        role: None,
    };

    let (status, body) = app
        .request(Method::GET, "/api/v1/locations", Some(&ctx), None)
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");
}

#[tokio::test]
async fn receive_and_confirm_over_http() {
    let app = TestApp::new().await;
    let p = seed_practice(&app.db, "Harbour Dental").await;
    seed_stock(&app.db, p.id, p.location_id, p.gloves, 4, None).await;
    let staff = p.staff();

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/goods-receipts",
            Some(&staff),
            Some(json!({ "location_id": p.location_id, "notes": "Courier drop" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "DRAFT");
    let receipt_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/v1/goods-receipts/{receipt_id}/lines"),
            Some(&staff),
            Some(json!({ "item_id": p.gloves, "quantity": 6, "batch_number": "L-9" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["quantity"], 6);

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/v1/goods-receipts/{receipt_id}/confirm"),
            Some(&staff),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Goods receipt confirmed");
    assert_eq!(body["data"]["receipt"]["status"], "CONFIRMED");

    let (status, body) = app
        .request(
            Method::GET,
            &format!("/api/v1/inventory/locations/{}/items/{}", p.location_id, p.gloves),
            Some(&p.viewer()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["quantity"], 10);

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/v1/goods-receipts/{receipt_id}/lines"),
            Some(&staff),
            Some(json!({ "item_id": p.syringes, "quantity": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");
}

#[tokio::test]
async fn other_practices_receipts_are_not_found() {
    let app = TestApp::new().await;
    let a = seed_practice(&app.db, "Practice A").await;
    let b = seed_practice(&app.db, "Practice B").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/goods-receipts",
            Some(&b.staff()),
            Some(json!({ "location_id": b.location_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let receipt_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .request(
            Method::GET,
            &format!("/api/v1/goods-receipts/{receipt_id}"),
            Some(&a.viewer()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/v1/goods-receipts/{receipt_id}"),
            Some(&a.staff()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stock_adjustment_rules_map_to_status_codes() {
    let app = TestApp::new().await;
    let p = seed_practice(&app.db, "Harbour Dental").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/inventory/adjustments",
            Some(&p.staff()),
            Some(json!({ "location_id": p.location_id, "item_id": p.gloves, "delta": -3 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].is_string());

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/inventory/adjustments",
            Some(&p.staff()),
            Some(json!({ "location_id": Uuid::new_v4(), "item_id": p.gloves, "delta": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/inventory/adjustments",
            Some(&p.staff()),
            Some(json!({ "location_id": p.location_id, "item_id": p.gloves, "delta": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["new_quantity"], 3);
}

#[tokio::test]
async fn deleting_a_used_location_explains_why() {
    let app = TestApp::new().await;
    let p = seed_practice(&app.db, "Harbour Dental").await;
    seed_stock(&app.db, p.id, p.location_id, p.gloves, 1, None).await;

    let (status, body) = app
        .request(
            Method::DELETE,
            &format!("/api/v1/locations/{}", p.location_id),
            Some(&p.admin()),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["message"],
        "Business rule violation: Cannot delete location: it has 1 inventory record"
    );
}
