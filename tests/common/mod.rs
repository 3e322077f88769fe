#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use practice_procurement::{
    auth::{AuthContext, Role, PRACTICE_ID_HEADER, ROLE_HEADER, USER_ID_HEADER},
    config::AppConfig,
    db,
    entities::{item, location, location_inventory, practice, practice_supplier},
    errors::ServiceError,
    handlers::AppServices,
    services::notifications::{LowStockCheck, LowStockNotifier},
    AppState,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DatabaseTransaction, Set};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// Fresh in-memory SQLite database with every migration applied.
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let pool = db::connect(&db::PoolSettings::single("sqlite::memory:"))
        .await
        .expect("failed to open in-memory database");
    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations in tests");
    Arc::new(pool)
}

/// One seeded practice: a supplier, two items and a storeroom.
pub struct Practice {
    pub id: Uuid,
    pub user_id: Uuid,
    pub supplier_id: Uuid,
    pub location_id: Uuid,
    pub gloves: Uuid,
    pub syringes: Uuid,
}

impl Practice {
    pub fn staff(&self) -> AuthContext {
        AuthContext::new(self.user_id, self.id, Role::Staff)
    }

    pub fn viewer(&self) -> AuthContext {
        AuthContext::new(self.user_id, self.id, Role::Viewer)
    }

    pub fn admin(&self) -> AuthContext {
        AuthContext::new(self.user_id, self.id, Role::Admin)
    }
}

pub async fn seed_practice(db: &DatabaseConnection, name: &str) -> Practice {
    let now = Utc::now();
    let practice = practice::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        created_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert practice");

    let supplier = seed_supplier(db, practice.id, "MedSupply").await;
    let location_id = seed_location(db, practice.id, "Main storeroom", None).await;
    let gloves = seed_item(db, practice.id, "Nitrile gloves").await;
    let syringes = seed_item(db, practice.id, "Syringes 5ml").await;

    Practice {
        id: practice.id,
        user_id: Uuid::new_v4(),
        supplier_id: supplier,
        location_id,
        gloves,
        syringes,
    }
}

pub async fn seed_supplier(db: &DatabaseConnection, practice_id: Uuid, name: &str) -> Uuid {
    practice_supplier::ActiveModel {
        id: Set(Uuid::new_v4()),
        practice_id: Set(practice_id),
        name: Set(name.to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert supplier")
    .id
}

pub async fn seed_item(db: &DatabaseConnection, practice_id: Uuid, name: &str) -> Uuid {
    let now = Utc::now();
    item::ActiveModel {
        id: Set(Uuid::new_v4()),
        practice_id: Set(practice_id),
        product_id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        sku: Set(None),
        default_practice_supplier_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert item")
    .id
}

pub async fn seed_location(
    db: &DatabaseConnection,
    practice_id: Uuid,
    name: &str,
    parent_id: Option<Uuid>,
) -> Uuid {
    let now = Utc::now();
    location::ActiveModel {
        id: Set(Uuid::new_v4()),
        practice_id: Set(practice_id),
        name: Set(name.to_string()),
        code: Set(None),
        parent_id: Set(parent_id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert location")
    .id
}

/// Writes an inventory row directly, bypassing the ledger.
pub async fn seed_stock(
    db: &DatabaseConnection,
    practice_id: Uuid,
    location_id: Uuid,
    item_id: Uuid,
    quantity: i32,
    reorder_point: Option<i32>,
) {
    location_inventory::ActiveModel {
        location_id: Set(location_id),
        item_id: Set(item_id),
        practice_id: Set(practice_id),
        quantity: Set(quantity),
        reorder_point: Set(reorder_point),
        reorder_quantity: Set(None),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert inventory");
}

pub fn services(db: Arc<DatabaseConnection>) -> AppServices {
    AppServices::new(db, None)
}

/// Notifier that fails every check, to force a rollback mid-reconciliation.
pub struct FailingNotifier;

#[async_trait]
impl LowStockNotifier for FailingNotifier {
    async fn check_and_create_low_stock_notification(
        &self,
        _txn: &DatabaseTransaction,
        _check: LowStockCheck,
    ) -> Result<(), ServiceError> {
        Err(ServiceError::InternalError(
            "notification backend unavailable".to_string(),
        ))
    }
}

pub fn test_config() -> AppConfig {
    AppConfig::new(
        "sqlite::memory:".to_string(),
        "127.0.0.1".to_string(),
        18_080,
        "test".to_string(),
    )
}

/// HTTP harness over the full router.
pub struct TestApp {
    router: Router,
    pub db: Arc<DatabaseConnection>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = setup_db().await;
        let state = AppState::new(db.clone(), test_config(), None);
        Self {
            router: practice_procurement::app(state),
            db,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        ctx: Option<&AuthContext>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(ctx) = ctx {
            builder = builder
                .header(USER_ID_HEADER, ctx.user_id.to_string())
                .header(PRACTICE_ID_HEADER, ctx.practice_id.to_string());
            if let Some(role) = ctx.role {
                builder = builder.header(ROLE_HEADER, role.to_string());
            }
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("parse response body")
        };
        (status, value)
    }
}
