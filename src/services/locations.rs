use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, ModelTrait, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthContext, Role};
use crate::db::with_transaction;
use crate::entities::location;
use crate::errors::ServiceError;
use crate::repositories::location_repository;
use crate::repositories::scope::ensure_location;
use crate::repositories::Page;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLocationInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 50))]
    pub code: Option<String>,
    pub parent_id: Option<Uuid>,
}

/// `parent_id: Some(None)` moves the location to the root.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateLocationInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 50))]
    pub code: Option<String>,
    #[serde(default, with = "crate::services::double_option")]
    pub parent_id: Option<Option<Uuid>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListLocationsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Clone)]
pub struct LocationService {
    db: Arc<DatabaseConnection>,
}

impl LocationService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, ctx, input), fields(practice_id = %ctx.practice_id))]
    pub async fn create_location(
        &self,
        ctx: &AuthContext,
        input: CreateLocationInput,
    ) -> Result<location::Model, ServiceError> {
        let scope = ctx.require(Role::Staff)?;
        input.validate()?;

        let created = with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                if let Some(parent_id) = input.parent_id {
                    ensure_location(txn, scope, parent_id).await?;
                }

                let now = Utc::now();
                Ok(location::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    practice_id: Set(scope.practice_id()),
                    name: Set(input.name),
                    code: Set(input.code),
                    parent_id: Set(input.parent_id),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(txn)
                .await?)
            })
        })
        .await?;

        info!(location_id = %created.id, "Location created");
        Ok(created)
    }

    /// Re-parenting under itself or one of its descendants is refused so the
    /// tree stays acyclic.
    #[instrument(skip(self, ctx, input), fields(practice_id = %ctx.practice_id))]
    pub async fn update_location(
        &self,
        ctx: &AuthContext,
        location_id: Uuid,
        input: UpdateLocationInput,
    ) -> Result<location::Model, ServiceError> {
        let scope = ctx.require(Role::Staff)?;
        input.validate()?;

        with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let existing = ensure_location(txn, scope, location_id).await?;

                if let Some(Some(parent_id)) = input.parent_id {
                    if parent_id == location_id {
                        return Err(ServiceError::ValidationError(
                            "A location cannot be its own parent".to_string(),
                        ));
                    }
                    ensure_location(txn, scope, parent_id).await?;
                    let descendants =
                        location_repository::descendant_ids(txn, scope, location_id).await?;
                    if descendants.contains(&parent_id) {
                        return Err(ServiceError::ValidationError(format!(
                            "Location {} is below {} and cannot become its parent",
                            parent_id, location_id
                        )));
                    }
                }

                let mut active: location::ActiveModel = existing.into();
                if let Some(name) = input.name {
                    active.name = Set(name);
                }
                if let Some(code) = input.code {
                    active.code = Set(Some(code));
                }
                if let Some(parent_id) = input.parent_id {
                    active.parent_id = Set(parent_id);
                }
                active.updated_at = Set(Utc::now());
                Ok(active.update(txn).await?)
            })
        })
        .await
    }

    #[instrument(skip(self, ctx), fields(practice_id = %ctx.practice_id))]
    pub async fn delete_location(&self, ctx: &AuthContext, location_id: Uuid) -> Result<(), ServiceError> {
        let scope = ctx.require(Role::Admin)?;

        with_transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let existing = ensure_location(txn, scope, location_id).await?;
                let usage = location_repository::usage(txn, scope, location_id).await?;
                if !usage.is_unused() {
                    warn!(%location_id, usage = %usage.describe(), "Refusing to delete location in use");
                    return Err(ServiceError::BusinessRuleViolation(format!(
                        "Cannot delete location: it has {}",
                        usage.describe()
                    )));
                }
                existing.delete(txn).await?;
                Ok(())
            })
        })
        .await?;

        info!(%location_id, "Location deleted");
        Ok(())
    }

    pub async fn find_location(&self, ctx: &AuthContext, location_id: Uuid) -> Result<location::Model, ServiceError> {
        let scope = ctx.require(Role::Viewer)?;
        ensure_location(self.db.as_ref(), scope, location_id).await
    }

    pub async fn list_locations(
        &self,
        ctx: &AuthContext,
        query: ListLocationsQuery,
        limit: u64,
    ) -> Result<Page<location::Model>, ServiceError> {
        let scope = ctx.require(Role::Viewer)?;
        Ok(location_repository::list(self.db.as_ref(), scope, query.page.unwrap_or(1), limit).await?)
    }
}
