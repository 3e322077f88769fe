use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, QueryFilter, QueryOrder, Set};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::PracticeScoped;
use crate::auth::PracticeScope;
use crate::entities::audit_log;

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub actor_id: Uuid,
    pub entity_type: &'static str,
    pub entity_id: Uuid,
    pub action: &'static str,
    pub changes: JsonValue,
    pub metadata: Option<JsonValue>,
}

pub async fn record<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    entry: AuditEntry,
) -> Result<audit_log::Model, DbErr> {
    audit_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        practice_id: Set(scope.practice_id()),
        actor_id: Set(entry.actor_id),
        entity_type: Set(entry.entity_type.to_string()),
        entity_id: Set(entry.entity_id),
        action: Set(entry.action.to_string()),
        changes: Set(entry.changes),
        metadata: Set(entry.metadata),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
}

pub async fn list_for_entity<C: ConnectionTrait>(
    db: &C,
    scope: PracticeScope,
    entity_type: &str,
    entity_id: Uuid,
) -> Result<Vec<audit_log::Model>, DbErr> {
    audit_log::Entity::find_scoped(scope)
        .filter(audit_log::Column::EntityType.eq(entity_type))
        .filter(audit_log::Column::EntityId.eq(entity_id))
        .order_by_asc(audit_log::Column::CreatedAt)
        .all(db)
        .await
}
