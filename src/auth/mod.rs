/*!
 * Caller identity and tenant scope
 *
 * Authentication happens upstream. The gateway forwards the resolved identity
 * in trusted headers and this module turns it into an [`AuthContext`]. The
 * only way to obtain a [`PracticeScope`] is from a context, and every
 * repository call requires one.
 */

use crate::errors::ServiceError;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const PRACTICE_ID_HEADER: &str = "x-practice-id";
pub const ROLE_HEADER: &str = "x-user-role";

/// Practice roles, lowest to highest.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Role {
    Viewer,
    Staff,
    Admin,
}

/// Tenant boundary handed to every data access call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PracticeScope {
    practice_id: Uuid,
}

impl PracticeScope {
    pub fn practice_id(&self) -> Uuid {
        self.practice_id
    }
}

/// Who is calling, for which practice, with what role.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub practice_id: Uuid,
    pub role: Option<Role>,
}

impl AuthContext {
    pub fn new(user_id: Uuid, practice_id: Uuid, role: Role) -> Self {
        Self {
            user_id,
            practice_id,
            role: Some(role),
        }
    }

    pub fn scope(&self) -> PracticeScope {
        PracticeScope {
            practice_id: self.practice_id,
        }
    }

    /// Fails with `Forbidden` unless the caller holds at least `needed`.
    pub fn require(&self, needed: Role) -> Result<PracticeScope, ServiceError> {
        match self.role {
            Some(role) if role >= needed => Ok(self.scope()),
            Some(role) => Err(ServiceError::Forbidden(format!(
                "Role {} cannot perform an action requiring {}",
                role, needed
            ))),
            None => Err(ServiceError::Forbidden(
                "No practice role for this user".to_string(),
            )),
        }
    }
}

fn header_uuid(parts: &Parts, name: &str) -> Result<Uuid, ServiceError> {
    let raw = parts
        .headers
        .get(name)
        .ok_or_else(|| ServiceError::Unauthorized(format!("Missing {} header", name)))?;
    let value = raw
        .to_str()
        .map_err(|_| ServiceError::Unauthorized(format!("Invalid {} header", name)))?;
    Uuid::parse_str(value.trim())
        .map_err(|_| ServiceError::Unauthorized(format!("Invalid {} header", name)))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_uuid(parts, USER_ID_HEADER)?;
        let practice_id = header_uuid(parts, PRACTICE_ID_HEADER)?;

        let role = match parts.headers.get(ROLE_HEADER) {
            None => None,
            Some(raw) => {
                let value = raw
                    .to_str()
                    .map_err(|_| ServiceError::Forbidden("Invalid role header".to_string()))?;
                let role = Role::from_str(value.trim())
                    .map_err(|_| ServiceError::Forbidden(format!("Unknown role {}", value)))?;
                Some(role)
            }
        };

        Ok(AuthContext {
            user_id,
            practice_id,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::Request;

    fn ctx(role: Option<Role>) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            practice_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn require_checks_role_order() {
        assert!(ctx(Some(Role::Admin)).require(Role::Staff).is_ok());
        assert!(ctx(Some(Role::Staff)).require(Role::Staff).is_ok());
        assert_matches!(
            ctx(Some(Role::Viewer)).require(Role::Staff),
            Err(ServiceError::Forbidden(_))
        );
        assert_matches!(ctx(None).require(Role::Viewer), Err(ServiceError::Forbidden(_)));
    }

    #[test]
    fn scope_carries_practice() {
        let c = ctx(Some(Role::Viewer));
        assert_eq!(c.scope().practice_id(), c.practice_id);
    }

    #[tokio::test]
    async fn extracts_context_from_headers() {
        let user = Uuid::new_v4();
        let practice = Uuid::new_v4();
        let (mut parts, _) = Request::builder()
            .header(USER_ID_HEADER, user.to_string())
            .header(PRACTICE_ID_HEADER, practice.to_string())
            .header(ROLE_HEADER, "staff")
            .body(())
            .unwrap()
            .into_parts();

        let ctx = AuthContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ctx, AuthContext::new(user, practice, Role::Staff));
    }

    #[tokio::test]
    async fn missing_practice_header_is_unauthorized() {
        let (mut parts, _) = Request::builder()
            .header(USER_ID_HEADER, Uuid::new_v4().to_string())
            .body(())
            .unwrap()
            .into_parts();

        let result = AuthContext::from_request_parts(&mut parts, &()).await;
        assert_matches!(result, Err(ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn unknown_role_is_forbidden() {
        let (mut parts, _) = Request::builder()
            .header(USER_ID_HEADER, Uuid::new_v4().to_string())
            .header(PRACTICE_ID_HEADER, Uuid::new_v4().to_string())
            .header(ROLE_HEADER, "owner")
            .body(())
            .unwrap()
            .into_parts();

        let result = AuthContext::from_request_parts(&mut parts, &()).await;
        assert_matches!(result, Err(ServiceError::Forbidden(_)));
    }
}
