use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};

const RETRY_MESSAGE: &str = "The operation could not be completed; please retry";

/// JSON body of every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Reason phrase of the status, e.g. "Not Found".
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// RFC 3339.
    pub timestamp: String,
}

/// Failure of a procurement operation.
///
/// Every variant except `DatabaseError` and `InternalError` is raised by a
/// rule check before anything is written, or aborts the unit of work that
/// raised it.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A statement failed; the enclosing transaction has been rolled back.
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    /// Entity absent, or owned by another practice. The two cases are never
    /// distinguished.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Operation not permitted in the entity's current lifecycle state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),

    /// A ledger write would take on-hand quantity below zero.
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A collaborator (e.g. the low-stock notifier) failed.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(errors.to_string())
    }
}

impl ServiceError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(format!("{} {} not found", entity, id))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidState(_) => StatusCode::CONFLICT,
            Self::BusinessRuleViolation(_) | Self::InsufficientStock(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::DatabaseError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a client. Server-side failures are reduced to a
    /// fixed text; the full error goes to the log instead.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => RETRY_MESSAGE.to_string(),
            Self::InternalError(_) => "Internal server error".to_string(),
            rule => rule.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use rstest::rstest;

    #[rstest]
    #[case(ServiceError::NotFound("order".into()), StatusCode::NOT_FOUND)]
    #[case(ServiceError::ValidationError("qty".into()), StatusCode::BAD_REQUEST)]
    #[case(ServiceError::InvalidState("sent".into()), StatusCode::CONFLICT)]
    #[case(ServiceError::BusinessRuleViolation("in use".into()), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(ServiceError::InsufficientStock("3 on hand".into()), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(ServiceError::Forbidden("viewer".into()), StatusCode::FORBIDDEN)]
    #[case(ServiceError::Unauthorized("no header".into()), StatusCode::UNAUTHORIZED)]
    #[case(ServiceError::DatabaseError(DbErr::Custom("boom".into())), StatusCode::INTERNAL_SERVER_ERROR)]
    fn maps_to_http_status(#[case] error: ServiceError, #[case] expected: StatusCode) {
        assert_eq!(error.status_code(), expected);
    }

    #[test]
    fn server_side_failures_are_not_echoed() {
        let db = ServiceError::from(DbErr::Custom("constraint quantity_check failed".into()));
        assert_eq!(db.response_message(), RETRY_MESSAGE);
        assert_eq!(
            ServiceError::InternalError("notifier down".into()).response_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::BusinessRuleViolation("Cannot delete location".into())
                .response_message(),
            "Business rule violation: Cannot delete location"
        );
    }

    #[tokio::test]
    async fn response_body_names_the_entity() {
        let response = ServiceError::not_found("Goods receipt", "abc").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "Not Found");
        assert_eq!(body.message, "Not found: Goods receipt abc not found");
    }
}
