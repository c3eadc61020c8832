use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use redis::RedisError;
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::auth::access::AccessDecision;
use crate::billing::BillingError;

pub type Result<T> = core::result::Result<T, ApiError>;

/// Why an access check refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForbiddenReason {
    RoleMismatch,
    PermissionTooLow,
    ContractEnded,
    /// A structural rule rather than a grant, e.g. a pro ending with full payment.
    NotAllowed,
}

/// Request-level error. Every variant aborts the surrounding transaction.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{message}")]
    Forbidden {
        reason: ForbiddenReason,
        message: String,
    },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Billing provider error: {0}")]
    ExternalService(#[from] BillingError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Redis error: {0}")]
    Redis(#[from] RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound(entity.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn forbidden(reason: ForbiddenReason, message: impl Into<String>) -> Self {
        Self::Forbidden {
            reason,
            message: message.into(),
        }
    }

    /// Stable discriminator sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Forbidden { .. } => "FORBIDDEN",
            ApiError::Validation(_) => "VALIDATION",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::ExternalService(_) => "EXTERNAL_SERVICE_FAILURE",
            ApiError::Database(_) | ApiError::Redis(_) | ApiError::Serialization(_) => "INTERNAL",
        }
    }
}

impl From<AccessDecision> for ApiError {
    fn from(decision: AccessDecision) -> Self {
        match decision {
            AccessDecision::NotFound => ApiError::not_found("contract"),
            AccessDecision::RoleMismatch => ApiError::forbidden(
                ForbiddenReason::RoleMismatch,
                "Your role is not allowed to perform this action",
            ),
            AccessDecision::ContractEnded => ApiError::forbidden(
                ForbiddenReason::ContractEnded,
                "The contract has already ended",
            ),
            AccessDecision::PermissionTooLow | AccessDecision::Ok => ApiError::forbidden(
                ForbiddenReason::PermissionTooLow,
                "You do not have enough permissions on this contract",
            ),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) | ApiError::Redis(_) | ApiError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::Database(e) => {
                error!("Database error: {e:#?}");
                "Internal error".to_string()
            }
            ApiError::Redis(e) => {
                error!("Redis error: {e:#?}");
                "Internal error".to_string()
            }
            ApiError::Serialization(e) => {
                error!("Serialization error: {e:#?}");
                "Internal error".to_string()
            }
            other => other.to_string(),
        };

        let mut body = serde_json::json!({
            "error": message,
            "code": self.code(),
        });
        if let ApiError::Forbidden { reason, .. } = self {
            body["reason"] = serde_json::json!(reason);
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}
