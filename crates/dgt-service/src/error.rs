//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use dgt_core::LedgerError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - valid credentials but insufficient permissions.
    #[error("forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - invalid state transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Insufficient funds.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance in minor units.
        balance: i64,
        /// Required amount in minor units.
        required: i64,
    },

    /// Command is on cooldown.
    #[error("cooldown active: {remaining_seconds}s remaining")]
    CooldownActive {
        /// Seconds until the command may be used again.
        remaining_seconds: u64,
    },

    /// Command disabled by settings.
    #[error("{command} is currently disabled")]
    ServiceDisabled {
        /// The disabled command.
        command: String,
    },

    /// Vault lock has not reached its unlock time.
    #[error("vault still locked for {remaining_seconds}s")]
    StillLocked {
        /// Seconds until the lock expires.
        remaining_seconds: u64,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::InsufficientFunds { balance, required } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_funds",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::CooldownActive { remaining_seconds } => (
                StatusCode::TOO_MANY_REQUESTS,
                "cooldown_active",
                self.to_string(),
                Some(serde_json::json!({
                    "remaining_seconds": remaining_seconds
                })),
            ),
            Self::ServiceDisabled { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_disabled",
                self.to_string(),
                None,
            ),
            Self::StillLocked { remaining_seconds } => (
                StatusCode::CONFLICT,
                "still_locked",
                self.to_string(),
                Some(serde_json::json!({
                    "remaining_seconds": remaining_seconds
                })),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<dgt_store::StoreError> for ApiError {
    fn from(err: dgt_store::StoreError) -> Self {
        Self::from(LedgerError::from(err))
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds { balance, required } => {
                Self::InsufficientFunds { balance, required }
            }
            LedgerError::AccountNotFound { user_id } => {
                Self::NotFound(format!("account not found: {user_id}"))
            }
            LedgerError::VaultNotFound => Self::NotFound("vault lock not found".into()),
            LedgerError::InvalidAmount(msg) => Self::BadRequest(msg),
            LedgerError::InvalidId(err) => Self::BadRequest(err.to_string()),
            LedgerError::UnsupportedCurrency(currency) => {
                Self::BadRequest(format!("unsupported currency: {currency}"))
            }
            LedgerError::NoEligibleRecipients => {
                Self::BadRequest("no eligible rain recipients".into())
            }
            LedgerError::ServiceDisabled { command } => Self::ServiceDisabled { command },
            LedgerError::CooldownActive { remaining_seconds } => {
                Self::CooldownActive { remaining_seconds }
            }
            LedgerError::PermissionDenied => Self::Forbidden,
            LedgerError::AlreadyUnlocked => {
                Self::Conflict("vault lock already unlocked".into())
            }
            LedgerError::StillLocked { remaining_seconds } => {
                Self::StillLocked { remaining_seconds }
            }
            LedgerError::OperationFailed { message, .. } => Self::Internal(message),
        }
    }
}
