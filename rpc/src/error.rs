//! RPC error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gatewatch_access::AccessError;
use gatewatch_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The authenticating proxy did not forward an operator id.
    #[error("missing operator id header")]
    MissingOperator,

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Access(e) => match e {
                AccessError::InvalidIdentity { .. }
                | AccessError::AccessDenied(_)
                | AccessError::AlreadyPresentElsewhere { .. } => StatusCode::FORBIDDEN,
                AccessError::NotAssigned(_) | AccessError::Conflict { .. } => StatusCode::CONFLICT,
                AccessError::Contention(_) => StatusCode::SERVICE_UNAVAILABLE,
                AccessError::LocationNotFound(_) => StatusCode::NOT_FOUND,
                AccessError::InvalidOperator(_) => StatusCode::BAD_REQUEST,
                AccessError::Store(StoreError::Backend(_)) => StatusCode::SERVICE_UNAVAILABLE,
                AccessError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::MissingOperator => StatusCode::UNAUTHORIZED,
            Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Access(e) => e.code(),
            Self::InvalidRequest(_) => "invalid_request",
            Self::MissingOperator => "missing_operator",
            Self::Server(_) => "server",
        }
    }
}

impl From<prometheus::Error> for RpcError {
    fn from(e: prometheus::Error) -> Self {
        RpcError::Server(e.to_string())
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "request failed: {self}");
        }
        let body = serde_json::json!({
            "message": self.to_string(),
            "code": self.code(),
        });
        (status, Json(body)).into_response()
    }
}
