use crate::datasource::{Rejection, TransportError};
use crate::domain::{DecodeError, Pubkey, UnixTs};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures detected while deriving, reading or sizing a request.
///
/// Nothing partial is returned alongside any of these.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("exchange rate undefined: receipt supply is zero")]
    EmptyPool,
    #[error("requested {requested} exceeds proportional claim {claim}")]
    InsufficientClaim { requested: u64, claim: u64 },
    #[error("deposit {deposit} already has a live cooldown")]
    AlreadyInCooldown { deposit: Pubkey },
    #[error("deposit {deposit} already has a pending intent")]
    IntentPending { deposit: Pubkey },
    #[error("cooldown unlocks at {unlock_ts}, now is {now}")]
    CooldownNotElapsed { unlock_ts: UnixTs, now: UnixTs },
    #[error("stale read, retry from scratch: {0}")]
    StaleRead(String),
    #[error("malformed address: {0}")]
    MalformedAddress(String),
    #[error("withdrawal needs an intent: {0}")]
    IntentRequired(String),
    #[error("protocol is frozen")]
    ProtocolFrozen,
    #[error("amount {amount} below minimum deposit {minimum}")]
    BelowMinimum { amount: u64, minimum: u64 },
    #[error("deposit cap {cap} exceeded: pool holds {current}, adding {amount}")]
    DepositCapExceeded { cap: u64, current: u64, amount: u64 },
    #[error("{signer} is not the owner of {account}")]
    Unauthorized { signer: Pubkey, account: Pubkey },
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("arithmetic overflow")]
    Overflow,
    #[error("{kind} not found at {address}")]
    NotFound { kind: String, address: Pubkey },
    #[error("ledger rejected request: {0}")]
    Rejected(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Transport(TransportError),
    #[error("encoding failed: {0}")]
    Encode(String),
}

impl ClientError {
    /// Whether re-running the whole operation from scratch may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::StaleRead(_) => true,
            ClientError::Transport(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<Rejection> for ClientError {
    fn from(rejection: Rejection) -> Self {
        use crate::datasource::RejectionKind;
        match rejection.kind() {
            RejectionKind::IntentRequired => ClientError::IntentRequired(rejection.reason),
            RejectionKind::StaleState => ClientError::StaleRead(rejection.reason),
            RejectionKind::Other => ClientError::Rejected(rejection.reason),
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Rejected(rejection) => rejection.into(),
            other => ClientError::Transport(other),
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Encode(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        let msg = err.to_string();
        match err {
            ClientError::NotFound { .. } => AppError::NotFound(msg),
            ClientError::EmptyPool
            | ClientError::InsufficientClaim { .. }
            | ClientError::BelowMinimum { .. }
            | ClientError::DepositCapExceeded { .. }
            | ClientError::Unauthorized { .. }
            | ClientError::InvalidAmount(_) => AppError::BadRequest(msg),
            ClientError::AlreadyInCooldown { .. }
            | ClientError::IntentPending { .. }
            | ClientError::CooldownNotElapsed { .. }
            | ClientError::ProtocolFrozen
            | ClientError::IntentRequired(_)
            | ClientError::StaleRead(_)
            | ClientError::Rejected(_) => AppError::Conflict(msg),
            ClientError::Transport(_) => AppError::Upstream(msg),
            ClientError::MalformedAddress(_)
            | ClientError::Overflow
            | ClientError::Decode(_)
            | ClientError::Encode(_) => AppError::Internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
