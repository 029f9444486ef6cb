//! Ledger transport abstraction: raw account reads, filtered scans and submission.

use crate::domain::{Pubkey, Request};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod mock;
pub mod rpc;

pub use mock::{MockLedger, MockSubmitter};
pub use rpc::RpcLedger;

/// Read side of the remote ledger.
///
/// Every call returns an independent snapshot; two calls are never
/// consistent with each other.
#[async_trait]
pub trait LedgerTransport: Send + Sync + fmt::Debug {
    /// Fetch raw account bytes.
    ///
    /// # Returns
    /// `None` when no account exists at `address`.
    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, TransportError>;

    /// Scan all accounts owned by `program_id` matching every filter.
    ///
    /// # Returns
    /// `(address, bytes)` pairs in no guaranteed order.
    async fn scan_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
    ) -> Result<Vec<(Pubkey, Vec<u8>)>, TransportError>;
}

/// Write side of the remote ledger. Signing lives behind this seam.
#[async_trait]
pub trait Submitter: Send + Sync + fmt::Debug {
    async fn submit(&self, request: &Request) -> Result<Confirmation, TransportError>;
}

/// Server-side scan filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountFilter {
    /// Bytes at `offset` must equal `bytes`.
    Memcmp { offset: usize, bytes: Vec<u8> },
    /// Account data length must equal this value.
    DataSize(u64),
}

impl AccountFilter {
    pub fn memcmp(offset: usize, bytes: impl Into<Vec<u8>>) -> Self {
        AccountFilter::Memcmp {
            offset,
            bytes: bytes.into(),
        }
    }

    /// Apply the filter locally.
    pub fn matches(&self, data: &[u8]) -> bool {
        match self {
            AccountFilter::Memcmp { offset, bytes } => data
                .get(*offset..offset + bytes.len())
                .is_some_and(|slice| slice == bytes.as_slice()),
            AccountFilter::DataSize(size) => data.len() as u64 == *size,
        }
    }
}

/// Ledger acknowledgement of a committed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub signature: String,
}

/// Ledger refusal with its stated reason, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// Withdrawal share too large; an intent must be created instead.
    IntentRequired,
    /// The request was built from state the ledger no longer holds.
    StaleState,
    Other,
}

const INTENT_MARKERS: &[&str] = &["IntentRequired", "WithdrawalThresholdExceeded"];
const STALE_MARKERS: &[&str] = &[
    "AccountNotInitialized",
    "ConstraintSeeds",
    "SlashAmountMismatch",
    "InvalidSlashedAccounts",
    "StaleState",
];

impl Rejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> RejectionKind {
        if INTENT_MARKERS.iter().any(|m| self.reason.contains(m)) {
            RejectionKind::IntentRequired
        } else if STALE_MARKERS.iter().any(|m| self.reason.contains(m)) {
            RejectionKind::StaleState
        } else {
            RejectionKind::Other
        }
    }
}

/// Error type for transport operations.
#[derive(Debug, Clone)]
pub enum TransportError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 5xx server error)
    HttpError { status: u16, message: String },
    /// JSON-RPC error object returned by the node
    RpcError { code: i64, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded
    RateLimited,
    /// Ledger refused the request
    Rejected(Rejection),
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::NetworkError(_) | TransportError::RateLimited => true,
            TransportError::HttpError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            TransportError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            TransportError::RpcError { code, message } => {
                write!(f, "RPC error {}: {}", code, message)
            }
            TransportError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            TransportError::RateLimited => write!(f, "Rate limited"),
            TransportError::Rejected(r) => write!(f, "Rejected: {}", r.reason),
        }
    }
}

impl std::error::Error for TransportError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::NetworkError("connection timeout".to_string());
        assert_eq!(err.to_string(), "Network error: connection timeout");

        let err = TransportError::HttpError {
            status: 503,
            message: "Server error".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 503: Server error");

        let err = TransportError::RpcError {
            code: -32602,
            message: "Invalid params".to_string(),
        };
        assert_eq!(err.to_string(), "RPC error -32602: Invalid params");

        let err = TransportError::Rejected(Rejection::new("IntentRequired"));
        assert_eq!(err.to_string(), "Rejected: IntentRequired");
    }

    #[test]
    fn test_memcmp_filter() {
        let data = [1u8, 2, 3, 4, 5];
        assert!(AccountFilter::memcmp(1, vec![2, 3]).matches(&data));
        assert!(!AccountFilter::memcmp(1, vec![3]).matches(&data));
        assert!(!AccountFilter::memcmp(4, vec![5, 6]).matches(&data));
        assert!(AccountFilter::DataSize(5).matches(&data));
        assert!(!AccountFilter::DataSize(6).matches(&data));
    }

    #[test]
    fn test_rejection_kind() {
        assert_eq!(
            Rejection::new("Error: WithdrawalThresholdExceeded").kind(),
            RejectionKind::IntentRequired
        );
        assert_eq!(
            Rejection::new("ConstraintSeeds violated").kind(),
            RejectionKind::StaleState
        );
        // Allocation collisions mean the record exists; re-reading cannot clear them.
        assert_eq!(
            Rejection::new("Allocate: account already in use").kind(),
            RejectionKind::Other
        );
        assert_eq!(Rejection::new("insufficient funds").kind(), RejectionKind::Other);
    }
}
