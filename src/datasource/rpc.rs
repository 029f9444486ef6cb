//! JSON-RPC ledger client.

use super::{AccountFilter, LedgerTransport, TransportError};
use crate::domain::Pubkey;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Ledger transport over the node's JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct RpcLedger {
    client: Client,
    url: String,
    max_elapsed: Duration,
}

impl RpcLedger {
    pub fn new(url: String) -> Self {
        Self::with_max_elapsed(url, Duration::from_secs(30))
    }

    pub fn with_max_elapsed(url: String, max_elapsed: Duration) -> Self {
        Self {
            client: Client::new(),
            url,
            max_elapsed,
        }
    }

    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, TransportError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.max_elapsed),
            ..Default::default()
        };

        let body = retry(backoff, || async {
            let response = self
                .client
                .post(&self.url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| {
                    backoff::Error::transient(TransportError::NetworkError(e.to_string()))
                })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(TransportError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(TransportError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(TransportError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(TransportError::ParseError(e.to_string())))
        })
        .await?;

        unwrap_rpc_result(body)
    }
}

fn unwrap_rpc_result(mut body: serde_json::Value) -> Result<serde_json::Value, TransportError> {
    if let Some(err) = body.get("error") {
        return Err(TransportError::RpcError {
            code: err.get("code").and_then(|c| c.as_i64()).unwrap_or(0),
            message: err
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
                .to_string(),
        });
    }
    body.get_mut("result")
        .map(serde_json::Value::take)
        .ok_or_else(|| TransportError::ParseError("Missing result field".to_string()))
}

/// Decode `["<base64>", "base64"]` account data.
fn decode_account_data(account: &serde_json::Value) -> Result<Vec<u8>, TransportError> {
    let encoded = account
        .get("data")
        .and_then(|d| d.get(0))
        .and_then(|d| d.as_str())
        .ok_or_else(|| TransportError::ParseError("Missing data field".to_string()))?;
    BASE64
        .decode(encoded)
        .map_err(|e| TransportError::ParseError(format!("Invalid base64: {}", e)))
}

fn filter_to_json(filter: &AccountFilter) -> serde_json::Value {
    match filter {
        AccountFilter::Memcmp { offset, bytes } => serde_json::json!({
            "memcmp": {
                "offset": offset,
                "bytes": bs58::encode(bytes).into_string(),
            }
        }),
        AccountFilter::DataSize(size) => serde_json::json!({ "dataSize": size }),
    }
}

#[async_trait]
impl LedgerTransport for RpcLedger {
    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, TransportError> {
        debug!("Fetching account {}", address);

        let result = self
            .call(
                "getAccountInfo",
                serde_json::json!([address.to_string(), { "encoding": "base64" }]),
            )
            .await?;

        match result.get("value") {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(account) => decode_account_data(account).map(Some),
        }
    }

    async fn scan_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
    ) -> Result<Vec<(Pubkey, Vec<u8>)>, TransportError> {
        debug!(
            "Scanning accounts of program={} with {} filters",
            program_id,
            filters.len()
        );

        let filters_json: Vec<_> = filters.iter().map(filter_to_json).collect();
        let result = self
            .call(
                "getProgramAccounts",
                serde_json::json!([
                    program_id.to_string(),
                    { "encoding": "base64", "filters": filters_json }
                ]),
            )
            .await?;

        let entries = result
            .as_array()
            .ok_or_else(|| TransportError::ParseError("Expected array response".to_string()))?;

        let mut accounts = Vec::with_capacity(entries.len());
        for entry in entries {
            match parse_keyed_account(entry) {
                Ok(pair) => accounts.push(pair),
                Err(e) => {
                    warn!("Failed to parse scanned account: {}", e);
                }
            }
        }

        Ok(accounts)
    }
}

fn parse_keyed_account(entry: &serde_json::Value) -> Result<(Pubkey, Vec<u8>), TransportError> {
    let pubkey = entry
        .get("pubkey")
        .and_then(|v| v.as_str())
        .ok_or_else(|| TransportError::ParseError("Missing pubkey field".to_string()))?;
    let pubkey = Pubkey::from_str(pubkey)
        .map_err(|e| TransportError::ParseError(format!("Invalid pubkey: {}", e)))?;
    let account = entry
        .get("account")
        .ok_or_else(|| TransportError::ParseError("Missing account field".to_string()))?;
    Ok((pubkey, decode_account_data(account)?))
}
