//! In-memory ledger for testing without network calls.

use super::{AccountFilter, Confirmation, LedgerTransport, Rejection, Submitter, TransportError};
use crate::domain::{LedgerAccount, Pubkey, Request, UnixTs, CLOCK_SYSVAR_ID, TOKEN_PROGRAM_ID};
use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct StoredAccount {
    owner: Pubkey,
    data: Vec<u8>,
}

/// Mock ledger holding accounts in memory, mutable between reads.
#[derive(Debug)]
pub struct MockLedger {
    program_id: Pubkey,
    accounts: Mutex<BTreeMap<Pubkey, StoredAccount>>,
}

impl MockLedger {
    /// Create an empty ledger whose records belong to `program_id`.
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            accounts: Mutex::new(BTreeMap::new()),
        }
    }

    /// Add a program record.
    pub fn with_account(self, address: Pubkey, account: impl Into<LedgerAccount>) -> Self {
        self.set_account(address, account);
        self
    }

    /// Add raw bytes owned by the program.
    pub fn with_raw_account(self, address: Pubkey, data: Vec<u8>) -> Self {
        let owner = self.program_id;
        self.insert(address, owner, data);
        self
    }

    /// Add a token account holding `amount`.
    pub fn with_token_balance(self, address: Pubkey, amount: u64) -> Self {
        self.set_token_balance(address, amount);
        self
    }

    /// Add a mint account with `supply`.
    pub fn with_mint_supply(self, address: Pubkey, supply: u64) -> Self {
        let mut data = vec![0u8; 82];
        data[36..44].copy_from_slice(&supply.to_le_bytes());
        self.insert(address, TOKEN_PROGRAM_ID, data);
        self
    }

    /// Set the ledger clock.
    pub fn with_clock(self, unix_ts: UnixTs) -> Self {
        self.set_clock(unix_ts);
        self
    }

    pub fn set_clock(&self, unix_ts: UnixTs) {
        let mut data = vec![0u8; 40];
        data[32..40].copy_from_slice(&unix_ts.to_le_bytes());
        self.insert(CLOCK_SYSVAR_ID, Pubkey::default(), data);
    }

    /// Replace (or create) a program record in place.
    pub fn set_account(&self, address: Pubkey, account: impl Into<LedgerAccount>) {
        let data = account.into().encode();
        self.insert(address, self.program_id, data);
    }

    pub fn set_token_balance(&self, address: Pubkey, amount: u64) {
        let mut data = vec![0u8; 165];
        data[64..72].copy_from_slice(&amount.to_le_bytes());
        self.insert(address, TOKEN_PROGRAM_ID, data);
    }

    pub fn remove_account(&self, address: &Pubkey) {
        if let Ok(mut accounts) = self.accounts.lock() {
            accounts.remove(address);
        }
    }

    fn insert(&self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
        if let Ok(mut accounts) = self.accounts.lock() {
            accounts.insert(address, StoredAccount { owner, data });
        }
    }

    fn poisoned() -> TransportError {
        TransportError::NetworkError("mock ledger lock poisoned".to_string())
    }
}

#[async_trait]
impl LedgerTransport for MockLedger {
    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, TransportError> {
        let accounts = self.accounts.lock().map_err(|_| Self::poisoned())?;
        Ok(accounts.get(address).map(|a| a.data.clone()))
    }

    async fn scan_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
    ) -> Result<Vec<(Pubkey, Vec<u8>)>, TransportError> {
        let accounts = self.accounts.lock().map_err(|_| Self::poisoned())?;
        // Reverse address order so callers cannot rely on scan order.
        Ok(accounts
            .iter()
            .rev()
            .filter(|(_, a)| &a.owner == program_id && filters.iter().all(|f| f.matches(&a.data)))
            .map(|(k, a)| (*k, a.data.clone()))
            .collect())
    }
}

type SubmitHook = Arc<dyn Fn(&Request) + Send + Sync>;

/// Mock submitter recording requests and replaying scripted outcomes.
///
/// Without scripted outcomes every submission is confirmed. The optional hook
/// runs after each confirmed submission so tests can apply ledger effects.
pub struct MockSubmitter {
    outcomes: Mutex<VecDeque<Result<Confirmation, TransportError>>>,
    submitted: Mutex<Vec<Request>>,
    on_confirm: Option<SubmitHook>,
}

impl MockSubmitter {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
            on_confirm: None,
        }
    }

    /// Queue a rejection for the next unscripted submission.
    pub fn with_rejection(self, reason: &str) -> Self {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push_back(Err(TransportError::Rejected(Rejection::new(reason))));
        }
        self
    }

    /// Queue an explicit confirmation.
    pub fn with_confirmation(self) -> Self {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            let n = outcomes.len();
            outcomes.push_back(Ok(Confirmation {
                signature: format!("scripted-{}", n),
            }));
        }
        self
    }

    pub fn on_confirm(mut self, hook: impl Fn(&Request) + Send + Sync + 'static) -> Self {
        self.on_confirm = Some(Arc::new(hook));
        self
    }

    /// All requests submitted so far, in order.
    pub fn submitted(&self) -> Vec<Request> {
        self.submitted
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl Default for MockSubmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockSubmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSubmitter")
            .field("submitted", &self.submitted().len())
            .field("has_hook", &self.on_confirm.is_some())
            .finish()
    }
}

#[async_trait]
impl Submitter for MockSubmitter {
    async fn submit(&self, request: &Request) -> Result<Confirmation, TransportError> {
        let count = {
            let mut submitted = self
                .submitted
                .lock()
                .map_err(|_| MockLedger::poisoned())?;
            submitted.push(request.clone());
            submitted.len()
        };

        let scripted = self
            .outcomes
            .lock()
            .map_err(|_| MockLedger::poisoned())?
            .pop_front();
        let outcome = scripted.unwrap_or_else(|| {
            Ok(Confirmation {
                signature: format!("sig-{}", count),
            })
        });

        if outcome.is_ok() {
            if let Some(hook) = &self.on_confirm {
                hook(request);
            }
        }
        outcome
    }
}
