//! Typed, address-checked reads over a [`LedgerTransport`].

use crate::datasource::{AccountFilter, LedgerTransport};
use crate::domain::accounts::{clock_unix_timestamp, mint_supply, token_account_amount};
use crate::domain::{
    local_now, Cooldown, DecodeError, Deposit, Intent, Lockup, Pubkey, Record,
    RewardBoost, Settings, Slash, UnixTs, CLOCK_SYSVAR_ID,
};
use crate::engine::{boost, exchange_rate, AddressDeriver, PoolBalances, VaultKind};
use crate::error::ClientError;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Byte offset of the first field after the discriminator.
const BODY: usize = 8;

/// Where a deposit sits in the withdrawal life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum WithdrawalState {
    Deposited,
    #[serde(rename_all = "camelCase")]
    CooldownRequested { unlock_ts: UnixTs },
    IntentPending { amount: u64 },
    /// Nothing left in the deposit.
    Withdrawn,
}

#[derive(Debug, Clone)]
pub struct LedgerReader {
    transport: Arc<dyn LedgerTransport>,
    deriver: AddressDeriver,
}

impl LedgerReader {
    pub fn new(transport: Arc<dyn LedgerTransport>, deriver: AddressDeriver) -> Self {
        Self { transport, deriver }
    }

    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    /// Fetch and decode a record expected at a derived address.
    ///
    /// A record of another kind at that address means the derivation inputs
    /// were wrong.
    pub async fn fetch_record<T: Record>(&self, address: &Pubkey) -> Result<Option<T>, ClientError> {
        debug!("Fetching {} at {}", T::KIND, address);
        let Some(bytes) = self.transport.fetch_account(address).await? else {
            return Ok(None);
        };
        match T::decode(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(DecodeError::WrongKind { expected, found }) => Err(ClientError::MalformedAddress(
                format!("expected {} at {}, found {}", expected, address, found),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn require<T: Record>(&self, address: &Pubkey) -> Result<T, ClientError> {
        self.fetch_record(address)
            .await?
            .ok_or_else(|| ClientError::NotFound {
                kind: T::KIND.to_string(),
                address: *address,
            })
    }

    async fn scan<T: Record>(&self, filters: Vec<AccountFilter>) -> Result<Vec<(Pubkey, T)>, ClientError> {
        let mut all = vec![AccountFilter::memcmp(0, T::KIND.discriminator().to_vec())];
        all.extend(filters);
        let raw = self
            .transport
            .scan_accounts(&self.deriver.program_id(), &all)
            .await?;

        let mut records = Vec::with_capacity(raw.len());
        for (address, bytes) in raw {
            match T::decode(&bytes) {
                Ok(record) => records.push((address, record)),
                Err(e) => {
                    warn!("Skipping undecodable {} at {}: {}", T::KIND, address, e);
                }
            }
        }
        Ok(records)
    }

    pub async fn settings(&self) -> Result<Settings, ClientError> {
        let address = self.deriver.settings()?.address;
        self.require(&address).await
    }

    pub async fn asset(&self, mint: &Pubkey) -> Result<crate::domain::Asset, ClientError> {
        let address = self.deriver.asset(mint)?.address;
        self.require(&address).await
    }

    pub async fn lockup(&self, lockup_id: u64) -> Result<(Pubkey, Lockup), ClientError> {
        let address = self.deriver.lockup(lockup_id)?.address;
        let lockup: Lockup = self.require(&address).await?;
        if lockup.index != lockup_id {
            return Err(ClientError::MalformedAddress(format!(
                "lockup at {} has index {}, derived from {}",
                address, lockup.index, lockup_id
            )));
        }
        Ok((address, lockup))
    }

    pub async fn deposit(
        &self,
        lockup: &Pubkey,
        deposit_id: u64,
    ) -> Result<(Pubkey, Deposit), ClientError> {
        let address = self.deriver.deposit(lockup, deposit_id)?.address;
        let deposit: Deposit = self.require(&address).await?;
        if &deposit.lockup != lockup || deposit.index != deposit_id {
            return Err(ClientError::MalformedAddress(format!(
                "deposit at {} references ({}, {}), derived from ({}, {})",
                address, deposit.lockup, deposit.index, lockup, deposit_id
            )));
        }
        Ok((address, deposit))
    }

    pub async fn cooldown(&self, deposit: &Pubkey) -> Result<Option<Cooldown>, ClientError> {
        let address = self.deriver.cooldown(deposit)?.address;
        self.fetch_record(&address).await
    }

    pub async fn intent(&self, deposit: &Pubkey) -> Result<Option<Intent>, ClientError> {
        let address = self.deriver.intent(deposit)?.address;
        self.fetch_record(&address).await
    }

    pub async fn slash(&self, lockup: &Pubkey, slash_id: u64) -> Result<Slash, ClientError> {
        let address = self.deriver.slash(lockup, slash_id)?.address;
        let slash: Slash = self.require(&address).await?;
        if slash.index != slash_id {
            return Err(ClientError::MalformedAddress(format!(
                "slash at {} has index {}, derived from {}",
                address, slash.index, slash_id
            )));
        }
        Ok(slash)
    }

    pub async fn reward_boost(&self, lockup: &Pubkey, boost_id: u64) -> Result<RewardBoost, ClientError> {
        let address = self.deriver.reward_boost(lockup, boost_id)?.address;
        let boost: RewardBoost = self.require(&address).await?;
        if &boost.lockup != lockup || boost.index != boost_id {
            return Err(ClientError::MalformedAddress(format!(
                "boost at {} references ({}, {}), derived from ({}, {})",
                address, boost.lockup, boost.index, lockup, boost_id
            )));
        }
        Ok(boost)
    }

    /// All boosts of a lockup, ordered by boost index.
    pub async fn reward_boosts(&self, lockup: &Pubkey) -> Result<Vec<RewardBoost>, ClientError> {
        let mut boosts: Vec<RewardBoost> = self
            .scan::<RewardBoost>(vec![AccountFilter::memcmp(BODY, lockup.to_bytes().to_vec())])
            .await?
            .into_iter()
            .map(|(_, b)| b)
            .collect();
        boost::sort_by_index(&mut boosts);
        Ok(boosts)
    }

    pub async fn deposits_by_owner(&self, owner: &Pubkey) -> Result<Vec<(Pubkey, Deposit)>, ClientError> {
        let mut deposits = self
            .scan::<Deposit>(vec![AccountFilter::memcmp(BODY, owner.to_bytes().to_vec())])
            .await?;
        deposits.sort_by_key(|(_, d)| (d.lockup, d.index));
        Ok(deposits)
    }

    pub async fn deposits_by_lockup(&self, lockup: &Pubkey) -> Result<Vec<(Pubkey, Deposit)>, ClientError> {
        let mut deposits = self
            .scan::<Deposit>(vec![AccountFilter::memcmp(
                BODY + Pubkey::LEN,
                lockup.to_bytes().to_vec(),
            )])
            .await?;
        deposits.sort_by_key(|(_, d)| d.index);
        Ok(deposits)
    }

    pub async fn cooldowns_by_owner(&self, owner: &Pubkey) -> Result<Vec<(Pubkey, Cooldown)>, ClientError> {
        let mut cooldowns = self
            .scan::<Cooldown>(vec![AccountFilter::memcmp(BODY, owner.to_bytes().to_vec())])
            .await?;
        cooldowns.sort_by_key(|(_, c)| (c.lockup_id, c.deposit_id));
        Ok(cooldowns)
    }

    async fn token_balance(&self, address: &Pubkey) -> Result<u64, ClientError> {
        let bytes = self
            .transport
            .fetch_account(address)
            .await?
            .ok_or_else(|| ClientError::NotFound {
                kind: "TokenAccount".to_string(),
                address: *address,
            })?;
        Ok(token_account_amount(&bytes)?)
    }

    async fn supply(&self, mint: &Pubkey) -> Result<u64, ClientError> {
        let bytes = self
            .transport
            .fetch_account(mint)
            .await?
            .ok_or_else(|| ClientError::NotFound {
                kind: "Mint".to_string(),
                address: *mint,
            })?;
        Ok(mint_supply(&bytes)?)
    }

    /// Hot vault, cold vault and receipt supply, each an independent snapshot.
    pub async fn pool_balances(
        &self,
        lockup_address: &Pubkey,
        lockup: &Lockup,
    ) -> Result<PoolBalances, ClientError> {
        let hot = self
            .deriver
            .vault(VaultKind::Hot, lockup_address, &lockup.asset_mint)?
            .address;
        let cold = self
            .deriver
            .vault(VaultKind::Cold, lockup_address, &lockup.asset_mint)?
            .address;
        Ok(PoolBalances {
            hot_vault: self.token_balance(&hot).await?,
            cold_vault: self.token_balance(&cold).await?,
            receipt_supply: self.supply(&lockup.receipt_mint).await?,
        })
    }

    /// Current exchange rate in bps.
    pub async fn exchange_rate(
        &self,
        lockup_address: &Pubkey,
        lockup: &Lockup,
    ) -> Result<u64, ClientError> {
        let balances = self.pool_balances(lockup_address, lockup).await?;
        exchange_rate::rate(&balances)
    }

    /// The ledger clock, if the node exposes it.
    pub async fn ledger_time(&self) -> Result<Option<UnixTs>, ClientError> {
        match self.transport.fetch_account(&CLOCK_SYSVAR_ID).await? {
            Some(bytes) => Ok(Some(clock_unix_timestamp(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Ledger time, falling back to the local clock.
    pub async fn now(&self) -> Result<UnixTs, ClientError> {
        Ok(match self.ledger_time().await? {
            Some(ts) => ts,
            None => {
                debug!("Ledger clock unavailable, using local time");
                local_now()
            }
        })
    }

    pub async fn withdrawal_state(
        &self,
        deposit_address: &Pubkey,
        deposit: &Deposit,
    ) -> Result<WithdrawalState, ClientError> {
        if let Some(cooldown) = self.cooldown(deposit_address).await? {
            return Ok(WithdrawalState::CooldownRequested {
                unlock_ts: cooldown.unlock_ts,
            });
        }
        if let Some(intent) = self.intent(deposit_address).await? {
            return Ok(WithdrawalState::IntentPending {
                amount: intent.amount,
            });
        }
        if deposit.amount == 0 {
            return Ok(WithdrawalState::Withdrawn);
        }
        Ok(WithdrawalState::Deposited)
    }
}
