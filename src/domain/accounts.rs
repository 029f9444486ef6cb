//! Ledger-owned records and discriminator-keyed decoding.
//!
//! Each record is stored as an 8-byte discriminator followed by its borsh body.
//! The discriminator is `sha256("account:<TypeName>")[..8]`.

use crate::domain::{Pubkey, UnixTs};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const DISCRIMINATOR_LEN: usize = 8;

/// Compute the 8-byte discriminator for a namespaced name.
pub fn discriminator(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b":");
    hasher.update(name.as_bytes());
    let hash = hasher.finalize();
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&hash[..DISCRIMINATOR_LEN]);
    out
}

/// Protocol-wide singleton.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub frozen: bool,
    pub cold_share_bps: u64,
    pub hot_share_bps: u64,
    pub lockup_count: u64,
    pub asset_count: u64,
    pub reward_mint: Pubkey,
    pub cooldown_duration: u64,
}

/// Supported deposit token with its oracle and aggregate statistics.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub mint: Pubkey,
    pub oracle: Pubkey,
    pub total_value_locked: u64,
    pub deposit_count: u64,
    pub lockup_count: u64,
}

/// One pool instance for one asset.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct Lockup {
    pub index: u64,
    pub asset_mint: Pubkey,
    pub receipt_mint: Pubkey,
    pub duration: u64,
    pub deposit_cap: u64,
    pub min_deposit: u64,
    /// Next deposit index.
    pub deposits: u64,
    pub reward_exchange_rate: u64,
    /// Number of slashes created; the current one is `slash_count - 1`.
    pub slash_count: u64,
    pub reward_boosts: u64,
}

/// One user's position inside one lockup, accounted in receipt units.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    pub owner: Pubkey,
    pub lockup: Pubkey,
    pub index: u64,
    pub amount: u64,
    pub initial_usd_value: u64,
    pub amount_slashed: u64,
    pub unlock_ts: UnixTs,
}

/// Pending withdrawal for exactly one deposit.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct Cooldown {
    pub owner: Pubkey,
    pub lockup_id: u64,
    pub deposit_id: u64,
    pub receipt_amount: u64,
    pub unlock_ts: UnixTs,
    pub rewards: u64,
}

impl Cooldown {
    pub fn is_elapsed(&self, now: UnixTs) -> bool {
        now >= self.unlock_ts
    }
}

/// One seizure event against a lockup.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct Slash {
    pub index: u64,
    pub target_amount: u64,
    pub target_accounts: u64,
    pub slashed_accounts: u64,
    pub slashed_amount: u64,
}

impl Slash {
    pub fn is_in_progress(&self) -> bool {
        self.slashed_accounts < self.target_accounts
    }

    pub fn remaining_accounts(&self) -> u64 {
        self.target_accounts.saturating_sub(self.slashed_accounts)
    }
}

/// Large withdrawal awaiting admin processing.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub lockup: Pubkey,
    pub deposit: Pubkey,
    pub amount: u64,
}

/// Yield tier keyed by (lockup, index).
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct RewardBoost {
    pub lockup: Pubkey,
    pub index: u64,
    pub min_usd_value: u64,
    pub boost_bps: u64,
}

/// Record kinds, each with its own discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountKind {
    Settings,
    Asset,
    Lockup,
    Deposit,
    Cooldown,
    Slash,
    Intent,
    RewardBoost,
}

impl AccountKind {
    pub const ALL: [AccountKind; 8] = [
        AccountKind::Settings,
        AccountKind::Asset,
        AccountKind::Lockup,
        AccountKind::Deposit,
        AccountKind::Cooldown,
        AccountKind::Slash,
        AccountKind::Intent,
        AccountKind::RewardBoost,
    ];

    pub fn type_name(&self) -> &'static str {
        match self {
            AccountKind::Settings => "Settings",
            AccountKind::Asset => "Asset",
            AccountKind::Lockup => "Lockup",
            AccountKind::Deposit => "Deposit",
            AccountKind::Cooldown => "Cooldown",
            AccountKind::Slash => "Slash",
            AccountKind::Intent => "Intent",
            AccountKind::RewardBoost => "RewardBoost",
        }
    }

    pub fn discriminator(&self) -> [u8; DISCRIMINATOR_LEN] {
        discriminator("account", self.type_name())
    }

    pub fn from_discriminator(bytes: &[u8]) -> Option<AccountKind> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.discriminator().as_slice() == bytes)
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("record too short: {0} bytes")]
    TooShort(usize),
    #[error("unknown discriminator {0}")]
    UnknownDiscriminator(String),
    #[error("invalid {kind} body: {message}")]
    InvalidBody { kind: AccountKind, message: String },
    #[error("expected {expected} record, found {found}")]
    WrongKind {
        expected: AccountKind,
        found: AccountKind,
    },
}

/// Any decoded ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum LedgerAccount {
    Settings(Settings),
    Asset(Asset),
    Lockup(Lockup),
    Deposit(Deposit),
    Cooldown(Cooldown),
    Slash(Slash),
    Intent(Intent),
    RewardBoost(RewardBoost),
}

fn decode_body<T: BorshDeserialize>(kind: AccountKind, mut body: &[u8]) -> Result<T, DecodeError> {
    // Trailing bytes are allocation padding.
    T::deserialize(&mut body).map_err(|e| DecodeError::InvalidBody {
        kind,
        message: e.to_string(),
    })
}

impl LedgerAccount {
    /// Decode any record by its discriminator.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < DISCRIMINATOR_LEN {
            return Err(DecodeError::TooShort(bytes.len()));
        }
        let (disc, body) = bytes.split_at(DISCRIMINATOR_LEN);
        let kind = AccountKind::from_discriminator(disc)
            .ok_or_else(|| DecodeError::UnknownDiscriminator(hex::encode(disc)))?;

        Ok(match kind {
            AccountKind::Settings => LedgerAccount::Settings(decode_body(kind, body)?),
            AccountKind::Asset => LedgerAccount::Asset(decode_body(kind, body)?),
            AccountKind::Lockup => LedgerAccount::Lockup(decode_body(kind, body)?),
            AccountKind::Deposit => LedgerAccount::Deposit(decode_body(kind, body)?),
            AccountKind::Cooldown => LedgerAccount::Cooldown(decode_body(kind, body)?),
            AccountKind::Slash => LedgerAccount::Slash(decode_body(kind, body)?),
            AccountKind::Intent => LedgerAccount::Intent(decode_body(kind, body)?),
            AccountKind::RewardBoost => LedgerAccount::RewardBoost(decode_body(kind, body)?),
        })
    }

    pub fn kind(&self) -> AccountKind {
        match self {
            LedgerAccount::Settings(_) => AccountKind::Settings,
            LedgerAccount::Asset(_) => AccountKind::Asset,
            LedgerAccount::Lockup(_) => AccountKind::Lockup,
            LedgerAccount::Deposit(_) => AccountKind::Deposit,
            LedgerAccount::Cooldown(_) => AccountKind::Cooldown,
            LedgerAccount::Slash(_) => AccountKind::Slash,
            LedgerAccount::Intent(_) => AccountKind::Intent,
            LedgerAccount::RewardBoost(_) => AccountKind::RewardBoost,
        }
    }

    /// Discriminator followed by the borsh body.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.kind().discriminator().to_vec();
        let body = match self {
            LedgerAccount::Settings(a) => borsh::to_vec(a),
            LedgerAccount::Asset(a) => borsh::to_vec(a),
            LedgerAccount::Lockup(a) => borsh::to_vec(a),
            LedgerAccount::Deposit(a) => borsh::to_vec(a),
            LedgerAccount::Cooldown(a) => borsh::to_vec(a),
            LedgerAccount::Slash(a) => borsh::to_vec(a),
            LedgerAccount::Intent(a) => borsh::to_vec(a),
            LedgerAccount::RewardBoost(a) => borsh::to_vec(a),
        };
        // Writing into a Vec cannot fail.
        out.extend(body.unwrap_or_default());
        out
    }
}

/// Typed access to one variant of [`LedgerAccount`].
pub trait Record: Sized {
    const KIND: AccountKind;

    fn from_account(account: LedgerAccount) -> Result<Self, DecodeError>;

    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::from_account(LedgerAccount::decode(bytes)?)
    }
}

macro_rules! impl_record {
    ($ty:ident) => {
        impl Record for $ty {
            const KIND: AccountKind = AccountKind::$ty;

            fn from_account(account: LedgerAccount) -> Result<Self, DecodeError> {
                match account {
                    LedgerAccount::$ty(inner) => Ok(inner),
                    other => Err(DecodeError::WrongKind {
                        expected: Self::KIND,
                        found: other.kind(),
                    }),
                }
            }
        }

        impl From<$ty> for LedgerAccount {
            fn from(value: $ty) -> Self {
                LedgerAccount::$ty(value)
            }
        }
    };
}

impl_record!(Settings);
impl_record!(Asset);
impl_record!(Lockup);
impl_record!(Deposit);
impl_record!(Cooldown);
impl_record!(Slash);
impl_record!(Intent);
impl_record!(RewardBoost);

/// Balance field of a token account (little-endian u64 at offset 64).
pub fn token_account_amount(bytes: &[u8]) -> Result<u64, DecodeError> {
    read_u64_at(bytes, 64)
}

/// Supply field of a mint account (little-endian u64 at offset 36).
pub fn mint_supply(bytes: &[u8]) -> Result<u64, DecodeError> {
    read_u64_at(bytes, 36)
}

/// `unix_timestamp` of the clock record (little-endian i64 at offset 32).
pub fn clock_unix_timestamp(bytes: &[u8]) -> Result<UnixTs, DecodeError> {
    read_u64_at(bytes, 32).map(|v| v as i64)
}

fn read_u64_at(bytes: &[u8], offset: usize) -> Result<u64, DecodeError> {
    let slice = bytes
        .get(offset..offset + 8)
        .ok_or(DecodeError::TooShort(bytes.len()))?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(slice);
    Ok(u64::from_le_bytes(buf))
}
