//! Domain types for the restaking client.
//!
//! This module provides:
//! - Primitives: Pubkey, UnixTs and well-known program ids
//! - Ledger records with discriminator-keyed decoding
//! - Ready-to-submit requests and their argument bodies

pub mod accounts;
pub mod primitives;
pub mod request;

pub use accounts::{
    AccountKind, Asset, Cooldown, DecodeError, Deposit, Intent, LedgerAccount, Lockup, Record,
    RewardBoost, Settings, Slash,
};
pub use primitives::{
    local_now, Pubkey, PubkeyParseError, UnixTs, ASSOCIATED_TOKEN_PROGRAM_ID, CLOCK_SYSVAR_ID,
    SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID,
};
pub use request::{AccountMeta, Request, RequestKind};
