//! Receipt-to-deposit exchange-rate accounting.
//!
//! All division truncates toward zero so rounding favours the pool.

use crate::error::ClientError;
use serde::{Deserialize, Serialize};

pub const BPS_DENOMINATOR: u64 = 10_000;

/// Live balances backing a lockup's receipt token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolBalances {
    pub hot_vault: u64,
    pub cold_vault: u64,
    pub receipt_supply: u64,
}

impl PoolBalances {
    pub fn total_assets(&self) -> u128 {
        self.hot_vault as u128 + self.cold_vault as u128
    }

    pub fn is_empty(&self) -> bool {
        self.receipt_supply == 0
    }
}

fn to_u64(value: u128) -> Result<u64, ClientError> {
    u64::try_from(value).map_err(|_| ClientError::Overflow)
}

/// Exchange rate in bps: `(hot + cold) * 10_000 / receipt_supply`.
///
/// # Errors
/// `EmptyPool` when no receipt tokens exist.
pub fn rate(balances: &PoolBalances) -> Result<u64, ClientError> {
    if balances.is_empty() {
        return Err(ClientError::EmptyPool);
    }
    let scaled = balances
        .total_assets()
        .checked_mul(BPS_DENOMINATOR as u128)
        .ok_or(ClientError::Overflow)?;
    to_u64(scaled / balances.receipt_supply as u128)
}

/// Asset value of `receipt_amount`: `floor(receipt_amount * rate / 10_000)`.
pub fn deposit_value(receipt_amount: u64, rate_bps: u64) -> Result<u64, ClientError> {
    let value = (receipt_amount as u128) * (rate_bps as u128) / BPS_DENOMINATOR as u128;
    to_u64(value)
}

/// Fail unless `requested` fits inside the caller's proportional claim.
///
/// # Returns
/// The claim, for callers that want to report headroom.
pub fn check_claim(requested: u64, receipt_balance: u64, rate_bps: u64) -> Result<u64, ClientError> {
    let claim = deposit_value(receipt_balance, rate_bps)?;
    if requested > claim {
        return Err(ClientError::InsufficientClaim { requested, claim });
    }
    Ok(claim)
}

/// Receipt units to burn for `value` asset units, rounded up.
///
/// Never exceeds the receipt balance when `value` passed [`check_claim`].
pub fn receipt_for_value(value: u64, rate_bps: u64) -> Result<u64, ClientError> {
    if rate_bps == 0 {
        return Err(ClientError::EmptyPool);
    }
    let numerator = (value as u128) * BPS_DENOMINATOR as u128;
    to_u64(numerator.div_ceil(rate_bps as u128))
}

/// Receipt units minted for restaking `amount`; 1:1 into an empty pool.
pub fn preview_mint(amount: u64, balances: &PoolBalances) -> Result<u64, ClientError> {
    if balances.is_empty() {
        return Ok(amount);
    }
    let rate_bps = rate(balances)?;
    if rate_bps == 0 {
        return Err(ClientError::EmptyPool);
    }
    to_u64((amount as u128) * BPS_DENOMINATOR as u128 / rate_bps as u128)
}
