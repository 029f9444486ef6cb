//! Partitioning of a slash into fixed-size deposit batches.

use crate::domain::{Pubkey, Slash};
use crate::engine::address::AddressDeriver;
use crate::error::ClientError;
use serde::{Deserialize, Serialize};

/// Deposits touched per slash request.
pub const SLASH_BATCH_SIZE: u64 = 10;

/// How the remaining batch count is reported for a non-exact remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchCountPolicy {
    /// `ceil(remainder / batch_size)`.
    #[default]
    Ceil,
    /// `remainder % batch_size` for non-exact remainders, matching deployed clients.
    Legacy,
}

/// One deposit scheduled in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedDeposit {
    pub index: u64,
    pub address: Pubkey,
}

#[derive(Debug, Clone, Copy)]
pub struct SlashBatchPlanner {
    deriver: AddressDeriver,
    policy: BatchCountPolicy,
}

impl SlashBatchPlanner {
    pub fn new(deriver: AddressDeriver, policy: BatchCountPolicy) -> Self {
        Self { deriver, policy }
    }

    pub fn policy(&self) -> BatchCountPolicy {
        self.policy
    }

    /// Next batch: indices `[processed, min(processed + 10, target))`.
    ///
    /// A complete slash yields an empty batch.
    pub fn plan_batch(
        &self,
        lockup: &Pubkey,
        slash: &Slash,
    ) -> Result<Vec<PlannedDeposit>, ClientError> {
        let start = slash.slashed_accounts;
        let end = start
            .saturating_add(SLASH_BATCH_SIZE)
            .min(slash.target_accounts);
        (start..end)
            .map(|index| {
                Ok(PlannedDeposit {
                    index,
                    address: self.deriver.deposit(lockup, index)?.address,
                })
            })
            .collect()
    }

    pub fn remaining_batches(&self, slash: &Slash) -> u64 {
        remaining_batches(slash.remaining_accounts(), self.policy)
    }
}

/// Batches left for `remainder` unprocessed accounts under `policy`.
pub fn remaining_batches(remainder: u64, policy: BatchCountPolicy) -> u64 {
    if remainder % SLASH_BATCH_SIZE == 0 {
        return remainder / SLASH_BATCH_SIZE;
    }
    match policy {
        BatchCountPolicy::Ceil => remainder.div_ceil(SLASH_BATCH_SIZE),
        BatchCountPolicy::Legacy => remainder % SLASH_BATCH_SIZE,
    }
}
