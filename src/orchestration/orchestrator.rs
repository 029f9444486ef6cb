use crate::datasource::{Confirmation, Submitter};
use crate::domain::Pubkey;
use crate::error::ClientError;
use crate::orchestration::builder::InstructionBuilder;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

const ALREADY_IN_COOLDOWN_MARKER: &str = "AlreadyInCooldown";
/// Allocation failure for a record that already exists.
const ACCOUNT_IN_USE_MARKER: &str = "already in use";

/// How a withdrawal request ended up on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum WithdrawalOutcome {
    CooldownRequested(Confirmation),
    /// The cooldown path was refused; an intent was queued instead.
    IntentCreated(Confirmation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashProgress {
    pub batches_submitted: u64,
    pub slashed_accounts: u64,
    pub target_accounts: u64,
}

/// Multi-request flows over an [`InstructionBuilder`] and a [`Submitter`].
#[derive(Debug, Clone)]
pub struct Orchestrator {
    builder: InstructionBuilder,
    submitter: Arc<dyn Submitter>,
}

impl Orchestrator {
    pub fn new(builder: InstructionBuilder, submitter: Arc<dyn Submitter>) -> Self {
        Self { builder, submitter }
    }

    pub fn builder(&self) -> &InstructionBuilder {
        &self.builder
    }

    /// Request a cooldown with the best boost, falling back to an intent when
    /// the ledger says the withdrawal is too large.
    pub async fn submit_withdrawal_request(
        &self,
        owner: &Pubkey,
        lockup_id: u64,
        deposit_id: u64,
        amount: u64,
    ) -> Result<WithdrawalOutcome, ClientError> {
        let request = self
            .builder
            .request_withdrawal_auto(owner, lockup_id, deposit_id, amount)
            .await?;

        match self.submitter.submit(&request).await.map_err(ClientError::from) {
            Ok(confirmation) => {
                info!(
                    "Cooldown requested for deposit {} of lockup {}",
                    deposit_id, lockup_id
                );
                Ok(WithdrawalOutcome::CooldownRequested(confirmation))
            }
            Err(ClientError::IntentRequired(reason)) => {
                info!("Falling back to intent: {}", reason);
                let intent = self
                    .builder
                    .create_intent(owner, lockup_id, deposit_id, amount)
                    .await?;
                match self.submitter.submit(&intent).await.map_err(ClientError::from) {
                    Ok(confirmation) => Ok(WithdrawalOutcome::IntentCreated(confirmation)),
                    Err(ClientError::Rejected(reason)) if reason.contains(ACCOUNT_IN_USE_MARKER) => {
                        let deposit = self.deposit_address(lockup_id, deposit_id).await?;
                        Err(ClientError::IntentPending { deposit })
                    }
                    Err(e) => Err(e),
                }
            }
            Err(ClientError::Rejected(reason))
                if reason.contains(ALREADY_IN_COOLDOWN_MARKER)
                    || reason.contains(ACCOUNT_IN_USE_MARKER) =>
            {
                let deposit = self.deposit_address(lockup_id, deposit_id).await?;
                Err(ClientError::AlreadyInCooldown { deposit })
            }
            Err(e) => Err(e),
        }
    }

    async fn deposit_address(&self, lockup_id: u64, deposit_id: u64) -> Result<Pubkey, ClientError> {
        let reader = self.builder.reader();
        let (lockup_address, _) = reader.lockup(lockup_id).await?;
        Ok(reader.deriver().deposit(&lockup_address, deposit_id)?.address)
    }

    /// Submit batches until the slash has processed every targeted deposit.
    ///
    /// Progress is re-read before each batch. Stops at the first rejection.
    pub async fn drive_slash(
        &self,
        admin: &Pubkey,
        lockup_id: u64,
        slash_id: u64,
    ) -> Result<SlashProgress, ClientError> {
        let reader = self.builder.reader();
        let (lockup_address, _) = reader.lockup(lockup_id).await?;
        let mut batches_submitted = 0u64;
        let mut last_processed: Option<u64> = None;

        loop {
            let slash = reader.slash(&lockup_address, slash_id).await?;
            if last_processed == Some(slash.slashed_accounts) {
                return Err(ClientError::StaleRead(format!(
                    "slash {} did not advance past {} after a confirmed batch",
                    slash_id, slash.slashed_accounts
                )));
            }
            if !slash.is_in_progress() {
                info!(
                    "Slash {} of lockup {} complete after {} batches",
                    slash_id, lockup_id, batches_submitted
                );
                return Ok(SlashProgress {
                    batches_submitted,
                    slashed_accounts: slash.slashed_accounts,
                    target_accounts: slash.target_accounts,
                });
            }

            let Some(batch) = self.builder.slash_batch(admin, lockup_id, slash_id).await? else {
                continue;
            };
            if let Err(e) = self.submitter.submit(&batch.request).await {
                warn!(
                    "Slash batch at {} rejected: {}",
                    slash.slashed_accounts, e
                );
                return Err(e.into());
            }
            batches_submitted += 1;
            last_processed = Some(slash.slashed_accounts);
            info!(
                "Slash {} batch {} submitted ({} deposits)",
                slash_id,
                batches_submitted,
                batch.deposits.len()
            );
        }
    }
}
