//! Assembles ready-to-submit requests from fresh reads, derived addresses
//! and computed amounts.
//!
//! Every amount computed here is advisory: the ledger re-validates on
//! submission and may reject a request built from a stale snapshot.

use crate::domain::request::{
    AddAssetArgs, AddRewardBoostArgs, CreateIntentArgs, CreateLockupArgs, CreateSlashArgs,
    DepositRefArgs, ManageFreezeArgs, RequestWithdrawalArgs, RestakeArgs, SlashDepositsArgs,
};
use crate::domain::{
    AccountMeta, Deposit, Pubkey, Request, RequestKind, RewardBoost, UnixTs,
    ASSOCIATED_TOKEN_PROGRAM_ID, SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID,
};
use crate::engine::{
    associated_token_address, boost, exchange_rate, AddressDeriver, PlannedDeposit,
    SlashBatchPlanner, VaultKind, BPS_DENOMINATOR,
};
use crate::error::ClientError;
use crate::orchestration::reader::LedgerReader;
use serde::Serialize;
use tracing::{debug, info};

/// A restake request plus the position it will create.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestakeRequest {
    pub request: Request,
    pub deposit: Pubkey,
    pub deposit_id: u64,
    pub expected_receipt: u64,
}

/// A slash batch request plus the deposits it touches.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashBatchRequest {
    pub request: Request,
    pub deposits: Vec<PlannedDeposit>,
}

#[derive(Debug, Clone)]
pub struct InstructionBuilder {
    reader: LedgerReader,
    planner: SlashBatchPlanner,
    admin_index: u8,
}

impl InstructionBuilder {
    pub fn new(reader: LedgerReader, planner: SlashBatchPlanner, admin_index: u8) -> Self {
        Self {
            reader,
            planner,
            admin_index,
        }
    }

    pub fn reader(&self) -> &LedgerReader {
        &self.reader
    }

    pub fn planner(&self) -> &SlashBatchPlanner {
        &self.planner
    }

    fn deriver(&self) -> &AddressDeriver {
        self.reader.deriver()
    }

    fn program_id(&self) -> Pubkey {
        self.deriver().program_id()
    }

    fn admin_accounts(&self, admin: &Pubkey) -> Result<Vec<AccountMeta>, ClientError> {
        Ok(vec![
            AccountMeta::signer(*admin),
            AccountMeta::readonly(self.deriver().admin(self.admin_index)?.address),
            AccountMeta::writable(self.deriver().settings()?.address),
        ])
    }

    async fn ensure_not_frozen(&self) -> Result<crate::domain::Settings, ClientError> {
        let settings = self.reader.settings().await?;
        if settings.frozen {
            return Err(ClientError::ProtocolFrozen);
        }
        Ok(settings)
    }

    async fn owned_deposit(
        &self,
        owner: &Pubkey,
        lockup: &Pubkey,
        deposit_id: u64,
    ) -> Result<(Pubkey, Deposit), ClientError> {
        let (address, deposit) = self.reader.deposit(lockup, deposit_id).await?;
        if &deposit.owner != owner {
            return Err(ClientError::Unauthorized {
                signer: *owner,
                account: address,
            });
        }
        Ok((address, deposit))
    }

    fn encode<A: borsh::BorshSerialize>(
        &self,
        kind: RequestKind,
        accounts: Vec<AccountMeta>,
        args: &A,
    ) -> Result<Request, ClientError> {
        let request = Request::encode(kind, self.program_id(), accounts, args)?;
        info!(
            "Built {} request touching {} accounts",
            kind.method_name(),
            request.accounts.len()
        );
        Ok(request)
    }

    /// Register a new deposit token.
    pub async fn add_asset(
        &self,
        admin: &Pubkey,
        mint: &Pubkey,
        oracle: &Pubkey,
    ) -> Result<Request, ClientError> {
        let mut accounts = self.admin_accounts(admin)?;
        accounts.extend([
            AccountMeta::writable(self.deriver().asset(mint)?.address),
            AccountMeta::readonly(*mint),
            AccountMeta::readonly(*oracle),
            AccountMeta::readonly(SYSTEM_PROGRAM_ID),
        ]);
        self.encode(
            RequestKind::AddAsset,
            accounts,
            &AddAssetArgs { oracle: *oracle },
        )
    }

    /// Create the next lockup for an already registered asset.
    pub async fn create_lockup(
        &self,
        admin: &Pubkey,
        asset_mint: &Pubkey,
        receipt_mint: &Pubkey,
        duration: u64,
        deposit_cap: u64,
        min_deposit: u64,
    ) -> Result<Request, ClientError> {
        if deposit_cap > 0 && min_deposit > deposit_cap {
            return Err(ClientError::InvalidAmount(format!(
                "minimum deposit {} above cap {}",
                min_deposit, deposit_cap
            )));
        }
        let settings = self.reader.settings().await?;
        self.reader.asset(asset_mint).await?;

        let lockup_id = settings.lockup_count;
        let lockup = self.deriver().lockup(lockup_id)?.address;
        let d = self.deriver();

        let mut accounts = self.admin_accounts(admin)?;
        accounts.extend([
            AccountMeta::writable(lockup),
            AccountMeta::writable(d.asset(asset_mint)?.address),
            AccountMeta::readonly(*asset_mint),
            AccountMeta::writable(*receipt_mint),
            AccountMeta::writable(d.vault(VaultKind::Hot, &lockup, asset_mint)?.address),
            AccountMeta::writable(d.vault(VaultKind::Cold, &lockup, asset_mint)?.address),
            AccountMeta::writable(d.vault(VaultKind::Cooldown, &lockup, asset_mint)?.address),
            AccountMeta::readonly(settings.reward_mint),
            AccountMeta::writable(
                d.vault(VaultKind::RewardPool, &lockup, &settings.reward_mint)?
                    .address,
            ),
            AccountMeta::readonly(TOKEN_PROGRAM_ID),
            AccountMeta::readonly(SYSTEM_PROGRAM_ID),
        ]);
        self.encode(
            RequestKind::CreateLockup,
            accounts,
            &CreateLockupArgs {
                lockup_id,
                duration,
                deposit_cap,
                min_deposit,
            },
        )
    }

    /// Register the next reward-boost tier on a lockup.
    pub async fn add_reward_boost(
        &self,
        admin: &Pubkey,
        lockup_id: u64,
        min_usd_value: u64,
        boost_bps: u64,
    ) -> Result<Request, ClientError> {
        if boost_bps == 0 || boost_bps > BPS_DENOMINATOR {
            return Err(ClientError::InvalidAmount(format!(
                "boost of {} bps outside 1..={}",
                boost_bps, BPS_DENOMINATOR
            )));
        }
        let (lockup_address, lockup) = self.reader.lockup(lockup_id).await?;
        let boost_address = self
            .deriver()
            .reward_boost(&lockup_address, lockup.reward_boosts)?
            .address;

        let mut accounts = self.admin_accounts(admin)?;
        accounts.extend([
            AccountMeta::writable(lockup_address),
            AccountMeta::writable(boost_address),
            AccountMeta::readonly(SYSTEM_PROGRAM_ID),
        ]);
        self.encode(
            RequestKind::AddRewardBoost,
            accounts,
            &AddRewardBoostArgs {
                lockup_id,
                min_usd_value,
                boost_bps,
            },
        )
    }

    /// Deposit `amount` of the lockup's asset and mint receipt tokens.
    pub async fn restake(
        &self,
        owner: &Pubkey,
        lockup_id: u64,
        amount: u64,
    ) -> Result<RestakeRequest, ClientError> {
        if amount == 0 {
            return Err(ClientError::InvalidAmount("restake amount is zero".to_string()));
        }
        self.ensure_not_frozen().await?;
        let (lockup_address, lockup) = self.reader.lockup(lockup_id).await?;
        if amount < lockup.min_deposit {
            return Err(ClientError::BelowMinimum {
                amount,
                minimum: lockup.min_deposit,
            });
        }

        let balances = self.reader.pool_balances(&lockup_address, &lockup).await?;
        let current = u64::try_from(balances.total_assets()).map_err(|_| ClientError::Overflow)?;
        if lockup.deposit_cap > 0 && current.saturating_add(amount) > lockup.deposit_cap {
            return Err(ClientError::DepositCapExceeded {
                cap: lockup.deposit_cap,
                current,
                amount,
            });
        }
        let expected_receipt = exchange_rate::preview_mint(amount, &balances)?;

        let asset = self.reader.asset(&lockup.asset_mint).await?;
        let d = self.deriver();
        let deposit_id = lockup.deposits;
        let deposit = d.deposit(&lockup_address, deposit_id)?.address;

        let accounts = vec![
            AccountMeta::signer(*owner),
            AccountMeta::readonly(d.settings()?.address),
            AccountMeta::writable(lockup_address),
            AccountMeta::writable(deposit),
            AccountMeta::writable(d.asset(&lockup.asset_mint)?.address),
            AccountMeta::readonly(lockup.asset_mint),
            AccountMeta::writable(associated_token_address(owner, &lockup.asset_mint)?),
            AccountMeta::writable(lockup.receipt_mint),
            AccountMeta::writable(associated_token_address(owner, &lockup.receipt_mint)?),
            AccountMeta::writable(d.vault(VaultKind::Hot, &lockup_address, &lockup.asset_mint)?.address),
            AccountMeta::writable(d.vault(VaultKind::Cold, &lockup_address, &lockup.asset_mint)?.address),
            AccountMeta::readonly(asset.oracle),
            AccountMeta::readonly(TOKEN_PROGRAM_ID),
            AccountMeta::readonly(ASSOCIATED_TOKEN_PROGRAM_ID),
            AccountMeta::readonly(SYSTEM_PROGRAM_ID),
        ];
        let request = self.encode(
            RequestKind::Restake,
            accounts,
            &RestakeArgs {
                lockup_id,
                amount,
                min_receipt_amount: expected_receipt,
            },
        )?;

        Ok(RestakeRequest {
            request,
            deposit,
            deposit_id,
            expected_receipt,
        })
    }

    /// Best boost for `valuation` among the lockup's current tiers.
    ///
    /// Tiers are re-read every call since boosts may be added after the
    /// deposit was created.
    pub async fn best_reward_boost(
        &self,
        lockup_address: &Pubkey,
        valuation: u64,
    ) -> Result<Option<RewardBoost>, ClientError> {
        let boosts = self.reader.reward_boosts(lockup_address).await?;
        let selected = boost::select(&boosts, valuation).cloned();
        match &selected {
            Some(b) => debug!(
                "Selected boost {} ({} bps) for valuation {}",
                b.index, b.boost_bps, valuation
            ),
            None => debug!(
                "No qualifying boost among {} for valuation {}",
                boosts.len(),
                valuation
            ),
        }
        Ok(selected)
    }

    /// Open a cooldown withdrawing `amount` asset units from a deposit.
    pub async fn request_withdrawal(
        &self,
        owner: &Pubkey,
        lockup_id: u64,
        deposit_id: u64,
        amount: u64,
        boost: Option<&RewardBoost>,
    ) -> Result<Request, ClientError> {
        if amount == 0 {
            return Err(ClientError::InvalidAmount("withdrawal amount is zero".to_string()));
        }
        let settings = self.ensure_not_frozen().await?;
        let (lockup_address, lockup) = self.reader.lockup(lockup_id).await?;
        let (deposit_address, deposit) = self.owned_deposit(owner, &lockup_address, deposit_id).await?;

        if self.reader.cooldown(&deposit_address).await?.is_some() {
            return Err(ClientError::AlreadyInCooldown {
                deposit: deposit_address,
            });
        }

        let rate = self.reader.exchange_rate(&lockup_address, &lockup).await?;
        exchange_rate::check_claim(amount, deposit.amount, rate)?;
        let receipt_amount = exchange_rate::receipt_for_value(amount, rate)?;

        let d = self.deriver();
        let mut accounts = vec![
            AccountMeta::signer(*owner),
            AccountMeta::readonly(d.settings()?.address),
            AccountMeta::writable(lockup_address),
            AccountMeta::writable(deposit_address),
            AccountMeta::writable(d.cooldown(&deposit_address)?.address),
            AccountMeta::readonly(lockup.asset_mint),
            AccountMeta::writable(lockup.receipt_mint),
            AccountMeta::writable(associated_token_address(owner, &lockup.receipt_mint)?),
            AccountMeta::writable(d.vault(VaultKind::Hot, &lockup_address, &lockup.asset_mint)?.address),
            AccountMeta::writable(d.vault(VaultKind::Cold, &lockup_address, &lockup.asset_mint)?.address),
            AccountMeta::writable(
                d.vault(VaultKind::Cooldown, &lockup_address, &lockup.asset_mint)?
                    .address,
            ),
            AccountMeta::readonly(settings.reward_mint),
            AccountMeta::writable(
                d.vault(VaultKind::RewardPool, &lockup_address, &settings.reward_mint)?
                    .address,
            ),
            AccountMeta::readonly(TOKEN_PROGRAM_ID),
            AccountMeta::readonly(SYSTEM_PROGRAM_ID),
        ];
        if let Some(b) = boost {
            if b.lockup != lockup_address {
                return Err(ClientError::MalformedAddress(format!(
                    "boost {} belongs to {}, not {}",
                    b.index, b.lockup, lockup_address
                )));
            }
            if b.min_usd_value > deposit.initial_usd_value {
                return Err(ClientError::InvalidAmount(format!(
                    "boost {} needs valuation {}, deposit has {}",
                    b.index, b.min_usd_value, deposit.initial_usd_value
                )));
            }
            accounts.push(AccountMeta::readonly(
                d.reward_boost(&lockup_address, b.index)?.address,
            ));
        }

        self.encode(
            RequestKind::RequestWithdrawal,
            accounts,
            &RequestWithdrawalArgs {
                lockup_id,
                deposit_id,
                receipt_amount,
                reward_boost_id: boost.map(|b| b.index),
            },
        )
    }

    /// Pick the best boost, then open the cooldown with it.
    pub async fn request_withdrawal_auto(
        &self,
        owner: &Pubkey,
        lockup_id: u64,
        deposit_id: u64,
        amount: u64,
    ) -> Result<Request, ClientError> {
        let (lockup_address, _) = self.reader.lockup(lockup_id).await?;
        let (_, deposit) = self.reader.deposit(&lockup_address, deposit_id).await?;
        let boost = self
            .best_reward_boost(&lockup_address, deposit.initial_usd_value)
            .await?;
        self.request_withdrawal(owner, lockup_id, deposit_id, amount, boost.as_ref())
            .await
    }

    /// Queue a disproportionate withdrawal for admin processing.
    pub async fn create_intent(
        &self,
        owner: &Pubkey,
        lockup_id: u64,
        deposit_id: u64,
        amount: u64,
    ) -> Result<Request, ClientError> {
        if amount == 0 {
            return Err(ClientError::InvalidAmount("intent amount is zero".to_string()));
        }
        self.ensure_not_frozen().await?;
        let (lockup_address, lockup) = self.reader.lockup(lockup_id).await?;
        let (deposit_address, deposit) = self.owned_deposit(owner, &lockup_address, deposit_id).await?;

        if self.reader.cooldown(&deposit_address).await?.is_some() {
            return Err(ClientError::AlreadyInCooldown {
                deposit: deposit_address,
            });
        }
        if self.reader.intent(&deposit_address).await?.is_some() {
            return Err(ClientError::IntentPending {
                deposit: deposit_address,
            });
        }

        let rate = self.reader.exchange_rate(&lockup_address, &lockup).await?;
        exchange_rate::check_claim(amount, deposit.amount, rate)?;

        let d = self.deriver();
        let accounts = vec![
            AccountMeta::signer(*owner),
            AccountMeta::readonly(d.settings()?.address),
            AccountMeta::readonly(lockup_address),
            AccountMeta::writable(deposit_address),
            AccountMeta::writable(d.intent(&deposit_address)?.address),
            AccountMeta::readonly(SYSTEM_PROGRAM_ID),
        ];
        self.encode(
            RequestKind::CreateIntent,
            accounts,
            &CreateIntentArgs {
                lockup_id,
                deposit_id,
                amount,
            },
        )
    }

    /// Admin settlement of a pending intent.
    pub async fn process_intent(
        &self,
        admin: &Pubkey,
        lockup_id: u64,
        deposit_id: u64,
    ) -> Result<Request, ClientError> {
        let (lockup_address, lockup) = self.reader.lockup(lockup_id).await?;
        let (deposit_address, deposit) = self.reader.deposit(&lockup_address, deposit_id).await?;
        let intent_address = self.deriver().intent(&deposit_address)?.address;
        if self.reader.intent(&deposit_address).await?.is_none() {
            return Err(ClientError::NotFound {
                kind: "Intent".to_string(),
                address: intent_address,
            });
        }

        let d = self.deriver();
        let mut accounts = self.admin_accounts(admin)?;
        accounts.extend([
            AccountMeta::writable(lockup_address),
            AccountMeta::writable(deposit_address),
            AccountMeta::writable(intent_address),
            AccountMeta::writable(deposit.owner),
            AccountMeta::readonly(lockup.asset_mint),
            AccountMeta::writable(associated_token_address(&deposit.owner, &lockup.asset_mint)?),
            AccountMeta::writable(lockup.receipt_mint),
            AccountMeta::writable(d.vault(VaultKind::Hot, &lockup_address, &lockup.asset_mint)?.address),
            AccountMeta::readonly(TOKEN_PROGRAM_ID),
        ]);
        self.encode(
            RequestKind::ProcessIntent,
            accounts,
            &DepositRefArgs {
                lockup_id,
                deposit_id,
            },
        )
    }

    /// Consume an elapsed cooldown and pay out principal plus rewards.
    ///
    /// `now` gates locally only; the ledger clock is authoritative.
    pub async fn withdraw(
        &self,
        owner: &Pubkey,
        lockup_id: u64,
        deposit_id: u64,
        now: UnixTs,
    ) -> Result<Request, ClientError> {
        let settings = self.ensure_not_frozen().await?;
        let (lockup_address, lockup) = self.reader.lockup(lockup_id).await?;
        let (deposit_address, _) = self.owned_deposit(owner, &lockup_address, deposit_id).await?;
        let cooldown_address = self.deriver().cooldown(&deposit_address)?.address;
        let cooldown = self
            .reader
            .cooldown(&deposit_address)
            .await?
            .ok_or(ClientError::NotFound {
                kind: "Cooldown".to_string(),
                address: cooldown_address,
            })?;
        if !cooldown.is_elapsed(now) {
            return Err(ClientError::CooldownNotElapsed {
                unlock_ts: cooldown.unlock_ts,
                now,
            });
        }

        let d = self.deriver();
        let accounts = vec![
            AccountMeta::signer(*owner),
            AccountMeta::readonly(d.settings()?.address),
            AccountMeta::writable(lockup_address),
            AccountMeta::writable(deposit_address),
            AccountMeta::writable(cooldown_address),
            AccountMeta::readonly(lockup.asset_mint),
            AccountMeta::readonly(settings.reward_mint),
            AccountMeta::writable(associated_token_address(owner, &lockup.asset_mint)?),
            AccountMeta::writable(associated_token_address(owner, &settings.reward_mint)?),
            AccountMeta::writable(
                d.vault(VaultKind::Cooldown, &lockup_address, &lockup.asset_mint)?
                    .address,
            ),
            AccountMeta::writable(
                d.vault(VaultKind::RewardPool, &lockup_address, &settings.reward_mint)?
                    .address,
            ),
            AccountMeta::readonly(TOKEN_PROGRAM_ID),
            AccountMeta::readonly(ASSOCIATED_TOKEN_PROGRAM_ID),
            AccountMeta::readonly(SYSTEM_PROGRAM_ID),
        ];
        self.encode(
            RequestKind::Withdraw,
            accounts,
            &DepositRefArgs {
                lockup_id,
                deposit_id,
            },
        )
    }

    /// Open the next seizure event on a lockup.
    pub async fn create_slash(
        &self,
        admin: &Pubkey,
        lockup_id: u64,
        amount: u64,
    ) -> Result<Request, ClientError> {
        if amount == 0 {
            return Err(ClientError::InvalidAmount("slash amount is zero".to_string()));
        }
        let (lockup_address, lockup) = self.reader.lockup(lockup_id).await?;
        let slash_address = self
            .deriver()
            .slash(&lockup_address, lockup.slash_count)?
            .address;

        let mut accounts = self.admin_accounts(admin)?;
        accounts.extend([
            AccountMeta::writable(lockup_address),
            AccountMeta::writable(slash_address),
            AccountMeta::readonly(SYSTEM_PROGRAM_ID),
        ]);
        self.encode(
            RequestKind::CreateSlash,
            accounts,
            &CreateSlashArgs { lockup_id, amount },
        )
    }

    /// Next batch of an in-progress slash, from a fresh read of its progress.
    ///
    /// # Returns
    /// `None` once the slash is complete.
    pub async fn slash_batch(
        &self,
        admin: &Pubkey,
        lockup_id: u64,
        slash_id: u64,
    ) -> Result<Option<SlashBatchRequest>, ClientError> {
        let (lockup_address, lockup) = self.reader.lockup(lockup_id).await?;
        let slash = self.reader.slash(&lockup_address, slash_id).await?;
        let deposits = self.planner.plan_batch(&lockup_address, &slash)?;
        let Some(first) = deposits.first() else {
            debug!("Slash {} of lockup {} is complete", slash_id, lockup_id);
            return Ok(None);
        };
        let first_deposit_id = first.index;
        let count = u8::try_from(deposits.len()).map_err(|_| ClientError::Overflow)?;

        let d = self.deriver();
        let mut accounts = self.admin_accounts(admin)?;
        accounts.extend([
            AccountMeta::writable(lockup_address),
            AccountMeta::writable(d.slash(&lockup_address, slash_id)?.address),
            AccountMeta::readonly(lockup.asset_mint),
            AccountMeta::writable(d.vault(VaultKind::Hot, &lockup_address, &lockup.asset_mint)?.address),
            AccountMeta::writable(d.vault(VaultKind::Cold, &lockup_address, &lockup.asset_mint)?.address),
            AccountMeta::readonly(TOKEN_PROGRAM_ID),
        ]);
        accounts.extend(deposits.iter().map(|p| AccountMeta::writable(p.address)));

        let request = self.encode(
            RequestKind::SlashDeposits,
            accounts,
            &SlashDepositsArgs {
                lockup_id,
                slash_id,
                first_deposit_id,
                count,
            },
        )?;
        Ok(Some(SlashBatchRequest { request, deposits }))
    }

    /// Freeze or unfreeze the protocol.
    pub async fn set_frozen(&self, admin: &Pubkey, freeze: bool) -> Result<Request, ClientError> {
        let accounts = self.admin_accounts(admin)?;
        self.encode(
            RequestKind::ManageFreeze,
            accounts,
            &ManageFreezeArgs { freeze },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MockLedger;
    use crate::domain::request::{CreateLockupArgs, CreateSlashArgs};
    use crate::domain::{Asset, Intent, Lockup, Settings};
    use crate::engine::BatchCountPolicy;
    use std::sync::Arc;

    fn program() -> Pubkey {
        Pubkey::new([7u8; 32])
    }

    fn admin() -> Pubkey {
        Pubkey::new([13u8; 32])
    }

    fn setup() -> (Arc<MockLedger>, InstructionBuilder) {
        let d = AddressDeriver::new(program());
        let mint = Pubkey::new([21u8; 32]);
        let ledger = Arc::new(
            MockLedger::new(program())
                .with_account(
                    d.settings().unwrap().address,
                    Settings {
                        lockup_count: 1,
                        reward_mint: Pubkey::new([23u8; 32]),
                        ..Default::default()
                    },
                )
                .with_account(
                    d.asset(&mint).unwrap().address,
                    Asset {
                        mint,
                        ..Default::default()
                    },
                )
                .with_account(
                    d.lockup(0).unwrap().address,
                    Lockup {
                        index: 0,
                        asset_mint: mint,
                        receipt_mint: Pubkey::new([22u8; 32]),
                        slash_count: 2,
                        reward_boosts: 3,
                        ..Default::default()
                    },
                ),
        );
        let reader = LedgerReader::new(ledger.clone(), d);
        let builder = InstructionBuilder::new(
            reader,
            SlashBatchPlanner::new(d, BatchCountPolicy::Ceil),
            4,
        );
        (ledger, builder)
    }

    #[tokio::test]
    async fn test_admin_requests_carry_admin_role() {
        let (_, builder) = setup();
        let request = builder.set_frozen(&admin(), true).await.unwrap();
        let role = AddressDeriver::new(program()).admin(4).unwrap().address;
        assert_eq!(request.accounts[0], AccountMeta::signer(admin()));
        assert_eq!(request.accounts[1], AccountMeta::readonly(role));
        assert_eq!(
            request.decode_args::<ManageFreezeArgs>().unwrap(),
            ManageFreezeArgs { freeze: true }
        );
    }

    #[tokio::test]
    async fn test_create_lockup_uses_next_index() {
        let (_, builder) = setup();
        let request = builder
            .create_lockup(
                &admin(),
                &Pubkey::new([21u8; 32]),
                &Pubkey::new([30u8; 32]),
                86_400,
                1_000,
                10,
            )
            .await
            .unwrap();
        let args: CreateLockupArgs = request.decode_args().unwrap();
        assert_eq!(args.lockup_id, 1);
        let lockup = AddressDeriver::new(program()).lockup(1).unwrap().address;
        assert!(request.writable_accounts().any(|a| *a == lockup));
    }

    #[tokio::test]
    async fn test_create_lockup_rejects_min_above_cap() {
        let (_, builder) = setup();
        let err = builder
            .create_lockup(&admin(), &Pubkey::new([21u8; 32]), &Pubkey::default(), 1, 10, 11)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidAmount(_)));
    }

    #[tokio::test]
    async fn test_reward_boost_bounds() {
        let (_, builder) = setup();
        assert!(matches!(
            builder.add_reward_boost(&admin(), 0, 100, 0).await,
            Err(ClientError::InvalidAmount(_))
        ));
        assert!(matches!(
            builder.add_reward_boost(&admin(), 0, 100, 10_001).await,
            Err(ClientError::InvalidAmount(_))
        ));
        let request = builder.add_reward_boost(&admin(), 0, 100, 500).await.unwrap();
        let lockup = AddressDeriver::new(program()).lockup(0).unwrap().address;
        let boost = AddressDeriver::new(program())
            .reward_boost(&lockup, 3)
            .unwrap()
            .address;
        assert!(request.writable_accounts().any(|a| *a == boost));
    }

    #[tokio::test]
    async fn test_create_slash_uses_slash_count() {
        let (_, builder) = setup();
        let request = builder.create_slash(&admin(), 0, 500).await.unwrap();
        assert_eq!(
            request.decode_args::<CreateSlashArgs>().unwrap(),
            CreateSlashArgs {
                lockup_id: 0,
                amount: 500
            }
        );
        let lockup = AddressDeriver::new(program()).lockup(0).unwrap().address;
        let slash = AddressDeriver::new(program()).slash(&lockup, 2).unwrap().address;
        assert!(request.writable_accounts().any(|a| *a == slash));
    }

    #[tokio::test]
    async fn test_process_intent_requires_pending_intent() {
        let (ledger, builder) = setup();
        let d = AddressDeriver::new(program());
        let lockup = d.lockup(0).unwrap().address;
        let deposit = d.deposit(&lockup, 0).unwrap().address;
        ledger.set_account(
            deposit,
            Deposit {
                owner: Pubkey::new([11u8; 32]),
                lockup,
                index: 0,
                amount: 10,
                ..Default::default()
            },
        );

        assert!(matches!(
            builder.process_intent(&admin(), 0, 0).await,
            Err(ClientError::NotFound { .. })
        ));

        ledger.set_account(
            d.intent(&deposit).unwrap().address,
            Intent {
                lockup,
                deposit,
                amount: 10,
            },
        );
        let request = builder.process_intent(&admin(), 0, 0).await.unwrap();
        assert_eq!(request.kind, RequestKind::ProcessIntent);
    }
}
