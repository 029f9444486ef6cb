#![allow(dead_code)]

use restake_client::datasource::{MockLedger, MockSubmitter};
use restake_client::engine::VaultKind;
use restake_client::{
    AddressDeriver, Asset, BatchCountPolicy, Deposit, InstructionBuilder, LedgerReader, Lockup,
    Orchestrator, Pubkey, RewardBoost, Settings, Slash,
};
use std::sync::Arc;

pub const NOW: i64 = 1_700_000_000;

pub fn program_id() -> Pubkey {
    Pubkey::new([7u8; 32])
}

pub fn owner() -> Pubkey {
    Pubkey::new([11u8; 32])
}

pub fn stranger() -> Pubkey {
    Pubkey::new([12u8; 32])
}

pub fn admin() -> Pubkey {
    Pubkey::new([13u8; 32])
}

pub fn asset_mint() -> Pubkey {
    Pubkey::new([21u8; 32])
}

pub fn receipt_mint() -> Pubkey {
    Pubkey::new([22u8; 32])
}

pub fn reward_mint() -> Pubkey {
    Pubkey::new([23u8; 32])
}

pub fn oracle() -> Pubkey {
    Pubkey::new([24u8; 32])
}

/// One lockup (id 0) over a mock ledger with the given pool balances.
pub struct Fixture {
    pub ledger: Arc<MockLedger>,
    pub deriver: AddressDeriver,
    pub lockup_address: Pubkey,
    pub lockup: Lockup,
}

impl Fixture {
    pub fn new(hot: u64, cold: u64, supply: u64) -> Self {
        let deriver = AddressDeriver::new(program_id());
        let lockup_address = deriver.lockup(0).unwrap().address;
        let lockup = Lockup {
            index: 0,
            asset_mint: asset_mint(),
            receipt_mint: receipt_mint(),
            duration: 86_400,
            deposit_cap: 0,
            min_deposit: 10,
            deposits: 0,
            reward_exchange_rate: 0,
            slash_count: 0,
            reward_boosts: 0,
        };
        let settings = Settings {
            frozen: false,
            cold_share_bps: 3_000,
            hot_share_bps: 7_000,
            lockup_count: 1,
            asset_count: 1,
            reward_mint: reward_mint(),
            cooldown_duration: 86_400,
        };
        let asset = Asset {
            mint: asset_mint(),
            oracle: oracle(),
            total_value_locked: hot + cold,
            deposit_count: 0,
            lockup_count: 1,
        };

        let hot_vault = deriver
            .vault(VaultKind::Hot, &lockup_address, &asset_mint())
            .unwrap()
            .address;
        let cold_vault = deriver
            .vault(VaultKind::Cold, &lockup_address, &asset_mint())
            .unwrap()
            .address;

        let ledger = MockLedger::new(program_id())
            .with_account(deriver.settings().unwrap().address, settings)
            .with_account(deriver.asset(&asset_mint()).unwrap().address, asset)
            .with_account(lockup_address, lockup.clone())
            .with_token_balance(hot_vault, hot)
            .with_token_balance(cold_vault, cold)
            .with_mint_supply(receipt_mint(), supply)
            .with_clock(NOW);

        Self {
            ledger: Arc::new(ledger),
            deriver,
            lockup_address,
            lockup,
        }
    }

    pub fn update_lockup(&mut self, f: impl FnOnce(&mut Lockup)) {
        f(&mut self.lockup);
        self.ledger.set_account(self.lockup_address, self.lockup.clone());
    }

    pub fn update_settings(&self, f: impl FnOnce(&mut Settings)) {
        let mut settings = Settings {
            lockup_count: 1,
            asset_count: 1,
            reward_mint: reward_mint(),
            cooldown_duration: 86_400,
            cold_share_bps: 3_000,
            hot_share_bps: 7_000,
            frozen: false,
        };
        f(&mut settings);
        self.ledger
            .set_account(self.deriver.settings().unwrap().address, settings);
    }

    /// Add deposit `id` owned by `owner` holding `amount` receipt units.
    pub fn add_deposit(&mut self, id: u64, owner: Pubkey, amount: u64, usd_value: u64) -> Pubkey {
        let address = self.deriver.deposit(&self.lockup_address, id).unwrap().address;
        self.ledger.set_account(
            address,
            Deposit {
                owner,
                lockup: self.lockup_address,
                index: id,
                amount,
                initial_usd_value: usd_value,
                amount_slashed: 0,
                unlock_ts: NOW + 86_400,
            },
        );
        if self.lockup.deposits <= id {
            self.update_lockup(|l| l.deposits = id + 1);
        }
        address
    }

    pub fn add_boost(&mut self, index: u64, min_usd_value: u64, boost_bps: u64) -> RewardBoost {
        let boost = RewardBoost {
            lockup: self.lockup_address,
            index,
            min_usd_value,
            boost_bps,
        };
        let address = self
            .deriver
            .reward_boost(&self.lockup_address, index)
            .unwrap()
            .address;
        self.ledger.set_account(address, boost.clone());
        if self.lockup.reward_boosts <= index {
            self.update_lockup(|l| l.reward_boosts = index + 1);
        }
        boost
    }

    pub fn add_slash(&mut self, index: u64, target_accounts: u64, slashed_accounts: u64) -> Pubkey {
        let address = self
            .deriver
            .slash(&self.lockup_address, index)
            .unwrap()
            .address;
        self.ledger.set_account(
            address,
            Slash {
                index,
                target_amount: 1_000,
                target_accounts,
                slashed_accounts,
                slashed_amount: 0,
            },
        );
        if self.lockup.slash_count <= index {
            self.update_lockup(|l| l.slash_count = index + 1);
        }
        address
    }

    pub fn reader(&self) -> LedgerReader {
        LedgerReader::new(self.ledger.clone(), self.deriver)
    }

    pub fn builder(&self) -> InstructionBuilder {
        self.builder_with_policy(BatchCountPolicy::Ceil)
    }

    pub fn builder_with_policy(&self, policy: BatchCountPolicy) -> InstructionBuilder {
        InstructionBuilder::new(
            self.reader(),
            restake_client::SlashBatchPlanner::new(self.deriver, policy),
            0,
        )
    }

    pub fn orchestrator(&self, submitter: Arc<MockSubmitter>) -> Orchestrator {
        Orchestrator::new(self.builder(), submitter)
    }
}
