//! Ready-to-submit state-transition requests.

use crate::domain::accounts::{discriminator, DISCRIMINATOR_LEN};
use crate::domain::Pubkey;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize, Serializer};

/// One account touched by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn writable(pubkey: Pubkey) -> Self {
        Self {
            pubkey,
            is_signer: false,
            is_writable: true,
        }
    }

    pub fn readonly(pubkey: Pubkey) -> Self {
        Self {
            pubkey,
            is_signer: false,
            is_writable: false,
        }
    }

    pub fn signer(pubkey: Pubkey) -> Self {
        Self {
            pubkey,
            is_signer: true,
            is_writable: true,
        }
    }
}

/// Operation a request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestKind {
    AddAsset,
    CreateLockup,
    AddRewardBoost,
    Restake,
    RequestWithdrawal,
    CreateIntent,
    ProcessIntent,
    Withdraw,
    CreateSlash,
    SlashDeposits,
    ManageFreeze,
}

impl RequestKind {
    pub fn method_name(&self) -> &'static str {
        match self {
            RequestKind::AddAsset => "add_asset",
            RequestKind::CreateLockup => "create_lockup",
            RequestKind::AddRewardBoost => "add_reward_boost",
            RequestKind::Restake => "restake",
            RequestKind::RequestWithdrawal => "request_withdrawal",
            RequestKind::CreateIntent => "create_intent",
            RequestKind::ProcessIntent => "process_intent",
            RequestKind::Withdraw => "withdraw",
            RequestKind::CreateSlash => "create_slash",
            RequestKind::SlashDeposits => "slash_deposits",
            RequestKind::ManageFreeze => "manage_freeze",
        }
    }

    pub fn discriminator(&self) -> [u8; DISCRIMINATOR_LEN] {
        discriminator("global", self.method_name())
    }
}

/// A fully-populated request: program, ordered accounts, encoded arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub kind: RequestKind,
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    #[serde(serialize_with = "serialize_hex")]
    pub data: Vec<u8>,
}

fn serialize_hex<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(data))
}

impl Request {
    /// Encode `args` behind the method discriminator.
    pub fn encode<A: BorshSerialize>(
        kind: RequestKind,
        program_id: Pubkey,
        accounts: Vec<AccountMeta>,
        args: &A,
    ) -> std::io::Result<Self> {
        let mut data = kind.discriminator().to_vec();
        args.serialize(&mut data)?;
        Ok(Self {
            kind,
            program_id,
            accounts,
            data,
        })
    }

    /// Decode the argument body back into `A`.
    pub fn decode_args<A: BorshDeserialize>(&self) -> std::io::Result<A> {
        let mut body = self.data.get(DISCRIMINATOR_LEN..).unwrap_or_default();
        A::deserialize(&mut body)
    }

    pub fn writable_accounts(&self) -> impl Iterator<Item = &Pubkey> {
        self.accounts
            .iter()
            .filter(|m| m.is_writable)
            .map(|m| &m.pubkey)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct AddAssetArgs {
    pub oracle: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CreateLockupArgs {
    pub lockup_id: u64,
    pub duration: u64,
    pub deposit_cap: u64,
    pub min_deposit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct AddRewardBoostArgs {
    pub lockup_id: u64,
    pub min_usd_value: u64,
    pub boost_bps: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct RestakeArgs {
    pub lockup_id: u64,
    pub amount: u64,
    pub min_receipt_amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct RequestWithdrawalArgs {
    pub lockup_id: u64,
    pub deposit_id: u64,
    pub receipt_amount: u64,
    pub reward_boost_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CreateIntentArgs {
    pub lockup_id: u64,
    pub deposit_id: u64,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct DepositRefArgs {
    pub lockup_id: u64,
    pub deposit_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CreateSlashArgs {
    pub lockup_id: u64,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SlashDepositsArgs {
    pub lockup_id: u64,
    pub slash_id: u64,
    pub first_deposit_id: u64,
    pub count: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ManageFreezeArgs {
    pub freeze: bool,
}
