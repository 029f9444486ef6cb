pub mod api;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use datasource::{LedgerTransport, MockLedger, MockSubmitter, RpcLedger, Submitter};
pub use domain::{
    Asset, Cooldown, Deposit, Intent, LedgerAccount, Lockup, Pubkey, Request, RequestKind,
    RewardBoost, Settings, Slash, UnixTs,
};
pub use engine::{AddressDeriver, BatchCountPolicy, SlashBatchPlanner};
pub use error::{AppError, ClientError};
pub use orchestration::{InstructionBuilder, LedgerReader, Orchestrator};
