//! Ledger-facing layers: typed reads, request assembly and submission flows.

pub mod builder;
pub mod orchestrator;
pub mod reader;

pub use builder::{InstructionBuilder, RestakeRequest, SlashBatchRequest};
pub use orchestrator::{Orchestrator, SlashProgress, WithdrawalOutcome};
pub use reader::{LedgerReader, WithdrawalState};
