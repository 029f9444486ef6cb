//! Pure computation engines: no I/O, deterministic for identical inputs.

pub mod address;
pub mod boost;
pub mod exchange_rate;
pub mod slash_plan;

pub use address::{associated_token_address, AddressDeriver, Derived, Seed, VaultKind};
pub use exchange_rate::{PoolBalances, BPS_DENOMINATOR};
pub use slash_plan::{BatchCountPolicy, PlannedDeposit, SlashBatchPlanner, SLASH_BATCH_SIZE};
