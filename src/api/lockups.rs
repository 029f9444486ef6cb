use crate::api::AppState;
use crate::domain::{Lockup, Pubkey, RewardBoost, Slash};
use crate::engine::{exchange_rate, PlannedDeposit, PoolBalances};
use crate::error::{AppError, ClientError};
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockupResponse {
    pub address: Pubkey,
    pub lockup: Lockup,
    pub pool: PoolBalances,
    /// `None` while the receipt supply is zero.
    pub exchange_rate_bps: Option<u64>,
    pub reward_boosts: Vec<RewardBoost>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashResponse {
    pub address: Pubkey,
    pub slash: Slash,
    pub remaining_batches: u64,
    pub next_batch: Vec<PlannedDeposit>,
}

pub async fn get_lockup(
    Path(lockup_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<LockupResponse>, AppError> {
    let reader = state.builder.reader();
    let (address, lockup) = reader.lockup(lockup_id).await?;
    let pool = reader.pool_balances(&address, &lockup).await?;
    let exchange_rate_bps = match exchange_rate::rate(&pool) {
        Ok(rate) => Some(rate),
        Err(ClientError::EmptyPool) => None,
        Err(e) => return Err(e.into()),
    };
    let reward_boosts = reader.reward_boosts(&address).await?;

    Ok(Json(LockupResponse {
        address,
        lockup,
        pool,
        exchange_rate_bps,
        reward_boosts,
    }))
}

pub async fn get_slash(
    Path((lockup_id, slash_id)): Path<(u64, u64)>,
    State(state): State<AppState>,
) -> Result<Json<SlashResponse>, AppError> {
    let reader = state.builder.reader();
    let (lockup_address, _) = reader.lockup(lockup_id).await?;
    let address = reader.deriver().slash(&lockup_address, slash_id)?.address;
    let slash = reader.slash(&lockup_address, slash_id).await?;
    let planner = state.builder.planner();

    Ok(Json(SlashResponse {
        address,
        remaining_batches: planner.remaining_batches(&slash),
        next_batch: planner.plan_batch(&lockup_address, &slash)?,
        slash,
    }))
}
