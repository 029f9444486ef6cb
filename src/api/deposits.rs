use axum::extract::{Path, Query, State};
use axum::Json;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::api::{parse_pubkey, AppState};
use crate::domain::{Cooldown, Deposit, Pubkey};
use crate::engine::exchange_rate;
use crate::error::{AppError, ClientError};
use crate::orchestration::WithdrawalState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositsQuery {
    pub owner: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositsResponse {
    pub deposit_count: usize,
    pub deposits: Vec<DepositDto>,
    pub cooldowns: Vec<CooldownDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositDto {
    pub address: Pubkey,
    #[serde(flatten)]
    pub deposit: Deposit,
    pub withdrawal: WithdrawalState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownDto {
    pub address: Pubkey,
    #[serde(flatten)]
    pub cooldown: Cooldown,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositDetailResponse {
    pub address: Pubkey,
    pub deposit: Deposit,
    pub withdrawal: WithdrawalState,
    /// Current value of the deposit in asset units; `None` for an empty pool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim: Option<u64>,
}

pub async fn get_deposits(
    Query(params): Query<DepositsQuery>,
    State(state): State<AppState>,
) -> Result<Json<DepositsResponse>, AppError> {
    let owner = parse_pubkey("owner", &params.owner)?;
    let reader = state.builder.reader();

    let deposits = reader.deposits_by_owner(&owner).await?;
    let cooldowns = reader.cooldowns_by_owner(&owner).await?;

    let deposit_futures = deposits.into_iter().map(|(address, deposit)| async move {
        let withdrawal = reader.withdrawal_state(&address, &deposit).await?;
        Ok::<_, ClientError>(DepositDto {
            address,
            deposit,
            withdrawal,
        })
    });
    let deposits = try_join_all(deposit_futures).await?;

    Ok(Json(DepositsResponse {
        deposit_count: deposits.len(),
        deposits,
        cooldowns: cooldowns
            .into_iter()
            .map(|(address, cooldown)| CooldownDto { address, cooldown })
            .collect(),
    }))
}

pub async fn get_deposit(
    Path((lockup_id, deposit_id)): Path<(u64, u64)>,
    State(state): State<AppState>,
) -> Result<Json<DepositDetailResponse>, AppError> {
    let reader = state.builder.reader();
    let (lockup_address, lockup) = reader.lockup(lockup_id).await?;
    let (address, deposit) = reader.deposit(&lockup_address, deposit_id).await?;
    let withdrawal = reader.withdrawal_state(&address, &deposit).await?;

    let claim = match reader.exchange_rate(&lockup_address, &lockup).await {
        Ok(rate) => Some(exchange_rate::deposit_value(deposit.amount, rate)?),
        Err(ClientError::EmptyPool) => None,
        Err(e) => return Err(e.into()),
    };

    Ok(Json(DepositDetailResponse {
        address,
        deposit,
        withdrawal,
        claim,
    }))
}
