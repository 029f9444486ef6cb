//! Handlers returning ready-to-submit requests. Nothing here signs or submits.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{parse_pubkey, AppState};
use crate::domain::Request;
use crate::error::AppError;
use crate::orchestration::{RestakeRequest, SlashBatchRequest};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAssetBody {
    pub admin: String,
    pub mint: String,
    pub oracle: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLockupBody {
    pub admin: String,
    pub asset_mint: String,
    pub receipt_mint: String,
    pub duration: u64,
    pub deposit_cap: u64,
    pub min_deposit: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardBoostBody {
    pub admin: String,
    pub lockup_id: u64,
    pub min_usd_value: u64,
    pub boost_bps: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestakeBody {
    pub owner: String,
    pub lockup_id: u64,
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalBody {
    pub owner: String,
    pub lockup_id: u64,
    pub deposit_id: u64,
    pub amount: u64,
    /// Explicit boost tier. When absent the best qualifying tier is used.
    pub reward_boost_id: Option<u64>,
    pub auto_boost: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositBody {
    pub owner: String,
    pub lockup_id: u64,
    pub deposit_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentBody {
    pub owner: String,
    pub lockup_id: u64,
    pub deposit_id: u64,
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessIntentBody {
    pub admin: String,
    pub lockup_id: u64,
    pub deposit_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlashBody {
    pub admin: String,
    pub lockup_id: u64,
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashBatchBody {
    pub admin: String,
    pub lockup_id: u64,
    pub slash_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreezeBody {
    pub admin: String,
    pub freeze: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashBatchResponse {
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<SlashBatchRequest>,
}

pub async fn add_asset(
    State(state): State<AppState>,
    Json(body): Json<AddAssetBody>,
) -> Result<Json<Request>, AppError> {
    let admin = parse_pubkey("admin", &body.admin)?;
    let mint = parse_pubkey("mint", &body.mint)?;
    let oracle = parse_pubkey("oracle", &body.oracle)?;
    Ok(Json(state.builder.add_asset(&admin, &mint, &oracle).await?))
}

pub async fn create_lockup(
    State(state): State<AppState>,
    Json(body): Json<CreateLockupBody>,
) -> Result<Json<Request>, AppError> {
    let admin = parse_pubkey("admin", &body.admin)?;
    let asset_mint = parse_pubkey("assetMint", &body.asset_mint)?;
    let receipt_mint = parse_pubkey("receiptMint", &body.receipt_mint)?;
    let request = state
        .builder
        .create_lockup(
            &admin,
            &asset_mint,
            &receipt_mint,
            body.duration,
            body.deposit_cap,
            body.min_deposit,
        )
        .await?;
    Ok(Json(request))
}

pub async fn add_reward_boost(
    State(state): State<AppState>,
    Json(body): Json<RewardBoostBody>,
) -> Result<Json<Request>, AppError> {
    let admin = parse_pubkey("admin", &body.admin)?;
    let request = state
        .builder
        .add_reward_boost(&admin, body.lockup_id, body.min_usd_value, body.boost_bps)
        .await?;
    Ok(Json(request))
}

pub async fn restake(
    State(state): State<AppState>,
    Json(body): Json<RestakeBody>,
) -> Result<Json<RestakeRequest>, AppError> {
    let owner = parse_pubkey("owner", &body.owner)?;
    Ok(Json(
        state
            .builder
            .restake(&owner, body.lockup_id, body.amount)
            .await?,
    ))
}

pub async fn request_withdrawal(
    State(state): State<AppState>,
    Json(body): Json<WithdrawalBody>,
) -> Result<Json<Request>, AppError> {
    let owner = parse_pubkey("owner", &body.owner)?;
    let builder = &state.builder;

    let request = match (body.reward_boost_id, body.auto_boost.unwrap_or(true)) {
        (Some(boost_id), _) => {
            let (lockup_address, _) = builder.reader().lockup(body.lockup_id).await?;
            let boost = builder.reader().reward_boost(&lockup_address, boost_id).await?;
            builder
                .request_withdrawal(
                    &owner,
                    body.lockup_id,
                    body.deposit_id,
                    body.amount,
                    Some(&boost),
                )
                .await?
        }
        (None, true) => {
            builder
                .request_withdrawal_auto(&owner, body.lockup_id, body.deposit_id, body.amount)
                .await?
        }
        (None, false) => {
            builder
                .request_withdrawal(&owner, body.lockup_id, body.deposit_id, body.amount, None)
                .await?
        }
    };
    Ok(Json(request))
}

pub async fn create_intent(
    State(state): State<AppState>,
    Json(body): Json<IntentBody>,
) -> Result<Json<Request>, AppError> {
    let owner = parse_pubkey("owner", &body.owner)?;
    let request = state
        .builder
        .create_intent(&owner, body.lockup_id, body.deposit_id, body.amount)
        .await?;
    Ok(Json(request))
}

pub async fn process_intent(
    State(state): State<AppState>,
    Json(body): Json<ProcessIntentBody>,
) -> Result<Json<Request>, AppError> {
    let admin = parse_pubkey("admin", &body.admin)?;
    let request = state
        .builder
        .process_intent(&admin, body.lockup_id, body.deposit_id)
        .await?;
    Ok(Json(request))
}

pub async fn withdraw(
    State(state): State<AppState>,
    Json(body): Json<DepositBody>,
) -> Result<Json<Request>, AppError> {
    let owner = parse_pubkey("owner", &body.owner)?;
    let now = state.builder.reader().now().await?;
    let request = state
        .builder
        .withdraw(&owner, body.lockup_id, body.deposit_id, now)
        .await?;
    Ok(Json(request))
}

pub async fn create_slash(
    State(state): State<AppState>,
    Json(body): Json<CreateSlashBody>,
) -> Result<Json<Request>, AppError> {
    let admin = parse_pubkey("admin", &body.admin)?;
    let request = state
        .builder
        .create_slash(&admin, body.lockup_id, body.amount)
        .await?;
    Ok(Json(request))
}

pub async fn slash_batch(
    State(state): State<AppState>,
    Json(body): Json<SlashBatchBody>,
) -> Result<Json<SlashBatchResponse>, AppError> {
    let admin = parse_pubkey("admin", &body.admin)?;
    let batch = state
        .builder
        .slash_batch(&admin, body.lockup_id, body.slash_id)
        .await?;
    Ok(Json(SlashBatchResponse {
        complete: batch.is_none(),
        batch,
    }))
}

pub async fn set_frozen(
    State(state): State<AppState>,
    Json(body): Json<FreezeBody>,
) -> Result<Json<Request>, AppError> {
    let admin = parse_pubkey("admin", &body.admin)?;
    Ok(Json(state.builder.set_frozen(&admin, body.freeze).await?))
}
