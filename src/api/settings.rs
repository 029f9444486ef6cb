use crate::api::AppState;
use crate::domain::{Pubkey, Settings};
use crate::error::AppError;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub address: Pubkey,
    pub settings: Settings,
}

pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<SettingsResponse>, AppError> {
    let address = state.builder.reader().deriver().settings()?.address;
    let settings = state.builder.reader().settings().await?;
    Ok(Json(SettingsResponse { address, settings }))
}
