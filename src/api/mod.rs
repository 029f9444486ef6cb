pub mod deposits;
pub mod health;
pub mod lockups;
pub mod requests;
pub mod settings;

use crate::config::Config;
use crate::domain::Pubkey;
use crate::error::AppError;
use crate::orchestration::InstructionBuilder;
use axum::{
    routing::{get, post},
    Router,
};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub builder: Arc<InstructionBuilder>,
}

impl AppState {
    pub fn new(config: Config, builder: Arc<InstructionBuilder>) -> Self {
        Self { config, builder }
    }
}

/// Parse a base58 key from a query or body field.
pub(crate) fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey, AppError> {
    Pubkey::from_str(value).map_err(|_| AppError::BadRequest(format!("Invalid {} address", field)))
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/settings", get(settings::get_settings))
        .route("/v1/lockups/:lockup_id", get(lockups::get_lockup))
        .route(
            "/v1/lockups/:lockup_id/slashes/:slash_id",
            get(lockups::get_slash),
        )
        .route(
            "/v1/lockups/:lockup_id/deposits/:deposit_id",
            get(deposits::get_deposit),
        )
        .route("/v1/deposits", get(deposits::get_deposits))
        .route("/v1/requests/add-asset", post(requests::add_asset))
        .route("/v1/requests/create-lockup", post(requests::create_lockup))
        .route("/v1/requests/reward-boost", post(requests::add_reward_boost))
        .route("/v1/requests/restake", post(requests::restake))
        .route(
            "/v1/requests/request-withdrawal",
            post(requests::request_withdrawal),
        )
        .route("/v1/requests/intent", post(requests::create_intent))
        .route("/v1/requests/process-intent", post(requests::process_intent))
        .route("/v1/requests/withdraw", post(requests::withdraw))
        .route("/v1/requests/slash", post(requests::create_slash))
        .route("/v1/requests/slash-batch", post(requests::slash_batch))
        .route("/v1/requests/freeze", post(requests::set_frozen))
        .layer(cors)
        .with_state(state)
}
