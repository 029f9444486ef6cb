use restake_client::datasource::RpcLedger;
use restake_client::{
    api, config::Config, AddressDeriver, InstructionBuilder, LedgerReader, LedgerTransport,
    SlashBatchPlanner,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    let transport: Arc<dyn LedgerTransport> = Arc::new(RpcLedger::with_max_elapsed(
        config.rpc_url.clone(),
        Duration::from_secs(config.rpc_max_elapsed_secs),
    ));
    let deriver = AddressDeriver::new(config.program_id);
    let reader = LedgerReader::new(transport, deriver);
    let planner = SlashBatchPlanner::new(deriver, config.batch_count_policy);
    let builder = Arc::new(InstructionBuilder::new(reader, planner, config.admin_index));

    tracing::info!(
        "Serving program {} via {} (batch count {:?})",
        config.program_id,
        config.rpc_url,
        config.batch_count_policy
    );

    // Create router
    let app = api::create_router(api::AppState::new(config, builder));

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
