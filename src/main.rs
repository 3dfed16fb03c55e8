extern crate pretty_env_logger;
#[macro_use]
extern crate log;

use std::sync::Arc;

use photomarket::config::Config;
use photomarket::db::open_store;
use photomarket::error::expose_internal_details;
use photomarket::identity::SupabaseAuth;
use photomarket::{router, AppState};

#[tokio::main]
async fn main() {
    pretty_env_logger::init();
    if let Err(e) = run().await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;
    expose_internal_details(!config.is_production());

    let store = open_store(&config).await?;
    let identity = Arc::new(SupabaseAuth::new(&config)?);
    let app = router(AppState::new(store, identity));

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Listening on {} ({})", config.bind_address, config.environment);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
