use std::sync::Arc;

use migration::MigratorTrait;
use tracing_subscriber::EnvFilter;

use verigate_server::config::AppConfig;
use verigate_server::mailer::BrevoMailer;
use verigate_server::payments::HttpPaymentGateway;
use verigate_server::{db, router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let db = db::connect(&config).await?;
    migration::Migrator::up(&db, None).await?;

    let http = reqwest::Client::new();
    let state = AppState {
        db,
        config: Arc::new(config.clone()),
        mailer: Arc::new(BrevoMailer::new(http.clone(), config.mailer.clone())),
        gateway: Arc::new(HttpPaymentGateway::new(http, config.gateway.clone())),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "verigate listening");

    axum::serve(listener, router(state)).await?;

    Ok(())
}
