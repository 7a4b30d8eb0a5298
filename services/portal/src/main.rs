use std::sync::Arc;

use anyhow::Result;
use common::{config::BackendConfig, supabase::SupabaseClient};
use portal::{AppState, config::PortalConfig, create_router};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting graduation portal");

    let portal_config = PortalConfig::from_env()?;
    let backend_config = BackendConfig::from_env()?;

    let client = Arc::new(SupabaseClient::new(&backend_config)?);
    let app_state = AppState::new(client.clone(), client, &portal_config);

    let app = create_router(app_state);

    let listener = TcpListener::bind(&portal_config.bind_addr).await?;
    info!("Graduation portal listening on {}", portal_config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
