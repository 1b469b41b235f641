use std::sync::Arc;

use meshrelay_api::app;
use meshrelay_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    meshrelay_observability::init();

    let config = AppConfig::from_env()?;
    let services = app::services::build_services(&config)?;
    let app = app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
