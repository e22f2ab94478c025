use oil_miniapp_backend::{
    config::{get_config, init_config},
    database::pool::{create_pool, run_migrations},
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    init_config()?;
    let config = get_config();

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    info!("Database ready");

    let app_state = AppState::new(pool, config)?;
    info!(
        notify_per_second = config.notify_per_second,
        notify_max_concurrent = config.notify_max_concurrent,
        jwt_expires_in = %config.jwt_expires_in,
        "Application state initialized"
    );

    info!("Serving uploads from: {}", config.uploads_dir);
    let app = routes::app_router(app_state, &config.uploads_dir, config.webapp_rps);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
