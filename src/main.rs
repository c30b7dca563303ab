use axum::extract::DefaultBodyLimit;
use refconnect_backend::{
    config::Config, database::pool::create_pool, middleware::cors::permissive_cors, routes,
    AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("refconnect_backend=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    let app_state = AppState::new(pool, &config)?;

    let app = routes::router(app_state)
        .layer(permissive_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
