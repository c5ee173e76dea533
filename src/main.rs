use std::net::SocketAddr;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use staffdesk::config::Config;
use staffdesk::state::SharedState;

const LIMITER_SWEEP_EVERY: Duration = Duration::from_secs(5 * 60);
const LIMITER_MAX_AGE: Duration = Duration::from_secs(30 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting staffdesk");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations applied");

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tracing::info!(dir = %config.upload_dir.display(), "Photo uploads directory ready");

    let addr = SocketAddr::new(config.host, config.port);
    let (app, state) = staffdesk::build_app(pool, config);
    spawn_limiter_sweeper(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Periodically forget login failures whose window ended long ago.
fn spawn_limiter_sweeper(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_SWEEP_EVERY);
        loop {
            interval.tick().await;
            state.login_limiter.cleanup(LIMITER_MAX_AGE);
            tracing::debug!(tracked = state.login_limiter.len(), "Login limiter swept");
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
