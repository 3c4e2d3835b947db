use std::net::SocketAddr;

use logbook_backend::{
    config::{mask_secret, Config},
    db::connection::create_pool,
    init_tracing,
    routes::build_router,
    scheduler::AutoStopScheduler,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load()?;
    tracing::info!(
        database_url = %mask_secret(&config.database_url),
        jwt_secret = %mask_secret(&config.jwt_secret),
        port = config.port,
        app_env = %config.app_env,
        allowed_origins = ?config.allowed_origins,
        auto_stop_interval_seconds = config.auto_stop_interval_seconds,
        auto_stop_tick_timeout_seconds = config.auto_stop_tick_timeout_seconds,
        rate_limit_user_max_requests = config.rate_limit_user_max_requests,
        rate_limit_user_window_seconds = config.rate_limit_user_window_seconds,
        "Loaded configuration from environment/.env"
    );

    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let state = AppState::from_pool(pool, config.clone());

    let scheduler = AutoStopScheduler::new(
        state.schedule_service.clone(),
        config.auto_stop_interval(),
        config.auto_stop_tick_timeout(),
    )
    .start();

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    tracing::info!("Stopping auto-stop scheduler");
    scheduler.stop().await;

    served?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
