//! Runs a single auto-stop sweep and exits. Intended for external cron use.

use logbook_backend::{
    config::Config, db::connection::create_pool, init_tracing, state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;
    let state = AppState::from_pool(pool, config);

    let now = state.schedule_service.clock().now();
    let report = state
        .schedule_service
        .process_scheduled_sessions(now)
        .await?;

    for (session_id, err) in &report.failures {
        tracing::warn!(session_id = %session_id, error = %err, "Session left for next sweep");
    }
    tracing::info!(
        completed = report.completed,
        failed = report.failed(),
        "Auto-stop sweep finished"
    );

    Ok(())
}
