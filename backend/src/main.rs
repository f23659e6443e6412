use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timeclock_backend::{
    config::Config,
    db::connection::{create_pool, run_migrations},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "timeclock_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        time_zone = %config.time_zone,
        workweek_default_hours = config.workweek_default_hours,
        correction_reason_min_length = config.correction_reason_min_length,
        overtime_sweep_on_start = config.overtime_sweep_on_start,
        "Loaded configuration from environment/.env"
    );

    // Initialize database
    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    run_migrations(&pool).await?;

    let state = AppState::from_pool(config, pool);

    if state.config.overtime_sweep_on_start {
        match state.ledger.calculate_missing_months().await {
            Ok(report) => tracing::info!(
                computed = report.computed,
                failed = report.failed,
                "Overtime sweep finished"
            ),
            Err(err) => tracing::error!(error = %err, "Overtime sweep could not start"),
        }
    }

    Ok(())
}
