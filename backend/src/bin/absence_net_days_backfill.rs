use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timeclock_backend::{
    config::Config,
    db::connection::{create_pool, run_migrations},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "timeclock_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    run_migrations(&pool).await?;

    let state = AppState::from_pool(config, pool);
    let updated = state.absences.backfill_net_days().await?;
    if updated > 0 {
        tracing::info!("Updated net days of {} absences", updated);
    }

    Ok(())
}
