use std::sync::Arc;

use anyhow::Result;

use rollcall::database::init_database;
use rollcall::services::spawn_auto_checkout;
use rollcall::{AttendanceService, Config, SystemClock};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    log::info!("Starting rollcall (environment: {})", config.environment);

    let pool = init_database(&config.database_url, config.database_max_connections).await?;

    let attendance = AttendanceService::new(
        pool.clone(),
        Arc::new(SystemClock),
        config.attendance_policy(),
    );
    let sweeper = spawn_auto_checkout(attendance, config.sweep_interval());

    tokio::signal::ctrl_c().await?;
    log::info!("Shutdown requested, stopping auto-checkout sweep");
    sweeper.abort();
    pool.close().await;

    Ok(())
}
