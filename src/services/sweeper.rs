use std::time::Duration;

use tokio::task::JoinHandle;

use crate::services::attendance::AttendanceService;

/// Background task that closes attendance entries left open too long.
pub async fn run_auto_checkout(service: AttendanceService, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        match service.auto_close_stale_entries().await {
            Ok(closed) if closed.is_empty() => {
                log::debug!("Auto-checkout sweep found nothing to close")
            }
            Ok(closed) => {
                for record in &closed {
                    log::info!(
                        "Auto-closed attendance for {} on {} at {:?}",
                        record.employee_id,
                        record.date,
                        record.exit_time
                    );
                }
            }
            Err(err) => log::error!("Auto-checkout sweep failed: {}", err),
        }
    }
}

pub fn spawn_auto_checkout(service: AttendanceService, every: Duration) -> JoinHandle<()> {
    log::info!("Starting auto-checkout sweep every {:?}", every);
    tokio::spawn(run_auto_checkout(service, every))
}
