use crate::config::SimulatorConfig;
use crate::errors::ServiceError;
use crate::notifier::AlertNotifier;
use crate::services::simulator::floor_hour;
use crate::services::{DetectorService, MaintenanceService, SimulatorService};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Background worker that fires one simulation cycle at every top of
/// hour. Cycle failures are logged and the loop keeps running.
pub fn start_scheduler(
    simulator: SimulatorService,
    detector: DetectorService,
    notifier: Arc<dyn AlertNotifier>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Hourly simulation trigger armed");
        loop {
            tokio::time::sleep(until_next_hour()).await;
            if let Err(e) = run_cycle(&simulator, &detector, &notifier).await {
                error!(error = %e, "Simulation cycle failed");
            }
        }
    })
}

fn until_next_hour() -> std::time::Duration {
    let now = Utc::now();
    let next = floor_hour(now) + Duration::hours(1);
    (next - now)
        .to_std()
        .unwrap_or_else(|_| std::time::Duration::from_secs(1))
}

/// One trigger firing: generate the current hour's readings, run the
/// detection passes, and hand any new alerts to the notifier without
/// waiting for delivery.
pub async fn run_cycle(
    simulator: &SimulatorService,
    detector: &DetectorService,
    notifier: &Arc<dyn AlertNotifier>,
) -> Result<(), ServiceError> {
    let readings = simulator.generate(None).await?;
    let alerts = detector.detect_all().await?;
    info!(
        readings = readings.len(),
        alerts = alerts.len(),
        "Simulation cycle completed"
    );

    if !alerts.is_empty() {
        let notifier = Arc::clone(notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&alerts).await {
                warn!(error = %e, "Alert notification failed");
            }
        });
    }
    Ok(())
}

/// Housekeeping run once at startup, before the trigger is armed.
/// Failures are logged and do not prevent the service from starting.
pub async fn run_startup_maintenance(maintenance: &MaintenanceService, cfg: &SimulatorConfig) {
    match maintenance.cleanup_expired_alerts(cfg.retention_days).await {
        Ok(removed) => info!(removed, "Startup alert cleanup finished"),
        Err(e) => error!(error = %e, "Startup alert cleanup failed"),
    }
    match maintenance.backfill_missing_data(cfg.backfill_days).await {
        Ok(hours) => info!(hours, "Startup backfill finished"),
        Err(e) => error!(error = %e, "Startup backfill failed"),
    }
}
