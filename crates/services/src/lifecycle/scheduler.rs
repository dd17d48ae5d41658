use std::sync::Arc;

use chrono::Utc;
use crewhub_config::SchedulerSettings;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::info;

use super::LifecycleService;

/// Registers the two cron cadences and starts the scheduler. Missed
/// ticks are not backfilled: the next natural tick evaluates state as
/// of that later time. Returns the scheduler handle so the caller can
/// keep it alive (or shut it down in tests).
pub async fn start(
    settings: &SchedulerSettings,
    service: Arc<LifecycleService>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let daily = {
        let service = Arc::clone(&service);
        Job::new_async(settings.daily_cron.as_str(), move |_uuid, _lock| {
            let service = Arc::clone(&service);
            Box::pin(async move {
                service.run_daily_tick(Utc::now()).await;
            })
        })?
    };
    scheduler.add(daily).await?;

    let hourly = {
        let service = Arc::clone(&service);
        Job::new_async(settings.hourly_cron.as_str(), move |_uuid, _lock| {
            let service = Arc::clone(&service);
            Box::pin(async move {
                service.run_hourly_tick(Utc::now()).await;
            })
        })?
    };
    scheduler.add(hourly).await?;

    scheduler.start().await?;
    info!(
        daily = %settings.daily_cron,
        hourly = %settings.hourly_cron,
        "Lifecycle scheduler started"
    );

    Ok(scheduler)
}
