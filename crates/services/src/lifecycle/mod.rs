pub mod contract;
pub mod invoice;
pub mod project;
pub mod scheduler;
pub mod transitions;

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tracing::{error, info};

use crate::dao::base::DaoResult;
use crate::dao::{ContractDao, InvoiceDao, NotificationDao, ProjectDao};
use crate::notify::NotifyService;
use contract::ContractEvaluator;
use invoice::InvoiceEvaluator;
use project::ProjectEvaluator;
use transitions::StatusWrite;

/// Descending day thresholds for the daily reminder ladder.
pub const DAY_LADDER: [i64; 5] = [5, 4, 3, 2, 1];

/// Rolling window within which an hourly alert fingerprint counts as
/// already fired. 59 rather than 60 so a tick landing a few seconds
/// early never swallows the next hour's reminder.
pub const DEDUP_WINDOW_MINUTES: i64 = 59;

/// Role that receives every automated alert.
pub(crate) const ADMIN_ROLE: &str = "Admin";

pub(crate) fn fmt_datetime(dt: bson::DateTime) -> String {
    dt.to_chrono().format("%Y-%m-%d %H:%M UTC").to_string()
}

pub(crate) fn fmt_date(dt: bson::DateTime) -> String {
    dt.to_chrono().format("%Y-%m-%d").to_string()
}

/// The UTC calendar day `days_ahead` days from `now`, as a half-open
/// `[00:00, next 00:00)` range.
pub(crate) fn day_window(now: DateTime<Utc>, days_ahead: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let day = (now + Duration::days(days_ahead)).date_naive();
    let start = day.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

pub(crate) fn today_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    day_window(now, 0)
}

/// Applies transition-engine decisions to the entity store.
pub(crate) struct StatusWriter {
    projects: Arc<ProjectDao>,
    contracts: Arc<ContractDao>,
    invoices: Arc<InvoiceDao>,
}

impl StatusWriter {
    pub(crate) fn new(
        projects: Arc<ProjectDao>,
        contracts: Arc<ContractDao>,
        invoices: Arc<InvoiceDao>,
    ) -> Self {
        Self {
            projects,
            contracts,
            invoices,
        }
    }

    pub(crate) async fn apply(&self, writes: &[StatusWrite]) -> DaoResult<()> {
        for write in writes {
            match *write {
                StatusWrite::Project(id, status) => {
                    info!(%id, %status, "Project status transition");
                    self.projects.set_status(id, status).await?;
                }
                StatusWrite::Contract(id, status) => {
                    info!(%id, %status, "Contract status transition");
                    self.contracts.set_status(id, status).await?;
                }
                StatusWrite::Invoice(id, status) => {
                    info!(%id, %status, "Invoice status transition");
                    self.invoices.set_status(id, status).await?;
                }
            }
        }
        Ok(())
    }
}

/// Owns the three deadline evaluators and exposes the two tick entry
/// points. Each entity kind's pass runs behind its own failure
/// boundary: one kind failing delays its alerts by at most one cadence
/// period and never blocks the others.
pub struct LifecycleService {
    project: ProjectEvaluator,
    contract: ContractEvaluator,
    invoice: InvoiceEvaluator,
}

impl LifecycleService {
    pub fn new(
        projects: Arc<ProjectDao>,
        contracts: Arc<ContractDao>,
        invoices: Arc<InvoiceDao>,
        notifications: Arc<NotificationDao>,
        notify: Arc<NotifyService>,
        grace_days: i64,
    ) -> Self {
        let writer = Arc::new(StatusWriter::new(
            Arc::clone(&projects),
            Arc::clone(&contracts),
            Arc::clone(&invoices),
        ));

        Self {
            project: ProjectEvaluator::new(
                Arc::clone(&projects),
                Arc::clone(&notifications),
                Arc::clone(&notify),
                Arc::clone(&writer),
            ),
            contract: ContractEvaluator::new(
                Arc::clone(&contracts),
                Arc::clone(&projects),
                Arc::clone(&notifications),
                Arc::clone(&notify),
                Arc::clone(&writer),
            ),
            invoice: InvoiceEvaluator::new(
                invoices,
                contracts,
                projects,
                notifications,
                notify,
                writer,
                grace_days,
            ),
        }
    }

    /// The coarse tick: reminder ladders plus the invoice overdue sweep.
    pub async fn run_daily_tick(&self, now: DateTime<Utc>) {
        info!(%now, "Running daily lifecycle tick");
        if let Err(e) = self.project.daily_pass(now).await {
            error!(%e, "Project daily pass failed");
        }
        if let Err(e) = self.contract.daily_pass(now).await {
            error!(%e, "Contract daily pass failed");
        }
        if let Err(e) = self.invoice.daily_pass(now).await {
            error!(%e, "Invoice daily pass failed");
        }
        if let Err(e) = self.invoice.overdue_pass(now).await {
            error!(%e, "Invoice overdue pass failed");
        }
    }

    /// The fine tick: last-day reminders plus past-date transitions.
    pub async fn run_hourly_tick(&self, now: DateTime<Utc>) {
        info!(%now, "Running hourly lifecycle tick");
        if let Err(e) = self.project.hourly_pass(now).await {
            error!(%e, "Project hourly pass failed");
        }
        if let Err(e) = self.contract.hourly_pass(now).await {
            error!(%e, "Contract hourly pass failed");
        }
        if let Err(e) = self.invoice.hourly_pass(now).await {
            error!(%e, "Invoice hourly pass failed");
        }
    }
}
