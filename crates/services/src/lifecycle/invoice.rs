use std::sync::Arc;

use bson::doc;
use chrono::{DateTime, Duration, Utc};
use crewhub_db::models::{AlertMeta, Contract, ContractStatus, Invoice, NotificationKind, Project};
use tracing::{debug, error};

use super::transitions::{
    self, ContractState, EntitySnapshot, InvoiceState, ProjectState, StatusWrite,
};
use super::{
    ADMIN_ROLE, DAY_LADDER, DEDUP_WINDOW_MINUTES, StatusWriter, day_window, fmt_date,
    fmt_datetime, today_window,
};
use crate::dao::base::DaoResult;
use crate::dao::{ContractDao, InvoiceDao, NotificationDao, ProjectDao};
use crate::notify::NotifyService;

/// Watches invoice due dates. Besides the shared ladder and last-day
/// cadences, carries the overdue sweep: a Pending invoice left unpaid
/// past the grace period goes Overdue and cancels its contract and
/// pushes its project.
pub struct InvoiceEvaluator {
    invoices: Arc<InvoiceDao>,
    contracts: Arc<ContractDao>,
    projects: Arc<ProjectDao>,
    notifications: Arc<NotificationDao>,
    notify: Arc<NotifyService>,
    writer: Arc<StatusWriter>,
    grace_days: i64,
}

impl InvoiceEvaluator {
    pub(crate) fn new(
        invoices: Arc<InvoiceDao>,
        contracts: Arc<ContractDao>,
        projects: Arc<ProjectDao>,
        notifications: Arc<NotificationDao>,
        notify: Arc<NotifyService>,
        writer: Arc<StatusWriter>,
        grace_days: i64,
    ) -> Self {
        Self {
            invoices,
            contracts,
            projects,
            notifications,
            notify,
            writer,
            grace_days,
        }
    }

    pub async fn daily_pass(&self, now: DateTime<Utc>) -> DaoResult<()> {
        for days in DAY_LADDER {
            let (start, end) = day_window(now, days);
            let invoices = self.invoices.find_pending_due_between(start, end).await?;

            for invoice in &invoices {
                if let Err(e) = self.days_left_alert(invoice, days).await {
                    error!(%e, invoice = %invoice.invoice_number, days, "Invoice ladder alert failed");
                }
            }
        }
        Ok(())
    }

    pub async fn hourly_pass(&self, now: DateTime<Utc>) -> DaoResult<()> {
        let (start, end) = today_window(now);
        let due_today = self.invoices.find_pending_due_between(start, end).await?;
        for invoice in &due_today {
            if let Err(e) = self.last_day_alert(invoice, now).await {
                error!(%e, invoice = %invoice.invoice_number, "Invoice last-day alert failed");
            }
        }
        Ok(())
    }

    /// Runs with the daily cadence. Fires at most once ever per invoice.
    pub async fn overdue_pass(&self, now: DateTime<Utc>) -> DaoResult<()> {
        let cutoff = now - Duration::days(self.grace_days);
        let overdue = self.invoices.find_pending_due_before(cutoff).await?;

        for invoice in &overdue {
            if let Err(e) = self.escalate_overdue(invoice, now).await {
                error!(%e, invoice = %invoice.invoice_number, "Invoice overdue escalation failed");
            }
        }
        Ok(())
    }

    async fn linked_project(&self, invoice: &Invoice) -> DaoResult<Option<Project>> {
        self.projects
            .base
            .find_one(doc! { "_id": invoice.project_id })
            .await
    }

    async fn linked_contract(&self, invoice: &Invoice) -> DaoResult<Option<Contract>> {
        self.contracts
            .base
            .find_one(doc! { "_id": invoice.contract_id })
            .await
    }

    async fn days_left_alert(&self, invoice: &Invoice, days: i64) -> DaoResult<()> {
        let Some(invoice_id) = invoice.id else {
            return Ok(());
        };
        let meta = AlertMeta::InvoiceDaysLeft {
            invoice_id,
            project_id: invoice.project_id,
            days,
        };
        if self.notifications.already_sent(&meta).await? {
            debug!(invoice = %invoice.invoice_number, days, "Ladder alert already sent");
            return Ok(());
        }

        let project = self.linked_project(invoice).await?;
        let project_name = project
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("Unknown Project");
        let title = format!("Invoice Due Soon - {days} Day(s) Left");
        let body = format!(
            "The invoice {} for project \"{project_name}\" is due on {} and is still pending \
             payment. Please follow up with the client before the due date.",
            invoice.invoice_number,
            fmt_date(invoice.due_date),
        );

        self.notify
            .notify_role_and_team(
                ADMIN_ROLE,
                Some(invoice.project_id),
                &title,
                &body,
                Some(meta),
                NotificationKind::System,
            )
            .await?;
        Ok(())
    }

    async fn last_day_alert(&self, invoice: &Invoice, now: DateTime<Utc>) -> DaoResult<()> {
        let Some(invoice_id) = invoice.id else {
            return Ok(());
        };
        let meta = AlertMeta::InvoiceLastDay {
            invoice_id,
            project_id: invoice.project_id,
        };
        let since = now - Duration::minutes(DEDUP_WINDOW_MINUTES);
        if self.notifications.already_sent_since(&meta, since).await? {
            return Ok(());
        }

        let project = self.linked_project(invoice).await?;
        let project_name = project
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("Unknown Project");
        let title = "Invoice Due Today - Final Hours".to_string();
        let body = format!(
            "The invoice {} for project \"{project_name}\" is due today ({}) and is still \
             pending payment.",
            invoice.invoice_number,
            fmt_datetime(invoice.due_date),
        );

        self.notify
            .notify_role_and_team(
                ADMIN_ROLE,
                Some(invoice.project_id),
                &title,
                &body,
                Some(meta),
                NotificationKind::System,
            )
            .await?;
        Ok(())
    }

    async fn escalate_overdue(&self, invoice: &Invoice, now: DateTime<Utc>) -> DaoResult<()> {
        let Some(invoice_id) = invoice.id else {
            return Ok(());
        };
        let meta = AlertMeta::InvoiceOverdue {
            invoice_id,
            contract_id: invoice.contract_id,
            project_id: invoice.project_id,
            grace_days: self.grace_days,
        };
        if self.notifications.already_sent(&meta).await? {
            return Ok(());
        }

        let project = self.linked_project(invoice).await?;
        let contract = self.linked_contract(invoice).await?;

        let snapshot = EntitySnapshot {
            project: project.as_ref().and_then(|p| {
                p.id.map(|id| ProjectState {
                    id,
                    status: p.status,
                    deadline: p.deadline.map(|d| d.to_chrono()),
                })
            }),
            contract: contract.as_ref().and_then(|c| {
                c.id.map(|id| ContractState {
                    id,
                    status: c.status,
                    end_date: c.end_date.to_chrono(),
                })
            }),
            invoice: Some(InvoiceState {
                id: invoice_id,
                status: invoice.status,
                due_date: invoice.due_date.to_chrono(),
            }),
        };

        let writes = transitions::decide(&snapshot, now, self.grace_days);
        self.writer.apply(&writes).await?;

        let project_name = project
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("Unknown Project");
        let title = "Overdue Invoice - Immediate Attention Required".to_string();
        let body = format!(
            "The invoice {} linked to the project \"{project_name}\" has remained unpaid for \
             more than {} days past its due date.\n\nOriginal due date: {}\nInvoice status: \
             updated to Overdue\nContract status: Cancelled\nProject status: Pushed\n\nThis \
             requires immediate attention to prevent further delays.",
            invoice.invoice_number,
            self.grace_days,
            fmt_date(invoice.due_date),
        );

        self.notify
            .notify_role_and_team(
                ADMIN_ROLE,
                Some(invoice.project_id),
                &title,
                &body,
                Some(meta),
                NotificationKind::System,
            )
            .await?;

        let contract_was_cancelled = writes
            .iter()
            .any(|w| matches!(w, StatusWrite::Contract(_, ContractStatus::Cancelled)));
        if contract_was_cancelled {
            self.contract_cancelled_notice(invoice, contract.as_ref(), project_name)
                .await?;
        }
        Ok(())
    }

    /// Administrative notice for the cancellation leg of the cascade.
    /// Goes to the Admin role only; the team already sees the overdue
    /// escalation itself.
    async fn contract_cancelled_notice(
        &self,
        invoice: &Invoice,
        contract: Option<&Contract>,
        project_name: &str,
    ) -> DaoResult<()> {
        let Some(contract) = contract else {
            return Ok(());
        };
        let Some(contract_id) = contract.id else {
            return Ok(());
        };
        let meta = AlertMeta::ContractCancelled {
            contract_id,
            project_id: Some(contract.project_id),
        };
        if self.notifications.already_sent(&meta).await? {
            return Ok(());
        }

        let title = "Contract Cancelled - Unpaid Invoice".to_string();
        let body = format!(
            "The contract \"{}\" for project \"{project_name}\" has been cancelled because \
             invoice {} remained unpaid past the grace period.",
            contract.name, invoice.invoice_number,
        );

        self.notify
            .notify_role(ADMIN_ROLE, &title, &body, Some(meta), NotificationKind::System)
            .await?;
        Ok(())
    }
}
