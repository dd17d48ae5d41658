use std::sync::Arc;

use bson::doc;
use chrono::{DateTime, Duration, Utc};
use crewhub_db::models::{AlertMeta, Contract, NotificationKind, Project};
use tracing::{debug, error};

use super::transitions::{self, ContractState, EntitySnapshot, ProjectState};
use super::{
    ADMIN_ROLE, DAY_LADDER, DEDUP_WINDOW_MINUTES, StatusWriter, day_window, fmt_datetime,
    today_window,
};
use crate::dao::base::DaoResult;
use crate::dao::{ContractDao, NotificationDao, ProjectDao};
use crate::notify::NotifyService;

/// Watches contract end dates. Same ladder and last-day cadences as the
/// project evaluator; the expired sweep additionally cascades the linked
/// project to Pushed through the transition engine.
pub struct ContractEvaluator {
    contracts: Arc<ContractDao>,
    projects: Arc<ProjectDao>,
    notifications: Arc<NotificationDao>,
    notify: Arc<NotifyService>,
    writer: Arc<StatusWriter>,
}

impl ContractEvaluator {
    pub(crate) fn new(
        contracts: Arc<ContractDao>,
        projects: Arc<ProjectDao>,
        notifications: Arc<NotificationDao>,
        notify: Arc<NotifyService>,
        writer: Arc<StatusWriter>,
    ) -> Self {
        Self {
            contracts,
            projects,
            notifications,
            notify,
            writer,
        }
    }

    pub async fn daily_pass(&self, now: DateTime<Utc>) -> DaoResult<()> {
        for days in DAY_LADDER {
            let (start, end) = day_window(now, days);
            let contracts = self
                .contracts
                .find_active_ending_between(start, end)
                .await?;

            for contract in &contracts {
                if let Err(e) = self.days_left_alert(contract, days).await {
                    error!(%e, contract = %contract.name, days, "Contract ladder alert failed");
                }
            }
        }
        Ok(())
    }

    pub async fn hourly_pass(&self, now: DateTime<Utc>) -> DaoResult<()> {
        let (start, end) = today_window(now);
        let ending_today = self
            .contracts
            .find_active_ending_between(start, end)
            .await?;
        for contract in &ending_today {
            if let Err(e) = self.last_day_alert(contract, now).await {
                error!(%e, contract = %contract.name, "Contract last-day alert failed");
            }
        }

        // Separate sweep: contracts already past their end date run the
        // end transition and its project cascade.
        let expired = self.contracts.find_active_ended_before(now).await?;
        for contract in &expired {
            if let Err(e) = self.end_expired(contract, now).await {
                error!(%e, contract = %contract.name, "Contract end transition failed");
            }
        }
        Ok(())
    }

    async fn linked_project(&self, contract: &Contract) -> DaoResult<Option<Project>> {
        self.projects
            .base
            .find_one(doc! { "_id": contract.project_id })
            .await
    }

    async fn days_left_alert(&self, contract: &Contract, days: i64) -> DaoResult<()> {
        let Some(contract_id) = contract.id else {
            return Ok(());
        };
        let meta = AlertMeta::ContractDaysLeft {
            contract_id,
            project_id: Some(contract.project_id),
            days,
        };
        if self.notifications.already_sent(&meta).await? {
            debug!(contract = %contract.name, days, "Ladder alert already sent");
            return Ok(());
        }

        let project = self.linked_project(contract).await?;
        let project_name = project
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("Unknown");
        let title = format!("Contract Ending Soon - {days} Day(s) Left");
        let body = format!(
            "The contract \"{}\" for project \"{project_name}\" will end on {}.",
            contract.name,
            fmt_datetime(contract.end_date),
        );

        self.notify
            .notify_role_and_team(
                ADMIN_ROLE,
                Some(contract.project_id),
                &title,
                &body,
                Some(meta),
                NotificationKind::System,
            )
            .await?;
        Ok(())
    }

    async fn last_day_alert(&self, contract: &Contract, now: DateTime<Utc>) -> DaoResult<()> {
        let Some(contract_id) = contract.id else {
            return Ok(());
        };
        let meta = AlertMeta::ContractLastDay {
            contract_id,
            project_id: Some(contract.project_id),
        };
        let since = now - Duration::minutes(DEDUP_WINDOW_MINUTES);
        if self.notifications.already_sent_since(&meta, since).await? {
            return Ok(());
        }

        let project = self.linked_project(contract).await?;
        let project_name = project
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("Unknown");
        let title = "Contract Ending Today - Final Hours".to_string();
        let body = format!(
            "The contract \"{}\" for project \"{project_name}\" will end at {}.",
            contract.name,
            fmt_datetime(contract.end_date),
        );

        self.notify
            .notify_role_and_team(
                ADMIN_ROLE,
                Some(contract.project_id),
                &title,
                &body,
                Some(meta),
                NotificationKind::System,
            )
            .await?;
        Ok(())
    }

    async fn end_expired(&self, contract: &Contract, now: DateTime<Utc>) -> DaoResult<()> {
        let Some(contract_id) = contract.id else {
            return Ok(());
        };
        let project = self.linked_project(contract).await?;
        let snapshot = EntitySnapshot {
            project: project.as_ref().and_then(|p| {
                p.id.map(|id| ProjectState {
                    id,
                    status: p.status,
                    deadline: p.deadline.map(|d| d.to_chrono()),
                })
            }),
            contract: Some(ContractState {
                id: contract_id,
                status: contract.status,
                end_date: contract.end_date.to_chrono(),
            }),
            invoice: None,
        };

        let writes = transitions::decide(&snapshot, now, 0);
        if writes.is_empty() {
            return Ok(());
        }
        self.writer.apply(&writes).await?;

        let project_name = project
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("Unknown");
        let title = "Contract Automatically Ended - Immediate Review Required".to_string();
        let body = format!(
            "Dear team,\n\nThe contract \"{}\" associated with project \"{project_name}\" has \
             reached its scheduled end date and the contract status has been updated to Ended. \
             Consequently, the project status has been set to Pushed.\n\nPlease review the \
             project backlog, close outstanding tasks if appropriate, and coordinate with \
             stakeholders for next steps. If this auto-update is incorrect, please contact the \
             administration immediately.",
            contract.name,
        );

        self.notify
            .notify_role_and_team(
                ADMIN_ROLE,
                Some(contract.project_id),
                &title,
                &body,
                Some(AlertMeta::ContractEnded {
                    contract_id,
                    project_id: Some(contract.project_id),
                }),
                NotificationKind::System,
            )
            .await?;
        Ok(())
    }
}
