use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use crewhub_db::models::{AlertMeta, NotificationKind, Project};
use tracing::{debug, error};

use super::transitions::{self, EntitySnapshot, ProjectState};
use super::{
    ADMIN_ROLE, DAY_LADDER, DEDUP_WINDOW_MINUTES, StatusWriter, day_window, fmt_datetime,
    today_window,
};
use crate::dao::base::DaoResult;
use crate::dao::{NotificationDao, ProjectDao};
use crate::notify::NotifyService;

/// Watches project deadlines: the 5..1 day reminder ladder on the daily
/// cadence, and last-day reminders plus the past-deadline push on the
/// hourly cadence.
pub struct ProjectEvaluator {
    projects: Arc<ProjectDao>,
    notifications: Arc<NotificationDao>,
    notify: Arc<NotifyService>,
    writer: Arc<StatusWriter>,
}

impl ProjectEvaluator {
    pub(crate) fn new(
        projects: Arc<ProjectDao>,
        notifications: Arc<NotificationDao>,
        notify: Arc<NotifyService>,
        writer: Arc<StatusWriter>,
    ) -> Self {
        Self {
            projects,
            notifications,
            notify,
            writer,
        }
    }

    pub async fn daily_pass(&self, now: DateTime<Utc>) -> DaoResult<()> {
        for days in DAY_LADDER {
            let (start, end) = day_window(now, days);
            let projects = self
                .projects
                .find_active_deadline_between(start, end)
                .await?;

            for project in &projects {
                if let Err(e) = self.days_left_alert(project, days).await {
                    error!(%e, project = %project.name, days, "Project ladder alert failed");
                }
            }
        }
        Ok(())
    }

    pub async fn hourly_pass(&self, now: DateTime<Utc>) -> DaoResult<()> {
        // Last-day reminders, re-fireable once per rolling window.
        let (start, end) = today_window(now);
        let due_today = self
            .projects
            .find_active_deadline_between(start, end)
            .await?;
        for project in &due_today {
            if let Err(e) = self.last_day_alert(project, now).await {
                error!(%e, project = %project.name, "Project last-day alert failed");
            }
        }

        // Separate sweep: deadlines already behind us trigger the push
        // transition. Kept apart from the reminder query so a reminder
        // failure never blocks a transition, and vice versa.
        let expired = self.projects.find_active_deadline_before(now).await?;
        for project in &expired {
            if let Err(e) = self.push_expired(project, now).await {
                error!(%e, project = %project.name, "Project deadline transition failed");
            }
        }
        Ok(())
    }

    async fn days_left_alert(&self, project: &Project, days: i64) -> DaoResult<()> {
        let Some(project_id) = project.id else {
            return Ok(());
        };
        let meta = AlertMeta::ProjectDaysLeft { project_id, days };
        if self.notifications.already_sent(&meta).await? {
            debug!(project = %project.name, days, "Ladder alert already sent");
            return Ok(());
        }

        let deadline = project.deadline.map(fmt_datetime).unwrap_or_default();
        let title = format!("Project Deadline - {days} Day(s) Remaining");
        let body = format!(
            "Dear team,\n\nThis is an automated reminder that the project \"{}\" is scheduled \
             to reach its deadline in {days} day(s), on {deadline}.\n\nPlease ensure all \
             outstanding deliverables are reviewed and that any risks are escalated to the \
             project manager immediately.",
            project.name,
        );

        self.notify
            .notify_role_and_team(
                ADMIN_ROLE,
                Some(project_id),
                &title,
                &body,
                Some(meta),
                NotificationKind::Info,
            )
            .await?;
        Ok(())
    }

    async fn last_day_alert(&self, project: &Project, now: DateTime<Utc>) -> DaoResult<()> {
        let Some(project_id) = project.id else {
            return Ok(());
        };
        let meta = AlertMeta::ProjectLastDay { project_id };
        let since = now - Duration::minutes(DEDUP_WINDOW_MINUTES);
        if self.notifications.already_sent_since(&meta, since).await? {
            return Ok(());
        }

        let deadline = project.deadline.map(fmt_datetime).unwrap_or_default();
        let title = "Project Deadline - Today (Hourly Reminder)".to_string();
        let body = format!(
            "Dear team,\n\nThis is an automated hourly reminder that the project \"{}\" will \
             reach its deadline today ({deadline}).\n\nPlease verify task completion status and \
             escalate any unresolved issues to the project manager immediately.",
            project.name,
        );

        self.notify
            .notify_role_and_team(
                ADMIN_ROLE,
                Some(project_id),
                &title,
                &body,
                Some(meta),
                NotificationKind::Warning,
            )
            .await?;
        Ok(())
    }

    async fn push_expired(&self, project: &Project, now: DateTime<Utc>) -> DaoResult<()> {
        let Some(project_id) = project.id else {
            return Ok(());
        };
        let snapshot = EntitySnapshot {
            project: Some(ProjectState {
                id: project_id,
                status: project.status,
                deadline: project.deadline.map(|d| d.to_chrono()),
            }),
            ..Default::default()
        };

        let writes = transitions::decide(&snapshot, now, 0);
        if writes.is_empty() {
            return Ok(());
        }
        self.writer.apply(&writes).await?;

        let deadline = project.deadline.map(fmt_datetime).unwrap_or_default();
        let title = "Project Status Updated - Pushed (Deadline Passed)".to_string();
        let body = format!(
            "Dear team,\n\nThe scheduled deadline for project \"{}\" ({deadline}) has passed. \
             As an automated measure, the project status has been updated to Pushed.\n\nPlease \
             pause new development work, review remaining deliverables, and coordinate with \
             stakeholders to determine next steps. If this change was made in error, please \
             contact administration to reverse it.",
            project.name,
        );

        self.notify
            .notify_role_and_team(
                ADMIN_ROLE,
                Some(project_id),
                &title,
                &body,
                Some(AlertMeta::ProjectPushed { project_id }),
                NotificationKind::Warning,
            )
            .await?;
        Ok(())
    }
}
