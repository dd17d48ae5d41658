use std::sync::Arc;

use bson::oid::ObjectId;
use crewhub_db::models::{AlertMeta, Notification, NotificationKind};
use tracing::debug;

use crate::dao::base::DaoResult;
use crate::dao::{NotificationDao, ProjectDao, UserDao};
use crate::presence::Presence;

/// How a `notify` call names its recipients.
#[derive(Debug, Clone)]
pub enum NotifyTarget {
    /// All non-deleted users holding the role.
    Role(String),
    /// A single user, if present and non-deleted.
    User(ObjectId),
    /// Users matching the email, case-insensitively.
    Email(String),
}

/// Fan-out service: resolves a recipient set, writes exactly one shared
/// ledger document, then attempts a best-effort real-time push to every
/// recipient with a live channel. An empty recipient set is a silent
/// no-op; a ledger write failure propagates to the caller.
pub struct NotifyService {
    users: Arc<UserDao>,
    projects: Arc<ProjectDao>,
    notifications: Arc<NotificationDao>,
    presence: Arc<dyn Presence>,
}

impl NotifyService {
    pub fn new(
        users: Arc<UserDao>,
        projects: Arc<ProjectDao>,
        notifications: Arc<NotificationDao>,
        presence: Arc<dyn Presence>,
    ) -> Self {
        Self {
            users,
            projects,
            notifications,
            presence,
        }
    }

    pub async fn notify(
        &self,
        target: NotifyTarget,
        sender: Option<ObjectId>,
        title: &str,
        body: &str,
        meta: Option<AlertMeta>,
        kind: NotificationKind,
    ) -> DaoResult<Option<Notification>> {
        let receivers = match target {
            NotifyTarget::Role(role) => self
                .users
                .find_by_role(&role)
                .await?
                .into_iter()
                .filter_map(|u| u.id)
                .collect(),
            NotifyTarget::User(user_id) => match self.users.find_active(user_id).await? {
                Some(_) => vec![user_id],
                None => Vec::new(),
            },
            NotifyTarget::Email(email) => self
                .users
                .find_by_email_ci(&email)
                .await?
                .into_iter()
                .filter_map(|u| u.id)
                .collect(),
        };

        self.notify_users(receivers, sender, title, body, meta, kind)
            .await
    }

    pub async fn notify_role(
        &self,
        role: &str,
        title: &str,
        body: &str,
        meta: Option<AlertMeta>,
        kind: NotificationKind,
    ) -> DaoResult<Option<Notification>> {
        self.notify(
            NotifyTarget::Role(role.to_string()),
            None,
            title,
            body,
            meta,
            kind,
        )
        .await
    }

    /// Fan out one shared notification to every holder of `role` plus,
    /// when a project is given, its manager and developers. Used by the
    /// evaluators so each firing writes exactly one ledger entry.
    pub async fn notify_role_and_team(
        &self,
        role: &str,
        project_id: Option<ObjectId>,
        title: &str,
        body: &str,
        meta: Option<AlertMeta>,
        kind: NotificationKind,
    ) -> DaoResult<Option<Notification>> {
        let mut receivers: Vec<ObjectId> = self
            .users
            .find_by_role(role)
            .await?
            .into_iter()
            .filter_map(|u| u.id)
            .collect();

        if let Some(project_id) = project_id {
            for user_id in self.projects.team(project_id).await? {
                if !receivers.contains(&user_id) {
                    receivers.push(user_id);
                }
            }
        }

        self.notify_users(receivers, None, title, body, meta, kind)
            .await
    }

    /// Fan out to the project's manager and assigned developers. A
    /// missing project or empty team resolves to no recipients.
    pub async fn notify_project_team(
        &self,
        project_id: ObjectId,
        title: &str,
        body: &str,
        meta: Option<AlertMeta>,
        kind: NotificationKind,
    ) -> DaoResult<Option<Notification>> {
        let team = self.projects.team(project_id).await?;
        self.notify_users(team, None, title, body, meta, kind).await
    }

    /// The common tail: one shared document for the whole set, then a
    /// push per recipient. Push failures are invisible by design; only
    /// the ledger write can fail.
    pub async fn notify_users(
        &self,
        receivers: Vec<ObjectId>,
        sender: Option<ObjectId>,
        title: &str,
        body: &str,
        meta: Option<AlertMeta>,
        kind: NotificationKind,
    ) -> DaoResult<Option<Notification>> {
        if receivers.is_empty() {
            debug!(title, "No recipients resolved, skipping notification");
            return Ok(None);
        }

        let notification = Notification {
            id: None,
            sender,
            receivers: receivers.clone(),
            title: title.to_string(),
            body: body.to_string(),
            kind,
            is_read_by: Vec::new(),
            meta,
            created_at: bson::DateTime::now(),
        };
        let created = self.notifications.create(&notification).await?;

        let payload = event_payload(&created);
        for user_id in &receivers {
            self.presence.emit(*user_id, "notification", &payload).await;
        }

        Ok(Some(created))
    }
}

fn event_payload(notification: &Notification) -> serde_json::Value {
    serde_json::json!({
        "id": notification.id.map(|id| id.to_hex()),
        "sender": notification.sender.map(|id| id.to_hex()),
        "title": notification.title,
        "body": notification.body,
        "kind": notification.kind,
        "alert_type": notification.meta.as_ref().map(|m| m.alert_type()),
        "created_at": notification.created_at.try_to_rfc3339_string().ok(),
    })
}
