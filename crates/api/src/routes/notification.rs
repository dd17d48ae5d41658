use axum::{
    Json,
    extract::{Path, Query, State},
};
use bson::oid::ObjectId;
use crewhub_db::models::{Notification, NotificationKind};
use crewhub_services::NotifyTarget;
use crewhub_services::dao::base::PaginationParams;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SendNotificationRequest {
    pub role: Option<String>,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub sender_id: Option<String>,
    pub title: String,
    pub body: String,
    pub kind: Option<NotificationKind>,
}

#[derive(Debug, Deserialize)]
pub struct NotifyTeamRequest {
    pub title: String,
    pub body: String,
    pub kind: Option<NotificationKind>,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub sender: Option<String>,
    pub receivers: Vec<String>,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub alert_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
    pub created_at: String,
}

fn to_response(n: Notification, viewer: Option<ObjectId>) -> NotificationResponse {
    NotificationResponse {
        id: n.id.map(|id| id.to_hex()).unwrap_or_default(),
        sender: n.sender.map(|id| id.to_hex()),
        receivers: n.receivers.iter().map(|id| id.to_hex()).collect(),
        title: n.title,
        body: n.body,
        kind: n.kind,
        alert_type: n.meta.as_ref().map(|m| m.alert_type()),
        is_read: viewer.map(|u| n.is_read_by.contains(&u)),
        created_at: n.created_at.try_to_rfc3339_string().unwrap_or_default(),
    }
}

/// Ad hoc alert primitive: exactly one of role / user_id / email names
/// the target. An empty resolved recipient set is not an error.
pub async fn send(
    State(state): State<AppState>,
    Json(body): Json<SendNotificationRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = if let Some(role) = body.role {
        NotifyTarget::Role(role)
    } else if let Some(user_id) = body.user_id {
        let id = ObjectId::parse_str(&user_id)
            .map_err(|_| ApiError::BadRequest("Invalid user_id".to_string()))?;
        NotifyTarget::User(id)
    } else if let Some(email) = body.email {
        NotifyTarget::Email(email)
    } else {
        return Err(ApiError::BadRequest(
            "Provide role, user_id or email".to_string(),
        ));
    };

    let sender = body
        .sender_id
        .as_deref()
        .map(ObjectId::parse_str)
        .transpose()
        .map_err(|_| ApiError::BadRequest("Invalid sender_id".to_string()))?;

    let created = state
        .notify
        .notify(
            target,
            sender,
            &body.title,
            &body.body,
            None,
            body.kind.unwrap_or(NotificationKind::Info),
        )
        .await?;

    Ok(Json(serde_json::json!({
        "created": created.is_some(),
        "notification": created.map(|n| to_response(n, None)),
    })))
}

/// Fan out to a project's manager and developers.
pub async fn send_to_project_team(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(body): Json<NotifyTeamRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pid = ObjectId::parse_str(&project_id)
        .map_err(|_| ApiError::BadRequest("Invalid project_id".to_string()))?;

    let created = state
        .notify
        .notify_project_team(
            pid,
            &body.title,
            &body.body,
            None,
            body.kind.unwrap_or(NotificationKind::Info),
        )
        .await?;

    Ok(Json(serde_json::json!({
        "created": created.is_some(),
        "notification": created.map(|n| to_response(n, None)),
    })))
}

/// A user's inbox, newest first, each item annotated with that user's
/// read state.
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let uid = ObjectId::parse_str(&user_id)
        .map_err(|_| ApiError::BadRequest("Invalid user_id".to_string()))?;

    let result = state.notifications.find_for_user(uid, &params).await?;

    let items: Vec<NotificationResponse> = result
        .items
        .into_iter()
        .map(|n| to_response(n, Some(uid)))
        .collect();

    Ok(Json(serde_json::json!({
        "items": items,
        "total": result.total,
        "page": result.page,
        "per_page": result.per_page,
        "total_pages": result.total_pages,
    })))
}

pub async fn mark_as_read(
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
    Json(body): Json<MarkReadRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let nid = ObjectId::parse_str(&notification_id)
        .map_err(|_| ApiError::BadRequest("Invalid notification_id".to_string()))?;
    let uid = ObjectId::parse_str(&body.user_id)
        .map_err(|_| ApiError::BadRequest("Invalid user_id".to_string()))?;

    let updated = state.notifications.mark_as_read(nid, uid).await?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}

pub async fn mark_all_as_read(
    State(state): State<AppState>,
    Json(body): Json<MarkReadRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let uid = ObjectId::parse_str(&body.user_id)
        .map_err(|_| ApiError::BadRequest("Invalid user_id".to_string()))?;

    let updated = state.notifications.mark_all_as_read(uid).await?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}
