use bson::{DateTime, doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A single fan-out event in the append-only ledger. One document is
/// shared by every receiver; per-user read state grows monotonically
/// in `is_read_by` and never shrinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<ObjectId>,
    pub receivers: Vec<ObjectId>,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    #[serde(default)]
    pub is_read_by: Vec<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<AlertMeta>,
    pub created_at: DateTime,
}

impl Notification {
    pub const COLLECTION: &'static str = "notifications";

    pub fn is_read_by_user(&self, user_id: &ObjectId) -> bool {
        self.is_read_by.contains(user_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Warning,
    Success,
    System,
    Chat,
}

/// Typed metadata for automated alerts. The (entity id, alert kind[, days])
/// tuple doubles as the dedup fingerprint: `dedup_filter` builds the exact
/// query the ledger is checked with before a new automated alert is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertMeta {
    ProjectDaysLeft {
        project_id: ObjectId,
        days: i64,
    },
    ProjectLastDay {
        project_id: ObjectId,
    },
    ProjectPushed {
        project_id: ObjectId,
    },
    ContractDaysLeft {
        contract_id: ObjectId,
        project_id: Option<ObjectId>,
        days: i64,
    },
    ContractLastDay {
        contract_id: ObjectId,
        project_id: Option<ObjectId>,
    },
    ContractEnded {
        contract_id: ObjectId,
        project_id: Option<ObjectId>,
    },
    ContractCancelled {
        contract_id: ObjectId,
        project_id: Option<ObjectId>,
    },
    InvoiceDaysLeft {
        invoice_id: ObjectId,
        project_id: ObjectId,
        days: i64,
    },
    InvoiceLastDay {
        invoice_id: ObjectId,
        project_id: ObjectId,
    },
    InvoiceOverdue {
        invoice_id: ObjectId,
        contract_id: ObjectId,
        project_id: ObjectId,
        grace_days: i64,
    },
}

impl AlertMeta {
    /// The serde tag this variant is stored under.
    fn kind_str(&self) -> &'static str {
        match self {
            AlertMeta::ProjectDaysLeft { .. } => "project_days_left",
            AlertMeta::ProjectLastDay { .. } => "project_last_day",
            AlertMeta::ProjectPushed { .. } => "project_pushed",
            AlertMeta::ContractDaysLeft { .. } => "contract_days_left",
            AlertMeta::ContractLastDay { .. } => "contract_last_day",
            AlertMeta::ContractEnded { .. } => "contract_ended",
            AlertMeta::ContractCancelled { .. } => "contract_cancelled",
            AlertMeta::InvoiceDaysLeft { .. } => "invoice_days_left",
            AlertMeta::InvoiceLastDay { .. } => "invoice_last_day",
            AlertMeta::InvoiceOverdue { .. } => "invoice_overdue",
        }
    }

    /// Human/wire-facing alert type name, e.g. `project-3-days-left`.
    pub fn alert_type(&self) -> String {
        match self {
            AlertMeta::ProjectDaysLeft { days, .. } => format!("project-{days}-days-left"),
            AlertMeta::ProjectLastDay { .. } => "project-hourly-last-day".to_string(),
            AlertMeta::ProjectPushed { .. } => "project-pushed".to_string(),
            AlertMeta::ContractDaysLeft { days, .. } => format!("contract-{days}-days-left"),
            AlertMeta::ContractLastDay { .. } => "contract-hourly-last-day".to_string(),
            AlertMeta::ContractEnded { .. } => "contract-ended".to_string(),
            AlertMeta::ContractCancelled { .. } => "contract-cancelled".to_string(),
            AlertMeta::InvoiceDaysLeft { days, .. } => format!("invoice-{days}-days-left"),
            AlertMeta::InvoiceLastDay { .. } => "invoice-hourly-last-day".to_string(),
            AlertMeta::InvoiceOverdue { grace_days, .. } => {
                format!("invoice-overdue-{grace_days}days")
            }
        }
    }

    /// Ledger query matching every notification carrying the same
    /// fingerprint as this meta. The fields that distinguish one alert
    /// type from another (kind, owning entity id, ladder day count,
    /// grace period) all participate; context-only fields do not.
    pub fn dedup_filter(&self) -> bson::Document {
        match self {
            AlertMeta::ProjectDaysLeft { project_id, days } => doc! {
                "meta.kind": self.kind_str(),
                "meta.project_id": project_id,
                "meta.days": days,
            },
            AlertMeta::ProjectLastDay { project_id }
            | AlertMeta::ProjectPushed { project_id } => doc! {
                "meta.kind": self.kind_str(),
                "meta.project_id": project_id,
            },
            AlertMeta::ContractDaysLeft {
                contract_id, days, ..
            } => doc! {
                "meta.kind": self.kind_str(),
                "meta.contract_id": contract_id,
                "meta.days": days,
            },
            AlertMeta::ContractLastDay { contract_id, .. }
            | AlertMeta::ContractEnded { contract_id, .. }
            | AlertMeta::ContractCancelled { contract_id, .. } => doc! {
                "meta.kind": self.kind_str(),
                "meta.contract_id": contract_id,
            },
            AlertMeta::InvoiceDaysLeft {
                invoice_id, days, ..
            } => doc! {
                "meta.kind": self.kind_str(),
                "meta.invoice_id": invoice_id,
                "meta.days": days,
            },
            AlertMeta::InvoiceLastDay { invoice_id, .. } => doc! {
                "meta.kind": self.kind_str(),
                "meta.invoice_id": invoice_id,
            },
            AlertMeta::InvoiceOverdue {
                invoice_id,
                grace_days,
                ..
            } => doc! {
                "meta.kind": self.kind_str(),
                "meta.invoice_id": invoice_id,
                "meta.grace_days": grace_days,
            },
        }
    }
}
