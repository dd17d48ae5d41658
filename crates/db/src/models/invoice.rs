use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub invoice_number: String,
    pub project_id: ObjectId,
    pub contract_id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    pub amount: f64,
    /// The date the deadline evaluator compares against.
    pub due_date: DateTime,
    pub status: InvoiceStatus,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Invoice {
    pub const COLLECTION: &'static str = "invoices";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InvoiceStatus::Pending => "Pending",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Overdue => "Overdue",
        };
        f.write_str(s)
    }
}
