use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub name: String,
    pub start_date: DateTime,
    /// The date the deadline evaluator compares against.
    pub end_date: DateTime,
    pub status: ContractStatus,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Contract {
    pub const COLLECTION: &'static str = "contracts";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractStatus {
    Active,
    Completed,
    Cancelled,
    Ended,
}

impl std::fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ContractStatus::Active => "Active",
            ContractStatus::Completed => "Completed",
            ContractStatus::Cancelled => "Cancelled",
            ContractStatus::Ended => "Ended",
        };
        f.write_str(s)
    }
}
