use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ProjectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<ObjectId>,
    #[serde(default)]
    pub developers: Vec<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime>,
    /// The date the deadline evaluator compares against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Project {
    pub const COLLECTION: &'static str = "projects";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    Active,
    Pushed,
    Completed,
    OnHold,
    Cancelled,
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProjectStatus::Active => "Active",
            ProjectStatus::Pushed => "Pushed",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::OnHold => "OnHold",
            ProjectStatus::Cancelled => "Cancelled",
        };
        f.write_str(s)
    }
}
