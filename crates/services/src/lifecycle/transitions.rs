use bson::oid::ObjectId;
use chrono::{DateTime, Duration, Utc};
use crewhub_db::models::{ContractStatus, InvoiceStatus, ProjectStatus};

/// What an evaluator knows about one entity and its relatives when it
/// asks for a decision. Absent entities simply disable the rules that
/// need them.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntitySnapshot {
    pub project: Option<ProjectState>,
    pub contract: Option<ContractState>,
    pub invoice: Option<InvoiceState>,
}

#[derive(Debug, Clone, Copy)]
pub struct ProjectState {
    pub id: ObjectId,
    pub status: ProjectStatus,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy)]
pub struct ContractState {
    pub id: ObjectId,
    pub status: ContractStatus,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct InvoiceState {
    pub id: ObjectId,
    pub status: InvoiceStatus,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusWrite {
    Project(ObjectId, ProjectStatus),
    Contract(ObjectId, ContractStatus),
    Invoice(ObjectId, InvoiceStatus),
}

/// One row of the transition table: a trigger predicate and the status
/// writes it produces. Every writes-fn re-checks the current status in
/// the snapshot, so re-evaluating an already-transitioned entity yields
/// nothing.
pub struct Rule {
    pub name: &'static str,
    applies: fn(&EntitySnapshot, DateTime<Utc>, i64) -> bool,
    writes: fn(&EntitySnapshot) -> Vec<StatusWrite>,
}

pub const RULES: &[Rule] = &[
    Rule {
        name: "contract-ended",
        applies: |s, now, _| matches!(s.contract, Some(c) if c.status == ContractStatus::Active && c.end_date < now),
        writes: |s| {
            let mut writes = Vec::new();
            if let Some(c) = s.contract {
                writes.push(StatusWrite::Contract(c.id, ContractStatus::Ended));
            }
            writes.extend(push_project(s));
            writes
        },
    },
    Rule {
        name: "invoice-overdue",
        applies: |s, now, grace_days| {
            matches!(s.invoice, Some(i) if i.status == InvoiceStatus::Pending
                && now - i.due_date >= Duration::days(grace_days))
        },
        writes: |s| {
            let mut writes = Vec::new();
            if let Some(i) = s.invoice {
                writes.push(StatusWrite::Invoice(i.id, InvoiceStatus::Overdue));
            }
            if let Some(c) = s.contract {
                if c.status != ContractStatus::Cancelled {
                    writes.push(StatusWrite::Contract(c.id, ContractStatus::Cancelled));
                }
            }
            writes.extend(push_project(s));
            writes
        },
    },
    Rule {
        name: "contract-cancelled",
        applies: |s, _, _| matches!(s.contract, Some(c) if c.status == ContractStatus::Cancelled),
        writes: push_project,
    },
    Rule {
        name: "project-deadline-passed",
        applies: |s, now, _| {
            matches!(s.project, Some(p) if p.status == ProjectStatus::Active
                && p.deadline.is_some_and(|d| d < now))
        },
        writes: push_project,
    },
];

fn push_project(s: &EntitySnapshot) -> Vec<StatusWrite> {
    match s.project {
        Some(p) if p.status != ProjectStatus::Pushed => {
            vec![StatusWrite::Project(p.id, ProjectStatus::Pushed)]
        }
        _ => Vec::new(),
    }
}

/// Pure decision function: which status writes does this snapshot call
/// for at `now`? Duplicate writes from overlapping rules collapse.
pub fn decide(snapshot: &EntitySnapshot, now: DateTime<Utc>, grace_days: i64) -> Vec<StatusWrite> {
    let mut writes: Vec<StatusWrite> = Vec::new();
    for rule in RULES {
        if (rule.applies)(snapshot, now, grace_days) {
            for write in (rule.writes)(snapshot) {
                if !writes.contains(&write) {
                    writes.push(write);
                }
            }
        }
    }
    writes
}
