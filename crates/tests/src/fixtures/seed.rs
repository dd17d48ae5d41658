use bson::{DateTime, oid::ObjectId};
use chrono::{Duration, Utc};
use crewhub_db::models::{
    Contract, ContractStatus, Invoice, InvoiceStatus, Project, ProjectStatus, User,
};
use mongodb::Database;

/// `days` from the current instant, keeping the time of day. Positive
/// values land inside the evaluator's calendar-day window for that
/// offset; negative values are in the past.
pub fn days_from_now(days: i64) -> DateTime {
    DateTime::from_chrono(Utc::now() + Duration::days(days))
}

/// A moment later today (UTC): still inside the current calendar day,
/// but in the future so past-date sweeps leave it alone.
pub fn later_today() -> DateTime {
    let now = Utc::now();
    let next_midnight = (now + Duration::days(1))
        .date_naive()
        .and_time(chrono::NaiveTime::MIN)
        .and_utc();
    DateTime::from_chrono((now + Duration::hours(1)).min(next_midnight - Duration::minutes(1)))
}

pub async fn seed_user(
    db: &Database,
    first_name: &str,
    last_name: &str,
    email: &str,
    role: &str,
) -> User {
    let now = DateTime::now();
    let mut user = User {
        id: None,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        phone: None,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    };

    let result = db
        .collection::<User>(User::COLLECTION)
        .insert_one(&user)
        .await
        .expect("Failed to insert user");
    user.id = result.inserted_id.as_object_id();
    user
}

pub async fn seed_admin(db: &Database, email: &str) -> User {
    seed_user(db, "Ada", "Admin", email, "Admin").await
}

pub async fn seed_project(
    db: &Database,
    manager: Option<ObjectId>,
    developers: Vec<ObjectId>,
    deadline: Option<DateTime>,
) -> Project {
    let now = DateTime::now();
    let mut project = Project {
        id: None,
        name: "Billing revamp".to_string(),
        code: Some("BILL-01".to_string()),
        description: None,
        status: ProjectStatus::Active,
        manager,
        developers,
        start_date: Some(days_from_now(-30)),
        end_date: None,
        deadline,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    };

    let result = db
        .collection::<Project>(Project::COLLECTION)
        .insert_one(&project)
        .await
        .expect("Failed to insert project");
    project.id = result.inserted_id.as_object_id();
    project
}

pub async fn seed_contract(db: &Database, project_id: ObjectId, end_date: DateTime) -> Contract {
    let now = DateTime::now();
    let mut contract = Contract {
        id: None,
        project_id,
        name: "Phase one".to_string(),
        start_date: days_from_now(-30),
        end_date,
        status: ContractStatus::Active,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    };

    let result = db
        .collection::<Contract>(Contract::COLLECTION)
        .insert_one(&contract)
        .await
        .expect("Failed to insert contract");
    contract.id = result.inserted_id.as_object_id();
    contract
}

pub async fn seed_invoice(
    db: &Database,
    project_id: ObjectId,
    contract_id: ObjectId,
    due_date: DateTime,
) -> Invoice {
    let now = DateTime::now();
    let mut invoice = Invoice {
        id: None,
        invoice_number: format!("INV-{}", uuid::Uuid::new_v4().simple()),
        project_id,
        contract_id,
        client_name: Some("Acme Corp".to_string()),
        amount: 1200.0,
        due_date,
        status: InvoiceStatus::Pending,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    };

    let result = db
        .collection::<Invoice>(Invoice::COLLECTION)
        .insert_one(&invoice)
        .await
        .expect("Failed to insert invoice");
    invoice.id = result.inserted_id.as_object_id();
    invoice
}
