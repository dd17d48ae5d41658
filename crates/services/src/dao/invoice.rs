use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use crewhub_db::models::{Invoice, InvoiceStatus};
use mongodb::Database;

use super::base::{BaseDao, DaoResult};

pub struct InvoiceDao {
    pub base: BaseDao<Invoice>,
}

impl InvoiceDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Invoice::COLLECTION),
        }
    }

    /// Pending, non-deleted invoices due within `[start, end)`.
    pub async fn find_pending_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DaoResult<Vec<Invoice>> {
        self.base
            .find_many(
                doc! {
                    "status": bson::to_bson(&InvoiceStatus::Pending)?,
                    "is_deleted": false,
                    "due_date": {
                        "$gte": bson::DateTime::from_chrono(start),
                        "$lt": bson::DateTime::from_chrono(end),
                    },
                },
                Some(doc! { "due_date": 1 }),
            )
            .await
    }

    /// Pending, non-deleted invoices whose due date is on or before `cutoff`.
    pub async fn find_pending_due_before(&self, cutoff: DateTime<Utc>) -> DaoResult<Vec<Invoice>> {
        self.base
            .find_many(
                doc! {
                    "status": bson::to_bson(&InvoiceStatus::Pending)?,
                    "is_deleted": false,
                    "due_date": { "$lte": bson::DateTime::from_chrono(cutoff) },
                },
                Some(doc! { "due_date": 1 }),
            )
            .await
    }

    /// Atomic single-document status write.
    pub async fn set_status(&self, id: ObjectId, status: InvoiceStatus) -> DaoResult<bool> {
        self.base
            .update_by_id(
                id,
                doc! { "$set": {
                    "status": bson::to_bson(&status)?,
                    "updated_at": bson::DateTime::now(),
                }},
            )
            .await
    }
}
