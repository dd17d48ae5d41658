use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use crewhub_db::models::{Contract, ContractStatus};
use mongodb::Database;

use super::base::{BaseDao, DaoResult};

pub struct ContractDao {
    pub base: BaseDao<Contract>,
}

impl ContractDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Contract::COLLECTION),
        }
    }

    /// Active, non-deleted contracts ending within `[start, end)`.
    pub async fn find_active_ending_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DaoResult<Vec<Contract>> {
        self.base
            .find_many(
                doc! {
                    "status": bson::to_bson(&ContractStatus::Active)?,
                    "is_deleted": false,
                    "end_date": {
                        "$gte": bson::DateTime::from_chrono(start),
                        "$lt": bson::DateTime::from_chrono(end),
                    },
                },
                Some(doc! { "end_date": 1 }),
            )
            .await
    }

    /// Active, non-deleted contracts whose end date has already passed.
    pub async fn find_active_ended_before(&self, t: DateTime<Utc>) -> DaoResult<Vec<Contract>> {
        self.base
            .find_many(
                doc! {
                    "status": bson::to_bson(&ContractStatus::Active)?,
                    "is_deleted": false,
                    "end_date": { "$lt": bson::DateTime::from_chrono(t) },
                },
                Some(doc! { "end_date": 1 }),
            )
            .await
    }

    /// Atomic single-document status write.
    pub async fn set_status(&self, id: ObjectId, status: ContractStatus) -> DaoResult<bool> {
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
