use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use crewhub_db::models::{AlertMeta, Notification};
use mongodb::Database;

use super::base::{BaseDao, DaoResult, PaginatedResult, PaginationParams};

/// The append-only fan-out ledger. Notifications are created once, never
/// updated except for the monotonic `is_read_by` set, and never deleted.
pub struct NotificationDao {
    pub base: BaseDao<Notification>,
}

impl NotificationDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Notification::COLLECTION),
        }
    }

    pub async fn create(&self, notification: &Notification) -> DaoResult<Notification> {
        let id = self.base.insert_one(notification).await?;
        self.base.find_by_id(id).await
    }

    /// Non-windowed dedup lookup: has this fingerprint ever fired?
    pub async fn already_sent(&self, meta: &AlertMeta) -> DaoResult<bool> {
        Ok(self.base.find_one(meta.dedup_filter()).await?.is_some())
    }

    /// Windowed dedup lookup: has this fingerprint fired since `since`?
    pub async fn already_sent_since(
        &self,
        meta: &AlertMeta,
        since: DateTime<Utc>,
    ) -> DaoResult<bool> {
        let mut filter = meta.dedup_filter();
        filter.insert(
            "created_at",
            doc! { "$gte": bson::DateTime::from_chrono(since) },
        );
        Ok(self.base.find_one(filter).await?.is_some())
    }

    /// A user's inbox, newest first.
    pub async fn find_for_user(
        &self,
        user_id: ObjectId,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Notification>> {
        self.base
            .find_paginated(
                doc! { "receivers": user_id },
                Some(doc! { "created_at": -1 }),
                params,
            )
            .await
    }

    /// Set-union add of `user_id` to `is_read_by`. Idempotent: a repeat
    /// call matches nothing new and modifies nothing.
    pub async fn mark_as_read(
        &self,
        notification_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<bool> {
        self.base
            .update_one(
                doc! { "_id": notification_id, "receivers": user_id },
                doc! { "$addToSet": { "is_read_by": user_id } },
            )
            .await
    }

    /// The same union across every notification addressed to the user.
    /// Returns how many documents actually changed.
    pub async fn mark_all_as_read(&self, user_id: ObjectId) -> DaoResult<u64> {
        self.base
            .update_many(
                doc! { "receivers": user_id },
                doc! { "$addToSet": { "is_read_by": user_id } },
            )
            .await
    }
}
