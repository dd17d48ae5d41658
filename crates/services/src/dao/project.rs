use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use crewhub_db::models::{Project, ProjectStatus};
use mongodb::Database;

use super::base::{BaseDao, DaoResult};

pub struct ProjectDao {
    pub base: BaseDao<Project>,
}

impl ProjectDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Project::COLLECTION),
        }
    }

    /// Active, non-deleted projects whose deadline falls in `[start, end)`.
    pub async fn find_active_deadline_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DaoResult<Vec<Project>> {
        self.base
            .find_many(
                doc! {
                    "status": bson::to_bson(&ProjectStatus::Active)?,
                    "is_deleted": false,
                    "deadline": {
                        "$gte": bson::DateTime::from_chrono(start),
                        "$lt": bson::DateTime::from_chrono(end),
                    },
                },
                Some(doc! { "deadline": 1 }),
            )
            .await
    }

    /// Active, non-deleted projects whose deadline has already passed.
    pub async fn find_active_deadline_before(
        &self,
        t: DateTime<Utc>,
    ) -> DaoResult<Vec<Project>> {
        self.base
            .find_many(
                doc! {
                    "status": bson::to_bson(&ProjectStatus::Active)?,
                    "is_deleted": false,
                    "deadline": { "$lt": bson::DateTime::from_chrono(t) },
                },
                Some(doc! { "deadline": 1 }),
            )
            .await
    }

    /// Atomic single-document status write.
    pub async fn set_status(&self, id: ObjectId, status: ProjectStatus) -> DaoResult<bool> {
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

    /// Manager plus developers, deduplicated. Empty when the project is
    /// missing or has no one assigned.
    pub async fn team(&self, project_id: ObjectId) -> DaoResult<Vec<ObjectId>> {
        let project = match self.base.find_one(doc! { "_id": project_id }).await? {
            Some(p) => p,
            None => return Ok(Vec::new()),
        };

        let mut team = Vec::new();
        if let Some(manager) = project.manager {
            team.push(manager);
        }
        for dev in project.developers {
            if !team.contains(&dev) {
                team.push(dev);
            }
        }
        Ok(team)
    }
}
