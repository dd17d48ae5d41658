use bson::{doc, oid::ObjectId};
use crewhub_db::models::User;
use mongodb::Database;

use super::base::{BaseDao, DaoResult};

/// Read-only view of the user directory. User CRUD lives with the external
/// collaborator; this core only resolves recipients.
pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    /// All non-deleted users holding `role` (exact match).
    pub async fn find_by_role(&self, role: &str) -> DaoResult<Vec<User>> {
        self.base
            .find_many(doc! { "role": role, "is_deleted": false }, None)
            .await
    }

    /// Non-deleted users whose email matches exactly, case-insensitively.
    pub async fn find_by_email_ci(&self, email: &str) -> DaoResult<Vec<User>> {
        let pattern = format!("^{}$", regex_escape(email.trim()));
        self.base
            .find_many(
                doc! {
                    "email": { "$regex": pattern, "$options": "i" },
                    "is_deleted": false,
                },
                None,
            )
            .await
    }

    /// A single non-deleted user by id, or None.
    pub async fn find_active(&self, user_id: ObjectId) -> DaoResult<Option<User>> {
        self.base
            .find_one(doc! { "_id": user_id, "is_deleted": false })
            .await
    }
}

fn regex_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if r"\.^$|?*+()[]{}".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
