//! # User Repository
//!
//! Users are created implicitly, the first time they add a book.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use shelf_core::User;

/// Repository for user records.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Returns the store id for `external_user_id`, creating the user if needed.
    ///
    /// ## Concurrency
    /// Two first requests of the same user may both miss the lookup. The
    /// UNIQUE constraint rejects the second insert, which then re-reads the
    /// row the first one wrote; both callers get the same id.
    pub async fn ensure_user(&self, external_user_id: i64) -> DbResult<i64> {
        if let Some(user) = self.get_user(external_user_id).await? {
            return Ok(user.id);
        }

        let inserted = sqlx::query("INSERT INTO users (external_user_id) VALUES (?1)")
            .bind(external_user_id)
            .execute(&self.pool)
            .await;

        match inserted {
            Ok(result) => {
                let id = result.last_insert_rowid();
                debug!(external_user_id, id, "Created user");
                Ok(id)
            }
            Err(e) => {
                let err = DbError::from(e);
                if !err.is_unique_violation() {
                    return Err(err);
                }
                debug!(external_user_id, "Lost user insert race, re-reading");
                let id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE external_user_id = ?1")
                    .bind(external_user_id)
                    .fetch_one(&self.pool)
                    .await?;
                Ok(id)
            }
        }
    }

    /// Looks up a user by platform id.
    pub async fn get_user(&self, external_user_id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, external_user_id FROM users WHERE external_user_id = ?1",
        )
        .bind(external_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_ensure_user_is_stable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        assert!(users.get_user(42).await.unwrap().is_none());

        let first = users.ensure_user(42).await.unwrap();
        let second = users.ensure_user(42).await.unwrap();
        assert_eq!(first, second);

        let other = users.ensure_user(43).await.unwrap();
        assert_ne!(first, other);

        let user = users.get_user(42).await.unwrap().unwrap();
        assert_eq!(user.id, first);
        assert_eq!(user.external_user_id, 42);
    }

    #[tokio::test]
    async fn test_concurrent_first_interactions_share_one_user() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("users.db")))
            .await
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let users = db.users();
                tokio::spawn(async move { users.ensure_user(7).await.unwrap() })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
