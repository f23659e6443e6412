//! User lookups for the ledger.

use async_trait::async_trait;

use crate::db::connection::DbPool;
use crate::error::AppError;
use crate::models::user::User;
use crate::types::UserId;

const TABLE_NAME: &str = "users";
const SELECT_COLUMNS: &str =
    "id, username, overtime_subtraction_model, overtime_subtraction_amount, created_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<User, AppError>;
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<User, AppError> {
        let query = format!("SELECT {} FROM {} WHERE id = $1", SELECT_COLUMNS, TABLE_NAME);
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }
}
