use super::MySqlAccountRepo;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::MySqlPool;

/// Refresh slot kept in the `refresh_token` column of the account row.
pub struct MySqlRefreshTokenStore {
    pool: MySqlPool,
}

impl MySqlRefreshTokenStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlRefreshTokenStore { pool }
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for MySqlRefreshTokenStore {
    async fn set(&self, account_id: AccountId, token: &RefreshToken) -> Result<(), AuthError> {
        sqlx::query("UPDATE account SET refresh_token = ? WHERE account_id = ?")
            .bind(token.as_str())
            .bind(MySqlAccountRepo::id_as_bytes(&account_id))
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, account_id: AccountId) -> Result<Option<RefreshToken>, AuthError> {
        let token: Option<Option<String>> =
            sqlx::query_scalar("SELECT refresh_token FROM account WHERE account_id = ?")
                .bind(MySqlAccountRepo::id_as_bytes(&account_id))
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(token.flatten().map(RefreshToken))
    }

    async fn rotate(
        &self,
        account_id: AccountId,
        presented: &RefreshToken,
        next: &RefreshToken,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r#"
UPDATE account
SET refresh_token = ?
WHERE account_id = ? AND refresh_token = ?
"#,
        )
        .bind(next.as_str())
        .bind(MySqlAccountRepo::id_as_bytes(&account_id))
        .bind(presented.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn clear(&self, account_id: AccountId) -> Result<(), AuthError> {
        sqlx::query("UPDATE account SET refresh_token = NULL WHERE account_id = ?")
            .bind(MySqlAccountRepo::id_as_bytes(&account_id))
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }
}
