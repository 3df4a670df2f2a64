use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

const REFRESH_ROTATE: &str = include_str!("refresh_rotate.lua");

/// One key per account; the value is the current refresh token and it expires
/// together with that token.
pub struct RedisRefreshTokenStore {
    conn: ConnectionManager,
    prefix: String,
    ttl_secs: u64,
    rotate_script: Script,
}

impl RedisRefreshTokenStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>, ttl_secs: u64) -> Self {
        RedisRefreshTokenStore {
            conn,
            prefix: prefix.into(),
            ttl_secs: ttl_secs.max(1),
            rotate_script: Script::new(REFRESH_ROTATE),
        }
    }

    fn key(&self, account_id: AccountId) -> String {
        format!("{}:{}", self.prefix, account_id)
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for RedisRefreshTokenStore {
    async fn set(&self, account_id: AccountId, token: &RefreshToken) -> Result<(), AuthError> {
        let key = self.key(account_id);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, token.as_str(), self.ttl_secs)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, account_id: AccountId) -> Result<Option<RefreshToken>, AuthError> {
        let key = self.key(account_id);
        let mut conn = self.conn.clone();
        let val: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(val.map(RefreshToken))
    }

    async fn rotate(
        &self,
        account_id: AccountId,
        presented: &RefreshToken,
        next: &RefreshToken,
    ) -> Result<bool, AuthError> {
        let key = self.key(account_id);
        let mut conn = self.conn.clone();
        let swapped: i64 = self
            .rotate_script
            .key(&key)
            .arg(presented.as_str())
            .arg(next.as_str())
            .arg(self.ttl_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(swapped == 1)
    }

    async fn clear(&self, account_id: AccountId) -> Result<(), AuthError> {
        let key = self.key(account_id);
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }
}
