use crate::application_port::*;
use crate::domain_model::*;

/// Single-slot store holding the one refresh token an account may use.
#[async_trait::async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Overwrite the slot unconditionally (login, password change).
    async fn set(&self, account_id: AccountId, token: &RefreshToken) -> Result<(), AuthError>;

    async fn get(&self, account_id: AccountId) -> Result<Option<RefreshToken>, AuthError>;

    /// Exact equality against the stored value. An empty slot matches nothing.
    async fn matches(
        &self,
        account_id: AccountId,
        presented: &RefreshToken,
    ) -> Result<bool, AuthError> {
        Ok(self
            .get(account_id)
            .await?
            .is_some_and(|current| current == *presented))
    }

    /// Compare-and-swap: store `next` only if the slot still holds `presented`.
    /// Returns `false` without writing when another rotation or a logout got there first.
    async fn rotate(
        &self,
        account_id: AccountId,
        presented: &RefreshToken,
        next: &RefreshToken,
    ) -> Result<bool, AuthError>;

    async fn clear(&self, account_id: AccountId) -> Result<(), AuthError>;
}
