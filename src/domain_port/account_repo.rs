use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait AccountRepo: Send + Sync {
    /// Insert a new account. Fails with `EmailTaken` when the email is in use.
    async fn create(&self, account: &Account) -> Result<(), AuthError>;

    async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, AuthError>;

    /// Fetch by normalized email (for login).
    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, AuthError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError>;

    async fn update_password_hash(
        &self,
        id: AccountId,
        password_hash: &str,
    ) -> Result<(), AuthError>;

    /// Overwrite the editable profile fields: names, phone and role details.
    async fn update_profile(&self, account: &Account) -> Result<(), AuthError>;

    async fn set_blocked(&self, id: AccountId, blocked: bool) -> Result<(), AuthError>;
}
