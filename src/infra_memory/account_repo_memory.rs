use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use std::sync::Mutex;

/// Account store for tests and the `memory` storage backend.
pub struct MemoryAccountRepo {
    accounts: DashMap<AccountId, Account>,
    // email -> id; guarded separately so uniqueness is checked and claimed atomically
    emails: Mutex<std::collections::HashMap<String, AccountId>>,
}

impl MemoryAccountRepo {
    pub fn new() -> Self {
        MemoryAccountRepo {
            accounts: DashMap::new(),
            emails: Mutex::new(std::collections::HashMap::new()),
        }
    }

    /// Remove an account outright. Only used to simulate deleted subjects.
    pub fn remove(&self, id: AccountId) {
        if let Some((_, account)) = self.accounts.remove(&id) {
            if let Ok(mut emails) = self.emails.lock() {
                emails.remove(&account.email);
            }
        }
    }
}

impl Default for MemoryAccountRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AccountRepo for MemoryAccountRepo {
    async fn create(&self, account: &Account) -> Result<(), AuthError> {
        let mut emails = self
            .emails
            .lock()
            .map_err(|e| AuthError::Store(e.to_string()))?;
        if emails.contains_key(&account.email) {
            return Err(AuthError::EmailTaken);
        }
        emails.insert(account.email.clone(), account.id);
        self.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, AuthError> {
        Ok(self.accounts.get(&id).map(|entry| entry.value().clone()))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        let id = {
            let emails = self
                .emails
                .lock()
                .map_err(|e| AuthError::Store(e.to_string()))?;
            emails.get(email).copied()
        };
        match id {
            Some(id) => self.get_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let emails = self
            .emails
            .lock()
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(emails.contains_key(email))
    }

    async fn update_password_hash(
        &self,
        id: AccountId,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        let mut account = self.accounts.get_mut(&id).ok_or(AuthError::AccountMissing)?;
        account.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn update_profile(&self, account: &Account) -> Result<(), AuthError> {
        let mut stored = self
            .accounts
            .get_mut(&account.id)
            .ok_or(AuthError::AccountMissing)?;
        stored.first_name = account.first_name.clone();
        stored.last_name = account.last_name.clone();
        stored.phone = account.phone.clone();
        stored.worker_details = account.worker_details.clone();
        stored.hirer_details = account.hirer_details.clone();
        Ok(())
    }

    async fn set_blocked(&self, id: AccountId, blocked: bool) -> Result<(), AuthError> {
        let mut account = self.accounts.get_mut(&id).ok_or(AuthError::AccountMissing)?;
        account.is_blocked = blocked;
        Ok(())
    }
}
