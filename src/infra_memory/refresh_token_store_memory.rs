use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;

pub struct MemoryRefreshTokenStore {
    slots: DashMap<AccountId, RefreshToken>,
}

impl MemoryRefreshTokenStore {
    pub fn new() -> Self {
        MemoryRefreshTokenStore {
            slots: DashMap::new(),
        }
    }
}

impl Default for MemoryRefreshTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn set(&self, account_id: AccountId, token: &RefreshToken) -> Result<(), AuthError> {
        self.slots.insert(account_id, token.clone());
        Ok(())
    }

    async fn get(&self, account_id: AccountId) -> Result<Option<RefreshToken>, AuthError> {
        Ok(self.slots.get(&account_id).map(|slot| slot.value().clone()))
    }

    async fn rotate(
        &self,
        account_id: AccountId,
        presented: &RefreshToken,
        next: &RefreshToken,
    ) -> Result<bool, AuthError> {
        // The shard write lock is held for the compare and the swap.
        match self.slots.get_mut(&account_id) {
            Some(mut slot) if *slot == *presented => {
                *slot = next.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear(&self, account_id: AccountId) -> Result<(), AuthError> {
        self.slots.remove(&account_id);
        Ok(())
    }
}
