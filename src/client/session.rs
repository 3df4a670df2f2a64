use std::sync::RwLock;

/// Where the client keeps its current access token between requests.
pub trait SessionState: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn store_access_token(&self, token: String);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemorySessionState {
    access_token: RwLock<Option<String>>,
}

impl MemorySessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        MemorySessionState {
            access_token: RwLock::new(Some(token.into())),
        }
    }
}

impl SessionState for MemorySessionState {
    fn access_token(&self) -> Option<String> {
        self.access_token
            .read()
            .ok()
            .and_then(|token| token.clone())
    }

    fn store_access_token(&self, token: String) {
        if let Ok(mut lock) = self.access_token.write() {
            *lock = Some(token);
        }
    }

    fn clear(&self) {
        if let Ok(mut lock) = self.access_token.write() {
            *lock = None;
        }
    }
}
