use super::session::SessionState;
use super::transport::*;
use std::sync::Arc;
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info, warn};

type RefreshOutcome = Result<String, ClientError>;
type Waiter = oneshot::Sender<RefreshOutcome>;

pub type SessionExpiredHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    // Bumped every time a refresh finishes.
    generation: u64,
    last: Option<RefreshOutcome>,
    waiters: Vec<Waiter>,
}

/// Sends API requests with the current access token and recovers from an
/// expired one. Concurrent 401s share a single refresh call; each request is
/// retried at most once.
///
/// The refresh runs on its own task, so it completes and wakes every waiter
/// even when the request that started it is dropped.
pub struct RequestCoordinator {
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionState>,
    state: Arc<Mutex<RefreshState>>,
    on_session_expired: Option<SessionExpiredHook>,
}

impl RequestCoordinator {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<dyn SessionState>) -> Self {
        RequestCoordinator {
            transport,
            session,
            state: Arc::new(Mutex::new(RefreshState::default())),
            on_session_expired: None,
        }
    }

    /// Called once per failed refresh, after the session has been cleared.
    pub fn with_session_expired_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_session_expired = Some(Arc::new(hook));
        self
    }

    pub async fn schedule_with_auth(&self, request: ApiRequest) -> Result<ApiReply, ClientError> {
        let seen_generation = self.state.lock().await.generation;
        let sent_with = self.session.access_token();
        let reply = self.send_with(&request, sent_with.clone()).await?;
        if !reply.is_unauthorized() {
            return reply.into_result();
        }

        debug!(path = %request.path, "401, refreshing access token");
        let token = self
            .fresh_token(sent_with.as_deref(), seen_generation)
            .await?;

        // The retry's outcome is final, including another 401.
        self.send_with(&request, Some(token)).await?.into_result()
    }

    async fn send_with(
        &self,
        request: &ApiRequest,
        bearer: Option<String>,
    ) -> Result<ApiReply, ClientError> {
        let request = ApiRequest {
            bearer,
            ..request.clone()
        };
        self.transport.send(&request).await
    }

    /// A token newer than `failed`: one already in the session, the outcome of
    /// a refresh that finished after the request was sent, or the result of
    /// the refresh in flight (started here if there is none).
    async fn fresh_token(
        &self,
        failed: Option<&str>,
        seen_generation: u64,
    ) -> Result<String, ClientError> {
        let receiver = {
            let mut state = self.state.lock().await;
            if let Some(current) = self.session.access_token() {
                if Some(current.as_str()) != failed {
                    return Ok(current);
                }
            }
            if state.generation != seen_generation {
                if let Some(last) = &state.last {
                    return last.clone();
                }
            }

            let (sender, receiver) = oneshot::channel();
            state.waiters.push(sender);
            if !state.in_flight {
                state.in_flight = true;
                self.spawn_refresh();
            }
            receiver
        };

        receiver
            .await
            .unwrap_or_else(|_| Err(ClientError::Transport("refresh was abandoned".to_string())))
    }

    fn spawn_refresh(&self) {
        let transport = self.transport.clone();
        let session = self.session.clone();
        let state = self.state.clone();
        let on_session_expired = self.on_session_expired.clone();

        tokio::spawn(async move {
            let outcome = match transport.refresh().await {
                Ok(token) => {
                    session.store_access_token(token.clone());
                    Ok(token)
                }
                Err(e) => {
                    session.clear();
                    Err(ClientError::RefreshFailed(Arc::new(e)))
                }
            };

            let waiters = {
                let mut state = state.lock().await;
                state.in_flight = false;
                state.generation += 1;
                state.last = Some(outcome.clone());
                std::mem::take(&mut state.waiters)
            };

            match &outcome {
                Ok(_) => info!(waiters = waiters.len(), "access token refreshed"),
                Err(e) => {
                    warn!(waiters = waiters.len(), "refresh failed, session expired: {}", e);
                    if let Some(hook) = &on_session_expired {
                        hook();
                    }
                }
            }

            for waiter in waiters {
                let _ = waiter.send(outcome.clone());
            }
        });
    }
}
