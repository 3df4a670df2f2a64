use serde_json::json;
use shram_setu::client::*;
use shram_setu::logger::*;
use std::sync::Arc;

/// Logs in against a running server and fetches the profile through the
/// request coordinator. Usage: client_demo [base_url] [email] [password]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _logger = Logger::new_bootstrap();

    let mut args = std::env::args().skip(1);
    let base_url = args.next().unwrap_or_else(|| "http://127.0.0.1:5000".to_string());
    let email = args.next().unwrap_or_else(|| "asha@example.com".to_string());
    let password = args.next().unwrap_or_else(|| "secret1".to_string());

    let transport = Arc::new(HttpTransport::new(base_url)?);
    let session = Arc::new(MemorySessionState::new());

    let login = transport
        .send(&ApiRequest::post(
            "/api/v1/auth/login",
            json!({"email": email, "password": password}),
        ))
        .await?
        .into_result()?;
    session.store_access_token(access_token_of(&login)?);
    info!("logged in");

    let coordinator = RequestCoordinator::new(transport.clone(), session.clone())
        .with_session_expired_hook(|| warn!("session expired, log in again"));

    let profile = coordinator
        .schedule_with_auth(ApiRequest::get("/api/v1/auth/profile"))
        .await?;
    info!(user = %profile.body["data"]["user"], "profile");

    // Forces the refresh path: the stale token gets a 401 and is replaced.
    session.store_access_token("stale".to_string());
    let capabilities = coordinator
        .schedule_with_auth(ApiRequest::get("/api/v1/auth/capabilities"))
        .await?;
    info!(operations = %capabilities.body["data"]["operations"], "capabilities");

    Ok(())
}
