#![allow(dead_code)]

use shram_setu::application_impl::*;
use shram_setu::application_port::*;
use shram_setu::domain_model::Role;
use shram_setu::infra_memory::*;
use std::sync::Arc;
use std::time::Duration;

pub const PASSWORD: &str = "secret1";

pub struct TestContext {
    pub accounts: Arc<MemoryAccountRepo>,
    pub refresh_store: Arc<MemoryRefreshTokenStore>,
    pub service: Arc<RealSessionService>,
}

pub fn jwt_config(access_ttl: Duration, refresh_ttl: Duration) -> JwtConfig {
    JwtConfig {
        issuer: "shram-setu.test".to_string(),
        audience: "shram-setu-test".to_string(),
        access_ttl,
        refresh_ttl,
        access_secret: b"test-access-secret".to_vec(),
        refresh_secret: b"test-refresh-secret".to_vec(),
    }
}

pub fn context() -> TestContext {
    context_with_ttls(Duration::from_secs(900), Duration::from_secs(604800))
}

pub fn context_with_ttls(access_ttl: Duration, refresh_ttl: Duration) -> TestContext {
    let accounts = Arc::new(MemoryAccountRepo::new());
    let refresh_store = Arc::new(MemoryRefreshTokenStore::new());
    let hasher = Argon2PasswordHasher::with_params(8, 1, 1).unwrap();
    let codec = JwtHs256Codec::new(jwt_config(access_ttl, refresh_ttl));
    let service = Arc::new(RealSessionService::new(
        accounts.clone(),
        refresh_store.clone(),
        Arc::new(hasher),
        Arc::new(codec),
    ));
    TestContext {
        accounts,
        refresh_store,
        service,
    }
}

pub fn register_input(email: &str, role: Role) -> RegisterInput {
    RegisterInput {
        first_name: "Asha".to_string(),
        last_name: "Patil".to_string(),
        email: email.to_string(),
        phone: "9876543210".to_string(),
        password: PASSWORD.to_string(),
        role,
        worker_details: None,
        hirer_details: None,
    }
}

pub fn login_input(email: &str) -> LoginInput {
    LoginInput {
        email: email.to_string(),
        password: PASSWORD.to_string(),
    }
}
