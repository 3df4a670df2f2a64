use crate::api::v1::RefreshCookie;
use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::{Auth, Settings};
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

pub struct Server {
    pub session_service: Arc<dyn SessionService>,
    pub refresh_cookie: Arc<RefreshCookie>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    /// Wires an already built service, for tests and embedding.
    pub fn new(session_service: Arc<dyn SessionService>, refresh_cookie: RefreshCookie) -> Self {
        Self {
            session_service,
            refresh_cookie: Arc::new(refresh_cookie),
            pool: None,
        }
    }

    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let token_codec: Arc<dyn TokenCodec> =
            Arc::new(JwtHs256Codec::new(jwt_config(&settings.auth)?));
        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher::new());

        let storage = &settings.storage;
        let mut pool = None;
        let (accounts, refresh_store): (Arc<dyn AccountRepo>, Arc<dyn RefreshTokenStore>) =
            match storage.backend.as_str() {
                "memory" => {
                    warn!("memory storage: accounts and sessions are lost on restart");
                    (
                        Arc::new(MemoryAccountRepo::new()),
                        Arc::new(MemoryRefreshTokenStore::new()),
                    )
                }
                "mysql" => {
                    let mysql = connect_mysql(storage.mysql_dsn.as_deref()).await?;
                    pool = Some(mysql.clone());
                    (
                        Arc::new(MySqlAccountRepo::new(mysql.clone())),
                        Arc::new(MySqlRefreshTokenStore::new(mysql)),
                    )
                }
                "redis" => {
                    let mysql = connect_mysql(storage.mysql_dsn.as_deref()).await?;
                    pool = Some(mysql.clone());

                    let redis_dsn = storage
                        .redis_dsn
                        .as_deref()
                        .ok_or_else(|| anyhow::anyhow!("storage.redis_dsn is required"))?;
                    let redis_client = redis::Client::open(redis_dsn)?;
                    let redis_manager = redis_client.get_connection_manager().await?;
                    let prefix = storage
                        .redis_prefix
                        .clone()
                        .unwrap_or_else(|| "auth:refresh".to_string());
                    (
                        Arc::new(MySqlAccountRepo::new(mysql)),
                        Arc::new(RedisRefreshTokenStore::new(
                            redis_manager,
                            prefix,
                            settings.auth.refresh_ttl_secs,
                        )),
                    )
                }
                other => return Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
            };

        let session_service: Arc<dyn SessionService> = Arc::new(RealSessionService::new(
            accounts,
            refresh_store,
            credential_hasher,
            token_codec,
        ));

        let refresh_cookie = RefreshCookie {
            secure: settings.auth.cookie_secure,
            max_age_secs: settings.auth.refresh_ttl_secs,
        };

        info!(backend = %storage.backend, "server started");

        Ok(Self {
            session_service,
            refresh_cookie: Arc::new(refresh_cookie),
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

async fn connect_mysql(dsn: Option<&str>) -> anyhow::Result<Pool<MySql>> {
    let dsn = dsn.ok_or_else(|| anyhow::anyhow!("storage.mysql_dsn is required"))?;
    Ok(Pool::<MySql>::connect(dsn).await?)
}

/// `JWT_SECRET` and `JWT_REFRESH_SECRET` take precedence over the settings file.
pub fn jwt_config(auth: &Auth) -> anyhow::Result<JwtConfig> {
    let access_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| auth.access_secret.clone());
    let refresh_secret =
        std::env::var("JWT_REFRESH_SECRET").unwrap_or_else(|_| auth.refresh_secret.clone());

    if access_secret.is_empty() || refresh_secret.is_empty() {
        return Err(anyhow::anyhow!("JWT secrets must not be empty"));
    }
    if access_secret == refresh_secret {
        warn!("access and refresh tokens share a secret; only the typ claim separates them");
    }

    Ok(JwtConfig {
        issuer: auth.issuer.clone(),
        audience: auth.audience.clone(),
        access_ttl: Duration::from_secs(auth.access_ttl_secs),
        refresh_ttl: Duration::from_secs(auth.refresh_ttl_secs),
        access_secret: access_secret.into_bytes(),
        refresh_secret: refresh_secret.into_bytes(),
    })
}
