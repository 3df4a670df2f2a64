use crate::application_port::{AccessToken, AuthError, RefreshToken, TokenCodec, TokenKind};
use crate::domain_model::AccountId;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // account id
    typ: TokenKind,
    jti: String, // makes tokens issued within the same second distinct
    iat: i64,
    exp: i64,
    iss: String,
    aud: String,
}

struct KindKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

pub struct JwtHs256Codec {
    issuer: String,
    audience: String,
    access: KindKeys,
    refresh: KindKeys,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHs256Codec {
            issuer: cfg.issuer,
            audience: cfg.audience,
            access: KindKeys {
                encoding: EncodingKey::from_secret(&cfg.access_secret),
                decoding: DecodingKey::from_secret(&cfg.access_secret),
                ttl: cfg.access_ttl,
            },
            refresh: KindKeys {
                encoding: EncodingKey::from_secret(&cfg.refresh_secret),
                decoding: DecodingKey::from_secret(&cfg.refresh_secret),
                ttl: cfg.refresh_ttl,
            },
        }
    }

    fn keys(&self, kind: TokenKind) -> &KindKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    #[inline]
    fn gen_jti() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn encode_at(
        &self,
        subject: AccountId,
        kind: TokenKind,
        issued_at: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), AuthError> {
        let keys = self.keys(kind);
        let expires_at = issued_at + keys.ttl;
        let claims = Claims {
            sub: subject.to_string(),
            typ: kind,
            jti: Self::gen_jti(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        Ok((token, expires_at))
    }

    fn decode(&self, token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
        let mut v = Validation::new(Algorithm::HS256);
        v.validate_exp = true;
        v.leeway = 0;
        v.set_audience(&[self.audience.clone()]);
        v.set_issuer(&[self.issuer.clone()]);
        let data = decode::<Claims>(token, &self.keys(kind).decoding, &v).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenMalformed,
            }
        })?;
        if data.claims.typ != kind {
            return Err(AuthError::TokenMalformed);
        }
        Ok(data.claims)
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs256Codec {
    async fn issue_access_token(
        &self,
        subject: AccountId,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let (token, exp) = self.encode_at(subject, TokenKind::Access, Utc::now())?;
        Ok((AccessToken(token), exp))
    }

    async fn issue_refresh_token(
        &self,
        subject: AccountId,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError> {
        let (token, exp) = self.encode_at(subject, TokenKind::Refresh, Utc::now())?;
        Ok((RefreshToken(token), exp))
    }

    async fn verify(&self, token: &str, kind: TokenKind) -> Result<AccountId, AuthError> {
        let claims = self.decode(token, kind)?;
        claims
            .sub
            .parse::<AccountId>()
            .map_err(|_| AuthError::TokenMalformed)
    }
}
