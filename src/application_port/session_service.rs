use crate::domain_model::{Account, AccountId, HirerDetails, Operation, Role, WorkerDetails};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token expired")]
    TokenExpired,
    #[error("token malformed")]
    TokenMalformed,
    #[error("refresh token is stale")]
    RefreshStale,
    #[error("account no longer exists")]
    AccountMissing,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account is blocked")]
    AccountBlocked,
    #[error("email already registered")]
    EmailTaken,
    #[error("current password is incorrect")]
    IncorrectPassword,
    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("role '{role}' may not perform {operation:?}")]
    Forbidden { role: Role, operation: Operation },
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Messages in field order, so clients get a stable list.
    pub fn from_validation(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        let messages = fields
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("{}: invalid value", field),
                })
            })
            .collect();
        AuthError::Validation(messages)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct AccessToken(pub String);

#[derive(Clone, Eq, PartialEq)]
pub struct RefreshToken(pub String);

impl RefreshToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep refresh tokens out of logs.
impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshToken(..)")
    }
}

#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SessionResult {
    pub account: Account,
    pub tokens: AuthTokens,
}

#[derive(Debug, Clone, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 2, max = 50, message = "First name must be 2-50 characters"))]
    pub first_name: String,
    #[validate(length(min = 2, max = 50, message = "Last name must be 2-50 characters"))]
    pub last_name: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(custom(
        function = "validate_phone",
        message = "Please provide a valid 10-digit Indian phone number"
    ))]
    pub phone: String,
    #[validate(custom(
        function = "validate_password",
        message = "Password must be at least 6 characters and contain a number"
    ))]
    pub password: String,
    pub role: Role,
    /// Ignored unless `role` is worker; defaults apply when absent.
    pub worker_details: Option<WorkerDetails>,
    /// Ignored unless `role` is hirer.
    pub hirer_details: Option<HirerDetails>,
}

#[derive(Debug, Clone, Validate)]
pub struct LoginInput {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Validate)]
pub struct ChangePasswordInput {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(custom(
        function = "validate_password",
        message = "Password must be at least 6 characters and contain a number"
    ))]
    pub new_password: String,
}

/// Partial profile update. `None` leaves a field untouched; role fields that
/// do not match the account's role are ignored.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(min = 2, max = 50, message = "First name must be 2-50 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 2, max = 50, message = "Last name must be 2-50 characters"))]
    pub last_name: Option<String>,
    #[validate(custom(
        function = "validate_phone",
        message = "Please provide a valid 10-digit Indian phone number"
    ))]
    pub phone: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<u32>,
    pub daily_wage: Option<u32>,
    pub availability: Option<bool>,
    pub company_name: Option<String>,
    pub work_location: Option<String>,
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let bytes = phone.as_bytes();
    let valid = bytes.len() == 10
        && matches!(bytes[0], b'6'..=b'9')
        && bytes.iter().all(u8::is_ascii_digit);
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("phone"))
    }
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() >= 6 && password.chars().any(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("password"))
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    async fn issue_access_token(
        &self,
        subject: AccountId,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError>;
    async fn issue_refresh_token(
        &self,
        subject: AccountId,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError>;
    /// Fails with `TokenExpired` past the TTL and `TokenMalformed` for anything
    /// that is not a well-formed token of `kind` signed with its secret.
    async fn verify(&self, token: &str, kind: TokenKind) -> Result<AccountId, AuthError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    async fn register(&self, input: RegisterInput) -> Result<SessionResult, AuthError>;
    async fn login(&self, input: LoginInput) -> Result<SessionResult, AuthError>;
    /// Single-use rotation: the presented token is invalid afterwards.
    async fn refresh(&self, presented: &RefreshToken) -> Result<AuthTokens, AuthError>;
    async fn logout(&self, account_id: AccountId) -> Result<(), AuthError>;
    async fn authenticate(&self, access_token: &str) -> Result<Account, AuthError>;
    async fn profile(&self, account_id: AccountId) -> Result<Account, AuthError>;
    async fn update_profile(
        &self,
        account_id: AccountId,
        input: UpdateProfileInput,
    ) -> Result<Account, AuthError>;
    async fn change_password(
        &self,
        account_id: AccountId,
        input: ChangePasswordInput,
    ) -> Result<AuthTokens, AuthError>;
    fn authorize(&self, account: &Account, operation: Operation) -> Result<(), AuthError>;
}
