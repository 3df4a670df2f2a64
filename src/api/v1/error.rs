use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    // Route-specific rejections first: every other route in the `or` chain
    // contributes a not-found or method rejection for the same request.
    let code = if let Some(code) = err.find::<ApiErrorCode>() {
        code.clone()
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ApiErrorCode::BadRequest(e.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        ApiErrorCode::BadRequest("payload too large".to_string())
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        ApiErrorCode::BadRequest("expected a JSON body".to_string())
    } else if err.is_not_found() || err.find::<warp::reject::MethodNotAllowed>().is_some() {
        ApiErrorCode::RouteNotFound
    } else {
        warn!(?err, "unhandled rejection");
        ApiErrorCode::InternalError
    };

    let json = warp::reply::json(&ApiResponse::<()>::err(&code));
    Ok(warp::reply::with_status(json, code.status()))
}

#[derive(Debug, Clone, Error)]
pub enum ApiErrorCode {
    #[error("Validation failed")]
    Validation(Vec<String>),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("A user with this email already exists.")]
    EmailTaken,
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("Current password is incorrect.")]
    IncorrectPassword,
    #[error("Not authorized. Please log in.")]
    NotAuthorized,
    #[error("Token expired. Please refresh your token.")]
    TokenExpired,
    #[error("Not authorized. Invalid token.")]
    InvalidToken,
    #[error("User no longer exists.")]
    AccountMissing,
    #[error("No refresh token provided.")]
    NoRefreshToken,
    #[error("Invalid refresh token. Please log in again.")]
    InvalidRefreshToken,
    #[error("Your account has been blocked. Contact admin.")]
    AccountBlocked,
    #[error("Access denied. Role '{0}' is not authorized.")]
    Forbidden(String),
    #[error("Route not found")]
    RouteNotFound,
    #[error("Internal Server Error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::Validation(_)
            | ApiErrorCode::BadRequest(_)
            | ApiErrorCode::EmailTaken
            | ApiErrorCode::IncorrectPassword => StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidCredentials
            | ApiErrorCode::NotAuthorized
            | ApiErrorCode::TokenExpired
            | ApiErrorCode::InvalidToken
            | ApiErrorCode::AccountMissing
            | ApiErrorCode::NoRefreshToken
            | ApiErrorCode::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            ApiErrorCode::AccountBlocked | ApiErrorCode::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiErrorCode::RouteNotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn details(&self) -> Option<Vec<String>> {
        match self {
            ApiErrorCode::Validation(messages) => Some(messages.clone()),
            _ => None,
        }
    }

    /// Every way a presented refresh cookie can be unusable looks the same to the client.
    pub fn from_refresh(error: AuthError) -> ApiErrorCode {
        match error {
            AuthError::TokenExpired
            | AuthError::TokenMalformed
            | AuthError::RefreshStale
            | AuthError::AccountMissing => ApiErrorCode::InvalidRefreshToken,
            other => ApiErrorCode::from(other),
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::TokenExpired => ApiErrorCode::TokenExpired,
            AuthError::TokenMalformed => ApiErrorCode::InvalidToken,
            AuthError::RefreshStale => ApiErrorCode::InvalidRefreshToken,
            AuthError::AccountMissing => ApiErrorCode::AccountMissing,
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::AccountBlocked => ApiErrorCode::AccountBlocked,
            AuthError::EmailTaken => ApiErrorCode::EmailTaken,
            AuthError::IncorrectPassword => ApiErrorCode::IncorrectPassword,
            AuthError::Validation(messages) => ApiErrorCode::Validation(messages),
            AuthError::Forbidden { role, .. } => ApiErrorCode::Forbidden(role.to_string()),
            AuthError::Store(e) => ApiErrorCode::internal(e),
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}
