use super::cookie::RefreshCookie;
use super::error::*;
use crate::application_port::*;
use crate::domain_model::{Account, HirerDetails, Operation, Role, WorkerDetails};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::{StatusCode, header};
use warp::{self, Reply, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
        }
    }

    pub fn err(code: &ApiErrorCode) -> Self {
        ApiResponse {
            success: false,
            message: code.to_string(),
            data: None,
            errors: code.details(),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        ApiResponse {
            success: true,
            message: message.into(),
            data: None,
            errors: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: uuid::Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_details: Option<WorkerDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hirer_details: Option<HirerDetails>,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for UserView {
    fn from(account: &Account) -> Self {
        UserView {
            id: account.id.0,
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
            phone: account.phone.clone(),
            role: account.role,
            worker_details: account.worker_details.clone(),
            hirer_details: account.hirer_details.clone(),
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
}

impl SessionView {
    fn new(tokens: &AuthTokens, account: Option<&Account>) -> Self {
        SessionView {
            access_token: tokens.access_token.0.clone(),
            access_token_expires_at: tokens.access_token_expires_at,
            user: account.map(UserView::from),
        }
    }
}

/// Sets the rotated refresh cookie alongside a JSON envelope.
fn session_reply<T: Serialize>(
    status: StatusCode,
    body: &ApiResponse<T>,
    cookie: &RefreshCookie,
    refresh_token: &RefreshToken,
) -> impl Reply + use<T> {
    let reply = warp::reply::with_status(warp::reply::json(body), status);
    warp::reply::with_header(reply, header::SET_COOKIE, cookie.issue(refresh_token))
}

// Missing fields become validation messages instead of body errors.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub role: String,
    pub skills: Vec<String>,
    pub experience: Option<u32>,
    pub daily_wage: Option<u32>,
    pub availability: Option<bool>,
    pub company_name: Option<String>,
    pub work_location: Option<String>,
}

pub async fn register(
    body: RegisterRequest,
    session_service: Arc<dyn SessionService>,
    refresh_cookie: Arc<RefreshCookie>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let role = body
        .role
        .trim()
        .parse::<Role>()
        .map_err(|_| {
            ApiErrorCode::Validation(vec!["Role must be either worker or hirer".to_string()])
        })
        .map_err(reject::custom)?;

    let input = RegisterInput {
        first_name: body.first_name,
        last_name: body.last_name,
        email: body.email,
        phone: body.phone,
        password: body.password,
        role,
        worker_details: Some(WorkerDetails {
            skills: body.skills,
            experience: body.experience.unwrap_or(0),
            daily_wage: body.daily_wage.unwrap_or(0),
            availability: body.availability.unwrap_or(true),
        }),
        hirer_details: Some(HirerDetails {
            company_name: body.company_name.unwrap_or_default(),
            work_location: body.work_location.unwrap_or_default(),
        }),
    };
    let result = session_service
        .register(input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response = ApiResponse::ok(
        "Registration successful",
        SessionView::new(&result.tokens, Some(&result.account)),
    );
    Ok(session_reply(
        StatusCode::CREATED,
        &response,
        &refresh_cookie,
        &result.tokens.refresh_token,
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    body: LoginRequest,
    session_service: Arc<dyn SessionService>,
    refresh_cookie: Arc<RefreshCookie>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let input = LoginInput {
        email: body.email,
        password: body.password,
    };
    let result = session_service
        .login(input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response = ApiResponse::ok(
        "Login successful",
        SessionView::new(&result.tokens, Some(&result.account)),
    );
    Ok(session_reply(
        StatusCode::OK,
        &response,
        &refresh_cookie,
        &result.tokens.refresh_token,
    ))
}

pub async fn refresh(
    cookie: Option<String>,
    session_service: Arc<dyn SessionService>,
    refresh_cookie: Arc<RefreshCookie>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let presented = match cookie {
        Some(value) if !value.is_empty() => RefreshToken(value),
        _ => return Err(reject::custom(ApiErrorCode::NoRefreshToken)),
    };

    let tokens = session_service
        .refresh(&presented)
        .await
        .map_err(ApiErrorCode::from_refresh)
        .map_err(reject::custom)?;

    let response = ApiResponse::ok("Token refreshed", SessionView::new(&tokens, None));
    Ok(session_reply(
        StatusCode::OK,
        &response,
        &refresh_cookie,
        &tokens.refresh_token,
    ))
}

pub async fn logout(
    account: Account,
    session_service: Arc<dyn SessionService>,
    refresh_cookie: Arc<RefreshCookie>,
) -> Result<impl warp::Reply, warp::Rejection> {
    session_service
        .logout(account.id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let reply = warp::reply::json(&ApiResponse::message("Logged out successfully"));
    Ok(warp::reply::with_header(
        reply,
        header::SET_COOKIE,
        refresh_cookie.clear(),
    ))
}

#[derive(Debug, Serialize)]
struct ProfileResponse {
    user: UserView,
}

pub async fn profile(
    account: Account,
    session_service: Arc<dyn SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let account = session_service
        .profile(account.id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response = ApiResponse::ok(
        "Profile fetched",
        ProfileResponse {
            user: UserView::from(&account),
        },
    );
    Ok(warp::reply::json(&response))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<u32>,
    pub daily_wage: Option<u32>,
    pub availability: Option<bool>,
    pub company_name: Option<String>,
    pub work_location: Option<String>,
}

pub async fn update_profile(
    account: Account,
    body: UpdateProfileRequest,
    session_service: Arc<dyn SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let input = UpdateProfileInput {
        first_name: body.first_name,
        last_name: body.last_name,
        phone: body.phone,
        skills: body.skills,
        experience: body.experience,
        daily_wage: body.daily_wage,
        availability: body.availability,
        company_name: body.company_name,
        work_location: body.work_location,
    };
    let account = session_service
        .update_profile(account.id, input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response = ApiResponse::ok(
        "Profile updated",
        ProfileResponse {
            user: UserView::from(&account),
        },
    );
    Ok(warp::reply::json(&response))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn update_password(
    account: Account,
    body: UpdatePasswordRequest,
    session_service: Arc<dyn SessionService>,
    refresh_cookie: Arc<RefreshCookie>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let input = ChangePasswordInput {
        current_password: body.current_password,
        new_password: body.new_password,
    };
    let tokens = session_service
        .change_password(account.id, input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response = ApiResponse::ok(
        "Password updated successfully",
        SessionView::new(&tokens, None),
    );
    Ok(session_reply(
        StatusCode::OK,
        &response,
        &refresh_cookie,
        &tokens.refresh_token,
    ))
}

#[derive(Debug, Serialize)]
struct CapabilitiesResponse {
    role: Role,
    operations: Vec<Operation>,
}

pub async fn capabilities(
    account: Account,
    session_service: Arc<dyn SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let operations = Operation::ALL
        .into_iter()
        .filter(|operation| session_service.authorize(&account, *operation).is_ok())
        .collect();

    let response = ApiResponse::ok(
        "Capabilities fetched",
        CapabilitiesResponse {
            role: account.role,
            operations,
        },
    );
    Ok(warp::reply::json(&response))
}

pub async fn health() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&serde_json::json!({
        "success": true,
        "message": "Shram Setu API v1",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/api/v1",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_optionals_are_not_serialized() {
        let value = serde_json::to_value(ApiResponse::message("Logged out successfully")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"success": true, "message": "Logged out successfully"})
        );
    }

    #[test]
    fn error_envelope_carries_validation_details() {
        let code = ApiErrorCode::Validation(vec!["Please provide a valid email".to_string()]);
        let value = serde_json::to_value(ApiResponse::<()>::err(&code)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "success": false,
                "message": "Validation failed",
                "errors": ["Please provide a valid email"],
            })
        );
    }

    #[test]
    fn register_request_tolerates_missing_fields() {
        let body: RegisterRequest = serde_json::from_str(r#"{"firstName":"Asha"}"#).unwrap();
        assert_eq!(body.first_name, "Asha");
        assert!(body.email.is_empty());
        assert!(body.skills.is_empty());
        assert_eq!(body.availability, None);
    }

    #[test]
    fn user_view_shows_only_the_matching_role_details() {
        let account = Account {
            id: crate::domain_model::AccountId::new_random(),
            first_name: "Ravi".to_string(),
            last_name: "Kumar".to_string(),
            email: "ravi@example.com".to_string(),
            phone: "9123456780".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Hirer,
            is_blocked: false,
            worker_details: None,
            hirer_details: Some(HirerDetails {
                company_name: "Kumar Constructions".to_string(),
                work_location: "Pune".to_string(),
            }),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(UserView::from(&account)).unwrap();
        assert_eq!(value["hirerDetails"]["companyName"], "Kumar Constructions");
        assert!(value.get("workerDetails").is_none());
        assert!(value.get("passwordHash").is_none());
    }
}
