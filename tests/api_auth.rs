mod common;

use common::*;
use serde_json::{Value, json};
use shram_setu::api;
use shram_setu::api::v1::RefreshCookie;
use shram_setu::server::Server;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;

type Response = warp::http::Response<Bytes>;

fn server() -> Arc<Server> {
    let ctx = context();
    Arc::new(Server::new(
        ctx.service,
        RefreshCookie {
            secure: false,
            max_age_secs: 604800,
        },
    ))
}

fn body_of(response: &Response) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

fn set_cookie(response: &Response) -> String {
    response
        .headers()
        .get("set-cookie")
        .expect("set-cookie header")
        .to_str()
        .unwrap()
        .to_string()
}

fn refresh_token_of(response: &Response) -> String {
    let cookie = set_cookie(response);
    cookie
        .strip_prefix("refreshToken=")
        .and_then(|rest| rest.split(';').next())
        .unwrap()
        .to_string()
}

fn access_token_of(response: &Response) -> String {
    body_of(response)["data"]["accessToken"]
        .as_str()
        .unwrap()
        .to_string()
}

fn register_body(email: &str) -> Value {
    json!({
        "firstName": "Asha",
        "lastName": "Patil",
        "email": email,
        "phone": "9876543210",
        "password": PASSWORD,
        "role": "worker",
    })
}

async fn register(server: &Arc<Server>, email: &str) -> Response {
    warp::test::request()
        .method("POST")
        .path("/api/v1/auth/register")
        .json(&register_body(email))
        .reply(&api::routes(server.clone()))
        .await
}

async fn refresh(server: &Arc<Server>, token: &str) -> Response {
    warp::test::request()
        .method("POST")
        .path("/api/v1/auth/refresh-token")
        .header("cookie", format!("refreshToken={}", token))
        .reply(&api::routes(server.clone()))
        .await
}

#[tokio::test]
async fn register_returns_201_with_cookie_and_user() {
    let server = server();
    let response = register(&server, "asha@example.com").await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_of(&response);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Registration successful");
    assert_eq!(body["data"]["user"]["email"], "asha@example.com");
    assert_eq!(body["data"]["user"]["role"], "worker");
    assert!(body["data"]["user"].get("passwordHash").is_none());

    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("refreshToken="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Max-Age=604800"));
}

#[tokio::test]
async fn refresh_rotates_the_cookie_and_rejects_the_old_one() {
    let server = server();
    let registered = register(&server, "asha@example.com").await;
    let refresh1 = refresh_token_of(&registered);

    let rotated = refresh(&server, &refresh1).await;
    assert_eq!(rotated.status(), StatusCode::OK);
    assert_eq!(body_of(&rotated)["message"], "Token refreshed");
    let refresh2 = refresh_token_of(&rotated);
    assert_ne!(refresh1, refresh2);
    assert!(!access_token_of(&rotated).is_empty());

    let replayed = refresh(&server, &refresh1).await;
    assert_eq!(replayed.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_of(&replayed)["message"],
        "Invalid refresh token. Please log in again."
    );

    let again = refresh(&server, &refresh2).await;
    assert_eq!(again.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_without_cookie_is_401() {
    let server = server();
    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/refresh-token")
        .reply(&api::routes(server))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_of(&response)["message"], "No refresh token provided.");
}

#[tokio::test]
async fn logout_clears_cookie_but_access_token_still_works() {
    let server = server();
    let registered = register(&server, "asha@example.com").await;
    let access = access_token_of(&registered);
    let refresh_token = refresh_token_of(&registered);

    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/logout")
        .header("authorization", format!("Bearer {}", access))
        .reply(&api::routes(server.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("refreshToken=;"));
    assert!(cookie.contains("Max-Age=0"));

    let replayed = refresh(&server, &refresh_token).await;
    assert_eq!(replayed.status(), StatusCode::UNAUTHORIZED);

    let profile = warp::test::request()
        .method("GET")
        .path("/api/v1/auth/profile")
        .header("authorization", format!("Bearer {}", access))
        .reply(&api::routes(server))
        .await;
    assert_eq!(profile.status(), StatusCode::OK);
    assert_eq!(body_of(&profile)["data"]["user"]["firstName"], "Asha");
}

#[tokio::test]
async fn profile_requires_a_bearer_token() {
    let server = server();

    let missing = warp::test::request()
        .method("GET")
        .path("/api/v1/auth/profile")
        .reply(&api::routes(server.clone()))
        .await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_of(&missing)["message"], "Not authorized. Please log in.");

    let garbage = warp::test::request()
        .method("GET")
        .path("/api/v1/auth/profile")
        .header("authorization", "Bearer not-a-token")
        .reply(&api::routes(server))
        .await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_of(&garbage)["message"], "Not authorized. Invalid token.");
}

#[tokio::test]
async fn login_with_wrong_password_is_401() {
    let server = server();
    register(&server, "asha@example.com").await;

    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/login")
        .json(&json!({"email": "asha@example.com", "password": "wrong99"}))
        .reply(&api::routes(server.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_of(&response)["message"], "Invalid email or password.");
    assert!(response.headers().get("set-cookie").is_none());

    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/login")
        .json(&json!({"email": "asha@example.com", "password": PASSWORD}))
        .reply(&api::routes(server))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_of(&response)["message"], "Login successful");
}

#[tokio::test]
async fn validation_errors_are_listed() {
    let server = server();
    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/register")
        .json(&json!({
            "firstName": "Asha",
            "lastName": "Patil",
            "email": "not-an-email",
            "phone": "9876543210",
            "password": PASSWORD,
            "role": "worker",
        }))
        .reply(&api::routes(server.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_of(&response);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"], json!(["Please provide a valid email"]));

    let mut admin = register_body("root@example.com");
    admin["role"] = json!("admin");
    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/register")
        .json(&admin)
        .reply(&api::routes(server))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_of(&response)["errors"],
        json!(["Role must be either worker or hirer"])
    );
}

#[tokio::test]
async fn duplicate_registration_is_400() {
    let server = server();
    register(&server, "asha@example.com").await;

    let response = register(&server, "asha@example.com").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_of(&response)["message"],
        "A user with this email already exists."
    );
}

#[tokio::test]
async fn update_password_issues_a_new_session() {
    let server = server();
    let registered = register(&server, "asha@example.com").await;
    let access = access_token_of(&registered);
    let old_refresh = refresh_token_of(&registered);

    let response = warp::test::request()
        .method("PUT")
        .path("/api/v1/auth/update-password")
        .header("authorization", format!("Bearer {}", access))
        .json(&json!({"currentPassword": PASSWORD, "newPassword": "secret9"}))
        .reply(&api::routes(server.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_of(&response)["message"], "Password updated successfully");
    let new_refresh = refresh_token_of(&response);

    assert_eq!(
        refresh(&server, &old_refresh).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(refresh(&server, &new_refresh).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn capabilities_follow_the_role() {
    let server = server();
    let registered = register(&server, "asha@example.com").await;
    let access = access_token_of(&registered);

    let response = warp::test::request()
        .method("GET")
        .path("/api/v1/auth/capabilities")
        .header("authorization", format!("Bearer {}", access))
        .reply(&api::routes(server))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = &body_of(&response)["data"];
    assert_eq!(data["role"], "worker");
    let operations = data["operations"].as_array().unwrap();
    assert!(operations.contains(&json!("applyToJob")));
    assert!(!operations.contains(&json!("postJob")));
    assert!(!operations.contains(&json!("manageUsers")));
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let server = server();

    let health = warp::test::request()
        .method("GET")
        .path("/")
        .reply(&api::routes(server.clone()))
        .await;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(body_of(&health)["message"], "Shram Setu API v1");

    let missing = warp::test::request()
        .method("GET")
        .path("/api/v1/nope")
        .reply(&api::routes(server))
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_of(&missing)["success"], false);
}

#[tokio::test]
async fn update_profile_returns_the_edited_user() {
    let server = server();
    let registered = register(&server, "asha@example.com").await;
    let access = access_token_of(&registered);
    assert_eq!(
        body_of(&registered)["data"]["user"]["workerDetails"]["availability"],
        true
    );

    let response = warp::test::request()
        .method("PUT")
        .path("/api/v1/auth/profile")
        .header("authorization", format!("Bearer {}", access))
        .json(&json!({"firstName": "Ashwini", "skills": ["painting"], "experience": 4}))
        .reply(&api::routes(server.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(&response);
    assert_eq!(body["message"], "Profile updated");
    assert_eq!(body["data"]["user"]["firstName"], "Ashwini");
    assert_eq!(body["data"]["user"]["workerDetails"]["skills"], json!(["painting"]));
    assert_eq!(body["data"]["user"]["workerDetails"]["experience"], 4);
    assert!(body["data"]["user"].get("hirerDetails").is_none());

    let invalid = warp::test::request()
        .method("PUT")
        .path("/api/v1/auth/profile")
        .header("authorization", format!("Bearer {}", access))
        .json(&json!({"phone": "12345"}))
        .reply(&api::routes(server.clone()))
        .await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_of(&invalid)["errors"],
        json!(["Please provide a valid 10-digit Indian phone number"])
    );

    let anonymous = warp::test::request()
        .method("PUT")
        .path("/api/v1/auth/profile")
        .json(&json!({"firstName": "Ashwini"}))
        .reply(&api::routes(server))
        .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}
