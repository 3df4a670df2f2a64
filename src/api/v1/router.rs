use super::cookie::REFRESH_COOKIE;
use super::error::*;
use super::handler;
use crate::application_port::SessionService;
use crate::domain_model::Account;
use crate::server::*;
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

const JSON_BODY_LIMIT: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let register = warp::post()
        .and(warp::path("register"))
        .and(warp::path::end())
        .and(json_body())
        .and(with(server.session_service.clone()))
        .and(with(server.refresh_cookie.clone()))
        .and_then(handler::register);

    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(json_body())
        .and(with(server.session_service.clone()))
        .and(with(server.refresh_cookie.clone()))
        .and_then(handler::login);

    let refresh = warp::post()
        .and(warp::path("refresh-token"))
        .and(warp::path::end())
        .and(warp::cookie::optional::<String>(REFRESH_COOKIE))
        .and(with(server.session_service.clone()))
        .and(with(server.refresh_cookie.clone()))
        .and_then(handler::refresh);

    let logout = warp::post()
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(with_authentication(server.session_service.clone()))
        .and(with(server.session_service.clone()))
        .and(with(server.refresh_cookie.clone()))
        .and_then(handler::logout);

    let profile = warp::get()
        .and(warp::path("profile"))
        .and(warp::path::end())
        .and(with_authentication(server.session_service.clone()))
        .and(with(server.session_service.clone()))
        .and_then(handler::profile);

    let update_profile = warp::put()
        .and(warp::path("profile"))
        .and(warp::path::end())
        .and(with_authentication(server.session_service.clone()))
        .and(json_body())
        .and(with(server.session_service.clone()))
        .and_then(handler::update_profile);

    let update_password = warp::put()
        .and(warp::path("update-password"))
        .and(warp::path::end())
        .and(with_authentication(server.session_service.clone()))
        .and(json_body())
        .and(with(server.session_service.clone()))
        .and(with(server.refresh_cookie.clone()))
        .and_then(handler::update_password);

    let capabilities = warp::get()
        .and(warp::path("capabilities"))
        .and(warp::path::end())
        .and(with_authentication(server.session_service.clone()))
        .and(with(server.session_service.clone()))
        .and_then(handler::capabilities);

    warp::path("auth").and(
        register
            .or(login)
            .or(refresh)
            .or(logout)
            .or(profile)
            .or(update_profile)
            .or(update_password)
            .or(capabilities),
    )
}

pub fn health() -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::get()
        .and(warp::path::end())
        .and_then(handler::health)
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: DeserializeOwned + Send,
{
    warp::body::content_length_limit(JSON_BODY_LIMIT).and(warp::body::json())
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_authentication(
    session_service: Arc<dyn SessionService>,
) -> impl Filter<Extract = (Account,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(http::header::AUTHORIZATION.as_ref()).and_then(
        move |header: Option<String>| {
            let session_service = session_service.clone();
            async move {
                let token = header
                    .as_deref()
                    .and_then(|value| value.strip_prefix("Bearer "))
                    .filter(|token| !token.is_empty())
                    .ok_or_else(|| reject::custom(ApiErrorCode::NotAuthorized))?;
                let account = session_service
                    .authenticate(token)
                    .await
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)?;
                Ok::<_, warp::Rejection>(account)
            }
        },
    )
}
