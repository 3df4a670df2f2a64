pub mod v1;

use crate::server::Server;
use std::sync::Arc;
use warp::Filter;

/// Health check at `/`, the v1 API under `/api/v1`, and a single recovery
/// that renders every rejection as an envelope.
pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone {
    let api_v1 = warp::path("api")
        .and(warp::path("v1"))
        .and(v1::routes(server));

    v1::health()
        .or(api_v1)
        .recover(v1::recover_error)
        .with(warp::trace::request())
}
