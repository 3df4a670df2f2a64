mod cookie;
mod error;
mod handler;
mod router;

pub use cookie::*;
pub use error::recover_error;
pub use error::ApiErrorCode;
pub use handler::{ApiResponse, SessionView, UserView};
pub use router::{health, routes};
