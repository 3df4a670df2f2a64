mod argon2_hasher;
mod jwt_codec;
mod session_service_impl;

pub use argon2_hasher::*;
pub use jwt_codec::*;
pub use session_service_impl::*;
