mod coordinator;
mod session;
mod transport;

pub use coordinator::*;
pub use session::*;
pub use transport::*;
