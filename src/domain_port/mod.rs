// store

mod refresh_token_store;

pub use refresh_token_store::*;

// repo

mod account_repo;

pub use account_repo::*;
