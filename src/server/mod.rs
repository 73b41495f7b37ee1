//! HTTP surface over a PlasmaAccount.

mod routes;

pub use routes::{create_router, AppState};
