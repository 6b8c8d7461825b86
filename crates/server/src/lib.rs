pub mod auth;
pub mod errors;
pub mod extract;
pub mod observability;
pub mod openapi;
pub mod populate;
pub mod routes;
pub mod startup;
pub mod state;

pub use startup::run;
pub use state::{AppState, AuthSettings};
