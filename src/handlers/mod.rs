//! HTTP handlers grouped by resource.
//!
//! Every router here is mounted under `/api/v1` by [`crate::api_v1_routes`];
//! all but the callable functions sit behind the bearer-token middleware.

pub mod aisles;
pub mod changes;
pub mod common;
pub mod dashboard;
pub mod functions;
pub mod history;
pub mod medicines;
pub mod users;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;
