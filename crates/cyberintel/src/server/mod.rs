//! REST API for the cyber intelligence Q&A service
//!
//! axum routing over a shared `AppState`; JSON schemas come from schemars.

pub mod handlers;
pub mod middleware;
pub mod routing;
pub mod services;
pub mod startup;
pub mod state;
pub mod types;
