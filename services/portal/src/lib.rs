//! Graduation attendance portal
//!
//! Server-rendered front-end over a hosted auth and database service.
//! Students confirm their graduation attendance; admins review and toggle
//! the status of every student.

pub mod action;
pub mod config;
pub mod error;
pub mod guard;
pub mod pages;
pub mod rate_limiter;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;

pub use routes::create_router;
pub use state::AppState;
