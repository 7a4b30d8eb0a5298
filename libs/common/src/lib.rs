//! Common library for the graduation portal
//!
//! This crate provides the pieces shared with the hosted backend: the
//! profile and session models, the backend traits, the Supabase HTTP client,
//! configuration, error handling and input validation.
//!
//! ```rust,no_run
//! use common::backend::ProfileStore;
//! use common::config::BackendConfig;
//! use common::models::Role;
//! use common::supabase::SupabaseClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BackendConfig::from_env()?;
//!     let client = SupabaseClient::new(&config)?;
//!     let students = client
//!         .list_by_role("user-access-token", Role::Student)
//!         .await?;
//!     println!("{} students", students.len());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod models;
pub mod supabase;
pub mod validation;
