//! Siakad application services
//!
//! Role-facing request/response operations over the core storage: sign-in,
//! and the admin / lecturer / student dashboard flows. The adapter that
//! binds these to UI events is a separate concern and lives elsewhere.

pub mod admin;
pub mod auth;
pub mod config;
pub mod context;
pub mod lecturer;
pub mod student;

pub use config::AppConfig;
pub use context::UserContext;
