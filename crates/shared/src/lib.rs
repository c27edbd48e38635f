//! Shared types, errors, and configuration for Rentdesk.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for report history and scheduled reports
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
