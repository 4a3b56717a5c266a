//! Shared types, errors, and configuration for Daftar.
//!
//! This crate provides common types used across all other crates:
//! - Money precision and limits for the two settlement currencies
//! - Typed IDs for type-safe entity references
//! - Pagination types for list queries
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
