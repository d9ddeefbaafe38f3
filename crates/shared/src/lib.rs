//! Shared types, errors, and configuration for Comptoir.
//!
//! This crate provides common pieces used across all other crates:
//! - Application-wide error taxonomy
//! - Configuration management
//! - Session token types and the JWT service

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;

pub use auth::{Claims, LoginRequest};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
