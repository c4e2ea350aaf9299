//! # Auth Services
//!
//! This crate provides authentication services for the application.
//! It includes JWT token handling, middleware for request authentication,
//! the role model and user account storage.

/// JWT token handling.
pub mod jwt;
/// Middleware for request authentication and the authenticated caller identity.
pub mod middleware;
/// User account storage and credential verification.
pub mod service;
/// Types and structures used in authentication services.
pub mod types;
