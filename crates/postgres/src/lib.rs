//! # Postgres
//!
//! This crate provides connection pooling and schema migrations for the
//! campground bookings PostgreSQL database.

/// Connection pool, health check and migrations.
pub mod database;
