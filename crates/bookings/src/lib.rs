//! # Bookings
//!
//! This crate provides the campground booking domain: booking admission
//! under the per-user quota, ownership authorization, read scoping, and
//! campground administration, over pluggable stores.

/// Types for booking operations
mod booking_types;
pub use booking_types::*;

/// Types for campground operations
mod campground_types;
pub use campground_types::*;

/// Store traits shared by the PostgreSQL and in-memory backends
mod store;
pub use store::*;

/// PostgreSQL store
mod pg_store;
pub use pg_store::*;

/// In-process store
mod memory_store;
pub use memory_store::*;

/// Booking admission, authorization and listing
mod booking_service;
pub use booking_service::*;

/// Campground listing and administration
mod campground_service;
pub use campground_service::*;
