//! # Web Handlers for the Campground Bookings API
//!
//! This crate provides the HTTP handlers, the response envelope and the
//! route table of the campground bookings API.

/// Authentication handlers (register, login, me, logout)
mod auth_handlers;
pub use auth_handlers::*;

/// Booking handlers
mod booking_handlers;
pub use booking_handlers::*;

/// Campground handlers
mod campground_handlers;
pub use campground_handlers::*;

/// Response envelope and extractor error handling
mod response;
pub use response::*;

/// The `/api/v1` route table
mod routes;
pub use routes::*;
