use async_trait::async_trait;
use uuid::Uuid;

use crate::booking_types::{Booking, BookingDetails, BookingScope, NewBooking, UpdateBookingRequest};
use crate::campground_types::{Campground, CreateCampgroundRequest, UpdateCampgroundRequest};

/// Errors raised by store implementations
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The owning user of a new booking does not exist
    #[error("User {0} does not exist")]
    UnknownUser(Uuid),

    /// A foreign key points at a row that does not exist
    #[error("Referenced record does not exist")]
    MissingReference,

    /// A campground name is already taken
    #[error("A campground named {0} already exists")]
    DuplicateName(String),
}

/// Result of an admission-guarded insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// The booking was persisted
    Created(Booking),
    /// The owner already holds `held` bookings, at or above the limit
    QuotaReached {
        /// Bookings the owner holds
        held: usize,
    },
}

/// Persistence for bookings.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Lists bookings inside `scope`, newest first, with campgrounds populated.
    async fn find_bookings(&self, scope: &BookingScope) -> Result<Vec<BookingDetails>, StoreError>;

    /// Fetches one booking with its campground populated.
    async fn find_booking(&self, id: &Uuid) -> Result<Option<BookingDetails>, StoreError>;

    /// Inserts a booking.
    ///
    /// When `limit` is set, the owner's current booking count is checked and
    /// the insert performed as one atomic step per owner: two concurrent
    /// calls for the same owner can never both pass the check.
    async fn insert_booking(
        &self,
        booking: &NewBooking,
        limit: Option<usize>,
    ) -> Result<InsertOutcome, StoreError>;

    /// Applies the present fields of `changes`; `None` if the booking is gone.
    async fn update_booking(
        &self,
        id: &Uuid,
        changes: &UpdateBookingRequest,
    ) -> Result<Option<Booking>, StoreError>;

    /// Deletes a booking, returning whether it existed.
    async fn delete_booking(&self, id: &Uuid) -> Result<bool, StoreError>;
}

/// Persistence for campgrounds.
#[async_trait]
pub trait CampgroundStore: Send + Sync {
    /// Lists all campgrounds ordered by name.
    async fn list_campgrounds(&self) -> Result<Vec<Campground>, StoreError>;

    /// Fetches one campground.
    async fn find_campground(&self, id: &Uuid) -> Result<Option<Campground>, StoreError>;

    /// Inserts a campground.
    async fn insert_campground(
        &self,
        request: &CreateCampgroundRequest,
    ) -> Result<Campground, StoreError>;

    /// Applies the present fields of `changes`; `None` if the campground is gone.
    async fn update_campground(
        &self,
        id: &Uuid,
        changes: &UpdateCampgroundRequest,
    ) -> Result<Option<Campground>, StoreError>;

    /// Deletes a campground and its bookings, returning whether it existed.
    async fn delete_campground(&self, id: &Uuid) -> Result<bool, StoreError>;
}
