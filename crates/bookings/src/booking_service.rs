use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use auth_services::middleware::AuthenticatedUser;

use crate::booking_types::*;
use crate::store::{BookingStore, CampgroundStore, InsertOutcome, StoreError};

/// Maximum number of bookings a non-admin user may hold.
pub const MAX_BOOKINGS_PER_USER: usize = 3;

/// Checks that `requester` may mutate a booking owned by `owner`.
pub fn authorize_mutation(
    requester: &AuthenticatedUser,
    owner: &Uuid,
    action: BookingAction,
) -> Result<(), BookingError> {
    if requester.is_admin() || requester.id == *owner {
        Ok(())
    } else {
        Err(BookingError::Unauthorized { action })
    }
}

/// Booking admission, ownership authorization and read scoping.
#[derive(Clone)]
pub struct BookingService {
    bookings: Arc<dyn BookingStore>,
    campgrounds: Arc<dyn CampgroundStore>,
}

impl BookingService {
    /// Creates a service over the given stores
    pub fn new(bookings: Arc<dyn BookingStore>, campgrounds: Arc<dyn CampgroundStore>) -> Self {
        Self {
            bookings,
            campgrounds,
        }
    }

    /// Lists the bookings visible to `requester`, optionally limited to one campground.
    pub async fn list_bookings(
        &self,
        requester: &AuthenticatedUser,
        query: &BookingQuery,
        campground_id: Option<Uuid>,
    ) -> Result<Vec<BookingDetails>, BookingError> {
        let scope = BookingScope::for_requester(requester, query.booking, campground_id);

        self.bookings
            .find_bookings(&scope)
            .await
            .map_err(BookingError::Listing)
    }

    /// Fetches a single booking.
    pub async fn get_booking(&self, booking_id: &Uuid) -> Result<BookingDetails, BookingError> {
        self.bookings
            .find_booking(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound)
    }

    /// Creates a booking for `requester` at `campground_id`.
    ///
    /// Non-admins are held to [`MAX_BOOKINGS_PER_USER`]; the store performs
    /// the count and the insert atomically.
    pub async fn create_booking(
        &self,
        requester: &AuthenticatedUser,
        campground_id: &Uuid,
        request: &CreateBookingRequest,
    ) -> Result<Booking, BookingError> {
        self.ensure_campground_exists(campground_id).await?;

        request
            .validate()
            .map_err(|e| BookingError::Validation(format!("Validation error: {}", e)))?;
        let book_date = request
            .book_date
            .ok_or_else(|| BookingError::Validation("Please add a booking date".to_string()))?;

        let new_booking = NewBooking {
            user: requester.id,
            campground: *campground_id,
            book_date,
        };
        let limit = (!requester.is_admin()).then_some(MAX_BOOKINGS_PER_USER);

        let outcome = self
            .bookings
            .insert_booking(&new_booking, limit)
            .await
            .map_err(|e| match e {
                StoreError::UnknownUser(id) => BookingError::UnknownUser(id),
                StoreError::MissingReference => BookingError::CampgroundNotFound,
                other => BookingError::Store(other),
            })?;

        match outcome {
            InsertOutcome::Created(booking) => {
                info!(
                    "Booking {} created by user {} at campground {}",
                    booking.id, booking.user, booking.campground
                );
                Ok(booking)
            }
            InsertOutcome::QuotaReached { held } => {
                warn!(
                    "User {} rejected at booking quota ({} held)",
                    requester.id, held
                );
                Err(BookingError::QuotaExceeded {
                    limit: MAX_BOOKINGS_PER_USER,
                })
            }
        }
    }

    /// Updates a booking owned by `requester`, or any booking for an admin.
    pub async fn update_booking(
        &self,
        requester: &AuthenticatedUser,
        booking_id: &Uuid,
        changes: &UpdateBookingRequest,
    ) -> Result<Booking, BookingError> {
        let existing = self.get_booking(booking_id).await?;
        authorize_mutation(requester, &existing.user, BookingAction::Update)?;

        if let Some(campground_id) = &changes.campground {
            self.ensure_campground_exists(campground_id).await?;
        }

        self.bookings
            .update_booking(booking_id, changes)
            .await
            .map_err(|e| match e {
                StoreError::MissingReference => BookingError::CampgroundNotFound,
                other => BookingError::Store(other),
            })?
            .ok_or(BookingError::BookingNotFound)
    }

    /// Deletes a booking owned by `requester`, or any booking for an admin.
    pub async fn delete_booking(
        &self,
        requester: &AuthenticatedUser,
        booking_id: &Uuid,
    ) -> Result<(), BookingError> {
        let existing = self.get_booking(booking_id).await?;
        authorize_mutation(requester, &existing.user, BookingAction::Delete)?;

        if !self.bookings.delete_booking(booking_id).await? {
            return Err(BookingError::BookingNotFound);
        }

        info!("Booking {} deleted by user {}", booking_id, requester.id);
        Ok(())
    }

    async fn ensure_campground_exists(&self, campground_id: &Uuid) -> Result<(), BookingError> {
        self.campgrounds
            .find_campground(campground_id)
            .await?
            .map(|_| ())
            .ok_or(BookingError::CampgroundNotFound)
    }
}
