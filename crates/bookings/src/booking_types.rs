use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use uuid::Uuid;
use validator::Validate;

use auth_services::middleware::AuthenticatedUser;

use crate::store::StoreError;

/// A booking as stored, with unpopulated references.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Unique identifier for the booking
    pub id: Uuid,
    /// Date being booked
    pub book_date: DateTime<Utc>,
    /// Id of the owning user
    pub user: Uuid,
    /// Id of the booked campground
    pub campground: Uuid,
    /// When the booking was created
    pub created_at: DateTime<Utc>,
}

/// The campground fields embedded in booking read results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampgroundSummary {
    /// Campground id
    pub id: Uuid,
    /// Campground name
    pub name: String,
    /// Campground address
    pub address: String,
    /// Campground telephone number
    pub tel: String,
}

/// A booking with its campground populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    /// Unique identifier for the booking
    pub id: Uuid,
    /// Date being booked
    pub book_date: DateTime<Utc>,
    /// Id of the owning user
    pub user: Uuid,
    /// The booked campground
    pub campground: CampgroundSummary,
    /// When the booking was created
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a booking. The campground comes from the route.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Date being booked
    #[serde(default, deserialize_with = "deserialize_book_date")]
    #[validate(required(message = "Please add a booking date"))]
    pub book_date: Option<DateTime<Utc>>,
}

/// Request body for updating a booking. Absent fields are left unchanged;
/// the owning user is never changeable.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    /// New booking date
    #[serde(default, deserialize_with = "deserialize_book_date")]
    pub book_date: Option<DateTime<Utc>>,
    /// New campground id
    pub campground: Option<Uuid>,
}

/// Parses a booking date. Accepts RFC 3339, a date-time without offset
/// (read as UTC) or a bare date (UTC midnight).
pub fn parse_book_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn deserialize_book_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| {
            parse_book_date(&raw)
                .ok_or_else(|| de::Error::custom(format!("invalid booking date: {}", raw)))
        })
        .transpose()
}

/// A validated booking ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewBooking {
    /// Owning user
    pub user: Uuid,
    /// Booked campground
    pub campground: Uuid,
    /// Date being booked
    pub book_date: DateTime<Utc>,
}

/// Query parameters accepted when listing bookings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BookingQuery {
    /// Restrict an admin listing to a single booking id
    pub booking: Option<Uuid>,
}

/// Filter applied by a store when listing bookings. `None` means unrestricted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BookingScope {
    /// Only bookings owned by this user
    pub owner: Option<Uuid>,
    /// Only the booking with this id
    pub booking_id: Option<Uuid>,
    /// Only bookings of this campground
    pub campground_id: Option<Uuid>,
}

impl BookingScope {
    /// Builds the visible scope for a caller.
    ///
    /// Non-admins always see only their own bookings and the booking id
    /// filter is ignored for them. Admins see everything, narrowed by the
    /// booking id filter when one is given.
    pub fn for_requester(
        requester: &AuthenticatedUser,
        booking_id: Option<Uuid>,
        campground_id: Option<Uuid>,
    ) -> Self {
        if requester.is_admin() {
            Self {
                owner: None,
                booking_id,
                campground_id,
            }
        } else {
            Self {
                owner: Some(requester.id),
                booking_id: None,
                campground_id,
            }
        }
    }

    /// Whether a booking falls inside this scope.
    pub fn matches(&self, booking: &Booking) -> bool {
        self.owner.is_none_or(|owner| booking.user == owner)
            && self.booking_id.is_none_or(|id| booking.id == id)
            && self
                .campground_id
                .is_none_or(|campground| booking.campground == campground)
    }
}

/// Mutations guarded by the ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    /// Changing a booking
    Update,
    /// Removing a booking
    Delete,
}

impl fmt::Display for BookingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingAction::Update => f.write_str("update"),
            BookingAction::Delete => f.write_str("delete"),
        }
    }
}

/// Custom error type for booking operations
#[derive(thiserror::Error, Debug)]
pub enum BookingError {
    /// The referenced campground does not exist
    #[error("Campground not found")]
    CampgroundNotFound,

    /// The booking does not exist
    #[error("Booking not found")]
    BookingNotFound,

    /// The requester already holds the maximum number of bookings
    #[error("The user has already made {limit} bookings")]
    QuotaExceeded {
        /// Maximum bookings per non-admin user
        limit: usize,
    },

    /// The requester neither owns the booking nor is an admin
    #[error("Not authorized to {action} this booking")]
    Unauthorized {
        /// The attempted mutation
        action: BookingAction,
    },

    /// The authenticated user no longer exists
    #[error("User {0} no longer exists")]
    UnknownUser(Uuid),

    /// Request body failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Store failure while listing bookings
    #[error("Failed to list bookings: {0}")]
    Listing(StoreError),

    /// Any other store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl actix_web::ResponseError for BookingError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            BookingError::CampgroundNotFound | BookingError::BookingNotFound => {
                StatusCode::NOT_FOUND
            }
            BookingError::QuotaExceeded { .. } | BookingError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            BookingError::Unauthorized { .. } | BookingError::UnknownUser(_) => {
                StatusCode::UNAUTHORIZED
            }
            BookingError::Listing(_) | BookingError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let message = match self {
            BookingError::Validation(msg) => msg.clone(),
            BookingError::UnknownUser(_) => "Not authorized to access this route".to_string(),
            BookingError::Listing(e) => {
                tracing::error!("Failed to list bookings: {}", e);
                "Cannot find Bookings".to_string()
            }
            BookingError::Store(e) => {
                tracing::error!("Booking store error: {}", e);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        actix_web::HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "message": message
        }))
    }
}
