use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::booking_types::CampgroundSummary;
use crate::store::StoreError;

/// A campground that can be booked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Campground {
    /// Unique identifier for the campground
    pub id: Uuid,
    /// Unique display name
    pub name: String,
    /// Street address
    pub address: String,
    /// Telephone number
    pub tel: String,
    /// When the campground was created
    pub created_at: DateTime<Utc>,
}

impl Campground {
    /// The fields embedded into booking read results.
    pub fn summary(&self) -> CampgroundSummary {
        CampgroundSummary {
            id: self.id,
            name: self.name.clone(),
            address: self.address.clone(),
            tel: self.tel.clone(),
        }
    }
}

/// Request structure for creating a campground
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCampgroundRequest {
    /// Unique display name
    #[validate(length(min = 1, max = 50, message = "Name can not be more than 50 characters"))]
    pub name: String,

    /// Street address
    #[validate(length(min = 1, message = "Please add an address"))]
    pub address: String,

    /// Telephone number
    #[validate(length(min = 1, max = 32, message = "Please add a telephone number"))]
    pub tel: String,
}

/// Request structure for updating a campground. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCampgroundRequest {
    /// New display name
    #[validate(length(min = 1, max = 50, message = "Name can not be more than 50 characters"))]
    pub name: Option<String>,

    /// New street address
    #[validate(length(min = 1, message = "Address can not be empty"))]
    pub address: Option<String>,

    /// New telephone number
    #[validate(length(min = 1, max = 32, message = "Telephone number can not be empty"))]
    pub tel: Option<String>,
}

impl CreateCampgroundRequest {
    /// Copy of the request with surrounding whitespace stripped, as stored.
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            tel: self.tel.trim().to_string(),
        }
    }
}

impl UpdateCampgroundRequest {
    /// Copy of the request with surrounding whitespace stripped, as stored.
    pub fn trimmed(&self) -> Self {
        let trim = |value: &Option<String>| value.as_deref().map(|v| v.trim().to_string());

        Self {
            name: trim(&self.name),
            address: trim(&self.address),
            tel: trim(&self.tel),
        }
    }
}

/// Custom error type for campground operations
#[derive(thiserror::Error, Debug)]
pub enum CampgroundError {
    /// Campground not found
    #[error("Campground not found")]
    NotFound,

    /// Another campground already uses the name
    #[error("A campground named {0} already exists")]
    DuplicateName(String),

    /// Request body failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Store failure
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CampgroundError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateName(name) => CampgroundError::DuplicateName(name),
            other => CampgroundError::Store(other),
        }
    }
}

impl actix_web::ResponseError for CampgroundError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            CampgroundError::NotFound => StatusCode::NOT_FOUND,
            CampgroundError::DuplicateName(_) | CampgroundError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            CampgroundError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let message = match self {
            CampgroundError::Validation(msg) => msg.clone(),
            CampgroundError::Store(e) => {
                tracing::error!("Campground store error: {}", e);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_length_is_bounded() {
        let request = CreateCampgroundRequest {
            name: "x".repeat(51),
            address: "1 Forest Road".to_string(),
            tel: "02-000-0000".to_string(),
        };
        assert!(request.validate().is_err());

        let request = CreateCampgroundRequest {
            name: "Pine Valley".to_string(),
            ..request
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_update_skips_absent_fields() {
        assert!(UpdateCampgroundRequest::default().validate().is_ok());

        let request = UpdateCampgroundRequest {
            address: Some(String::new()),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_duplicate_name_maps_from_store() {
        let err: CampgroundError = StoreError::DuplicateName("Pine Valley".to_string()).into();
        assert!(matches!(err, CampgroundError::DuplicateName(name) if name == "Pine Valley"));
    }
}
