use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::campground_types::*;
use crate::store::CampgroundStore;

/// Service for campground listing and administration.
#[derive(Clone)]
pub struct CampgroundService {
    store: Arc<dyn CampgroundStore>,
}

impl CampgroundService {
    /// Creates a service over the given store
    pub fn new(store: Arc<dyn CampgroundStore>) -> Self {
        Self { store }
    }

    /// Lists all campgrounds
    pub async fn list_campgrounds(&self) -> Result<Vec<Campground>, CampgroundError> {
        Ok(self.store.list_campgrounds().await?)
    }

    /// Fetches one campground
    pub async fn get_campground(&self, id: &Uuid) -> Result<Campground, CampgroundError> {
        self.store
            .find_campground(id)
            .await?
            .ok_or(CampgroundError::NotFound)
    }

    /// Creates a campground
    pub async fn create_campground(
        &self,
        request: &CreateCampgroundRequest,
    ) -> Result<Campground, CampgroundError> {
        let request = request.trimmed();
        request
            .validate()
            .map_err(|e| CampgroundError::Validation(format!("Validation error: {}", e)))?;

        let campground = self.store.insert_campground(&request).await?;
        info!("Campground {} ({}) created", campground.id, campground.name);

        Ok(campground)
    }

    /// Updates the present fields of a campground
    pub async fn update_campground(
        &self,
        id: &Uuid,
        request: &UpdateCampgroundRequest,
    ) -> Result<Campground, CampgroundError> {
        let request = request.trimmed();
        request
            .validate()
            .map_err(|e| CampgroundError::Validation(format!("Validation error: {}", e)))?;

        self.store
            .update_campground(id, &request)
            .await?
            .ok_or(CampgroundError::NotFound)
    }

    /// Deletes a campground together with its bookings
    pub async fn delete_campground(&self, id: &Uuid) -> Result<(), CampgroundError> {
        if !self.store.delete_campground(id).await? {
            return Err(CampgroundError::NotFound);
        }

        info!("Campground {} deleted", id);
        Ok(())
    }
}
