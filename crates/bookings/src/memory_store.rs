use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use auth_services::service::UserDirectory;
use auth_services::types::{AuthError, Role};

use crate::booking_types::{Booking, BookingDetails, BookingScope, NewBooking, UpdateBookingRequest};
use crate::campground_types::{Campground, CreateCampgroundRequest, UpdateCampgroundRequest};
use crate::store::{BookingStore, CampgroundStore, InsertOutcome, StoreError};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, Role>,
    campgrounds: HashMap<Uuid, Campground>,
    bookings: HashMap<Uuid, Booking>,
}

/// An in-process store with the same semantics as the PostgreSQL store.
///
/// Every operation runs under a single lock, so admission checks are atomic.
/// Users are not managed here; register the accounts that may own bookings
/// with [`MemoryStore::add_user`]. It also serves as the [`UserDirectory`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user account, or changes the role of an existing one.
    pub fn add_user(&self, user_id: Uuid, role: Role) {
        self.lock().users.insert(user_id, role);
    }

    /// Removes a user and, like the database cascade, their bookings.
    pub fn remove_user(&self, user_id: &Uuid) {
        let mut state = self.lock();
        state.users.remove(user_id);
        state.bookings.retain(|_, booking| booking.user != *user_id);
    }

    /// Number of stored bookings.
    pub fn booking_count(&self) -> usize {
        self.lock().bookings.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MemoryState {
    fn details(&self, booking: &Booking) -> Result<BookingDetails, StoreError> {
        let campground = self
            .campgrounds
            .get(&booking.campground)
            .ok_or(StoreError::MissingReference)?;

        Ok(BookingDetails {
            id: booking.id,
            book_date: booking.book_date,
            user: booking.user,
            campground: campground.summary(),
            created_at: booking.created_at,
        })
    }

    fn name_taken(&self, name: &str, except: Option<&Uuid>) -> bool {
        self.campgrounds
            .values()
            .any(|c| c.name == name && Some(&c.id) != except)
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_bookings(&self, scope: &BookingScope) -> Result<Vec<BookingDetails>, StoreError> {
        let state = self.lock();

        let mut bookings: Vec<&Booking> = state
            .bookings
            .values()
            .filter(|booking| scope.matches(booking))
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        bookings
            .into_iter()
            .map(|booking| state.details(booking))
            .collect()
    }

    async fn find_booking(&self, id: &Uuid) -> Result<Option<BookingDetails>, StoreError> {
        let state = self.lock();

        state
            .bookings
            .get(id)
            .map(|booking| state.details(booking))
            .transpose()
    }

    async fn insert_booking(
        &self,
        booking: &NewBooking,
        limit: Option<usize>,
    ) -> Result<InsertOutcome, StoreError> {
        let mut state = self.lock();

        if !state.users.contains_key(&booking.user) {
            return Err(StoreError::UnknownUser(booking.user));
        }
        if !state.campgrounds.contains_key(&booking.campground) {
            return Err(StoreError::MissingReference);
        }

        if let Some(limit) = limit {
            let held = state
                .bookings
                .values()
                .filter(|existing| existing.user == booking.user)
                .count();

            if held >= limit {
                return Ok(InsertOutcome::QuotaReached { held });
            }
        }

        let created = Booking {
            id: Uuid::new_v4(),
            book_date: booking.book_date,
            user: booking.user,
            campground: booking.campground,
            created_at: Utc::now(),
        };
        state.bookings.insert(created.id, created.clone());

        Ok(InsertOutcome::Created(created))
    }

    async fn update_booking(
        &self,
        id: &Uuid,
        changes: &UpdateBookingRequest,
    ) -> Result<Option<Booking>, StoreError> {
        let mut state = self.lock();

        if let Some(campground) = &changes.campground {
            if !state.campgrounds.contains_key(campground) {
                return Err(StoreError::MissingReference);
            }
        }

        let Some(booking) = state.bookings.get_mut(id) else {
            return Ok(None);
        };

        if let Some(book_date) = changes.book_date {
            booking.book_date = book_date;
        }
        if let Some(campground) = changes.campground {
            booking.campground = campground;
        }

        Ok(Some(booking.clone()))
    }

    async fn delete_booking(&self, id: &Uuid) -> Result<bool, StoreError> {
        Ok(self.lock().bookings.remove(id).is_some())
    }
}

#[async_trait]
impl CampgroundStore for MemoryStore {
    async fn list_campgrounds(&self) -> Result<Vec<Campground>, StoreError> {
        let mut campgrounds: Vec<Campground> = self.lock().campgrounds.values().cloned().collect();
        campgrounds.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(campgrounds)
    }

    async fn find_campground(&self, id: &Uuid) -> Result<Option<Campground>, StoreError> {
        Ok(self.lock().campgrounds.get(id).cloned())
    }

    async fn insert_campground(
        &self,
        request: &CreateCampgroundRequest,
    ) -> Result<Campground, StoreError> {
        let mut state = self.lock();
        let name = request.name.trim();

        if state.name_taken(name, None) {
            return Err(StoreError::DuplicateName(name.to_string()));
        }

        let campground = Campground {
            id: Uuid::new_v4(),
            name: name.to_string(),
            address: request.address.trim().to_string(),
            tel: request.tel.trim().to_string(),
            created_at: Utc::now(),
        };
        state.campgrounds.insert(campground.id, campground.clone());

        Ok(campground)
    }

    async fn update_campground(
        &self,
        id: &Uuid,
        changes: &UpdateCampgroundRequest,
    ) -> Result<Option<Campground>, StoreError> {
        let mut state = self.lock();

        if let Some(name) = changes.name.as_deref().map(str::trim) {
            if state.name_taken(name, Some(id)) {
                return Err(StoreError::DuplicateName(name.to_string()));
            }
        }

        let Some(campground) = state.campgrounds.get_mut(id) else {
            return Ok(None);
        };

        if let Some(name) = &changes.name {
            campground.name = name.trim().to_string();
        }
        if let Some(address) = &changes.address {
            campground.address = address.trim().to_string();
        }
        if let Some(tel) = &changes.tel {
            campground.tel = tel.trim().to_string();
        }

        Ok(Some(campground.clone()))
    }

    async fn delete_campground(&self, id: &Uuid) -> Result<bool, StoreError> {
        let mut state = self.lock();

        if state.campgrounds.remove(id).is_none() {
            return Ok(false);
        }
        state.bookings.retain(|_, booking| booking.campground != *id);

        Ok(true)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn current_role(&self, user_id: &Uuid) -> Result<Option<Role>, AuthError> {
        Ok(self.lock().users.get(user_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn campground_request(name: &str) -> CreateCampgroundRequest {
        CreateCampgroundRequest {
            name: name.to_string(),
            address: "12 Lakeside Drive".to_string(),
            tel: "02-111-2222".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_enforces_limit() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.add_user(user, Role::User);
        let campground = store
            .insert_campground(&campground_request("Lakeside"))
            .await
            .unwrap();

        let new_booking = NewBooking {
            user,
            campground: campground.id,
            book_date: Utc::now() + Duration::days(7),
        };

        for _ in 0..2 {
            let outcome = store.insert_booking(&new_booking, Some(2)).await.unwrap();
            assert!(matches!(outcome, InsertOutcome::Created(_)));
        }

        let outcome = store.insert_booking(&new_booking, Some(2)).await.unwrap();
        assert_eq!(outcome, InsertOutcome::QuotaReached { held: 2 });

        let outcome = store.insert_booking(&new_booking, None).await.unwrap();
        assert!(matches!(outcome, InsertOutcome::Created(_)));
        assert_eq!(store.booking_count(), 3);
    }

    #[tokio::test]
    async fn test_insert_rejects_unknown_references() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let campground = store
            .insert_campground(&campground_request("Lakeside"))
            .await
            .unwrap();

        let orphan = NewBooking {
            user,
            campground: campground.id,
            book_date: Utc::now(),
        };
        assert!(matches!(
            store.insert_booking(&orphan, None).await,
            Err(StoreError::UnknownUser(id)) if id == user
        ));

        store.add_user(user, Role::User);
        let missing_campground = NewBooking {
            campground: Uuid::new_v4(),
            ..orphan
        };
        assert!(matches!(
            store.insert_booking(&missing_campground, None).await,
            Err(StoreError::MissingReference)
        ));
        assert_eq!(store.booking_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_campground_cascades_to_bookings() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.add_user(user, Role::User);
        let doomed = store
            .insert_campground(&campground_request("Doomed"))
            .await
            .unwrap();
        let kept = store
            .insert_campground(&campground_request("Kept"))
            .await
            .unwrap();

        for campground in [doomed.id, kept.id] {
            let booking = NewBooking {
                user,
                campground,
                book_date: Utc::now(),
            };
            store.insert_booking(&booking, None).await.unwrap();
        }

        assert!(store.delete_campground(&doomed.id).await.unwrap());
        assert!(!store.delete_campground(&doomed.id).await.unwrap());

        let remaining = store.find_bookings(&BookingScope::default()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].campground.id, kept.id);
    }

    #[tokio::test]
    async fn test_campground_names_are_unique() {
        let store = MemoryStore::new();
        let first = store
            .insert_campground(&campground_request("Pine Valley"))
            .await
            .unwrap();
        let second = store
            .insert_campground(&campground_request("River Bend"))
            .await
            .unwrap();

        assert!(matches!(
            store
                .insert_campground(&campground_request(" Pine Valley "))
                .await,
            Err(StoreError::DuplicateName(_))
        ));

        let rename = UpdateCampgroundRequest {
            name: Some("Pine Valley".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            store.update_campground(&second.id, &rename).await,
            Err(StoreError::DuplicateName(_))
        ));

        // Renaming to its own name is not a conflict
        let updated = store.update_campground(&first.id, &rename).await.unwrap();
        assert_eq!(updated.map(|c| c.name), Some("Pine Valley".to_string()));
    }

    #[tokio::test]
    async fn test_directory_tracks_role_changes_and_removal() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        assert_eq!(store.current_role(&user).await.unwrap(), None);

        store.add_user(user, Role::Admin);
        assert_eq!(store.current_role(&user).await.unwrap(), Some(Role::Admin));

        store.add_user(user, Role::User);
        assert_eq!(store.current_role(&user).await.unwrap(), Some(Role::User));

        store.remove_user(&user);
        assert_eq!(store.current_role(&user).await.unwrap(), None);
    }
}
