use actix_web::{HttpResponse, Result, web};
use uuid::Uuid;

use auth_services::middleware::AuthenticatedUser;
use auth_services::types::Role;
use bookings::*;

use crate::response::{ApiResponse, empty_success};

/// Roles allowed to create, update and delete bookings
const BOOKING_ROLES: &[Role] = &[Role::User, Role::Admin];

/// Lists the bookings visible to the caller
pub async fn get_bookings(
    service: web::Data<BookingService>,
    user: AuthenticatedUser,
    query: web::Query<BookingQuery>,
) -> Result<HttpResponse, BookingError> {
    let bookings = service.list_bookings(&user, &query, None).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::list(bookings)))
}

/// Lists the bookings visible to the caller at one campground
pub async fn get_campground_bookings(
    service: web::Data<BookingService>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    query: web::Query<BookingQuery>,
) -> Result<HttpResponse, BookingError> {
    let campground_id = path.into_inner();
    let bookings = service
        .list_bookings(&user, &query, Some(campground_id))
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::list(bookings)))
}

/// Gets a specific booking by ID
pub async fn get_booking(
    service: web::Data<BookingService>,
    _user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, BookingError> {
    let booking = service.get_booking(&path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::data(booking)))
}

/// Creates a booking at the campground in the path for the caller
pub async fn create_booking(
    service: web::Data<BookingService>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    request: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse> {
    user.authorize(BOOKING_ROLES)?;

    let campground_id = path.into_inner();
    let booking = service
        .create_booking(&user, &campground_id, &request)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::data(booking)))
}

/// Updates a booking owned by the caller (any booking for admins)
pub async fn update_booking(
    service: web::Data<BookingService>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    request: web::Json<UpdateBookingRequest>,
) -> Result<HttpResponse> {
    user.authorize(BOOKING_ROLES)?;

    let booking = service
        .update_booking(&user, &path.into_inner(), &request)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::data(booking)))
}

/// Deletes a booking owned by the caller (any booking for admins)
pub async fn delete_booking(
    service: web::Data<BookingService>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    user.authorize(BOOKING_ROLES)?;

    service.delete_booking(&user, &path.into_inner()).await?;

    Ok(empty_success())
}
