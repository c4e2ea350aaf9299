use actix_web::{HttpResponse, Result, web};
use uuid::Uuid;

use auth_services::middleware::AuthenticatedUser;
use auth_services::types::Role;
use bookings::*;

use crate::response::{ApiResponse, empty_success};

/// Lists all campgrounds (public)
pub async fn list_campgrounds(
    service: web::Data<CampgroundService>,
) -> Result<HttpResponse, CampgroundError> {
    let campgrounds = service.list_campgrounds().await?;

    Ok(HttpResponse::Ok().json(ApiResponse::list(campgrounds)))
}

/// Gets a single campground (public)
pub async fn get_campground(
    service: web::Data<CampgroundService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, CampgroundError> {
    let campground = service.get_campground(&path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::data(campground)))
}

/// Creates a campground (admin only)
pub async fn create_campground(
    service: web::Data<CampgroundService>,
    user: AuthenticatedUser,
    request: web::Json<CreateCampgroundRequest>,
) -> Result<HttpResponse> {
    user.authorize(&[Role::Admin])?;

    let campground = service.create_campground(&request).await?;

    Ok(HttpResponse::Created().json(ApiResponse::data(campground)))
}

/// Updates a campground (admin only)
pub async fn update_campground(
    service: web::Data<CampgroundService>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    request: web::Json<UpdateCampgroundRequest>,
) -> Result<HttpResponse> {
    user.authorize(&[Role::Admin])?;

    let campground = service
        .update_campground(&path.into_inner(), &request)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::data(campground)))
}

/// Deletes a campground and its bookings (admin only)
pub async fn delete_campground(
    service: web::Data<CampgroundService>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    user.authorize(&[Role::Admin])?;

    service.delete_campground(&path.into_inner()).await?;

    Ok(empty_success())
}
