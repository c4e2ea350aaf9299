use std::sync::Arc;

use actix_web::{Scope, web};

use auth_services::jwt::JwtService;
use auth_services::middleware::AuthMiddleware;
use auth_services::service::UserDirectory;

use crate::auth_handlers::*;
use crate::booking_handlers::*;
use crate::campground_handlers::*;
use crate::response::{json_config, path_config, query_config};

/// Builds the `/api/v1` route table.
///
/// Handlers expect `web::Data` for `BookingService`, `CampgroundService`,
/// `JwtService`, `AuthSettings` and, for the auth routes, `PgPool`.
/// `users` resolves the current role of every authenticated caller.
/// Campground resources mix public reads with admin-only writes, so they
/// authenticate through the `AuthenticatedUser` extractor instead of the
/// middleware.
pub fn api_scope(jwt_service: &JwtService, users: Arc<dyn UserDirectory>) -> Scope {
    let protected = || AuthMiddleware::new(jwt_service.clone(), users.clone());

    web::scope("/api/v1")
        .app_data(web::Data::from(users.clone()))
        .app_data(json_config())
        .app_data(path_config())
        .app_data(query_config())
        .service(
            web::scope("/auth")
                .route("/register", web::post().to(register))
                .route("/login", web::post().to(login))
                .route("/logout", web::get().to(logout))
                .service(
                    web::resource("/me")
                        .wrap(protected())
                        .route(web::get().to(get_me)),
                ),
        )
        .service(
            web::scope("/campgrounds")
                .service(
                    web::resource("/{campground_id}/bookings")
                        .wrap(protected())
                        .route(web::get().to(get_campground_bookings))
                        .route(web::post().to(create_booking)),
                )
                .service(
                    web::resource("")
                        .route(web::get().to(list_campgrounds))
                        .route(web::post().to(create_campground)),
                )
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(get_campground))
                        .route(web::put().to(update_campground))
                        .route(web::delete().to(delete_campground)),
                ),
        )
        .service(
            web::scope("/bookings")
                .wrap(protected())
                .route("", web::get().to(get_bookings))
                .route("/{id}", web::get().to(get_booking))
                .route("/{id}", web::put().to(update_booking))
                .route("/{id}", web::delete().to(delete_booking)),
        )
}
