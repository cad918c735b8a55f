//! HTTP handlers and route configuration.

mod auth;
mod health;
mod products;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/logout", web::post().to(auth::logout))
                    .route("/refresh_token", web::post().to(auth::refresh_token))
                    // `me` must be registered before the `{email}` pattern.
                    .route("/users/me", web::get().to(auth::me))
                    .route("/users/{email}", web::get().to(auth::get_user))
                    .route("/create_user", web::post().to(auth::create_user))
                    .route("/delete_user", web::post().to(auth::delete_user))
                    .route("/update_user_roles", web::post().to(auth::update_user_roles))
                    .route("/add_user_role", web::post().to(auth::add_user_role)),
            )
            .service(
                web::scope("/products")
                    .route("/items", web::get().to(products::list_items))
                    .route("/items", web::post().to(products::create_item))
                    .route("/items/by_name", web::get().to(products::items_by_name))
                    .route("/items/by_price", web::get().to(products::items_by_price))
                    .route("/items/quantity", web::get().to(products::item_quantities))
                    .route("/items/quantity", web::post().to(products::set_item_quantity))
                    .route("/buy", web::post().to(products::buy_items))
                    .route("/invoices", web::get().to(products::invoices)),
            ),
    );
}
