//! HTTP handlers and route configuration.

mod accounts;
mod health;
mod posts;

use actix_web::{HttpResponse, http::header, web};

pub(crate) const INDEX_PATH: &str = "/";
pub(crate) const LIST_PATH: &str = "/posts";
pub(crate) const CONFIRM_DELETE_PATH: &str = "/posts/confirm-delete";

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(posts::index))
        .route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/posts")
                .service(web::resource("").route(web::get().to(posts::list)))
                .service(
                    web::resource("/new")
                        .route(web::get().to(posts::create_form))
                        .route(web::post().to(posts::create)),
                )
                .service(
                    web::resource("/confirm-delete")
                        .route(web::get().to(posts::confirm_delete_page))
                        .route(web::post().to(posts::confirm_delete)),
                )
                .service(web::resource("/{id}").route(web::get().to(posts::detail)))
                .service(
                    web::resource("/{id}/edit")
                        .route(web::get().to(posts::update_form))
                        .route(web::post().to(posts::update)),
                )
                .service(web::resource("/{id}/delete").route(web::get().to(posts::delete))),
        )
        .service(
            web::scope("/accounts")
                .service(
                    web::resource("/register")
                        .route(web::get().to(accounts::register_form))
                        .route(web::post().to(accounts::register)),
                )
                .service(
                    web::resource("/login")
                        .route(web::get().to(accounts::login_form))
                        .route(web::post().to(accounts::login)),
                )
                .service(web::resource("/logout").route(web::post().to(accounts::logout))),
        );
}

/// `302 Found` to `location`.
pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

#[cfg(test)]
pub(crate) mod test_support;
