//! HTTP handlers and route configuration.

mod comments;
mod health;
mod notifications;
mod posts;
mod stream;
mod timeline;
mod users;


use actix_web::web;
use murmur_core::domain::{BackwardPage, ForwardPage};
use murmur_shared::dto::{BackwardPageQuery, ForwardPageQuery};

use crate::middleware::error::AppError;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .app_data(query_config())
            .route("/health", web::get().to(health::health_check))
            // Accounts
            .route("/login", web::post().to(users::login))
            .service(
                web::resource("/users")
                    .route(web::get().to(users::search))
                    .route(web::post().to(users::create_user)),
            )
            .route("/users/{handle}", web::get().to(users::profile))
            .route(
                "/users/{handle}/toggle_follow",
                web::post().to(users::toggle_follow),
            )
            .route("/users/{handle}/followers", web::get().to(users::followers))
            .route("/users/{handle}/followees", web::get().to(users::followees))
            .route("/users/{handle}/posts", web::get().to(users::posts))
            // Posts and comments
            .route("/posts", web::post().to(posts::publish))
            .route("/posts/{id}", web::get().to(posts::show))
            .route("/posts/{id}/toggle_like", web::post().to(posts::toggle_like))
            .service(
                web::resource("/posts/{id}/comments")
                    .route(web::get().to(comments::list))
                    .route(web::post().to(comments::create)),
            )
            .route(
                "/comments/{id}/toggle_like",
                web::post().to(comments::toggle_like),
            )
            // Feeds
            .route("/timeline", web::get().to(timeline::timeline))
            .route("/notifications", web::get().to(notifications::list))
            .route(
                "/notifications/unread_count",
                web::get().to(notifications::unread_count),
            )
            .route(
                "/notifications/{id}/mark_as_read",
                web::post().to(notifications::mark_read),
            )
            .route(
                "/mark_notifications_as_read",
                web::post().to(notifications::mark_all_read),
            ),
    );
}

/// Malformed bodies get a problem document instead of actix's plain text.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn backward(query: BackwardPageQuery) -> BackwardPage {
    BackwardPage::new(query.last, query.before)
}

fn forward(query: ForwardPageQuery) -> ForwardPage {
    ForwardPage::new(query.first, query.after)
}
