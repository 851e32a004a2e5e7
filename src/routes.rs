// routes.rs
use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post, put},
    Router,
};
use http::{header::CONTENT_TYPE, HeaderName, Method};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::guard::SESSION_HEADER;
use crate::handlers;
use crate::services::Services;

pub fn create_routes(services: Arc<Services>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(SESSION_HEADER)])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/users", post(handlers::create_user))
        .route("/visit", post(handlers::visit))
        .route("/login", post(handlers::login))
        .route("/polls", post(handlers::start_create_poll).get(handlers::get_polls))
        .route(
            "/polls/{id}",
            put(handlers::add_option)
                .delete(handlers::remove_option)
                .get(handlers::get_poll),
        )
        .route("/polls/{id}/publish", put(handlers::publish))
        .route("/polls/{id}/vote", post(handlers::create_vote))
        .route("/polls/{id}/counting", get(handlers::counting_poll_votes))
        .route("/mine/polls", get(handlers::get_polls_mine))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(services)
}
