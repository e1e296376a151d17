use std::time::Duration;

use axum::{http::StatusCode, routing::any, Router};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use itemrouter_core::request::{COLLECTION_TEMPLATE, ITEM_TEMPLATE};

use crate::{
    handlers::items::{route_item_request, route_unmatched_request},
    router::ItemRouter,
};

/// Create the HTTP application around an [`ItemRouter`].
pub fn create_app(router: ItemRouter) -> Router {
    Router::new()
        .route(COLLECTION_TEMPLATE, any(route_item_request))
        .route(ITEM_TEMPLATE, any(route_item_request))
        .fallback(route_unmatched_request)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        .with_state(router)
}
