//! HTTP adapter for the item router.
//!
//! These handlers turn an axum request into a [`RouteRequest`] and the
//! router's [`RouteResponse`] back into an HTTP response. All routing
//! decisions stay in [`ItemRouter`]; this layer only reshapes data.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, MatchedPath, Path, State},
    http::{header::HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use itemrouter_core::request::{RouteRequest, RouteResponse};

use crate::router::ItemRouter;

/// A [`RouteResponse`] rendered as an HTTP response.
pub struct JsonResponse(pub RouteResponse);

impl IntoResponse for JsonResponse {
    fn into_response(self) -> Response {
        let JsonResponse(response) = self;
        let status =
            StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut http_response = (status, response.body).into_response();
        let headers = http_response.headers_mut();
        for (name, value) in &response.headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping invalid response header"),
            }
        }

        http_response
    }
}

/// Any method on `/items` or `/items/{id}`.
///
/// The matched template is passed on as-is, so the router sees
/// `/items/{id}` rather than the concrete path.
pub async fn route_item_request(
    State(router): State<ItemRouter>,
    method: Method,
    matched_path: MatchedPath,
    path: Result<Path<HashMap<String, String>>, PathRejection>,
    body: Bytes,
) -> JsonResponse {
    let path_parameters = path.ok().map(|Path(params)| params).filter(|p| !p.is_empty());

    forward(&router, method, matched_path.as_str(), path_parameters, body).await
}

/// Every path that is not an item route.
///
/// The literal request path stands in for the template, which the router
/// rejects as an unsupported route.
pub async fn route_unmatched_request(
    State(router): State<ItemRouter>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> JsonResponse {
    forward(&router, method, uri.path(), None, body).await
}

async fn forward(
    router: &ItemRouter,
    method: Method,
    resource_template: &str,
    path_parameters: Option<HashMap<String, String>>,
    body: Bytes,
) -> JsonResponse {
    let body = if body.is_empty() {
        None
    } else {
        match String::from_utf8(body.to_vec()) {
            Ok(body) => Some(body),
            Err(_) => {
                tracing::warn!(method = %method, path = %resource_template, "Body is not UTF-8");
                return JsonResponse(RouteResponse::error(400, "Request body is not valid UTF-8"));
            }
        }
    };

    let request = RouteRequest {
        method: method.to_string(),
        resource_template: resource_template.to_string(),
        path_parameters,
        body,
    };

    JsonResponse(router.handle(request).await)
}
