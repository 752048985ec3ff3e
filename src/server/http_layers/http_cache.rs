//! HTTP caching middleware

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Marks successful responses as cacheable for `max_age_sec` seconds. Error
/// responses are left uncached, and a `Cache-Control` set by the handler is
/// kept as is.
pub async fn http_cache(
    State(max_age_sec): State<usize>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let response = next.run(request).await.into_response();
    if !response.status().is_success()
        || response.headers().contains_key(header::CACHE_CONTROL)
    {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    if let Ok(value) = HeaderValue::from_str(&format!("max-age={}", max_age_sec)) {
        parts.headers.insert(header::CACHE_CONTROL, value);
    }

    Response::from_parts(parts, body)
}
