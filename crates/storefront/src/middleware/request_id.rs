//! Request ID middleware for request tracing and correlation.
//!
//! Each request gets an ID, either forwarded from an upstream proxy or
//! freshly generated. The ID is recorded on the tracing span, tagged on the
//! Sentry scope, and echoed back in the response headers.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest forwarded ID that is trusted as-is.
const MAX_FORWARDED_ID_LENGTH: usize = 128;

/// Use the forwarded ID if it is short and printable, otherwise mint one.
fn resolve_request_id(forwarded: Option<&str>) -> String {
    forwarded
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_FORWARDED_ID_LENGTH
                && id.chars().all(|c| c.is_ascii_graphic())
        })
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = resolve_request_id(
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok()),
    );

    Span::current().record("request_id", &request_id);

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_id_is_kept() {
        assert_eq!(resolve_request_id(Some("abc-123")), "abc-123");
    }

    #[test]
    fn test_bad_forwarded_id_is_replaced() {
        for bad in [None, Some(""), Some("has space")] {
            let id = resolve_request_id(bad);
            assert!(Uuid::parse_str(&id).is_ok(), "{bad:?} should be replaced");
        }
        let long = "x".repeat(MAX_FORWARDED_ID_LENGTH + 1);
        assert_ne!(resolve_request_id(Some(&long)), long);
    }
}
