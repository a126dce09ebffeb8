//! Request correlation.
//!
//! Every request carries an id from the moment it enters the router. It is
//! recorded on the `http_request` tracing span, so store failures logged deep
//! inside a handler can be tied back to the request line, and it is echoed to
//! the client in `x-request-id` so a player or admin UI can quote it.

use axum::{body::Body, extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

/// Header read from the client and written back on the response
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id kept in the request extensions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Takes the client's id when it is a UUID; anything else gets a new one.
    ///
    /// Free-form client ids are not trusted because they end up in log lines.
    pub fn from_header(value: Option<&HeaderValue>) -> Self {
        value
            .and_then(|h| h.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(RequestId)
            .unwrap_or_else(|| RequestId(Uuid::new_v4()))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attaches a [`RequestId`] to the request and copies it onto the response.
///
/// Must sit outside `TraceLayer` so the span can see the id.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_header(request.headers().get(REQUEST_ID_HEADER));
    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// `make_span_with` hook for `TraceLayer`
pub fn make_span_with_request_id(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(ToString::to_string)
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_uuid_is_reused() {
        let id = Uuid::new_v4();
        let header = HeaderValue::from_str(&id.to_string()).unwrap();
        assert_eq!(RequestId::from_header(Some(&header)), RequestId(id));
    }

    #[test]
    fn test_free_form_ids_are_replaced() {
        let header = HeaderValue::from_static("trace-me-please");
        let generated = RequestId::from_header(Some(&header));
        assert_ne!(generated.to_string(), "trace-me-please");
        assert_ne!(RequestId::from_header(None), generated);
    }
}
