//! Request spans.
//!
//! Every routed call runs inside one span carrying the request id, so log
//! lines from the core and from handlers correlate without passing the id
//! around explicitly.

use tracing::Span;

use crate::routing::ApiMethod;

pub fn request_span(request_id: &str, method: ApiMethod, endpoint: &str) -> Span {
    tracing::info_span!(
        "gateway_request",
        request_id = %request_id,
        method = %method,
        endpoint = %endpoint
    )
}
