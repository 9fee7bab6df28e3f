//! Request handling and transformation.
//!
//! # Responsibilities
//! - Assign a request ID (UUID v4) unless the client sent one
//! - Normalize an HTTP request into a `GatewayRequest`
//!
//! # Design Decisions
//! - The endpoint is the percent-decoded path
//! - Oversized bodies are rejected from `Content-Length` before reading,
//!   and while streaming when the length is not declared
//! - Request ID added as early as possible for tracing
//! - Body keys win over query keys with the same name
//! - Query values are kept as strings; handlers own coercion

use std::collections::BTreeMap;

use axum::{
    body::Body,
    extract::Query,
    http::{header::CONTENT_LENGTH, HeaderMap, HeaderName, Request},
};
use futures_util::StreamExt;
use percent_encoding::percent_decode_str;
use serde_json::Value;
use tower::Layer;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestId, SetRequestId,
};

pub use tower_http::request_id::RequestId;

use crate::gateway::{GatewayError, GatewayRequest, Headers, Params};
use crate::routing::ApiMethod;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Sets `x-request-id` on incoming requests and copies it to the response.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = SetRequestId<PropagateRequestId<S>, MakeRequestUuid>;

    fn layer(&self, inner: S) -> Self::Service {
        let header = HeaderName::from_static(X_REQUEST_ID);
        SetRequestId::new(
            PropagateRequestId::new(inner, header.clone()),
            header,
            MakeRequestUuid,
        )
    }
}

pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl RequestIdExt for HeaderMap {
    fn request_id(&self) -> Option<&str> {
        self.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
    }
}

/// Build the gateway request for an HTTP call. `body_limit` bounds the
/// buffered body.
pub async fn into_gateway_request(
    request: Request<Body>,
    request_id: &str,
    body_limit: usize,
) -> Result<GatewayRequest, GatewayError> {
    let (parts, body) = request.into_parts();

    let method = ApiMethod::from_http(&parts.method).ok_or_else(|| {
        GatewayError::UnsupportedMethod {
            method: parts.method.to_string(),
        }
    })?;

    let endpoint = percent_decode_str(parts.uri.path())
        .decode_utf8()
        .map_err(|_| GatewayError::bad_request("path is not valid UTF-8 once decoded"))?
        .into_owned();

    let bytes = read_body(&parts.headers, body, body_limit).await?;

    let mut params = parse_body(&bytes)?;
    let query = Query::<BTreeMap<String, String>>::try_from_uri(&parts.uri)
        .map_err(|e| GatewayError::bad_request(format!("invalid query string: {}", e)))?;
    for (key, value) in query.0 {
        params.entry(key).or_insert(Value::String(value));
    }

    Ok(GatewayRequest {
        endpoint,
        method,
        params,
        headers: collect_headers(&parts.headers),
        request_id: request_id.to_string(),
    })
}

/// Buffer the body, failing with `PayloadTooLarge` past `limit` bytes.
async fn read_body(
    headers: &HeaderMap,
    body: Body,
    limit: usize,
) -> Result<Vec<u8>, GatewayError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit as u64) {
        return Err(GatewayError::PayloadTooLarge { limit });
    }

    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| GatewayError::bad_request(format!("failed to read body: {}", e)))?;
        if buf.len() + chunk.len() > limit {
            return Err(GatewayError::PayloadTooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

/// An empty body is an empty parameter object.
pub fn parse_body(bytes: &[u8]) -> Result<Params, GatewayError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Params::new());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(GatewayError::bad_request("body must be a JSON object")),
        Err(e) => Err(GatewayError::bad_request(format!(
            "body is not valid JSON: {}",
            e
        ))),
    }
}

pub fn collect_headers(headers: &HeaderMap) -> Headers {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect()
}
