//! Request model handed to handlers.
//!
//! # Responsibilities
//! - Carry method, URL, headers and the buffered body of one request
//! - Expose the path used for route matching (query excluded)
//! - Hold route parameters bound by the dispatch loop and the parsed body
//!   produced by body middleware
//!
//! # Design Decisions
//! - Bodies are buffered by the transport; no streaming
//! - The request ID is taken from `x-request-id`, set by the transport layer

use axum::body::Bytes;
use axum::http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, Method};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::dispatch::HttpError;

/// Request ID header name.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Parsed request body, filled in by body middleware.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Text(String),
    Json(serde_json::Value),
    Form(HashMap<String, String>),
}

impl Body {
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    /// Look up a top-level string field of a JSON or form body.
    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            Body::Json(value) => value.get(name).and_then(|v| v.as_str()),
            Body::Form(map) => map.get(name).map(String::as_str),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Request {
    method: Method,
    url: String,
    path: String,
    query: HashMap<String, String>,
    headers: HeaderMap,
    raw_body: Bytes,
    params: HashMap<String, String>,
    body: Body,
}

impl Request {
    /// Build a request for `method` and `url` (path plus optional query).
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        let url = url.into();
        let without_fragment = url.split('#').next().unwrap_or_default();
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, query),
            None => (without_fragment, ""),
        };
        let path = if path.is_empty() { "/" } else { path }.to_string();
        let query = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();

        Self {
            method,
            url,
            path,
            query,
            headers: HeaderMap::new(),
            raw_body: Bytes::new(),
            params: HashMap::new(),
            body: Body::Empty,
        }
    }

    /// Build a request from transport parts and a buffered body.
    pub fn from_parts(parts: Parts, body: Bytes) -> Self {
        let url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let mut request = Self::new(parts.method, url);
        request.headers = parts.headers;
        request.raw_body = body;
        request
    }

    /// Add a header. Invalid values are ignored.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Attach a raw body with its content type, setting `content-length`.
    pub fn with_body(mut self, content_type: &str, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        self.raw_body = body;
        self.with_header(header::CONTENT_TYPE, content_type)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The URL as received: path plus query.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The URL path, without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }

    /// Media type of the body, without parameters such as `charset`.
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
    }

    /// Declared body length, falling back to the buffered length.
    pub fn content_length(&self) -> Option<usize> {
        self.header(header::CONTENT_LENGTH.as_str())
            .and_then(|v| v.parse().ok())
            .or_else(|| (!self.raw_body.is_empty()).then_some(self.raw_body.len()))
    }

    pub fn raw_body(&self) -> &Bytes {
        &self.raw_body
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn set_body(&mut self, body: Body) {
        self.body = body;
    }

    /// Decode the parsed body (or the raw bytes when unparsed) into `T`.
    pub fn body_json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        let value = match &self.body {
            Body::Json(value) => value.clone(),
            Body::Form(map) => serde_json::to_value(map)?,
            Body::Text(text) => serde_json::from_str(text)?,
            Body::Empty => serde_json::from_slice(&self.raw_body)?,
        };
        Ok(serde_json::from_value(value)?)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Merge matched route params into the request. Params bound by earlier
    /// layers stay visible to later handlers unless a later match rebinds
    /// the same name.
    pub(crate) fn bind_params(&mut self, params: Vec<(String, String)>) {
        self.params.extend(params);
    }
}
