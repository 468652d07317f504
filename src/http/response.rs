//! Response adapter handed to handlers.
//!
//! # Responsibilities
//! - Collect status, headers and body for one request
//! - Provide the terminators: text, status, JSON, file, redirect, rendered view
//! - Tag each body with the content type of the terminator that wrote it
//!
//! # Design Decisions
//! - Exactly one terminator per request; a second returns `AlreadySent`
//! - The response is buffered and converted to an axum response by the transport
//! - Relative redirects resolve against the request path, not the full URL

use axum::body::Bytes;
use axum::http::header::{self, InvalidHeaderValue};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::dispatch::HttpError;
use crate::http::request::Request;
use crate::middleware::views::{self, TemplateError};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// Errors raised by response terminators.
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("response already sent")]
    AlreadySent,

    #[error("failed to read {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("views directory is not configured")]
    ViewsNotConfigured,

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("failed to serialize JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),
}

impl From<ResponseError> for HttpError {
    fn from(err: ResponseError) -> Self {
        let status = match &err {
            ResponseError::File { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        HttpError::with_status(status, err.to_string())
    }
}

#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    sent: bool,
    request_path: String,
    views: Option<PathBuf>,
}

impl Response {
    /// Create an empty `200 OK` response for `req`.
    pub fn for_request(req: &Request) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            sent: false,
            request_path: req.path().to_string(),
            views: None,
        }
    }

    /// Directory `render` resolves views against.
    pub fn with_views(mut self, views: Option<PathBuf>) -> Self {
        self.views = views;
        self
    }

    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn set_header(&mut self, name: HeaderName, value: &str) -> Result<&mut Self, ResponseError> {
        self.headers.insert(name, HeaderValue::from_str(value)?);
        Ok(self)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body as text, lossily decoded.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    fn ensure_unsent(&self) -> Result<(), ResponseError> {
        if self.sent {
            return Err(ResponseError::AlreadySent);
        }
        Ok(())
    }

    fn finish(&mut self, content_type: &'static str, body: impl Into<Bytes>) -> Result<(), ResponseError> {
        self.ensure_unsent()?;
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.body = body.into();
        self.sent = true;
        Ok(())
    }

    /// Send a plain-text body.
    pub fn send(&mut self, text: impl Into<String>) -> Result<(), ResponseError> {
        self.finish(TEXT_PLAIN, text.into())
    }

    /// Set `status` and send its reason phrase.
    pub fn send_status(&mut self, status: StatusCode) -> Result<(), ResponseError> {
        self.status = status;
        let reason = status.canonical_reason().unwrap_or_default();
        self.finish(TEXT_PLAIN, reason)
    }

    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ResponseError> {
        self.ensure_unsent()?;
        let body = serde_json::to_vec(value)?;
        self.finish(APPLICATION_JSON, body)
    }

    /// Send a file; the content type follows its extension (HTML when unknown).
    pub async fn send_file(&mut self, path: impl AsRef<Path>) -> Result<(), ResponseError> {
        self.ensure_unsent()?;
        let path = path.as_ref();
        let contents = tokio::fs::read(path)
            .await
            .map_err(|source| ResponseError::File {
                path: path.to_path_buf(),
                source,
            })?;
        self.finish(content_type_for(path), contents)
    }

    /// Answer `302 Found`. A relative `location` resolves under the request path.
    pub fn redirect(&mut self, location: &str) -> Result<(), ResponseError> {
        self.ensure_unsent()?;
        let target = if location.starts_with('/') {
            location.to_string()
        } else {
            format!("{}/{}", self.request_path.trim_end_matches('/'), location)
        };
        let target = HeaderValue::from_str(&target)?;

        self.status = StatusCode::FOUND;
        self.headers.insert(header::LOCATION, target);
        self.finish(TEXT_PLAIN, location.to_string())
    }

    /// Render `<views>/<view>.html` against `data`.
    pub async fn render(&mut self, view: &str, data: &serde_json::Value) -> Result<(), ResponseError> {
        self.ensure_unsent()?;
        let dir = self.views.as_deref().ok_or(ResponseError::ViewsNotConfigured)?;
        let path = views::view_path(dir, view);
        let src = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ResponseError::File { path, source })?;
        let html = views::render_template(&src, data)?;
        self.finish(TEXT_HTML, html)
    }

    /// Convert into an axum response.
    pub fn into_http(self) -> axum::response::Response {
        let mut response = axum::response::Response::new(axum::body::Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("json") => APPLICATION_JSON,
        Some("txt") => TEXT_PLAIN,
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        _ => TEXT_HTML,
    }
}
