//! Outgoing HTTP response builder.
//!
//! A [`Response`] starts out *unset*: no status, no body. Handlers receive it
//! by value, fill it in and hand it back. A validator that returns a set
//! response ends the pipeline for that request.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;

/// Common content-type values for use with [`Response::bytes`].
#[derive(Clone, Copy, Debug)]
pub enum ContentType {
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

/// An outgoing HTTP response under construction.
///
/// ```rust
/// use arrowroute::{ContentType, Response, StatusCode};
/// use arrowroute::http::header::{HeaderValue, LOCATION};
///
/// let res = Response::new()
///     .status(StatusCode::CREATED)
///     .header(LOCATION, HeaderValue::from_static("/widgets/42"))
///     .json(r#"{"id":42}"#);
/// assert!(res.is_set());
///
/// let xml = Response::new().bytes(ContentType::Xml, "<ok/>");
/// assert_eq!(xml.status_code(), None);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Response {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = Some(code);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the body without touching `content-type`.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// JSON body. The bytes come from whatever serialiser the caller uses.
    pub fn json(self, body: impl Into<Bytes>) -> Self {
        self.bytes(ContentType::Json, body)
    }

    pub fn text(self, body: impl Into<String>) -> Self {
        self.bytes(ContentType::Text, body.into())
    }

    pub fn bytes(self, content_type: ContentType, body: impl Into<Bytes>) -> Self {
        self.header(CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()))
            .body(body)
    }

    /// Drops status, headers and body.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether a status or a body has been set.
    pub fn is_set(&self) -> bool {
        self.status.is_some() || self.body.is_some()
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body_bytes(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Finalises into the transport's response type. An unset status is `200 OK`.
    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body.unwrap_or_default()));
        *res.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *res.headers_mut() = self.headers;
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unset() {
        let res = Response::new();
        assert!(!res.is_set());
        assert!(!Response::new().header(CONTENT_TYPE, HeaderValue::from_static("text/plain")).is_set());
        assert!(Response::new().status(StatusCode::NO_CONTENT).is_set());
        assert!(Response::new().body("x").is_set());
    }

    #[test]
    fn clear_resets_everything() {
        let mut res = Response::new().status(StatusCode::BAD_REQUEST).text("nope");
        res.clear();
        assert!(!res.is_set());
        assert!(res.headers().is_empty());
    }

    #[test]
    fn into_http_defaults_to_ok() {
        let res = Response::new().text("hi").into_http();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    }
}
