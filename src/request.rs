//! Incoming HTTP request view.

use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};

use crate::fault::Fault;
use crate::pattern::Params;

/// An incoming request as seen by one handler.
///
/// The parsed head is shared; each handler gets its own cheap clone carrying
/// the path parameters bound by *its* pattern.
#[derive(Clone, Debug)]
pub struct Request {
    head: Arc<Head>,
    body: Bytes,
    path_start: usize,
    params: Params,
}

#[derive(Debug)]
struct Head {
    method: Method,
    path: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
}

impl Request {
    /// A request with no headers, query parameters or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self::from_parts(method, path, HeaderMap::new(), Vec::new(), Bytes::new())
    }

    /// Assembles a request from parts produced by a transport.
    ///
    /// `path` must already be percent-decoded.
    pub fn from_parts(
        method: Method,
        path: impl Into<String>,
        headers: HeaderMap,
        query: Vec<(String, String)>,
        body: Bytes,
    ) -> Self {
        let head = Head {
            method,
            path: path.into(),
            headers,
            query,
        };
        Self {
            head: Arc::new(head),
            body,
            path_start: 0,
            params: Params::new(),
        }
    }

    /// Converts the head and collected body handed over by hyper.
    ///
    /// The whole path is percent-decoded before any pattern sees it, so an
    /// encoded `%2F` becomes a real `/` and splits segments: `/orders/a%2Fb`
    /// does not match `/orders/#id`. Identifiers that may contain `/` belong
    /// in the query string or a prefix pattern.
    pub(crate) fn from_http(parts: http::request::Parts, body: Bytes) -> Result<Self, Fault> {
        let path = urlencoding::decode(parts.uri.path())
            .map_err(|_| Fault::http(StatusCode::BAD_REQUEST, "request path is not valid UTF-8"))?
            .into_owned();
        let query = parts
            .uri
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self::from_parts(parts.method, path, parts.headers, query, body))
    }

    pub fn method(&self) -> &Method {
        &self.head.method
    }

    /// The path below the service's base path. Patterns match against this.
    pub fn path(&self) -> &str {
        match &self.head.path[self.path_start..] {
            "" => "/",
            rest => rest,
        }
    }

    /// The full decoded path, base path included.
    pub fn full_path(&self) -> &str {
        &self.head.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// Header lookup. Values that are not visible ASCII are skipped.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name)?.to_str().ok()
    }

    /// First value of the query parameter `name`.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.head
            .query
            .iter()
            .find_map(|(k, v)| (k == name).then_some(v.as_str()))
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.head.query
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body as text, or a codec fault when it is not UTF-8.
    pub fn body_utf8(&self) -> Result<&str, Fault> {
        std::str::from_utf8(&self.body).map_err(Fault::codec)
    }

    /// The path parameter at `index`, in declaration order.
    ///
    /// For a pattern `/orders/#id`, `req.param(0)` on `/orders/42` returns `Some("42")`.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub(crate) fn with_params(&self, params: Params) -> Self {
        Self {
            params,
            ..self.clone()
        }
    }

    /// A view of this request with the first `len` bytes of the path hidden.
    pub(crate) fn below(&self, len: usize) -> Self {
        Self {
            path_start: self.path_start + len,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(uri: &str) -> http::request::Parts {
        let (parts, ()) = http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("x-api-key", "secret")
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn decodes_path_and_query() {
        let req = Request::from_http(parts("/a%20b/c?x=1&y=two%20words&x=2"), Bytes::new()).unwrap();
        assert_eq!(*req.method(), Method::POST);
        assert_eq!(req.path(), "/a b/c");
        assert_eq!(req.query("x"), Some("1"));
        assert_eq!(req.query("y"), Some("two words"));
        assert_eq!(req.query("z"), None);
        assert_eq!(req.query_pairs().len(), 3);
        assert_eq!(req.header("x-api-key"), Some("secret"));
    }

    #[test]
    fn encoded_slash_splits_segments() {
        let req = Request::from_http(parts("/orders/a%2Fb"), Bytes::new()).unwrap();
        assert_eq!(req.path(), "/orders/a/b");
        assert!(!crate::Pattern::compile("/orders/#id").unwrap().is_match(req.path()));
    }

    #[test]
    fn rejects_undecodable_path() {
        let fault = Request::from_http(parts("/a%FF"), Bytes::new()).unwrap_err();
        assert_eq!(fault.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn base_path_is_hidden() {
        let req = Request::new(Method::GET, "/api/widgets/7");
        assert_eq!(req.below(4).path(), "/widgets/7");
        assert_eq!(req.below(4).full_path(), "/api/widgets/7");
        assert_eq!(Request::new(Method::GET, "/api").below(4).path(), "/");
    }

    #[test]
    fn body_as_text() {
        let req = Request::from_parts(
            Method::POST,
            "/",
            HeaderMap::new(),
            Vec::new(),
            Bytes::from_static(b"\xff\xfe"),
        );
        let fault = req.body_utf8().unwrap_err();
        assert!(fault.class().is_a(&crate::fault::CODEC));
    }
}
