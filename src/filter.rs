//! Route, validator and catcher descriptors, and their precedence.
//!
//! All three pair an optional method and an optional [`Pattern`] with a
//! handler. A missing method matches every method; a missing pattern matches
//! every path.
//!
//! Precedence decides invocation order whenever several filters could apply
//! to the same request:
//!
//! | Kind      | Order (first key wins)                                             |
//! |-----------|--------------------------------------------------------------------|
//! | Validator | has method → pattern specificity → ordinal                         |
//! | Catcher   | pattern specificity → has method → narrower fault class → ordinal  |
//! | Route     | has method → pattern specificity (→ registration order)            |
//!
//! "Pattern specificity" puts filters with a pattern before filters without
//! one, then follows [`Pattern`]'s `Ord`.

use std::cmp::Ordering;

use http::Method;

use crate::fault::{self, Fault, FaultClass};
use crate::handler::{BoxedCatchHandler, BoxedHandler, CatchHandler, Handler};
use crate::pattern::{Params, Pattern};

/// The method and pattern a descriptor is bound to.
pub trait Filter {
    fn method(&self) -> Option<&Method>;

    fn pattern(&self) -> Option<&Pattern>;

    /// Tests `method` and `path` against this filter, binding the filter's
    /// own path parameters.
    fn match_request(&self, method: &Method, path: &str) -> Option<Params> {
        if self.method().is_some_and(|m| m != method) {
            return None;
        }
        match self.pattern() {
            Some(pattern) => pattern.matches(path),
            None => Some(Params::new()),
        }
    }

    /// Whether some request could match both this filter and `route`.
    fn matches_intersection_of(&self, route: &Route) -> bool {
        if let (Some(a), Some(b)) = (self.method(), route.method()) {
            if a != b {
                return false;
            }
        }
        match (self.pattern(), route.pattern()) {
            (Some(a), Some(b)) => a.intersects(b),
            _ => true,
        }
    }
}

/// The primary handler for a method/pattern pair.
#[derive(Clone)]
pub struct Route {
    method: Option<Method>,
    pattern: Option<Pattern>,
    handler: BoxedHandler,
}

impl Route {
    pub fn new(method: Option<Method>, pattern: Option<Pattern>, handler: impl Handler) -> Self {
        Self {
            method,
            pattern,
            handler: handler.into_boxed_handler(),
        }
    }

    pub(crate) fn handler(&self) -> &BoxedHandler {
        &self.handler
    }

    /// Specificity order used by the dispatcher. Equal routes keep
    /// registration order under a stable sort.
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        by_presence(self.method(), other.method())
            .then_with(|| by_pattern(self.pattern(), other.pattern()))
    }
}

/// A pre-route handler that may answer the request itself.
#[derive(Clone)]
pub struct Validator {
    ordinal: u32,
    method: Option<Method>,
    pattern: Option<Pattern>,
    handler: BoxedHandler,
}

impl Validator {
    pub fn new(
        ordinal: u32,
        method: Option<Method>,
        pattern: Option<Pattern>,
        handler: impl Handler,
    ) -> Self {
        Self {
            ordinal,
            method,
            pattern,
            handler: handler.into_boxed_handler(),
        }
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub(crate) fn handler(&self) -> &BoxedHandler {
        &self.handler
    }

    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        by_presence(self.method(), other.method())
            .then_with(|| by_pattern(self.pattern(), other.pattern()))
            .then_with(|| self.ordinal.cmp(&other.ordinal))
    }
}

/// An error handler, offered the faults raised by validators and routes.
#[derive(Clone)]
pub struct Catcher {
    ordinal: u32,
    method: Option<Method>,
    pattern: Option<Pattern>,
    class: &'static FaultClass,
    handler: BoxedCatchHandler,
}

impl Catcher {
    /// `class: None` catches every fault.
    pub fn new(
        ordinal: u32,
        method: Option<Method>,
        pattern: Option<Pattern>,
        class: Option<&'static FaultClass>,
        handler: impl CatchHandler,
    ) -> Self {
        Self {
            ordinal,
            method,
            pattern,
            class: class.unwrap_or(&fault::ERROR),
            handler: handler.into_boxed_catch_handler(),
        }
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn class(&self) -> &'static FaultClass {
        self.class
    }

    pub(crate) fn handler(&self) -> &BoxedCatchHandler {
        &self.handler
    }

    pub fn accepts(&self, fault: &Fault) -> bool {
        fault.class().is_a(self.class)
    }

    /// Narrower classes sort before their ancestors. Class depth is used as
    /// the key so unrelated classes still compare consistently; equal depth
    /// falls through to the ordinal.
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        by_pattern(self.pattern(), other.pattern())
            .then_with(|| by_presence(self.method(), other.method()))
            .then_with(|| other.class.depth().cmp(&self.class.depth()))
            .then_with(|| self.ordinal.cmp(&other.ordinal))
    }
}

macro_rules! impl_filter {
    ($($ty:ty),+) => {$(
        impl Filter for $ty {
            fn method(&self) -> Option<&Method> {
                self.method.as_ref()
            }

            fn pattern(&self) -> Option<&Pattern> {
                self.pattern.as_ref()
            }
        }
    )+};
}

impl_filter!(Route, Validator, Catcher);

/// `Some` sorts before `None`.
fn by_presence<T>(a: Option<&T>, b: Option<&T>) -> Ordering {
    b.is_some().cmp(&a.is_some())
}

fn by_pattern(a: Option<&Pattern>, b: Option<&Pattern>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        _ => by_presence(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Request, Response};

    async fn noop(_: Request, res: Response) -> Result<Response, Fault> {
        Ok(res)
    }

    async fn catch_noop(_: Fault, _: Request, res: Response) -> Result<Response, Fault> {
        Ok(res)
    }

    static LOOKUP: FaultClass = FaultClass::new("lookup", &fault::HTTP);

    fn p(template: &str) -> Option<Pattern> {
        Some(Pattern::compile(template).unwrap())
    }

    fn validator(ordinal: u32, method: Option<Method>, pattern: Option<Pattern>) -> Validator {
        Validator::new(ordinal, method, pattern, noop)
    }

    fn catcher(
        ordinal: u32,
        method: Option<Method>,
        pattern: Option<Pattern>,
        class: Option<&'static FaultClass>,
    ) -> Catcher {
        Catcher::new(ordinal, method, pattern, class, catch_noop)
    }

    fn route(method: Option<Method>, pattern: Option<Pattern>) -> Route {
        Route::new(method, pattern, noop)
    }

    #[test]
    fn validator_order() {
        let mut validators = vec![
            validator(0, None, None),
            validator(1, None, p("/a/#x")),
            validator(2, Some(Method::GET), None),
            validator(3, Some(Method::GET), p("/a/b")),
            validator(4, None, p("/a/b")),
            validator(5, Some(Method::POST), p("/a/b")),
        ];
        validators.sort_by(Validator::cmp_precedence);
        let order: Vec<u32> = validators.iter().map(Validator::ordinal).collect();
        assert_eq!(order, [3, 5, 2, 4, 1, 0]);
    }

    #[test]
    fn catcher_order() {
        let mut catchers = vec![
            catcher(0, None, None, None),
            catcher(1, None, None, Some(&fault::HTTP)),
            catcher(2, None, None, Some(&LOOKUP)),
            catcher(3, Some(Method::GET), None, None),
            catcher(4, None, p("/a"), None),
            catcher(5, None, None, Some(&fault::CODEC)),
        ];
        catchers.sort_by(Catcher::cmp_precedence);
        let order: Vec<u32> = catchers.iter().map(Catcher::ordinal).collect();
        assert_eq!(order, [4, 3, 2, 1, 5, 0]);
    }

    #[test]
    fn catcher_accepts_descendants_only() {
        let http = catcher(0, None, None, Some(&fault::HTTP));
        assert!(http.accepts(&Fault::new(&LOOKUP, "x")));
        assert!(http.accepts(&Fault::http(http::StatusCode::GONE, "x")));
        assert!(!http.accepts(&Fault::codec("x")));
        assert!(catcher(1, None, None, None).accepts(&Fault::codec("x")));
    }

    #[test]
    fn route_order() {
        let mut routes = vec![
            (0, route(None, None)),
            (1, route(Some(Method::GET), p("/w/#id"))),
            (2, route(None, p("/w/#id"))),
            (3, route(Some(Method::GET), p("/w/list"))),
        ];
        routes.sort_by(|a, b| a.1.cmp_precedence(&b.1));
        let order: Vec<i32> = routes.iter().map(|r| r.0).collect();
        assert_eq!(order, [3, 1, 2, 0]);
    }

    #[test]
    fn intersection_with_route() {
        let get_w = route(Some(Method::GET), p("/w/#id"));

        assert!(validator(0, None, None).matches_intersection_of(&get_w));
        assert!(validator(0, Some(Method::GET), None).matches_intersection_of(&get_w));
        assert!(!validator(0, Some(Method::POST), None).matches_intersection_of(&get_w));
        assert!(validator(0, None, p("/w/9")).matches_intersection_of(&get_w));
        assert!(validator(0, None, p("/>")).matches_intersection_of(&get_w));
        assert!(!validator(0, None, p("/x/#id")).matches_intersection_of(&get_w));
        assert!(!validator(0, None, p("/w/#id/more")).matches_intersection_of(&get_w));

        let anything = route(None, None);
        assert!(validator(0, Some(Method::DELETE), p("/x")).matches_intersection_of(&anything));
    }

    #[test]
    fn match_request_binds_own_parameters() {
        let v = validator(0, Some(Method::GET), p("/w/#id"));
        assert_eq!(
            v.match_request(&Method::GET, "/w/9").map(|p| p.into_vec()),
            Some(vec!["9".to_owned()])
        );
        assert!(v.match_request(&Method::POST, "/w/9").is_none());
        assert!(v.match_request(&Method::GET, "/v/9").is_none());
        assert_eq!(
            validator(1, None, None).match_request(&Method::PUT, "/any").map(|p| p.len()),
            Some(0)
        );
    }
}
