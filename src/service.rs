//! Services: a base path plus everything registered beneath it.
//!
//! Registration happens on a [`ServiceBuilder`]. Templates are compiled the
//! moment they are registered, so a misconfigured pattern fails at startup and
//! never at request time. [`ServiceBuilder::build`] freezes the registrations
//! into an immutable [`Service`].

use http::Method;

use crate::cancel::Cancellation;
use crate::dispatcher::{Disposition, Dispatcher};
use crate::error::{Error, PatternError};
use crate::fault::FaultClass;
use crate::filter::{Catcher, Route, Validator};
use crate::handler::{CatchHandler, Handler};
use crate::pattern::Pattern;
use crate::request::Request;

/// An immutable, ready-to-serve set of routes below one base path.
pub struct Service {
    base_path: Option<Box<str>>,
    dispatcher: Dispatcher,
}

impl Service {
    /// Starts a service rooted at `base_path`, e.g. `"/api"`. `"/"` means
    /// no base path.
    pub fn builder(base_path: &str) -> Result<ServiceBuilder, Error> {
        let pattern = Pattern::compile(base_path)?;
        if pattern.param_count() != 0 || pattern.is_prefix() {
            return Err(Error::BasePath(base_path.to_owned()));
        }
        let base_path = (!pattern.is_root()).then(|| pattern.skeleton().into());
        Ok(ServiceBuilder {
            base_path,
            routes: Vec::new(),
            validators: Vec::new(),
            catchers: Vec::new(),
            next_ordinal: 0,
        })
    }

    pub fn base_path(&self) -> &str {
        self.base_path.as_deref().unwrap_or("/")
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Dispatches `request` if its path lies below this service's base path.
    ///
    /// Returns `None` when the request belongs to some other service.
    pub async fn handle(&self, request: &Request, cancel: &Cancellation) -> Option<Disposition> {
        let request = match &self.base_path {
            None => request.clone(),
            Some(base) => {
                let rest = request.path().strip_prefix(&**base)?;
                if !(rest.is_empty() || rest.starts_with('/')) {
                    return None;
                }
                request.below(base.len())
            }
        };
        Some(self.dispatcher.dispatch(&request, cancel).await)
    }
}

/// Collects routes, validators and catchers for a [`Service`].
///
/// Validators and catchers get ordinals in registration order; earlier
/// registrations win ties.
pub struct ServiceBuilder {
    base_path: Option<Box<str>>,
    routes: Vec<Route>,
    validators: Vec<Validator>,
    catchers: Vec<Catcher>,
    next_ordinal: u32,
}

impl ServiceBuilder {
    pub fn route(
        &mut self,
        method: Option<Method>,
        pattern: Option<&str>,
        handler: impl Handler,
    ) -> Result<&mut Self, Error> {
        let pattern = compile(pattern)?;
        Ok(self.add_route(Route::new(method, pattern, handler)))
    }

    pub fn validator(
        &mut self,
        method: Option<Method>,
        pattern: Option<&str>,
        handler: impl Handler,
    ) -> Result<&mut Self, Error> {
        let pattern = compile(pattern)?;
        let ordinal = self.next_ordinal;
        Ok(self.add_validator(Validator::new(ordinal, method, pattern, handler)))
    }

    /// `class: None` catches every fault.
    pub fn catcher(
        &mut self,
        method: Option<Method>,
        pattern: Option<&str>,
        class: Option<&'static FaultClass>,
        handler: impl CatchHandler,
    ) -> Result<&mut Self, Error> {
        let pattern = compile(pattern)?;
        let ordinal = self.next_ordinal;
        Ok(self.add_catcher(Catcher::new(ordinal, method, pattern, class, handler)))
    }

    pub fn add_route(&mut self, route: Route) -> &mut Self {
        self.routes.push(route);
        self
    }

    pub fn add_validator(&mut self, validator: Validator) -> &mut Self {
        self.bump_ordinal(validator.ordinal());
        self.validators.push(validator);
        self
    }

    pub fn add_catcher(&mut self, catcher: Catcher) -> &mut Self {
        self.bump_ordinal(catcher.ordinal());
        self.catchers.push(catcher);
        self
    }

    /// Precomputes every route sequence and freezes the service.
    pub fn build(self) -> Service {
        Service {
            base_path: self.base_path,
            dispatcher: Dispatcher::new(self.routes, self.validators, self.catchers),
        }
    }

    fn bump_ordinal(&mut self, used: u32) {
        self.next_ordinal = self.next_ordinal.max(used.saturating_add(1));
    }
}

fn compile(pattern: Option<&str>) -> Result<Option<Pattern>, PatternError> {
    pattern.map(Pattern::compile).transpose()
}

macro_rules! define_method {
    ($name:ident, $method:ident) => {
        #[doc = concat!("Registers a `", stringify!($method), "` route.")]
        ///
        /// # Panics
        ///
        /// Panics if `pattern` is not a valid template.
        pub fn $name(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
            if let Err(e) = self.route(Some(Method::$method), Some(pattern), handler) {
                panic!("{e}");
            }
            self
        }
    };
}

impl ServiceBuilder {
    define_method!(get, GET);
    define_method!(post, POST);
    define_method!(put, PUT);
    define_method!(delete, DELETE);
    define_method!(patch, PATCH);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_path_must_be_literal() {
        assert!(Service::builder("/api").is_ok());
        assert!(Service::builder("/api/v1/").is_ok());
        assert!(matches!(Service::builder("/api/#v"), Err(Error::BasePath(_))));
        assert!(matches!(Service::builder("/api/>"), Err(Error::BasePath(_))));
        assert!(matches!(Service::builder("api"), Err(Error::Pattern(_))));
        assert_eq!(Service::builder("/").unwrap().build().base_path(), "/");
        assert_eq!(Service::builder("/api/").unwrap().build().base_path(), "/api");
    }

    #[test]
    fn invalid_templates_fail_at_registration() {
        async fn noop(_: Request, res: crate::Response) -> Result<crate::Response, crate::Fault> {
            Ok(res)
        }
        let mut builder = Service::builder("/").unwrap();
        assert!(builder.route(None, Some("/a/.."), noop).is_err());
        assert!(builder.validator(None, Some("/a/%2F"), noop).is_err());
        assert!(builder.route(Some(Method::GET), Some("/a/#id"), noop).is_ok());
    }

    #[test]
    #[should_panic(expected = "relative segments are not allowed")]
    fn shorthand_panics_on_invalid_template() {
        async fn noop(_: Request, res: crate::Response) -> Result<crate::Response, crate::Fault> {
            Ok(res)
        }
        Service::builder("/").unwrap().get("/a/../b", noop);
    }
}
