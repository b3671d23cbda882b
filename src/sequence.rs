//! Route sequences: one precomputed pipeline per route.
//!
//! At build time every route is paired with the validators and catchers that
//! could ever apply to it, already in precedence order. At request time a
//! sequence runs
//!
//! ```text
//! match ─▶ validate* ─▶ route ─┬─▶ handled
//!                              │
//!        (any fault) ──────────┴─▶ catch* ─▶ handled | unclaimed fault
//! ```
//!
//! one step at a time. Each step awaits the previous one, since whether a
//! validator already answered decides whether the route runs at all.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cancel::Cancellation;
use crate::fault::Fault;
use crate::filter::{Catcher, Filter, Route, Validator};
use crate::pattern::Params;
use crate::request::Request;
use crate::response::Response;

/// A route together with its relevant, sorted validators and catchers.
pub struct RouteSequence {
    route: Route,
    validators: Vec<Arc<Validator>>,
    catchers: Vec<Arc<Catcher>>,
}

/// Result of offering a request to one sequence.
pub(crate) enum Outcome {
    Handled(Response),
    /// The route did not match; the response comes back untouched.
    Skipped(Response),
}

impl RouteSequence {
    /// Builds one sequence per route, in route registration order.
    ///
    /// Validators and catchers are sorted once; each sequence keeps the
    /// subset that intersects its route, preserving that global order.
    pub fn build_all(
        routes: Vec<Route>,
        validators: Vec<Validator>,
        catchers: Vec<Catcher>,
    ) -> Vec<RouteSequence> {
        let mut validators: Vec<Arc<Validator>> = validators.into_iter().map(Arc::new).collect();
        validators.sort_by(|a, b| a.cmp_precedence(b));

        let mut catchers: Vec<Arc<Catcher>> = catchers.into_iter().map(Arc::new).collect();
        catchers.sort_by(|a, b| a.cmp_precedence(b));

        routes
            .into_iter()
            .map(|route| RouteSequence {
                validators: relevant(&validators, &route),
                catchers: relevant(&catchers, &route),
                route,
            })
            .collect()
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn validators(&self) -> impl Iterator<Item = &Validator> {
        self.validators.iter().map(|v| &**v)
    }

    pub fn catchers(&self) -> impl Iterator<Item = &Catcher> {
        self.catchers.iter().map(|c| &**c)
    }

    /// Offers `request` to this sequence.
    ///
    /// `Err` carries a fault no catcher claimed, or a cancellation.
    pub(crate) async fn handle(
        &self,
        request: &Request,
        response: Response,
        cancel: &Cancellation,
    ) -> Result<Outcome, Fault> {
        let Some(params) = self.route.match_request(request.method(), request.path()) else {
            return Ok(Outcome::Skipped(response));
        };

        match self.validate_and_route(request, &params, response, cancel).await {
            Ok(response) => Ok(Outcome::Handled(response)),
            Err(fault) if fault.is_cancelled() => Err(fault),
            Err(fault) => {
                debug!(%fault, path = request.path(), "handler fault, trying catchers");
                self.catch(fault, request, &params, cancel)
                    .await
                    .map(Outcome::Handled)
            }
        }
    }

    async fn validate_and_route(
        &self,
        request: &Request,
        params: &Params,
        mut response: Response,
        cancel: &Cancellation,
    ) -> Result<Response, Fault> {
        for validator in &self.validators {
            checkpoint(cancel)?;
            let Some(view) = bind(&**validator, request, params) else {
                continue;
            };
            response = validator.handler().call(view, response).await?;
            if response.is_set() {
                debug!(ordinal = validator.ordinal(), "validator responded");
                return Ok(response);
            }
        }

        checkpoint(cancel)?;
        let view = request.with_params(params.clone());
        self.route.handler().call(view, response).await
    }

    async fn catch(
        &self,
        mut fault: Fault,
        request: &Request,
        params: &Params,
        cancel: &Cancellation,
    ) -> Result<Response, Fault> {
        for catcher in &self.catchers {
            checkpoint(cancel)?;
            if !catcher.accepts(&fault) {
                continue;
            }
            let Some(view) = bind(&**catcher, request, params) else {
                continue;
            };
            match catcher.handler().call(fault.clone(), view, Response::new()).await {
                Ok(response) if response.is_set() => {
                    debug!(ordinal = catcher.ordinal(), "catcher claimed fault");
                    return Ok(response);
                }
                Ok(_) => {}
                Err(next) if next.is_cancelled() => return Err(next),
                Err(next) => {
                    warn!(ordinal = catcher.ordinal(), %fault, %next, "catcher failed");
                    fault = next;
                }
            }
        }
        Err(fault)
    }
}

fn relevant<F: Filter>(filters: &[Arc<F>], route: &Route) -> Vec<Arc<F>> {
    filters
        .iter()
        .filter(|f| f.matches_intersection_of(route))
        .cloned()
        .collect()
}

/// Binds the view a filter's handler sees: its own parameters when it has a
/// pattern, the route's otherwise. `None` when the filter does not match
/// this concrete request.
fn bind<F: Filter>(filter: &F, request: &Request, route_params: &Params) -> Option<Request> {
    let params = filter.match_request(request.method(), request.path())?;
    let params = match filter.pattern() {
        Some(_) => params,
        None => route_params.clone(),
    };
    Some(request.with_params(params))
}

fn checkpoint(cancel: &Cancellation) -> Result<(), Fault> {
    if cancel.is_cancelled() {
        return Err(Fault::cancelled());
    }
    Ok(())
}
