//! Service dispatcher.
//!
//! Holds every [`RouteSequence`] of a service, most specific route first,
//! and offers each request to them in turn. The first sequence that reports
//! the request handled wins; if none does, the request is not found.
//!
//! The table is built once and never mutated afterwards, so concurrent
//! requests read it without any locking.

use http::StatusCode;
use tracing::debug;

use crate::cancel::Cancellation;
use crate::fault::Fault;
use crate::filter::{Catcher, Route, Validator};
use crate::request::Request;
use crate::response::Response;
use crate::sequence::{Outcome, RouteSequence};

/// The final outcome of dispatching one request.
#[derive(Debug)]
pub enum Disposition {
    /// A validator, route or catcher produced this response.
    Handled(Response),
    /// No route matched. The response is cleared and carries `404`.
    NotFound(Response),
    /// A fault escaped every catcher. `response` is a generic `500`; the
    /// fault is handed back for logging.
    Failed { response: Response, fault: Fault },
    /// The chain was cancelled before it finished.
    Cancelled,
}

impl Disposition {
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled(_))
    }

    /// The response the transport should write.
    pub fn into_response(self) -> Response {
        match self {
            Self::Handled(response) | Self::NotFound(response) => response,
            Self::Failed { response, .. } => response,
            Self::Cancelled => Response::new().status(StatusCode::SERVICE_UNAVAILABLE),
        }
    }
}

pub struct Dispatcher {
    sequences: Vec<RouteSequence>,
}

impl Dispatcher {
    pub fn new(routes: Vec<Route>, validators: Vec<Validator>, catchers: Vec<Catcher>) -> Self {
        let mut sequences = RouteSequence::build_all(routes, validators, catchers);
        // Stable: equally specific routes keep registration order.
        sequences.sort_by(|a, b| a.route().cmp_precedence(b.route()));
        Self { sequences }
    }

    pub fn sequences(&self) -> &[RouteSequence] {
        &self.sequences
    }

    pub async fn dispatch(&self, request: &Request, cancel: &Cancellation) -> Disposition {
        let mut response = Response::new();

        for sequence in &self.sequences {
            if cancel.is_cancelled() {
                return Disposition::Cancelled;
            }
            match sequence.handle(request, response, cancel).await {
                Ok(Outcome::Handled(response)) => return Disposition::Handled(response),
                Ok(Outcome::Skipped(untouched)) => response = untouched,
                Err(fault) if fault.is_cancelled() => return Disposition::Cancelled,
                Err(fault) => {
                    let response = Response::new().status(StatusCode::INTERNAL_SERVER_ERROR);
                    return Disposition::Failed { response, fault };
                }
            }
        }

        debug!(method = %request.method(), path = request.path(), "no route matched");
        response.clear();
        Disposition::NotFound(response.status(StatusCode::NOT_FOUND))
    }
}
