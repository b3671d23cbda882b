//! # arrowroute
//!
//! The request-dispatch core of an HTTP service framework for
//! Arrowhead-style service meshes.
//!
//! Given an incoming request, arrowroute decides which handlers run, in which
//! order, and who gets to recover when one of them fails.
//!
//! ## The moving parts
//!
//! - **Patterns**: `/orders/#id`, `/files/>`. Compiled at registration,
//!   matched in one left-to-right scan.
//! - **Validators**: run before the route and may answer the request
//!   themselves (a `400`, a `401`, …), in which case the route never runs.
//! - **Routes**: the primary handler for a method and pattern.
//! - **Catchers**: offered any fault a validator or route raises, filtered by
//!   method, pattern and [`FaultClass`].
//!
//! At startup every route is paired with exactly the validators and catchers
//! that could ever apply to it. Nothing is scanned per request beyond that
//! subset, and nothing is mutated after startup.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use arrowroute::{Fault, Request, Response, Server, Service, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), arrowroute::Error> {
//!     let mut api = Service::builder("/api")?;
//!     api.validator(None, Some("/widgets/#id"), numeric_id)?
//!         .get("/widgets/#id", get_widget);
//!
//!     Server::bind("0.0.0.0:3000")?.service(api.build()).serve().await
//! }
//!
//! async fn numeric_id(req: Request, res: Response) -> Result<Response, Fault> {
//!     match req.param(0).map(str::parse::<u64>) {
//!         Some(Ok(_)) => Ok(res),
//!         _ => Ok(res.status(StatusCode::BAD_REQUEST)),
//!     }
//! }
//!
//! async fn get_widget(req: Request, res: Response) -> Result<Response, Fault> {
//!     let id = req.param(0).unwrap_or_default();
//!     Ok(res.json(format!(r#"{{"id":{id}}}"#)))
//! }
//! ```

mod cancel;
mod dispatcher;
mod error;
mod filter;
mod handler;
mod pattern;
mod request;
mod response;
mod sequence;
mod server;
mod service;

pub mod fault;
pub mod health;

pub use cancel::{CancelHandle, Cancellation, DropGuard};
pub use dispatcher::{Dispatcher, Disposition};
pub use error::{Error, PatternError};
pub use fault::{Fault, FaultClass};
pub use filter::{Catcher, Filter, Route, Validator};
pub use handler::{CatchHandler, Handler};
pub use pattern::{Params, Pattern};
pub use request::Request;
pub use response::{ContentType, Response};
pub use sequence::RouteSequence;
pub use server::Server;
pub use service::{Service, ServiceBuilder};

pub use http;
pub use http::{Method, StatusCode};
