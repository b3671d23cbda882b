//! Handler traits and type erasure.
//!
//! # How async handlers are stored
//!
//! Validators, routes and catchers hold handlers of *different* concrete
//! types, yet the pipeline has to call them uniformly. Each handler is hidden
//! behind a trait object (`dyn ErasedHandler` or `dyn ErasedCatchHandler`)
//! and stored in an `Arc`, so the same handler can be shared by every route
//! sequence it is relevant to.
//!
//! ```text
//! async fn check(req: Request, res: Response) -> Result<Response, Fault>
//!        ↓ builder.validator(None, Some("/w/#id"), check)
//! check.into_boxed_handler()                 ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(check))                 ← stored as BoxedHandler
//!        ↓
//! handler.call(req, res)  at request time    ← one vtable dispatch
//! ```
//!
//! The response is passed *by value* and handed back on success, so exactly
//! one handler owns it at any instant.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::fault::Fault;
use crate::request::Request;
use crate::response::Response;

/// A heap-allocated, type-erased handler future.
#[doc(hidden)]
pub type BoxFuture = Pin<Box<dyn Future<Output = Result<Response, Fault>> + Send + 'static>>;

/// Dispatch interface for validator and route handlers.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request, res: Response) -> BoxFuture;
}

/// Dispatch interface for catcher handlers.
#[doc(hidden)]
pub trait ErasedCatchHandler {
    fn call(&self, fault: Fault, req: Request, res: Response) -> BoxFuture;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

#[doc(hidden)]
pub type BoxedCatchHandler = Arc<dyn ErasedCatchHandler + Send + Sync + 'static>;

/// Implemented for every valid validator or route handler.
///
/// Satisfied automatically by any function or closure shaped like
///
/// ```text
/// async fn name(req: Request, res: Response) -> Result<Response, E>
/// ```
///
/// where `E` converts into a [`Fault`]. A validator "responds" when it
/// returns a response with a status or a body set.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

/// Implemented for every valid catcher handler.
///
/// ```text
/// async fn name(fault: Fault, req: Request, res: Response) -> Result<Response, E>
/// ```
///
/// A catcher that returns an unset response declines the fault.
pub trait CatchHandler: private::SealedCatch + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_catch_handler(self) -> BoxedCatchHandler;
}

mod private {
    pub trait Sealed {}
    pub trait SealedCatch {}
}

impl<F, Fut, E> private::Sealed for F
where
    F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, E>> + Send + 'static,
    E: Into<Fault> + 'static,
{
}

impl<F, Fut, E> Handler for F
where
    F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, E>> + Send + 'static,
    E: Into<Fault> + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

impl<F, Fut, E> private::SealedCatch for F
where
    F: Fn(Fault, Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, E>> + Send + 'static,
    E: Into<Fault> + 'static,
{
}

impl<F, Fut, E> CatchHandler for F
where
    F: Fn(Fault, Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, E>> + Send + 'static,
    E: Into<Fault> + 'static,
{
    fn into_boxed_catch_handler(self) -> BoxedCatchHandler {
        Arc::new(FnHandler(self))
    }
}

/// Bridges a concrete handler `F` to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, E> ErasedHandler for FnHandler<F>
where
    F: Fn(Request, Response) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, E>> + Send + 'static,
    E: Into<Fault> + 'static,
{
    fn call(&self, req: Request, res: Response) -> BoxFuture {
        let fut = (self.0)(req, res);
        Box::pin(async move { fut.await.map_err(Into::into) })
    }
}

impl<F, Fut, E> ErasedCatchHandler for FnHandler<F>
where
    F: Fn(Fault, Request, Response) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, E>> + Send + 'static,
    E: Into<Fault> + 'static,
{
    fn call(&self, fault: Fault, req: Request, res: Response) -> BoxFuture {
        let fut = (self.0)(fault, req, res);
        Box::pin(async move { fut.await.map_err(Into::into) })
    }
}
