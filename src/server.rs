//! HTTP transport and graceful shutdown.
//!
//! The server owns the wire: it accepts connections, turns each hyper request
//! into a [`Request`], offers it to its services in registration order and
//! writes whatever [`Disposition`] comes back.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or **Ctrl-C** the server stops accepting connections, lets
//! every in-flight connection run to completion and then returns from
//! [`Server::serve`].

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::cancel::CancelHandle;
use crate::dispatcher::Disposition;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::service::Service;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    services: Vec<Service>,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust
    /// use arrowroute::Server;
    ///
    /// assert!(Server::bind("0.0.0.0:3000").is_ok());
    /// assert!(Server::bind("not an address").is_err());
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let addr = addr.parse().map_err(|_| Error::Addr(addr.to_owned()))?;
        Ok(Self {
            addr,
            services: Vec::new(),
        })
    }

    /// Adds a service. Services are tried in the order they were added; the
    /// first whose base path covers the request handles it.
    pub fn service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    /// Accepts connections until a shutdown signal, then drains.
    pub async fn serve(self) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let services: Arc<[Service]> = self.services.into();

        info!(addr = %self.addr, services = services.len(), "arrowroute listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepting at once.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let services = Arc::clone(&services);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let services = Arc::clone(&services);
                            async move { dispatch(&services, req).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("arrowroute stopped");
        Ok(())
    }
}

/// Routes one request through the services and produces one response.
///
/// Every failure is turned into a response here, so hyper never sees an error.
async fn dispatch(
    services: &[Service],
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("failed to read request body: {e}");
            return Ok(Response::new().status(StatusCode::BAD_REQUEST).into_http());
        }
    };

    let request = match Request::from_http(parts, body) {
        Ok(request) => request,
        Err(fault) => {
            debug!(%fault, "rejected request");
            let status = fault.status().unwrap_or(StatusCode::BAD_REQUEST);
            return Ok(Response::new().status(status).into_http());
        }
    };

    // Fires if hyper drops this future, e.g. when the client disconnects.
    let handle = CancelHandle::new();
    let cancel = handle.token();
    let guard = handle.drop_guard();

    let mut disposition = None;
    for service in services {
        if let Some(d) = service.handle(&request, &cancel).await {
            disposition = Some(d);
            break;
        }
    }
    guard.disarm();

    let response = match disposition {
        Some(Disposition::Failed { response, fault }) => {
            error!(
                method = %request.method(),
                path = request.full_path(),
                %fault,
                "unclaimed handler fault"
            );
            response
        }
        Some(disposition) => disposition.into_response(),
        None => Response::new().status(StatusCode::NOT_FOUND),
    };

    Ok(response.into_http())
}

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C).
/// On other platforms only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
