//! Built-in health-check route handlers.
//!
//! | Probe | Question |
//! |---|---|
//! | **Liveness** | Is the process alive? Failure → restart. |
//! | **Readiness** | Can the system serve traffic? Failure → pulled from rotation. |
//!
//! Register them like any other route:
//!
//! ```rust,no_run
//! use arrowroute::{Service, health};
//!
//! let mut probes = Service::builder("/").unwrap();
//! probes.get("/healthz", health::liveness).get("/readyz", health::readiness);
//! let probes = probes.build();
//! ```
//!
//! Replace `readiness` with your own handler when the system must first
//! reach its service registry or other dependencies.

use crate::{Fault, Request, Response};

/// Always `200 OK` with body `"ok"`.
pub async fn liveness(_req: Request, res: Response) -> Result<Response, Fault> {
    Ok(res.text("ok"))
}

/// `200 OK` with body `"ready"`.
pub async fn readiness(_req: Request, res: Response) -> Result<Response, Fault> {
    Ok(res.text("ready"))
}
