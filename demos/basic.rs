//! Minimal arrowroute example: a widget API with a validator, catchers and
//! health probes.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/api/widgets/42
//!   curl http://localhost:3000/api/widgets/abc          # 400 from the validator
//!   curl -X POST http://localhost:3000/api/widgets -d 'sprocket'
//!   curl -X POST http://localhost:3000/api/widgets --data-binary $'\xff'   # 400 from the codec catcher
//!   curl http://localhost:3000/api/widgets/13           # 503 from the io catcher
//!   curl http://localhost:3000/healthz

use arrowroute::{Fault, Request, Response, Server, Service, StatusCode, fault, health};

#[tokio::main]
async fn main() -> Result<(), arrowroute::Error> {
    tracing_subscriber::fmt::init();

    let mut api = Service::builder("/api")?;
    api.validator(None, Some("/widgets/#id"), numeric_id)?
        .catcher(None, None, Some(&fault::CODEC), bad_body)?
        .catcher(None, None, Some(&fault::IO), unavailable)?
        .catcher(None, None, None, internal)?
        .get("/widgets/#id", get_widget)
        .post("/widgets", create_widget);

    let mut probes = Service::builder("/")?;
    probes
        .get("/healthz", health::liveness)
        .get("/readyz", health::readiness);

    Server::bind("0.0.0.0:3000")?
        .service(api.build())
        .service(probes.build())
        .serve()
        .await
}

// Runs before GET /api/widgets/#id. Answering with a status ends the chain.
async fn numeric_id(req: Request, res: Response) -> Result<Response, Fault> {
    match req.param(0).map(str::parse::<u64>) {
        Some(Ok(_)) => Ok(res),
        _ => Ok(res.status(StatusCode::BAD_REQUEST).text("widget id must be numeric")),
    }
}

// GET /api/widgets/#id
//
// Response::json takes anything convertible to Bytes; pass the output of
// your serialiser.
async fn get_widget(req: Request, res: Response) -> Result<Response, Fault> {
    let id = req.param(0).unwrap_or_default();
    if id == "13" {
        return Err(Fault::io(std::io::Error::other("widget store unavailable")));
    }
    Ok(res.json(format!(r#"{{"id":{id},"name":"sprocket"}}"#)))
}

// POST /api/widgets
//
// A body that is not UTF-8 raises a codec fault, claimed by `bad_body`.
async fn create_widget(req: Request, res: Response) -> Result<Response, Fault> {
    let name = req.body_utf8()?;
    Ok(res
        .status(StatusCode::CREATED)
        .json(format!(r#"{{"id":1,"name":"{name}"}}"#)))
}

async fn bad_body(fault: Fault, _req: Request, res: Response) -> Result<Response, Fault> {
    Ok(res.status(StatusCode::BAD_REQUEST).text(fault.to_string()))
}

async fn unavailable(fault: Fault, _req: Request, res: Response) -> Result<Response, Fault> {
    tracing::warn!(%fault, "widget store unavailable");
    Ok(res.status(StatusCode::SERVICE_UNAVAILABLE))
}

async fn internal(fault: Fault, req: Request, res: Response) -> Result<Response, Fault> {
    tracing::warn!(path = req.full_path(), %fault, "unhandled widget fault");
    Ok(res.status(StatusCode::INTERNAL_SERVER_ERROR))
}
