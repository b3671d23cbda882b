use arrowroute::http::HeaderMap;
use arrowroute::http::header::HeaderValue;
use arrowroute::{
    Cancellation, Disposition, Error, Fault, Method, Request, Response, Server, Service,
    StatusCode, health,
};
use bytes::Bytes;

async fn get_widget(req: Request, res: Response) -> Result<Response, Fault> {
    let id = req.param(0).unwrap_or_default();
    Ok(res.json(format!(r#"{{"id":"{id}"}}"#)))
}

async fn create_widget(req: Request, res: Response) -> Result<Response, Fault> {
    let name = req.body_utf8()?;
    Ok(res.status(StatusCode::CREATED).text(format!("created {name}")))
}

async fn search(req: Request, res: Response) -> Result<Response, Fault> {
    let term = req.query("q").unwrap_or("*");
    let caller = req.header("x-caller").unwrap_or("anonymous");
    Ok(res.text(format!("{caller} searched {term} under {}", req.full_path())))
}

fn widgets() -> Service {
    let mut api = Service::builder("/api").unwrap();
    api.get("/widgets/#id", get_widget)
        .post("/widgets", create_widget)
        .get("/search", search);
    api.build()
}

async fn handle(service: &Service, request: Request) -> Option<Disposition> {
    service.handle(&request, &Cancellation::never()).await
}

fn body(res: &Response) -> &[u8] {
    res.body_bytes().map_or(&[][..], |b| &b[..])
}

#[tokio::test]
async fn routes_below_base_path() {
    let api = widgets();

    let request = Request::new(Method::GET, "/api/widgets/7");
    let Some(Disposition::Handled(res)) = handle(&api, request).await else {
        panic!("expected handled");
    };
    assert_eq!(body(&res), br#"{"id":"7"}"#);
    assert_eq!(res.headers()["content-type"], "application/json");
}

#[tokio::test]
async fn unknown_path_below_base_is_not_found() {
    let api = widgets();
    match handle(&api, Request::new(Method::GET, "/api/unknown")).await {
        Some(Disposition::NotFound(res)) => {
            assert_eq!(res.status_code(), Some(StatusCode::NOT_FOUND));
        }
        other => panic!("expected not found, got {other:?}"),
    }
}

#[tokio::test]
async fn paths_outside_base_are_declined() {
    let api = widgets();
    for path in ["/widgets/7", "/apix/widgets/7", "/"] {
        assert!(
            handle(&api, Request::new(Method::GET, path)).await.is_none(),
            "{path} should belong to another service"
        );
    }
}

#[tokio::test]
async fn request_parts_reach_the_handler() {
    let api = widgets();

    let mut headers = HeaderMap::new();
    headers.insert("x-caller", HeaderValue::from_static("gatekeeper"));
    let query = vec![("q".to_owned(), "bolts".to_owned())];
    let request = Request::from_parts(Method::GET, "/api/search", headers, query, Bytes::new());

    let Some(Disposition::Handled(res)) = handle(&api, request).await else {
        panic!("expected handled");
    };
    assert_eq!(body(&res), b"gatekeeper searched bolts under /api/search");
}

#[tokio::test]
async fn undecodable_body_fails_without_catcher() {
    let api = widgets();
    let request = Request::from_parts(
        Method::POST,
        "/api/widgets",
        HeaderMap::new(),
        Vec::new(),
        Bytes::from_static(&[0xff, 0xfe]),
    );

    match handle(&api, request).await {
        Some(Disposition::Failed { response, fault }) => {
            assert_eq!(response.status_code(), Some(StatusCode::INTERNAL_SERVER_ERROR));
            assert_eq!(fault.class(), &arrowroute::fault::CODEC);
        }
        other => panic!("expected failure, got {other:?}"),
    }

    let created = Request::from_parts(
        Method::POST,
        "/api/widgets",
        HeaderMap::new(),
        Vec::new(),
        Bytes::from_static(b"sprocket"),
    );
    let Some(Disposition::Handled(res)) = handle(&api, created).await else {
        panic!("expected handled");
    };
    assert_eq!(res.status_code(), Some(StatusCode::CREATED));
    assert_eq!(body(&res), b"created sprocket");
}

#[tokio::test]
async fn health_probes() {
    let mut probes = Service::builder("/").unwrap();
    probes
        .get("/healthz", health::liveness)
        .get("/readyz", health::readiness);
    let probes = probes.build();

    for (path, expected) in [("/healthz", &b"ok"[..]), ("/readyz", &b"ready"[..])] {
        let request = Request::new(Method::GET, path);
        let Some(Disposition::Handled(res)) = handle(&probes, request).await else {
            panic!("{path}: expected handled");
        };
        assert_eq!(body(&res), expected);
    }
}

#[test]
fn cancelled_disposition_maps_to_unavailable() {
    let res = Disposition::Cancelled.into_response();
    assert_eq!(res.status_code(), Some(StatusCode::SERVICE_UNAVAILABLE));
}

#[test]
fn invalid_configuration_is_rejected() {
    assert!(matches!(Server::bind("localhost"), Err(Error::Addr(_))));
    assert!(matches!(Service::builder("/v/#n"), Err(Error::BasePath(_))));

    let mut builder = Service::builder("/").unwrap();
    let err = builder
        .route(Some(Method::GET), Some("/a//b"), health::liveness)
        .err()
        .expect("empty segment");
    assert!(matches!(err, Error::Pattern(ref e) if e.template() == "/a//b"));
}
