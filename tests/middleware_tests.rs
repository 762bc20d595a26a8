use brrtdispatch::error::DispatchError;
use brrtdispatch::middleware::{Middleware, MetricsMiddleware, TracingMiddleware};
use brrtdispatch::prelude::*;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

mod common;
use common::{body_of, dispatch, get, LogCapture};

fn service() -> Dispatcher {
    let mut d = Dispatcher::new();
    d.get(
        "/pets/{id}",
        Handler::sync(|args| Ok(json!({ "id": args.int("id")? })))
            .param(Param::new("id", ParamType::Int)),
    )
    .unwrap();
    d.get(
        "/fail",
        Handler::sync(|_| -> Result<(), HandlerError> { Err(anyhow::anyhow!("nope").into()) }),
    )
    .unwrap();
    d
}

#[test]
fn test_metrics_middleware_counts() {
    let mut d = service();
    let metrics = Arc::new(MetricsMiddleware::new());
    d.add_middleware(Arc::clone(&metrics) as Arc<dyn Middleware>);

    assert_eq!(get(&d, "/pets/1").status(), 200);
    assert_eq!(get(&d, "/pets/abc").status(), 422);
    assert_eq!(get(&d, "/nowhere").status(), 404);
    assert_eq!(
        dispatch(&d, Request::builder(Method::POST, "/pets/1").build()).status(),
        405
    );
    assert_eq!(get(&d, "/fail").status(), 500);

    assert_eq!(metrics.request_count(), 5);
    assert_eq!(metrics.client_errors(), 3);
    assert_eq!(metrics.server_errors(), 1);
    assert_eq!(metrics.binding_failures(), 1);
    assert_eq!(metrics.unmatched(), 2);
    assert!(metrics.average_latency() > Duration::ZERO);
}

/// Rejects requests without an `x-api-key` header.
struct ApiKeyGate;

impl Middleware for ApiKeyGate {
    fn before(&self, req: &Request) -> Option<Response> {
        match req.header("x-api-key") {
            Some("test123") => None,
            _ => Some(Response::json(
                401,
                &json!({ "status": 401, "message": "missing api key" }),
            )),
        }
    }
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Middleware for Recorder {
    fn before(&self, req: &Request) -> Option<Response> {
        self.events.lock().unwrap().push(format!("before {}", req.path()));
        None
    }

    fn after(&self, _req: &Request, res: &mut Response, _latency: Duration) {
        res.set_header("x-recorded", "yes".to_string());
        self.events.lock().unwrap().push(format!("after {}", res.status()));
    }

    fn on_error(&self, _req: &Request, err: &DispatchError) {
        self.events.lock().unwrap().push(format!("error {}", err.status()));
    }
}

#[test]
fn test_early_response_skips_routing_but_runs_after_hooks() {
    let mut d = service();
    let recorder = Arc::new(Recorder::default());
    d.add_middleware(Arc::new(ApiKeyGate));
    d.add_middleware(Arc::clone(&recorder) as Arc<dyn Middleware>);

    let res = get(&d, "/pets/1");
    assert_eq!(res.status(), 401);
    assert_eq!(body_of(&res)["message"], "missing api key");
    assert_eq!(res.header("x-recorded"), Some("yes"));
    assert!(res.header("x-request-id").is_some());

    let req = Request::builder(Method::GET, "/pets/1")
        .header("X-Api-Key", "test123")
        .build();
    assert_eq!(dispatch(&d, req).status(), 200);

    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec!["before /pets/1", "after 401", "before /pets/1", "after 200"]
    );
}

#[test]
fn test_errors_are_reported_to_middleware() {
    let mut d = service();
    let recorder = Arc::new(Recorder::default());
    d.add_middleware(Arc::clone(&recorder) as Arc<dyn Middleware>);

    get(&d, "/pets/abc");
    get(&d, "/fail");

    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec![
            "before /pets/abc",
            "error 422",
            "after 422",
            "before /fail",
            "error 500",
            "after 500"
        ]
    );
}

#[test]
fn test_tracing_middleware_logs_request_lifecycle() {
    let (logs, _guard) = LogCapture::install();
    let mut d = service();
    d.add_middleware(Arc::new(TracingMiddleware));

    get(&d, "/pets/7");
    get(&d, "/pets/oops");

    let text = logs.contents();
    assert!(text.contains("Request started"), "{text}");
    assert!(text.contains("Request completed"), "{text}");
    assert!(text.contains("Request rejected"), "{text}");
}
