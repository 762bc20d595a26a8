// Handler registry: one line per route, in match order.
use crate::handlers::{self, Store};
use brrtdispatch::middleware::{MetricsMiddleware, TracingMiddleware};
use brrtdispatch::prelude::*;
use std::sync::Arc;

pub fn build(config: &ServiceConfig, store: Store) -> anyhow::Result<Dispatcher> {
    let mut dispatcher = Dispatcher::from_config(config);
    dispatcher.add_middleware(Arc::new(TracingMiddleware));
    dispatcher.add_middleware(Arc::new(MetricsMiddleware::new()));

    dispatcher.get("/get/{id}", handlers::greet())?;
    dispatcher.get("/whoami", handlers::whoami())?;
    dispatcher.get("/slow/{ms}", handlers::slow())?;

    dispatcher.get("/items", handlers::items::list(store.clone()))?;
    dispatcher.post("/items", handlers::items::create(store.clone()))?;
    dispatcher.get("/items/{id}", handlers::items::fetch(store.clone()))?;
    dispatcher.delete("/items/{id}", handlers::items::remove(store))?;

    Ok(dispatcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service() -> Dispatcher {
        build(&ServiceConfig::default(), Store::default()).unwrap()
    }

    fn run(d: &Dispatcher, req: Request) -> Response {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(d.dispatch(req))
    }

    #[test]
    fn test_greet_defaults_name() {
        let d = service();
        let res = run(&d, Request::builder(Method::GET, "/get/3").build());
        assert_eq!(res.body_json(), Some(json!({ "name": "guest", "id": 3 })));
    }

    #[test]
    fn test_item_lifecycle() {
        let d = service();
        let create = |key: &str| {
            Request::builder(Method::POST, "/items")
                .header("x-api-key", key)
                .json(&json!({ "name": "bolt", "qty": 3 }))
                .build()
        };

        assert_eq!(run(&d, create("wrong")).status(), 401);

        let res = run(&d, create(handlers::items::API_KEY));
        assert_eq!(res.status(), 201);
        let id = res.body_json().unwrap()["id"].as_u64().unwrap();

        let res = run(&d, Request::builder(Method::GET, &format!("/items/{id}")).build());
        assert_eq!(res.body_json().unwrap()["name"], "bolt");

        let res = run(&d, Request::builder(Method::DELETE, &format!("/items/{id}")).build());
        assert_eq!(res.status(), 204);
        let res = run(&d, Request::builder(Method::GET, &format!("/items/{id}")).build());
        assert_eq!(res.status(), 404);
    }
}
