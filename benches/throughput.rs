use brrtdispatch::prelude::*;
use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::hint::black_box;

fn noop() -> Handler {
    Handler::sync(|_| Ok(()))
}

fn with_path_params(pattern: &str) -> Handler {
    pattern
        .split('/')
        .filter_map(|s| s.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
        .fold(noop(), |h, name| h.param(Param::new(name, ParamType::Str)))
}

fn zoo() -> Dispatcher {
    let mut d = Dispatcher::new();
    let routes: &[(Method, &str)] = &[
        (Method::GET, "/"),
        (Method::GET, "/zoo/animals"),
        (Method::POST, "/zoo/animals"),
        (Method::GET, "/zoo/animals/{id}"),
        (Method::PUT, "/zoo/animals/{id}"),
        (Method::PATCH, "/zoo/animals/{id}"),
        (Method::DELETE, "/zoo/animals/{id}"),
        (Method::GET, "/zoo/animals/{id}/toys/{toy_id}"),
        (
            Method::GET,
            "/zoo/{category}/animals/{id}/habitats/{habitat_id}/sections/{section_id}",
        ),
        (
            Method::POST,
            "/inventory/{warehouse_id}/feeds/{feed_id}/items/{item_id}/batches/{batch_id}",
        ),
        (Method::GET, "/complex/{a}/{b}/{c}/{d}/{e}/{f}/{g}/{h}/{i}"),
    ];
    for (method, pattern) in routes {
        d.register(method.clone(), pattern, with_path_params(pattern))
            .unwrap();
    }
    d.get(
        "/get/{id}",
        Handler::sync(|args| Ok(json!({ "id": args.int("id")?, "name": args.str("name")? })))
            .param(Param::new("id", ParamType::Int))
            .param(Param::new("name", ParamType::Str).with_default("guest")),
    )
    .unwrap();
    d
}

fn bench_route_match(c: &mut Criterion) {
    let d = zoo();
    let router = d.router();
    c.bench_function("route_match", |b| {
        let test_paths = [
            (Method::GET, "/zoo/animals/123"),
            (Method::GET, "/zoo/animals/123/toys/456"),
            (Method::GET, "/zoo/cats/animals/123/habitats/88/sections/5"),
            (Method::POST, "/inventory/1/feeds/2/items/3/batches/4"),
            (Method::GET, "/complex/1/2/3/4/5/6/7/8/9"),
        ];
        b.iter(|| {
            for (method, path) in &test_paths {
                black_box(router.route(method, path));
            }
        });
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let d = zoo();
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    c.bench_function("dispatch_bind_invoke", |b| {
        b.iter(|| {
            let req = Request::builder(Method::GET, "/get/42?name=bench").build();
            black_box(rt.block_on(d.dispatch(req)));
        });
    });
}

criterion_group!(benches, bench_route_match, bench_dispatch);
criterion_main!(benches);
