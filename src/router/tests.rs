use super::{RouteLookup, Router};
use crate::dispatcher::Dispatcher;
use crate::handler::Handler;
use crate::params::{Param, ParamType};
use http::Method;

fn table(routes: &[(Method, &str, &str)]) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    for (method, pattern, name) in routes {
        let placeholders: Vec<Param> = pattern
            .split('/')
            .filter_map(|s| s.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
            .map(|p| Param::new(p, ParamType::Str))
            .collect();
        dispatcher
            .register(
                method.clone(),
                pattern,
                Handler::sync(|_| Ok(())).params(placeholders).named(name),
            )
            .unwrap();
    }
    dispatcher
}

fn matched_name(router: &Router, method: Method, path: &str) -> Option<String> {
    match router.route(&method, path) {
        RouteLookup::Matched(m) => Some(m.route.name.to_string()),
        _ => None,
    }
}

#[test]
fn test_root_path() {
    let d = table(&[(Method::GET, "/", "root")]);
    assert_eq!(matched_name(d.router(), Method::GET, "/").as_deref(), Some("root"));
    assert!(matches!(
        d.router().route(&Method::GET, "/x"),
        RouteLookup::NotFound
    ));
}

#[test]
fn test_parameterized_path() {
    let d = table(&[(Method::GET, "/items/{id}", "get_item")]);
    match d.router().route(&Method::GET, "/items/123") {
        RouteLookup::Matched(m) => {
            assert_eq!(m.get_path_param("id"), Some("123"));
            assert_eq!(m.path_params_map().len(), 1);
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn test_nested_path() {
    let d = table(&[(Method::GET, "/a/{b}/c/{d}", "nested")]);
    match d.router().route(&Method::GET, "/a/1/c/two") {
        RouteLookup::Matched(m) => {
            assert_eq!(m.get_path_param("b"), Some("1"));
            assert_eq!(m.get_path_param("d"), Some("two"));
        }
        other => panic!("expected match, got {other:?}"),
    }
    assert!(matches!(
        d.router().route(&Method::GET, "/a/1/c"),
        RouteLookup::NotFound
    ));
}

#[test]
fn test_first_registered_wins() {
    let d = table(&[
        (Method::GET, "/users/{id}", "by_id"),
        (Method::GET, "/users/me", "me"),
    ]);
    assert_eq!(
        matched_name(d.router(), Method::GET, "/users/me").as_deref(),
        Some("by_id")
    );

    let d = table(&[
        (Method::GET, "/users/me", "me"),
        (Method::GET, "/users/{id}", "by_id"),
    ]);
    assert_eq!(
        matched_name(d.router(), Method::GET, "/users/me").as_deref(),
        Some("me")
    );
    assert_eq!(
        matched_name(d.router(), Method::GET, "/users/7").as_deref(),
        Some("by_id")
    );
}

#[test]
fn test_method_not_allowed_lists_methods_in_registration_order() {
    let d = table(&[
        (Method::PUT, "/items/{id}", "put"),
        (Method::GET, "/items/{id}", "get"),
        (Method::GET, "/other", "other"),
    ]);
    match d.router().route(&Method::DELETE, "/items/5") {
        RouteLookup::MethodNotAllowed(allowed) => {
            assert_eq!(allowed, vec![Method::PUT, Method::GET]);
        }
        other => panic!("expected 405 lookup, got {other:?}"),
    }
    assert!(matches!(
        d.router().route(&Method::DELETE, "/nothing"),
        RouteLookup::NotFound
    ));
}

#[test]
fn test_query_suffix_and_trailing_slash_are_ignored() {
    let d = table(&[(Method::GET, "/items/{id}", "get_item")]);
    match d.router().route(&Method::GET, "/items/9/?verbose=1") {
        RouteLookup::Matched(m) => assert_eq!(m.get_path_param("id"), Some("9")),
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn test_routes_and_summaries() {
    let d = table(&[
        (Method::GET, "/a", "a"),
        (Method::POST, "/a", "create_a"),
        (Method::GET, "/b/{x}", "b"),
    ]);
    let router = d.router();
    assert_eq!(router.len(), 3);
    assert!(!router.is_empty());
    assert_eq!(
        router.route_summaries(),
        vec!["GET /a -> a", "GET /b/{x} -> b", "POST /a -> create_a"]
    );
    assert!(Router::new().is_empty());
}
