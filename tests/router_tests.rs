use brrtdispatch::prelude::*;
use serde_json::json;

mod common;
use common::{body_of, dispatch, get};

fn echo_path(name: &'static str) -> Handler {
    Handler::sync(move |_| Ok(json!({ "route": name })))
}

fn service() -> Dispatcher {
    let mut d = Dispatcher::new();
    d.get("/pets", echo_path("list_pets")).unwrap();
    d.get(
        "/pets/{id}",
        echo_path("get_pet").param(Param::new("id", ParamType::Str)),
    )
    .unwrap();
    d.get("/pets/mine", echo_path("never_reached")).unwrap();
    d.post("/pets", echo_path("add_pet")).unwrap();
    d.put(
        "/users/{user_id}/posts/{post_id}",
        echo_path("put_post")
            .param(Param::new("user_id", ParamType::Int))
            .param(Param::new("post_id", ParamType::Str)),
    )
    .unwrap();
    d
}

#[test]
fn test_static_and_parameterized_routes() {
    let d = service();
    assert_eq!(body_of(&get(&d, "/pets"))["route"], "list_pets");
    assert_eq!(body_of(&get(&d, "/pets/12345"))["route"], "get_pet");
    assert_eq!(body_of(&get(&d, "/pets/"))["route"], "list_pets");
}

#[test]
fn test_earlier_pattern_shadows_later_literal() {
    let d = service();
    let res = get(&d, "/pets/mine");
    assert_eq!(res.status(), 200);
    assert_eq!(body_of(&res)["route"], "get_pet");
}

#[test]
fn test_unknown_path_is_404() {
    let d = service();
    let res = get(&d, "/does/not/exist");
    assert_eq!(res.status(), 404);
    assert_eq!(body_of(&res), json!({ "status": 404, "message": "Not Found" }));
}

#[test]
fn test_known_path_wrong_method_is_405_with_allow() {
    let d = service();
    let res = dispatch(&d, Request::builder(Method::DELETE, "/pets").build());
    assert_eq!(res.status(), 405);
    assert_eq!(res.header("allow"), Some("GET, POST"));
    assert_eq!(
        body_of(&res),
        json!({ "status": 405, "message": "Method Not Allowed" })
    );

    let res = dispatch(&d, Request::builder(Method::GET, "/users/1/posts/a").build());
    assert_eq!(res.status(), 405);
    assert_eq!(res.header("allow"), Some("PUT"));
}

#[test]
fn test_segment_count_must_match() {
    let d = service();
    assert_eq!(get(&d, "/pets/1/extra").status(), 404);
    assert_eq!(
        dispatch(&d, Request::builder(Method::PUT, "/users/1/posts").build()).status(),
        404
    );
}

#[test]
fn test_path_text_is_captured_verbatim() {
    let mut d = Dispatcher::new();
    d.get(
        "/files/{name}",
        Handler::sync(|args| Ok(args.str("name")?.to_string()))
            .param(Param::new("name", ParamType::Str)),
    )
    .unwrap();
    let res = get(&d, "/files/report%202024.txt");
    assert_eq!(body_of(&res), json!("report%202024.txt"));
}
