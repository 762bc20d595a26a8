pub mod items;

pub use items::Store;

use brrtdispatch::prelude::*;
use serde_json::json;
use std::time::Duration;

/// `GET /get/{id}?name=`
pub fn greet() -> Handler {
    Handler::sync(|args| Ok(json!({ "name": args.str("name")?, "id": args.int("id")? })))
        .param(Param::new("id", ParamType::Int))
        .param(Param::new("name", ParamType::Str).with_default("guest"))
        .named("greet")
}

/// Echo the caller's session cookie and user agent.
pub fn whoami() -> Handler {
    Handler::sync(|args| {
        let req = args.request("req")?;
        Ok(json!({
            "session": args.opt_str("session")?,
            "agent": req.header("user-agent"),
        }))
    })
    .param(Param::request("req"))
    .param(Param::cookie("session", ParamType::Str).optional())
    .named("whoami")
}

/// Sleeps without blocking the worker.
pub fn slow() -> Handler {
    Handler::asynchronous(|args: Args| async move {
        let ms = args.int("ms")?;
        if !(0..=5_000).contains(&ms) {
            return Err(HandlerError::from(HttpError::bad_request(
                "ms must be between 0 and 5000",
            )));
        }
        tokio::time::sleep(Duration::from_millis(ms.unsigned_abs())).await;
        Ok::<_, HandlerError>(json!({ "slept_ms": ms }))
    })
    .param(Param::new("ms", ParamType::Int))
    .named("slow")
}
