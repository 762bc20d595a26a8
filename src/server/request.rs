use http::Method;
use std::collections::HashMap;
use tracing::debug;

/// An inbound request as seen by the dispatch pipeline.
///
/// Immutable once built: the pipeline only ever reads it, and the same
/// instance is handed to handlers that declare a request parameter.
/// Header names are stored lower-cased so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    path: String,
    query: HashMap<String, String>,
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
    body: Vec<u8>,
}

impl Request {
    /// Start building a request for `method` and `target` (path plus optional `?query`).
    #[must_use]
    pub fn builder(method: Method, target: &str) -> RequestBuilder {
        RequestBuilder::new(method, target)
    }

    /// Assemble a request from transport-level parts.
    ///
    /// The query string is split off `target` and decoded, header names are
    /// lower-cased and cookies are parsed out of the `cookie` header.
    pub fn from_parts<I, K, V>(method: Method, target: &str, headers: I, body: Vec<u8>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut folded: HashMap<String, String> = HashMap::new();
        for (k, v) in headers {
            let name = k.as_ref().to_ascii_lowercase();
            let value = v.into();
            match folded.get_mut(&name) {
                // Repeated lines are folded; cookie pairs use their own separator.
                Some(existing) => {
                    existing.push_str(if name == "cookie" { "; " } else { ", " });
                    existing.push_str(&value);
                }
                None => {
                    folded.insert(name, value);
                }
            }
        }
        let headers = folded;
        let cookies = parse_cookies(&headers);
        let query = parse_query_params(target);
        let path = target.split('?').next().unwrap_or("/").to_string();

        debug!(
            method = %method,
            path = %path,
            header_count = headers.len(),
            cookie_count = cookies.len(),
            query_count = query.len(),
            body_bytes = body.len(),
            "Request assembled"
        );

        Self {
            method,
            path,
            query,
            headers,
            cookies,
            body,
        }
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    #[must_use]
    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    /// Raw body bytes, empty when the request carried none.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[inline]
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[inline]
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

/// Builder for [`Request`], used by transport adapters and tests.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    target: String,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    body: Vec<u8>,
}

impl RequestBuilder {
    fn new(method: Method, target: &str) -> Self {
        Self {
            method,
            target: target.to_string(),
            headers: Vec::new(),
            cookies: Vec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Add a cookie; all cookies are folded into a single `cookie` header on build.
    #[must_use]
    pub fn cookie(mut self, name: &str, value: impl Into<String>) -> Self {
        self.cookies.push((name.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Serialize `value` as the body and set `content-type: application/json`.
    #[must_use]
    pub fn json(self, value: &serde_json::Value) -> Self {
        self.header("content-type", "application/json")
            .body(value.to_string().into_bytes())
    }

    #[must_use]
    pub fn build(mut self) -> Request {
        if !self.cookies.is_empty() {
            let cookie_header = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            self.headers.push(("cookie".to_string(), cookie_header));
        }
        Request::from_parts(self.method, &self.target, self.headers, self.body)
    }
}

/// Parse the `cookie` header (lower-cased key) into name/value pairs.
pub fn parse_cookies(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .get("cookie")
        .map(|c| {
            c.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim();
                    if name.is_empty() {
                        return None;
                    }
                    let value = parts.next().unwrap_or("").trim().to_string();
                    Some((name.to_string(), value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse query string parameters from a request target
///
/// Extracts everything after the `?` character and URL-decodes parameter names and values.
/// Repeated names keep the last value.
///
/// # Arguments
///
/// * `target` - The full request target (e.g., `/users?limit=10&offset=20`)
pub fn parse_query_params(target: &str) -> HashMap<String, String> {
    if let Some(pos) = target.find('?') {
        let query_str = &target[pos + 1..];
        url::form_urlencoded::parse(query_str.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    } else {
        HashMap::new()
    }
}
