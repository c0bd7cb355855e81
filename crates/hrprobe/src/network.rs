//! Network interception model.
//!
//! An [`Intercept`] pairs a method and URL pattern with an alias and a
//! [`RouteAction`]. Drivers consult an [`InterceptTable`] for every request
//! and record the resulting [`Exchange`] under each matching alias in an
//! [`ExchangeLog`].
//!
//! Routes registered later take precedence: the newest matching route with a
//! stubbing action decides the outcome, while every matching route (stubbing
//! or observe-only) sees the exchange.

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Message surfaced to the page for a forced transport failure
pub const NETWORK_ERROR_MESSAGE: &str = "Network Error";

/// HTTP methods for request matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// GET request
    Get,
    /// POST request
    Post,
    /// PUT request
    Put,
    /// DELETE request
    Delete,
    /// PATCH request
    Patch,
    /// Any method
    Any,
}

impl HttpMethod {
    /// Parse from string (unknown methods match any)
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "PATCH" => Self::Patch,
            _ => Self::Any,
        }
    }

    /// Convert to string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Any => "*",
        }
    }

    /// Check if this method matches another
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        *self == Self::Any || *other == Self::Any || *self == *other
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pattern for matching request URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// Prefix match
    Prefix(String),
    /// Contains substring
    Contains(String),
    /// Regex match
    Regex(String),
    /// Glob pattern (e.g., "**/api/v2/buzz/*")
    Glob(String),
    /// Match any URL
    Any,
}

impl UrlPattern {
    /// Check if a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(pattern) => url == pattern,
            Self::Prefix(pattern) => url.starts_with(pattern.as_str()),
            Self::Contains(pattern) => url.contains(pattern.as_str()),
            Self::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(url))
                .unwrap_or(false),
            Self::Glob(pattern) => Self::glob_matches(pattern, url),
            Self::Any => true,
        }
    }

    /// Glob matching for URLs; `*` spans any run of characters.
    ///
    /// The first and last literal segments are anchored to the ends of the
    /// URL, the ones between match leftmost in order.
    fn glob_matches(pattern: &str, url: &str) -> bool {
        let parts: Vec<&str> = pattern.split('*').collect();
        let [first, middle @ .., last] = parts.as_slice() else {
            return url == pattern;
        };
        let Some(mut rest) = url
            .strip_prefix(*first)
            .and_then(|r| r.strip_suffix(*last))
        else {
            return false;
        };
        for &part in middle.iter().filter(|p| !p.is_empty()) {
            match rest.find(part) {
                Some(found) => rest = &rest[found + part.len()..],
                None => return false,
            }
        }
        true
    }
}

impl std::fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(s) | Self::Prefix(s) | Self::Contains(s) | Self::Regex(s) | Self::Glob(s) => {
                write!(f, "{s}")
            }
            Self::Any => write!(f, "*"),
        }
    }
}

/// A stubbed HTTP response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers (lowercase names)
    pub headers: HashMap<String, String>,
    /// Response body
    pub body: Vec<u8>,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }
}

impl MockResponse {
    /// Create an empty 200 response
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a JSON response
    pub fn json<T: Serialize>(data: &T) -> ProbeResult<Self> {
        Ok(Self::new()
            .with_header("content-type", "application/json")
            .with_body(serde_json::to_vec(data)?))
    }

    /// Create an HTML response
    #[must_use]
    pub fn html(content: &str) -> Self {
        Self::new()
            .with_header("content-type", "text/html; charset=UTF-8")
            .with_body(content.as_bytes().to_vec())
    }

    /// Create a redirect response
    #[must_use]
    pub fn redirect(location: &str) -> Self {
        Self::new().with_status(302).with_header("location", location)
    }

    /// Set status code
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Set body
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        let _ = self.headers.insert(key.to_lowercase(), value.to_string());
        self
    }

    /// Convert into the captured form seen by an exchange
    #[must_use]
    pub fn into_captured(self) -> CapturedResponse {
        CapturedResponse {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

/// Action to take when a route matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteAction {
    /// Let the request through and record it
    Observe,
    /// Respond with a stubbed response
    Respond(MockResponse),
    /// Fail the request at the transport level; no response arrives
    ForceNetworkError,
}

/// A registered interception rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intercept {
    /// HTTP method to match
    pub method: HttpMethod,
    /// URL pattern to match
    pub pattern: UrlPattern,
    /// Action applied to matching requests
    pub action: RouteAction,
    /// Alias used to wait on and inspect matching exchanges
    pub alias: String,
}

impl Intercept {
    /// Observe requests whose URL contains `url`
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            method,
            alias: url.clone(),
            pattern: UrlPattern::Contains(url),
            action: RouteAction::Observe,
        }
    }

    /// Observe GET requests
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Observe POST requests
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    /// Observe PUT requests
    #[must_use]
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    /// Observe DELETE requests
    #[must_use]
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    /// Name this intercept
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Replace the URL pattern
    #[must_use]
    pub fn with_pattern(mut self, pattern: UrlPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Stub matching requests with `response`
    #[must_use]
    pub fn respond(mut self, response: MockResponse) -> Self {
        self.action = RouteAction::Respond(response);
        self
    }

    /// Fail matching requests with a transport error
    #[must_use]
    pub fn force_network_error(mut self) -> Self {
        self.action = RouteAction::ForceNetworkError;
        self
    }

    /// Check whether a request matches this rule
    #[must_use]
    pub fn matches(&self, method: HttpMethod, url: &str) -> bool {
        self.method.matches(&method) && self.pattern.matches(url)
    }
}

/// A captured network request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedRequest {
    /// Request URL
    pub url: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Request headers (lowercase names)
    pub headers: HashMap<String, String>,
    /// Request body
    pub body: Option<Vec<u8>>,
}

impl CapturedRequest {
    /// Create a new captured request
    #[must_use]
    pub fn new(method: HttpMethod, url: &str) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Attach a body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Get body as string
    #[must_use]
    pub fn body_string(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).to_string())
    }

    /// Parse body as JSON
    pub fn body_json<T: for<'de> Deserialize<'de>>(&self) -> ProbeResult<T> {
        let body = self
            .body
            .as_ref()
            .ok_or_else(|| ProbeError::not_found(format!("request body of {}", self.url)))?;
        Ok(serde_json::from_slice(body)?)
    }
}

/// A captured network response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers (lowercase names)
    pub headers: HashMap<String, String>,
    /// Response body
    pub body: Vec<u8>,
}

impl CapturedResponse {
    /// Look up a header case-insensitively
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| k.to_lowercase() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get body as string
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse body as JSON
    pub fn body_json<T: for<'de> Deserialize<'de>>(&self) -> ProbeResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// A request paired with its outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    /// The request as sent by the page
    pub request: CapturedRequest,
    /// The response, once it arrived
    pub response: Option<CapturedResponse>,
    /// Whether the request failed at the transport level
    pub network_error: bool,
}

impl Exchange {
    /// An exchange still awaiting its response
    #[must_use]
    pub const fn pending(request: CapturedRequest) -> Self {
        Self {
            request,
            response: None,
            network_error: false,
        }
    }

    /// A completed exchange
    #[must_use]
    pub const fn completed(request: CapturedRequest, response: CapturedResponse) -> Self {
        Self {
            request,
            response: Some(response),
            network_error: false,
        }
    }

    /// An exchange that failed at the transport level
    #[must_use]
    pub const fn failed(request: CapturedRequest) -> Self {
        Self {
            request,
            response: None,
            network_error: true,
        }
    }

    /// Whether the exchange has reached a final state
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.response.is_some() || self.network_error
    }

    /// The response, or a network error if none arrived
    pub fn response(&self) -> ProbeResult<&CapturedResponse> {
        self.response.as_ref().ok_or_else(|| ProbeError::NetworkError {
            url: self.request.url.clone(),
            message: if self.network_error {
                NETWORK_ERROR_MESSAGE.to_string()
            } else {
                "response not received".to_string()
            },
        })
    }

    /// Response status code
    pub fn status(&self) -> ProbeResult<u16> {
        Ok(self.response()?.status)
    }

    /// Response header, case-insensitive
    pub fn header(&self, name: &str) -> ProbeResult<Option<&str>> {
        Ok(self.response()?.header(name))
    }

    /// Parse the response body as JSON
    pub fn body_json<T: for<'de> Deserialize<'de>>(&self) -> ProbeResult<T> {
        self.response()?.body_json()
    }
}

/// Outcome of consulting the intercept table for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Aliases of every matching route, oldest first
    pub aliases: Vec<String>,
    /// Action of the newest stubbing route, or `Observe`
    pub action: RouteAction,
}

impl Resolution {
    /// Whether any route matched
    #[must_use]
    pub fn is_intercepted(&self) -> bool {
        !self.aliases.is_empty()
    }
}

/// Registered intercepts for one test case
#[derive(Debug, Clone, Default)]
pub struct InterceptTable {
    routes: Vec<Intercept>,
}

impl InterceptTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule
    pub fn register(&mut self, intercept: Intercept) {
        tracing::debug!(
            alias = %intercept.alias,
            method = %intercept.method,
            pattern = %intercept.pattern,
            "intercept registered"
        );
        self.routes.push(intercept);
    }

    /// Drop all rules
    pub fn clear(&mut self) {
        self.routes.clear();
    }

    /// Number of registered rules
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no rules are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered rules, oldest first
    #[must_use]
    pub fn routes(&self) -> &[Intercept] {
        &self.routes
    }

    /// Decide what happens to a request
    #[must_use]
    pub fn resolve(&self, method: HttpMethod, url: &str) -> Resolution {
        let matching: Vec<&Intercept> = self
            .routes
            .iter()
            .filter(|r| r.matches(method, url))
            .collect();
        let action = matching
            .iter()
            .rev()
            .find(|r| r.action != RouteAction::Observe)
            .map_or(RouteAction::Observe, |r| r.action.clone());
        Resolution {
            aliases: matching.iter().map(|r| r.alias.clone()).collect(),
            action,
        }
    }
}

/// Exchanges recorded per alias
#[derive(Debug, Clone, Default)]
pub struct ExchangeLog {
    exchanges: Vec<Exchange>,
    by_alias: HashMap<String, Vec<usize>>,
}

impl ExchangeLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an exchange under the given aliases; returns its index
    pub fn record(&mut self, aliases: &[String], exchange: Exchange) -> usize {
        let index = self.exchanges.len();
        self.exchanges.push(exchange);
        for alias in aliases {
            let ids = self.by_alias.entry(alias.clone()).or_default();
            if ids.last() != Some(&index) {
                ids.push(index);
            }
        }
        index
    }

    /// Replace an exchange in place (e.g. when its response arrives)
    pub fn update(&mut self, index: usize, exchange: Exchange) {
        if let Some(slot) = self.exchanges.get_mut(index) {
            *slot = exchange;
        }
    }

    /// Exchange by index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Exchange> {
        self.exchanges.get(index)
    }

    /// Exchanges recorded under an alias, in request order
    #[must_use]
    pub fn for_alias(&self, alias: &str) -> Vec<Exchange> {
        self.by_alias
            .get(alias)
            .map(|ids| ids.iter().filter_map(|&i| self.exchanges.get(i).cloned()).collect())
            .unwrap_or_default()
    }

    /// All recorded exchanges
    #[must_use]
    pub fn all(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.exchanges.clear();
        self.by_alias.clear();
    }
}
