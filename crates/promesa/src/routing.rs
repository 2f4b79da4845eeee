//! Deterministic request interception for the application under test.
//!
//! A [`MockRouter`] holds an ordered list of URL rules. Armed on a page,
//! it classifies every paused request top-down and either fulfills it with
//! a canned JSON response or explicitly continues it to the real network.
//! Rule order is a correctness invariant: specific sales-order-detail
//! paths must be listed before the generic list path that would otherwise
//! shadow them.
//!
//! The router's contract is that every intercepted request receives a
//! fulfillment or a pass-through, never neither. A request left in the
//! paused state hangs the navigation that issued it, which is the worst
//! failure mode this layer can produce, so a failed fulfillment falls back
//! to a pass-through.

use crate::result::{PromesaError, PromesaResult};
use base64::Engine as _;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams as FetchEnableParams, EventRequestPaused,
    FulfillRequestParams, HeaderEntry, RequestId,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Pattern for matching request URLs. Substring-class matching only: the
/// rule set is small and fixed, so this stays far short of a full router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// Prefix match
    Prefix(String),
    /// Contains substring
    Contains(String),
}

impl UrlPattern {
    /// Check if a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(pattern) => url == pattern,
            Self::Prefix(pattern) => url.starts_with(pattern.as_str()),
            Self::Contains(pattern) => url.contains(pattern.as_str()),
        }
    }
}

impl std::fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(s) | Self::Prefix(s) | Self::Contains(s) => write!(f, "{s}"),
        }
    }
}

/// A canned HTTP response: status, JSON content type, permissive CORS
/// headers, fixed body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CannedResponse {
    /// HTTP status code
    pub status: u16,
    /// Content type header value
    pub content_type: String,
    /// Additional response headers
    pub headers: Vec<(String, String)>,
    /// Response body bytes
    pub body: Vec<u8>,
}

impl CannedResponse {
    /// Build a 200 `application/json` response with permissive CORS
    /// headers from a JSON value.
    #[must_use]
    pub fn json(value: &serde_json::Value) -> Self {
        Self {
            status: 200,
            content_type: "application/json".to_string(),
            headers: permissive_cors(),
            body: value.to_string().into_bytes(),
        }
    }

    /// Set the status code
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Add a response header
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Body as a UTF-8 string
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

/// Permissive CORS headers attached to every canned response, so the
/// application's cross-origin fetches succeed against the mock.
fn permissive_cors() -> Vec<(String, String)> {
    vec![
        (
            "access-control-allow-origin".to_string(),
            "*".to_string(),
        ),
        (
            "access-control-allow-methods".to_string(),
            "GET,POST,OPTIONS".to_string(),
        ),
        (
            "access-control-allow-headers".to_string(),
            "*".to_string(),
        ),
    ]
}

/// One routing rule: a URL pattern paired with its canned response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockRule {
    /// Rule name, used in logs and the request journal
    pub name: String,
    /// URL pattern to match
    pub pattern: UrlPattern,
    /// Response served on match
    pub response: CannedResponse,
}

impl MockRule {
    /// Create a new rule
    #[must_use]
    pub fn new(name: &str, pattern: UrlPattern, response: CannedResponse) -> Self {
        Self {
            name: name.to_string(),
            pattern,
            response,
        }
    }

    /// Check if this rule matches a URL
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        self.pattern.matches(url)
    }
}

/// One observed request: method, URL, and the rule that served it (if any).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// HTTP method
    pub method: String,
    /// Request URL
    pub url: String,
    /// Name of the matching rule, `None` for pass-through
    pub matched: Option<String>,
}

/// Ordered request mock router.
///
/// Rules are evaluated top-down; the first match wins. A router built
/// with [`MockRouter::passthrough`] installs nothing at all, so every
/// request reaches the real network (the live-backend escape hatch).
#[derive(Debug, Clone)]
pub struct MockRouter {
    rules: Arc<Vec<MockRule>>,
    journal: Arc<Mutex<Vec<RequestRecord>>>,
    enabled: bool,
}

impl MockRouter {
    /// Create a router over an ordered rule list
    #[must_use]
    pub fn new(rules: Vec<MockRule>) -> Self {
        Self {
            rules: Arc::new(rules),
            journal: Arc::new(Mutex::new(Vec::new())),
            enabled: true,
        }
    }

    /// Create a disabled router: no interception is installed and every
    /// request reaches the real network unmodified.
    #[must_use]
    pub fn passthrough() -> Self {
        Self {
            rules: Arc::new(Vec::new()),
            journal: Arc::new(Mutex::new(Vec::new())),
            enabled: false,
        }
    }

    /// Whether this router installs interception at all
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of configured rules
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Classify a URL against the ordered rule list. Pure first-match
    /// walk; `None` means pass-through.
    #[must_use]
    pub fn resolve(&self, url: &str) -> Option<&MockRule> {
        self.rules.iter().find(|rule| rule.matches(url))
    }

    /// Classify one request and record it in the journal. Used by the
    /// interception task; exposed so the decision path is testable
    /// without a browser.
    #[must_use]
    pub fn observe(&self, method: &str, url: &str) -> Option<MockRule> {
        let matched = self.resolve(url).cloned();
        if let Ok(mut journal) = self.journal.lock() {
            journal.push(RequestRecord {
                method: method.to_string(),
                url: url.to_string(),
                matched: matched.as_ref().map(|rule| rule.name.clone()),
            });
        }
        matched
    }

    /// Snapshot of every observed request, in arrival order
    #[must_use]
    pub fn journal(&self) -> Vec<RequestRecord> {
        self.journal.lock().map(|j| j.clone()).unwrap_or_default()
    }

    /// How many observed requests a named rule served
    #[must_use]
    pub fn served_count(&self, rule_name: &str) -> usize {
        self.journal()
            .iter()
            .filter(|record| record.matched.as_deref() == Some(rule_name))
            .count()
    }

    /// Clear the request journal
    pub fn clear_journal(&self) {
        if let Ok(mut journal) = self.journal.lock() {
            journal.clear();
        }
    }

    /// Arm interception on a page. Must run before the page issues any
    /// application request; the session layer guarantees this by arming
    /// pages while they still sit on `about:blank`.
    ///
    /// Returns the interception task handle, or `None` when the router is
    /// disabled (live-backend mode installs nothing).
    ///
    /// # Errors
    ///
    /// Returns an error if the Fetch domain cannot be enabled or the
    /// event listener cannot be registered.
    pub async fn install(&self, page: &Page) -> PromesaResult<Option<JoinHandle<()>>> {
        if !self.enabled {
            debug!("live backend mode, no interception installed");
            return Ok(None);
        }

        let mut events = page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(|e| PromesaError::Route {
                message: format!("failed to register request listener: {e}"),
            })?;

        page.execute(FetchEnableParams::default())
            .await
            .map_err(|e| PromesaError::Route {
                message: format!("failed to enable request interception: {e}"),
            })?;

        let router = self.clone();
        let page = page.clone();
        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                router.dispatch(&page, &event).await;
            }
            debug!("interception stream ended");
        });

        Ok(Some(task))
    }

    /// Handle one paused request: fulfill on match, continue otherwise.
    async fn dispatch(&self, page: &Page, event: &EventRequestPaused) {
        let method = event.request.method.as_str();
        let url = event.request.url.as_str();

        match self.observe(method, url) {
            Some(rule) => {
                debug!(%method, %url, rule = %rule.name, "fulfilling with canned response");
                let fulfilled = match build_fulfillment(event.request_id.clone(), &rule.response)
                {
                    Ok(params) => match page.execute(params).await {
                        Ok(_) => true,
                        Err(e) => {
                            warn!(rule = %rule.name, error = %e, "fulfillment failed");
                            false
                        }
                    },
                    Err(e) => {
                        warn!(rule = %rule.name, error = %e, "could not build fulfillment");
                        false
                    }
                };
                // The request must never be left paused: fall back to the
                // real network rather than hang the page.
                if !fulfilled {
                    continue_request(page, event.request_id.clone()).await;
                }
            }
            None => {
                debug!(%method, %url, "passing through");
                continue_request(page, event.request_id.clone()).await;
            }
        }
    }
}

/// Release a paused request to the real network.
async fn continue_request(page: &Page, request_id: RequestId) {
    let params = match ContinueRequestParams::builder().request_id(request_id).build() {
        Ok(params) => params,
        Err(e) => {
            warn!(error = %e, "could not build pass-through params");
            return;
        }
    };
    if let Err(e) = page.execute(params).await {
        warn!(error = %e, "pass-through continue failed");
    }
}

/// Translate a canned response into a Fetch-domain fulfillment.
fn build_fulfillment(
    request_id: RequestId,
    response: &CannedResponse,
) -> Result<FulfillRequestParams, String> {
    let mut headers = Vec::with_capacity(response.headers.len() + 1);
    headers.push(
        HeaderEntry::builder()
            .name("content-type")
            .value(response.content_type.clone())
            .build()?,
    );
    for (name, value) in &response.headers {
        headers.push(
            HeaderEntry::builder()
                .name(name.clone())
                .value(value.clone())
                .build()?,
        );
    }

    FulfillRequestParams::builder()
        .request_id(request_id)
        .response_code(i64::from(response.status))
        .response_headers(headers)
        .body(base64::engine::general_purpose::STANDARD.encode(&response.body))
        .build()
}
