//! Browser session factory.
//!
//! One factory per test suite owns one browser process and hands out
//! isolated browsing contexts, one per test case. The factory moves
//! through `uninitialized -> started -> closed`; `new_context` starts the
//! browser lazily, and `close` is best-effort teardown that never raises.
//!
//! ```text
//! SessionFactory ──owns──> browser process (one per suite)
//!       │
//!       └─ new_context() ──> SessionContext (cookies/storage isolated)
//!                                 │
//!                                 └─ new_page() ──> SessionPage
//!                                    (router armed before any request)
//! ```

use crate::config::{BrowserSettings, ContextProfile, Engine, LAUNCH_TIMEOUT_MS};
use crate::result::{PromesaError, PromesaResult};
use crate::routing::MockRouter;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetTouchEmulationEnabledParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams as NetworkEnableParams, Headers, SetExtraHttpHeadersParams,
};
use chromiumoxide::cdp::browser_protocol::security::SetIgnoreCertificateErrorsParams;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Extra header that skips the ngrok interstitial warning page when the
/// application is reached through a tunnel.
pub const TUNNEL_BYPASS_HEADER: (&str, &str) = ("ngrok-skip-browser-warning", "true");

/// Factory lifecycle state
#[derive(Debug)]
enum FactoryState {
    Uninitialized,
    Started {
        browser: Arc<Mutex<Browser>>,
        handler_task: JoinHandle<()>,
    },
    Closed,
}

/// Outcome of best-effort teardown. Each release step is attempted
/// independently; failures are recorded here instead of raised, so a
/// broken teardown can never mask the real test failure.
#[derive(Debug, Clone, Default)]
pub struct CloseReport {
    /// Human-readable description of each failed release step
    pub failures: Vec<String>,
}

impl CloseReport {
    /// Whether every release step succeeded
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Builds a configured browser and per-test isolated contexts from
/// environment-driven settings. Owns the browser process for the
/// lifetime of the suite; constructed by suite setup and injected into
/// each test case.
#[derive(Debug)]
pub struct SessionFactory {
    settings: BrowserSettings,
    state: FactoryState,
}

impl SessionFactory {
    /// Create a factory from explicit settings
    #[must_use]
    pub const fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            state: FactoryState::Uninitialized,
        }
    }

    /// Create a factory from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns a configuration error (unknown engine, bad numeric value)
    /// before any browser resource is acquired.
    pub fn configure() -> PromesaResult<Self> {
        Ok(Self::new(BrowserSettings::from_env()?))
    }

    /// The settings this factory was built with
    #[must_use]
    pub const fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    /// Whether the browser process is running
    #[must_use]
    pub const fn is_started(&self) -> bool {
        matches!(self.state, FactoryState::Started { .. })
    }

    /// Launch the configured engine. Idempotent once started.
    ///
    /// # Errors
    ///
    /// Launch failures are fatal and identify the engine and cause
    /// (timeout, missing binary, or driver error); they signal a broken
    /// test environment and are never retried here. Firefox and WebKit
    /// selectors fail fatally: the CDP driver launches chromium-family
    /// binaries only.
    pub async fn start(&mut self) -> PromesaResult<()> {
        match self.state {
            FactoryState::Started { .. } => return Ok(()),
            FactoryState::Closed => {
                return Err(PromesaError::InvalidState {
                    message: "factory already closed".to_string(),
                })
            }
            FactoryState::Uninitialized => {}
        }

        if self.settings.engine != Engine::Chromium {
            return Err(PromesaError::BrowserLaunch {
                engine: self.settings.engine.as_str().to_string(),
                message: "only chromium-family engines can be driven over CDP; \
                          set BROWSER=chrome or install chromium"
                    .to_string(),
            });
        }

        let config = build_browser_config(&self.settings)?;
        info!(
            engine = %self.settings.engine,
            headless = self.settings.headless,
            "launching browser"
        );

        let (browser, mut handler) =
            Browser::launch(config)
                .await
                .map_err(|e| PromesaError::BrowserLaunch {
                    engine: self.settings.engine.as_str().to_string(),
                    message: e.to_string(),
                })?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler event error");
                }
            }
            debug!("browser handler loop ended");
        });

        self.state = FactoryState::Started {
            browser: Arc::new(Mutex::new(browser)),
            handler_task,
        };
        Ok(())
    }

    /// Create a fresh isolated browsing context, starting the browser
    /// first if needed. Contexts share the browser process but not
    /// cookies, storage, cache, or routing.
    ///
    /// # Errors
    ///
    /// Propagates launch failures and context-creation failures; both
    /// abort test setup.
    pub async fn new_context(&mut self) -> PromesaResult<SessionContext> {
        self.start().await?;

        let FactoryState::Started { browser, .. } = &self.state else {
            return Err(PromesaError::InvalidState {
                message: "factory is not started".to_string(),
            });
        };

        let context_id: BrowserContextId = {
            let guard = browser.lock().await;
            let response = guard
                .execute(CreateBrowserContextParams::default())
                .await
                .map_err(|e| PromesaError::Context {
                    message: format!("failed to create browser context: {e}"),
                })?;
            response.browser_context_id.clone()
        };

        let profile = self.settings.context_profile();
        debug!(context = ?context_id, ?profile, "created browser context");

        Ok(SessionContext {
            browser: Arc::clone(browser),
            id: context_id,
            profile,
            base_url: self.settings.base_url.clone(),
            slow_motion: Duration::from_millis(self.settings.slow_motion_ms),
            router: None,
            pages_spawned: 0,
            closed: false,
        })
    }

    /// Release the browser process and the handler loop.
    ///
    /// Best-effort: every release step is attempted regardless of earlier
    /// failures, failures are logged and collected, and nothing is
    /// raised. Valid from any state and idempotent; this typically runs
    /// during suite teardown, where an error would hide the real test
    /// failures.
    pub async fn close(&mut self) -> CloseReport {
        let mut report = CloseReport::default();
        let state = std::mem::replace(&mut self.state, FactoryState::Closed);

        if let FactoryState::Started {
            browser,
            handler_task,
        } = state
        {
            {
                let mut guard = browser.lock().await;
                if let Err(e) = guard.close().await {
                    warn!(error = %e, "failed to close browser");
                    report.failures.push(format!("browser close: {e}"));
                }
                if let Err(e) = guard.wait().await {
                    warn!(error = %e, "failed to reap browser process");
                    report.failures.push(format!("browser wait: {e}"));
                }
            }
            handler_task.abort();
            info!(clean = report.is_clean(), "browser session closed");
        }

        report
    }
}

fn build_browser_config(settings: &BrowserSettings) -> PromesaResult<BrowserConfig> {
    let profile = settings.context_profile();
    let mut builder = BrowserConfig::builder()
        .window_size(profile.viewport.width, profile.viewport.height)
        .launch_timeout(Duration::from_millis(LAUNCH_TIMEOUT_MS))
        // CI containers run without a usable sandbox
        .no_sandbox();

    if !settings.headless {
        builder = builder.with_head();
    }

    builder.build().map_err(|e| PromesaError::BrowserLaunch {
        engine: settings.engine.as_str().to_string(),
        message: e.to_string(),
    })
}

/// An isolated browsing context: its own cookies, storage, cache, and
/// mock-router registration, sharing the one browser process.
///
/// Routing must be attached before the first page is created so that no
/// application request escapes interception; [`SessionContext::new_page`]
/// arms the router while the page still sits on `about:blank`.
#[derive(Debug)]
pub struct SessionContext {
    browser: Arc<Mutex<Browser>>,
    id: BrowserContextId,
    profile: ContextProfile,
    base_url: String,
    slow_motion: Duration,
    router: Option<MockRouter>,
    pages_spawned: u32,
    closed: bool,
}

impl SessionContext {
    /// Effective emulation applied to every page in this context
    #[must_use]
    pub const fn profile(&self) -> &ContextProfile {
        &self.profile
    }

    /// CDP identifier of this context
    #[must_use]
    pub const fn id(&self) -> &BrowserContextId {
        &self.id
    }

    /// The router attached to this context, if any
    #[must_use]
    pub const fn router(&self) -> Option<&MockRouter> {
        self.router.as_ref()
    }

    /// Attach a mock router. A disabled (pass-through) router installs
    /// no interception at all.
    ///
    /// # Errors
    ///
    /// Fails once a page exists in this context: a late registration
    /// would let earlier requests escape interception.
    pub fn set_router(&mut self, router: MockRouter) -> PromesaResult<()> {
        if self.pages_spawned > 0 {
            return Err(PromesaError::InvalidState {
                message: "router must be attached before the first page is created".to_string(),
            });
        }
        self.router = Some(router);
        Ok(())
    }

    /// Create a page inside this context. The page starts on
    /// `about:blank`; emulation, TLS tolerance, the tunnel-bypass header,
    /// and the router (when attached) are all applied before the page is
    /// handed out.
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be created or configured.
    pub async fn new_page(&mut self) -> PromesaResult<SessionPage> {
        if self.closed {
            return Err(PromesaError::InvalidState {
                message: "context is closed".to_string(),
            });
        }

        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(self.id.clone())
            .build()
            .map_err(|e| PromesaError::Page { message: e.to_string() })?;

        let page = {
            let guard = self.browser.lock().await;
            guard
                .new_page(params)
                .await
                .map_err(|e| PromesaError::Page {
                    message: format!("failed to create page: {e}"),
                })?
        };

        self.apply_emulation(&page).await?;

        let router_task = match &self.router {
            Some(router) => router.install(&page).await?,
            None => None,
        };

        self.pages_spawned += 1;
        Ok(SessionPage {
            page,
            base_url: self.base_url.clone(),
            slow_motion: self.slow_motion,
            router_task,
        })
    }

    /// Dispose the CDP context. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the context cannot be disposed.
    pub async fn close(&mut self) -> PromesaResult<()> {
        if self.closed {
            return Ok(());
        }
        let params = DisposeBrowserContextParams::builder()
            .browser_context_id(self.id.clone())
            .build()
            .map_err(|e| PromesaError::Context { message: e.to_string() })?;
        {
            let guard = self.browser.lock().await;
            guard
                .execute(params)
                .await
                .map_err(|e| PromesaError::Context {
                    message: format!("failed to dispose context: {e}"),
                })?;
        }
        self.closed = true;
        debug!(context = ?self.id, "context disposed");
        Ok(())
    }

    async fn apply_emulation(&self, page: &Page) -> PromesaResult<()> {
        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(self.profile.viewport.width))
            .height(i64::from(self.profile.viewport.height))
            .device_scale_factor(self.profile.device_scale_factor)
            .mobile(self.profile.is_mobile)
            .build()
            .map_err(|e| PromesaError::Page { message: e.to_string() })?;
        page.execute(metrics)
            .await
            .map_err(|e| PromesaError::Page {
                message: format!("failed to apply device metrics: {e}"),
            })?;

        if self.profile.has_touch {
            let touch = SetTouchEmulationEnabledParams::builder()
                .enabled(true)
                .build()
                .map_err(|e| PromesaError::Page { message: e.to_string() })?;
            page.execute(touch).await.map_err(|e| PromesaError::Page {
                message: format!("failed to enable touch emulation: {e}"),
            })?;
        }

        // Self-signed and tunnel-proxied endpoints must not block
        // navigation.
        let tls = SetIgnoreCertificateErrorsParams::builder()
            .ignore(true)
            .build()
            .map_err(|e| PromesaError::Page { message: e.to_string() })?;
        page.execute(tls).await.map_err(|e| PromesaError::Page {
            message: format!("failed to relax TLS errors: {e}"),
        })?;

        page.execute(NetworkEnableParams::default())
            .await
            .map_err(|e| PromesaError::Page {
                message: format!("failed to enable network domain: {e}"),
            })?;
        let mut extra = serde_json::Map::new();
        extra.insert(
            TUNNEL_BYPASS_HEADER.0.to_string(),
            serde_json::Value::String(TUNNEL_BYPASS_HEADER.1.to_string()),
        );
        let headers = SetExtraHttpHeadersParams::builder()
            .headers(Headers::new(serde_json::Value::Object(extra)))
            .build()
            .map_err(|e| PromesaError::Page { message: e.to_string() })?;
        page.execute(headers).await.map_err(|e| PromesaError::Page {
            message: format!("failed to set extra headers: {e}"),
        })?;

        Ok(())
    }
}

/// A page handle that can only be obtained fully configured: emulation
/// applied and routing armed. Applies the configured slow-motion delay
/// before each driven operation and resolves relative paths against the
/// suite base URL.
#[derive(Debug)]
pub struct SessionPage {
    page: Page,
    base_url: String,
    slow_motion: Duration,
    router_task: Option<JoinHandle<()>>,
}

impl SessionPage {
    /// Raw CDP page, for collaborators that need the full surface
    #[must_use]
    pub const fn cdp_page(&self) -> &Page {
        &self.page
    }

    /// Resolve a path against the suite base URL. Absolute URLs pass
    /// through unchanged.
    #[must_use]
    pub fn resolve_url(&self, path: &str) -> String {
        join_base_url(&self.base_url, path)
    }

    /// Navigate and wait for the navigation to settle.
    ///
    /// # Errors
    ///
    /// Returns a navigation error naming the URL on failure or timeout.
    pub async fn goto(&self, path: &str) -> PromesaResult<()> {
        let url = self.resolve_url(path);
        self.pace().await;
        self.page
            .goto(url.clone())
            .await
            .map_err(|e| PromesaError::Navigation {
                url: url.clone(),
                message: e.to_string(),
            })?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| PromesaError::Navigation {
                url,
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Evaluate a script and deserialize its value.
    ///
    /// # Errors
    ///
    /// Returns an evaluation error if the script throws or the result
    /// cannot be deserialized.
    pub async fn eval<T: DeserializeOwned>(&self, expr: impl Into<String>) -> PromesaResult<T> {
        self.pace().await;
        let result =
            self.page
                .evaluate(expr.into())
                .await
                .map_err(|e| PromesaError::Evaluation {
                    message: e.to_string(),
                })?;
        result.into_value().map_err(|e| PromesaError::Evaluation {
            message: e.to_string(),
        })
    }

    /// Current page URL as reported by the browser.
    ///
    /// # Errors
    ///
    /// Returns a page error if the browser cannot be queried.
    pub async fn url(&self) -> PromesaResult<Option<String>> {
        self.page.url().await.map_err(|e| PromesaError::Page {
            message: e.to_string(),
        })
    }

    /// Close the page and stop its interception task.
    ///
    /// # Errors
    ///
    /// Returns a page error if the target refuses to close; the
    /// interception task is stopped regardless.
    pub async fn close(mut self) -> PromesaResult<()> {
        let result = self
            .page
            .clone()
            .close()
            .await
            .map_err(|e| PromesaError::Page {
                message: e.to_string(),
            });
        if let Some(task) = self.router_task.take() {
            task.abort();
        }
        result
    }

    async fn pace(&self) {
        if !self.slow_motion.is_zero() {
            tokio::time::sleep(self.slow_motion).await;
        }
    }
}

fn join_base_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") || path.starts_with("data:") {
        return path.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceProfile;

    fn headless_settings() -> BrowserSettings {
        BrowserSettings::default().with_headless(true)
    }

    mod close_report_tests {
        use super::*;

        #[test]
        fn test_default_is_clean() {
            assert!(CloseReport::default().is_clean());
        }

        #[test]
        fn test_failures_mark_it_dirty() {
            let report = CloseReport {
                failures: vec!["browser close: boom".to_string()],
            };
            assert!(!report.is_clean());
        }
    }

    mod lifecycle_tests {
        use super::*;

        #[tokio::test]
        async fn test_close_without_start_is_clean_and_idempotent() {
            let mut factory = SessionFactory::new(headless_settings());
            assert!(!factory.is_started());

            let first = factory.close().await;
            assert!(first.is_clean());

            let second = factory.close().await;
            assert!(second.is_clean());
        }

        #[tokio::test]
        async fn test_start_after_close_is_rejected() {
            let mut factory = SessionFactory::new(headless_settings());
            let _ = factory.close().await;

            let err = factory.start().await.unwrap_err();
            assert!(matches!(err, PromesaError::InvalidState { .. }));
        }

        #[tokio::test]
        async fn test_firefox_launch_fails_with_engine_identifying_error() {
            let settings = headless_settings().with_engine(Engine::Firefox);
            let mut factory = SessionFactory::new(settings);

            let err = factory.start().await.unwrap_err();
            match err {
                PromesaError::BrowserLaunch { engine, .. } => assert_eq!(engine, "firefox"),
                other => panic!("expected BrowserLaunch, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_webkit_launch_fails_with_engine_identifying_error() {
            let settings = headless_settings().with_engine(Engine::Webkit);
            let mut factory = SessionFactory::new(settings);

            let err = factory.start().await.unwrap_err();
            match err {
                PromesaError::BrowserLaunch { engine, .. } => assert_eq!(engine, "webkit"),
                other => panic!("expected BrowserLaunch, got {other:?}"),
            }
        }

        #[test]
        fn test_factory_exposes_settings() {
            let settings = headless_settings().with_device_profile(DeviceProfile::Mobile);
            let factory = SessionFactory::new(settings.clone());
            assert_eq!(factory.settings(), &settings);
        }
    }

    mod url_join_tests {
        use super::*;

        #[test]
        fn test_relative_path_joined_to_base() {
            assert_eq!(
                join_base_url("http://localhost:3000", "/"),
                "http://localhost:3000/"
            );
            assert_eq!(
                join_base_url("http://localhost:3000", "showcase"),
                "http://localhost:3000/showcase"
            );
        }

        #[test]
        fn test_absolute_url_passes_through() {
            assert_eq!(
                join_base_url("http://localhost:3000", "https://erp.example.test/health"),
                "https://erp.example.test/health"
            );
            assert_eq!(
                join_base_url("http://localhost:3000", "data:text/html,<h1>x</h1>"),
                "data:text/html,<h1>x</h1>"
            );
        }

        #[test]
        fn test_trailing_slash_on_base_is_collapsed() {
            assert_eq!(
                join_base_url("http://localhost:3000/", "/health"),
                "http://localhost:3000/health"
            );
        }
    }

    mod config_build_tests {
        use super::*;

        #[test]
        fn test_browser_config_builds_for_default_settings() {
            assert!(build_browser_config(&headless_settings()).is_ok());
        }

        #[test]
        fn test_tunnel_bypass_header_is_the_ngrok_one() {
            assert_eq!(TUNNEL_BYPASS_HEADER.0, "ngrok-skip-browser-warning");
            assert_eq!(TUNNEL_BYPASS_HEADER.1, "true");
        }
    }
}
