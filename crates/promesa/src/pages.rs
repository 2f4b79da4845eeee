//! Page object for the Promise Calculator application.
//!
//! A thin collaborator over [`SessionPage`]: selectors and interactions
//! live here, assertions stay in the tests. Readiness checks go through
//! the bounded poll primitive instead of ad hoc sleeps.

use crate::result::PromesaResult;
use crate::session::SessionPage;
use crate::wait::{poll_until_async, PollOptions};

/// Manual-order mode tab
pub const MANUAL_MODE_BUTTON: &str = "[data-testid=\"input-mode-manual\"]";
/// Sales-order mode tab
pub const SALES_ORDER_MODE_BUTTON: &str = "[data-testid=\"input-mode-sales-order\"]";
/// Customer name input (manual mode)
pub const CUSTOMER_INPUT: &str = "#customer";
/// Sales order combobox container
pub const SALES_ORDER_COMBOBOX: &str = "[data-testid=\"sales-order-combobox\"]";
/// Label shown above the results panel
pub const PROMISE_DATE_LABEL: &str = "Promise Date";

/// API health badge state as rendered by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiHealth {
    /// "API connected" badge is visible
    Connected,
    /// "API offline" / "Backend Offline" badge is visible
    Offline,
    /// Neither badge found
    Unknown,
}

/// Page object for the Promise Calculator page
#[derive(Debug)]
pub struct PromiseCalculatorPage {
    page: SessionPage,
}

impl PromiseCalculatorPage {
    /// Wrap a session page
    #[must_use]
    pub const fn new(page: SessionPage) -> Self {
        Self { page }
    }

    /// The underlying session page
    #[must_use]
    pub const fn page(&self) -> &SessionPage {
        &self.page
    }

    /// Consume the page object, returning the session page for teardown
    #[must_use]
    pub fn into_page(self) -> SessionPage {
        self.page
    }

    /// Navigate to the application root and wait for the shell to render.
    ///
    /// # Errors
    ///
    /// Returns a navigation error, or a timeout if the shell never
    /// appears.
    pub async fn open(&self) -> PromesaResult<()> {
        self.page.goto("/").await?;
        self.wait_until_ready().await
    }

    /// Poll until a heading is rendered.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` when the deadline expires.
    pub async fn wait_until_ready(&self) -> PromesaResult<()> {
        let options = PollOptions::new().with_timeout(10_000).with_interval(200);
        poll_until_async(
            || async {
                self.page
                    .eval::<bool>(selector_probe("h1, h2, [role=\"heading\"]"))
                    .await
                    .unwrap_or(false)
            },
            &options,
        )
        .await
        .into_result()
    }

    /// Read the API health badge state.
    ///
    /// # Errors
    ///
    /// Returns an evaluation error if the page cannot be queried.
    pub async fn api_health_status(&self) -> PromesaResult<ApiHealth> {
        let status: String = self
            .page
            .eval(
                "(() => { \
                   const text = document.body ? document.body.innerText : ''; \
                   if (text.includes('API connected')) return 'connected'; \
                   if (text.includes('API offline') || text.includes('Backend Offline')) \
                     return 'offline'; \
                   return 'unknown'; \
                 })()",
            )
            .await?;
        Ok(match status.as_str() {
            "connected" => ApiHealth::Connected,
            "offline" => ApiHealth::Offline,
            _ => ApiHealth::Unknown,
        })
    }

    /// Whether a selector matches a rendered element.
    ///
    /// # Errors
    ///
    /// Returns an evaluation error if the page cannot be queried.
    pub async fn is_visible(&self, selector: &str) -> PromesaResult<bool> {
        self.page.eval(selector_probe(selector)).await
    }

    /// Click the first element matching a selector.
    ///
    /// # Errors
    ///
    /// Returns an evaluation error; the returned bool reports whether an
    /// element was found to click.
    pub async fn click(&self, selector: &str) -> PromesaResult<bool> {
        self.page
            .eval(format!(
                "(() => {{ const el = document.querySelector('{selector}'); \
                   if (!el) return false; el.click(); return true; }})()"
            ))
            .await
    }

    /// Inner text of the first element matching a selector, empty when
    /// the element is missing.
    ///
    /// # Errors
    ///
    /// Returns an evaluation error if the page cannot be queried.
    pub async fn text_of(&self, selector: &str) -> PromesaResult<String> {
        self.page
            .eval(format!(
                "(() => {{ const el = document.querySelector('{selector}'); \
                   return el ? el.innerText : ''; }})()"
            ))
            .await
    }
}

fn selector_probe(selector: &str) -> String {
    format!("document.querySelector('{selector}') !== null")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_use_single_quote_safe_syntax() {
        // Selectors are embedded into single-quoted JS strings.
        for selector in [
            MANUAL_MODE_BUTTON,
            SALES_ORDER_MODE_BUTTON,
            CUSTOMER_INPUT,
            SALES_ORDER_COMBOBOX,
        ] {
            assert!(!selector.contains('\''), "selector breaks JS quoting: {selector}");
        }
    }

    #[test]
    fn test_selector_probe_embeds_selector() {
        let probe = selector_probe("#customer");
        assert_eq!(probe, "document.querySelector('#customer') !== null");
    }
}
