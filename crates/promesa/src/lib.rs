//! Promesa: end-to-end test infrastructure for the OTP Promise Calculator.
//!
//! Two components, composed by the test runner:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      PROMESA Architecture                        │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐      ┌──────────────┐      ┌────────────────┐  │
//! │  │ Environment │      │ Session      │      │ Browser        │  │
//! │  │ (BROWSER,   │─────►│ Factory      │─────►│ process (CDP)  │  │
//! │  │  HEADLESS…) │      │              │      │                │  │
//! │  └─────────────┘      └──────┬───────┘      └────────────────┘  │
//! │                              │ per-test context                 │
//! │                       ┌──────▼───────┐      ┌────────────────┐  │
//! │                       │ Mock Router  │─────►│ canned JSON or │  │
//! │                       │ (ordered     │      │ pass-through   │  │
//! │                       │  URL rules)  │      │                │  │
//! │                       └──────────────┘      └────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The factory translates environment configuration into a running
//! browser and isolated per-test contexts; the router substitutes
//! deterministic responses for the backend endpoints the application
//! consumes, with a live-backend escape hatch. Everything else (element
//! interaction, assertions, reporting) belongs to the test runner and
//! the page objects.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Environment-driven browser configuration
pub mod config;
/// Tracing setup helpers
pub mod logging;
/// Canned backend payloads and the ordered route table
pub mod mocks;
/// Page objects for the application under test
pub mod pages;
/// Result and error types
pub mod result;
/// Request interception and mocking
pub mod routing;
/// Browser session factory and contexts
pub mod session;
/// Bounded polling for eventually-consistent UI state
pub mod wait;

pub use config::{
    BrowserSettings, ContextProfile, DeviceProfile, Engine, Viewport, DEFAULT_BASE_URL,
    LAUNCH_TIMEOUT_MS,
};
pub use pages::{ApiHealth, PromiseCalculatorPage};
pub use result::{PromesaError, PromesaResult};
pub use routing::{CannedResponse, MockRouter, MockRule, RequestRecord, UrlPattern};
pub use session::{CloseReport, SessionContext, SessionFactory, SessionPage};
pub use wait::{poll_until, poll_until_async, PollOptions, PollOutcome};
