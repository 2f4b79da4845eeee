//! Environment-driven browser configuration.
//!
//! Mirrors the variables the test runner exports:
//!
//! - `BROWSER`: chrome | chromium | firefox | webkit (default: chrome)
//! - `SCREEN_WIDTH` / `SCREEN_HEIGHT`: viewport (default: 1920x1080)
//! - `HEADLESS`: true | false (default: false)
//! - `SLOW_MO`: per-operation delay in ms (default: 100 when headful, else 0)
//! - `DEVICE_PROFILE`: mobile | tablet | desktop (default: unset)
//! - `BASE_URL`: navigation root (default: <http://localhost:3000>)
//! - `USE_LIVE_ERP`: true | false (default: false, mock the backend)
//!
//! Settings are read once per suite; a device profile, when present, wins
//! over explicit viewport dimensions.

use crate::result::{PromesaError, PromesaResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Fixed launch timeout, generous enough for slow CI runners.
pub const LAUNCH_TIMEOUT_MS: u64 = 60_000;

/// Slow-motion delay applied when running headful and `SLOW_MO` is unset.
pub const DEFAULT_HEADFUL_SLOW_MO_MS: u64 = 100;

/// Default navigation root for the application under test.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Browser engine selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Engine {
    /// Chromium-family browsers (`chrome` and `chromium` are synonymous)
    Chromium,
    /// Firefox
    Firefox,
    /// WebKit
    Webkit,
}

impl Engine {
    /// Canonical name used in logs and launch errors
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Firefox => "firefox",
            Self::Webkit => "webkit",
        }
    }
}

impl FromStr for Engine {
    type Err = PromesaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Self::Chromium),
            "firefox" => Ok(Self::Firefox),
            "webkit" => Ok(Self::Webkit),
            other => Err(PromesaError::UnsupportedEngine {
                name: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Viewport {
    /// Create a new viewport
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Named emulation bundle: viewport plus touch/scale flags mimicking a
/// class of physical device. When set it overrides explicit viewport
/// dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceProfile {
    /// Phone-sized viewport with touch, 2x scale
    Mobile,
    /// Tablet-sized viewport with touch
    Tablet,
    /// Full desktop viewport, no touch
    Desktop,
}

impl DeviceProfile {
    /// Viewport for this profile
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        match self {
            Self::Mobile => Viewport::new(375, 667),
            Self::Tablet => Viewport::new(768, 1024),
            Self::Desktop => Viewport::new(1920, 1080),
        }
    }

    /// Device pixel ratio for this profile
    #[must_use]
    pub const fn device_scale_factor(&self) -> f64 {
        match self {
            Self::Mobile | Self::Tablet => 2.0,
            Self::Desktop => 1.0,
        }
    }

    /// Whether the emulated device reports itself as mobile
    #[must_use]
    pub const fn is_mobile(&self) -> bool {
        matches!(self, Self::Mobile)
    }

    /// Whether the emulated device supports touch input
    #[must_use]
    pub const fn has_touch(&self) -> bool {
        matches!(self, Self::Mobile | Self::Tablet)
    }
}

impl FromStr for DeviceProfile {
    type Err = PromesaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mobile" => Ok(Self::Mobile),
            "tablet" => Ok(Self::Tablet),
            "desktop" => Ok(Self::Desktop),
            other => Err(PromesaError::Config {
                message: format!("unknown device profile: {other}"),
            }),
        }
    }
}

/// Effective emulation applied to every context the factory creates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextProfile {
    /// Context viewport
    pub viewport: Viewport,
    /// Device pixel ratio
    pub device_scale_factor: f64,
    /// Mobile emulation flag
    pub is_mobile: bool,
    /// Touch emulation flag
    pub has_touch: bool,
}

/// Browser configuration, read once at factory construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Engine to launch
    pub engine: Engine,
    /// Explicit viewport (fallback when no device profile is set)
    pub viewport: Viewport,
    /// Device profile; wins over the explicit viewport when present
    pub device_profile: Option<DeviceProfile>,
    /// Run without a visible window
    pub headless: bool,
    /// Artificial per-operation delay in milliseconds
    pub slow_motion_ms: u64,
    /// Navigation root of the application under test
    pub base_url: String,
    /// Skip mocking and hit a real backend
    pub use_live_backend: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            engine: Engine::Chromium,
            viewport: Viewport::default(),
            device_profile: None,
            headless: false,
            slow_motion_ms: DEFAULT_HEADFUL_SLOW_MO_MS,
            base_url: DEFAULT_BASE_URL.to_string(),
            use_live_backend: false,
        }
    }
}

impl BrowserSettings {
    /// Read settings from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown engine or device profile name, or a
    /// numeric variable that fails to parse. This happens before any
    /// browser resource is acquired.
    pub fn from_env() -> PromesaResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an injectable lookup. Tests use this instead
    /// of mutating the process environment.
    ///
    /// # Errors
    ///
    /// Same contract as [`BrowserSettings::from_env`].
    pub fn from_lookup<F>(lookup: F) -> PromesaResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let engine = match lookup("BROWSER") {
            Some(raw) => raw.parse()?,
            None => Engine::Chromium,
        };

        let width = parse_dimension(lookup("SCREEN_WIDTH"), "SCREEN_WIDTH", 1920)?;
        let height = parse_dimension(lookup("SCREEN_HEIGHT"), "SCREEN_HEIGHT", 1080)?;

        let headless = lookup("HEADLESS")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        let slow_motion_ms = match lookup("SLOW_MO") {
            Some(raw) => raw.trim().parse().map_err(|_| PromesaError::Config {
                message: format!("SLOW_MO must be a non-negative integer, got {raw:?}"),
            })?,
            None if headless => 0,
            None => DEFAULT_HEADFUL_SLOW_MO_MS,
        };

        let device_profile = match lookup("DEVICE_PROFILE") {
            Some(raw) if !raw.trim().is_empty() => Some(raw.trim().parse()?),
            _ => None,
        };

        let base_url = lookup("BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let use_live_backend = lookup("USE_LIVE_ERP")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            engine,
            viewport: Viewport::new(width, height),
            device_profile,
            headless,
            slow_motion_ms,
            base_url,
            use_live_backend,
        })
    }

    /// Set the engine
    #[must_use]
    pub const fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    /// Set an explicit viewport
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = Viewport::new(width, height);
        self
    }

    /// Set a device profile
    #[must_use]
    pub const fn with_device_profile(mut self, profile: DeviceProfile) -> Self {
        self.device_profile = Some(profile);
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the slow-motion delay
    #[must_use]
    pub const fn with_slow_motion(mut self, ms: u64) -> Self {
        self.slow_motion_ms = ms;
        self
    }

    /// Set the navigation root
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Route tests against a live backend instead of mocks
    #[must_use]
    pub const fn with_live_backend(mut self, live: bool) -> Self {
        self.use_live_backend = live;
        self
    }

    /// Effective context emulation. The device profile wins over explicit
    /// viewport dimensions: ad hoc `SCREEN_WIDTH`/`SCREEN_HEIGHT` values
    /// are a fallback, not an override.
    #[must_use]
    pub fn context_profile(&self) -> ContextProfile {
        match self.device_profile {
            Some(profile) => ContextProfile {
                viewport: profile.viewport(),
                device_scale_factor: profile.device_scale_factor(),
                is_mobile: profile.is_mobile(),
                has_touch: profile.has_touch(),
            },
            None => ContextProfile {
                viewport: self.viewport,
                device_scale_factor: 1.0,
                is_mobile: false,
                has_touch: false,
            },
        }
    }
}

fn parse_dimension(raw: Option<String>, key: &str, default: u32) -> PromesaResult<u32> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value: u32 = raw.trim().parse().map_err(|_| PromesaError::Config {
        message: format!("{key} must be a positive integer, got {raw:?}"),
    })?;
    if value == 0 {
        return Err(PromesaError::Config {
            message: format!("{key} must be greater than zero"),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    mod engine_tests {
        use super::*;

        #[test]
        fn test_chrome_and_chromium_are_synonymous() {
            assert_eq!("chrome".parse::<Engine>().unwrap(), Engine::Chromium);
            assert_eq!("chromium".parse::<Engine>().unwrap(), Engine::Chromium);
            assert_eq!("CHROME".parse::<Engine>().unwrap(), Engine::Chromium);
        }

        #[test]
        fn test_firefox_and_webkit_parse() {
            assert_eq!("firefox".parse::<Engine>().unwrap(), Engine::Firefox);
            assert_eq!("webkit".parse::<Engine>().unwrap(), Engine::Webkit);
        }

        #[test]
        fn test_unknown_engine_rejected() {
            let err = "safari".parse::<Engine>().unwrap_err();
            assert!(matches!(
                err,
                PromesaError::UnsupportedEngine { name } if name == "safari"
            ));
        }

        #[test]
        fn test_display() {
            assert_eq!(Engine::Chromium.to_string(), "chromium");
            assert_eq!(Engine::Firefox.to_string(), "firefox");
            assert_eq!(Engine::Webkit.to_string(), "webkit");
        }
    }

    mod device_profile_tests {
        use super::*;

        #[test]
        fn test_mobile_table() {
            let p = DeviceProfile::Mobile;
            assert_eq!(p.viewport(), Viewport::new(375, 667));
            assert!((p.device_scale_factor() - 2.0).abs() < f64::EPSILON);
            assert!(p.is_mobile());
            assert!(p.has_touch());
        }

        #[test]
        fn test_tablet_table() {
            let p = DeviceProfile::Tablet;
            assert_eq!(p.viewport(), Viewport::new(768, 1024));
            assert!(!p.is_mobile());
            assert!(p.has_touch());
        }

        #[test]
        fn test_desktop_table() {
            let p = DeviceProfile::Desktop;
            assert_eq!(p.viewport(), Viewport::new(1920, 1080));
            assert!((p.device_scale_factor() - 1.0).abs() < f64::EPSILON);
            assert!(!p.is_mobile());
            assert!(!p.has_touch());
        }

        #[test]
        fn test_parse() {
            assert_eq!(
                "mobile".parse::<DeviceProfile>().unwrap(),
                DeviceProfile::Mobile
            );
            assert_eq!(
                "Tablet".parse::<DeviceProfile>().unwrap(),
                DeviceProfile::Tablet
            );
            assert!("phone".parse::<DeviceProfile>().is_err());
        }
    }

    mod settings_tests {
        use super::*;

        #[test]
        fn test_defaults_with_empty_environment() {
            let settings = BrowserSettings::from_lookup(|_| None).unwrap();
            assert_eq!(settings.engine, Engine::Chromium);
            assert_eq!(settings.viewport, Viewport::new(1920, 1080));
            assert!(settings.device_profile.is_none());
            assert!(!settings.headless);
            assert_eq!(settings.slow_motion_ms, DEFAULT_HEADFUL_SLOW_MO_MS);
            assert_eq!(settings.base_url, DEFAULT_BASE_URL);
            assert!(!settings.use_live_backend);
        }

        #[test]
        fn test_slow_motion_defaults_to_zero_when_headless() {
            let settings =
                BrowserSettings::from_lookup(lookup_from(&[("HEADLESS", "true")])).unwrap();
            assert!(settings.headless);
            assert_eq!(settings.slow_motion_ms, 0);
        }

        #[test]
        fn test_explicit_slow_motion_wins_over_default() {
            let settings = BrowserSettings::from_lookup(lookup_from(&[
                ("HEADLESS", "true"),
                ("SLOW_MO", "250"),
            ]))
            .unwrap();
            assert_eq!(settings.slow_motion_ms, 250);
        }

        #[test]
        fn test_unknown_engine_fails_before_launch() {
            let result = BrowserSettings::from_lookup(lookup_from(&[("BROWSER", "opera")]));
            assert!(matches!(
                result,
                Err(PromesaError::UnsupportedEngine { name }) if name == "opera"
            ));
        }

        #[test]
        fn test_invalid_dimension_rejected() {
            assert!(
                BrowserSettings::from_lookup(lookup_from(&[("SCREEN_WIDTH", "wide")])).is_err()
            );
            assert!(BrowserSettings::from_lookup(lookup_from(&[("SCREEN_WIDTH", "0")])).is_err());
        }

        #[test]
        fn test_base_url_trailing_slash_trimmed() {
            let settings = BrowserSettings::from_lookup(lookup_from(&[(
                "BASE_URL",
                "https://app.example.test/",
            )]))
            .unwrap();
            assert_eq!(settings.base_url, "https://app.example.test");
        }

        #[test]
        fn test_live_backend_flag() {
            let settings =
                BrowserSettings::from_lookup(lookup_from(&[("USE_LIVE_ERP", "TRUE")])).unwrap();
            assert!(settings.use_live_backend);
        }

        #[test]
        fn test_empty_device_profile_treated_as_unset() {
            let settings =
                BrowserSettings::from_lookup(lookup_from(&[("DEVICE_PROFILE", "")])).unwrap();
            assert!(settings.device_profile.is_none());
        }
    }

    mod context_profile_tests {
        use super::*;

        #[test]
        fn test_profile_wins_over_explicit_viewport() {
            let settings = BrowserSettings::from_lookup(lookup_from(&[
                ("SCREEN_WIDTH", "2560"),
                ("SCREEN_HEIGHT", "1440"),
                ("DEVICE_PROFILE", "mobile"),
            ]))
            .unwrap();

            let profile = settings.context_profile();
            assert_eq!(profile.viewport, Viewport::new(375, 667));
            assert!(profile.is_mobile);
            assert!(profile.has_touch);
            assert!((profile.device_scale_factor - 2.0).abs() < f64::EPSILON);
        }

        #[test]
        fn test_explicit_viewport_used_without_profile() {
            let settings = BrowserSettings::default().with_viewport(1280, 720);
            let profile = settings.context_profile();
            assert_eq!(profile.viewport, Viewport::new(1280, 720));
            assert!(!profile.is_mobile);
            assert!(!profile.has_touch);
        }
    }
}
