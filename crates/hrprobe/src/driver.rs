//! Driver - abstract browser automation capability set
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Driver (async trait)                                          │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐        ┌─────────────────────┐        │
//! │  │  ChromiumDriver     │        │  MockDriver         │        │
//! │  │  (feature browser)  │        │  (in-memory DOM)    │        │
//! │  │  CDP via            │        │  scripted pages for │        │
//! │  │  chromiumoxide      │        │  tests              │        │
//! │  └─────────────────────┘        └─────────────────────┘        │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! All methods take `&self`; implementations keep their state behind
//! interior mutability so helpers can share one driver reference.

use crate::config::{SuiteConfig, Viewport};
use crate::locator::Selector;
use crate::network::{Exchange, Intercept};
use crate::result::ProbeResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Element handle for DOM interactions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-scoped identifier for the element
    pub id: String,
    /// Element tag name (lowercase)
    pub tag_name: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
        }
    }
}

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}#{}>", self.tag_name, self.id)
    }
}

/// Keyboard keys the helpers press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Enter / Return
    Enter,
    /// Escape
    Escape,
    /// Tab
    Tab,
    /// Backspace
    Backspace,
}

impl Key {
    /// DOM `KeyboardEvent.key` value
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Enter => "Enter",
            Self::Escape => "Escape",
            Self::Tab => "Tab",
            Self::Backspace => "Backspace",
        }
    }

    /// Windows virtual key code used by CDP key events
    #[must_use]
    pub const fn key_code(&self) -> i64 {
        match self {
            Self::Enter => 13,
            Self::Escape => 27,
            Self::Tab => 9,
            Self::Backspace => 8,
        }
    }
}

/// Browser configuration for driver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Timeout for navigation
    pub navigation_timeout: Duration,
    /// Executable path override
    pub executable_path: Option<String>,
    /// User agent string
    pub user_agent: Option<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        let viewport = Viewport::default();
        Self {
            headless: true,
            viewport_width: viewport.width,
            viewport_height: viewport.height,
            navigation_timeout: Duration::from_secs(30),
            executable_path: None,
            user_agent: None,
        }
    }
}

impl DriverConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a driver config from a suite config
    #[must_use]
    pub fn from_suite(config: &SuiteConfig) -> Self {
        Self::default()
            .headless(config.headless)
            .viewport(config.viewport.width, config.viewport.height)
            .navigation_timeout(Duration::from_millis(config.response_timeout_ms))
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set navigation timeout
    #[must_use]
    pub const fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Set browser executable
    #[must_use]
    pub fn executable_path(mut self, path: impl Into<String>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    /// Set user agent
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }
}

/// Abstract driver trait for browser automation
///
/// # Implementations
///
/// - `ChromiumDriver` - real browser through chromiumoxide (feature `browser`)
/// - `MockDriver` - in-memory DOM for tests
#[async_trait]
pub trait Driver: Send + Sync {
    /// Navigate to URL and wait for the document to load
    async fn navigate(&self, url: &str) -> ProbeResult<()>;

    /// Reload the current document
    async fn reload(&self) -> ProbeResult<()>;

    /// Get current URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Query all matching elements, optionally below `scope`
    async fn query_all(
        &self,
        selector: &Selector,
        scope: Option<&ElementHandle>,
    ) -> ProbeResult<Vec<ElementHandle>>;

    /// Nearest ancestor (excluding `element`) matching `css`
    async fn ancestor(&self, element: &ElementHandle, css: &str)
        -> ProbeResult<Option<ElementHandle>>;

    /// Parent element
    async fn parent(&self, element: &ElementHandle) -> ProbeResult<Option<ElementHandle>>;

    /// Siblings of `element` matching `css`, in document order
    async fn siblings(&self, element: &ElementHandle, css: &str)
        -> ProbeResult<Vec<ElementHandle>>;

    /// Text content of an element
    async fn text(&self, element: &ElementHandle) -> ProbeResult<String>;

    /// Current value of a form control
    async fn value(&self, element: &ElementHandle) -> ProbeResult<String>;

    /// Whether the element is rendered and not hidden
    async fn is_visible(&self, element: &ElementHandle) -> ProbeResult<bool>;

    /// Whether a checkbox or radio is checked
    async fn is_checked(&self, element: &ElementHandle) -> ProbeResult<bool>;

    /// Click element
    async fn click(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// Clear a form control
    async fn clear(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// Type text into element, appending to its value
    async fn type_text(&self, element: &ElementHandle, text: &str) -> ProbeResult<()>;

    /// Press a key with `element` focused
    async fn press_key(&self, element: &ElementHandle, key: Key) -> ProbeResult<()>;

    /// Register a network intercept
    async fn intercept(&self, intercept: Intercept) -> ProbeResult<()>;

    /// Remove every registered intercept and forget recorded exchanges
    async fn clear_intercepts(&self) -> ProbeResult<()>;

    /// Exchanges recorded for an alias, in request order
    async fn exchanges(&self, alias: &str) -> ProbeResult<Vec<Exchange>>;

    /// Drain uncaught page errors observed since the last call
    async fn take_page_errors(&self) -> ProbeResult<Vec<String>>;
}

/// Find exactly one element, or fail with NotFound / Ambiguous
pub async fn query_one<D: Driver + ?Sized>(
    driver: &D,
    selector: &Selector,
    scope: Option<&ElementHandle>,
) -> ProbeResult<ElementHandle> {
    let mut found = driver.query_all(selector, scope).await?;
    match found.len() {
        0 => Err(crate::result::ProbeError::not_found(selector.to_string())),
        1 => Ok(found.remove(0)),
        count => Err(crate::result::ProbeError::Ambiguous {
            what: selector.to_string(),
            count,
        }),
    }
}

/// Find the first matching element, or fail with NotFound
pub async fn query_first<D: Driver + ?Sized>(
    driver: &D,
    selector: &Selector,
    scope: Option<&ElementHandle>,
) -> ProbeResult<ElementHandle> {
    driver
        .query_all(selector, scope)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| crate::result::ProbeError::not_found(selector.to_string()))
}
