//! Page environment capability.
//!
//! Everything the tracker reads from the hosting page (user agent, screen,
//! scroll position, URL, clock) goes through [`EnvironmentSnapshot`], so the
//! profiler and the emitter run without a real browser.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Screen geometry and color depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreenMetrics {
    pub width: u32,
    pub height: u32,
    pub color_depth: u8,
}

/// Document scroll position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    /// Scroll depth as a rounded percentage (0-100).
    ///
    /// `None` when the document has no scrollable range.
    pub fn depth_percent(&self) -> Option<u8> {
        let range = self.scroll_height - self.client_height;
        if !range.is_finite() || range <= 0.0 || !self.scroll_top.is_finite() {
            return None;
        }
        let pct = (self.scroll_top / range * 100.0).round().clamp(0.0, 100.0);
        Some(pct as u8)
    }
}

/// One element on the path from a click target up to the document root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    /// Lowercase tag name
    pub tag: String,
    pub id: Option<String>,
    pub class: Option<String>,
    pub text: Option<String>,
    /// ARIA role attribute
    pub role: Option<String>,
    /// Explicitly marked as trackable (`data-clickable`)
    #[serde(default)]
    pub clickable: bool,
}

impl ElementInfo {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn marked_clickable(mut self) -> Self {
        self.clickable = true;
        self
    }

    /// Buttons, links, `role=button` and explicitly marked elements.
    pub fn is_interactive(&self) -> bool {
        matches!(self.tag.as_str(), "button" | "a")
            || self
                .role
                .as_deref()
                .is_some_and(|r| r.eq_ignore_ascii_case("button"))
            || self.clickable
    }
}

/// A click as delivered by the host page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClickSignal {
    /// Target first, then each ancestor up to the root
    pub path: Vec<ElementInfo>,
    pub x: f64,
    pub y: f64,
}

impl ClickSignal {
    pub fn new(path: Vec<ElementInfo>, x: f64, y: f64) -> Self {
        Self { path, x, y }
    }

    /// Nearest interactive element, starting from the target itself.
    pub fn interactive_target(&self) -> Option<&ElementInfo> {
        self.path.iter().find(|el| el.is_interactive())
    }
}

/// Signals the host page forwards to the visit recorder.
#[derive(Debug, Clone, PartialEq)]
pub enum PageSignal {
    Click(ClickSignal),
    Scroll,
    VisibilityHidden,
    VisibilityVisible,
    Unload,
}

/// Read access to the hosting page.
pub trait EnvironmentSnapshot: Send + Sync {
    fn user_agent(&self) -> String;

    fn screen_metrics(&self) -> ScreenMetrics;

    fn scroll_metrics(&self) -> ScrollMetrics;

    /// IANA timezone name, e.g. `Europe/Berlin`
    fn timezone(&self) -> String;

    /// Full current URL including the query string
    fn current_url(&self) -> String;

    /// Document referrer, `None` when empty
    fn referrer(&self) -> Option<String>;

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Environment with fixed identity fields and adjustable scroll and clock.
///
/// Hosts that cannot query the page lazily push updates into it; tests use
/// it to simulate a browser.
#[derive(Debug)]
pub struct StaticEnvironment {
    user_agent: String,
    screen: ScreenMetrics,
    timezone: String,
    url: String,
    referrer: Option<String>,
    scroll: RwLock<ScrollMetrics>,
    clock: RwLock<Option<DateTime<Utc>>>,
}

impl StaticEnvironment {
    pub fn new(user_agent: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            screen: ScreenMetrics {
                width: 1920,
                height: 1080,
                color_depth: 24,
            },
            timezone: "UTC".to_string(),
            url: url.into(),
            referrer: None,
            scroll: RwLock::new(ScrollMetrics::default()),
            clock: RwLock::new(None),
        }
    }

    pub fn with_screen(mut self, screen: ScreenMetrics) -> Self {
        self.screen = screen;
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        let referrer = referrer.into();
        self.referrer = if referrer.is_empty() { None } else { Some(referrer) };
        self
    }

    /// Pin the clock to a fixed instant.
    pub fn with_now(self, now: DateTime<Utc>) -> Self {
        *self.clock.write() = Some(now);
        self
    }

    pub fn set_scroll(&self, scroll: ScrollMetrics) {
        *self.scroll.write() = scroll;
    }

    /// Scroll to `scroll_top` on a page of the given heights.
    pub fn scroll_to(&self, scroll_top: f64, scroll_height: f64, client_height: f64) {
        self.set_scroll(ScrollMetrics {
            scroll_top,
            scroll_height,
            client_height,
        });
    }

    pub fn set_now(&self, now: DateTime<Utc>) {
        *self.clock.write() = Some(now);
    }

    /// Move a pinned clock forward; pins it to the current time first if unset.
    pub fn advance(&self, by: Duration) {
        let mut clock = self.clock.write();
        let base = clock.unwrap_or_else(Utc::now);
        *clock = Some(base + by);
    }
}

impl EnvironmentSnapshot for StaticEnvironment {
    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }

    fn screen_metrics(&self) -> ScreenMetrics {
        self.screen
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        *self.scroll.read()
    }

    fn timezone(&self) -> String {
        self.timezone.clone()
    }

    fn current_url(&self) -> String {
        self.url.clone()
    }

    fn referrer(&self) -> Option<String> {
        self.referrer.clone()
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.read().unwrap_or_else(Utc::now)
    }
}
