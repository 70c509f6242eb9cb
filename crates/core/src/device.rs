//! Device profiling from the user agent and screen metrics.
//!
//! Browser and OS names come from woothee. The device class uses our own
//! patterns because woothee files tablets under "smartphone"; the tablet
//! pattern is checked before the mobile one.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use woothee::parser::Parser;

use crate::environment::{EnvironmentSnapshot, ScreenMetrics};

static TABLET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)ipad|tablet|playbook|silk|kindle|nexus (7|9|10)").expect("invalid tablet pattern")
});

static MOBILE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)mobi|iphone|ipod|android|blackberry|bb10|opera mini|iemobile|windows phone")
        .expect("invalid mobile pattern")
});

static ANDROID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)android").expect("invalid android pattern"));

const UNKNOWN: &str = "unknown";

/// Device class of a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Desktop,
    Tablet,
    Mobile,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Tablet => "tablet",
            Self::Mobile => "mobile",
        }
    }

    /// Classify a user agent; tablets win over phones.
    pub fn classify(user_agent: &str) -> Self {
        // Android tablets omit the "Mobile" token
        let android_tablet =
            ANDROID_REGEX.is_match(user_agent) && !user_agent.to_ascii_lowercase().contains("mobile");
        if TABLET_REGEX.is_match(user_agent) || android_tablet {
            Self::Tablet
        } else if MOBILE_REGEX.is_match(user_agent) {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-shape device record attached to every visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub device_type: DeviceType,
    pub browser: String,
    pub os: String,
    pub os_version: String,
    pub screen_width: u32,
    pub screen_height: u32,
}

/// Pure user agent profiler.
pub struct DeviceProfiler {
    parser: Parser,
}

impl DeviceProfiler {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Profile a user agent and screen. Never fails; unmatched fields are "unknown".
    pub fn profile(&self, user_agent: &str, screen: ScreenMetrics) -> DeviceProfile {
        let mut browser = UNKNOWN.to_string();
        let mut os = UNKNOWN.to_string();
        let mut os_version = UNKNOWN.to_string();

        if !user_agent.is_empty() {
            if let Some(result) = self.parser.parse(user_agent) {
                if known(result.name) {
                    browser = result.name.to_string();
                }
                if known(result.os) {
                    os = result.os.to_string();
                }
                let version = result.os_version.to_string();
                if known(&version) {
                    os_version = version;
                }
            }
        }

        DeviceProfile {
            device_type: DeviceType::classify(user_agent),
            browser,
            os,
            os_version,
            screen_width: screen.width,
            screen_height: screen.height,
        }
    }

    /// Profile the current page environment.
    pub fn profile_environment(&self, env: &dyn EnvironmentSnapshot) -> DeviceProfile {
        self.profile(&env.user_agent(), env.screen_metrics())
    }
}

impl Default for DeviceProfiler {
    fn default() -> Self {
        Self::new()
    }
}

fn known(value: &str) -> bool {
    !value.is_empty() && value != "UNKNOWN"
}
