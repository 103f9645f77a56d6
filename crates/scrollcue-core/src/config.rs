use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::draw::DrawFrame;
use crate::easing::Easing;
use crate::intersection::IntersectionOptions;
use crate::reveal::{RevealDirection, RevealProps};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub intersection: IntersectionOptions,
    #[serde(default)]
    pub draw: DrawConfig,
    #[serde(default)]
    pub reveal: RevealProps,
    #[serde(default)]
    pub smooth_scroll: SmoothScrollConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    /// Named reveal presets, one per page section
    #[serde(default = "default_sections")]
    pub sections: BTreeMap<String, RevealProps>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            intersection: IntersectionOptions::default(),
            draw: DrawConfig::default(),
            reveal: RevealProps::default(),
            smooth_scroll: SmoothScrollConfig::default(),
            throttle: ThrottleConfig::default(),
            sections: default_sections(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Defaults for path-drawing animations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawConfig {
    /// Duration of each keyframe segment
    #[serde(default = "default_segment_duration")]
    pub segment_duration_ms: u64,
    /// Easing name or control points
    #[serde(default = "default_draw_easing")]
    pub easing: Easing,
    /// Scroll progress that starts a scroll-synced run
    #[serde(default = "default_scroll_threshold")]
    pub threshold: f64,
    /// Keyframes used when a run supplies none
    #[serde(
        default = "default_keyframes",
        deserialize_with = "crate::draw::deserialize_keyframes"
    )]
    pub keyframes: Vec<DrawFrame>,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            segment_duration_ms: default_segment_duration(),
            easing: default_draw_easing(),
            threshold: default_scroll_threshold(),
            keyframes: default_keyframes(),
        }
    }
}

impl DrawConfig {
    pub fn segment_duration(&self) -> Duration {
        Duration::from_millis(self.segment_duration_ms)
    }
}

/// Eased programmatic scrolling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothScrollConfig {
    /// Animate programmatic scrolls; jump instantly when false
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Duration of one scroll animation
    #[serde(default = "default_smooth_duration")]
    pub duration_ms: u64,
    #[serde(default = "default_smooth_easing")]
    pub easing: Easing,
    /// Pixels left above an element when scrolling to it
    #[serde(default = "default_anchor_offset")]
    pub anchor_offset: f64,
    /// Multiplier applied to wheel deltas
    #[serde(default = "default_wheel_multiplier")]
    pub wheel_multiplier: f64,
    /// Frame rate of the animation loop
    #[serde(default = "default_fps")]
    pub fps: u32,
}

impl Default for SmoothScrollConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            duration_ms: default_smooth_duration(),
            easing: default_smooth_easing(),
            anchor_offset: default_anchor_offset(),
            wheel_multiplier: default_wheel_multiplier(),
            fps: default_fps(),
        }
    }
}

impl SmoothScrollConfig {
    #[inline]
    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    #[inline]
    pub fn tick_duration(&self) -> Duration {
        if self.fps == 0 {
            Duration::from_millis(16) // ~60fps fallback
        } else {
            Duration::from_millis((1000 / self.fps as u64).max(1))
        }
    }

    /// Smooth scrolling is effectively on
    #[inline]
    pub fn is_smooth(&self) -> bool {
        self.enabled && self.duration_ms > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Minimum gap between scroll handler runs
    #[serde(default = "default_throttle_interval")]
    pub interval_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_throttle_interval(),
        }
    }
}

impl ThrottleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_segment_duration() -> u64 {
    2000
}

fn default_draw_easing() -> Easing {
    Easing::from_name("inOut(3)")
}

fn default_scroll_threshold() -> f64 {
    0.1
}

pub(crate) fn default_keyframes() -> Vec<DrawFrame> {
    vec![
        DrawFrame::new(0.0, 0.0),
        DrawFrame::new(0.0, 1.0),
        DrawFrame::new(1.0, 1.0),
    ]
}

fn default_smooth_duration() -> u64 {
    1200
}

fn default_smooth_easing() -> Easing {
    Easing::ExpoOut
}

fn default_anchor_offset() -> f64 {
    100.0
}

fn default_wheel_multiplier() -> f64 {
    1.0
}

fn default_fps() -> u32 {
    60
}

fn default_throttle_interval() -> u64 {
    16
}

/// One canonical reveal per page section
fn default_sections() -> BTreeMap<String, RevealProps> {
    let preset = |direction, delay_ms, duration_ms| RevealProps {
        direction,
        delay_ms,
        duration_ms,
        ..RevealProps::default()
    };
    BTreeMap::from([
        ("hero".to_string(), preset(RevealDirection::Up, 0, 800)),
        ("about".to_string(), preset(RevealDirection::Left, 100, 600)),
        ("projects".to_string(), preset(RevealDirection::Up, 0, 600)),
        ("skills".to_string(), preset(RevealDirection::Scale, 0, 600)),
        ("contact".to_string(), preset(RevealDirection::Right, 200, 600)),
    ])
}

impl MotionConfig {
    /// Load configuration from the default path or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file, defaults when it does not exist
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to the default path
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Get the configuration file path
    /// Always uses ~/.config/scrollcue/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("scrollcue")
            .join("config.toml")
    }

    /// Reveal preset for a section, falling back to the `[reveal]` defaults
    pub fn section(&self, name: &str) -> RevealProps {
        self.sections.get(name).copied().unwrap_or(self.reveal)
    }
}
