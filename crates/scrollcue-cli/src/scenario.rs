use std::path::Path;

use serde::{Deserialize, Deserializer};

use scrollcue_core::{
    config::DrawConfig, draw::parse_keyframes, stagger, AnimationConfig, Delay, DrawFrame, Easing, Error, MotionConfig,
    Result, RevealProps,
};

/// A scripted scroll session
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
    pub document_height: f64,
    /// Total simulated time; defaults to the last waypoint plus settle time
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    #[serde(default)]
    pub elements: Vec<ScenarioElement>,
}

/// Smooth-scroll to `y` at `at_ms`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Waypoint {
    pub at_ms: u64,
    pub y: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioElement {
    pub name: String,
    /// Page offset of the element's top edge
    pub top: f64,
    pub height: f64,
    /// Section preset from the config; explicit `reveal` wins
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub reveal: Option<RevealProps>,
    #[serde(default)]
    pub draw: Option<DrawSpec>,
}

/// Path drawing attached to an element
#[derive(Debug, Clone, Deserialize)]
pub struct DrawSpec {
    #[serde(default = "default_path_length")]
    pub path_length: f64,
    #[serde(default, deserialize_with = "optional_keyframes")]
    pub keyframes: Option<Vec<DrawFrame>>,
    #[serde(default)]
    pub delay_ms: f64,
    /// Per-segment stagger added on top of `delay_ms`
    #[serde(default)]
    pub stagger_ms: Option<f64>,
    #[serde(default)]
    pub easing: Option<Easing>,
    #[serde(default)]
    pub autoplay_sync: bool,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub segment_duration_ms: Option<u64>,
}

fn optional_keyframes<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<DrawFrame>>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<String>>::deserialize(deserializer)?;
    Ok(values.map(|values| parse_keyframes(&values)))
}

fn default_viewport_width() -> f64 {
    1280.0
}

fn default_viewport_height() -> f64 {
    800.0
}

fn default_path_length() -> f64 {
    1000.0
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let scenario: Scenario =
            toml::from_str(content).map_err(|e| Error::Scenario(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        if !(self.viewport_height.is_finite() && self.viewport_height > 0.0) {
            return Err(Error::Scenario("viewport_height must be positive".into()));
        }
        if !self.document_height.is_finite() {
            return Err(Error::Scenario("document_height must be finite".into()));
        }
        if self.waypoints.windows(2).any(|pair| pair[1].at_ms < pair[0].at_ms) {
            return Err(Error::Scenario("waypoints must be in time order".into()));
        }
        if let Some(element) = self.elements.iter().find(|e| e.height < 0.0) {
            return Err(Error::Scenario(format!("element {} has negative height", element.name)));
        }
        Ok(())
    }

    pub fn max_scroll(&self) -> f64 {
        (self.document_height - self.viewport_height).max(0.0)
    }

    /// Simulated time span
    pub fn duration_ms(&self, config: &MotionConfig) -> u64 {
        self.duration_ms.unwrap_or_else(|| {
            let last = self.waypoints.last().map(|w| w.at_ms).unwrap_or(0);
            last + config.smooth_scroll.duration_ms + 2 * config.draw.segment_duration_ms
        })
    }
}

impl ScenarioElement {
    /// Reveal props for this element, if it reveals at all
    pub fn reveal_props(&self, config: &MotionConfig) -> Option<RevealProps> {
        self.reveal
            .or_else(|| self.section.as_deref().map(|name| config.section(name)))
    }
}

impl DrawSpec {
    pub fn animation_config(&self, defaults: &DrawConfig) -> AnimationConfig {
        let mut config = AnimationConfig::from(defaults).autoplay_sync(self.autoplay_sync);
        if let Some(keyframes) = &self.keyframes {
            config = config.with_keyframes(keyframes.iter().copied());
        }
        config = match self.stagger_ms {
            Some(unit) => config.with_delay(Delay::Staggered {
                base_ms: self.delay_ms,
                stagger: stagger(unit),
            }),
            None => config.with_delay(self.delay_ms),
        };
        if let Some(easing) = self.easing {
            config = config.with_easing(easing);
        }
        if let Some(threshold) = self.threshold {
            config = config.with_threshold(threshold);
        }
        if let Some(ms) = self.segment_duration_ms {
            config = config.with_segment_duration(std::time::Duration::from_millis(ms));
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
        document_height = 4000

        [[waypoints]]
        at_ms = 0
        y = 0

        [[waypoints]]
        at_ms = 500
        y = 1800

        [[elements]]
        name = "hero"
        top = 0
        height = 800
        section = "hero"

        [[elements]]
        name = "divider"
        top = 2000
        height = 40
        [elements.draw]
        keyframes = ["0 0", "0 1"]
        stagger_ms = 40
        easing = "smooth"
    "#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_toml(SCENARIO).unwrap();
        assert_eq!(scenario.viewport_height, 800.0);
        assert_eq!(scenario.max_scroll(), 3200.0);
        assert_eq!(scenario.waypoints.len(), 2);

        let config = MotionConfig::default();
        let hero = &scenario.elements[0];
        assert_eq!(hero.reveal_props(&config), Some(config.section("hero")));
        assert!(scenario.elements[1].reveal_props(&config).is_none());

        let draw = scenario.elements[1].draw.as_ref().unwrap();
        let animation = draw.animation_config(&config.draw);
        assert_eq!(animation.keyframes.len(), 2);
        assert_eq!(animation.delay.delay_ms(2), 80.0);
        assert_eq!(animation.easing, Easing::from_name("smooth"));
    }

    #[test]
    fn test_default_duration() {
        let scenario = Scenario::from_toml(SCENARIO).unwrap();
        let config = MotionConfig::default();
        assert_eq!(scenario.duration_ms(&config), 500 + 1200 + 4000);
    }

    #[test]
    fn test_rejects_unordered_waypoints() {
        let err = Scenario::from_toml(
            r#"
            document_height = 2000
            waypoints = [{ at_ms = 100, y = 0 }, { at_ms = 50, y = 10 }]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Scenario(_)));
    }

    #[test]
    fn test_bad_keyframes_use_default_draw() {
        let scenario = Scenario::from_toml(
            r#"
            document_height = 2000

            [[elements]]
            name = "rule"
            top = 100
            height = 2
            [elements.draw]
            keyframes = ["0 0", "0 2"]
            "#,
        )
        .unwrap();
        let draw = scenario.elements[0].draw.as_ref().unwrap();
        assert_eq!(draw.keyframes, Some(MotionConfig::default().draw.keyframes));
    }

    #[test]
    fn test_missing_document_height() {
        assert!(Scenario::from_toml("viewport_height = 800").is_err());
    }
}
