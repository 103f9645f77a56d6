//! Element bounds, root margins and intersection ratios

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Axis-aligned rectangle in page or viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Overlapping region, `None` when the rectangles do not touch
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < left || bottom < top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Shift vertically, e.g. page coordinates into viewport coordinates
    pub fn translate_y(&self, dy: f64) -> Rect {
        Rect::new(self.x, self.y + dy, self.width, self.height)
    }
}

/// One side of a root margin
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarginValue {
    Px(f64),
    Percent(f64),
}

impl MarginValue {
    fn resolve(&self, extent: f64) -> f64 {
        match *self {
            MarginValue::Px(px) => px,
            MarginValue::Percent(pct) => extent * pct / 100.0,
        }
    }
}

impl FromStr for MarginValue {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parse = |num: &str| {
            num.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| Error::InvalidMargin(s.to_string()))
        };
        if let Some(num) = s.strip_suffix("px") {
            Ok(MarginValue::Px(parse(num)?))
        } else if let Some(num) = s.strip_suffix('%') {
            Ok(MarginValue::Percent(parse(num)?))
        } else if parse(s)? == 0.0 {
            // bare zero is the only unitless value CSS allows
            Ok(MarginValue::Px(0.0))
        } else {
            Err(Error::InvalidMargin(s.to_string()))
        }
    }
}

impl fmt::Display for MarginValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginValue::Px(v) => write!(f, "{}px", v),
            MarginValue::Percent(v) => write!(f, "{}%", v),
        }
    }
}

/// CSS-style margin that grows (positive) or shrinks (negative) the root
/// bounds before intersection is computed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RootMargin {
    pub top: MarginValue,
    pub right: MarginValue,
    pub bottom: MarginValue,
    pub left: MarginValue,
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::uniform(MarginValue::Px(-50.0))
    }
}

impl RootMargin {
    pub fn uniform(value: MarginValue) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn zero() -> Self {
        Self::uniform(MarginValue::Px(0.0))
    }

    /// Parse leniently: malformed input falls back to the default margin
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default root margin");
            Self::default()
        })
    }

    /// Apply the margin to root bounds
    pub fn apply(&self, root: &Rect) -> Rect {
        let top = self.top.resolve(root.height);
        let right = self.right.resolve(root.width);
        let bottom = self.bottom.resolve(root.height);
        let left = self.left.resolve(root.width);
        Rect::new(
            root.x - left,
            root.y - top,
            (root.width + left + right).max(0.0),
            (root.height + top + bottom).max(0.0),
        )
    }
}

impl FromStr for RootMargin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split_whitespace()
            .map(str::parse::<MarginValue>)
            .collect::<Result<Vec<MarginValue>>>()?;
        // CSS shorthand expansion
        let (top, right, bottom, left) = match values.as_slice() {
            [all] => (*all, *all, *all, *all),
            [vertical, horizontal] => (*vertical, *horizontal, *vertical, *horizontal),
            [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
            [top, right, bottom, left] => (*top, *right, *bottom, *left),
            _ => return Err(Error::InvalidMargin(s.to_string())),
        };
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

/// Config files go through the lenient path
impl From<String> for RootMargin {
    fn from(value: String) -> Self {
        Self::parse_or_default(&value)
    }
}

impl From<RootMargin> for String {
    fn from(margin: RootMargin) -> String {
        margin.to_string()
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.top == self.right && self.top == self.bottom && self.top == self.left {
            write!(f, "{}", self.top)
        } else {
            write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
        }
    }
}

/// Fraction of `target` visible inside `root` after applying `margin`
///
/// Zero-area targets report 1.0 while they touch the root and 0.0 otherwise.
pub fn intersection_ratio(target: &Rect, root: &Rect, margin: &RootMargin) -> f64 {
    let root = margin.apply(root);
    match target.intersection(&root) {
        None => 0.0,
        Some(_) if target.area() == 0.0 => 1.0,
        Some(overlap) => (overlap.area() / target.area()).clamp(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_margin_shorthand() {
        let m: RootMargin = "-50px".parse().unwrap();
        assert_eq!(m, RootMargin::default());

        let m: RootMargin = "-10% 0px -10% 0px".parse().unwrap();
        assert_eq!(m.top, MarginValue::Percent(-10.0));
        assert_eq!(m.right, MarginValue::Px(0.0));

        let m: RootMargin = "10px 0".parse().unwrap();
        assert_eq!(m.bottom, MarginValue::Px(10.0));
        assert_eq!(m.left, MarginValue::Px(0.0));
    }

    #[test]
    fn test_parse_margin_rejects_garbage() {
        assert!("".parse::<RootMargin>().is_err());
        assert!("12".parse::<RootMargin>().is_err());
        assert!("1px 2px 3px 4px 5px".parse::<RootMargin>().is_err());
        assert!("abcpx".parse::<RootMargin>().is_err());
        assert_eq!(RootMargin::parse_or_default("bogus"), RootMargin::default());
    }

    #[test]
    fn test_deserialize_bad_margin_falls_back() {
        #[derive(Deserialize)]
        struct Wrapper {
            margin: RootMargin,
        }
        let parsed: Wrapper = toml::from_str(r#"margin = "10px nonsense""#).unwrap();
        assert_eq!(parsed.margin, RootMargin::default());
        let parsed: Wrapper = toml::from_str(r#"margin = "0px""#).unwrap();
        assert_eq!(parsed.margin, RootMargin::zero());
    }

    #[test]
    fn test_margin_display_round_trip() {
        let m: RootMargin = "-10% 0px -10% 0px".parse().unwrap();
        assert_eq!(m.to_string(), "-10% 0px -10% 0px");
        assert_eq!(RootMargin::default().to_string(), "-50px");
    }

    #[test]
    fn test_ratio_fully_inside() {
        let root = Rect::new(0.0, 0.0, 1000.0, 800.0);
        let target = Rect::new(100.0, 100.0, 200.0, 200.0);
        assert_eq!(intersection_ratio(&target, &root, &RootMargin::zero()), 1.0);
    }

    #[test]
    fn test_ratio_partial_with_negative_margin() {
        let root = Rect::new(0.0, 0.0, 1000.0, 800.0);
        // bottom 100px of the target hangs below the viewport
        let target = Rect::new(100.0, 700.0, 100.0, 200.0);
        assert!((intersection_ratio(&target, &root, &RootMargin::zero()) - 0.5).abs() < 1e-9);
        // shrinking the root by 50px leaves 50 of 200px visible
        let ratio = intersection_ratio(&target, &root, &RootMargin::default());
        assert!((ratio - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_outside() {
        let root = Rect::new(0.0, 0.0, 1000.0, 800.0);
        let target = Rect::new(0.0, 900.0, 100.0, 100.0);
        assert_eq!(intersection_ratio(&target, &root, &RootMargin::zero()), 0.0);
    }
}
