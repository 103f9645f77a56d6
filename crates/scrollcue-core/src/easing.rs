//! Easing curves for draw, reveal and smooth-scroll animations
//!
//! Every curve maps progress in [0, 1] to an eased value. Named curves resolve
//! through a fixed table of cubic-bezier control points; explicit control
//! points can be given as a 4-element array.
//!
//! Name lookup never fails at the animation boundary: `Easing::from_name`
//! falls back to ease-in-out for names it does not know. Use `str::parse` when
//! an unknown name should be reported instead.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// Cubic-bezier timing curve with fixed end points (0,0) and (1,1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl CubicBezier {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// CSS `ease`
    pub const EASE: Self = Self::new(0.25, 0.1, 0.25, 1.0);
    /// CSS `ease-in`
    pub const EASE_IN: Self = Self::new(0.42, 0.0, 1.0, 1.0);
    /// CSS `ease-out`
    pub const EASE_OUT: Self = Self::new(0.0, 0.0, 0.58, 1.0);
    /// CSS `ease-in-out`, also the fallback for unknown names
    pub const EASE_IN_OUT: Self = Self::new(0.42, 0.0, 0.58, 1.0);
    pub const SMOOTH: Self = Self::new(0.25, 0.1, 0.25, 1.0);
    pub const BOUNCY: Self = Self::new(0.68, -0.55, 0.265, 1.55);
    pub const ELASTIC: Self = Self::new(0.175, 0.885, 0.32, 1.275);
    /// Entrance curve used by section reveals
    pub const REVEAL: Self = Self::new(0.25, 0.25, 0.25, 0.75);

    /// `inOut(n)` family: `(0.25, 0.1 * n, 0.25, 1)`
    pub fn in_out(strength: f64) -> Self {
        Self::new(0.25, 0.1 * strength, 0.25, 1.0)
    }

    /// Evaluate the curve's y for a given x (time) in [0, 1]
    pub fn apply(&self, progress: f64) -> f64 {
        if progress <= 0.0 {
            return 0.0;
        }
        if progress >= 1.0 {
            return 1.0;
        }
        // x control points outside [0, 1] make the curve non-invertible
        let x1 = self.x1.clamp(0.0, 1.0);
        let x2 = self.x2.clamp(0.0, 1.0);
        let t = solve_curve_x(x1, x2, progress);
        sample_curve(self.y1, self.y2, t)
    }

    fn to_array(self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// One coordinate of the bezier at parameter t:
/// 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³
#[inline]
fn sample_curve(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t
}

#[inline]
fn sample_curve_derivative(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * p1 + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}

/// Find t such that x(t) == target. Newton-Raphson first, bisection when the
/// slope flattens out.
fn solve_curve_x(x1: f64, x2: f64, target: f64) -> f64 {
    const EPSILON: f64 = 1e-7;

    let mut t = target;
    for _ in 0..8 {
        let err = sample_curve(x1, x2, t) - target;
        if err.abs() < EPSILON {
            return t;
        }
        let slope = sample_curve_derivative(x1, x2, t);
        if slope.abs() < 1e-6 {
            break;
        }
        t -= err / slope;
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    t = target;
    for _ in 0..64 {
        let x = sample_curve(x1, x2, t);
        if (x - target).abs() < EPSILON {
            break;
        }
        if x < target {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) / 2.0;
    }
    t
}

/// Easing curve selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    /// Jump to the end value on completion
    Step,
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    /// f(t) = 1 - (1-t)³
    CubicOut,
    /// f(t) = 1 - (1-t)⁵
    QuinticOut,
    /// f(t) = min(1, 1.001 - 2^(-10t))
    ExpoOut,
    Bounce,
    Bezier(CubicBezier),
}

impl Default for Easing {
    fn default() -> Self {
        Easing::Bezier(CubicBezier::EASE_IN_OUT)
    }
}

impl Easing {
    /// Apply the easing curve to a progress value in [0, 1]
    pub fn apply(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Step => {
                if t < 1.0 {
                    0.0
                } else {
                    1.0
                }
            }
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => t * (2.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::CubicOut => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
            Easing::QuinticOut => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv * inv * inv
            }
            Easing::ExpoOut => (1.001 - 2.0_f64.powf(-10.0 * t)).min(1.0),
            Easing::Bounce => bounce_out(t),
            Easing::Bezier(curve) => curve.apply(t),
        }
    }

    /// Look up a named curve. Returns `None` for unknown names.
    pub fn named(name: &str) -> Option<Easing> {
        let name = name.trim();
        let easing = match name {
            "step" | "none" => Easing::Step,
            "linear" => Easing::Linear,
            "ease" => Easing::Bezier(CubicBezier::EASE),
            "easeIn" | "ease-in" => Easing::Bezier(CubicBezier::EASE_IN),
            "easeOut" | "ease-out" => Easing::Bezier(CubicBezier::EASE_OUT),
            "easeInOut" | "ease-in-out" => Easing::Bezier(CubicBezier::EASE_IN_OUT),
            "smooth" => Easing::Bezier(CubicBezier::SMOOTH),
            "bouncy" => Easing::Bezier(CubicBezier::BOUNCY),
            "elastic" => Easing::Bezier(CubicBezier::ELASTIC),
            "reveal" => Easing::Bezier(CubicBezier::REVEAL),
            "quadIn" => Easing::QuadIn,
            "quadOut" => Easing::QuadOut,
            "quadInOut" => Easing::QuadInOut,
            "cubic" | "cubicOut" => Easing::CubicOut,
            "quintic" | "quinticOut" => Easing::QuinticOut,
            "expoOut" | "easeOutExpo" => Easing::ExpoOut,
            "bounce" => Easing::Bounce,
            _ => return parse_in_out(name).map(|strength| Easing::Bezier(CubicBezier::in_out(strength))),
        };
        Some(easing)
    }

    /// Resolve a named curve, falling back to ease-in-out for unknown names
    pub fn from_name(name: &str) -> Easing {
        Self::named(name).unwrap_or_else(|| {
            tracing::warn!(easing = name, "Unknown easing name, falling back to ease-in-out");
            Easing::default()
        })
    }

    /// Canonical name for table curves, `None` for arbitrary control points
    pub fn name(&self) -> Option<&'static str> {
        let name = match self {
            Easing::Step => "step",
            Easing::Linear => "linear",
            Easing::QuadIn => "quadIn",
            Easing::QuadOut => "quadOut",
            Easing::QuadInOut => "quadInOut",
            Easing::CubicOut => "cubicOut",
            Easing::QuinticOut => "quinticOut",
            Easing::ExpoOut => "expoOut",
            Easing::Bounce => "bounce",
            Easing::Bezier(curve) => {
                // SMOOTH shares EASE's control points and reports as "ease"
                const TABLE: [(CubicBezier, &str); 7] = [
                    (CubicBezier::EASE, "ease"),
                    (CubicBezier::EASE_IN, "easeIn"),
                    (CubicBezier::EASE_OUT, "easeOut"),
                    (CubicBezier::EASE_IN_OUT, "easeInOut"),
                    (CubicBezier::BOUNCY, "bouncy"),
                    (CubicBezier::ELASTIC, "elastic"),
                    (CubicBezier::REVEAL, "reveal"),
                ];
                return TABLE
                    .iter()
                    .find(|(points, _)| points == curve)
                    .map(|(_, name)| *name);
            }
        };
        Some(name)
    }
}

fn in_out_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^inOut\((\d+(?:\.\d+)?)\)$").ok())
        .as_ref()
}

/// Strength of an `inOut(n)` name
fn parse_in_out(name: &str) -> Option<f64> {
    in_out_pattern()?
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn bounce_out(t: f64) -> f64 {
    const N: f64 = 7.5625;
    const D: f64 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984375
    }
}

impl From<CubicBezier> for Easing {
    fn from(curve: CubicBezier) -> Self {
        Easing::Bezier(curve)
    }
}

impl From<[f64; 4]> for Easing {
    fn from(points: [f64; 4]) -> Self {
        Easing::Bezier(CubicBezier::new(points[0], points[1], points[2], points[3]))
    }
}

impl FromStr for Easing {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::named(s).ok_or_else(|| Error::InvalidEasing(s.to_string()))
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name(), self) {
            (Some(name), _) => f.write_str(name),
            (None, Easing::Bezier(c)) => {
                write!(f, "cubic-bezier({}, {}, {}, {})", c.x1, c.y1, c.x2, c.y2)
            }
            (None, _) => f.write_str("easeInOut"),
        }
    }
}

impl Serialize for Easing {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match (self.name(), self) {
            (Some(name), _) => serializer.serialize_str(name),
            (None, Easing::Bezier(curve)) => curve.to_array().serialize(serializer),
            (None, _) => serializer.serialize_str("easeInOut"),
        }
    }
}

// Accept either a curve name or four control points
impl<'de> Deserialize<'de> for Easing {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EasingVisitor;

        impl<'de> Visitor<'de> for EasingVisitor {
            type Value = Easing;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an easing name or an array of four control points")
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Easing, E>
            where
                E: de::Error,
            {
                Ok(Easing::from_name(value))
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Easing, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut points = [0.0; 4];
                for (i, point) in points.iter_mut().enumerate() {
                    *point = seq
                        .next_element()?
                        .ok_or_else(|| de::Error::invalid_length(i, &self))?;
                }
                if seq.next_element::<f64>()?.is_some() {
                    return Err(de::Error::invalid_length(5, &self));
                }
                Ok(Easing::from(points))
            }
        }

        deserializer.deserialize_any(EasingVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 10] = [
        Easing::Linear,
        Easing::QuadIn,
        Easing::QuadOut,
        Easing::QuadInOut,
        Easing::CubicOut,
        Easing::QuinticOut,
        Easing::ExpoOut,
        Easing::Bounce,
        Easing::Bezier(CubicBezier::EASE),
        Easing::Bezier(CubicBezier::EASE_IN_OUT),
    ];

    #[test]
    fn test_easing_boundaries() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 0.002, "{:?} at t=0", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 0.001, "{:?} at t=1", easing);
        }
        assert_eq!(Easing::Step.apply(0.99), 0.0);
        assert_eq!(Easing::Step.apply(1.0), 1.0);
    }

    #[test]
    fn test_easing_monotonic() {
        for easing in ALL.into_iter().filter(|e| *e != Easing::Bounce) {
            let mut prev = -0.01;
            for i in 0..=20 {
                let t = i as f64 / 20.0;
                let v = easing.apply(t);
                assert!(v >= prev, "{:?} not monotonic at t={}", easing, t);
                prev = v;
            }
        }
    }

    #[test]
    fn test_linear_bezier_is_identity() {
        let linear = CubicBezier::new(0.0, 0.0, 1.0, 1.0);
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            assert!((linear.apply(t) - t).abs() < 1e-4);
        }
    }

    #[test]
    fn test_ease_in_out_is_symmetric() {
        let curve = CubicBezier::EASE_IN_OUT;
        assert!((curve.apply(0.5) - 0.5).abs() < 1e-4);
        let a = curve.apply(0.25);
        let b = curve.apply(0.75);
        assert!((a + b - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_bouncy_overshoots() {
        let bouncy = Easing::from_name("bouncy");
        let peak = (1..100)
            .map(|i| bouncy.apply(i as f64 / 100.0))
            .fold(f64::MIN, f64::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn test_in_out_strength() {
        assert_eq!(
            Easing::from_name("inOut(3)"),
            Easing::Bezier(CubicBezier::new(0.25, 0.1 * 3.0, 0.25, 1.0))
        );
        assert_eq!(
            Easing::from_name("inOut(1.5)"),
            Easing::Bezier(CubicBezier::in_out(1.5))
        );
    }

    #[test]
    fn test_unknown_name_falls_back() {
        assert_eq!(Easing::from_name("wobbly"), Easing::default());
        assert_eq!(Easing::from_name("inOut()"), Easing::default());
        assert!("wobbly".parse::<Easing>().is_err());
    }

    #[test]
    fn test_deserialize_name_or_points() {
        #[derive(Deserialize)]
        struct Wrapper {
            easing: Easing,
        }

        let named: Wrapper = toml::from_str(r#"easing = "smooth""#).unwrap();
        assert_eq!(named.easing, Easing::Bezier(CubicBezier::SMOOTH));

        let points: Wrapper = toml::from_str("easing = [0.1, 0.2, 0.3, 0.4]").unwrap();
        assert_eq!(points.easing, Easing::from([0.1, 0.2, 0.3, 0.4]));

        assert!(toml::from_str::<Wrapper>("easing = [0.1, 0.2]").is_err());
    }

    #[test]
    fn test_display_uses_names() {
        assert_eq!(Easing::ExpoOut.to_string(), "expoOut");
        assert_eq!(
            Easing::from([0.1, 0.2, 0.3, 0.4]).to_string(),
            "cubic-bezier(0.1, 0.2, 0.3, 0.4)"
        );
    }
}
