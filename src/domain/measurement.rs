//! Imperial measurement codec
//!
//! Converts between the human-facing `X' Y"` notation and metric scene
//! units, and between polar (angle + distance) and cartesian (x, z)
//! placement on the ground plane.
//!
//! Parsing is lenient: each of feet and inches is taken from the first run
//! of digits directly followed by its mark, and anything missing counts as
//! zero. Conversions round-trip only up to the rounding in
//! [`ImperialMeasurement::from_meters`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Meters per foot
pub const METERS_PER_FOOT: f64 = 0.3048;

/// Meters per inch
pub const METERS_PER_INCH: f64 = 0.0254;

/// Feet per meter, as used when converting scene distances back
pub const FEET_PER_METER: f64 = 3.28084;

static FEET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)'").expect("feet pattern is valid"));

static INCHES_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\d+)""#).expect("inches pattern is valid"));

/// A feet + inches pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImperialMeasurement {
    pub feet: i32,
    pub inches: i32,
}

impl ImperialMeasurement {
    pub fn new(feet: i32, inches: i32) -> Self {
        Self { feet, inches }
    }

    /// Parses `X' Y"` leniently; garbage yields `0' 0"`
    ///
    /// A digit run too long for an `i32` counts as missing and parses as 0.
    pub fn parse(text: &str) -> Self {
        Self {
            feet: first_capture(&FEET_PATTERN, text),
            inches: first_capture(&INCHES_PATTERN, text),
        }
    }

    /// Converts to meters: `feet * 0.3048 + inches * 0.0254`
    pub fn to_meters(self) -> f64 {
        f64::from(self.feet) * METERS_PER_FOOT + f64::from(self.inches) * METERS_PER_INCH
    }

    /// Converts meters to whole feet and rounded inches
    ///
    /// Inches that round up to 12 carry into the next foot. Feet beyond the
    /// `i32` range saturate.
    pub fn from_meters(meters: f64) -> Self {
        let total_feet = meters * FEET_PER_METER;
        let mut feet = total_feet.floor();
        let mut inches = ((total_feet - feet) * 12.0).round();

        // Carry in f64 so the cast below saturates instead of overflowing
        if inches >= 12.0 {
            feet += 1.0;
            inches = 0.0;
        }

        Self::new(feet as i32, inches as i32)
    }

    /// Carries whole feet out of the inches field
    pub fn normalized(self) -> Self {
        let total = self.feet * 12 + self.inches;
        Self::new(total.div_euclid(12), total.rem_euclid(12))
    }
}

impl fmt::Display for ImperialMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}' {}\"", self.feet, self.inches)
    }
}

impl FromStr for ImperialMeasurement {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

fn first_capture(pattern: &Regex, text: &str) -> i32 {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Formats a whole number of feet, e.g. `45' 0"`
pub fn format_feet_only(feet: i32) -> String {
    ImperialMeasurement::new(feet, 0).to_string()
}

/// Formats a number of inches, carrying whole feet, e.g. 30 -> `2' 6"`
pub fn format_inches_only(inches: i32) -> String {
    ImperialMeasurement::new(0, inches).normalized().to_string()
}

/// Parses an imperial string straight to meters
pub fn imperial_to_distance(text: &str) -> f64 {
    ImperialMeasurement::parse(text).to_meters()
}

/// Formats a metric distance as an imperial string
pub fn distance_to_imperial(meters: f64) -> String {
    ImperialMeasurement::from_meters(meters).to_string()
}

/// Angle (degrees, clockwise from +z seen from above) and distance to (x, z)
pub fn polar_to_cartesian(angle_degrees: f64, distance: f64) -> (f64, f64) {
    let radians = angle_degrees.to_radians();
    (radians.sin() * distance, radians.cos() * distance)
}

/// (x, z) to angle in `[0, 360)` degrees and distance
///
/// At the origin the angle is degenerate and reported as 0.
pub fn cartesian_to_polar(x: f64, z: f64) -> (f64, f64) {
    let distance = x.hypot(z);
    let mut angle = x.atan2(z).to_degrees();

    if angle < 0.0 {
        angle += 360.0;
    }
    if angle >= 360.0 {
        angle -= 360.0;
    }

    (angle, distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn parses_feet_and_inches() {
        assert_eq!(ImperialMeasurement::parse("22' 6\""), ImperialMeasurement::new(22, 6));
        assert_eq!(ImperialMeasurement::parse("27'0\""), ImperialMeasurement::new(27, 0));
    }

    #[test]
    fn missing_parts_default_to_zero() {
        assert_eq!(ImperialMeasurement::parse("12'"), ImperialMeasurement::new(12, 0));
        assert_eq!(ImperialMeasurement::parse("9\""), ImperialMeasurement::new(0, 9));
    }

    #[test]
    fn garbage_parses_to_zero() {
        assert_eq!(ImperialMeasurement::parse(""), ImperialMeasurement::default());
        assert_eq!(ImperialMeasurement::parse("tall"), ImperialMeasurement::default());
        assert_eq!(ImperialMeasurement::parse("12 6"), ImperialMeasurement::default());
    }

    #[test]
    fn parse_drops_sign() {
        // Only digits are captured, so a leading minus is lost
        assert_eq!(ImperialMeasurement::parse("-2' 0\""), ImperialMeasurement::new(2, 0));
    }

    #[test]
    fn parse_overflow_is_zero() {
        assert_eq!(
            ImperialMeasurement::parse("99999999999' 3\""),
            ImperialMeasurement::new(0, 3)
        );
    }

    #[test]
    fn format_does_not_normalize() {
        assert_eq!(ImperialMeasurement::new(3, 14).to_string(), "3' 14\"");
        assert_eq!(ImperialMeasurement::new(3, 14).normalized().to_string(), "4' 2\"");
    }

    #[test]
    fn from_str_is_lenient() {
        let m: ImperialMeasurement = "x".parse().unwrap();
        assert_eq!(m, ImperialMeasurement::default());
    }

    #[test]
    fn to_meters_uses_exact_factors() {
        assert!((ImperialMeasurement::new(2, 0).to_meters() - 0.6096).abs() < EPS);
        assert!((ImperialMeasurement::new(0, 6).to_meters() - 0.1524).abs() < EPS);
        assert!((ImperialMeasurement::new(27, 3).to_meters() - 8.3058).abs() < EPS);
    }

    #[test]
    fn from_meters_carries_twelve_inches() {
        // 0.999 ft rounds to 12 inches and must carry
        let m = ImperialMeasurement::from_meters(1.999 / FEET_PER_METER);
        assert_eq!(m, ImperialMeasurement::new(2, 0));
    }

    #[test]
    fn from_meters_saturates_huge_distances() {
        // Feet land on i32::MAX and the inches still round up to 12
        let m = ImperialMeasurement::from_meters(2147483647.99 / FEET_PER_METER);
        assert_eq!(m, ImperialMeasurement::new(i32::MAX, 0));

        let m = ImperialMeasurement::from_meters(654552994.96);
        assert_eq!(m.feet, i32::MAX);
        assert_eq!(ImperialMeasurement::from_meters(-1e12).feet, i32::MIN);
    }

    #[test]
    fn from_meters_inverts_integer_inputs() {
        let m = ImperialMeasurement::new(45, 11);
        assert_eq!(ImperialMeasurement::from_meters(m.to_meters()), m);
    }

    #[test]
    fn non_integer_inches_are_not_exact() {
        // 1.5 inches does not survive the round trip; the codec rounds
        let meters = 1.5 * METERS_PER_INCH;
        assert_eq!(ImperialMeasurement::from_meters(meters), ImperialMeasurement::new(0, 2));
    }

    #[test]
    fn helper_formatters() {
        assert_eq!(format_feet_only(45), "45' 0\"");
        assert_eq!(format_inches_only(30), "2' 6\"");
        assert_eq!(format_inches_only(11), "0' 11\"");
        assert_eq!(distance_to_imperial(0.6096), "2' 0\"");
        assert!((imperial_to_distance("2' 0\"") - 0.6096).abs() < EPS);
    }

    #[test]
    fn polar_zero_points_along_positive_z() {
        let (x, z) = polar_to_cartesian(0.0, 2.0);
        assert!(x.abs() < EPS);
        assert!((z - 2.0).abs() < EPS);
    }

    #[test]
    fn polar_ninety_points_along_positive_x() {
        let (x, z) = polar_to_cartesian(90.0, 1.0);
        assert!((x - 1.0).abs() < EPS);
        assert!(z.abs() < EPS);
    }

    #[test]
    fn cartesian_to_polar_normalizes_negative_angles() {
        let (angle, distance) = cartesian_to_polar(-1.0, 0.0);
        assert!((angle - 270.0).abs() < EPS);
        assert!((distance - 1.0).abs() < EPS);
    }

    #[test]
    fn cartesian_origin_is_degenerate() {
        assert_eq!(cartesian_to_polar(0.0, 0.0), (0.0, 0.0));
    }
}
