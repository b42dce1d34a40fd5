//! Weight conversion and two-tier display formatting.
//!
//! All weights enter and leave storage in grams. Display values are derived here
//! on demand and never written back.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Grams in one avoirdupois ounce.
pub const GRAMS_PER_OUNCE: f64 = 28.34952;

const OUNCES_PER_POUND: f64 = 16.0;
const GRAMS_PER_KILOGRAM: f64 = 1000.0;

/// The unit system a user has chosen for display and entry.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn from_imperial(imperial: bool) -> Self {
        if imperial {
            Self::Imperial
        } else {
            Self::Metric
        }
    }

    pub fn is_imperial(&self) -> bool {
        matches!(self, Self::Imperial)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "metric" => Some(Self::Metric),
            "imperial" => Some(Self::Imperial),
            _ => None,
        }
    }

    /// Unit of a single-field display value ("g" or "oz").
    pub fn entry_unit(&self) -> &'static str {
        match self {
            Self::Metric => "g",
            Self::Imperial => "oz",
        }
    }

    fn major_unit(&self) -> &'static str {
        match self {
            Self::Metric => "Kg",
            Self::Imperial => "Lb",
        }
    }

    fn minor_unit(&self) -> &'static str {
        match self {
            Self::Metric => "Grams",
            Self::Imperial => "Oz",
        }
    }

    fn minor_per_major(&self) -> f64 {
        match self {
            Self::Metric => GRAMS_PER_KILOGRAM,
            Self::Imperial => OUNCES_PER_POUND,
        }
    }
}

/// Grams to the single-field display value: ounces for imperial, grams otherwise.
pub fn to_display_value(weight_grams: f64, system: UnitSystem) -> f64 {
    match system {
        UnitSystem::Imperial => weight_grams / GRAMS_PER_OUNCE,
        UnitSystem::Metric => weight_grams,
    }
}

/// Inverse of [`to_display_value`]; used when persisting user-entered weight.
pub fn from_display_value(value: f64, system: UnitSystem) -> f64 {
    match system {
        UnitSystem::Imperial => value * GRAMS_PER_OUNCE,
        UnitSystem::Metric => value,
    }
}

/// A weight split into a whole major unit and a fractional minor remainder,
/// e.g. `2 Kg 500.0 Grams` or `3 Lb 4.2 Oz`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MajorMinor {
    pub major: i64,
    pub minor: f64,
    pub system: UnitSystem,
}

impl MajorMinor {
    /// Canonical grams represented by this split.
    pub fn to_grams(&self) -> f64 {
        let primary = self.major as f64 * self.system.minor_per_major() + self.minor;
        from_display_value(primary, self.system)
    }
}

impl fmt::Display for MajorMinor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {:.1} {}",
            self.major,
            self.system.major_unit(),
            self.minor,
            self.system.minor_unit()
        )
    }
}

/// Split a gram weight into major and minor units.
///
/// The primary value (ounces or grams) is rounded to the displayed precision
/// before splitting, so a remainder never prints as a full major unit
/// ("16.0 Oz", "1000.0 Grams").
pub fn split_major_minor(weight_grams: f64, system: UnitSystem) -> MajorMinor {
    let primary = round_tenth(to_display_value(weight_grams, system));
    let divisor = system.minor_per_major();
    let major = (primary / divisor).floor();
    let minor = round_tenth((primary - major * divisor).max(0.0));

    MajorMinor {
        major: major as i64,
        minor,
        system,
    }
}

/// Format a gram weight as `"{major} {majorUnit} {minor:.1} {minorUnit}"`.
pub fn format_major_minor(weight_grams: f64, system: UnitSystem) -> String {
    split_major_minor(weight_grams, system).to_string()
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_metric() {
        assert_eq!(format_major_minor(0.0, UnitSystem::Metric), "0 Kg 0.0 Grams");
    }

    #[test]
    fn test_zero_imperial() {
        assert_eq!(format_major_minor(0.0, UnitSystem::Imperial), "0 Lb 0.0 Oz");
    }

    #[test]
    fn test_kilograms_and_grams() {
        assert_eq!(
            format_major_minor(2500.0, UnitSystem::Metric),
            "2 Kg 500.0 Grams"
        );
        assert_eq!(format_major_minor(999.4, UnitSystem::Metric), "0 Kg 999.4 Grams");
    }

    #[test]
    fn test_exact_pound() {
        assert_eq!(
            format_major_minor(16.0 * GRAMS_PER_OUNCE, UnitSystem::Imperial),
            "1 Lb 0.0 Oz"
        );
    }

    #[test]
    fn test_near_pound_carries_into_major() {
        assert_eq!(
            format_major_minor(453.592, UnitSystem::Imperial),
            "1 Lb 0.0 Oz"
        );
        assert_eq!(format_major_minor(999.97, UnitSystem::Metric), "1 Kg 0.0 Grams");
    }

    #[test]
    fn test_pounds_and_ounces() {
        // 52.2 oz
        let grams = 52.2 * GRAMS_PER_OUNCE;
        assert_eq!(format_major_minor(grams, UnitSystem::Imperial), "3 Lb 4.2 Oz");
    }

    #[test]
    fn test_display_value_round_trip() {
        for grams in [0.0, 1.0, 28.34952, 742.5, 12_345.678] {
            let oz = to_display_value(grams, UnitSystem::Imperial);
            let back = from_display_value(oz, UnitSystem::Imperial);
            assert!((back - grams).abs() < 1e-9);
            assert_eq!(to_display_value(grams, UnitSystem::Metric), grams);
        }
    }

    #[test]
    fn test_major_minor_round_trip_within_tolerance() {
        for grams in [0.0, 3.3, 100.0, 453.592, 1_234.5, 9_876.54, 50_000.0] {
            let split = split_major_minor(grams, UnitSystem::Imperial);
            let error_oz = (split.to_grams() - grams).abs() / GRAMS_PER_OUNCE;
            assert!(error_oz <= 0.05 + 1e-9, "{grams} g drifted {error_oz} oz");
        }
    }

    #[test]
    fn test_unit_system_strings() {
        assert_eq!(UnitSystem::from_str("imperial"), Some(UnitSystem::Imperial));
        assert_eq!(UnitSystem::from_str("stone"), None);
        assert_eq!(UnitSystem::Metric.as_str(), "metric");
        assert!(UnitSystem::from_imperial(true).is_imperial());
    }
}
