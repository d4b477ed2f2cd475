use crate::error::{CheckError, Result};
use vsmon_common::types::MetricKind;

/// Unit tags reported by the performance statistics API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Percent,
    KiloBytes,
    Number,
    Joule,
    Watt,
}

impl std::str::FromStr for Unit {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "percent" => Ok(Unit::Percent),
            "kiloBytes" => Ok(Unit::KiloBytes),
            "number" => Ok(Unit::Number),
            "joule" => Ok(Unit::Joule),
            "watt" => Ok(Unit::Watt),
            _ => Err(CheckError::UnsupportedUnit(s.to_string())),
        }
    }
}

impl Unit {
    /// Scale a raw value into the reported value.
    ///
    /// Percentages become fractions in `[0, 1]`, kilobytes become bytes and the
    /// remaining units are reported as whole numbers. Truncation is toward zero
    /// and happens before any scaling.
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Unit::Percent => value / 100.0,
            Unit::KiloBytes => value.trunc() * 1024.0,
            Unit::Number | Unit::Joule | Unit::Watt => value.trunc(),
        }
    }
}

/// Convert a raw sample value tagged with `unit`.
///
/// # Errors
///
/// Returns [`CheckError::UnsupportedUnit`] for any unit outside
/// `percent`, `kiloBytes`, `number`, `joule` and `watt`, and
/// [`CheckError::NonFiniteValue`] for NaN or infinite values.
///
/// # Examples
///
/// ```
/// use vsmon_check::units::convert;
/// use vsmon_common::types::MetricKind;
///
/// assert_eq!(convert(42.0, "percent").unwrap(), (0.42, MetricKind::Gauge));
/// assert_eq!(convert(2.9, "kiloBytes").unwrap(), (2048.0, MetricKind::Gauge));
/// assert!(convert(1.0, "bogus").is_err());
/// ```
pub fn convert(value: f64, unit: &str) -> Result<(f64, MetricKind)> {
    let parsed: Unit = unit.parse()?;
    if !value.is_finite() {
        return Err(CheckError::NonFiniteValue {
            value,
            unit: unit.to_string(),
        });
    }
    Ok((parsed.apply(value), MetricKind::Gauge))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_scale_percent_to_fraction_without_rounding() {
        assert_eq!(convert(42.0, "percent").unwrap(), (0.42, MetricKind::Gauge));
        assert_eq!(convert(12.5, "percent").unwrap().0, 0.125);
        assert_eq!(convert(100.0, "percent").unwrap().0, 1.0);
    }

    #[test]
    fn should_truncate_kilobytes_before_scaling() {
        assert_eq!(convert(2.0, "kiloBytes").unwrap().0, 2048.0);
        assert_eq!(convert(2.99, "kiloBytes").unwrap().0, 2048.0);
        assert_eq!(convert(0.5, "kiloBytes").unwrap().0, 0.0);
    }

    #[test]
    fn should_truncate_whole_number_units() {
        for unit in ["number", "joule", "watt"] {
            let (value, kind) = convert(1500.7, unit).unwrap();
            assert_eq!(value, 1500.0, "unit {unit}");
            assert_eq!(kind, MetricKind::Gauge);
        }
    }

    #[test]
    fn should_truncate_negative_values_toward_zero() {
        assert_eq!(convert(-3.7, "number").unwrap().0, -3.0);
        assert_eq!(convert(-1.5, "kiloBytes").unwrap().0, -1024.0);
    }

    #[test]
    fn should_reject_non_finite_values() {
        for unit in ["percent", "kiloBytes", "number", "joule", "watt"] {
            for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
                assert!(
                    matches!(convert(value, unit), Err(CheckError::NonFiniteValue { .. })),
                    "{value} in {unit} should be rejected"
                );
            }
        }
        assert!(matches!(
            convert(f64::NAN, "bogus"),
            Err(CheckError::UnsupportedUnit(_))
        ));
    }

    #[test]
    fn should_reject_units_outside_catalog() {
        for unit in ["bogus", "Percent", "kilobytes", "megaHertz", ""] {
            match convert(1.0, unit) {
                Err(CheckError::UnsupportedUnit(u)) => assert_eq!(u, unit),
                other => panic!("expected UnsupportedUnit for {unit:?}, got {other:?}"),
            }
        }
    }
}
