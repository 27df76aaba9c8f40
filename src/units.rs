use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};

/// Unit tag attached to cube coordinates and data.
///
/// This is the slice of a units system that the GRIB2 translation needs:
/// fixed conversion factors towards the GRIB-native units (Pa, m, hours) and
/// a time-reference unit for time coordinates. Calendar-dependent durations
/// deliberately have no conversion factor.
#[derive(Debug, Clone, PartialEq)]
pub enum Unit {
    Pascals,
    Hectopascals,
    Metres,
    Kelvin,
    Percent,
    Degrees,
    Seconds,
    Minutes,
    Hours,
    Days,
    Years,
    /// Time instants expressed as hours since the given epoch.
    HoursSince(DateTime<Utc>),
    Dimensionless,
    Unknown(String),
}

impl Unit {
    /// Fixed factor converting a value in this unit to hours, if the unit is
    /// a fixed-duration time unit.
    ///
    /// "Years" is not convertible: it has no fixed duration without picking
    /// a calendar.
    pub fn hours_factor(&self) -> Option<f64> {
        let factor = match self {
            Self::Seconds => 1. / 3600.,
            Self::Minutes => 1. / 60.,
            Self::Hours => 1.,
            Self::Days => 24.,
            _ => return None,
        };
        Some(factor)
    }

    /// Fixed factor converting a value in this unit to pascals.
    pub fn pascals_factor(&self) -> Option<f64> {
        let factor = match self {
            Self::Pascals => 1.,
            Self::Hectopascals => 100.,
            _ => return None,
        };
        Some(factor)
    }

    /// Fixed factor converting a value in this unit to metres.
    pub fn metres_factor(&self) -> Option<f64> {
        match self {
            Self::Metres => Some(1.),
            _ => None,
        }
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Pascals => write!(f, "Pa"),
            Self::Hectopascals => write!(f, "hPa"),
            Self::Metres => write!(f, "m"),
            Self::Kelvin => write!(f, "K"),
            Self::Percent => write!(f, "%"),
            Self::Degrees => write!(f, "degrees"),
            Self::Seconds => write!(f, "seconds"),
            Self::Minutes => write!(f, "minutes"),
            Self::Hours => write!(f, "hours"),
            Self::Days => write!(f, "days"),
            Self::Years => write!(f, "years"),
            Self::HoursSince(epoch) => {
                write!(f, "hours since {}", epoch.format("%Y-%m-%d %H:%M:%S"))
            }
            Self::Dimensionless => write!(f, "1"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    macro_rules! test_unit_conversion_factors {
        ($(($name:ident, $unit:expr, $method:ident, $expected:expr),)*) => ($(
            #[test]
            fn $name() {
                assert_eq!($unit.$method(), $expected);
            }
        )*);
    }

    test_unit_conversion_factors! {
        (hours_factor_for_minutes, Unit::Minutes, hours_factor, Some(1. / 60.)),
        (hours_factor_for_hours, Unit::Hours, hours_factor, Some(1.)),
        (hours_factor_for_days, Unit::Days, hours_factor, Some(24.)),
        (hours_factor_for_years, Unit::Years, hours_factor, None),
        (hours_factor_for_kelvin, Unit::Kelvin, hours_factor, None),
        (pascals_factor_for_hpa, Unit::Hectopascals, pascals_factor, Some(100.)),
        (pascals_factor_for_pa, Unit::Pascals, pascals_factor, Some(1.)),
        (pascals_factor_for_metres, Unit::Metres, pascals_factor, None),
        (metres_factor_for_metres, Unit::Metres, metres_factor, Some(1.)),
        (metres_factor_for_kelvin, Unit::Kelvin, metres_factor, None),
    }

    #[test]
    fn unit_display() {
        let epoch = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format!("{}", Unit::Hectopascals), "hPa");
        assert_eq!(
            format!("{}", Unit::HoursSince(epoch)),
            "hours since 1970-01-01 00:00:00"
        );
    }
}
