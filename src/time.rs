use chrono::{DateTime, Duration, Utc};

use crate::{
    codetables::{Table4_10, Table4_11},
    cube::{Coord, Cube},
    error::TranslationError,
    units::Unit,
};

/// The time semantics of one product: reference time, the signed forecast
/// period and the optional statistical-processing interval.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeDescriptor {
    pub reference_time: DateTime<Utc>,
    /// Hours from the reference time to the valid time, or to the start of
    /// the overall interval for statistical products. May be negative.
    pub forecast_hours: i64,
    pub interval: Option<TimeInterval>,
}

/// A statistical-processing interval: the aggregation applied over the time
/// bounds of the source coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeInterval {
    pub statistic: Table4_10,
    pub increment_type: Table4_11,
    pub end: DateTime<Utc>,
    pub length_hours: u32,
}

pub(crate) fn from_cube(cube: &Cube) -> Result<TimeDescriptor, TranslationError> {
    let time = cube
        .coord("time")
        .ok_or_else(|| TranslationError::new("cube has no time coordinate"))?;
    let Unit::HoursSince(epoch) = &time.units else {
        return Err(TranslationError::new(format!(
            "time coordinate unit '{}' is not a time reference",
            time.units
        )));
    };
    if !time.is_scalar() {
        return Err(TranslationError::new(
            "cube with a multi-valued time coordinate cannot be saved as one message",
        ));
    }
    let valid_time = instant(*epoch, time.points[0])?;

    let forecast_hours = match cube.coord("forecast_period") {
        None => 0,
        Some(coord) => {
            let factor = coord.units.hours_factor().ok_or_else(|| {
                TranslationError::new(format!(
                    "cannot convert forecast period unit '{}' to hours",
                    coord.units
                ))
            })?;
            whole_hours(coord.points[0] * factor)?
        }
    };
    let reference_time = valid_time
        .checked_sub_signed(Duration::hours(forecast_hours))
        .ok_or_else(|| TranslationError::new("reference time out of range"))?;

    let interval = match &time.bounds {
        None => None,
        Some(bounds) => {
            let method = cube.cell_method_for("time").ok_or_else(|| {
                TranslationError::new(
                    "time coordinate has bounds but the cube records no statistical cell \
                     method over time",
                )
            })?;
            let statistic = Table4_10::from_cell_method_name(&method.method).ok_or_else(|| {
                TranslationError::new(format!(
                    "cell method '{}' over time has no statistical processing code",
                    method.method
                ))
            })?;
            let (lower, upper) = bounds[0];
            let start = instant(*epoch, lower)?;
            let end = instant(*epoch, upper)?;
            let length_hours = end.signed_duration_since(start).num_hours();
            if length_hours < 0 {
                return Err(TranslationError::new(
                    "time bounds are reversed: the interval end precedes its start",
                ));
            }
            Some(TimeInterval {
                statistic,
                // the interval aggregates successive forecast times from one
                // forecast start
                increment_type: Table4_11::SameStartTime,
                end,
                length_hours: length_hours as u32,
            })
        }
    };

    // For statistical products the encoded forecast period runs from the
    // reference time to the start of the overall interval.
    let forecast_hours = match &interval {
        None => forecast_hours,
        Some(interval) => {
            let start = interval.end
                - Duration::hours(i64::from(interval.length_hours));
            start.signed_duration_since(reference_time).num_hours()
        }
    };

    Ok(TimeDescriptor {
        reference_time,
        forecast_hours,
        interval,
    })
}

impl TimeDescriptor {
    /// Builds the time and forecast-period coordinates for a loaded cube.
    pub(crate) fn to_coords(&self) -> (Coord, Coord) {
        let epoch = DateTime::UNIX_EPOCH;
        let units = Unit::HoursSince(epoch);
        match &self.interval {
            None => {
                let valid = self.reference_time + Duration::hours(self.forecast_hours);
                let time = Coord::scalar("time", units, hours_between(epoch, valid));
                let forecast =
                    Coord::scalar("forecast_period", Unit::Hours, self.forecast_hours as f64);
                (time, forecast)
            }
            Some(interval) => {
                let start = interval.end - Duration::hours(i64::from(interval.length_hours));
                let time = Coord::scalar("time", units, hours_between(epoch, interval.end))
                    .with_bounds(vec![(
                        hours_between(epoch, start),
                        hours_between(epoch, interval.end),
                    )]);
                let fp_start = self.forecast_hours as f64;
                let fp_end = fp_start + f64::from(interval.length_hours);
                let forecast = Coord::scalar("forecast_period", Unit::Hours, fp_end)
                    .with_bounds(vec![(fp_start, fp_end)]);
                (time, forecast)
            }
        }
    }
}

fn instant(epoch: DateTime<Utc>, hours: f64) -> Result<DateTime<Utc>, TranslationError> {
    let seconds = (hours * 3600.).round();
    Duration::try_seconds(seconds as i64)
        .and_then(|offset| epoch.checked_add_signed(offset))
        .ok_or_else(|| TranslationError::new(format!("time value {hours} hours is out of range")))
}

fn hours_between(epoch: DateTime<Utc>, instant: DateTime<Utc>) -> f64 {
    instant.signed_duration_since(epoch).num_seconds() as f64 / 3600.
}

pub(crate) fn whole_hours(hours: f64) -> Result<i64, TranslationError> {
    let rounded = hours.round();
    if (hours - rounded).abs() > 1e-6 {
        return Err(TranslationError::new(format!(
            "forecast period of {hours} hours is not a whole number of hours"
        )));
    }
    Ok(rounded as i64)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::cube::CellMethod;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2010, 12, 1, 0, 0, 0).unwrap()
    }

    fn cube_with_time(points: f64, forecast: Option<Coord>) -> Cube {
        let mut cube = Cube::new(vec![0.; 4], (2, 2));
        cube.add_aux_coord(Coord::scalar(
            "time",
            Unit::HoursSince(epoch()),
            points,
        ));
        if let Some(coord) = forecast {
            cube.add_aux_coord(coord);
        }
        cube
    }

    #[test]
    fn forecast_period_in_hours() {
        let cube = cube_with_time(
            48.,
            Some(Coord::scalar("forecast_period", Unit::Hours, 6.)),
        );
        let descriptor = from_cube(&cube).unwrap();
        assert_eq!(descriptor.forecast_hours, 6);
        assert_eq!(
            descriptor.reference_time,
            Utc.with_ymd_and_hms(2010, 12, 2, 18, 0, 0).unwrap()
        );
        assert_eq!(descriptor.interval, None);
    }

    #[test]
    fn negative_forecast_period_is_preserved() {
        let cube = cube_with_time(
            48.,
            Some(Coord::scalar("forecast_period", Unit::Hours, -6.)),
        );
        let descriptor = from_cube(&cube).unwrap();
        assert_eq!(descriptor.forecast_hours, -6);
    }

    #[test]
    fn forecast_period_in_minutes_is_converted() {
        let cube = cube_with_time(
            48.,
            Some(Coord::scalar("forecast_period", Unit::Minutes, 360.)),
        );
        assert_eq!(from_cube(&cube).unwrap().forecast_hours, 6);
    }

    #[test]
    fn forecast_period_in_years_is_rejected() {
        let cube = cube_with_time(
            48.,
            Some(Coord::scalar("forecast_period", Unit::Years, 1.)),
        );
        let err = from_cube(&cube).unwrap_err();
        assert!(err.reason().contains("forecast period unit 'years'"));
    }

    #[test]
    fn cube_without_time_coordinate_is_rejected() {
        let cube = Cube::new(vec![0.; 4], (2, 2));
        assert!(from_cube(&cube).is_err());
    }

    #[test]
    fn time_bounds_without_cell_method_are_rejected() {
        let mut cube = cube_with_time(
            48.,
            Some(Coord::scalar("forecast_period", Unit::Hours, 6.)),
        );
        cube.coord_mut("time").unwrap().bounds = Some(vec![(24., 48.)]);
        assert!(from_cube(&cube).is_err());
    }

    #[test]
    fn time_mean_selects_a_statistical_interval() {
        let mut cube = cube_with_time(
            48.,
            Some(Coord::scalar("forecast_period", Unit::Hours, 6.)),
        );
        cube.coord_mut("time").unwrap().bounds = Some(vec![(24., 48.)]);
        cube.add_cell_method(CellMethod::new("mean", "time"));

        let descriptor = from_cube(&cube).unwrap();
        let interval = descriptor.interval.as_ref().unwrap();
        assert_eq!(interval.statistic, Table4_10::Average);
        assert_eq!(interval.increment_type, Table4_11::SameStartTime);
        assert_eq!(interval.length_hours, 24);
        // reference = valid - 6 h; the encoded period runs to the interval
        // start, 18 h before the reference
        assert_eq!(descriptor.forecast_hours, -18);
    }

    #[test]
    fn time_mean_coords_roundtrip() {
        let mut cube = cube_with_time(
            48.,
            Some(Coord::scalar("forecast_period", Unit::Hours, 6.)),
        );
        cube.coord_mut("time").unwrap().bounds = Some(vec![(24., 48.)]);
        cube.add_cell_method(CellMethod::new("mean", "time"));
        let descriptor = from_cube(&cube).unwrap();

        let (time, forecast) = descriptor.to_coords();
        let unix = DateTime::UNIX_EPOCH;
        let bounds = time.bounds.as_ref().unwrap()[0];
        assert_eq!(
            instant(unix, bounds.0).unwrap(),
            epoch() + Duration::hours(24)
        );
        assert_eq!(
            instant(unix, time.points[0]).unwrap(),
            epoch() + Duration::hours(48)
        );
        assert_eq!(forecast.bounds.as_ref().unwrap()[0], (-18., 6.));
        assert_eq!(forecast.points[0], 6.);
    }

    #[test]
    fn fractional_forecast_period_is_rejected() {
        let cube = cube_with_time(
            48.,
            Some(Coord::scalar("forecast_period", Unit::Minutes, 90.)),
        );
        assert!(from_cube(&cube).is_err());
    }
}
