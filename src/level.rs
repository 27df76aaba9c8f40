use crate::{
    codetables::Table4_5,
    cube::Coord,
    error::TranslationError,
    scaled::{MISSING_SCALE_FACTOR, MISSING_SCALED_VALUE, ScaledValue},
    units::Unit,
};

/// A fixed surface as encoded in Section 4: a surface type code plus a
/// signed scaled value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSurface {
    /// Use [Table4_5] for the recognized surface types.
    pub surface_type: u8,
    pub scale_factor: i8,
    pub scaled_value: i32,
}

impl FixedSurface {
    pub fn new(surface_type: u8, scale_factor: i8, scaled_value: i32) -> Self {
        Self {
            surface_type,
            scale_factor,
            scaled_value,
        }
    }

    /// The fully-missing surface: type 255, both value fields missing.
    pub fn missing() -> Self {
        Self::new(
            u8::from(Table4_5::Missing),
            MISSING_SCALE_FACTOR,
            MISSING_SCALED_VALUE,
        )
    }

    pub(crate) fn from_typed_value(surface_type: Table4_5, value: f64) -> Result<Self, TranslationError> {
        let sv = ScaledValue::from_value(value)?;
        Ok(Self::new(
            u8::from(surface_type),
            sv.scale_factor,
            sv.scaled_value as i32,
        ))
    }

    /// A surface of a known type whose value is undefined.
    pub(crate) fn undefined_value(surface_type: Table4_5) -> Self {
        Self::new(
            u8::from(surface_type),
            MISSING_SCALE_FACTOR,
            MISSING_SCALED_VALUE,
        )
    }

    pub fn value(&self) -> f64 {
        if self.value_is_missing() {
            f64::NAN
        } else {
            let factor = 10_f64.powi(-i32::from(self.scale_factor));
            f64::from(self.scaled_value) * factor
        }
    }

    /// Checks if the scale factor should be treated as missing. All bits
    /// one in sign-magnitude is `i8::MIN + 1`, not `i8::MIN`.
    pub fn scale_factor_is_missing(&self) -> bool {
        self.scale_factor == MISSING_SCALE_FACTOR
    }

    /// Checks if the scaled value should be treated as missing.
    pub fn value_is_missing(&self) -> bool {
        self.scaled_value == MISSING_SCALED_VALUE
    }

    pub fn type_is_missing(&self) -> bool {
        self.surface_type == u8::from(Table4_5::Missing)
    }
}

/// A vertical level resolved from a cube coordinate, in the GRIB-native
/// unit of its surface type.
#[derive(Debug, Clone, PartialEq)]
pub struct VerticalLevel {
    pub surface_type: Table4_5,
    pub point: f64,
    /// (lower, upper) for a bounded (layer) level; an undefined endpoint is
    /// NaN.
    pub bounds: Option<(f64, f64)>,
}

/// The recognized (standard name, canonical units) combinations, in the
/// order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LevelRule {
    Pressure,
    Height,
    Altitude,
    Depth,
    PotentialTemperature,
    Sigma,
    HybridLevel,
}

impl LevelRule {
    pub(crate) const ALL: [LevelRule; 7] = [
        LevelRule::Pressure,
        LevelRule::Height,
        LevelRule::Altitude,
        LevelRule::Depth,
        LevelRule::PotentialTemperature,
        LevelRule::Sigma,
        LevelRule::HybridLevel,
    ];

    fn matches_name(&self, name: &str) -> bool {
        match self {
            Self::Pressure => name == "pressure" || name == "air_pressure",
            Self::Height => name == "height",
            Self::Altitude => name == "altitude",
            Self::Depth => name == "depth",
            Self::PotentialTemperature => name == "air_potential_temperature",
            Self::Sigma => name == "sigma",
            Self::HybridLevel => name == "model_level_number",
        }
    }

    /// Factor converting the coordinate's unit to the surface type's
    /// GRIB-native unit, if convertible.
    fn conversion_factor(&self, units: &Unit) -> Option<f64> {
        match self {
            Self::Pressure => units.pascals_factor(),
            Self::Height | Self::Altitude | Self::Depth => units.metres_factor(),
            Self::PotentialTemperature => match units {
                Unit::Kelvin => Some(1.),
                _ => None,
            },
            Self::Sigma | Self::HybridLevel => match units {
                Unit::Dimensionless => Some(1.),
                _ => None,
            },
        }
    }

    pub(crate) fn surface_type(&self) -> Table4_5 {
        match self {
            Self::Pressure => Table4_5::IsobaricSurface,
            Self::Height => Table4_5::HeightAboveGround,
            Self::Altitude => Table4_5::AltitudeAboveMeanSeaLevel,
            Self::Depth => Table4_5::DepthBelowLandSurface,
            Self::PotentialTemperature => Table4_5::IsentropicLevel,
            Self::Sigma => Table4_5::SigmaLevel,
            Self::HybridLevel => Table4_5::HybridLevel,
        }
    }

    /// The canonical coordinate built on load for this surface type.
    fn coord_name_and_units(&self) -> (&'static str, Unit) {
        match self {
            Self::Pressure => ("air_pressure", Unit::Pascals),
            Self::Height => ("height", Unit::Metres),
            Self::Altitude => ("altitude", Unit::Metres),
            Self::Depth => ("depth", Unit::Metres),
            Self::PotentialTemperature => ("air_potential_temperature", Unit::Kelvin),
            Self::Sigma => ("sigma", Unit::Dimensionless),
            Self::HybridLevel => ("model_level_number", Unit::Dimensionless),
        }
    }

    fn from_surface_type(surface_type: Table4_5) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|rule| rule.surface_type() == surface_type)
    }

    pub(crate) fn applies_to(&self, coord: &Coord) -> bool {
        self.matches_name(&coord.name) && self.conversion_factor(&coord.units).is_some()
    }
}

/// Translates a recognized vertical coordinate into a [VerticalLevel].
///
/// A coordinate outside the recognized (name, units) set is rejected, never
/// coerced.
pub(crate) fn from_coord(coord: &Coord) -> Result<VerticalLevel, TranslationError> {
    let (rule, factor) = LevelRule::ALL
        .into_iter()
        .find_map(|rule| {
            rule.applies_to(coord)
                .then(|| rule.conversion_factor(&coord.units).map(|f| (rule, f)))
                .flatten()
        })
        .ok_or_else(|| {
            TranslationError::new(format!(
                "vertical coordinate '{}' with unit '{}' has no GRIB translation",
                coord.name, coord.units
            ))
        })?;
    let point = coord.points[0] * factor;
    let bounds = coord
        .bounds
        .as_ref()
        .map(|bounds| (bounds[0].0 * factor, bounds[0].1 * factor));
    Ok(VerticalLevel {
        surface_type: rule.surface_type(),
        point,
        bounds,
    })
}

/// Checks whether a coordinate claims to be vertical: either a recognized
/// vertical name or an explicit `positive` direction attribute.
pub(crate) fn is_vertical_candidate(coord: &Coord) -> bool {
    coord.attributes.contains_key("positive")
        || LevelRule::ALL.iter().any(|rule| rule.matches_name(&coord.name))
}

/// Encodes a level into the first/second fixed-surface pair.
///
/// Both endpoints of a bounded level are scaled independently; an undefined
/// upper bound keeps the surface type but marks the value missing; an
/// unbounded level sets the second surface fully missing.
pub(crate) fn to_fixed_surfaces(
    level: Option<&VerticalLevel>,
) -> Result<(FixedSurface, FixedSurface), TranslationError> {
    match level {
        None => {
            // No vertical coordinate: the product applies at the surface.
            let first =
                FixedSurface::from_typed_value(Table4_5::GroundOrWaterSurface, 0.)?;
            Ok((first, FixedSurface::missing()))
        }
        Some(level) => match level.bounds {
            None => {
                let first = FixedSurface::from_typed_value(level.surface_type, level.point)?;
                Ok((first, FixedSurface::missing()))
            }
            Some((lower, upper)) => {
                let first = FixedSurface::from_typed_value(level.surface_type, lower)?;
                let second = if upper.is_nan() {
                    FixedSurface::undefined_value(level.surface_type)
                } else {
                    FixedSurface::from_typed_value(level.surface_type, upper)?
                };
                Ok((first, second))
            }
        },
    }
}

/// Decodes the fixed-surface pair back into an optional vertical coordinate.
pub(crate) fn to_coord(
    first: &FixedSurface,
    second: &FixedSurface,
) -> Result<Option<Coord>, TranslationError> {
    if first.type_is_missing()
        || first.surface_type == u8::from(Table4_5::GroundOrWaterSurface)
    {
        return Ok(None);
    }
    let surface_type = Table4_5::try_from(first.surface_type).map_err(|_| {
        TranslationError::new(format!(
            "fixed surface type {} is not supported",
            first.surface_type
        ))
    })?;
    let rule = LevelRule::from_surface_type(surface_type).ok_or_else(|| {
        TranslationError::new(format!(
            "fixed surface type {} has no coordinate translation",
            first.surface_type
        ))
    })?;
    let (name, units) = rule.coord_name_and_units();

    if second.type_is_missing() {
        return Ok(Some(Coord::scalar(name, units, first.value())));
    }
    if second.surface_type != first.surface_type {
        return Err(TranslationError::new(format!(
            "bounded level with mismatched surface types {} and {}",
            first.surface_type, second.surface_type
        )));
    }
    let lower = first.value();
    let upper = second.value();
    let point = if upper.is_nan() {
        lower
    } else {
        (lower + upper) / 2.
    };
    Ok(Some(
        Coord::scalar(name, units, point).with_bounds(vec![(lower, upper)]),
    ))
}
