mod earth;
mod lambert;
mod latlon;
mod rotated_ll;

pub use earth::EarthShapeDefinition;
pub use lambert::LambertGridDefinition;
pub use latlon::LatLonGridDefinition;
pub use rotated_ll::{RotatedLatLonGridDefinition, Rotation};

use crate::{cube::Coord, error::TranslationError};

/// Scanning mode flags (Code Table 3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanningMode(pub u8);

impl ScanningMode {
    pub(crate) fn from_directions(i_positive: bool, j_positive: bool) -> Self {
        let mut mode = 0;
        if !i_positive {
            mode |= 0b10000000;
        }
        if j_positive {
            mode |= 0b01000000;
        }
        Self(mode)
    }

    pub(crate) fn scans_positively_for_i(&self) -> bool {
        self.0 & 0b10000000 == 0
    }

    pub(crate) fn scans_positively_for_j(&self) -> bool {
        self.0 & 0b01000000 != 0
    }

    /// Flags beyond the i/j directions (consecutive-j ordering, alternating
    /// rows, reserved bits) are not translated.
    pub(crate) fn has_unsupported_flags(&self) -> bool {
        self.0 & 0b00111111 != 0
    }
}

/// A dimension coordinate reduced to a fixed-step progression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RegularAxis {
    pub(crate) start: f64,
    pub(crate) step: f64,
    pub(crate) count: usize,
}

impl RegularAxis {
    pub(crate) fn from_points(name: &str, points: &[f64]) -> Result<Self, TranslationError> {
        if points.len() < 2 {
            return Err(TranslationError::new(format!(
                "coordinate '{name}' needs at least two points to define a grid axis"
            )));
        }
        let step = points[1] - points[0];
        if step == 0. {
            return Err(TranslationError::new(format!(
                "coordinate '{name}' is irregular: repeated first sample"
            )));
        }
        for window in points.windows(2) {
            let diff = window[1] - window[0];
            if (diff - step).abs() > step.abs() * 1e-4 {
                return Err(TranslationError::new(format!(
                    "coordinate '{name}' is irregular: spacing varies from {step} to {diff}"
                )));
            }
        }
        Ok(Self {
            start: points[0],
            step,
            count: points.len(),
        })
    }

    pub(crate) fn last(&self) -> f64 {
        self.start + self.step * (self.count - 1) as f64
    }
}

pub(crate) fn degrees_to_micro(degrees: f64) -> i32 {
    (degrees * 1e6).round() as i32
}

pub(crate) fn micro_to_degrees(micro: i64) -> f64 {
    // division by the exact integer 1e6 keeps whole and half degrees exact
    micro as f64 / 1_000_000.
}

/// Normalizes a longitude into the GRIB angular convention [0, 360).
pub(crate) fn normalize_lon(degrees: f64) -> f64 {
    let normalized = degrees % 360.;
    if normalized < 0. {
        normalized + 360.
    } else {
        normalized
    }
}

/// Grid definition template values understood by this crate.
#[derive(Debug, PartialEq)]
pub enum GridDefinitionTemplateValues {
    Template0(LatLonGridDefinition),
    Template1(RotatedLatLonGridDefinition),
    Template30(LambertGridDefinition),
}

impl GridDefinitionTemplateValues {
    pub fn template_number(&self) -> u16 {
        match self {
            Self::Template0(_) => 0,
            Self::Template1(_) => 1,
            Self::Template30(_) => 30,
        }
    }

    /// Returns the shape of the grid, i.e. a tuple of the number of grids in
    /// the i and j directions.
    pub fn grid_shape(&self) -> (usize, usize) {
        match self {
            Self::Template0(def) => def.grid_shape(),
            Self::Template1(def) => def.grid_shape(),
            Self::Template30(def) => def.grid_shape(),
        }
    }

    pub fn num_points(&self) -> u32 {
        let (ni, nj) = self.grid_shape();
        (ni * nj) as u32
    }

    /// Reconstructs the (row, column) cube coordinate pair, coordinate
    /// system attached to both.
    pub(crate) fn to_cube_coords(&self) -> Result<(Coord, Coord), TranslationError> {
        match self {
            Self::Template0(def) => def.to_cube_coords(),
            Self::Template1(def) => def.to_cube_coords(),
            Self::Template30(def) => def.to_cube_coords(),
        }
    }

    pub(crate) fn from_payload(
        template_number: u16,
        buf: &[u8],
    ) -> Result<Self, TranslationError> {
        match template_number {
            0 => Ok(Self::Template0(LatLonGridDefinition::from_payload(buf)?)),
            1 => Ok(Self::Template1(RotatedLatLonGridDefinition::from_payload(
                buf,
            )?)),
            30 => Ok(Self::Template30(LambertGridDefinition::from_payload(buf)?)),
            num => Err(TranslationError::new(format!(
                "grid definition template {num} is not supported"
            ))),
        }
    }

    pub(crate) fn to_payload(&self, out: &mut Vec<u8>) {
        match self {
            Self::Template0(def) => def.to_payload(out),
            Self::Template1(def) => def.to_payload(out),
            Self::Template30(def) => def.to_payload(out),
        }
    }
}
