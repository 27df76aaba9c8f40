use log::debug;

use crate::{
    cube::{Coord, CoordSystem, Cube},
    error::TranslationError,
    grid::{
        GridDefinitionTemplateValues, LambertGridDefinition, LatLonGridDefinition,
        RotatedLatLonGridDefinition,
    },
    level::{self, VerticalLevel},
    param,
    time::{self, TimeDescriptor},
};

/// Everything needed to emit one message, resolved before any byte is
/// written.
#[derive(Debug)]
pub(crate) struct SavePlan {
    pub(crate) grid: GridDefinitionTemplateValues,
    pub(crate) level: Option<VerticalLevel>,
    pub(crate) time: TimeDescriptor,
    /// (discipline, parameter category, parameter number)
    pub(crate) parameter: (u8, u8, u8),
}

/// The grid-family translation rules, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GridRule {
    LatLon,
    RotatedLatLon,
    LambertConformal,
}

impl GridRule {
    pub(crate) const ALL: [GridRule; 3] = [
        GridRule::LatLon,
        GridRule::RotatedLatLon,
        GridRule::LambertConformal,
    ];

    pub(crate) fn applies_to(&self, y: &Coord, x: &Coord) -> bool {
        match self {
            Self::LatLon => {
                y.name == "latitude"
                    && x.name == "longitude"
                    && matches!(y.coord_system, Some(CoordSystem::Geodetic(_)))
            }
            Self::RotatedLatLon => {
                y.name == "grid_latitude"
                    && x.name == "grid_longitude"
                    && matches!(y.coord_system, Some(CoordSystem::RotatedPole(_)))
            }
            Self::LambertConformal => {
                y.name == "projection_y_coordinate"
                    && x.name == "projection_x_coordinate"
                    && matches!(y.coord_system, Some(CoordSystem::LambertConformal(_)))
            }
        }
    }

    fn build(
        &self,
        y: &Coord,
        x: &Coord,
    ) -> Result<GridDefinitionTemplateValues, TranslationError> {
        match (self, &y.coord_system) {
            (Self::LatLon, Some(CoordSystem::Geodetic(cs))) => {
                Ok(GridDefinitionTemplateValues::Template0(
                    LatLonGridDefinition::from_cube_coords(y, x, cs)?,
                ))
            }
            (Self::RotatedLatLon, Some(CoordSystem::RotatedPole(cs))) => {
                Ok(GridDefinitionTemplateValues::Template1(
                    RotatedLatLonGridDefinition::from_cube_coords(y, x, cs)?,
                ))
            }
            (Self::LambertConformal, Some(CoordSystem::LambertConformal(cs))) => {
                Ok(GridDefinitionTemplateValues::Template30(
                    LambertGridDefinition::from_cube_coords(y, x, cs)?,
                ))
            }
            _ => Err(TranslationError::new(format!(
                "coordinate '{}' does not carry the coordinate system its grid rule expects",
                y.name
            ))),
        }
    }
}

fn horizontal_coords(cube: &Cube) -> Result<(&Coord, &Coord), TranslationError> {
    cube.coord_on_axis(0)
        .zip(cube.coord_on_axis(1))
        .ok_or_else(|| {
            TranslationError::new("cube has no coordinates describing its two grid dimensions")
        })
}

pub(crate) fn select_grid(cube: &Cube) -> Result<GridDefinitionTemplateValues, TranslationError> {
    let (y, x) = horizontal_coords(cube)?;
    for coord in [y, x] {
        if coord.coord_system.is_none() {
            return Err(TranslationError::new(format!(
                "grid coordinate '{}' has no coordinate system",
                coord.name
            )));
        }
    }
    if y.coord_system != x.coord_system {
        return Err(TranslationError::new(format!(
            "grid coordinates '{}' and '{}' do not share a coordinate system",
            y.name, x.name
        )));
    }
    for rule in GridRule::ALL {
        if rule.applies_to(y, x) {
            debug!("grid rule {rule:?} applies to '{}'/'{}'", y.name, x.name);
            return rule.build(y, x);
        }
    }
    Err(TranslationError::new(format!(
        "no grid translation for coordinates '{}'/'{}' and their coordinate system",
        y.name, x.name
    )))
}

pub(crate) fn select_level(cube: &Cube) -> Result<Option<VerticalLevel>, TranslationError> {
    let mut found: Option<VerticalLevel> = None;
    for coord in cube.scalar_coords() {
        if coord.name == "time" || coord.name == "forecast_period" {
            continue;
        }
        if !level::is_vertical_candidate(coord) {
            debug!("scalar coordinate '{}' is not translated", coord.name);
            continue;
        }
        let level = level::from_coord(coord)?;
        if found.is_some() {
            return Err(TranslationError::new(
                "cube has more than one vertical coordinate",
            ));
        }
        debug!(
            "level rule for '{}': surface type {:?}",
            coord.name, level.surface_type
        );
        found = Some(level);
    }
    Ok(found)
}

/// Runs the full rule combination against a cube. Any missing rule fails
/// here, before a single section is populated.
pub(crate) fn validate(cube: &Cube) -> Result<SavePlan, TranslationError> {
    let grid = select_grid(cube)?;
    let level = select_level(cube)?;
    let time = time::from_cube(cube)?;
    let parameter = param::codes_for_cube(cube);
    debug!(
        "save plan: grid template {}, level {:?}, statistical {}",
        grid.template_number(),
        level.as_ref().map(|l| l.surface_type),
        time.interval.is_some(),
    );
    Ok(SavePlan {
        grid,
        level,
        time,
        parameter,
    })
}
