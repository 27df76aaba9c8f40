use crate::{cube::Cube, units::Unit};

/// Phenomenon identity on the wire: discipline, parameter category and
/// parameter number.
pub(crate) const MISSING_CODES: (u8, u8, u8) = (255, 255, 255);

pub(crate) const DISCIPLINE_ATTR: &str = "parameter_discipline";
pub(crate) const CATEGORY_ATTR: &str = "parameter_category";
pub(crate) const NUMBER_ATTR: &str = "parameter_number";

/// Resolves the parameter codes for a cube: raw codes preserved in
/// attributes win, then the recognized phenomenon table, then missing.
pub(crate) fn codes_for_cube(cube: &Cube) -> (u8, u8, u8) {
    if let Some(codes) = codes_from_attributes(cube) {
        return codes;
    }
    cube.name()
        .and_then(|name| codes_for(name, &cube.units))
        .unwrap_or(MISSING_CODES)
}

fn codes_from_attributes(cube: &Cube) -> Option<(u8, u8, u8)> {
    let parse = |key: &str| cube.attributes.get(key)?.parse::<u8>().ok();
    Some((
        parse(DISCIPLINE_ATTR)?,
        parse(CATEGORY_ATTR)?,
        parse(NUMBER_ATTR)?,
    ))
}

fn codes_for(name: &str, units: &Unit) -> Option<(u8, u8, u8)> {
    let codes = match (name, units) {
        ("air_temperature", Unit::Kelvin) => (0, 0, 0),
        ("relative_humidity", Unit::Percent) => (0, 1, 1),
        ("geopotential_height", Unit::Metres) => (0, 3, 5),
        _ => return None,
    };
    Some(codes)
}

/// The inverse lookup used on load.
pub(crate) fn phenomenon_for(codes: (u8, u8, u8)) -> Option<(&'static str, Unit)> {
    let phenomenon = match codes {
        (0, 0, 0) => ("air_temperature", Unit::Kelvin),
        (0, 1, 1) => ("relative_humidity", Unit::Percent),
        (0, 3, 5) => ("geopotential_height", Unit::Metres),
        _ => return None,
    };
    Some(phenomenon)
}
