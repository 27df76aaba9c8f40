use std::{fs, path::Path};

use log::debug;

use crate::{
    cube::{CellMethod, Cube},
    error::TranslationError,
    level,
    message::Grib2Message,
    packing, param,
    save::{CENTRE_ATTR, SUBCENTRE_ATTR},
    time::{self, TimeDescriptor, TimeInterval},
};

/// Loads every GRIB2 message in a file as a cube.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Cube>, TranslationError> {
    let buf = fs::read(&path)?;
    let mut cubes = Vec::new();
    let mut pos = 0;
    while pos < buf.len() {
        let (message, consumed) = Grib2Message::from_bytes(&buf[pos..])?;
        cubes.push(decode_message(&message)?);
        pos += consumed;
    }
    if cubes.is_empty() {
        return Err(TranslationError::new(format!(
            "{} contains no GRIB messages",
            path.as_ref().display()
        )));
    }
    debug!(
        "loaded {} cubes from {}",
        cubes.len(),
        path.as_ref().display()
    );
    Ok(cubes)
}

/// Loads a file expected to hold exactly one GRIB2 message.
pub fn load_cube<P: AsRef<Path>>(path: P) -> Result<Cube, TranslationError> {
    let mut cubes = load(path)?;
    if cubes.len() != 1 {
        return Err(TranslationError::new(format!(
            "expected exactly one GRIB message, found {}",
            cubes.len()
        )));
    }
    Ok(cubes.remove(0))
}

/// Translates a GRIB2 message into a freshly constructed cube.
///
/// The inverse translators run in dependency order: grid, then vertical
/// level, then time.
pub fn decode_message(message: &Grib2Message) -> Result<Cube, TranslationError> {
    if message.bitmap.bitmap_indicator != 255 {
        return Err(TranslationError::new(format!(
            "bit-map indicator {} is not supported",
            message.bitmap.bitmap_indicator
        )));
    }
    if message.repr.num_points != message.grid.num_points() {
        return Err(TranslationError::new(format!(
            "data representation covers {} points but the grid holds {}",
            message.repr.num_points,
            message.grid.num_points()
        )));
    }

    let (y, x) = message.grid.template.to_cube_coords()?;
    let (ni, nj) = message.grid.template.grid_shape();
    let values = packing::decode(&message.repr.param, &message.data, ni * nj)?;

    let level_coord =
        level::to_coord(&message.product.first_surface, &message.product.second_surface)?;
    let descriptor = time_descriptor(message)?;
    let (time_coord, forecast_coord) = descriptor.to_coords();

    let mut cube = Cube::new(values, (nj, ni));
    let codes = (
        message.indicator.discipline,
        message.product.parameter_category,
        message.product.parameter_number,
    );
    match param::phenomenon_for(codes) {
        Some((name, units)) => {
            cube.rename(name);
            cube.units = units;
        }
        None if codes != param::MISSING_CODES => {
            // phenomenon outside the recognized table: keep the raw codes
            cube.attributes
                .insert(param::DISCIPLINE_ATTR.to_owned(), codes.0.to_string());
            cube.attributes
                .insert(param::CATEGORY_ATTR.to_owned(), codes.1.to_string());
            cube.attributes
                .insert(param::NUMBER_ATTR.to_owned(), codes.2.to_string());
        }
        None => (),
    }
    cube.attributes.insert(
        CENTRE_ATTR.to_owned(),
        message.identification.centre_id.to_string(),
    );
    cube.attributes.insert(
        SUBCENTRE_ATTR.to_owned(),
        message.identification.subcentre_id.to_string(),
    );

    cube.add_dim_coord(y, 0);
    cube.add_dim_coord(x, 1);
    if let Some(coord) = level_coord {
        cube.add_aux_coord(coord);
    }
    cube.add_aux_coord(time_coord);
    cube.add_aux_coord(forecast_coord);
    if let Some(interval) = &message.product.interval {
        let method = interval.statistic.cell_method_name().ok_or_else(|| {
            TranslationError::new(format!(
                "statistical processing {:?} has no cell method translation",
                interval.statistic
            ))
        })?;
        cube.add_cell_method(CellMethod::new(method, "time"));
    }
    Ok(cube)
}

fn time_descriptor(message: &Grib2Message) -> Result<TimeDescriptor, TranslationError> {
    let product = &message.product;
    let factor = product.time_unit.hours_factor().ok_or_else(|| {
        TranslationError::new(format!(
            "time range unit {:?} is not convertible to hours",
            product.time_unit
        ))
    })?;
    let forecast_hours = time::whole_hours(f64::from(product.forecast_time) * factor)?;

    let interval = match &product.interval {
        None => None,
        Some(interval) => {
            let range_factor = interval.range_unit.hours_factor().ok_or_else(|| {
                TranslationError::new(format!(
                    "time range unit {:?} is not convertible to hours",
                    interval.range_unit
                ))
            })?;
            let length_hours =
                time::whole_hours(f64::from(interval.range_length) * range_factor)?;
            Some(TimeInterval {
                statistic: interval.statistic,
                increment_type: interval.increment_type,
                end: interval.end,
                length_hours: length_hours as u32,
            })
        }
    };

    Ok(TimeDescriptor {
        reference_time: message.identification.ref_time,
        forecast_hours,
        interval,
    })
}
