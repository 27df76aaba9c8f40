use std::{fs::File, io::Write, path::Path};

use log::debug;

use crate::{
    codetables::Table4_4,
    cube::Cube,
    error::TranslationError,
    level,
    message::Grib2Message,
    packing, rules,
    sections::{
        BitMap, GridDefinition, Identification, Indicator, ProductDefinition, ReprDefinition,
        StatisticalInterval,
    },
};

/// Attribute preserving the originating centre across a round trip.
pub(crate) const CENTRE_ATTR: &str = "centre";
pub(crate) const SUBCENTRE_ATTR: &str = "subCentre";

/// Saves one cube as a single-message GRIB2 file.
///
/// Validation and encoding complete before the output file is created, so a
/// translation failure never leaves a partially written file behind.
pub fn save<P: AsRef<Path>>(cube: &Cube, path: P) -> Result<(), TranslationError> {
    save_cubes(std::slice::from_ref(cube), path)
}

/// Saves a list of cubes as consecutive GRIB2 messages in one file.
///
/// Every cube is validated and encoded before any byte reaches the
/// filesystem.
pub fn save_cubes<P: AsRef<Path>>(cubes: &[Cube], path: P) -> Result<(), TranslationError> {
    if cubes.is_empty() {
        return Err(TranslationError::new("no cubes to save"));
    }
    let mut buf = Vec::new();
    for cube in cubes {
        buf.extend(encode_message(cube)?.to_bytes());
    }
    debug!(
        "writing {} octets ({} messages) to {}",
        buf.len(),
        cubes.len(),
        path.as_ref().display()
    );
    let mut file = File::create(path)?;
    file.write_all(&buf)?;
    Ok(())
}

/// Translates a cube into a GRIB2 message.
pub fn encode_message(cube: &Cube) -> Result<Grib2Message, TranslationError> {
    let plan = rules::validate(cube)?;
    let (ni, nj) = plan.grid.grid_shape();
    if (nj, ni) != cube.shape {
        return Err(TranslationError::new(format!(
            "grid coordinates describe a {nj}x{ni} grid but the data array is {}x{}",
            cube.shape.0, cube.shape.1
        )));
    }

    let (param, data) = packing::encode(&cube.data)?;
    let (first_surface, second_surface) = level::to_fixed_surfaces(plan.level.as_ref())?;
    let forecast_time = i32::try_from(plan.time.forecast_hours).map_err(|_| {
        TranslationError::new(format!(
            "forecast period of {} hours does not fit the forecast time field",
            plan.time.forecast_hours
        ))
    })?;
    let interval = plan.time.interval.as_ref().map(|interval| StatisticalInterval {
        end: interval.end,
        statistic: interval.statistic,
        increment_type: interval.increment_type,
        range_unit: Table4_4::Hour,
        range_length: interval.length_hours,
        increment_unit: Table4_4::Hour,
        increment: 0,
    });

    let (discipline, parameter_category, parameter_number) = plan.parameter;
    let identification = Identification {
        centre_id: attribute_code(cube, CENTRE_ATTR).unwrap_or(255),
        subcentre_id: attribute_code(cube, SUBCENTRE_ATTR).unwrap_or(0),
        master_table_version: 10,
        local_table_version: 0,
        // start of forecast
        ref_time_significance: 1,
        ref_time: plan.time.reference_time,
        // production status and generating process are unknown here; the
        // encoder marks them missing
        prod_status: 255,
        data_type: 2,
    };

    Ok(Grib2Message {
        indicator: Indicator {
            discipline,
            total_length: 0,
        },
        identification,
        grid: GridDefinition {
            template: plan.grid,
        },
        product: ProductDefinition {
            parameter_category,
            parameter_number,
            generating_process: 255,
            background_process: 255,
            process_id: 255,
            cutoff_hours: 0,
            cutoff_minutes: 0,
            time_unit: Table4_4::Hour,
            forecast_time,
            first_surface,
            second_surface,
            interval,
        },
        repr: ReprDefinition {
            num_points: (ni * nj) as u32,
            param,
            original_field_type: 0,
        },
        bitmap: BitMap {
            bitmap_indicator: 255,
        },
        data,
    })
}

fn attribute_code(cube: &Cube, key: &str) -> Option<u16> {
    cube.attributes.get(key)?.parse().ok()
}
