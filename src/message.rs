use chrono::{Datelike, Timelike};

use crate::{
    error::TranslationError,
    grid::GridDefinitionTemplateValues,
    helpers::{GribUint, read_as},
    level::FixedSurface,
    sections::{BitMap, GridDefinition, Identification, Indicator, ProductDefinition, ReprDefinition},
};

const END_MARKER: &[u8] = b"7777";

/// One GRIB2 message: the ordered sections of a single product.
#[derive(Debug, PartialEq)]
pub struct Grib2Message {
    pub indicator: Indicator,
    pub identification: Identification,
    pub grid: GridDefinition,
    pub product: ProductDefinition,
    pub repr: ReprDefinition,
    pub bitmap: BitMap,
    /// Packed Section 7 payload.
    pub data: Vec<u8>,
}

impl Grib2Message {
    /// Serializes the message, recomputing the total length.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut body = Vec::new();
        push_section(&mut body, 1, |out| self.identification.to_payload(out));
        push_section(&mut body, 3, |out| self.grid.to_payload(out));
        push_section(&mut body, 4, |out| self.product.to_payload(out));
        push_section(&mut body, 5, |out| self.repr.to_payload(out));
        push_section(&mut body, 6, |out| out.push(self.bitmap.bitmap_indicator));
        push_section(&mut body, 7, |out| out.extend_from_slice(&self.data));
        body.extend_from_slice(END_MARKER);

        let total_length = (16 + body.len()) as u64;
        let mut out = Vec::with_capacity(total_length as usize);
        Indicator {
            discipline: self.indicator.discipline,
            total_length,
        }
        .write(&mut out);
        out.extend(body);
        out
    }

    /// Reads one message from the head of `buf`, returning it together with
    /// the number of octets consumed.
    pub fn from_bytes(buf: &[u8]) -> Result<(Self, usize), TranslationError> {
        let indicator = Indicator::from_slice(buf)?;
        let total_length = indicator.total_length as usize;
        if buf.len() < total_length || total_length < 16 + END_MARKER.len() {
            return Err(TranslationError::new(format!(
                "GRIB message of {total_length} octets is truncated"
            )));
        }
        if &buf[total_length - END_MARKER.len()..total_length] != END_MARKER {
            return Err(TranslationError::new("GRIB message lacks its end section"));
        }

        let mut identification = None;
        let mut grid = None;
        let mut product = None;
        let mut repr = None;
        let mut bitmap = None;
        let mut data = None;
        let mut pos = 16;
        let body_end = total_length - END_MARKER.len();
        while pos < body_end {
            if pos + 5 > body_end {
                return Err(TranslationError::new(format!(
                    "unexpected end of GRIB message at octet {pos}"
                )));
            }
            let length = read_as!(u32, buf, pos) as usize;
            let number = buf[pos + 4];
            if length < 5 || pos + length > body_end {
                return Err(TranslationError::new(format!(
                    "section {number} of {length} octets overruns the message"
                )));
            }
            let payload = &buf[pos + 5..pos + length];
            match number {
                1 => set_section(&mut identification, 1, Identification::from_payload(payload)?)?,
                // Local Use Section: not mapped to the cube model
                2 => (),
                3 => set_section(&mut grid, 3, GridDefinition::from_payload(payload)?)?,
                4 => set_section(&mut product, 4, ProductDefinition::from_payload(payload)?)?,
                5 => set_section(&mut repr, 5, ReprDefinition::from_payload(payload)?)?,
                6 => {
                    if payload.is_empty() {
                        return Err(TranslationError::new("bit-map section has no indicator"));
                    }
                    set_section(
                        &mut bitmap,
                        6,
                        BitMap {
                            bitmap_indicator: payload[0],
                        },
                    )?
                }
                7 => set_section(&mut data, 7, payload.to_vec())?,
                number => {
                    return Err(TranslationError::new(format!(
                        "unknown section number: {number}"
                    )));
                }
            }
            pos += length;
        }

        let message = Self {
            indicator,
            identification: require_section(identification, 1)?,
            grid: require_section(grid, 3)?,
            product: require_section(product, 4)?,
            repr: require_section(repr, 5)?,
            bitmap: require_section(bitmap, 6)?,
            data: require_section(data, 7)?,
        };
        Ok((message, total_length))
    }

    /// The value of one named key, if the message carries it.
    pub fn key(&self, name: &str) -> Option<i64> {
        self.keys()
            .into_iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// A flat view of the message as (key name, integer value) pairs, using
    /// the key names common to GRIB tooling.
    ///
    /// Missing unsigned fields surface as the all-ones integer; a missing
    /// signed scaled value surfaces as the positive integer-max sentinel.
    pub fn keys(&self) -> Vec<(&'static str, i64)> {
        let mut keys = vec![
            ("editionNumber", 2),
            ("discipline", i64::from(self.indicator.discipline)),
            ("totalLength", self.to_bytes().len() as i64),
            ("centre", i64::from(self.identification.centre_id)),
            ("subCentre", i64::from(self.identification.subcentre_id)),
            (
                "tablesVersion",
                i64::from(self.identification.master_table_version),
            ),
            (
                "localTablesVersion",
                i64::from(self.identification.local_table_version),
            ),
            (
                "significanceOfReferenceTime",
                i64::from(self.identification.ref_time_significance),
            ),
            ("year", i64::from(self.identification.ref_time.year())),
            ("month", i64::from(self.identification.ref_time.month())),
            ("day", i64::from(self.identification.ref_time.day())),
            ("hour", i64::from(self.identification.ref_time.hour())),
            ("minute", i64::from(self.identification.ref_time.minute())),
            ("second", i64::from(self.identification.ref_time.second())),
            (
                "productionStatusOfProcessedData",
                i64::from(self.identification.prod_status),
            ),
            (
                "typeOfProcessedData",
                i64::from(self.identification.data_type),
            ),
            ("numberOfDataPoints", i64::from(self.grid.num_points())),
            (
                "gridDefinitionTemplateNumber",
                i64::from(self.grid.template.template_number()),
            ),
        ];
        self.push_grid_keys(&mut keys);
        self.push_product_keys(&mut keys);
        keys.extend([
            ("dataRepresentationTemplateNumber", 0),
            ("binaryScaleFactor", i64::from(self.repr.param.exp)),
            ("decimalScaleFactor", i64::from(self.repr.param.dig)),
            ("bitsPerValue", i64::from(self.repr.param.nbit)),
            ("bitMapIndicator", i64::from(self.bitmap.bitmap_indicator)),
        ]);
        keys
    }

    fn push_grid_keys(&self, keys: &mut Vec<(&'static str, i64)>) {
        let latlon = |keys: &mut Vec<(&'static str, i64)>,
                      def: &crate::grid::LatLonGridDefinition| {
            push_earth_keys(keys, &def.earth_shape);
            keys.extend([
                ("Ni", i64::from(def.ni)),
                ("Nj", i64::from(def.nj)),
                ("latitudeOfFirstGridPoint", i64::from(def.first_point_lat)),
                ("longitudeOfFirstGridPoint", i64::from(def.first_point_lon)),
                ("latitudeOfLastGridPoint", i64::from(def.last_point_lat)),
                ("longitudeOfLastGridPoint", i64::from(def.last_point_lon)),
                ("iDirectionIncrement", i64::from(def.i_increment)),
                ("jDirectionIncrement", i64::from(def.j_increment)),
                ("scanningMode", i64::from(def.scanning_mode.0)),
            ]);
        };
        match &self.grid.template {
            GridDefinitionTemplateValues::Template0(def) => latlon(keys, def),
            GridDefinitionTemplateValues::Template1(def) => {
                latlon(keys, &def.rotated);
                keys.extend([
                    (
                        "latitudeOfSouthernPole",
                        i64::from(def.rotation.south_pole_lat),
                    ),
                    (
                        "longitudeOfSouthernPole",
                        i64::from(def.rotation.south_pole_lon),
                    ),
                    (
                        "angleOfRotation",
                        i64::from(def.rotation.rotation_angle as i32),
                    ),
                ]);
            }
            GridDefinitionTemplateValues::Template30(def) => {
                push_earth_keys(keys, &def.earth_shape);
                keys.extend([
                    ("Nx", i64::from(def.ni)),
                    ("Ny", i64::from(def.nj)),
                    ("latitudeOfFirstGridPoint", i64::from(def.first_point_lat)),
                    ("longitudeOfFirstGridPoint", i64::from(def.first_point_lon)),
                    ("LaD", i64::from(def.lad)),
                    ("LoV", i64::from(def.lov)),
                    ("Dx", i64::from(def.dx)),
                    ("Dy", i64::from(def.dy)),
                    ("scanningMode", i64::from(def.scanning_mode.0)),
                    ("Latin1", i64::from(def.latin1)),
                    ("Latin2", i64::from(def.latin2)),
                ]);
            }
        }
    }

    fn push_product_keys(&self, keys: &mut Vec<(&'static str, i64)>) {
        keys.extend([
            (
                "productDefinitionTemplateNumber",
                i64::from(self.product.template_number()),
            ),
            (
                "parameterCategory",
                i64::from(self.product.parameter_category),
            ),
            ("parameterNumber", i64::from(self.product.parameter_number)),
            (
                "typeOfGeneratingProcess",
                i64::from(self.product.generating_process),
            ),
            (
                "backgroundProcess",
                i64::from(self.product.background_process),
            ),
            (
                "generatingProcessIdentifier",
                i64::from(self.product.process_id),
            ),
            (
                "indicatorOfUnitOfTimeRange",
                i64::from(u8::from(self.product.time_unit)),
            ),
            ("forecastTime", i64::from(self.product.forecast_time)),
        ]);
        push_surface_keys(
            keys,
            &self.product.first_surface,
            (
                "typeOfFirstFixedSurface",
                "scaleFactorOfFirstFixedSurface",
                "scaledValueOfFirstFixedSurface",
            ),
        );
        push_surface_keys(
            keys,
            &self.product.second_surface,
            (
                "typeOfSecondFixedSurface",
                "scaleFactorOfSecondFixedSurface",
                "scaledValueOfSecondFixedSurface",
            ),
        );
        if let Some(interval) = &self.product.interval {
            keys.extend([
                (
                    "typeOfStatisticalProcessing",
                    i64::from(u8::from(interval.statistic)),
                ),
                (
                    "typeOfTimeIncrement",
                    i64::from(u8::from(interval.increment_type)),
                ),
                (
                    "indicatorOfUnitForTimeRange",
                    i64::from(u8::from(interval.range_unit)),
                ),
                ("lengthOfTimeRange", i64::from(interval.range_length)),
            ]);
        }
    }
}

fn push_earth_keys(
    keys: &mut Vec<(&'static str, i64)>,
    earth: &crate::grid::EarthShapeDefinition,
) {
    keys.extend([
        ("shapeOfTheEarth", i64::from(earth.shape_of_the_earth)),
        (
            "scaleFactorOfRadiusOfSphericalEarth",
            i64::from(earth.scale_factor_of_radius_of_spherical_earth),
        ),
        (
            "scaledValueOfRadiusOfSphericalEarth",
            i64::from(earth.scaled_value_of_radius_of_spherical_earth),
        ),
        (
            "scaleFactorOfEarthMajorAxis",
            i64::from(earth.scale_factor_of_earth_major_axis),
        ),
        (
            "scaledValueOfEarthMajorAxis",
            i64::from(earth.scaled_value_of_earth_major_axis),
        ),
        (
            "scaleFactorOfEarthMinorAxis",
            i64::from(earth.scale_factor_of_earth_minor_axis),
        ),
        (
            "scaledValueOfEarthMinorAxis",
            i64::from(earth.scaled_value_of_earth_minor_axis),
        ),
    ]);
}

fn push_surface_keys(
    keys: &mut Vec<(&'static str, i64)>,
    surface: &FixedSurface,
    (type_key, factor_key, value_key): (&'static str, &'static str, &'static str),
) {
    keys.push((type_key, i64::from(surface.surface_type)));
    // missing fields surface the way GRIB tooling reports them: the raw
    // all-ones octet for the factor, the positive integer-max sentinel for
    // the value
    let factor: u8 = surface.scale_factor.as_grib_uint();
    keys.push((factor_key, i64::from(factor)));
    let value = if surface.value_is_missing() {
        i64::from(i32::MAX)
    } else {
        i64::from(surface.scaled_value)
    };
    keys.push((value_key, value));
}

fn push_section(out: &mut Vec<u8>, number: u8, write_payload: impl FnOnce(&mut Vec<u8>)) {
    let mut payload = Vec::new();
    write_payload(&mut payload);
    out.extend_from_slice(&((payload.len() + 5) as u32).to_be_bytes());
    out.push(number);
    out.extend(payload);
}

fn set_section<T>(slot: &mut Option<T>, number: u8, value: T) -> Result<(), TranslationError> {
    if slot.is_some() {
        return Err(TranslationError::new(format!(
            "repeated section {number}: multi-product messages are not supported"
        )));
    }
    *slot = Some(value);
    Ok(())
}

fn require_section<T>(slot: Option<T>, number: u8) -> Result<T, TranslationError> {
    slot.ok_or_else(|| TranslationError::new(format!("GRIB message has no section {number}")))
}
