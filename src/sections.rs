use chrono::{DateTime, Datelike, LocalResult, TimeZone, Timelike, Utc};

use crate::{
    codetables::{Table4_4, Table4_10, Table4_11},
    error::TranslationError,
    grid::GridDefinitionTemplateValues,
    helpers::{GribInt, GribUint, read_as},
    level::FixedSurface,
    packing::SimplePackingParam,
};

/// Section 0: Indicator Section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    /// Discipline - GRIB Master Table Number (see Code Table 0.0)
    pub discipline: u8,
    /// Total length of GRIB message in octets (including Section 0)
    pub total_length: u64,
}

impl Indicator {
    pub(crate) fn from_slice(slice: &[u8]) -> Result<Self, TranslationError> {
        if slice.len() < 16 || &slice[0..4] != b"GRIB" {
            return Err(TranslationError::new("not GRIB data"));
        }
        let discipline = slice[6];
        let version = slice[7];
        if version != 2 {
            return Err(TranslationError::new(format!(
                "not GRIB edition 2: {version}"
            )));
        }
        let total_length = read_as!(u64, slice, 8);
        Ok(Self {
            discipline,
            total_length,
        })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"GRIB");
        out.extend_from_slice(&[0xff, 0xff]);
        out.push(self.discipline);
        out.push(2);
        out.extend_from_slice(&self.total_length.to_be_bytes());
    }
}

/// Section 1: Identification Section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    /// Identification of originating/generating centre (see Common Code
    /// Table C-1)
    pub centre_id: u16,
    /// Identification of originating/generating sub-centre
    pub subcentre_id: u16,
    /// GRIB Master Tables Version Number (see Code Table 1.0)
    pub master_table_version: u8,
    /// GRIB Local Tables Version Number (see Code Table 1.1)
    pub local_table_version: u8,
    /// Significance of Reference Time (see Code Table 1.2)
    pub ref_time_significance: u8,
    /// Reference time of data
    pub ref_time: DateTime<Utc>,
    /// Production status of processed data (see Code Table 1.3)
    pub prod_status: u8,
    /// Type of processed data (see Code Table 1.4)
    pub data_type: u8,
}

pub(crate) fn require_len(buf: &[u8], len: usize, what: &str) -> Result<(), TranslationError> {
    if buf.len() < len {
        return Err(TranslationError::new(format!(
            "{what} of {} octets is too short ({len} expected)",
            buf.len()
        )));
    }
    Ok(())
}

impl Identification {
    pub(crate) fn from_payload(buf: &[u8]) -> Result<Self, TranslationError> {
        require_len(buf, 16, "identification section")?;
        let ref_time = create_date_time(
            i32::from(read_as!(u16, buf, 7)),
            u32::from(buf[9]),
            u32::from(buf[10]),
            u32::from(buf[11]),
            u32::from(buf[12]),
            u32::from(buf[13]),
        )?;
        Ok(Self {
            centre_id: read_as!(u16, buf, 0),
            subcentre_id: read_as!(u16, buf, 2),
            master_table_version: buf[4],
            local_table_version: buf[5],
            ref_time_significance: buf[6],
            ref_time,
            prod_status: buf[14],
            data_type: buf[15],
        })
    }

    pub(crate) fn to_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.centre_id.to_be_bytes());
        out.extend_from_slice(&self.subcentre_id.to_be_bytes());
        out.push(self.master_table_version);
        out.push(self.local_table_version);
        out.push(self.ref_time_significance);
        out.extend_from_slice(&(self.ref_time.year() as u16).to_be_bytes());
        out.push(self.ref_time.month() as u8);
        out.push(self.ref_time.day() as u8);
        out.push(self.ref_time.hour() as u8);
        out.push(self.ref_time.minute() as u8);
        out.push(self.ref_time.second() as u8);
        out.push(self.prod_status);
        out.push(self.data_type);
    }
}

#[inline]
fn create_date_time(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Result<DateTime<Utc>, TranslationError> {
    let result = Utc.with_ymd_and_hms(year, month, day, hour, minute, second);
    match result {
        LocalResult::None => Err(TranslationError::new(format!(
            "invalid date time: {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
        ))),
        result => Ok(result.unwrap()),
    }
}

/// Section 3: Grid Definition Section.
#[derive(Debug, PartialEq)]
pub struct GridDefinition {
    pub template: GridDefinitionTemplateValues,
}

impl GridDefinition {
    /// Number of data points
    pub fn num_points(&self) -> u32 {
        self.template.num_points()
    }

    pub(crate) fn from_payload(buf: &[u8]) -> Result<Self, TranslationError> {
        require_len(buf, 9, "grid definition section")?;
        let source = buf[0];
        if source != 0 {
            return Err(TranslationError::new(format!(
                "source of grid definition {source} is not supported"
            )));
        }
        let num_points = read_as!(u32, buf, 1);
        if buf[5] != 0 {
            return Err(TranslationError::new(
                "optional grid point lists are not supported",
            ));
        }
        let template_number = read_as!(u16, buf, 7);
        let template = GridDefinitionTemplateValues::from_payload(template_number, &buf[9..])?;
        if num_points != template.num_points() {
            return Err(TranslationError::new(format!(
                "number of data points {} does not match the {} grid points of the template",
                num_points,
                template.num_points()
            )));
        }
        Ok(Self { template })
    }

    pub(crate) fn to_payload(&self, out: &mut Vec<u8>) {
        out.push(0);
        out.extend_from_slice(&self.num_points().to_be_bytes());
        out.push(0);
        out.push(0);
        out.extend_from_slice(&self.template.template_number().to_be_bytes());
        self.template.to_payload(out);
    }
}

/// The statistical-processing tail of product definition template 4.8.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticalInterval {
    /// End of the overall time interval
    pub end: DateTime<Utc>,
    pub statistic: Table4_10,
    pub increment_type: Table4_11,
    pub range_unit: Table4_4,
    pub range_length: u32,
    pub increment_unit: Table4_4,
    pub increment: u32,
}

/// Section 4: Product Definition Section (templates 4.0 and 4.8).
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDefinition {
    /// Parameter category by product discipline (see Code Table 4.1)
    pub parameter_category: u8,
    pub parameter_number: u8,
    /// Type of generating process (see Code Table 4.3)
    pub generating_process: u8,
    pub background_process: u8,
    pub process_id: u8,
    pub cutoff_hours: u16,
    pub cutoff_minutes: u8,
    /// Indicator of unit of time range (see Code Table 4.4)
    pub time_unit: Table4_4,
    /// Forecast time, signed, in units of `time_unit`
    pub forecast_time: i32,
    pub first_surface: FixedSurface,
    pub second_surface: FixedSurface,
    pub interval: Option<StatisticalInterval>,
}

impl ProductDefinition {
    /// Product Definition Template Number
    pub fn template_number(&self) -> u16 {
        if self.interval.is_some() { 8 } else { 0 }
    }

    pub(crate) fn from_payload(buf: &[u8]) -> Result<Self, TranslationError> {
        require_len(buf, 29, "product definition section")?;
        let num_coordinates = read_as!(u16, buf, 0);
        if num_coordinates != 0 {
            return Err(TranslationError::new(
                "coordinate values after the product template are not supported",
            ));
        }
        let template_number = read_as!(u16, buf, 2);
        if template_number != 0 && template_number != 8 {
            return Err(TranslationError::new(format!(
                "product definition template {template_number} is not supported"
            )));
        }
        let time_unit = Table4_4::try_from(buf[12]).map_err(|_| {
            TranslationError::new(format!("time range unit {} is not supported", buf[12]))
        })?;
        let first_surface = read_surface(buf, 17);
        let second_surface = read_surface(buf, 23);

        let interval = if template_number == 8 {
            require_len(buf, 53, "statistical product definition section")?;
            let end = create_date_time(
                i32::from(read_as!(u16, buf, 29)),
                u32::from(buf[31]),
                u32::from(buf[32]),
                u32::from(buf[33]),
                u32::from(buf[34]),
                u32::from(buf[35]),
            )?;
            let num_ranges = buf[36];
            if num_ranges != 1 {
                return Err(TranslationError::new(format!(
                    "{num_ranges} statistical time ranges are not supported"
                )));
            }
            let statistic = Table4_10::try_from(buf[41]).map_err(|_| {
                TranslationError::new(format!(
                    "statistical processing {} is not supported",
                    buf[41]
                ))
            })?;
            let increment_type = Table4_11::try_from(buf[42]).map_err(|_| {
                TranslationError::new(format!("time increment type {} is not supported", buf[42]))
            })?;
            let range_unit = Table4_4::try_from(buf[43]).map_err(|_| {
                TranslationError::new(format!("time range unit {} is not supported", buf[43]))
            })?;
            let increment_unit = Table4_4::try_from(buf[48]).map_err(|_| {
                TranslationError::new(format!("time increment unit {} is not supported", buf[48]))
            })?;
            Some(StatisticalInterval {
                end,
                statistic,
                increment_type,
                range_unit,
                range_length: read_as!(u32, buf, 44),
                increment_unit,
                increment: read_as!(u32, buf, 49),
            })
        } else {
            None
        };

        Ok(Self {
            parameter_category: buf[4],
            parameter_number: buf[5],
            generating_process: buf[6],
            background_process: buf[7],
            process_id: buf[8],
            cutoff_hours: read_as!(u16, buf, 9),
            cutoff_minutes: buf[11],
            time_unit,
            forecast_time: read_as!(u32, buf, 13).as_grib_int(),
            first_surface,
            second_surface,
            interval,
        })
    }

    pub(crate) fn to_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&self.template_number().to_be_bytes());
        out.push(self.parameter_category);
        out.push(self.parameter_number);
        out.push(self.generating_process);
        out.push(self.background_process);
        out.push(self.process_id);
        out.extend_from_slice(&self.cutoff_hours.to_be_bytes());
        out.push(self.cutoff_minutes);
        out.push(u8::from(self.time_unit));
        out.extend_from_slice(&self.forecast_time.as_grib_uint().to_be_bytes());
        write_surface(out, &self.first_surface);
        write_surface(out, &self.second_surface);

        if let Some(interval) = &self.interval {
            out.extend_from_slice(&(interval.end.year() as u16).to_be_bytes());
            out.push(interval.end.month() as u8);
            out.push(interval.end.day() as u8);
            out.push(interval.end.hour() as u8);
            out.push(interval.end.minute() as u8);
            out.push(interval.end.second() as u8);
            out.push(1);
            out.extend_from_slice(&0u32.to_be_bytes());
            out.push(u8::from(interval.statistic));
            out.push(u8::from(interval.increment_type));
            out.push(u8::from(interval.range_unit));
            out.extend_from_slice(&interval.range_length.to_be_bytes());
            out.push(u8::from(interval.increment_unit));
            out.extend_from_slice(&interval.increment.to_be_bytes());
        }
    }
}

fn read_surface(buf: &[u8], index: usize) -> FixedSurface {
    let surface_type = buf[index];
    let scale_factor = buf[index + 1].as_grib_int();
    let scaled_value = read_as!(u32, buf, index + 2).as_grib_int();
    FixedSurface::new(surface_type, scale_factor, scaled_value)
}

fn write_surface(out: &mut Vec<u8>, surface: &FixedSurface) {
    out.push(surface.surface_type);
    out.push(surface.scale_factor.as_grib_uint());
    out.extend_from_slice(&surface.scaled_value.as_grib_uint().to_be_bytes());
}

/// Section 5: Data Representation Section (template 5.0, simple packing).
#[derive(Debug, Clone, PartialEq)]
pub struct ReprDefinition {
    /// Number of data points to which the section applies
    pub num_points: u32,
    pub param: SimplePackingParam,
    /// Type of original field values (see Code Table 5.1)
    pub original_field_type: u8,
}

impl ReprDefinition {
    pub(crate) fn from_payload(buf: &[u8]) -> Result<Self, TranslationError> {
        require_len(buf, 16, "data representation section")?;
        let template_number = read_as!(u16, buf, 4);
        if template_number != 0 {
            return Err(TranslationError::new(format!(
                "data representation template {template_number} is not supported"
            )));
        }
        Ok(Self {
            num_points: read_as!(u32, buf, 0),
            param: SimplePackingParam::from_payload(&buf[6..]),
            original_field_type: buf[15],
        })
    }

    pub(crate) fn to_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.num_points.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        self.param.to_payload(out);
        out.push(self.original_field_type);
    }
}

/// Section 6: Bit-Map Section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMap {
    /// Bit-map indicator (see Code Table 6.0)
    pub bitmap_indicator: u8,
}
