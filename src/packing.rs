use num::ToPrimitive;

use crate::{
    error::TranslationError,
    helpers::{GribInt, GribUint, NBitwiseIterator, NBitwiseWriter, read_as},
};

/// Exactly representable span of an `f32`; integer fields inside it pack
/// and unpack without loss.
const F32_EXACT_INT: f64 = 16_777_216.;

/// Simple packing parameters (Data Representation Template 5.0).
#[derive(Debug, Clone, PartialEq)]
pub struct SimplePackingParam {
    pub ref_val: f32,
    /// Binary scale factor (E).
    pub exp: i16,
    /// Decimal scale factor (D).
    pub dig: i16,
    pub nbit: u8,
}

impl SimplePackingParam {
    /// The field value of a constant (zero-data-bit) field.
    pub(crate) fn zero_bit_reference_value(&self) -> f32 {
        self.ref_val * 10_f32.powi(-i32::from(self.dig))
    }

    pub(crate) fn from_payload(buf: &[u8]) -> Self {
        let ref_val = read_as!(f32, buf, 0);
        let exp = read_as!(u16, buf, 4).as_grib_int();
        let dig = read_as!(u16, buf, 6).as_grib_int();
        let nbit = read_as!(u8, buf, 8);
        Self {
            ref_val,
            exp,
            dig,
            nbit,
        }
    }

    pub(crate) fn to_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.ref_val.to_be_bytes());
        out.extend_from_slice(&self.exp.as_grib_uint().to_be_bytes());
        out.extend_from_slice(&self.dig.as_grib_uint().to_be_bytes());
        out.push(self.nbit);
    }
}

/// Packs field values with simple packing.
///
/// Integer-valued fields within the exact `f32` span pack losslessly with
/// zero binary/decimal scale; constant fields pack with zero data bits and
/// the reference value; anything else packs into 16 bits per value with the
/// smallest binary scale factor covering the range.
pub(crate) fn encode(values: &[f64]) -> Result<(SimplePackingParam, Vec<u8>), TranslationError> {
    if values.is_empty() {
        return Err(TranslationError::new("cannot encode an empty data field"));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(TranslationError::new(
            "cannot encode non-finite data values without a bit-map",
        ));
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        let param = SimplePackingParam {
            ref_val: min as f32,
            exp: 0,
            dig: 0,
            nbit: 0,
        };
        return Ok((param, Vec::new()));
    }

    let integral = values.iter().all(|v| v.fract() == 0.)
        && min.abs() <= F32_EXACT_INT
        && max.abs() <= F32_EXACT_INT;
    if integral {
        let range = (max - min) as u64;
        let nbit = (u64::BITS - range.leading_zeros()) as u8;
        let mut writer = NBitwiseWriter::new(usize::from(nbit));
        for v in values {
            writer.push((v - min) as u32);
        }
        let param = SimplePackingParam {
            ref_val: min as f32,
            exp: 0,
            dig: 0,
            nbit,
        };
        return Ok((param, writer.into_bytes()));
    }

    let nbit = 16u8;
    let ref_val = min as f32;
    let span = f64::from((1u32 << nbit) - 1);
    let range = max - f64::from(ref_val);
    let mut exp: i16 = 0;
    while range / 2_f64.powi(i32::from(exp)) > span {
        exp += 1;
    }
    while exp > -24 && range / 2_f64.powi(i32::from(exp) - 1) <= span {
        exp -= 1;
    }
    let scale = 2_f64.powi(i32::from(exp));
    let mut writer = NBitwiseWriter::new(usize::from(nbit));
    for v in values {
        let encoded = ((v - f64::from(ref_val)) / scale).round();
        writer.push(encoded.clamp(0., span) as u32);
    }
    let param = SimplePackingParam {
        ref_val,
        exp,
        dig: 0,
        nbit,
    };
    Ok((param, writer.into_bytes()))
}

/// Unpacks a simple-packed data payload into field values.
pub(crate) fn decode(
    param: &SimplePackingParam,
    data: &[u8],
    num_points: usize,
) -> Result<Vec<f64>, TranslationError> {
    if param.nbit == 0 {
        // Constant field: every grid point carries the reference value.
        return Ok(vec![f64::from(param.zero_bit_reference_value()); num_points]);
    }
    let iter = NBitwiseIterator::new(data, usize::from(param.nbit));
    let values = SimplePackingDecodeIterator::new(iter, param)
        .take(num_points)
        .map(f64::from)
        .collect::<Vec<_>>();
    if values.len() != num_points {
        return Err(TranslationError::new(format!(
            "data section holds {} of {} expected values",
            values.len(),
            num_points
        )));
    }
    Ok(values)
}

pub(crate) struct SimplePackingDecodeIterator<I> {
    iter: I,
    ref_val: f32,
    exp: i32,
    dig: i32,
}

impl<I> SimplePackingDecodeIterator<I> {
    pub(crate) fn new(iter: I, param: &SimplePackingParam) -> Self {
        Self {
            iter,
            ref_val: param.ref_val,
            exp: param.exp.into(),
            dig: param.dig.into(),
        }
    }
}

impl<I: Iterator<Item = N>, N: ToPrimitive> Iterator for SimplePackingDecodeIterator<I> {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        match self.iter.next() {
            Some(encoded) => {
                let encoded = encoded.to_f32()?;
                let diff = encoded * 2_f32.powi(self.exp);
                let dig_factor = 10_f32.powi(-self.dig);
                Some((self.ref_val + diff) * dig_factor)
            }
            _ => None,
        }
    }
}
