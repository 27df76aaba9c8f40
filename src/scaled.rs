use crate::error::TranslationError;

/// Missing-data indicator for unsigned 4-octet wire fields.
pub const MDI: u32 = 0xffff_ffff;
pub(crate) const MDI_U8: u8 = 0xff;

/// Sign-magnitude all-bits-one sentinel for a missing signed scale factor.
pub(crate) const MISSING_SCALE_FACTOR: i8 = i8::MIN + 1;
/// Sign-magnitude all-bits-one sentinel for a missing signed scaled value.
pub(crate) const MISSING_SCALED_VALUE: i32 = i32::MIN + 1;

/// GRIB's fixed-point encoding of a real value:
/// value = `scaled_value` x 10^(-`scale_factor`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledValue {
    pub scale_factor: i8,
    pub scaled_value: i64,
}

impl ScaledValue {
    const MAX_EXACT_FACTOR: i8 = 9;
    const DEFAULT_FACTOR: i8 = 6;

    /// Encodes a real value with the smallest scale factor that represents
    /// it exactly, falling back to a fixed default precision (clamped to
    /// what fits a 4-octet field) when no exact factor exists.
    pub fn from_value(value: f64) -> Result<Self, TranslationError> {
        if !value.is_finite() {
            return Err(TranslationError::new(format!(
                "cannot encode non-finite value {value} as a scaled value"
            )));
        }
        for scale_factor in 0..=Self::MAX_EXACT_FACTOR {
            let scaled = value * 10f64.powi(i32::from(scale_factor));
            let rounded = scaled.round();
            if rounded.abs() >= i32::MAX as f64 {
                break;
            }
            if (scaled - rounded).abs() <= 1e-9 * scaled.abs().max(1.) {
                return Ok(Self {
                    scale_factor,
                    scaled_value: rounded as i64,
                });
            }
        }
        let mut scale_factor = Self::DEFAULT_FACTOR;
        loop {
            let scaled = (value * 10f64.powi(i32::from(scale_factor))).round();
            if scaled.abs() < i32::MAX as f64 {
                return Ok(Self {
                    scale_factor,
                    scaled_value: scaled as i64,
                });
            }
            if scale_factor == 0 {
                return Err(TranslationError::new(format!(
                    "value {value} does not fit a 4-octet scaled value"
                )));
            }
            scale_factor -= 1;
        }
    }

    /// Decodes the represented real value.
    pub fn value(&self) -> f64 {
        self.scaled_value as f64 * 10f64.powi(-i32::from(self.scale_factor))
    }
}

/// Encodes an optional value into the unsigned (scale factor, scaled value)
/// octet pair used by Section 3; an absent value always becomes the MDI
/// sentinel pair.
pub(crate) fn to_wire_unsigned(value: Option<f64>) -> Result<(u8, u32), TranslationError> {
    match value {
        None => Ok((MDI_U8, MDI)),
        Some(v) => {
            let sv = ScaledValue::from_value(v)?;
            if sv.scaled_value < 0 {
                return Err(TranslationError::new(format!(
                    "negative value {v} in an unsigned scaled field"
                )));
            }
            Ok((sv.scale_factor as u8, sv.scaled_value as u32))
        }
    }
}

/// Decodes the unsigned wire pair. The MDI sentinel pair yields `None`; a
/// half-missing pair is self-inconsistent and fails.
pub(crate) fn from_wire_unsigned(
    factor: u8,
    value: u32,
) -> Result<Option<ScaledValue>, TranslationError> {
    match (factor == MDI_U8, value == MDI) {
        (true, true) => Ok(None),
        (false, false) => Ok(Some(ScaledValue {
            scale_factor: factor as i8,
            scaled_value: i64::from(value),
        })),
        _ => Err(TranslationError::new(format!(
            "inconsistent scaled value: factor {factor}, value {value}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_scaled_value_encoding {
        ($(($name:ident, $value:expr, $factor:expr, $scaled:expr),)*) => ($(
            #[test]
            fn $name() {
                let sv = ScaledValue::from_value($value).unwrap();
                assert_eq!(sv.scale_factor, $factor);
                assert_eq!(sv.scaled_value, $scaled);
                assert!((sv.value() - $value).abs() <= 1e-9 * ($value as f64).abs().max(1.));
            }
        )*);
    }

    test_scaled_value_encoding! {
        (encode_spherical_earth_radius, 6_367_470., 0, 6_367_470),
        (encode_default_sphere_radius, 6_371_229., 0, 6_371_229),
        (encode_zero, 0., 0, 0),
        (encode_integer_pressure, 20_000., 0, 20_000),
        (encode_negative_integer, -6., 0, -6),
        (encode_tenth, 0.1, 1, 1),
        (encode_one_and_a_half, 1.5, 1, 15),
        (encode_thousandth, 0.001, 3, 1),
    }

    #[test]
    fn encode_value_whose_exact_factor_overflows_clamps_precision() {
        // The WGS84 minor axis would need factor 4 and an 11-digit scaled
        // value; the encoding rounds at the largest factor that fits.
        let sv = ScaledValue::from_value(6_356_752.3142).unwrap();
        assert_eq!(sv.scale_factor, 2);
        assert_eq!(sv.scaled_value, 635_675_231);
        assert!((sv.value() - 6_356_752.3142).abs() < 0.01);
    }

    #[test]
    fn encode_irrational_value_uses_default_precision() {
        let sv = ScaledValue::from_value(1. / 3.).unwrap();
        assert_eq!(sv.scale_factor, 6);
        assert_eq!(sv.scaled_value, 333_333);
    }

    #[test]
    fn encode_non_finite_value_fails() {
        assert!(ScaledValue::from_value(f64::NAN).is_err());
        assert!(ScaledValue::from_value(f64::INFINITY).is_err());
    }

    #[test]
    fn absent_value_always_becomes_the_mdi_pair() {
        assert_eq!(to_wire_unsigned(None).unwrap(), (MDI_U8, MDI));
    }

    #[test]
    fn mdi_pair_always_decodes_to_absent() {
        assert_eq!(from_wire_unsigned(MDI_U8, MDI).unwrap(), None);
    }

    #[test]
    fn half_missing_pair_is_inconsistent() {
        assert!(from_wire_unsigned(MDI_U8, 6_367_470).is_err());
        assert!(from_wire_unsigned(0, MDI).is_err());
    }

    #[test]
    fn wire_roundtrip_of_a_real_value() {
        let (factor, value) = to_wire_unsigned(Some(6_367_470.)).unwrap();
        assert_eq!((factor, value), (0, 6_367_470));
        let decoded = from_wire_unsigned(factor, value).unwrap().unwrap();
        assert_eq!(decoded.value(), 6_367_470.);
    }
}
