use crate::{
    cube::EarthFigure,
    error::TranslationError,
    helpers::read_as,
    scaled::{from_wire_unsigned, to_wire_unsigned},
};

/// The shape-of-the-earth block shared by grid definition templates
/// (octets 15-30 of Section 3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarthShapeDefinition {
    pub shape_of_the_earth: u8,
    pub scale_factor_of_radius_of_spherical_earth: u8,
    pub scaled_value_of_radius_of_spherical_earth: u32,
    pub scale_factor_of_earth_major_axis: u8,
    pub scaled_value_of_earth_major_axis: u32,
    pub scale_factor_of_earth_minor_axis: u8,
    pub scaled_value_of_earth_minor_axis: u32,
}

impl EarthShapeDefinition {
    pub(crate) fn from_figure(figure: &EarthFigure) -> Result<Self, TranslationError> {
        let (shape, radius, major, minor) = match figure {
            EarthFigure::Default => (0, None, None, None),
            EarthFigure::Sphere { radius } => (1, Some(*radius), None, None),
            EarthFigure::Ellipsoid {
                semi_major,
                semi_minor,
            } => (7, None, Some(*semi_major), Some(*semi_minor)),
        };
        let (radius_factor, radius_value) = to_wire_unsigned(radius)?;
        let (major_factor, major_value) = to_wire_unsigned(major)?;
        let (minor_factor, minor_value) = to_wire_unsigned(minor)?;
        Ok(Self {
            shape_of_the_earth: shape,
            scale_factor_of_radius_of_spherical_earth: radius_factor,
            scaled_value_of_radius_of_spherical_earth: radius_value,
            scale_factor_of_earth_major_axis: major_factor,
            scaled_value_of_earth_major_axis: major_value,
            scale_factor_of_earth_minor_axis: minor_factor,
            scaled_value_of_earth_minor_axis: minor_value,
        })
    }

    pub(crate) fn to_figure(&self) -> Result<EarthFigure, TranslationError> {
        let figure = match self.shape_of_the_earth {
            // The implied figure, made concrete so that it re-encodes as an
            // explicit sphere.
            0 => EarthFigure::Sphere { radius: 6_367_470. },
            1 => {
                let radius = from_wire_unsigned(
                    self.scale_factor_of_radius_of_spherical_earth,
                    self.scaled_value_of_radius_of_spherical_earth,
                )?
                .ok_or_else(|| {
                    TranslationError::new(
                        "shape of the earth 1 (spherical) with a missing radius field",
                    )
                })?;
                EarthFigure::Sphere {
                    radius: radius.value(),
                }
            }
            2 => EarthFigure::Ellipsoid {
                semi_major: 6_378_160.,
                semi_minor: 6_356_775.,
            },
            shape @ (3 | 7) => {
                let major = from_wire_unsigned(
                    self.scale_factor_of_earth_major_axis,
                    self.scaled_value_of_earth_major_axis,
                )?;
                let minor = from_wire_unsigned(
                    self.scale_factor_of_earth_minor_axis,
                    self.scaled_value_of_earth_minor_axis,
                )?;
                let (major, minor) = major.zip(minor).ok_or_else(|| {
                    TranslationError::new(format!(
                        "shape of the earth {shape} (ellipsoidal) with missing axis fields"
                    ))
                })?;
                let unit = if shape == 3 { 1000. } else { 1. };
                EarthFigure::Ellipsoid {
                    semi_major: major.value() * unit,
                    semi_minor: minor.value() * unit,
                }
            }
            4 => EarthFigure::Ellipsoid {
                semi_major: 6_378_137.,
                semi_minor: 6_356_752.314,
            },
            // WGS84
            5 => EarthFigure::Ellipsoid {
                semi_major: 6_378_137.,
                semi_minor: 6_356_752.3142,
            },
            6 => EarthFigure::Sphere { radius: 6_371_229. },
            8 => EarthFigure::Sphere { radius: 6_371_200. },
            shape => {
                return Err(TranslationError::new(format!(
                    "shape of the earth {shape} is not supported"
                )));
            }
        };
        Ok(figure)
    }

    pub(crate) fn from_payload(buf: &[u8]) -> Self {
        let shape_of_the_earth = read_as!(u8, buf, 0);
        let scale_factor_of_radius_of_spherical_earth = read_as!(u8, buf, 1);
        let scaled_value_of_radius_of_spherical_earth = read_as!(u32, buf, 2);
        let scale_factor_of_earth_major_axis = read_as!(u8, buf, 6);
        let scaled_value_of_earth_major_axis = read_as!(u32, buf, 7);
        let scale_factor_of_earth_minor_axis = read_as!(u8, buf, 11);
        let scaled_value_of_earth_minor_axis = read_as!(u32, buf, 12);
        Self {
            shape_of_the_earth,
            scale_factor_of_radius_of_spherical_earth,
            scaled_value_of_radius_of_spherical_earth,
            scale_factor_of_earth_major_axis,
            scaled_value_of_earth_major_axis,
            scale_factor_of_earth_minor_axis,
            scaled_value_of_earth_minor_axis,
        }
    }

    pub(crate) fn to_payload(&self, out: &mut Vec<u8>) {
        out.push(self.shape_of_the_earth);
        out.push(self.scale_factor_of_radius_of_spherical_earth);
        out.extend_from_slice(&self.scaled_value_of_radius_of_spherical_earth.to_be_bytes());
        out.push(self.scale_factor_of_earth_major_axis);
        out.extend_from_slice(&self.scaled_value_of_earth_major_axis.to_be_bytes());
        out.push(self.scale_factor_of_earth_minor_axis);
        out.extend_from_slice(&self.scaled_value_of_earth_minor_axis.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaled::{MDI, MDI_U8};

    #[test]
    fn sphere_figure_sets_radius_and_leaves_ellipsoid_fields_missing() {
        let earth = EarthShapeDefinition::from_figure(&EarthFigure::Sphere {
            radius: 6_367_470.,
        })
        .unwrap();
        assert_eq!(earth.shape_of_the_earth, 1);
        assert_eq!(earth.scale_factor_of_radius_of_spherical_earth, 0);
        assert_eq!(earth.scaled_value_of_radius_of_spherical_earth, 6_367_470);
        assert_eq!(earth.scale_factor_of_earth_major_axis, MDI_U8);
        assert_eq!(earth.scaled_value_of_earth_major_axis, MDI);
        assert_eq!(earth.scaled_value_of_earth_minor_axis, MDI);
    }

    #[test]
    fn default_figure_sets_shape_zero_with_all_fields_missing() {
        let earth = EarthShapeDefinition::from_figure(&EarthFigure::Default).unwrap();
        assert_eq!(earth.shape_of_the_earth, 0);
        assert_eq!(earth.scale_factor_of_radius_of_spherical_earth, MDI_U8);
        assert_eq!(earth.scaled_value_of_radius_of_spherical_earth, MDI);
        assert_eq!(earth.scaled_value_of_earth_major_axis, MDI);
    }

    #[test]
    fn shape_zero_decodes_to_the_implied_sphere() {
        let earth = EarthShapeDefinition::from_figure(&EarthFigure::Default).unwrap();
        assert_eq!(
            earth.to_figure().unwrap(),
            EarthFigure::Sphere { radius: 6_367_470. }
        );
    }

    #[test]
    fn sphere_without_radius_is_inconsistent() {
        let mut earth = EarthShapeDefinition::from_figure(&EarthFigure::Default).unwrap();
        earth.shape_of_the_earth = 1;
        assert!(earth.to_figure().is_err());
    }

    #[test]
    fn unknown_shape_is_not_supported() {
        let mut earth = EarthShapeDefinition::from_figure(&EarthFigure::Default).unwrap();
        earth.shape_of_the_earth = 9;
        assert!(earth.to_figure().is_err());
    }

    #[test]
    fn ellipsoid_roundtrip_through_payload() {
        let figure = EarthFigure::Ellipsoid {
            semi_major: 6_378_160.,
            semi_minor: 6_356_775.,
        };
        let earth = EarthShapeDefinition::from_figure(&figure).unwrap();
        assert_eq!(earth.shape_of_the_earth, 7);

        let mut buf = Vec::new();
        earth.to_payload(&mut buf);
        assert_eq!(buf.len(), 16);
        let decoded = EarthShapeDefinition::from_payload(&buf);
        assert_eq!(decoded, earth);
        assert_eq!(decoded.to_figure().unwrap(), figure);
    }

    #[test]
    fn radii_for_shape_1() {
        let earth = EarthShapeDefinition {
            shape_of_the_earth: 1,
            scale_factor_of_radius_of_spherical_earth: 0,
            scaled_value_of_radius_of_spherical_earth: 6_371_200,
            scale_factor_of_earth_major_axis: MDI_U8,
            scaled_value_of_earth_major_axis: MDI,
            scale_factor_of_earth_minor_axis: MDI_U8,
            scaled_value_of_earth_minor_axis: MDI,
        };
        assert_eq!(
            earth.to_figure().unwrap().radii(),
            (6_371_200., 6_371_200.)
        );
    }
}
