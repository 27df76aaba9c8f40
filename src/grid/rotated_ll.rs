use super::{LatLonGridDefinition, degrees_to_micro, micro_to_degrees, normalize_lon};
use crate::{
    cube::{Coord, CoordSystem, GeodeticCs, RotatedPoleCs},
    error::TranslationError,
    helpers::{GribInt, GribUint, read_as},
};

/// Pole position and rotation angle of a rotated latitude/longitude grid.
///
/// GRIB encodes the southern pole of projection; the cube model carries the
/// rotated north pole.
#[derive(Debug, PartialEq, Clone)]
pub struct Rotation {
    pub south_pole_lat: i32,
    pub south_pole_lon: i32,
    pub rotation_angle: f32,
}

/// Grid definition template 3.1: rotated latitude/longitude grid.
#[derive(Debug, PartialEq)]
pub struct RotatedLatLonGridDefinition {
    pub rotated: LatLonGridDefinition,
    pub rotation: Rotation,
}

impl RotatedLatLonGridDefinition {
    /// Returns the shape of the grid, i.e. a tuple of the number of grids in
    /// the i and j directions.
    pub fn grid_shape(&self) -> (usize, usize) {
        self.rotated.grid_shape()
    }

    /// Returns the grid type.
    pub fn short_name(&self) -> &'static str {
        "rotated_ll"
    }

    pub(crate) fn from_cube_coords(
        grid_lat: &Coord,
        grid_lon: &Coord,
        cs: &RotatedPoleCs,
    ) -> Result<Self, TranslationError> {
        let rotated = LatLonGridDefinition::from_cube_coords(grid_lat, grid_lon, &cs.base)?;
        let rotation = Rotation {
            south_pole_lat: degrees_to_micro(-cs.north_pole_lat),
            south_pole_lon: degrees_to_micro(normalize_lon(cs.north_pole_lon + 180.)),
            rotation_angle: 0.,
        };
        Ok(Self { rotated, rotation })
    }

    /// Reconstructs the (grid_latitude, grid_longitude) coordinate pair.
    pub(crate) fn to_cube_coords(&self) -> Result<(Coord, Coord), TranslationError> {
        let cs = CoordSystem::RotatedPole(RotatedPoleCs {
            base: GeodeticCs {
                figure: self.rotated.earth_shape.to_figure()?,
            },
            north_pole_lat: -micro_to_degrees(i64::from(self.rotation.south_pole_lat)),
            north_pole_lon: normalize_lon(
                micro_to_degrees(i64::from(self.rotation.south_pole_lon)) - 180.,
            ),
        });
        let (lat, lon) = self.rotated.axes("grid_latitude", "grid_longitude")?;
        Ok((
            lat.with_coord_system(cs.clone()),
            lon.with_coord_system(cs),
        ))
    }

    pub(crate) fn from_payload(buf: &[u8]) -> Result<Self, TranslationError> {
        crate::sections::require_len(buf, 70, "rotated latitude/longitude grid template")?;
        let rotated = LatLonGridDefinition::from_payload(buf)?;
        let south_pole_lat = read_as!(u32, buf, 58).as_grib_int();
        let south_pole_lon = read_as!(u32, buf, 62).as_grib_int();
        let rotation_angle = read_as!(f32, buf, 66);
        Ok(Self {
            rotated,
            rotation: Rotation {
                south_pole_lat,
                south_pole_lon,
                rotation_angle,
            },
        })
    }

    pub(crate) fn to_payload(&self, out: &mut Vec<u8>) {
        self.rotated.to_payload(out);
        out.extend_from_slice(&self.rotation.south_pole_lat.as_grib_uint().to_be_bytes());
        out.extend_from_slice(&self.rotation.south_pole_lon.as_grib_uint().to_be_bytes());
        out.extend_from_slice(&self.rotation.rotation_angle.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cube::EarthFigure, units::Unit};

    fn rotated_cs() -> RotatedPoleCs {
        RotatedPoleCs {
            base: GeodeticCs::sphere(6_371_229.),
            north_pole_lon: 177.5,
            north_pole_lat: 37.5,
        }
    }

    #[test]
    fn pole_converts_to_southern_pole_of_projection() {
        let grid_lat = Coord::new("grid_latitude", Unit::Degrees, vec![-2., -1., 0.]);
        let grid_lon = Coord::new("grid_longitude", Unit::Degrees, vec![-3., -2.]);
        let def =
            RotatedLatLonGridDefinition::from_cube_coords(&grid_lat, &grid_lon, &rotated_cs())
                .unwrap();
        assert_eq!(def.rotation.south_pole_lat, -37_500_000);
        assert_eq!(def.rotation.south_pole_lon, 357_500_000);
        assert_eq!(def.rotation.rotation_angle, 0.);
    }

    #[test]
    fn payload_and_coords_roundtrip() {
        let grid_lat = Coord::new("grid_latitude", Unit::Degrees, vec![-2., -1., 0.]);
        let grid_lon = Coord::new("grid_longitude", Unit::Degrees, vec![-3., -2.]);
        let def =
            RotatedLatLonGridDefinition::from_cube_coords(&grid_lat, &grid_lon, &rotated_cs())
                .unwrap();

        let mut buf = Vec::new();
        def.to_payload(&mut buf);
        assert_eq!(buf.len(), 70);
        let decoded = RotatedLatLonGridDefinition::from_payload(&buf).unwrap();
        assert_eq!(decoded, def);

        let (lat, lon) = decoded.to_cube_coords().unwrap();
        assert_eq!(lat.name, "grid_latitude");
        assert_eq!(lat.points, vec![-2., -1., 0.]);
        // grid longitudes come back in the [0, 360) convention
        assert_eq!(lon.points, vec![357., 358.]);
        match lon.coord_system {
            Some(CoordSystem::RotatedPole(cs)) => {
                assert_eq!(cs.north_pole_lat, 37.5);
                assert_eq!(cs.north_pole_lon, 177.5);
                assert_eq!(
                    cs.base.figure,
                    EarthFigure::Sphere { radius: 6_371_229. }
                );
            }
            other => panic!("unexpected coordinate system: {other:?}"),
        }
    }
}
