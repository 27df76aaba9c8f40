use super::{
    EarthShapeDefinition, RegularAxis, ScanningMode, degrees_to_micro, micro_to_degrees,
    normalize_lon,
};
use crate::{
    cube::{Coord, CoordSystem, GeodeticCs},
    error::TranslationError,
    helpers::{GribInt, GribUint, read_as},
    scaled::MDI,
    units::Unit,
};

const MICRO_FULL_CIRCLE: i64 = 360_000_000;

/// Grid definition template 3.0: latitude/longitude (equidistant
/// cylindrical) grid.
#[derive(Debug, PartialEq)]
pub struct LatLonGridDefinition {
    pub earth_shape: EarthShapeDefinition,
    pub ni: u32,
    pub nj: u32,
    pub first_point_lat: i32,
    pub first_point_lon: i32,
    pub last_point_lat: i32,
    pub last_point_lon: i32,
    pub i_increment: u32,
    pub j_increment: u32,
    pub scanning_mode: ScanningMode,
}

impl LatLonGridDefinition {
    /// Returns the shape of the grid, i.e. a tuple of the number of grids in
    /// the i and j directions.
    pub fn grid_shape(&self) -> (usize, usize) {
        (self.ni as usize, self.nj as usize)
    }

    /// Returns the grid type.
    pub fn short_name(&self) -> &'static str {
        "regular_ll"
    }

    /// Builds the template values from a latitude/longitude coordinate pair.
    ///
    /// Longitudes are converted to the GRIB angular convention: normalized
    /// into [0, 360) and scaled to micro-degrees.
    pub(crate) fn from_cube_coords(
        lat: &Coord,
        lon: &Coord,
        cs: &GeodeticCs,
    ) -> Result<Self, TranslationError> {
        for coord in [lat, lon] {
            if coord.units != Unit::Degrees {
                return Err(TranslationError::new(format!(
                    "coordinate '{}' has unit '{}'; grid axes must be in degrees",
                    coord.name, coord.units
                )));
            }
        }
        let lat_axis = RegularAxis::from_points(&lat.name, &lat.points)?;
        let lon_axis = RegularAxis::from_points(&lon.name, &lon.points)?;

        Ok(Self {
            earth_shape: EarthShapeDefinition::from_figure(&cs.figure)?,
            ni: lon_axis.count as u32,
            nj: lat_axis.count as u32,
            first_point_lat: degrees_to_micro(lat_axis.start),
            first_point_lon: degrees_to_micro(normalize_lon(lon_axis.start)),
            last_point_lat: degrees_to_micro(lat_axis.last()),
            last_point_lon: degrees_to_micro(normalize_lon(lon_axis.last())),
            i_increment: degrees_to_micro(lon_axis.step.abs()) as u32,
            j_increment: degrees_to_micro(lat_axis.step.abs()) as u32,
            scanning_mode: ScanningMode::from_directions(lon_axis.step > 0., lat_axis.step > 0.),
        })
    }

    /// Reconstructs the (latitude, longitude) coordinate pair.
    pub(crate) fn to_cube_coords(&self) -> Result<(Coord, Coord), TranslationError> {
        let cs = CoordSystem::Geodetic(GeodeticCs {
            figure: self.earth_shape.to_figure()?,
        });
        let (lat, lon) = self.axes("latitude", "longitude")?;
        Ok((
            lat.with_coord_system(cs.clone()),
            lon.with_coord_system(cs),
        ))
    }

    /// Expands first/last points and increments into coordinate points,
    /// checking them against the encoded last-point keys.
    pub(crate) fn axes(
        &self,
        lat_name: &str,
        lon_name: &str,
    ) -> Result<(Coord, Coord), TranslationError> {
        if self.scanning_mode.has_unsupported_flags() {
            let ScanningMode(mode) = self.scanning_mode;
            return Err(TranslationError::new(format!(
                "scanning mode {mode} is not supported"
            )));
        }

        let lat_step = if self.scanning_mode.scans_positively_for_j() {
            i64::from(self.j_increment)
        } else {
            -i64::from(self.j_increment)
        };
        let lat_last =
            i64::from(self.first_point_lat) + lat_step * (i64::from(self.nj) - 1);
        if lat_last != i64::from(self.last_point_lat) {
            return Err(TranslationError::new(format!(
                "latitude of last grid point {} is not consistent with the first point \
                 and increment",
                self.last_point_lat
            )));
        }
        let lat_points = (0..i64::from(self.nj))
            .map(|j| micro_to_degrees(i64::from(self.first_point_lat) + lat_step * j))
            .collect();

        let lon_step = if self.scanning_mode.scans_positively_for_i() {
            i64::from(self.i_increment)
        } else {
            -i64::from(self.i_increment)
        };
        let lon_last =
            i64::from(self.first_point_lon) + lon_step * (i64::from(self.ni) - 1);
        if (lon_last - i64::from(self.last_point_lon)).rem_euclid(MICRO_FULL_CIRCLE) != 0 {
            return Err(TranslationError::new(format!(
                "longitude of last grid point {} is not consistent with the first point \
                 and increment",
                self.last_point_lon
            )));
        }
        let lon_points = (0..i64::from(self.ni))
            .map(|i| micro_to_degrees(i64::from(self.first_point_lon) + lon_step * i))
            .collect();

        Ok((
            Coord::new(lat_name, Unit::Degrees, lat_points),
            Coord::new(lon_name, Unit::Degrees, lon_points),
        ))
    }

    pub(crate) fn from_payload(buf: &[u8]) -> Result<Self, TranslationError> {
        crate::sections::require_len(buf, 58, "latitude/longitude grid template")?;
        let earth_shape = EarthShapeDefinition::from_payload(buf);
        let ni = read_as!(u32, buf, 16);
        let nj = read_as!(u32, buf, 20);
        let basic_angle = read_as!(u32, buf, 24);
        if basic_angle != 0 && basic_angle != MDI {
            return Err(TranslationError::new(format!(
                "basic angle {basic_angle} of the production domain is not supported"
            )));
        }
        let first_point_lat = read_as!(u32, buf, 32).as_grib_int();
        let first_point_lon = read_as!(u32, buf, 36).as_grib_int();
        let last_point_lat = read_as!(u32, buf, 41).as_grib_int();
        let last_point_lon = read_as!(u32, buf, 45).as_grib_int();
        let i_increment = read_as!(u32, buf, 49);
        let j_increment = read_as!(u32, buf, 53);
        let scanning_mode = read_as!(u8, buf, 57);
        Ok(Self {
            earth_shape,
            ni,
            nj,
            first_point_lat,
            first_point_lon,
            last_point_lat,
            last_point_lon,
            i_increment,
            j_increment,
            scanning_mode: ScanningMode(scanning_mode),
        })
    }

    pub(crate) fn to_payload(&self, out: &mut Vec<u8>) {
        self.earth_shape.to_payload(out);
        out.extend_from_slice(&self.ni.to_be_bytes());
        out.extend_from_slice(&self.nj.to_be_bytes());
        // basic angle 0: increments and points are in micro-degrees
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&MDI.to_be_bytes());
        out.extend_from_slice(&self.first_point_lat.as_grib_uint().to_be_bytes());
        out.extend_from_slice(&self.first_point_lon.as_grib_uint().to_be_bytes());
        // resolution and component flags: i and j increments given
        out.push(0b00110000);
        out.extend_from_slice(&self.last_point_lat.as_grib_uint().to_be_bytes());
        out.extend_from_slice(&self.last_point_lon.as_grib_uint().to_be_bytes());
        out.extend_from_slice(&self.i_increment.to_be_bytes());
        out.extend_from_slice(&self.j_increment.to_be_bytes());
        out.push(self.scanning_mode.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::EarthFigure;

    fn handmade_coords() -> (Coord, Coord, GeodeticCs) {
        let lat = Coord::new("latitude", Unit::Degrees, vec![-90., -45., 0.]);
        let lon = Coord::new("longitude", Unit::Degrees, vec![-180., -90., 0., 90.]);
        let cs = GeodeticCs::sphere(6_371_229.);
        (lat, lon, cs)
    }

    #[test]
    fn grid_definition_from_handmade_coords() {
        let (lat, lon, cs) = handmade_coords();
        let def = LatLonGridDefinition::from_cube_coords(&lat, &lon, &cs).unwrap();
        assert_eq!(def.grid_shape(), (4, 3));
        assert_eq!(def.first_point_lat, -90_000_000);
        assert_eq!(def.last_point_lat, 0);
        assert_eq!(def.first_point_lon, 180_000_000);
        assert_eq!(def.last_point_lon, 90_000_000);
        assert_eq!(def.i_increment, 90_000_000);
        assert_eq!(def.j_increment, 45_000_000);
        assert_eq!(def.scanning_mode, ScanningMode(0b01000000));
    }

    #[test]
    fn payload_roundtrip() {
        let (lat, lon, cs) = handmade_coords();
        let def = LatLonGridDefinition::from_cube_coords(&lat, &lon, &cs).unwrap();
        let mut buf = Vec::new();
        def.to_payload(&mut buf);
        assert_eq!(buf.len(), 58);
        let decoded = LatLonGridDefinition::from_payload(&buf).unwrap();
        assert_eq!(decoded, def);
    }

    #[test]
    fn coords_roundtrip_modulo_longitude_convention() {
        let (lat, lon, cs) = handmade_coords();
        let def = LatLonGridDefinition::from_cube_coords(&lat, &lon, &cs).unwrap();
        let (lat_out, lon_out) = def.to_cube_coords().unwrap();
        assert_eq!(lat_out.points, vec![-90., -45., 0.]);
        // longitudes come back in the [0, 360) convention
        assert_eq!(lon_out.points, vec![180., 270., 360., 450.]);
        assert_eq!(
            lat_out.coord_system,
            Some(CoordSystem::Geodetic(GeodeticCs {
                figure: EarthFigure::Sphere { radius: 6_371_229. }
            }))
        );
    }

    #[test]
    fn descending_latitude_scans_negatively_for_j() {
        let lat = Coord::new("latitude", Unit::Degrees, vec![60., 50., 40.]);
        let lon = Coord::new("longitude", Unit::Degrees, vec![0., 10.]);
        let cs = GeodeticCs::sphere(6_367_470.);
        let def = LatLonGridDefinition::from_cube_coords(&lat, &lon, &cs).unwrap();
        assert_eq!(def.scanning_mode, ScanningMode(0));
        let (lat_out, _) = def.to_cube_coords().unwrap();
        assert_eq!(lat_out.points, vec![60., 50., 40.]);
    }

    #[test]
    fn irregular_latitude_fails() {
        let lat = Coord::new("latitude", Unit::Degrees, vec![60., 50., 60.]);
        let lon = Coord::new("longitude", Unit::Degrees, vec![0., 10.]);
        let cs = GeodeticCs::sphere(6_367_470.);
        assert!(LatLonGridDefinition::from_cube_coords(&lat, &lon, &cs).is_err());
    }

    #[test]
    fn inconsistent_last_point_fails_on_load() {
        let (lat, lon, cs) = handmade_coords();
        let mut def = LatLonGridDefinition::from_cube_coords(&lat, &lon, &cs).unwrap();
        def.last_point_lat += 1_000_000;
        assert!(def.to_cube_coords().is_err());
    }

    #[test]
    fn foreign_unnormalized_last_longitude_is_accepted() {
        // Some encoders write the last-point longitude beyond 360 degrees
        // instead of wrapping it.
        let lat = Coord::new("latitude", Unit::Degrees, vec![10., 20.]);
        let lon = Coord::new("longitude", Unit::Degrees, vec![350., 351.]);
        let cs = GeodeticCs::sphere(6_367_470.);
        let mut def = LatLonGridDefinition::from_cube_coords(&lat, &lon, &cs).unwrap();
        assert_eq!(def.last_point_lon, 351_000_000);
        def.last_point_lon = 351_000_000 - 360_000_000;
        assert!(def.to_cube_coords().is_ok());
    }
}
