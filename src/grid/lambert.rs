use super::{
    EarthShapeDefinition, RegularAxis, ScanningMode, degrees_to_micro, micro_to_degrees,
    normalize_lon,
};
use crate::{
    cube::{Coord, CoordSystem, GeodeticCs, LambertConformalCs},
    error::TranslationError,
    helpers::{GribInt, GribUint, read_as},
    units::Unit,
};

/// Grid definition template 3.30: Lambert conformal grid.
#[derive(Debug, PartialEq)]
pub struct LambertGridDefinition {
    pub earth_shape: EarthShapeDefinition,
    pub ni: u32,
    pub nj: u32,
    pub first_point_lat: i32,
    pub first_point_lon: i32,
    pub lad: i32,
    pub lov: i32,
    pub dx: u32,
    pub dy: u32,
    pub scanning_mode: ScanningMode,
    pub latin1: i32,
    pub latin2: i32,
}

impl LambertGridDefinition {
    /// Returns the shape of the grid, i.e. a tuple of the number of grids in
    /// the i and j directions.
    pub fn grid_shape(&self) -> (usize, usize) {
        (self.ni as usize, self.nj as usize)
    }

    /// Returns the grid type.
    pub fn short_name(&self) -> &'static str {
        "lambert"
    }

    pub(crate) fn from_cube_coords(
        y: &Coord,
        x: &Coord,
        cs: &LambertConformalCs,
    ) -> Result<Self, TranslationError> {
        for coord in [y, x] {
            if coord.units != Unit::Metres {
                return Err(TranslationError::new(format!(
                    "coordinate '{}' has unit '{}'; projection axes must be in metres",
                    coord.name, coord.units
                )));
            }
        }
        let y_axis = RegularAxis::from_points(&y.name, &y.points)?;
        let x_axis = RegularAxis::from_points(&x.name, &x.points)?;
        let proj = LccProjection::from_coord_system(cs)?;
        let (first_lat, first_lon) = proj.inverse(x_axis.start, y_axis.start);

        Ok(Self {
            earth_shape: EarthShapeDefinition::from_figure(&cs.base.figure)?,
            ni: x_axis.count as u32,
            nj: y_axis.count as u32,
            first_point_lat: degrees_to_micro(first_lat),
            first_point_lon: degrees_to_micro(normalize_lon(first_lon)),
            lad: degrees_to_micro(cs.central_lat),
            lov: degrees_to_micro(normalize_lon(cs.central_lon)),
            dx: (x_axis.step.abs() * 1000.).round() as u32,
            dy: (y_axis.step.abs() * 1000.).round() as u32,
            scanning_mode: ScanningMode::from_directions(x_axis.step > 0., y_axis.step > 0.),
            latin1: degrees_to_micro(cs.standard_parallels.0),
            latin2: degrees_to_micro(cs.standard_parallels.1),
        })
    }

    /// Reconstructs the (projection_y, projection_x) coordinate pair.
    pub(crate) fn to_cube_coords(&self) -> Result<(Coord, Coord), TranslationError> {
        if self.scanning_mode.has_unsupported_flags() {
            let ScanningMode(mode) = self.scanning_mode;
            return Err(TranslationError::new(format!(
                "scanning mode {mode} is not supported"
            )));
        }

        let central_lon = {
            let lov = micro_to_degrees(i64::from(self.lov));
            if lov > 180. { lov - 360. } else { lov }
        };
        let cs = LambertConformalCs {
            base: GeodeticCs {
                figure: self.earth_shape.to_figure()?,
            },
            central_lon,
            central_lat: micro_to_degrees(i64::from(self.lad)),
            standard_parallels: (
                micro_to_degrees(i64::from(self.latin1)),
                micro_to_degrees(i64::from(self.latin2)),
            ),
        };
        let proj = LccProjection::from_coord_system(&cs)?;
        let (x0, y0) = proj.forward(
            micro_to_degrees(i64::from(self.first_point_lat)),
            micro_to_degrees(i64::from(self.first_point_lon)),
        );

        let dx = if self.scanning_mode.scans_positively_for_i() {
            f64::from(self.dx) * 1e-3
        } else {
            -f64::from(self.dx) * 1e-3
        };
        let dy = if self.scanning_mode.scans_positively_for_j() {
            f64::from(self.dy) * 1e-3
        } else {
            -f64::from(self.dy) * 1e-3
        };
        let x_points = (0..self.ni).map(|i| x0 + dx * f64::from(i)).collect();
        let y_points = (0..self.nj).map(|j| y0 + dy * f64::from(j)).collect();

        let cs = CoordSystem::LambertConformal(cs);
        Ok((
            Coord::new("projection_y_coordinate", Unit::Metres, y_points)
                .with_coord_system(cs.clone()),
            Coord::new("projection_x_coordinate", Unit::Metres, x_points).with_coord_system(cs),
        ))
    }

    pub(crate) fn from_payload(buf: &[u8]) -> Result<Self, TranslationError> {
        crate::sections::require_len(buf, 59, "Lambert conformal grid template")?;
        let earth_shape = EarthShapeDefinition::from_payload(buf);
        let ni = read_as!(u32, buf, 16);
        let nj = read_as!(u32, buf, 20);
        let first_point_lat = read_as!(u32, buf, 24).as_grib_int();
        let first_point_lon = read_as!(u32, buf, 28).as_grib_int();
        let lad = read_as!(u32, buf, 33).as_grib_int();
        let lov = read_as!(u32, buf, 37).as_grib_int();
        let dx = read_as!(u32, buf, 41);
        let dy = read_as!(u32, buf, 45);
        let scanning_mode = read_as!(u8, buf, 50);
        let latin1 = read_as!(u32, buf, 51).as_grib_int();
        let latin2 = read_as!(u32, buf, 55).as_grib_int();
        Ok(Self {
            earth_shape,
            ni,
            nj,
            first_point_lat,
            first_point_lon,
            lad,
            lov,
            dx,
            dy,
            scanning_mode: ScanningMode(scanning_mode),
            latin1,
            latin2,
        })
    }

    pub(crate) fn to_payload(&self, out: &mut Vec<u8>) {
        self.earth_shape.to_payload(out);
        out.extend_from_slice(&self.ni.to_be_bytes());
        out.extend_from_slice(&self.nj.to_be_bytes());
        out.extend_from_slice(&self.first_point_lat.as_grib_uint().to_be_bytes());
        out.extend_from_slice(&self.first_point_lon.as_grib_uint().to_be_bytes());
        // resolution and component flags: i and j increments given
        out.push(0b00110000);
        out.extend_from_slice(&self.lad.as_grib_uint().to_be_bytes());
        out.extend_from_slice(&self.lov.as_grib_uint().to_be_bytes());
        out.extend_from_slice(&self.dx.to_be_bytes());
        out.extend_from_slice(&self.dy.to_be_bytes());
        // projection centre flag: north pole on the projection plane
        out.push(if self.latin1 < 0 { 0b10000000 } else { 0 });
        out.push(self.scanning_mode.0);
        out.extend_from_slice(&self.latin1.as_grib_uint().to_be_bytes());
        out.extend_from_slice(&self.latin2.as_grib_uint().to_be_bytes());
        // southern pole of projection, unused for a plain conic
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
    }
}

/// Spherical Lambert conformal conic projection with one or two standard
/// parallels.
pub(crate) struct LccProjection {
    n: f64,
    rf: f64,
    rho0: f64,
    lon0: f64,
}

impl LccProjection {
    pub(crate) fn from_coord_system(cs: &LambertConformalCs) -> Result<Self, TranslationError> {
        let (major, minor) = cs.base.figure.radii();
        let radius = (major + minor) / 2.;
        let lat1 = cs.standard_parallels.0.to_radians();
        let lat2 = cs.standard_parallels.1.to_radians();
        let lat0 = cs.central_lat.to_radians();

        let n = if (lat1 - lat2).abs() < 1e-10 {
            lat1.sin()
        } else {
            (lat1.cos() / lat2.cos()).ln() / (half_tan(lat2) / half_tan(lat1)).ln()
        };
        if n.abs() < 1e-10 {
            return Err(TranslationError::new(
                "Lambert conformal standard parallels symmetric about the equator are not \
                 supported",
            ));
        }
        let rf = radius * lat1.cos() * half_tan(lat1).powf(n) / n;
        let rho0 = rf / half_tan(lat0).powf(n);
        Ok(Self {
            n,
            rf,
            rho0,
            lon0: cs.central_lon.to_radians(),
        })
    }

    pub(crate) fn forward(&self, lat: f64, lon: f64) -> (f64, f64) {
        let mut dlon = lon.to_radians() - self.lon0;
        while dlon > std::f64::consts::PI {
            dlon -= 2. * std::f64::consts::PI;
        }
        while dlon < -std::f64::consts::PI {
            dlon += 2. * std::f64::consts::PI;
        }
        let theta = self.n * dlon;
        let rho = self.rf / half_tan(lat.to_radians()).powf(self.n);
        (rho * theta.sin(), self.rho0 - rho * theta.cos())
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let sign = self.n.signum();
        let rho = sign * (x * x + (self.rho0 - y) * (self.rho0 - y)).sqrt();
        let theta = (sign * x).atan2(sign * (self.rho0 - y));
        let lat = 2. * (self.rf / rho).powf(1. / self.n).atan() - std::f64::consts::FRAC_PI_2;
        let lon = self.lon0 + theta / self.n;
        (lat.to_degrees(), normalize_lon(lon.to_degrees()))
    }
}

fn half_tan(lat: f64) -> f64 {
    (std::f64::consts::FRAC_PI_4 + lat / 2.).tan()
}
