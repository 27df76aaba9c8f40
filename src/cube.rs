use std::collections::BTreeMap;

use crate::units::Unit;

/// Figure of the earth carried by a coordinate system.
///
/// Exactly one representation is active at a time; the GRIB encoding of the
/// inactive representation's fields is the missing-data sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum EarthFigure {
    /// No figure specified. Encoded as shape 0, whose implied figure is a
    /// sphere of radius 6 367 470 m.
    Default,
    Sphere { radius: f64 },
    Ellipsoid { semi_major: f64, semi_minor: f64 },
}

impl EarthFigure {
    /// Returns the (major, minor) radii in metres implied by this figure.
    pub fn radii(&self) -> (f64, f64) {
        match self {
            Self::Default => (6_367_470., 6_367_470.),
            Self::Sphere { radius } => (*radius, *radius),
            Self::Ellipsoid {
                semi_major,
                semi_minor,
            } => (*semi_major, *semi_minor),
        }
    }
}

/// A geodetic latitude/longitude coordinate system.
#[derive(Debug, Clone, PartialEq)]
pub struct GeodeticCs {
    pub figure: EarthFigure,
}

impl GeodeticCs {
    pub fn sphere(radius: f64) -> Self {
        Self {
            figure: EarthFigure::Sphere { radius },
        }
    }
}

/// A geodetic system rotated so that the north pole sits at the given
/// true-longitude/latitude position.
#[derive(Debug, Clone, PartialEq)]
pub struct RotatedPoleCs {
    pub base: GeodeticCs,
    pub north_pole_lon: f64,
    pub north_pole_lat: f64,
}

/// A Lambert conformal conic projection.
#[derive(Debug, Clone, PartialEq)]
pub struct LambertConformalCs {
    pub base: GeodeticCs,
    pub central_lon: f64,
    pub central_lat: f64,
    pub standard_parallels: (f64, f64),
}

/// The coordinate-system families this codec recognizes.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordSystem {
    Geodetic(GeodeticCs),
    RotatedPole(RotatedPoleCs),
    LambertConformal(LambertConformalCs),
}

/// A coordinate: named, units-tagged sample points, optionally bounded, with
/// an optional coordinate system and free-form attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Coord {
    pub name: String,
    pub units: Unit,
    pub points: Vec<f64>,
    /// One (lower, upper) interval per point. An undefined endpoint is NaN.
    pub bounds: Option<Vec<(f64, f64)>>,
    pub coord_system: Option<CoordSystem>,
    pub attributes: BTreeMap<String, String>,
}

impl Coord {
    pub fn new(name: impl Into<String>, units: Unit, points: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            units,
            points,
            bounds: None,
            coord_system: None,
            attributes: BTreeMap::new(),
        }
    }

    /// A single-valued coordinate.
    pub fn scalar(name: impl Into<String>, units: Unit, point: f64) -> Self {
        Self::new(name, units, vec![point])
    }

    pub fn with_coord_system(mut self, cs: CoordSystem) -> Self {
        self.coord_system = Some(cs);
        self
    }

    pub fn with_bounds(mut self, bounds: Vec<(f64, f64)>) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn is_scalar(&self) -> bool {
        self.points.len() == 1
    }
}

/// A record of statistical aggregation applied to the data along one
/// coordinate, e.g. "mean over time".
#[derive(Debug, Clone, PartialEq)]
pub struct CellMethod {
    pub method: String,
    pub coord: String,
}

impl CellMethod {
    pub fn new(method: impl Into<String>, coord: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            coord: coord.into(),
        }
    }
}

/// The in-memory gridded-data model consumed by the save pipeline and
/// produced by the load pipeline.
///
/// The data array is stored row-major over `shape` = (rows, columns); a
/// dimension coordinate describes one axis, auxiliary coordinates are either
/// scalar or span a named axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    pub data: Vec<f64>,
    pub shape: (usize, usize),
    pub units: Unit,
    name: Option<String>,
    dim_coords: Vec<(usize, Coord)>,
    aux_coords: Vec<(Option<usize>, Coord)>,
    pub cell_methods: Vec<CellMethod>,
    pub attributes: BTreeMap<String, String>,
}

impl Cube {
    pub fn new(data: Vec<f64>, shape: (usize, usize)) -> Self {
        assert_eq!(data.len(), shape.0 * shape.1);
        Self {
            data,
            shape,
            units: Unit::Dimensionless,
            name: None,
            dim_coords: Vec::new(),
            aux_coords: Vec::new(),
            cell_methods: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_units(mut self, units: Unit) -> Self {
        self.units = units;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn add_dim_coord(&mut self, coord: Coord, axis: usize) {
        self.dim_coords.push((axis, coord));
    }

    /// Adds a scalar auxiliary coordinate.
    pub fn add_aux_coord(&mut self, coord: Coord) {
        self.aux_coords.push((None, coord));
    }

    /// Adds an auxiliary coordinate spanning the given axis.
    pub fn add_aux_coord_spanning(&mut self, coord: Coord, axis: usize) {
        self.aux_coords.push((Some(axis), coord));
    }

    pub fn add_cell_method(&mut self, method: CellMethod) {
        self.cell_methods.push(method);
    }

    /// Looks up a coordinate by name, dimension coordinates first.
    pub fn coord(&self, name: &str) -> Option<&Coord> {
        self.dim_coords
            .iter()
            .map(|(_, c)| c)
            .chain(self.aux_coords.iter().map(|(_, c)| c))
            .find(|c| c.name == name)
    }

    pub fn coord_mut(&mut self, name: &str) -> Option<&mut Coord> {
        self.dim_coords
            .iter_mut()
            .map(|(_, c)| c)
            .chain(self.aux_coords.iter_mut().map(|(_, c)| c))
            .find(|c| c.name == name)
    }

    pub fn remove_coord(&mut self, name: &str) {
        self.dim_coords.retain(|(_, c)| c.name != name);
        self.aux_coords.retain(|(_, c)| c.name != name);
    }

    /// The coordinate describing the given axis: the dimension coordinate if
    /// present, otherwise an auxiliary coordinate spanning the axis.
    pub fn coord_on_axis(&self, axis: usize) -> Option<&Coord> {
        self.dim_coords
            .iter()
            .find(|(a, _)| *a == axis)
            .map(|(_, c)| c)
            .or_else(|| {
                self.aux_coords
                    .iter()
                    .find(|(a, _)| *a == Some(axis))
                    .map(|(_, c)| c)
            })
    }

    /// Scalar auxiliary coordinates, in insertion order.
    pub fn scalar_coords(&self) -> impl Iterator<Item = &Coord> {
        self.aux_coords
            .iter()
            .filter(|(axis, c)| axis.is_none() && c.is_scalar())
            .map(|(_, c)| c)
    }

    pub fn cell_method_for(&self, coord: &str) -> Option<&CellMethod> {
        self.cell_methods.iter().find(|m| m.coord == coord)
    }
}
