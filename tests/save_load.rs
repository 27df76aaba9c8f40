use std::collections::BTreeMap;
use std::fs;

use chrono::{DateTime, Duration, TimeZone, Utc};
use cubegrib::{
    CellMethod, Coord, CoordSystem, Cube, EarthShapeDefinition, GeodeticCs, Grib2Message,
    GridDefinitionTemplateValues, LambertConformalCs, RotatedPoleCs, Unit, encode_message, load,
    load_cube, save, save_cubes,
};
use tempfile::TempDir;

const MDI_U8: i64 = 0xff;
const MDI_U32: i64 = 0xffff_ffff;

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2010, 12, 1, 0, 0, 0).unwrap()
}

fn geodetic_cs() -> CoordSystem {
    CoordSystem::Geodetic(GeodeticCs::sphere(6_371_229.))
}

/// A cube with a latitude and longitude suitable for testing saving to GRIB.
fn lat_lon_cube_no_time() -> Cube {
    let mut cube = Cube::new((0..12).map(f64::from).collect(), (3, 4));
    cube.add_dim_coord(
        Coord::new(
            "latitude",
            Unit::Degrees,
            (0..3).map(|i| f64::from(i) * 45. - 90.).collect(),
        )
        .with_coord_system(geodetic_cs()),
        0,
    );
    cube.add_dim_coord(
        Coord::new(
            "longitude",
            Unit::Degrees,
            (0..4).map(|i| f64::from(i) * 90. - 180.).collect(),
        )
        .with_coord_system(geodetic_cs()),
        1,
    );
    cube
}

fn cube_time_no_forecast() -> Cube {
    let mut cube = lat_lon_cube_no_time();
    cube.add_aux_coord(Coord::scalar("time", Unit::HoursSince(epoch()), 48.));
    cube
}

fn cube_with_forecast() -> Cube {
    let mut cube = cube_time_no_forecast();
    cube.add_aux_coord(Coord::scalar("forecast_period", Unit::Hours, 6.));
    cube
}

fn cube_with_pressure() -> Cube {
    let mut cube = cube_with_forecast();
    cube.add_aux_coord(Coord::scalar("air_pressure", Unit::Pascals, 10.));
    cube
}

fn coord_instant(coord: &Coord, value: f64) -> DateTime<Utc> {
    match &coord.units {
        Unit::HoursSince(epoch) => *epoch + Duration::seconds((value * 3600.).round() as i64),
        other => panic!("coordinate unit '{other}' is not a time reference"),
    }
}

/// Per-test-case configuration of the keys expected to legitimately differ
/// between a reference message and a re-saved message.
struct ExpectedDiffs(&'static [(&'static str, (i64, i64))]);

fn assert_grib_message_difference(
    reference: &Grib2Message,
    resaved: &Grib2Message,
    expected: &ExpectedDiffs,
) {
    let reference_keys = reference.keys();
    let resaved_keys: BTreeMap<_, _> = resaved.keys().into_iter().collect();
    assert_eq!(reference_keys.len(), resaved_keys.len());
    for (name, reference_value) in &reference_keys {
        let resaved_value = *resaved_keys
            .get(name)
            .unwrap_or_else(|| panic!("key {name} missing from the re-saved message"));
        match expected.0.iter().find(|(key, _)| key == name) {
            Some((_, (want_reference, want_resaved))) => {
                assert_eq!(reference_value, want_reference, "reference value of {name}");
                assert_eq!(resaved_value, *want_resaved, "re-saved value of {name}");
            }
            None => {
                assert_eq!(
                    *reference_value, resaved_value,
                    "key {name} differs unexpectedly"
                );
            }
        }
    }
    for (name, _) in expected.0 {
        assert!(
            reference_keys.iter().any(|(key, _)| key == name),
            "expected diff names unknown key {name}"
        );
    }
}

#[test]
fn latlon_forecast_plev_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("latlon.grib2");
    let cube = cube_with_pressure();
    save(&cube, &path).unwrap();

    let loaded = load_cube(&path).unwrap();
    assert_eq!(
        loaded.coord("latitude").unwrap().points,
        vec![-90., -45., 0.]
    );
    // longitudes come back in the GRIB [0, 360) convention
    assert_eq!(
        loaded.coord("longitude").unwrap().points,
        vec![180., 270., 360., 450.]
    );
    assert_eq!(
        loaded.coord("latitude").unwrap().coord_system,
        Some(geodetic_cs())
    );
    let pressure = loaded.coord("air_pressure").unwrap();
    assert_eq!(pressure.units, Unit::Pascals);
    assert_eq!(pressure.points, vec![10.]);
    assert_eq!(loaded.coord("forecast_period").unwrap().points, vec![6.]);
    let time = loaded.coord("time").unwrap();
    assert_eq!(
        coord_instant(time, time.points[0]),
        Utc.with_ymd_and_hms(2010, 12, 3, 0, 0, 0).unwrap()
    );
    assert_eq!(loaded.data, cube.data);

    // the codec is deterministic: re-saving the loaded cube reproduces the
    // file byte for byte
    let repath = dir.path().join("latlon-resaved.grib2");
    save(&loaded, &repath).unwrap();
    assert_eq!(fs::read(&path).unwrap(), fs::read(&repath).unwrap());
}

#[test]
fn shape_zero_reference_resaves_as_explicit_sphere() {
    // A reference message in the manner of another encoder: implied-sphere
    // earth, zero production status, a concrete generating process.
    let mut reference = encode_message(&cube_with_pressure()).unwrap();
    reference.identification.prod_status = 0;
    reference.product.generating_process = 0;
    reference.product.process_id = 128;
    let implied_earth = EarthShapeDefinition {
        shape_of_the_earth: 0,
        scale_factor_of_radius_of_spherical_earth: 0xff,
        scaled_value_of_radius_of_spherical_earth: 0xffff_ffff,
        scale_factor_of_earth_major_axis: 0xff,
        scaled_value_of_earth_major_axis: 0xffff_ffff,
        scale_factor_of_earth_minor_axis: 0xff,
        scaled_value_of_earth_minor_axis: 0xffff_ffff,
    };
    match &mut reference.grid.template {
        GridDefinitionTemplateValues::Template0(def) => def.earth_shape = implied_earth,
        other => panic!("unexpected template: {other:?}"),
    }

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reference.grib2");
    fs::write(&path, reference.to_bytes()).unwrap();

    let resaved_path = dir.path().join("resaved.grib2");
    save(&load_cube(&path).unwrap(), &resaved_path).unwrap();
    let resaved_bytes = fs::read(&resaved_path).unwrap();
    let (resaved, _) = Grib2Message::from_bytes(&resaved_bytes).unwrap();

    let expected = ExpectedDiffs(&[
        ("shapeOfTheEarth", (0, 1)),
        ("scaleFactorOfRadiusOfSphericalEarth", (MDI_U8, 0)),
        ("scaledValueOfRadiusOfSphericalEarth", (MDI_U32, 6_367_470)),
        ("productionStatusOfProcessedData", (0, 255)),
        ("typeOfGeneratingProcess", (0, 255)),
        ("generatingProcessIdentifier", (128, 255)),
    ]);
    assert_grib_message_difference(&reference, &resaved, &expected);
}

fn rotated_cube() -> Cube {
    let cs = CoordSystem::RotatedPole(RotatedPoleCs {
        base: GeodeticCs::sphere(6_371_229.),
        north_pole_lon: 177.5,
        north_pole_lat: 37.5,
    });
    let mut cube = Cube::new((0..12).map(f64::from).collect(), (3, 4));
    cube.add_dim_coord(
        Coord::new("grid_latitude", Unit::Degrees, vec![-1., 0., 1.])
            .with_coord_system(cs.clone()),
        0,
    );
    cube.add_dim_coord(
        Coord::new("grid_longitude", Unit::Degrees, vec![350., 351., 352., 353.])
            .with_coord_system(cs),
        1,
    );
    cube.add_aux_coord(Coord::scalar("time", Unit::HoursSince(epoch()), 48.));
    cube.add_aux_coord(Coord::scalar("forecast_period", Unit::Hours, 6.));
    cube
}

#[test]
fn rotated_latlon_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rotated.grib2");
    let cube = rotated_cube();
    save(&cube, &path).unwrap();

    let loaded = load_cube(&path).unwrap();
    assert_eq!(
        loaded.coord("grid_latitude").unwrap().points,
        vec![-1., 0., 1.]
    );
    assert_eq!(
        loaded.coord("grid_longitude").unwrap().points,
        vec![350., 351., 352., 353.]
    );
    match loaded.coord("grid_latitude").unwrap().coord_system.as_ref() {
        Some(CoordSystem::RotatedPole(cs)) => {
            assert_eq!(cs.north_pole_lon, 177.5);
            assert_eq!(cs.north_pole_lat, 37.5);
        }
        other => panic!("unexpected coordinate system: {other:?}"),
    }

    let repath = dir.path().join("rotated-resaved.grib2");
    save(&loaded, &repath).unwrap();
    assert_eq!(fs::read(&path).unwrap(), fs::read(&repath).unwrap());
}

#[test]
fn unnormalized_reference_longitude_resaves_normalized() {
    // Another encoder wrote the last grid point longitude beyond 360
    // degrees; re-saving normalizes it into [0, 360).
    let mut reference = encode_message(&rotated_cube()).unwrap();
    match &mut reference.grid.template {
        GridDefinitionTemplateValues::Template1(def) => {
            def.rotated.last_point_lon += 360_000_000;
        }
        other => panic!("unexpected template: {other:?}"),
    }

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reference.grib2");
    fs::write(&path, reference.to_bytes()).unwrap();

    let resaved_path = dir.path().join("resaved.grib2");
    save(&load_cube(&path).unwrap(), &resaved_path).unwrap();
    let resaved_bytes = fs::read(&resaved_path).unwrap();
    let (resaved, _) = Grib2Message::from_bytes(&resaved_bytes).unwrap();

    let expected = ExpectedDiffs(&[(
        "longitudeOfLastGridPoint",
        (713_000_000, 353_000_000),
    )]);
    assert_grib_message_difference(&reference, &resaved, &expected);
}

#[test]
fn lambert_conformal_roundtrip() {
    let cs = CoordSystem::LambertConformal(LambertConformalCs {
        base: GeodeticCs::sphere(6_371_200.),
        central_lon: -95.,
        central_lat: 25.,
        standard_parallels: (25., 25.),
    });
    let mut cube = Cube::new((0..12).map(f64::from).collect(), (3, 4));
    cube.add_dim_coord(
        Coord::new(
            "projection_y_coordinate",
            Unit::Metres,
            (0..3).map(|j| 200_000. + 2_500. * f64::from(j)).collect(),
        )
        .with_coord_system(cs.clone()),
        0,
    );
    cube.add_dim_coord(
        Coord::new(
            "projection_x_coordinate",
            Unit::Metres,
            (0..4).map(|i| -100_000. + 2_500. * f64::from(i)).collect(),
        )
        .with_coord_system(cs),
        1,
    );
    cube.add_aux_coord(Coord::scalar("time", Unit::HoursSince(epoch()), 48.));
    cube.add_aux_coord(Coord::scalar("forecast_period", Unit::Hours, 6.));

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lambert.grib2");
    save(&cube, &path).unwrap();

    let bytes = fs::read(&path).unwrap();
    let (message, _) = Grib2Message::from_bytes(&bytes).unwrap();
    assert_eq!(message.key("gridDefinitionTemplateNumber"), Some(30));
    assert_eq!(message.key("Dx"), Some(2_500_000));
    assert_eq!(message.key("LoV"), Some(265_000_000));
    assert_eq!(message.key("Latin1"), Some(25_000_000));

    let loaded = load_cube(&path).unwrap();
    let x = loaded.coord("projection_x_coordinate").unwrap();
    let y = loaded.coord("projection_y_coordinate").unwrap();
    // the first grid point survives within the micro-degree precision of
    // its encoded latitude/longitude
    assert!((x.points[0] - -100_000.).abs() < 1.);
    assert!((y.points[0] - 200_000.).abs() < 1.);
    assert!((x.points[1] - x.points[0] - 2_500.).abs() < 1e-6);
    match y.coord_system.as_ref() {
        Some(CoordSystem::LambertConformal(cs)) => {
            assert_eq!(cs.central_lon, -95.);
            assert_eq!(cs.standard_parallels, (25., 25.));
        }
        other => panic!("unexpected coordinate system: {other:?}"),
    }
    assert_eq!(loaded.data, cube.data);
}

#[test]
fn time_mean_with_negative_forecast_period() {
    let mut cube = cube_with_pressure();
    cube.coord_mut("time").unwrap().bounds = Some(vec![(24., 48.)]);
    cube.add_cell_method(CellMethod::new("mean", "time"));

    let message = encode_message(&cube).unwrap();
    assert_eq!(message.key("productDefinitionTemplateNumber"), Some(8));
    assert_eq!(message.key("typeOfStatisticalProcessing"), Some(0));
    assert_eq!(message.key("typeOfTimeIncrement"), Some(2));
    assert_eq!(message.key("lengthOfTimeRange"), Some(24));
    // reference = valid - 6 h; the interval starts 18 h earlier, and the
    // signed encoding must not wrap
    assert_eq!(message.key("forecastTime"), Some(-18));

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("time-mean.grib2");
    save(&cube, &path).unwrap();
    let loaded = load_cube(&path).unwrap();

    let time = loaded.coord("time").unwrap();
    let (lower, upper) = time.bounds.as_ref().unwrap()[0];
    assert_eq!(
        coord_instant(time, lower),
        Utc.with_ymd_and_hms(2010, 12, 2, 0, 0, 0).unwrap()
    );
    assert_eq!(
        coord_instant(time, upper),
        Utc.with_ymd_and_hms(2010, 12, 3, 0, 0, 0).unwrap()
    );
    assert_eq!(
        loaded.cell_methods,
        vec![CellMethod::new("mean", "time")]
    );
    let forecast = loaded.coord("forecast_period").unwrap();
    assert_eq!(forecast.points, vec![6.]);
    assert_eq!(forecast.bounds.as_ref().unwrap()[0], (-18., 6.));

    let repath = dir.path().join("time-mean-resaved.grib2");
    save(&loaded, &repath).unwrap();
    assert_eq!(fs::read(&path).unwrap(), fs::read(&repath).unwrap());
}

#[test]
fn negative_forecast_period_roundtrips() {
    let mut cube = cube_time_no_forecast();
    cube.add_aux_coord(Coord::scalar("forecast_period", Unit::Hours, -6.));

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("negative.grib2");
    save(&cube, &path).unwrap();
    let loaded = load_cube(&path).unwrap();
    assert_eq!(loaded.coord("forecast_period").unwrap().points, vec![-6.]);
}

#[test]
fn irregular_latitude_fails_and_leaves_no_file() {
    let mut cube = cube_with_pressure();
    let lat = cube.coord("latitude").unwrap().clone();
    cube.remove_coord("latitude");
    let mut points = lat.points[..lat.points.len() - 1].to_vec();
    points.push(lat.points[0]);
    cube.add_aux_coord_spanning(
        Coord::new("latitude", Unit::Degrees, points)
            .with_coord_system(lat.coord_system.clone().unwrap()),
        0,
    );

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("irregular.grib2");
    assert!(save(&cube, &path).is_err());
    assert!(!path.exists());
}

#[test]
fn missing_coord_system_fails() {
    let mut cube = cube_with_pressure();
    cube.coord_mut("latitude").unwrap().coord_system = None;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("non-latlon.grib2");
    assert!(save(&cube, &path).is_err());
    assert!(!path.exists());
}

#[test]
fn forecast_period_in_years_fails() {
    let mut cube = cube_with_pressure();
    cube.coord_mut("forecast_period").unwrap().units = Unit::Years;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("years.grib2");
    assert!(save(&cube, &path).is_err());
    assert!(!path.exists());
}

#[test]
fn unhandled_vertical_coordinate_fails() {
    let mut cube = cube_with_pressure();
    // turn the pressure coordinate into an unrecognised Z coordinate
    {
        let coord = cube.coord_mut("air_pressure").unwrap();
        coord.name = "not the messiah".to_owned();
        coord.units = Unit::Kelvin;
        coord
            .attributes
            .insert("positive".to_owned(), "up".to_owned());
    }
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("unhandled-vertical.grib2");
    assert!(save(&cube, &path).is_err());
    assert!(!path.exists());
}

#[test]
fn no_time_cube_fails() {
    let cube = lat_lon_cube_no_time();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no-time.grib2");
    assert!(save(&cube, &path).is_err());
    assert!(!path.exists());
}

#[test]
fn time_bounds_without_cell_method_fail() {
    let mut cube = cube_with_pressure();
    cube.coord_mut("time").unwrap().bounds = Some(vec![(0., 100.)]);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bounds.grib2");
    assert!(save(&cube, &path).is_err());
    assert!(!path.exists());
}

#[test]
fn scalar_int32_pressure_in_hectopascals() {
    // a scalar integer-valued coordinate saves with unit conversion
    let mut cube = cube_with_forecast();
    cube.add_aux_coord(Coord::scalar("pressure", Unit::Hectopascals, 200.));

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hpa.grib2");
    save(&cube, &path).unwrap();

    let bytes = fs::read(&path).unwrap();
    let (message, _) = Grib2Message::from_bytes(&bytes).unwrap();
    assert_eq!(message.key("typeOfFirstFixedSurface"), Some(100));
    assert_eq!(message.key("scaleFactorOfFirstFixedSurface"), Some(0));
    assert_eq!(message.key("scaledValueOfFirstFixedSurface"), Some(20_000));

    let loaded = load_cube(&path).unwrap();
    let pressure = loaded.coord("air_pressure").unwrap();
    assert_eq!(pressure.units, Unit::Pascals);
    assert_eq!(pressure.points, vec![20_000.]);
}

#[test]
fn bounded_level_encodes_both_endpoints() {
    let mut cube = cube_with_forecast();
    cube.add_aux_coord(
        Coord::scalar("height", Unit::Metres, 50.).with_bounds(vec![(0., 100.)]),
    );

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bounded.grib2");
    save(&cube, &path).unwrap();

    let bytes = fs::read(&path).unwrap();
    let (message, _) = Grib2Message::from_bytes(&bytes).unwrap();
    assert_eq!(message.key("typeOfFirstFixedSurface"), Some(103));
    assert_eq!(message.key("scaledValueOfFirstFixedSurface"), Some(0));
    assert_eq!(message.key("typeOfSecondFixedSurface"), Some(103));
    assert_eq!(message.key("scaledValueOfSecondFixedSurface"), Some(100));

    let loaded = load_cube(&path).unwrap();
    let height = loaded.coord("height").unwrap();
    assert_eq!(height.bounds.as_ref().unwrap()[0], (0., 100.));
    assert_eq!(height.points, vec![50.]);
}

#[test]
fn undefined_upper_bound_surfaces_the_integer_max_sentinel() {
    let mut cube = cube_with_forecast();
    cube.add_aux_coord(
        Coord::scalar("height", Unit::Metres, 0.).with_bounds(vec![(0., f64::NAN)]),
    );

    let message = encode_message(&cube).unwrap();
    assert_eq!(message.key("scaledValueOfFirstFixedSurface"), Some(0));
    assert_eq!(
        message.key("scaledValueOfSecondFixedSurface"),
        Some(i64::from(i32::MAX))
    );
}

#[test]
fn multiple_cubes_roundtrip_as_consecutive_messages() {
    let first = cube_with_pressure();
    let mut second = cube_with_forecast();
    second.add_aux_coord(Coord::scalar("height", Unit::Metres, 2.));

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pair.grib2");
    save_cubes(&[first, second], &path).unwrap();

    let cubes = load(&path).unwrap();
    assert_eq!(cubes.len(), 2);
    assert!(cubes[0].coord("air_pressure").is_some());
    assert_eq!(cubes[1].coord("height").unwrap().points, vec![2.]);
    assert!(load_cube(&path).is_err());
}

#[test]
fn recognized_phenomenon_roundtrips_unknown_is_dropped() {
    let named = cube_with_pressure()
        .with_name("air_temperature")
        .with_units(Unit::Kelvin);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("named.grib2");
    save(&named, &path).unwrap();
    let loaded = load_cube(&path).unwrap();
    assert_eq!(loaded.name(), Some("air_temperature"));
    assert_eq!(loaded.units, Unit::Kelvin);

    // an unrecognized phenomenon encodes as missing and loads unnamed:
    // accepted metadata loss
    let unnamed = cube_with_pressure().with_name("dragon_density");
    let path = dir.path().join("unnamed.grib2");
    save(&unnamed, &path).unwrap();
    let bytes = fs::read(&path).unwrap();
    let (message, _) = Grib2Message::from_bytes(&bytes).unwrap();
    assert_eq!(message.key("parameterCategory"), Some(255));
    assert_eq!(load_cube(&path).unwrap().name(), None);
}

#[test]
fn forecast_period_in_minutes_saves_in_hours() {
    let mut cube = cube_time_no_forecast();
    cube.add_aux_coord(Coord::scalar("forecast_period", Unit::Minutes, 360.));
    let message = encode_message(&cube).unwrap();
    assert_eq!(message.key("indicatorOfUnitOfTimeRange"), Some(1));
    assert_eq!(message.key("forecastTime"), Some(6));
}
