//! End-to-end tests: datasets and station files into an [`Environment`],
//! rotation of grid-relative vectors and time-series conventions.

use std::f64::consts::{FRAC_PI_2, PI};
use std::io::Write;

use approx::assert_relative_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};
use envfield::field::{
    direction_to_uv, rotate, uv_to_direction, SampleOptions, VelocityTimeSeries,
};
use envfield::io::{read_velocity_file, FieldLoader, MemoryDataset, RawVariable};
use envfield::{Environment, FieldError, Samples};
use tempfile::NamedTempFile;

const TOL: f64 = 1e-9;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Smallest angular distance between two directions in degrees.
fn angle_diff(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

// ============================================================================
// Rotation
// ============================================================================

#[test]
fn test_zero_rotation_is_identity() {
    for u in [-3.0, -0.5, 0.0, 1.0, 7.25] {
        for v in [-2.0, 0.0, 0.3, 11.0] {
            let mut vec = [u, v, 0.1];
            rotate(&mut vec, 0.0);
            assert_eq!(vec, [u, v, 0.1]);
        }
    }
}

#[test]
fn test_rotation_inverse() {
    for theta in [0.1, FRAC_PI_2, 2.0, -PI, 5.5] {
        let original = [1.5, -0.75, 0.2];
        let mut vec = original;
        rotate(&mut vec, theta);
        rotate(&mut vec, -theta);
        for k in 0..3 {
            assert_relative_eq!(vec[k], original[k], epsilon = 1e-12);
        }
    }
}

// ============================================================================
// Time series conventions
// ============================================================================

#[test]
fn test_constant_wind_from_north() {
    let ts = VelocityTimeSeries::constant("wind", 10.0, 0.0, "m/s");
    let (u, v) = ts.value_at(t0(), false).unwrap();

    let theta = (-90.0_f64).to_radians();
    assert_relative_eq!(u, 10.0 * theta.cos(), epsilon = TOL);
    assert_relative_eq!(v, 10.0 * theta.sin(), epsilon = TOL);
    assert_relative_eq!(v, -10.0, epsilon = TOL);

    let (speed, direction) = uv_to_direction(u, v);
    assert_relative_eq!(speed, 10.0, epsilon = TOL);
    assert!(angle_diff(direction, 0.0) < 1e-9, "direction {}", direction);

    let records = ts.to_speed_direction();
    assert_relative_eq!(records[0].speed, 10.0, epsilon = TOL);
    assert!(angle_diff(records[0].direction, 0.0) < 1e-9);
}

#[test]
fn test_direction_round_trip() {
    for direction in [15.0, 90.0, 135.0, 200.0, 315.0] {
        let (u, v) = direction_to_uv(4.0, direction);
        let (speed, back) = uv_to_direction(u, v);
        assert_relative_eq!(speed, 4.0, epsilon = TOL);
        assert!(angle_diff(back, direction) < 1e-9);
    }
}

#[test]
fn test_time_series_rejects_third_component() {
    let err = VelocityTimeSeries::new(
        "wind",
        "m/s",
        envfield::TimeAxis::constant(),
        vec![vec![1.0], vec![2.0], vec![3.0]],
    )
    .unwrap_err();
    assert!(matches!(err, FieldError::TooManyComponents(3, 2)));
}

// ============================================================================
// Datasets into an environment
// ============================================================================

/// 3x2 lon/lat grid, two hourly steps, sigma levels, a quarter-turn grid.
fn dataset() -> MemoryDataset {
    let xy = |v: f64| vec![v; 6];
    MemoryDataset::new()
        .with_variable(RawVariable::new("lon", vec![("lon", 3)], vec![0.0, 1.0, 2.0]))
        .with_variable(RawVariable::new("lat", vec![("lat", 2)], vec![60.0, 61.0]))
        .with_variable(
            RawVariable::new("ocean_time", vec![("ocean_time", 2)], vec![0.0, 1.0])
                .with_units("hours since 2024-01-01 00:00:00"),
        )
        .with_variable(RawVariable::new("s_w", vec![("s_w", 3)], vec![0.0, -0.5, -1.0]))
        .with_variable(RawVariable::new("Cs_w", vec![("s_w", 3)], vec![0.0, -0.4, -1.0]))
        .with_variable(RawVariable::scalar("hc", 5.0))
        .with_variable(RawVariable::new("h", vec![("lat", 2), ("lon", 3)], xy(10.0)).with_units("m"))
        .with_variable(
            RawVariable::new(
                "u",
                vec![("ocean_time", 2), ("lat", 2), ("lon", 3)],
                [xy(1.0), xy(3.0)].concat(),
            )
            .with_units("m/s"),
        )
        .with_variable(
            RawVariable::new("v", vec![("ocean_time", 2), ("lat", 2), ("lon", 3)], vec![0.0; 12])
                .with_units("m/s"),
        )
        .with_variable(
            RawVariable::new(
                "temp",
                vec![("s_w", 3), ("lat", 2), ("lon", 3)],
                [xy(20.0), xy(15.0), xy(5.0)].concat(),
            )
            .with_units("C"),
        )
        .with_variable(RawVariable::new("angle", vec![("lat", 2), ("lon", 3)], xy(FRAC_PI_2)))
}

#[test]
fn test_loaded_environment() {
    let ds = dataset();
    let env = FieldLoader::new(&ds).unwrap().environment().unwrap();
    assert!(env.contains("current"));
    assert!(env.contains("water_temperature"));
    assert!(env.contains("bathymetry"));
    assert!(!env.contains("wind"));
    assert_eq!(env.sample_units("current").unwrap(), "m/s");
    assert_eq!(env.sample_units("water_temperature").unwrap(), "C");

    // Grid x points north: u = 2 along the grid is v = 2 after rotation
    let points = [[1.0, 60.5, 0.0], [0.5, 60.5, 3.0]];
    let t = t0() + Duration::minutes(30);
    let current = env.sample("current", &points, t).unwrap();
    let current = current.as_vector().unwrap();
    assert_relative_eq!(current[0][0], 0.0, epsilon = TOL);
    assert_relative_eq!(current[0][1], 2.0, epsilon = TOL);

    let temp = env.sample("water_temperature", &points, t).unwrap();
    let temp = temp.as_scalar().unwrap();
    assert_relative_eq!(temp[0], 20.0, epsilon = TOL);
    // Depths 0 and 4.5: alpha 1/3 on the surface level
    assert_relative_eq!(temp[1], 20.0 / 3.0 + 2.0 * 15.0 / 3.0, epsilon = TOL);
}

#[test]
fn test_step_boundary_and_unit_requests() {
    let ds = dataset();
    let env = FieldLoader::new(&ds).unwrap().environment().unwrap();
    let points = [[1.0, 60.5, 0.0]];

    let out = env
        .sample_many(
            &["current", "water_temperature"],
            &points,
            t0(),
            &SampleOptions::new(),
        )
        .unwrap();
    assert_eq!(out.len(), 2);

    env.begin_step();
    let kelvin = env
        .sample_with(
            "water_temperature",
            &points,
            t0(),
            &SampleOptions::new().with_units("K"),
        )
        .unwrap();
    assert!(matches!(kelvin, Samples::Scalar(_)));
    assert_relative_eq!(kelvin.as_scalar().unwrap()[0], 293.15, epsilon = TOL);

    assert!(matches!(
        env.sample("salinity", &points, t0()),
        Err(FieldError::UnknownField(_))
    ));
}

#[test]
fn test_station_file_in_environment() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "# name: buoy").unwrap();
    writeln!(file, "# units: knots").unwrap();
    writeln!(file, "2024-01-01T00:00:00Z 10.0 270.0").unwrap();
    writeln!(file, "2024-01-01T02:00:00Z 20.0 270.0").unwrap();
    file.flush().unwrap();

    let mut env = Environment::new();
    env.insert("wind", read_velocity_file(file.path()).unwrap());

    let t = t0() + Duration::hours(1);
    let wind = env
        .sample_with(
            "wind",
            &[[0.0, 0.0, 0.0]],
            t,
            &SampleOptions::new().with_units("m/s"),
        )
        .unwrap();
    let wind = wind.as_vector().unwrap();
    assert_relative_eq!(wind[0][0], 15.0 * 1852.0 / 3600.0, epsilon = 1e-9);
    assert_relative_eq!(wind[0][1], 0.0, epsilon = 1e-9);
}
