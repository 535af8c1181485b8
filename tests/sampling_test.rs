//! Integration tests for gridded sampling.
//!
//! These tests verify:
//! 1. Depth resolution: surface batches skip the vertical step, sigma
//!    brackets are monotone and in range for either level ordering
//! 2. Time interpolation and extrapolation, alone and nested with depth
//! 3. Memoisation across repeated queries
//! 4. Query errors are distinguishable from configuration errors

use std::sync::Arc;

use approx::assert_relative_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};
use envfield::field::{DataShape, FieldData, GriddedField, SampleOptions};
use envfield::grid::{Grid, RectilinearGrid};
use envfield::time::TimeAxis;
use envfield::vertical::{to_raw, DepthAxis, LayerWeight, LevelFamily, SigmaTerms};
use envfield::{ErrorKind, FieldError};

const TOL: f64 = 1e-10;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

fn grid() -> Arc<dyn Grid> {
    Arc::new(RectilinearGrid::uniform(0.0, 2.0, 3, 0.0, 1.0, 2).unwrap())
}

/// Surface-first terms: `hc = 5`, `s_w = [0, -0.5, -1]`, `Cs_w = [0, -0.4, -1]`.
fn surface_first_terms() -> SigmaTerms {
    SigmaTerms::new(
        vec![0.0, -0.5, -1.0],
        vec![0.0, -0.4, -1.0],
        vec![-0.25, -0.75],
        vec![-0.2, -0.7],
        5.0,
    )
    .unwrap()
}

/// The same levels stored bottom first.
fn bottom_first_terms() -> SigmaTerms {
    SigmaTerms::new(
        vec![-1.0, -0.5, 0.0],
        vec![-1.0, -0.4, 0.0],
        vec![-0.75, -0.25],
        vec![-0.7, -0.2],
        5.0,
    )
    .unwrap()
}

fn bathymetry(h: f64) -> Arc<GriddedField> {
    Arc::new(GriddedField::surface("h", "m", grid(), vec![h; 6]).unwrap())
}

/// A 3-D field with a constant value per level.
fn layered(terms: SigmaTerms, levels: &[f64]) -> GriddedField {
    let values: Vec<f64> = levels.iter().flat_map(|&v| vec![v; 6]).collect();
    let data = FieldData::new(values, DataShape::surface(6).with_depth(levels.len())).unwrap();
    GriddedField::new(
        "temp",
        "C",
        grid(),
        TimeAxis::empty(),
        data,
        DepthAxis::sigma(bathymetry(10.0), terms),
    )
    .unwrap()
}

// ============================================================================
// Depth resolution
// ============================================================================

#[test]
fn test_surface_batch_has_no_vertical_weights() {
    let axis = DepthAxis::sigma(bathymetry(10.0), surface_first_terms());
    let points = [[0.0, 0.0, 0.0], [1.0, 0.5, -2.0], [2.0, 1.0, 0.0]];
    let weights = axis
        .interpolation_alphas(&points, 3, t0(), &SampleOptions::new())
        .unwrap();
    assert!(weights.is_none());

    let flat = DepthAxis::flat();
    let deep = [[0.0, 0.0, 50.0]];
    assert!(flat
        .interpolation_alphas(&deep, 1, t0(), &SampleOptions::new())
        .unwrap()
        .is_none());
}

#[test]
fn test_sigma_layer_depths_are_monotone() {
    let terms = surface_first_terms();
    let depths: Vec<f64> = (0..3)
        .map(|k| terms.layer_depth(LevelFamily::W, k, 10.0))
        .collect();
    assert_relative_eq!(depths[0], 0.0, epsilon = TOL);
    assert_relative_eq!(depths[1], 4.5, epsilon = TOL);
    assert_relative_eq!(depths[2], 10.0, epsilon = TOL);
    assert!(depths.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_sigma_alpha_in_unit_interval() {
    let axis = DepthAxis::sigma(bathymetry(10.0), surface_first_terms());
    let points = [[1.0, 0.5, 3.0], [1.0, 0.5, 0.0], [1.0, 0.5, 25.0]];
    let weights = axis
        .interpolation_alphas(&points, 3, t0(), &SampleOptions::new())
        .unwrap()
        .unwrap();

    match weights[0] {
        LayerWeight::Between { upper, lower, alpha } => {
            assert_eq!((upper.get(), lower.get()), (0, 1));
            assert!((0.0..=1.0).contains(&alpha));
            assert_relative_eq!(alpha, 1.0 / 3.0, epsilon = TOL);
        }
        other => panic!("expected a blend, got {:?}", other),
    }

    let (index, alpha) = to_raw(&weights);
    assert_eq!(index, vec![1, LayerWeight::SURFACE_INDEX, 2]);
    assert_eq!(alpha[1], LayerWeight::SURFACE_ALPHA);
    assert_eq!(alpha[2], LayerWeight::CLAMPED_ALPHA);
}

#[test]
fn test_level_ordering_does_not_change_result() {
    let surface_first = layered(surface_first_terms(), &[20.0, 15.0, 5.0]);
    let bottom_first = layered(bottom_first_terms(), &[5.0, 15.0, 20.0]);

    let points = [[0.5, 0.5, 1.0], [1.5, 0.2, 3.0], [1.0, 0.5, 7.0], [0.0, 0.0, 0.0]];
    let a = surface_first.at(&points, t0(), &SampleOptions::new()).unwrap();
    let b = bottom_first.at(&points, t0(), &SampleOptions::new()).unwrap();
    for (x, y) in a.iter().zip(&b) {
        assert_relative_eq!(*x, *y, epsilon = TOL);
    }
    assert_relative_eq!(a[3], 20.0, epsilon = TOL);
}

#[test]
fn test_rho_levels_selected_by_depth_extent() {
    // rho depths at h = 10: 2.25 and 7.25
    let field = layered(surface_first_terms(), &[10.0, 0.0]);
    let v = field
        .at(&[[1.0, 0.5, 3.0]], t0(), &SampleOptions::new())
        .unwrap();
    assert_relative_eq!(v[0], 0.85 * 10.0, epsilon = 1e-9);
}

#[test]
fn test_depth_extent_must_match_terms() {
    let data = FieldData::new(vec![0.0; 24], DataShape::surface(6).with_depth(4)).unwrap();
    let err = GriddedField::new(
        "temp",
        "C",
        grid(),
        TimeAxis::empty(),
        data,
        DepthAxis::sigma(bathymetry(10.0), surface_first_terms()),
    )
    .unwrap_err();
    assert!(matches!(err, FieldError::ShapeMismatch { n_depth: 4, n_w: 3, n_rho: 2 }));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

// ============================================================================
// Time interpolation
// ============================================================================

fn hourly_field() -> GriddedField {
    let time = TimeAxis::new(vec![t0(), t0() + Duration::hours(1)]).unwrap();
    let mut values = vec![0.0; 6];
    values.extend(vec![10.0; 6]);
    GriddedField::series("ssh", "m", grid(), time, values).unwrap()
}

#[test]
fn test_time_blend() {
    let f = hourly_field();
    let v = f
        .at(&[[0.5, 0.5, 0.0]], t0() + Duration::minutes(15), &SampleOptions::new())
        .unwrap();
    assert_relative_eq!(v[0], 2.5, epsilon = TOL);
}

#[test]
fn test_time_out_of_range() {
    let f = hourly_field();
    let late = t0() + Duration::hours(2);
    let err = f.at(&[[0.5, 0.5, 0.0]], late, &SampleOptions::new()).unwrap_err();
    assert!(matches!(err, FieldError::TimeOutOfRange { .. }));
    assert_eq!(err.kind(), ErrorKind::Query);

    let clamped = f
        .at(&[[0.5, 0.5, 0.0]], late, &SampleOptions::new().with_extrapolate(true))
        .unwrap();
    assert_relative_eq!(clamped[0], 10.0, epsilon = TOL);
}

/// `[time=2][depth=3][space]` field on the surface-first sigma levels.
fn hourly_layered(first: [f64; 3], second: [f64; 3]) -> GriddedField {
    let time = TimeAxis::new(vec![t0(), t0() + Duration::hours(1)]).unwrap();
    let values: Vec<f64> = first
        .iter()
        .chain(&second)
        .flat_map(|&v| vec![v; 6])
        .collect();
    let data = FieldData::new(values, DataShape::surface(6).with_depth(3).with_time(2)).unwrap();
    GriddedField::new(
        "temp",
        "C",
        grid(),
        time,
        data,
        DepthAxis::sigma(bathymetry(10.0), surface_first_terms()),
    )
    .unwrap()
}

#[test]
fn test_time_and_depth_blend_commute() {
    let first = [5.0, 2.0, 0.0];
    let second = [10.0, 4.0, 2.0];
    let field = hourly_layered(first, second);

    // w depths at h = 10 are 0, 4.5 and 10
    let points = [[1.0, 0.5, 3.0], [0.5, 0.5, 7.25], [1.5, 0.5, 0.0]];
    let v = field
        .at(&points, t0() + Duration::minutes(30), &SampleOptions::new())
        .unwrap();

    let vertical = |levels: &[f64], k: usize, alpha: f64| alpha * levels[k] + (1.0 - alpha) * levels[k + 1];
    let brackets = [(0, 1.0 / 3.0), (1, 0.5)];
    for (i, &(k, alpha)) in brackets.iter().enumerate() {
        let vertical_then_time = 0.5 * vertical(&first, k, alpha) + 0.5 * vertical(&second, k, alpha);
        let blended: Vec<f64> = first.iter().zip(&second).map(|(a, b)| 0.5 * (a + b)).collect();
        let time_then_vertical = vertical(&blended, k, alpha);
        assert_relative_eq!(vertical_then_time, time_then_vertical, epsilon = TOL);
        assert_relative_eq!(v[i], vertical_then_time, epsilon = 1e-9);
    }
    assert_relative_eq!(v[0], 4.5, epsilon = 1e-9);
    assert_relative_eq!(v[1], 2.0, epsilon = 1e-9);
    // Surface point takes the time-blended top level
    assert_relative_eq!(v[2], 7.5, epsilon = 1e-9);
}

#[test]
fn test_point_outside_grid() {
    let f = hourly_field();
    let err = f
        .at(&[[0.5, 0.5, 0.0], [5.0, 0.5, 0.0]], t0(), &SampleOptions::new())
        .unwrap_err();
    assert!(matches!(err, FieldError::PointOutsideGrid { index: 1, .. }));
    assert!(!err.is_fatal());
}

// ============================================================================
// Memoisation
// ============================================================================

#[test]
fn test_repeated_query_is_not_recomputed() {
    let f = hourly_field();
    let points = vec![[0.5, 0.5, 0.0], [1.5, 0.5, 0.0]];
    let opts = SampleOptions::new();

    let first = f.at(&points, t0(), &opts).unwrap();
    let second = f.at(&points, t0(), &opts).unwrap();
    assert_eq!(first, second);
    assert_eq!(f.evaluations(), 1);

    f.at(&points, t0() + Duration::minutes(30), &opts).unwrap();
    assert_eq!(f.evaluations(), 2);

    let stats = f.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
}

#[test]
fn test_unit_conversion_uses_cached_native_values() {
    let f = hourly_field();
    let points = [[0.5, 0.5, 0.0]];
    let t = t0() + Duration::hours(1);

    let m = f.at(&points, t, &SampleOptions::new()).unwrap();
    let cm = f.at(&points, t, &SampleOptions::new().with_units("cm")).unwrap();
    assert_relative_eq!(cm[0], m[0] * 100.0, epsilon = 1e-9);
    assert_eq!(f.evaluations(), 1);

    let err = f.at(&points, t, &SampleOptions::new().with_units("K")).unwrap_err();
    assert!(matches!(err, FieldError::IncompatibleUnits { .. }));
}
