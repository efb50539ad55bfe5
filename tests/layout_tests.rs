//! Integration tests for grid mapping, object sub-grids and jitter

use glam::{DVec3, U64Vec3};
use lbscope::layout::{to_cartesian, to_flat, GridShape, JitterCache, ObjectSubGrid};
use lbscope::TraceError;

#[test]
fn test_cartesian_mapping_is_x_fastest() {
    let shape = GridShape::new(2, 3, 2).unwrap();
    assert_eq!(to_cartesian(0, &shape).unwrap(), U64Vec3::new(0, 0, 0));
    assert_eq!(to_cartesian(1, &shape).unwrap(), U64Vec3::new(1, 0, 0));
    assert_eq!(to_cartesian(2, &shape).unwrap(), U64Vec3::new(0, 1, 0));
    assert_eq!(to_cartesian(7, &shape).unwrap(), U64Vec3::new(1, 0, 1));
    assert_eq!(to_cartesian(11, &shape).unwrap(), U64Vec3::new(1, 2, 1));

    for flat in 0..shape.cells() {
        assert_eq!(to_flat(to_cartesian(flat, &shape).unwrap(), &shape), flat);
    }
}

#[test]
fn test_index_outside_grid_is_rejected() {
    let shape = GridShape::new(2, 2, 1).unwrap();
    assert!(matches!(
        to_cartesian(4, &shape),
        Err(TraceError::IndexOutOfGrid { index: 4, cells: 4 })
    ));
}

#[test]
fn test_grid_shape_validation() {
    assert!(matches!(GridShape::new(0, 1, 1), Err(TraceError::InvalidConfig(_))));
    let shape = GridShape::new(4, 2, 1).unwrap();
    assert!(shape.check_rank_count(8).is_ok());
    assert!(matches!(
        shape.check_rank_count(6),
        Err(TraceError::GridMismatch { cells: 8, ranks: 6, .. })
    ));
    assert_eq!(shape.active_dims(), [true, true, false]);
}

#[test]
fn test_single_cell_grid_lays_objects_out_in_plane() {
    let shape = GridShape::new(1, 1, 1).unwrap();
    assert_eq!(shape.active_dims(), [false, false, false]);
    assert_eq!(shape.object_dims(), [true, true, false]);

    let sub_grid = ObjectSubGrid::new(&shape, 9, 1.0);
    assert_eq!(sub_grid.per_dim(), 3);
    assert!(sub_grid.capacity() >= 9);
}

#[test]
fn test_sub_grid_slots_are_distinct_and_centred() {
    let shape = GridShape::new(2, 2, 1).unwrap();
    let sub_grid = ObjectSubGrid::new(&shape, 5, 1.0);
    // ceil(sqrt(5)) = 3 slots per active axis
    assert_eq!(sub_grid.per_dim(), 3);
    assert_eq!(sub_grid.cell(), 0.25);

    let offsets: Vec<DVec3> = (0..5).map(|slot| sub_grid.slot_offset(slot).unwrap()).collect();
    for (i, a) in offsets.iter().enumerate() {
        assert!(a.x.abs() < 0.5 && a.y.abs() < 0.5 && a.z == 0.0, "{:?}", a);
        for b in &offsets[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_jitter_is_memoized_and_bounded() {
    let mut cache = JitterCache::new(0.4, [true, false, true], Some(11)).unwrap();
    let first = cache.offset(5);
    assert_eq!(cache.offset(5), first);
    assert_eq!(cache.get(5), Some(first));
    assert_eq!(cache.len(), 1);

    for id in 0..100 {
        let offset = cache.offset(id);
        assert!(offset.x.abs() <= 0.2 && offset.z.abs() <= 0.2, "{:?}", offset);
        assert_eq!(offset.y, 0.0);
    }
}

#[test]
fn test_seeded_jitter_is_reproducible() {
    let mut a = JitterCache::new(0.5, [true, true, false], Some(3)).unwrap();
    let mut b = JitterCache::new(0.5, [true, true, false], Some(3)).unwrap();
    for id in [4, 8, 15, 16, 23, 42] {
        assert_eq!(a.offset(id), b.offset(id));
    }
}

#[test]
fn test_jitter_coefficient_must_be_below_one() {
    assert!(matches!(
        JitterCache::new(1.0, [true, true, true], None),
        Err(TraceError::InvalidConfig(_))
    ));
    assert!(JitterCache::new(-0.1, [true, true, true], None).is_err());
    let mut still = JitterCache::new(0.0, [true, true, true], None).unwrap();
    assert_eq!(still.offset(1), DVec3::ZERO);
}
