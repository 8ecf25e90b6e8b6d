//! Inspection checkpoint placement along a route path.

use rand::Rng;

use crate::error::CheckpointError;
use crate::models::{InspectionCheckpoint, RoutePath};
use crate::spatial::point_along;

/// Place `count` checkpoints at uniformly random distances along `path`.
///
/// Each draw is independent, so checkpoints may land close together. Ids run
/// `0..count` in generation order and every checkpoint starts unverified.
pub fn generate_checkpoints<R: Rng + ?Sized>(
    path: &RoutePath,
    count: usize,
    rng: &mut R,
) -> Result<Vec<InspectionCheckpoint>, CheckpointError> {
    let total_m = path.length_m();
    if !total_m.is_finite() || total_m <= 0.0 {
        return Err(CheckpointError::DegeneratePath {
            vertices: path.len(),
        });
    }

    let mut checkpoints = Vec::with_capacity(count);
    for id in 0..count {
        // Float sampling can round up to the exclusive bound.
        let offset_m = rng.random_range(0.0..total_m).min(total_m.next_down());
        let location = point_along(path.points(), offset_m).ok_or(
            CheckpointError::DegeneratePath {
                vertices: path.len(),
            },
        )?;
        checkpoints.push(InspectionCheckpoint::new(id as u32, location, offset_m));
    }

    tracing::debug!(
        count = checkpoints.len(),
        path_length_m = total_m,
        "Generated inspection checkpoints"
    );
    Ok(checkpoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;
    use crate::spatial::EARTH_RADIUS_M;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn meridian_path(total_m: f64, vertices: usize) -> RoutePath {
        let total_deg = (total_m / EARTH_RADIUS_M).to_degrees();
        let steps = (vertices - 1) as f64;
        (0..vertices)
            .map(|i| GeoPoint::new(12.90 + total_deg * i as f64 / steps, 77.59))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn generates_requested_count_within_path() {
        let path = meridian_path(5_000.0, 3);
        let length = path.length_m();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let checkpoints = generate_checkpoints(&path, 4, &mut rng).unwrap();
            assert_eq!(checkpoints.len(), 4);
            for (i, cp) in checkpoints.iter().enumerate() {
                assert_eq!(cp.id, i as u32);
                assert!(!cp.verified);
                assert!(cp.offset_m >= 0.0 && cp.offset_m < length);
                assert!(cp.location.lat >= 12.90 && cp.location.lat <= path.last().unwrap().lat);
            }
        }
    }

    /// Always yields the largest possible draw.
    struct MaxRng;

    impl rand::RngCore for MaxRng {
        fn next_u32(&mut self) -> u32 {
            u32::MAX
        }

        fn next_u64(&mut self) -> u64 {
            u64::MAX
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(u8::MAX);
        }
    }

    #[test]
    fn largest_draw_stays_before_path_end() {
        for total_m in [1.0, 3.7, 999.999, 5_000.0, 123_456.789] {
            let path = meridian_path(total_m, 2);
            let length = path.length_m();
            let checkpoints = generate_checkpoints(&path, 4, &mut MaxRng).unwrap();
            for cp in &checkpoints {
                assert!(cp.offset_m < length, "{} !< {}", cp.offset_m, length);
            }
        }
    }

    #[test]
    fn same_seed_gives_same_placement() {
        let path = meridian_path(2_000.0, 5);
        let a = generate_checkpoints(&path, 4, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = generate_checkpoints(&path, 4, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_paths_fail() {
        let mut rng = StdRng::seed_from_u64(1);
        let point = GeoPoint::new(12.9, 77.5);

        let empty = RoutePath::default();
        assert_eq!(
            generate_checkpoints(&empty, 4, &mut rng),
            Err(CheckpointError::DegeneratePath { vertices: 0 })
        );

        let single = RoutePath::new(vec![point]);
        assert!(generate_checkpoints(&single, 4, &mut rng).is_err());

        let same = RoutePath::new(vec![point, point]);
        assert_eq!(
            generate_checkpoints(&same, 4, &mut rng),
            Err(CheckpointError::DegeneratePath { vertices: 2 })
        );
    }
}
