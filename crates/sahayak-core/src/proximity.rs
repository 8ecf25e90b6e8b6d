//! Live-location proximity checks against inspection checkpoints.

use serde::{Deserialize, Serialize};

use crate::models::{GeoPoint, InspectionCheckpoint};
use crate::spatial::distance_m;

/// Result of checking one live fix against a checkpoint batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityOutcome {
    /// Lowest id among the matching checkpoints.
    pub matched_checkpoint_id: Option<u32>,
    /// Every checkpoint within tolerance, in id order.
    pub matched_ids: Vec<u32>,
    /// Distance to the closest checkpoint, matched or not.
    pub nearest_distance_m: Option<f64>,
    /// Input batch with all matches marked verified.
    pub checkpoints: Vec<InspectionCheckpoint>,
}

impl ProximityOutcome {
    pub fn is_match(&self) -> bool {
        self.matched_checkpoint_id.is_some()
    }
}

/// Check a live fix against every checkpoint.
///
/// A checkpoint matches when its great-circle distance to `live` is at most
/// `tolerance_m`. All matches are marked verified in the returned batch; the
/// input slice is never modified. Already-verified checkpoints still match.
pub fn check_proximity(
    live: &GeoPoint,
    checkpoints: &[InspectionCheckpoint],
    tolerance_m: f64,
) -> ProximityOutcome {
    let mut nearest_distance_m: Option<f64> = None;
    let mut matched_ids = Vec::new();
    let mut updated = Vec::with_capacity(checkpoints.len());

    for checkpoint in checkpoints {
        let distance = distance_m(live, &checkpoint.location);
        nearest_distance_m = Some(match nearest_distance_m {
            Some(best) => best.min(distance),
            None => distance,
        });

        let mut checkpoint = checkpoint.clone();
        if distance <= tolerance_m {
            checkpoint.verified = true;
            matched_ids.push(checkpoint.id);
        }
        updated.push(checkpoint);
    }

    matched_ids.sort_unstable();

    ProximityOutcome {
        matched_checkpoint_id: matched_ids.first().copied(),
        matched_ids,
        nearest_distance_m,
        checkpoints: updated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> Vec<InspectionCheckpoint> {
        vec![
            InspectionCheckpoint::new(0, GeoPoint::new(12.9716, 77.5946), 100.0),
            InspectionCheckpoint::new(1, GeoPoint::new(12.9800, 77.6000), 1_200.0),
            InspectionCheckpoint::new(2, GeoPoint::new(12.97161, 77.59461), 101.0),
            InspectionCheckpoint::new(3, GeoPoint::new(12.9900, 77.6100), 3_000.0),
        ]
    }

    #[test]
    fn exact_location_matches_for_any_positive_tolerance() {
        let checkpoints = batch();
        let live = checkpoints[1].location;
        for tolerance in [0.001, 1.0, 20.0, 100.0] {
            let outcome = check_proximity(&live, &checkpoints, tolerance);
            assert_eq!(outcome.matched_checkpoint_id, Some(1));
            assert!(outcome.checkpoints[1].verified);
        }
    }

    #[test]
    fn far_location_changes_nothing() {
        let checkpoints = batch();
        let live = GeoPoint::new(13.05, 77.70);
        let outcome = check_proximity(&live, &checkpoints, 20.0);
        assert_eq!(outcome.matched_checkpoint_id, None);
        assert!(outcome.matched_ids.is_empty());
        assert_eq!(outcome.checkpoints, checkpoints);
        assert!(outcome.nearest_distance_m.unwrap() > 20.0);
    }

    #[test]
    fn clustered_matches_all_verify_and_lowest_id_is_primary() {
        let checkpoints = batch();
        let live = GeoPoint::new(12.97160, 77.59465);
        let outcome = check_proximity(&live, &checkpoints, 20.0);
        assert_eq!(outcome.matched_checkpoint_id, Some(0));
        assert_eq!(outcome.matched_ids, vec![0, 2]);
        assert!(outcome.checkpoints[0].verified);
        assert!(outcome.checkpoints[2].verified);
        assert!(!outcome.checkpoints[1].verified);
    }

    #[test]
    fn check_is_pure() {
        let checkpoints = batch();
        let snapshot = checkpoints.clone();
        let live = checkpoints[0].location;

        let first = check_proximity(&live, &checkpoints, 20.0);
        let second = check_proximity(&live, &checkpoints, 20.0);
        assert_eq!(first, second);
        assert_eq!(checkpoints, snapshot);
    }
}
