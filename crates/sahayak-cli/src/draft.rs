//! Collects the authored route for project creation.

use sahayak_core::{GeoPoint, RouteAuthoringSink};

/// Latest start/end pair chosen during an authoring session.
#[derive(Debug, Clone, Default)]
pub struct RouteDraft {
    selected: Option<(GeoPoint, GeoPoint)>,
    revisions: usize,
}

impl RouteDraft {
    pub fn selected(&self) -> Option<(GeoPoint, GeoPoint)> {
        self.selected
    }

    /// Number of times a route was authored; re-authoring replaces the pair.
    pub fn revisions(&self) -> usize {
        self.revisions
    }
}

impl RouteAuthoringSink for RouteDraft {
    fn route_selected(&mut self, start: GeoPoint, end: GeoPoint) {
        self.selected = Some((start, end));
        self.revisions += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_latest_selection() {
        let mut draft = RouteDraft::default();
        assert!(draft.selected().is_none());

        draft.route_selected(GeoPoint::new(1.0, 1.0), GeoPoint::new(2.0, 2.0));
        draft.route_selected(GeoPoint::new(3.0, 3.0), GeoPoint::new(4.0, 4.0));
        assert_eq!(
            draft.selected(),
            Some((GeoPoint::new(3.0, 3.0), GeoPoint::new(4.0, 4.0)))
        );
        assert_eq!(draft.revisions(), 2);
    }
}
