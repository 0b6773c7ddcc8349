//! Point-to-polygon containment join.
//!
//! Containment uses "within" semantics via the exact `Contains` predicate:
//! a point exactly on a boundary edge belongs to no polygon. The index
//! supplies bbox-confirmed candidates; this module does the exact check.

use crate::core::index::GeometryIndex;
use crate::domain::model::{FilteredListing, JoinedListing, Neighborhood};
use geo::Contains;
use geo_types::Point;

/// Outcome of locating one point in the partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// No polygon contains the point. Expected and silent.
    Outside,
    /// Exactly one polygon contains the point.
    Inside(usize),
    /// More than one polygon claims the point (partition invariant
    /// violated). The first in input order wins.
    Ambiguous { chosen: usize, claims: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub joined: usize,
    pub unjoined: usize,
    pub ambiguous: usize,
}

pub struct ContainmentJoiner<'a> {
    index: &'a GeometryIndex,
    neighborhoods: &'a [Neighborhood],
}

impl<'a> ContainmentJoiner<'a> {
    pub fn new(index: &'a GeometryIndex, neighborhoods: &'a [Neighborhood]) -> Self {
        Self {
            index,
            neighborhoods,
        }
    }

    pub fn locate(&self, lon: f64, lat: f64) -> Containment {
        let point = Point::new(lon, lat);
        let mut chosen = None;
        let mut claims = 0;

        for idx in self.index.candidates(lon, lat) {
            if self.neighborhoods[idx].geometry.contains(&point) {
                claims += 1;
                if chosen.is_none() {
                    chosen = Some(idx);
                }
            }
        }

        match (chosen, claims) {
            (None, _) => Containment::Outside,
            (Some(idx), 1) => Containment::Inside(idx),
            (Some(idx), claims) => Containment::Ambiguous { chosen: idx, claims },
        }
    }

    /// Joins every listing to its enclosing neighborhood. Unjoined listings
    /// are dropped without per-point logging; ambiguity is reported once.
    pub fn join_all(&self, listings: &[FilteredListing]) -> (Vec<JoinedListing>, JoinStats) {
        let mut joined = Vec::with_capacity(listings.len());
        let mut stats = JoinStats::default();

        for listing in listings {
            match self.locate(listing.lon, listing.lat) {
                Containment::Inside(neighborhood) => {
                    stats.joined += 1;
                    joined.push(JoinedListing {
                        neighborhood,
                        price: listing.price,
                    });
                }
                Containment::Ambiguous { chosen, .. } => {
                    stats.joined += 1;
                    stats.ambiguous += 1;
                    joined.push(JoinedListing {
                        neighborhood: chosen,
                        price: listing.price,
                    });
                }
                Containment::Outside => stats.unjoined += 1,
            }
        }

        if stats.ambiguous > 0 {
            tracing::warn!(
                "{} listing(s) fell inside more than one neighborhood; kept the first match in input order",
                stats.ambiguous
            );
        }

        (joined, stats)
    }
}
