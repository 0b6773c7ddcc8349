//! Grid index over a boundary partition.
//!
//! Containment queries resolve in two steps: a uniform grid keyed by
//! bounding box narrows the partition down to a short candidate list, and
//! the joiner confirms candidates with the exact predicate. The index holds
//! only bounding boxes and input-order indices, never geometry, which keeps
//! cached copies cheap.

use crate::domain::model::Neighborhood;
use crate::utils::error::{MapError, Result};
use geo::{BoundingRect, Validation};
use geo_types::MultiPolygon;

/// Axis-aligned bounding box in lon/lat order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn from_geometry(geometry: &MultiPolygon<f64>) -> Option<Self> {
        let rect = geometry.bounding_rect()?;
        Some(Self {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        })
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite() && self.min_y.is_finite() && self.max_x.is_finite() && self.max_y.is_finite()
    }

    fn expand(&mut self, other: &BBox) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }
}

/// Read-only spatial index over one boundary partition.
#[derive(Debug)]
pub struct GeometryIndex {
    extent: Option<BBox>,
    cols: usize,
    rows: usize,
    cell_width: f64,
    cell_height: f64,
    cells: Vec<Vec<usize>>,
    bboxes: Vec<Option<BBox>>,
    skipped: usize,
}

impl GeometryIndex {
    /// Builds the index, excluding malformed polygons. Exclusion is
    /// recoverable: skipped polygons are counted and reported in one
    /// aggregate warning, never a failure.
    pub fn build(neighborhoods: &[Neighborhood]) -> Self {
        let mut bboxes: Vec<Option<BBox>> = Vec::with_capacity(neighborhoods.len());
        let mut extent: Option<BBox> = None;
        let mut skipped_ids: Vec<String> = Vec::new();

        for neighborhood in neighborhoods {
            match validate_geometry(neighborhood) {
                Ok(bbox) => {
                    match extent.as_mut() {
                        Some(e) => e.expand(&bbox),
                        None => extent = Some(bbox),
                    }
                    bboxes.push(Some(bbox));
                }
                Err(e) => {
                    tracing::debug!("{}", e);
                    skipped_ids.push(neighborhood.id.clone());
                    bboxes.push(None);
                }
            }
        }

        let skipped = skipped_ids.len();
        if skipped > 0 {
            tracing::warn!(
                "excluded {} malformed polygon(s) from the spatial index: {}",
                skipped,
                skipped_ids.join(", ")
            );
        }

        let valid = bboxes.iter().filter(|b| b.is_some()).count();
        let side = (valid as f64).sqrt().ceil().max(1.0) as usize;
        let (cols, rows) = (side, side);

        let (cell_width, cell_height) = match &extent {
            Some(e) => (
                ((e.max_x - e.min_x) / cols as f64).max(f64::EPSILON),
                ((e.max_y - e.min_y) / rows as f64).max(f64::EPSILON),
            ),
            None => (1.0, 1.0),
        };

        let mut cells = vec![Vec::new(); cols * rows];
        if let Some(e) = &extent {
            for (idx, bbox) in bboxes.iter().enumerate() {
                let Some(bbox) = bbox else { continue };
                let col_lo = grid_coord(bbox.min_x, e.min_x, cell_width, cols);
                let col_hi = grid_coord(bbox.max_x, e.min_x, cell_width, cols);
                let row_lo = grid_coord(bbox.min_y, e.min_y, cell_height, rows);
                let row_hi = grid_coord(bbox.max_y, e.min_y, cell_height, rows);
                for row in row_lo..=row_hi {
                    for col in col_lo..=col_hi {
                        cells[row * cols + col].push(idx);
                    }
                }
            }
        }

        Self {
            extent,
            cols,
            rows,
            cell_width,
            cell_height,
            cells,
            bboxes,
            skipped,
        }
    }

    /// Candidate polygons whose bounding box contains the point, in input
    /// order. Callers must confirm with the exact containment predicate.
    pub fn candidates(&self, x: f64, y: f64) -> Vec<usize> {
        let Some(extent) = &self.extent else {
            return Vec::new();
        };
        if !extent.contains(x, y) {
            return Vec::new();
        }

        let col = grid_coord(x, extent.min_x, self.cell_width, self.cols);
        let row = grid_coord(y, extent.min_y, self.cell_height, self.rows);

        self.cells[row * self.cols + col]
            .iter()
            .copied()
            .filter(|&idx| matches!(&self.bboxes[idx], Some(b) if b.contains(x, y)))
            .collect()
    }

    /// Number of polygons excluded for malformed geometry.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of polygons in the index.
    pub fn len(&self) -> usize {
        self.bboxes.iter().filter(|b| b.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn grid_coord(value: f64, origin: f64, cell_size: f64, limit: usize) -> usize {
    let raw = ((value - origin) / cell_size).floor();
    (raw.max(0.0) as usize).min(limit - 1)
}

fn validate_geometry(neighborhood: &Neighborhood) -> Result<BBox> {
    if neighborhood.geometry.0.is_empty() {
        return Err(MapError::InvalidGeometry {
            id: neighborhood.id.clone(),
            reason: "empty geometry".to_string(),
        });
    }

    let bbox = BBox::from_geometry(&neighborhood.geometry).ok_or_else(|| MapError::InvalidGeometry {
        id: neighborhood.id.clone(),
        reason: "empty geometry".to_string(),
    })?;

    if !bbox.is_finite() {
        return Err(MapError::InvalidGeometry {
            id: neighborhood.id.clone(),
            reason: "non-finite coordinates".to_string(),
        });
    }

    if !neighborhood.geometry.is_valid() {
        return Err(MapError::InvalidGeometry {
            id: neighborhood.id.clone(),
            reason: "self-intersecting or degenerate boundary".to_string(),
        });
    }

    Ok(bbox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{LineString, MultiPolygon, Polygon};

    fn square(id: &str, x: f64, y: f64, size: f64) -> Neighborhood {
        let exterior = LineString::from(vec![
            (x, y),
            (x + size, y),
            (x + size, y + size),
            (x, y + size),
            (x, y),
        ]);
        Neighborhood {
            id: id.to_string(),
            name: id.to_string(),
            municipality: "Test".to_string(),
            geometry: MultiPolygon(vec![Polygon::new(exterior, vec![])]),
        }
    }

    fn bowtie(id: &str) -> Neighborhood {
        // Self-intersecting exterior ring.
        let exterior = LineString::from(vec![
            (0.0, 0.0),
            (2.0, 2.0),
            (2.0, 0.0),
            (0.0, 2.0),
            (0.0, 0.0),
        ]);
        Neighborhood {
            id: id.to_string(),
            name: id.to_string(),
            municipality: "Test".to_string(),
            geometry: MultiPolygon(vec![Polygon::new(exterior, vec![])]),
        }
    }

    #[test]
    fn test_candidates_are_bbox_pruned() {
        let partition = vec![square("a", 0.0, 0.0, 1.0), square("b", 10.0, 10.0, 1.0)];
        let index = GeometryIndex::build(&partition);

        assert_eq!(index.candidates(0.5, 0.5), vec![0]);
        assert_eq!(index.candidates(10.5, 10.5), vec![1]);
        assert!(index.candidates(5.0, 5.0).is_empty());
    }

    #[test]
    fn test_point_outside_extent_has_no_candidates() {
        let partition = vec![square("a", 0.0, 0.0, 1.0)];
        let index = GeometryIndex::build(&partition);

        assert!(index.candidates(-1.0, 0.5).is_empty());
        assert!(index.candidates(0.5, 99.0).is_empty());
    }

    #[test]
    fn test_malformed_polygons_are_excluded() {
        let partition = vec![square("ok", 0.0, 0.0, 1.0), bowtie("bad")];
        let index = GeometryIndex::build(&partition);

        assert_eq!(index.skipped(), 1);
        assert_eq!(index.len(), 1);
        // The bowtie never shows up as a candidate even inside its bbox.
        assert!(!index.candidates(1.5, 1.0).contains(&1));
    }

    #[test]
    fn test_empty_partition() {
        let index = GeometryIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.candidates(0.0, 0.0).is_empty());
    }

    #[test]
    fn test_candidates_preserve_input_order() {
        // Two coincident squares; candidate order must follow input order.
        let partition = vec![square("first", 0.0, 0.0, 2.0), square("second", 0.0, 0.0, 2.0)];
        let index = GeometryIndex::build(&partition);

        assert_eq!(index.candidates(1.0, 1.0), vec![0, 1]);
    }
}
