//! Cleanup passes run before a mesh is written: dropping unused points and
//! snapping coordinates onto a bounding box.

use std::str::FromStr;                                 // BoundingBox from "xmin,...,zmax"

use tracing::debug;

use crate::error::{MeshError, MeshResult};
use crate::structs_and_impls::MeshModel;

/// Default snapping tolerance.
pub const DEFAULT_SNAP_EPS: f64 = 1e-6;

/// Outcome of [`GridCleaner::rebuild`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// Indices (in the old numbering, ascending) of the points that were dropped.
    pub removed: Vec<usize>,
}

/// Removes points no cell references and renumbers the cells to match.
pub struct GridCleaner;

impl GridCleaner {
    /// Delete unreferenced points and shift cell indices down so they stay
    /// contiguous from 0. Surviving points keep their relative order.
    ///
    /// Indices are validated first; an out-of-range index aborts before
    /// anything is modified.
    pub fn rebuild(
        points: &mut Vec<[f64; 3]>,
        connectivity: &mut [usize],
        arity: usize,
    ) -> MeshResult<RebuildReport> {
        let num_points = points.len();
        if let Some(pos) = connectivity.iter().position(|&i| i >= num_points) {
            return Err(MeshError::IndexOutOfRange {
                cell: pos / arity.max(1),
                index: connectivity[pos],
                num_points,
            });
        }

        let mut used = vec![false; num_points];
        for &i in connectivity.iter() {
            used[i] = true;
        }
        let removed: Vec<usize> = (0..num_points).filter(|&i| !used[i]).collect();
        if removed.is_empty() {
            return Ok(RebuildReport::default());
        }

        // Highest first: every index above k moves down by one, and the
        // comparisons for smaller k still see the original numbering below k.
        for &k in removed.iter().rev() {
            for index in connectivity.iter_mut() {
                if *index > k {
                    *index -= 1;
                }
            }
        }

        let mut old_index = 0;
        points.retain(|_| {
            let keep = used[old_index];
            old_index += 1;
            keep
        });

        debug!(removed = removed.len(), remaining = points.len(), "removed unused points");
        Ok(RebuildReport { removed })
    }
}

/// Axis-aligned box given as `[xmin, ymin, zmin, xmax, ymax, zmax]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    pub fn from_array(b: [f64; 6]) -> Self {
        Self {
            min: [b[0], b[1], b[2]],
            max: [b[3], b[4], b[5]],
        }
    }

    /// Tightest box around the points, or `None` for an empty slice.
    pub fn from_points(points: &[[f64; 3]]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = Self {
            min: *first,
            max: *first,
        };
        for p in &points[1..] {
            for j in 0..3 {
                bbox.min[j] = bbox.min[j].min(p[j]);
                bbox.max[j] = bbox.max[j].max(p[j]);
            }
        }
        Some(bbox)
    }

    pub fn to_array(&self) -> [f64; 6] {
        [
            self.min[0], self.min[1], self.min[2], self.max[0], self.max[1], self.max[2],
        ]
    }
}

impl FromStr for BoundingBox {
    type Err = MeshError;

    /// Parse `xmin,ymin,zmin,xmax,ymax,zmax`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| MeshError::invalid_content(format!("bad bounding box '{s}': {e}")))?;
        let b: [f64; 6] = values.try_into().map_err(|v: Vec<f64>| {
            MeshError::invalid_content(format!(
                "bounding box needs 6 values (xmin,ymin,zmin,xmax,ymax,zmax), got {}",
                v.len()
            ))
        })?;
        Ok(Self::from_array(b))
    }
}

/// Pulls coordinates that lie within a tolerance of a box face onto that face.
pub struct BoundingBoxSnapper;

impl BoundingBoxSnapper {
    /// Snap every coordinate closer than `eps` to a box bound onto the bound.
    ///
    /// Both bounds are tested against the coordinate as it was before this
    /// call, min first and max second, so a value near both ends up on the max.
    /// Returns the number of coordinates that changed.
    pub fn snap(points: &mut [[f64; 3]], bbox: &BoundingBox, eps: f64) -> usize {
        let mut moved = 0;
        for p in points.iter_mut() {
            let original = *p;
            for j in 0..3 {
                if original[j] < bbox.min[j] + eps {
                    p[j] = bbox.min[j];
                }
                if original[j] > bbox.max[j] - eps {
                    p[j] = bbox.max[j];
                }
                if p[j] != original[j] {
                    moved += 1;
                }
            }
        }
        moved
    }
}

impl MeshModel {
    /// Run [`GridCleaner::rebuild`] on this mesh and compact the point data
    /// arrays the same way, keeping them aligned with the surviving points.
    pub fn rebuild(&mut self) -> MeshResult<RebuildReport> {
        let arity = self.cell_type.arity();
        let report = GridCleaner::rebuild(&mut self.points, &mut self.connectivity, arity)?;
        if !report.removed.is_empty() {
            for array in &mut self.point_data {
                let mut removed = report.removed.iter().peekable();
                let mut old_index = 0;
                array.values.retain(|_| {
                    let drop = removed.peek() == Some(&&old_index);
                    if drop {
                        removed.next();
                    }
                    old_index += 1;
                    !drop
                });
            }
        }
        Ok(report)
    }

    /// Snap this mesh's points onto `bbox`, see [`BoundingBoxSnapper::snap`].
    pub fn snap_to_box(&mut self, bbox: &BoundingBox, eps: f64) -> usize {
        let moved = BoundingBoxSnapper::snap(&mut self.points, bbox, eps);
        debug!(moved, eps, "snapped coordinates to bounding box");
        moved
    }
}
