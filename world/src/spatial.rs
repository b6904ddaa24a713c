//! Uniform-bucket spatial index used for broad-phase target acquisition.
//!
//! The grid is fully rebuilt once per tick instead of incrementally
//! maintained: every enemy moves every tick, so an incremental update would
//! cost as much as the rebuild while adding read/write ordering hazards.

use lane_defence_core::EnemyId;

const MIN_CELL_SIZE: f32 = 4.0;

/// Bucket grid over pixel space keyed by entity centers.
#[derive(Debug)]
pub(crate) struct SpatialGrid {
    cols: u32,
    rows: u32,
    cell_size: f32,
    buckets: Vec<Vec<EnemyId>>,
}

impl SpatialGrid {
    /// Creates a grid covering `width` by `height` pixels.
    pub(crate) fn new(width: f32, height: f32, cell_size: f32) -> Self {
        let cell_size = cell_size.max(MIN_CELL_SIZE);
        let cols = ((width / cell_size).ceil() as u32).max(1);
        let rows = ((height / cell_size).ceil() as u32).max(1);
        Self {
            cols,
            rows,
            cell_size,
            buckets: (0..cols * rows).map(|_| Vec::new()).collect(),
        }
    }

    /// Empties every bucket while keeping their capacity for the rebuild.
    pub(crate) fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    /// Buckets an entity by the tile containing its center.
    ///
    /// Non-finite and out-of-bounds coordinates are silently dropped; a
    /// missing broad-phase candidate is harmless, a crash mid-tick is not.
    pub(crate) fn insert(&mut self, id: EnemyId, x: f32, y: f32) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        let Some(index) = self.bucket_index(x, y) else {
            return;
        };
        self.buckets[index].push(id);
    }

    /// Collects candidates from every bucket covering the circle's bounding
    /// box. Broad phase only: the rectangle is a superset of the circle, so
    /// callers must re-check exact distances. Each entity occupies exactly
    /// one bucket, so the union carries no duplicates.
    pub(crate) fn query_circle(&self, cx: f32, cy: f32, radius: f32, out: &mut Vec<EnemyId>) {
        out.clear();
        if !cx.is_finite() || !cy.is_finite() || !radius.is_finite() || radius <= 0.0 {
            return;
        }

        let min_col = (((cx - radius) / self.cell_size).floor().max(0.0)) as u32;
        let min_row = (((cy - radius) / self.cell_size).floor().max(0.0)) as u32;
        let max_col = ((((cx + radius) / self.cell_size).floor()) as i64)
            .clamp(0, i64::from(self.cols) - 1) as u32;
        let max_row = ((((cy + radius) / self.cell_size).floor()) as i64)
            .clamp(0, i64::from(self.rows) - 1) as u32;

        if min_col > max_col || min_row > max_row {
            return;
        }

        for row in min_row..=max_row {
            for col in min_col..=max_col {
                let index = (row * self.cols + col) as usize;
                out.extend_from_slice(&self.buckets[index]);
            }
        }
    }

    fn bucket_index(&self, x: f32, y: f32) -> Option<usize> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let col = (x / self.cell_size).floor() as u32;
        let row = (y / self.cell_size).floor() as u32;
        if col >= self.cols || row >= self.rows {
            return None;
        }
        Some((row * self.cols + col) as usize)
    }
}
