//! Static lane geometry and the buildable-tile mask derived from it.
//!
//! The lane is authored as a handful of corner nodes forming an S shape and
//! expanded into one step per tile. Horizontal deltas are resolved before
//! vertical ones so the dense path never takes a diagonal step, which keeps
//! the mask free of diagonal adjacency gaps.

use std::collections::HashSet;

use lane_defence_core::{PixelPoint, TileCoord};

/// Side length of one square tile in pixels.
pub const TILE_SIZE: f32 = 64.0;
/// Number of tile columns in the grid.
pub const GRID_COLS: u32 = 15;
/// Number of tile rows in the grid. Nine horizontal lanes with a blank row
/// between each for placement clarity.
pub const GRID_ROWS: u32 = 19;

/// Pixel-space center of a tile.
#[must_use]
pub fn tile_center(tile: TileCoord) -> PixelPoint {
    PixelPoint::new(
        tile.column() as f32 * TILE_SIZE + TILE_SIZE / 2.0,
        tile.row() as f32 * TILE_SIZE + TILE_SIZE / 2.0,
    )
}

/// Dense enemy route plus the derived set of blocked tiles.
#[derive(Debug)]
pub struct Path {
    steps: Vec<TileCoord>,
    mask: HashSet<TileCoord>,
}

impl Path {
    /// Builds the S-shaped lane layout for the default grid.
    #[must_use]
    pub(crate) fn lane() -> Self {
        let steps = expand_to_orthogonal(&corner_nodes());
        let mask = mask_from_steps(&steps);
        Self { steps, mask }
    }

    /// Dense per-tile route from entry to exit.
    #[must_use]
    pub fn steps(&self) -> &[TileCoord] {
        &self.steps
    }

    /// Reports whether the tile belongs to the lane and blocks placement.
    #[must_use]
    pub fn blocks(&self, tile: TileCoord) -> bool {
        self.mask.contains(&tile)
    }
}

/// Designer corner nodes for the S-shaped lane.
///
/// Entry sits just inside the top edge, lanes run at every other row with
/// their open end alternating left and right, and the exit leaves near the
/// bottom-right edge.
fn corner_nodes() -> Vec<TileCoord> {
    let mut nodes = vec![TileCoord::new(1, 0)];

    let mut lane = 0;
    let mut row = 1;
    while row < GRID_ROWS - 1 {
        let column = if lane % 2 == 0 { GRID_COLS - 2 } else { 1 };
        nodes.push(TileCoord::new(column, row));
        lane += 1;
        row += 2;
    }

    nodes.push(TileCoord::new(GRID_COLS - 2, GRID_ROWS - 1));
    nodes
}

/// Expands corner nodes into one step per unit tile, horizontal delta first.
fn expand_to_orthogonal(nodes: &[TileCoord]) -> Vec<TileCoord> {
    let Some(first) = nodes.first() else {
        return Vec::new();
    };

    let mut out = vec![*first];
    let mut column = first.column();
    let mut row = first.row();

    for node in &nodes[1..] {
        while column != node.column() {
            column = if node.column() > column {
                column + 1
            } else {
                column - 1
            };
            out.push(TileCoord::new(column, row));
        }
        while row != node.row() {
            row = if node.row() > row { row + 1 } else { row - 1 };
            out.push(TileCoord::new(column, row));
        }
    }

    out
}

fn mask_from_steps(steps: &[TileCoord]) -> HashSet<TileCoord> {
    steps.iter().copied().collect()
}
