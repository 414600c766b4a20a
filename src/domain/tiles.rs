//! Tile grid partitioning
//!
//! An image is cut into a near-square `cols x rows` grid whose tile count lands
//! in a configured range. Tile source rectangles use integer pixel boundaries
//! so the grid covers the image exactly, without gaps or overlap.

use super::settings::TileCountRange;

/// Tiles never get narrower than this when the grid has to grow.
pub const MIN_TILE_SIDE_PX: u32 = 8;

const MIN_CELLS_PER_AXIS: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridDims {
    pub cols: u32,
    pub rows: u32,
}

impl GridDims {
    pub fn count(&self) -> u32 {
        self.cols * self.rows
    }
}

/// A fixed sub-rectangle of the source image, in image pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSpec {
    pub col: u32,
    pub row: u32,
    pub source_x: u32,
    pub source_y: u32,
    pub source_width: u32,
    pub source_height: u32,
}

impl TileSpec {
    pub fn area(&self) -> u64 {
        self.source_width as u64 * self.source_height as u64
    }

    /// Center of the source rectangle in image space.
    pub fn source_center(&self) -> (f32, f32) {
        (
            self.source_x as f32 + self.source_width as f32 / 2.0,
            self.source_y as f32 + self.source_height as f32 / 2.0,
        )
    }
}

/// Picks a grid for the image, or `None` for an image without area.
pub fn grid_dimensions(width: u32, height: u32, range: TileCountRange) -> Option<GridDims> {
    if width == 0 || height == 0 {
        return None;
    }

    let w = width as f64;
    let h = height as f64;
    let area_per_tile = w * h / range.midpoint();
    let side = area_per_tile.sqrt();

    // Every axis is capped so tiles stay at least MIN_TILE_SIDE_PX wide.
    let max_cols = (width / MIN_TILE_SIDE_PX).max(MIN_CELLS_PER_AXIS);
    let max_rows = (height / MIN_TILE_SIDE_PX).max(MIN_CELLS_PER_AXIS);

    let mut cols = ((w / side).round() as u32).clamp(MIN_CELLS_PER_AXIS, max_cols);
    let mut rows = ((h / side).round() as u32).clamp(MIN_CELLS_PER_AXIS, max_rows);
    let count = |cols: u32, rows: u32| cols as u64 * rows as u64;

    while count(cols, rows) < range.min as u64 {
        let grow_cols = cols <= rows;
        if grow_cols && cols < max_cols {
            cols += 1;
        } else if !grow_cols && rows < max_rows {
            rows += 1;
        } else if cols < max_cols {
            cols += 1;
        } else if rows < max_rows {
            rows += 1;
        } else {
            break;
        }
    }

    while count(cols, rows) > range.max as u64 {
        let shrink_cols = cols >= rows;
        if shrink_cols && cols > MIN_CELLS_PER_AXIS {
            cols -= 1;
        } else if !shrink_cols && rows > MIN_CELLS_PER_AXIS {
            rows -= 1;
        } else if cols > MIN_CELLS_PER_AXIS {
            cols -= 1;
        } else if rows > MIN_CELLS_PER_AXIS {
            rows -= 1;
        } else {
            break;
        }
    }

    Some(GridDims { cols, rows })
}

/// Source rectangles in row-major order. Column `i` spans
/// `[i*W/cols, (i+1)*W/cols)`, so widths differ by at most one pixel.
pub fn tile_specs(width: u32, height: u32, dims: GridDims) -> Vec<TileSpec> {
    let edge = |i: u32, total: u32, cells: u32| ((i as u64 * total as u64) / cells as u64) as u32;

    let mut tiles = Vec::with_capacity(dims.count() as usize);
    for row in 0..dims.rows {
        let y0 = edge(row, height, dims.rows);
        let y1 = edge(row + 1, height, dims.rows);
        for col in 0..dims.cols {
            let x0 = edge(col, width, dims.cols);
            let x1 = edge(col + 1, width, dims.cols);
            tiles.push(TileSpec {
                col,
                row,
                source_x: x0,
                source_y: y0,
                source_width: x1 - x0,
                source_height: y1 - y0,
            });
        }
    }
    tiles
}
