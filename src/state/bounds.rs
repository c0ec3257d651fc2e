//! Grid extent calculation. The horizontal range is forced symmetric around
//! column 0 so the origin column always renders centered; vertically only
//! `max_y` anchors the top row, with rows laid out downwards to `min_y`.

/// Layout units per grid cell, before the camera zoom is applied.
pub const CELL_PX: f64 = 200.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridBounds {
    pub range_min_x: i32,
    pub range_max_x: i32,
    pub max_y: i32,
    pub min_y: i32,
}

impl GridBounds {
    /// Bounds of all given coordinates, or `None` when there is nothing to
    /// frame (nothing renders in that case).
    pub fn compute(coords: &[(i32, i32)]) -> Option<GridBounds> {
        let (first_x, first_y) = *coords.first()?;
        let mut min_x = first_x;
        let mut max_x = first_x;
        let mut min_y = first_y;
        let mut max_y = first_y;
        for &(x, y) in &coords[1..] {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        let abs_max = min_x.abs().max(max_x.abs());
        Some(GridBounds {
            range_min_x: -abs_max,
            range_max_x: abs_max,
            max_y,
            min_y,
        })
    }

    /// Unscaled layout position of a cell's top-left corner.
    pub fn cell_origin(&self, x: i32, y: i32) -> (f64, f64) {
        (
            (x - self.range_min_x) as f64 * CELL_PX,
            (self.max_y - y) as f64 * CELL_PX,
        )
    }

    pub fn columns(&self) -> i32 {
        self.range_max_x - self.range_min_x + 1
    }

    pub fn rows(&self) -> i32 {
        self.max_y - self.min_y + 1
    }

    /// Pixel delta between these bounds and the previous ones at the given
    /// zoom. Adding `dx` to the camera's x offset and subtracting `dy` from
    /// its y offset keeps already-visible cells stationary when the drawn
    /// range grows.
    pub fn shift_from(&self, old: &GridBounds, zoom: f64) -> (f64, f64) {
        (
            (self.range_min_x - old.range_min_x) as f64 * CELL_PX * zoom,
            (self.max_y - old.max_y) as f64 * CELL_PX * zoom,
        )
    }
}
