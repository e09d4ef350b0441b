use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

/// A fixed-shape, row-major grid of booleans. Used both for the marks read
/// off a sheet and for the answer key they are compared against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoolGrid {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

/// Marks read from a sheet; `true` means the bubble is filled.
pub type BubbleMatrix = BoolGrid;

/// Reference marks for a sheet; `true` means the bubble should be filled.
pub type AnswerKey = BoolGrid;

impl BoolGrid {
    /// Creates a grid with every cell unfilled.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows * cols],
        }
    }

    /// Builds a grid from nested rows. Returns `None` if the rows are ragged.
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != cols) {
            return None;
        }
        Some(Self {
            rows: rows.len(),
            cols,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<bool> {
        if row < self.rows && col < self.cols {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    /// Sets a cell. Panics if the position is outside the grid.
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        assert!(
            row < self.rows && col < self.cols,
            "cell ({}, {}) outside {}x{} grid",
            row,
            col,
            self.rows,
            self.cols
        );
        self.cells[row * self.cols + col] = value;
    }

    /// Iterates over the grid one row at a time.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[bool]> {
        // `chunks` rejects a zero size, and a zero-column grid has no cells.
        self.cells.chunks(self.cols.max(1))
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub fn count_filled(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell).count()
    }
}

impl Serialize for BoolGrid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter_rows())
    }
}

impl<'de> Deserialize<'de> for BoolGrid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let rows = Vec::<Vec<bool>>::deserialize(deserializer)?;
        BoolGrid::from_rows(rows)
            .ok_or_else(|| serde::de::Error::custom("grid rows must all have the same length"))
    }
}

/// An axis-aligned region of an image, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

impl From<BoundingBox> for Rect {
    fn from(bounds: BoundingBox) -> Self {
        Rect::at(bounds.x as i32, bounds.y as i32).of_size(bounds.width, bounds.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(BoolGrid::from_rows(vec![vec![true, false], vec![true]]).is_none());
        let grid = BoolGrid::from_rows(vec![vec![true, false], vec![false, true]]).unwrap();
        assert_eq!(grid.shape(), (2, 2));
        assert_eq!(grid.get(0, 0), Some(true));
        assert_eq!(grid.get(1, 0), Some(false));
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.count_filled(), 2);
    }

    #[test]
    fn test_serializes_row_major() {
        let mut grid = BoolGrid::new(2, 3);
        grid.set(1, 2, true);
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(json, "[[false,false,false],[false,false,true]]");

        let parsed: BoolGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, grid);
        assert!(serde_json::from_str::<BoolGrid>("[[true],[true,false]]").is_err());
    }

    #[test]
    fn test_bounding_box_to_rect() {
        let bounds = BoundingBox {
            x: 3,
            y: 4,
            width: 10,
            height: 20,
        };
        let rect = Rect::from(bounds);
        assert_eq!((rect.left(), rect.top()), (3, 4));
        assert_eq!((rect.width(), rect.height()), (10, 20));
        assert_eq!((bounds.right(), bounds.bottom()), (13, 24));
    }
}
