use crate::error::{EngineResult, FanjoinError};
use std::io::Read;

/// Fixed-size, row-major grid of integers searched by row partitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<i64>,
}

impl Grid {
    /// Build a grid from row-major cells; `cells.len()` must be `rows * cols`
    pub fn new(rows: usize, cols: usize, cells: Vec<i64>) -> EngineResult<Self> {
        let expected = cell_count(rows, cols)?;
        if cells.len() != expected {
            return Err(FanjoinError::invalid(format!(
                "grid {}x{} needs {} cells, got {}",
                rows,
                cols,
                expected,
                cells.len()
            )));
        }
        Ok(Self { rows, cols, cells })
    }

    /// Build a grid from nested rows, all of equal length
    pub fn from_rows(rows: Vec<Vec<i64>>) -> EngineResult<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(FanjoinError::invalid(format!(
                "row {} has {} columns, expected {}",
                i,
                row.len(),
                width
            )));
        }
        Self::new(height, width, rows.into_iter().flatten().collect())
    }

    /// Read `rows * cols` whitespace-separated integers, row by row
    ///
    /// A missing or non-numeric cell fails with its coordinate. Anything after the last
    /// expected cell is ignored.
    pub fn read_from<R: Read>(mut reader: R, rows: usize, cols: usize) -> EngineResult<Self> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|e| FanjoinError::Input(format!("failed to read grid: {e}")))?;
        Self::parse(&text, rows, cols)
    }

    /// Parse grid text, see [`Grid::read_from`]
    pub fn parse(text: &str, rows: usize, cols: usize) -> EngineResult<Self> {
        let expected = cell_count(rows, cols)?;
        let mut tokens = text.split_whitespace();
        let mut cells = Vec::with_capacity(expected.min(text.len() / 2 + 1));
        for row in 0..rows {
            for col in 0..cols {
                let value = tokens
                    .next()
                    .and_then(|t| t.parse::<i64>().ok())
                    .ok_or_else(|| {
                        FanjoinError::Input(format!("bad input at coordinate [{row},{col}]"))
                    })?;
                cells.push(value);
            }
        }
        Self::new(rows, cols, cells)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// One row of the grid. Panics if `row >= rows()`.
    pub fn row(&self, row: usize) -> &[i64] {
        let start = row * self.cols;
        &self.cells[start..start + self.cols]
    }

    pub fn get(&self, row: usize, col: usize) -> Option<i64> {
        if row < self.rows && col < self.cols {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }
}

fn cell_count(rows: usize, cols: usize) -> EngineResult<usize> {
    if rows == 0 || cols == 0 {
        return Err(FanjoinError::invalid(format!(
            "grid dimensions must be non-zero, got {rows}x{cols}"
        )));
    }
    rows.checked_mul(cols)
        .ok_or_else(|| FanjoinError::invalid(format!("grid {rows}x{cols} is too large")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_row_major() {
        let grid = Grid::parse("1 2 3\n4 5 6\n", 2, 3).unwrap();
        assert_eq!(grid.row(0), &[1, 2, 3]);
        assert_eq!(grid.row(1), &[4, 5, 6]);
        assert_eq!(grid.get(1, 2), Some(6));
        assert_eq!(grid.get(2, 0), None);
    }

    #[test]
    fn test_layout_of_whitespace_does_not_matter() {
        let grid = Grid::parse("1\n2\t3 4", 2, 2).unwrap();
        assert_eq!(grid.row(1), &[3, 4]);
    }

    #[test]
    fn test_bad_cell_reports_coordinate() {
        let err = Grid::parse("1 2 x 4", 2, 2).unwrap_err();
        assert_eq!(
            err,
            FanjoinError::Input("bad input at coordinate [1,0]".to_string())
        );
    }

    #[test]
    fn test_missing_cells_report_first_missing_coordinate() {
        let err = Grid::parse("1 2 3", 2, 2).unwrap_err();
        assert_eq!(
            err,
            FanjoinError::Input("bad input at coordinate [1,1]".to_string())
        );
    }

    #[test]
    fn test_trailing_values_ignored() {
        let grid = Grid::parse("1 2 3 4 5 6", 1, 2).unwrap();
        assert_eq!(grid.row(0), &[1, 2]);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            Grid::parse("", 0, 5),
            Err(FanjoinError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(Grid::from_rows(vec![vec![1, 2], vec![3]]).is_err());
    }

    #[test]
    fn test_read_from_reader() {
        let grid = Grid::read_from("7 8\n9 10\n".as_bytes(), 2, 2).unwrap();
        assert_eq!(grid.row(0), &[7, 8]);
    }
}
