// Copyright 2025 the ipip Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Borrowed numeric matrices handed to the heatmap rasterizer.

/// How a flat slice is laid out as a matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellOrder {
    /// Row `r` occupies `values[r * cols..(r + 1) * cols]`.
    RowMajor,
    /// Column `c` occupies `values[c * rows..(c + 1) * rows]`.
    ColumnMajor,
}

/// A `rows x cols` matrix borrowed from a flat slice.
///
/// Trailing values that do not fill a whole row (or column) are ignored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridView<'a> {
    values: &'a [f64],
    rows: usize,
    cols: usize,
    order: CellOrder,
}

impl<'a> GridView<'a> {
    /// Views `values` as rows of `cols` cells.
    pub fn row_major(values: &'a [f64], cols: usize) -> Self {
        let rows = values.len().checked_div(cols).unwrap_or(0);
        Self {
            values: &values[..rows * cols],
            rows,
            cols,
            order: CellOrder::RowMajor,
        }
    }

    /// Views `values` as columns of `rows` cells.
    pub fn column_major(values: &'a [f64], rows: usize) -> Self {
        let cols = values.len().checked_div(rows).unwrap_or(0);
        Self {
            values: &values[..rows * cols],
            rows,
            cols,
            order: CellOrder::ColumnMajor,
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Storage order.
    pub fn order(&self) -> CellOrder {
        self.order
    }

    /// Number of cells, `rows * cols`.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The cells in storage order.
    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    /// Returns `(row, col)` of the cell stored at index `i`.
    #[inline]
    pub fn cell(&self, i: usize) -> (usize, usize) {
        match self.order {
            CellOrder::RowMajor => (i / self.cols, i % self.cols),
            CellOrder::ColumnMajor => (i % self.rows, i / self.rows),
        }
    }

    /// Returns the value at `(row, col)`, if in bounds.
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let i = match self.order {
            CellOrder::RowMajor => row * self.cols + col,
            CellOrder::ColumnMajor => col * self.rows + row,
        };
        Some(self.values[i])
    }

    /// Smallest and largest value, skipping NaN. `None` if nothing remains.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        let mut it = self.values.iter().copied().filter(|v| !v.is_nan());
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn row_and_column_major_agree_on_cells() {
        // 2x3 matrix [[1, 2, 3], [4, 5, 6]].
        let rm = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let cm = [1.0, 4.0, 2.0, 5.0, 3.0, 6.0];
        let a = GridView::row_major(&rm, 3);
        let b = GridView::column_major(&cm, 2);
        assert_eq!((a.rows(), a.cols()), (2, 3));
        assert_eq!((b.rows(), b.cols()), (2, 3));
        assert_eq!(a.order(), CellOrder::RowMajor);
        assert_eq!(b.order(), CellOrder::ColumnMajor);
        for r in 0..2 {
            for c in 0..3 {
                assert_eq!(a.value(r, c), b.value(r, c), "cell ({r}, {c})");
            }
        }
        for i in 0..6 {
            let (r, c) = b.cell(i);
            assert_eq!(b.value(r, c), Some(cm[i]));
            let (r, c) = a.cell(i);
            assert_eq!(a.value(r, c), Some(rm[i]));
        }
    }

    #[test]
    fn ragged_tail_is_dropped() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        let g = GridView::row_major(&v, 2);
        assert_eq!((g.rows(), g.len()), (2, 4));
        assert_eq!(g.value(2, 0), None);
        assert!(GridView::row_major(&v, 0).is_empty());
    }

    #[test]
    fn min_max_skips_nan() {
        let v = [f64::NAN, 3.0, -1.0, 2.0];
        assert_eq!(GridView::row_major(&v, 2).min_max(), Some((-1.0, 3.0)));
        assert_eq!(GridView::row_major(&[f64::NAN], 1).min_max(), None);
    }
}
