use std::fmt;

/// A caret location: (row, column), both 0-based.
///
/// `col` counts chars (Unicode scalar values) from the start of the row, not
/// bytes. Positions order lexicographically, row first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaretPosition {
    pub row: usize,
    pub col: usize,
}

impl CaretPosition {
    pub const ORIGIN: Self = Self { row: 0, col: 0 };

    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CaretPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}

impl From<(usize, usize)> for CaretPosition {
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}

/// A selection between two carets.
///
/// `start` is where the selection was started and `end` where the caret is,
/// so `start` may come after `end`. Use [`Selection::min`] / [`Selection::max`]
/// for ordered bounds, or [`Selection::normalize`] to reorder in place.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub start: CaretPosition,
    pub end: CaretPosition,
}

impl Selection {
    pub const fn new(start: CaretPosition, end: CaretPosition) -> Self {
        Self { start, end }
    }

    /// Lexicographically smaller bound
    pub fn min(&self) -> CaretPosition {
        self.start.min(self.end)
    }

    /// Lexicographically larger bound
    pub fn max(&self) -> CaretPosition {
        self.start.max(self.end)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Collapse both ends to the origin
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Swap the ends so that `start <= end`
    pub fn normalize(&mut self) {
        if self.start > self.end {
            std::mem::swap(&mut self.start, &mut self.end);
        }
    }
}
