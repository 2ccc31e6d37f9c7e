use std::fmt;

use strum::{EnumIter, VariantArray};

/// A cell coordinate in the grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State {
    pub row: usize,
    pub column: usize,
}

impl State {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Apply a `(row, column)` delta, or `None` if either coordinate would go negative
    pub(crate) fn offset(self, (dr, dc): (isize, isize)) -> Option<Self> {
        Some(Self {
            row: self.row.checked_add_signed(dr)?,
            column: self.column.checked_add_signed(dc)?,
        })
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.row, self.column)
    }
}

/// A move to one of the four neighbouring cells
#[derive(EnumIter, VariantArray, Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    /// The action pointing the exact opposite way
    pub const fn opposite(self) -> Self {
        match self {
            Action::Up => Action::Down,
            Action::Down => Action::Up,
            Action::Left => Action::Right,
            Action::Right => Action::Left,
        }
    }

    /// `(row, column)` change caused by this action
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Action::Up => (-1, 0),
            Action::Down => (1, 0),
            Action::Left => (0, -1),
            Action::Right => (0, 1),
        }
    }
}
