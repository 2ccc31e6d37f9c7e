use strum::FromRepr;

use crate::error::{Error, Result};

use super::State;

/// The kind of a grid cell, with its conventional integer code as discriminant
#[derive(FromRepr, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Cell {
    Normal = 0,
    Reward = 1,
    Penalty = -1,
    Blocked = 9,
}

impl TryFrom<i32> for Cell {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self> {
        i8::try_from(code)
            .ok()
            .and_then(Cell::from_repr)
            .ok_or(Error::InvalidCell { code })
    }
}

/// A non-empty, rectangular, immutable grid of [cells](Cell)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    /// **Errors** if the grid is empty or its rows differ in length
    pub fn new(cells: Vec<Vec<Cell>>) -> Result<Self> {
        let expected = cells.first().map(Vec::len).unwrap_or_default();
        if expected == 0 {
            return Err(Error::EmptyGrid);
        }
        if let Some((row, r)) = cells.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(Error::RaggedGrid {
                row,
                expected,
                got: r.len(),
            });
        }

        Ok(Self { cells })
    }

    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    pub fn column_count(&self) -> usize {
        self.cells[0].len()
    }

    /// The cell at `state`, or `None` if it lies outside the grid
    pub fn get(&self, state: State) -> Option<Cell> {
        self.cells
            .get(state.row)
            .and_then(|r| r.get(state.column))
            .copied()
    }

    /// Every coordinate with its cell, in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (State, Cell)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, r)| {
            r.iter()
                .enumerate()
                .map(move |(column, &cell)| (State::new(row, column), cell))
        })
    }
}

impl TryFrom<Vec<Vec<i32>>> for Grid {
    type Error = Error;

    fn try_from(codes: Vec<Vec<i32>>) -> Result<Self> {
        let cells = codes
            .into_iter()
            .map(|r| {
                r.into_iter()
                    .map(Cell::try_from)
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(cells)
    }
}

impl<const R: usize, const C: usize> TryFrom<[[i32; C]; R]> for Grid {
    type Error = Error;

    fn try_from(codes: [[i32; C]; R]) -> Result<Self> {
        Self::try_from(Vec::from(codes.map(Vec::from)))
    }
}
