use crate::{
  CellIndex, Mask, TileId,
  util::{IPos, Size, UPos},
};
use derive_more::derive::{Deref, DerefMut};

/// How far a single cell has been narrowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellState {
  Solved(TileId),
  Undetermined(usize),
  Contradiction,
}

impl From<Mask> for CellState {
  fn from(mask: Mask) -> Self {
    match mask.count_ones() {
      0 => Self::Contradiction,
      1 => Self::Solved(mask.trailing_zeros() as TileId),
      n => Self::Undetermined(n as usize),
    }
  }
}

/// One word per cell in row major order, dereferences to the words themselves
#[derive(Debug, Clone, PartialEq, Eq, Deref, DerefMut)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid<const DIM: usize> {
  size: Size<DIM>,
  #[deref]
  #[deref_mut]
  cells: Vec<Mask>,
}

impl<const DIM: usize> Grid<DIM> {
  pub fn filled(size: impl Into<Size<DIM>>, mask: Mask) -> Self {
    let size = size.into();
    Self {
      size,
      cells: vec![mask; size.len()],
    }
  }

  pub fn size(&self) -> Size<DIM> {
    self.size
  }

  pub fn cells(&self) -> &[Mask] {
    &self.cells
  }

  pub(crate) fn cells_mut(&mut self) -> &mut Vec<Mask> {
    &mut self.cells
  }

  pub fn state(&self, index: CellIndex) -> CellState {
    CellState::from(self.cells[index])
  }

  /// The word of the cell at `pos`, wrapped onto the grid
  pub fn at_pos(&self, pos: impl Into<IPos<DIM>>) -> Mask {
    self.cells[pos.into().index_in(self.size)]
  }

  pub fn position(&self, index: CellIndex) -> UPos<DIM> {
    UPos::from_index(index, self.size)
  }

  pub fn is_solved(&self) -> bool {
    self.cells.iter().all(|cell| cell.count_ones() == 1)
  }

  pub fn has_contradiction(&self) -> bool {
    self.cells.contains(&0)
  }

  /// The tile of every solved cell, `None` for the rest
  pub fn solved_tiles(&self) -> Vec<Option<TileId>> {
    self
      .cells
      .iter()
      .map(|cell| match CellState::from(*cell) {
        CellState::Solved(tile) => Some(tile),
        _ => None,
      })
      .collect()
  }
}
