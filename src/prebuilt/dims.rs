//! Directions are declared negative sides first, then the positive sides in the same axis order
//!
//! So in 2d the order is left, up, right, down and the opposite of a direction is half a turn away

use crate::{Direction, DirectionId};
use strum_macros::{EnumCount, EnumIter, VariantArray};

#[derive(
  PartialEq, Eq, Hash, PartialOrd, Ord, EnumCount, EnumIter, VariantArray, Clone, Copy, Debug,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dim1d {
  Left,
  Right,
}

impl Direction for Dim1d {
  fn id(&self) -> DirectionId {
    DirectionId::new(*self as usize)
  }
}

#[derive(
  PartialEq, Eq, Hash, PartialOrd, Ord, EnumCount, EnumIter, VariantArray, Clone, Copy, Debug,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dim2d {
  Left,
  Up,
  Right,
  Down,
}

impl Direction for Dim2d {
  fn id(&self) -> DirectionId {
    DirectionId::new(*self as usize)
  }
}

#[derive(
  PartialEq, Eq, Hash, PartialOrd, Ord, EnumCount, EnumIter, VariantArray, Clone, Copy, Debug,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dim3d {
  Left,
  Up,
  Backward,
  Right,
  Down,
  Forward,
}

impl Direction for Dim3d {
  fn id(&self) -> DirectionId {
    DirectionId::new(*self as usize)
  }
}
