use crate::{DirectionId, Mask, TileId};
use derive_more::derive::{Deref, DerefMut};
use nalgebra::SVector;
use std::{
  borrow::Borrow,
  ops::{Add, Rem},
};

#[derive(Debug, Clone, Copy, Deref, DerefMut, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size<const DIM: usize>(SVector<usize, DIM>);

impl<const DIM: usize> Size<DIM> {
  pub fn new(inner: [usize; DIM]) -> Self {
    Self(SVector::from(inner))
  }

  /// Number of cells in a world of this shape
  pub fn len(&self) -> usize {
    self.0.iter().product()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn contains(&self, pos: &UPos<DIM>) -> bool {
    pos.iter().enumerate().all(|(i, p)| *p < self[i])
  }
}

impl<const DIM: usize> From<[usize; DIM]> for Size<DIM> {
  fn from(value: [usize; DIM]) -> Self {
    Self::new(value)
  }
}

/// A signed position, wrapped onto the torus before it is used as an index
#[derive(Debug, Clone, Copy, Deref, DerefMut, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IPos<const DIM: usize>(pub SVector<isize, DIM>);

impl<const DIM: usize> IPos<DIM> {
  pub fn new(inner: [isize; DIM]) -> Self {
    Self(SVector::from(inner))
  }

  pub fn wrap(&self, size: Size<DIM>) -> UPos<DIM> {
    UPos(SVector::from_iterator(
      self
        .iter()
        .zip(size.iter().map(|s| *s as isize))
        .map(|(i, s)| wrap(*i, s) as usize),
    ))
  }

  pub fn index_in(&self, size: Size<DIM>) -> usize {
    self.wrap(size).index(size)
  }
}

impl<T, const DIM: usize> From<T> for IPos<DIM>
where
  T: Into<SVector<isize, DIM>>,
{
  fn from(value: T) -> Self {
    Self(value.into())
  }
}

#[derive(Debug, Clone, Copy, Deref, DerefMut, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UPos<const DIM: usize>(pub SVector<usize, DIM>);

impl<const DIM: usize> UPos<DIM> {
  pub fn new(inner: [usize; DIM]) -> Self {
    Self(SVector::from(inner))
  }

  pub fn from_index(index: usize, size: Size<DIM>) -> Self {
    Self(SVector::from(from_index(index, size)))
  }

  pub fn index(&self, size: Size<DIM>) -> usize {
    to_index(self.iter(), size)
  }
}

impl<T, const DIM: usize> From<T> for UPos<DIM>
where
  T: Into<SVector<usize, DIM>>,
{
  fn from(value: T) -> Self {
    Self(value.into())
  }
}

impl<const DIM: usize> Add<DirectionId> for IPos<DIM> {
  type Output = Self;

  /// Steps one cell in the given direction, the first DIM directions
  /// point towards lower coordinates and the rest towards higher ones
  fn add(mut self, rhs: DirectionId) -> Self::Output {
    let (axis, offset) = if *rhs < DIM {
      (*rhs, -1)
    } else {
      (*rhs - DIM, 1)
    };
    self[axis] += offset;
    self
  }
}

/// Row major flattening, the last axis varies fastest
pub fn to_index<const DIM: usize>(
  iter: impl Iterator<Item = impl Borrow<usize>>,
  size: Size<DIM>,
) -> usize {
  iter
    .zip(size.iter())
    .fold(0, |acc, (p, s)| acc * s + *p.borrow())
}

/// Inverse of `to_index`
pub fn from_index<const DIM: usize>(mut index: usize, size: Size<DIM>) -> [usize; DIM] {
  let mut parts = [0; DIM];

  // peel off the fastest axis first
  for axis in (0..DIM).rev() {
    parts[axis] = index % size[axis];
    index /= size[axis];
  }

  parts
}

pub fn wrap<T>(i: T, s: T) -> T
where
  T: Clone + Copy + Add<T, Output = T> + Rem<T, Output = T>,
{
  ((i % s) + s) % s
}

/// Iterates the indexes of the set bits in a mask, lowest first
pub fn bits(mut mask: Mask) -> impl Iterator<Item = TileId> {
  std::iter::from_fn(move || {
    if mask == 0 {
      return None;
    }
    let bit = mask.trailing_zeros() as TileId;
    mask &= mask - 1;
    Some(bit)
  })
}

#[cfg(test)]
mod tests {
  use super::{IPos, Size, UPos, bits};
  use crate::DirectionId;

  #[test]
  fn upos_indexes() {
    let size = Size::new([5, 5, 5]);
    let pos = UPos::new([2, 3, 4]);
    let index = pos.index(size);
    assert_eq!(index, 69);
    let orig = UPos::from_index(index, size);
    assert_eq!(pos, orig);
  }

  #[test]
  fn uneven_shape_indexes() {
    let size = Size::new([3, 7]);
    for index in 0..size.len() {
      let pos = UPos::from_index(index, size);
      assert!(size.contains(&pos));
      assert_eq!(pos.index(size), index);
    }
    assert_eq!(UPos::new([1, 0]).index(size), 7);
  }

  #[test]
  fn wrapped_ipos() {
    let size = Size::new([4]);
    let pos = IPos::new([-1]);
    assert_eq!(pos.wrap(size), UPos::new([3]));

    let size = Size::new([10, 10]);
    assert_eq!(IPos::new([-1, -1]).wrap(size), UPos::new([9, 9]));
    assert_eq!(IPos::new([10, 10]).wrap(size), UPos::new([0, 0]));
  }

  #[test]
  fn stepping_by_direction() {
    let pos = IPos::new([2, 2]);
    assert_eq!(pos + DirectionId::new(0), IPos::new([1, 2]));
    assert_eq!(pos + DirectionId::new(1), IPos::new([2, 1]));
    assert_eq!(pos + DirectionId::new(2), IPos::new([3, 2]));
    assert_eq!(pos + DirectionId::new(3), IPos::new([2, 3]));
  }

  #[test]
  fn set_bits() {
    assert_eq!(bits(0).count(), 0);
    assert_eq!(bits(0b1011).collect::<Vec<_>>(), vec![0, 1, 3]);
    assert_eq!(bits(1 << 63).collect::<Vec<_>>(), vec![63]);
  }
}
