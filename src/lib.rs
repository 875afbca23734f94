pub(crate) mod err;
pub(crate) mod grid;
pub(crate) mod model;
#[cfg(feature = "profiling")]
pub mod perf;
pub mod prebuilt;
pub(crate) mod runner;
pub(crate) mod tiles;
pub(crate) mod util;

use derive_more::derive::{Deref, DerefMut};
use derive_new::new;
pub use strum;

use std::{fmt::Debug, hash::Hash};
use strum::{EnumCount, IntoEnumIterator, VariantArray};

pub mod prelude {
  pub use super::{
    Candidate, Direction, Executor, Observer, Propagator, Status,
    err::Error,
    grid::{CellState, Grid},
    model::{Adjacency, Model, ModelBuilder},
    prebuilt,
    runner::{DEFAULT_SNAPSHOT_EVERY, RunState, Runner, RunnerBuilder, Steps},
    tiles::{Legend, Tile, compatible},
    util::{IPos, Size, UPos, bits},
  };
}

pub use prelude::*;

pub type CellIndex = usize;
pub type TileId = usize;
pub type SocketId = usize;

/// The whole state of one cell, bit `i` set means tile `i` is still possible
pub type Mask = u64;

/// Upper bound on registered tiles, every tile owns one bit of a `Mask`
pub const MAX_TILES: usize = Mask::BITS as usize;

#[derive(new, Deref, DerefMut, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectionId(usize);

impl DirectionId {
  /// The direction pointing back, `(d + DIM) mod 2 * DIM`
  pub fn opposite<const DIM: usize>(self) -> Self {
    Self((*self + DIM) % (2 * DIM))
  }

  pub fn all<const DIM: usize>() -> impl Iterator<Item = Self> {
    (0..2 * DIM).map(Self)
  }
}

/// Lets persisted types require serde only when the feature is on
#[cfg(not(feature = "serde"))]
pub trait MaybeSerde {}

#[cfg(not(feature = "serde"))]
impl<T> MaybeSerde for T {}

#[cfg(feature = "serde")]
pub trait MaybeSerde: serde::Serialize + for<'de> serde::Deserialize<'de> {}

#[cfg(feature = "serde")]
impl<T> MaybeSerde for T where T: serde::Serialize + for<'de> serde::Deserialize<'de> {}

/// Labels on the sides of a tile, two tiles fit when the labels facing each other are equal
pub trait Socket: Debug + Eq + Hash + Ord + Clone + Send + Sync + MaybeSerde {}

impl<T> Socket for T where T: Debug + Eq + Hash + Ord + Clone + Send + Sync + MaybeSerde {}

/// Named directions, declared in model order: every negative side first, then the positive sides
pub trait Direction:
  PartialEq<Self>
  + Eq
  + Hash
  + Clone
  + Copy
  + EnumCount
  + IntoEnumIterator
  + Debug
  + VariantArray
{
  fn id(&self) -> DirectionId;

  fn opposite(&self) -> Self {
    Self::VARIANTS[(*self.id() + Self::COUNT / 2) % Self::COUNT]
  }
}

/// The decision carried from one observation to the next propagation
#[derive(new, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Candidate {
  pub index: CellIndex,
  pub mask: Mask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Done,
  Contradiction,
  Continue(Candidate),
}

impl Status {
  pub fn complete(&self) -> bool {
    *self == Self::Done
  }

  pub fn terminal(&self) -> bool {
    !matches!(self, Self::Continue(_))
  }

  pub fn candidate(&self) -> Option<Candidate> {
    match self {
      Self::Continue(candidate) => Some(*candidate),
      _ => None,
    }
  }
}

/// Picks the next cell to collapse and the tile it collapses to
pub trait Observer: Debug {
  fn observe<S: Socket, const DIM: usize>(
    &mut self,
    model: &Model<S, DIM>,
    grid: &Grid<DIM>,
  ) -> Result<Status, err::Error<DIM>>;
}

/// Restores arc consistency after a cell has been narrowed
pub trait Propagator: Debug {
  /// Narrows `grid[index]` to `collapsed` and closes the grid again.
  /// Returns the number of mask reductions applied, zero iff nothing changed.
  ///
  /// The grid must already be closed, see `settle`. Strategies may only revisit
  /// cells reachable from `index` through changed masks
  fn propagate<S: Socket, const DIM: usize>(
    &mut self,
    model: &Model<S, DIM>,
    grid: &mut Grid<DIM>,
    index: CellIndex,
    collapsed: Mask,
  ) -> usize;

  /// Closes a grid of unknown consistency, every cell is examined
  fn settle<S: Socket, const DIM: usize>(
    &mut self,
    model: &Model<S, DIM>,
    grid: &mut Grid<DIM>,
  ) -> usize;
}

/// The data parallel operations observation and sweeping propagation are built from.
///
/// Each call is a barrier, it only returns once every cell has been processed
pub trait Executor: Debug + Send + Sync {
  fn map_reduce<T, M, R>(&self, len: usize, neutral: T, map: M, reduce: R) -> T
  where
    T: Clone + Send + Sync,
    M: Fn(usize) -> T + Send + Sync,
    R: Fn(T, T) -> T + Send + Sync;

  /// Writes `update(i)` into every `next[i]` and counts how many differ from `prev[i]`
  fn sweep<F>(&self, prev: &[Mask], next: &mut [Mask], update: F) -> usize
  where
    F: Fn(usize) -> Mask + Send + Sync;
}

#[cfg(test)]
mod tests {
  use crate::{Mask, prelude::*};
  use prebuilt::{
    Dim2d,
    executors::{Parallel, Sequential},
    observers::EntropyObserver,
    propagators::{SweepPropagator, WorklistPropagator},
  };

  const SEED: u64 = 123;

  /// Two-sided pipes, a side is either open (1) or closed (0)
  fn pipes() -> Model<u8, 2> {
    let mut builder = ModelBuilder::new([6_usize, 6]);
    for sides in 0_u8..16 {
      if sides.count_ones() % 2 == 1 {
        continue;
      }
      let tile = Tile::from_fn(|dir: Dim2d| (sides >> *dir.id()) & 1);
      builder.register(tile).unwrap();
    }
    builder.build().unwrap()
  }

  fn record<O: Observer, P: Propagator>(
    runner: &mut Runner<u8, O, P, 2>,
  ) -> (Vec<Status>, Vec<Mask>) {
    let statuses = runner.run().collect::<Result<Vec<_>, _>>().unwrap();
    (statuses, runner.grid().to_vec())
  }

  #[test]
  fn same_seed_produces_same_solve() {
    let build = || {
      RunnerBuilder::new(
        pipes(),
        EntropyObserver::new(Some(SEED), Sequential),
        WorklistPropagator::default(),
      )
      .build()
      .unwrap()
    };

    let mut a = build();
    let mut b = build();

    assert_eq!(a.candidate(), b.candidate());
    assert_eq!(record(&mut a), record(&mut b));
    assert_ne!(a.state(), RunState::Running);
    assert_eq!(a.state(), b.state());
  }

  #[test]
  fn strategies_agree_on_a_whole_solve() {
    let mut reference = RunnerBuilder::new(
      pipes(),
      EntropyObserver::new(Some(SEED), Sequential),
      WorklistPropagator::default(),
    )
    .build()
    .unwrap();

    let mut parallel = RunnerBuilder::new(
      pipes(),
      EntropyObserver::new(Some(SEED), Parallel::default()),
      SweepPropagator::new(Parallel::default()),
    )
    .build()
    .unwrap();

    assert_eq!(record(&mut reference), record(&mut parallel));
  }
}
