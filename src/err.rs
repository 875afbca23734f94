use crate::{TileId, util::UPos};

#[derive(Debug, thiserror::Error)]
pub enum Error<const DIM: usize> {
  #[error("Cannot register more than {capacity} tiles, the cell state must fit in a single word")]
  CapacityExceeded { capacity: usize },
  #[error("Mismatch in dimensions, expected {expected} directions and {found} were given")]
  DimensionMismatch { expected: usize, found: usize },
  #[error("Tile weights must be positive and finite and so must their total, got {weight}")]
  InvalidWeight { weight: f64 },
  #[error("A model needs at least one tile")]
  NoTiles,
  #[error("The world shape has no cells")]
  EmptyWorld,
  #[error("No tile with id {tile} is registered")]
  UnknownTile { tile: TileId },
  #[error("No possibilities available at {position:?}")]
  NoPossibilities { position: UPos<DIM> },
}
