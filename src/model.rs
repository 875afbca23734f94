use crate::{
  CellIndex, DirectionId, MAX_TILES, Mask, Socket, TileId,
  err::Error,
  grid::Grid,
  tiles::{Legend, Tile},
  util::{self, IPos, Size, UPos},
};
use tracing::debug;

/// Collects the tile set of a model, tiles receive their bit in registration order
#[derive(Debug, Clone)]
pub struct ModelBuilder<S: Socket, const DIM: usize> {
  size: Size<DIM>,
  tiles: Vec<Tile<S>>,
}

impl<S: Socket, const DIM: usize> ModelBuilder<S, DIM> {
  pub fn new(size: impl Into<Size<DIM>>) -> Self {
    Self {
      size: size.into(),
      tiles: Vec::new(),
    }
  }

  pub fn size(&self) -> Size<DIM> {
    self.size
  }

  pub fn tiles(&self) -> &[Tile<S>] {
    &self.tiles
  }

  pub fn register(&mut self, tile: Tile<S>) -> Result<TileId, Error<DIM>> {
    if self.tiles.len() >= MAX_TILES {
      return Err(Error::CapacityExceeded {
        capacity: MAX_TILES,
      });
    }

    if tile.signature().len() != 2 * DIM {
      return Err(Error::DimensionMismatch {
        expected: 2 * DIM,
        found: tile.signature().len(),
      });
    }

    let weight = tile.weight();
    if !(weight > 0.0 && weight.is_finite()) {
      return Err(Error::InvalidWeight { weight });
    }

    let index = self.tiles.len();
    self.tiles.push(tile.registered(index));
    Ok(index)
  }

  /// Registers one rotated copy of `tile` per entry of `rotations`
  pub fn register_rotations(
    &mut self,
    tile: &Tile<S>,
    rotations: impl IntoIterator<Item = usize>,
  ) -> Result<Vec<TileId>, Error<DIM>> {
    rotations
      .into_iter()
      .map(|rotation| self.register(tile.rotated(rotation)))
      .collect()
  }

  #[profiling::function]
  pub fn build(self) -> Result<Model<S, DIM>, Error<DIM>> {
    if self.tiles.is_empty() {
      return Err(Error::NoTiles);
    }

    if self.size.is_empty() {
      return Err(Error::EmptyWorld);
    }

    // entropies and weighted draws sum weights, that sum has to stay finite
    let total = self.tiles.iter().map(Tile::weight).sum::<f64>();
    if !total.is_finite() {
      return Err(Error::InvalidWeight { weight: total });
    }

    let Self { size, tiles } = self;
    let directions = 2 * DIM;

    let legend = Legend::from(tiles.as_slice());
    let signatures = tiles
      .iter()
      .map(|tile| legend.abstract_signature(tile))
      .collect::<Vec<_>>();

    let mut allows = vec![0; tiles.len() * directions];
    for (t, mine) in signatures.iter().enumerate() {
      for dir in DirectionId::all::<DIM>() {
        let back = *dir.opposite::<DIM>();
        allows[t * directions + *dir] = signatures
          .iter()
          .enumerate()
          .filter(|(_, theirs)| mine[*dir] == theirs[back])
          .fold(0, |acc, (u, _)| acc | 1 << u);
      }
    }

    let neighbors = (0..size.len())
      .flat_map(|index| {
        let pos = IPos(UPos::from_index(index, size).map(|p| p as isize));
        DirectionId::all::<DIM>().map(move |dir| (pos + dir).index_in(size))
      })
      .collect::<Vec<_>>();

    let full = Mask::MAX >> (MAX_TILES - tiles.len());
    let full_support = DirectionId::all::<DIM>()
      .map(|dir| fold_support(&allows, directions, full, dir))
      .collect();
    let weights = tiles.iter().map(Tile::weight).collect::<Vec<_>>();

    let model = Model {
      size,
      tiles,
      legend,
      weights,
      allows,
      neighbors,
      full,
      full_support,
    };

    debug!(
      "built model with {} tiles over {} cells",
      model.tiles.len(),
      model.cell_count()
    );

    Ok(model)
  }
}

/// The immutable description of a solve: world shape, tile set and the tables derived from them
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Model<S: Socket, const DIM: usize> {
  size: Size<DIM>,
  tiles: Vec<Tile<S>>,
  legend: Legend<S>,
  weights: Vec<f64>,
  allows: Vec<Mask>,
  neighbors: Vec<CellIndex>,
  full: Mask,
  full_support: Vec<Mask>,
}

impl<S: Socket, const DIM: usize> Model<S, DIM> {
  pub fn build(
    size: impl Into<Size<DIM>>,
    tiles: impl IntoIterator<Item = Tile<S>>,
  ) -> Result<Self, Error<DIM>> {
    let mut builder = ModelBuilder::new(size);
    for tile in tiles {
      builder.register(tile)?;
    }
    builder.build()
  }

  pub fn size(&self) -> Size<DIM> {
    self.size
  }

  pub fn cell_count(&self) -> usize {
    self.size.len()
  }

  pub fn directions(&self) -> usize {
    2 * DIM
  }

  pub fn tiles(&self) -> &[Tile<S>] {
    &self.tiles
  }

  pub fn tile(&self, tile: TileId) -> Result<&Tile<S>, Error<DIM>> {
    self.tiles.get(tile).ok_or(Error::UnknownTile { tile })
  }

  pub fn weights(&self) -> &[f64] {
    &self.weights
  }

  pub fn legend(&self) -> &Legend<S> {
    &self.legend
  }

  /// Every registered tile
  pub fn full_mask(&self) -> Mask {
    self.full
  }

  /// The derived tables on their own, all that propagation reads
  pub fn adjacency(&self) -> Adjacency<'_> {
    Adjacency {
      directions: self.directions(),
      allows: &self.allows,
      neighbors: &self.neighbors,
      full: self.full,
      full_support: &self.full_support,
    }
  }

  /// Tiles that may sit next to `tile` in direction `dir`
  pub fn allows(&self, tile: TileId, dir: DirectionId) -> Mask {
    self.adjacency().allows(tile, dir)
  }

  pub fn neighbor(&self, index: CellIndex, dir: DirectionId) -> CellIndex {
    self.adjacency().neighbor(index, dir)
  }

  /// The neighbors of a cell in direction order
  pub fn neighbors(&self, index: CellIndex) -> &[CellIndex] {
    let directions = self.directions();
    &self.neighbors[index * directions..(index + 1) * directions]
  }

  /// Union of the tiles allowed in direction `dir` by any tile of `mask`
  pub fn support(&self, mask: Mask, dir: DirectionId) -> Mask {
    self.adjacency().support(mask, dir)
  }

  /// The tiles whose flags are set in `mask`
  pub fn allowed_tiles(&self, mask: Mask) -> impl Iterator<Item = &Tile<S>> {
    util::bits(mask).filter_map(|tile| self.tiles.get(tile))
  }

  /// A grid where every cell still admits every tile
  pub fn build_grid(&self) -> Grid<DIM> {
    Grid::filled(self.size, self.full)
  }

  pub fn position(&self, index: CellIndex) -> UPos<DIM> {
    UPos::from_index(index, self.size)
  }

  /// Flattened index of a position, wrapped onto the world
  pub fn index(&self, pos: impl Into<IPos<DIM>>) -> CellIndex {
    pos.into().index_in(self.size)
  }
}

/// Compatibility and neighbor tables borrowed from a `Model`
#[derive(Debug, Clone, Copy)]
pub struct Adjacency<'m> {
  directions: usize,
  allows: &'m [Mask],
  neighbors: &'m [CellIndex],
  full: Mask,
  full_support: &'m [Mask],
}

impl Adjacency<'_> {
  pub fn allows(&self, tile: TileId, dir: DirectionId) -> Mask {
    self.allows[tile * self.directions + *dir]
  }

  pub fn neighbor(&self, index: CellIndex, dir: DirectionId) -> CellIndex {
    self.neighbors[index * self.directions + *dir]
  }

  pub fn support(&self, mask: Mask, dir: DirectionId) -> Mask {
    if mask == self.full {
      self.full_support[*dir]
    } else {
      fold_support(self.allows, self.directions, mask, dir)
    }
  }
}

fn fold_support(allows: &[Mask], directions: usize, mask: Mask, dir: DirectionId) -> Mask {
  util::bits(mask).fold(0, |acc, tile| acc | allows[tile * directions + *dir])
}
