use crate::{Direction, DirectionId, Mask, Socket, SocketId, TileId};
use bimap::BiHashMap;
use itertools::Itertools;

/// One tile variant: a label per direction and a sampling weight.
///
/// The index, and with it the tile's bit, is assigned when the tile is registered
/// with a `ModelBuilder`, a tile that was never registered reports index 0
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tile<S: Socket> {
  signature: Vec<S>,
  weight: f64,
  index: TileId,
}

impl<S: Socket> Tile<S> {
  pub fn new(signature: impl Into<Vec<S>>) -> Self {
    Self {
      signature: signature.into(),
      weight: 1.0,
      index: 0,
    }
  }

  pub fn with_weight(mut self, weight: f64) -> Self {
    self.weight = weight;
    self
  }

  /// Builds the signature by asking for the label of every direction
  pub fn from_fn<D, IntoS>(mut f: impl FnMut(D) -> IntoS) -> Self
  where
    D: Direction,
    IntoS: Into<S>,
  {
    let signature = D::VARIANTS
      .iter()
      .sorted_by_key(|dir| dir.id())
      .map(|dir| f(*dir).into())
      .collect::<Vec<S>>();
    Self::new(signature)
  }

  /// Same label on every side
  pub fn splat<D: Direction>(label: impl Into<S> + Clone) -> Self {
    Self::from_fn(|_: D| label.clone())
  }

  /// Rotates the signature right by `rotation` places, in 2d each place is a quarter turn
  pub fn rotated(&self, rotation: usize) -> Self {
    let mut signature = self.signature.clone();
    if !signature.is_empty() {
      let len = signature.len();
      signature.rotate_right(rotation % len);
    }
    Self {
      signature,
      weight: self.weight,
      index: self.index,
    }
  }

  pub(crate) fn registered(mut self, index: TileId) -> Self {
    self.index = index;
    self
  }

  pub fn signature(&self) -> &[S] {
    &self.signature
  }

  pub fn label(&self, dir: DirectionId) -> Option<&S> {
    self.signature.get(*dir)
  }

  pub fn weight(&self) -> f64 {
    self.weight
  }

  pub fn index(&self) -> TileId {
    self.index
  }

  pub fn flag(&self) -> Mask {
    1 << self.index
  }
}

/// Whether `other` may sit next to `tile` in direction `dir`.
///
/// The label `tile` shows towards `dir` has to equal the label `other` shows back
pub fn compatible<S: Socket>(tile: &Tile<S>, other: &Tile<S>, dir: DirectionId) -> bool {
  let directions = tile.signature.len();
  if directions == 0 || directions != other.signature.len() {
    return false;
  }
  let back = (*dir + directions / 2) % directions;
  match (tile.signature.get(*dir), other.signature.get(back)) {
    (Some(mine), Some(theirs)) => mine == theirs,
    _ => false,
  }
}

/// Interns the labels used by a tile set so the model can compare them as integers
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Legend<S: Socket> {
  sockets: BiHashMap<SocketId, S>,
}

impl<S: Socket> Clone for Legend<S> {
  fn clone(&self) -> Self {
    Self {
      sockets: self.sockets.clone(),
    }
  }
}

impl<S: Socket> Legend<S> {
  pub fn socket_id(&self, socket: &S) -> Option<SocketId> {
    self.sockets.get_by_right(socket).cloned()
  }

  pub fn socket(&self, socket_id: SocketId) -> Option<&S> {
    self.sockets.get_by_left(&socket_id)
  }

  pub fn len(&self) -> usize {
    self.sockets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sockets.is_empty()
  }

  /// The tile's signature as interned ids, in direction order
  pub fn abstract_signature(&self, tile: &Tile<S>) -> Vec<Option<SocketId>> {
    tile
      .signature
      .iter()
      .map(|socket| self.socket_id(socket))
      .collect()
  }
}

impl<S: Socket> From<&[Tile<S>]> for Legend<S> {
  fn from(tiles: &[Tile<S>]) -> Self {
    let sockets = tiles
      .iter()
      .flat_map(|tile| tile.signature.iter())
      .unique()
      .sorted()
      .cloned()
      .enumerate()
      .collect();

    Self { sockets }
  }
}
