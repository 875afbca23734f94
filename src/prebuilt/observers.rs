use crate::{
  Candidate, CellIndex, Executor, Mask, Observer, Socket, Status, err::Error, grid::Grid,
  model::Model,
};
use rand::{Rng, RngCore, SeedableRng, seq::IndexedRandom};
use rand_chacha::ChaCha20Rng;
use tracing::{debug, trace};

/// Entropy of a solved cell, also the neutral element of the reduction
pub const SOLVED: f64 = -1.0;

/// Entropy of a cell without any possibility left
pub const CONTRADICTED: f64 = 0.0;

/// The running minimum of the entropy reduction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lowest {
  pub entropy: f64,
  pub index: CellIndex,
}

impl Lowest {
  pub const NEUTRAL: Self = Self {
    entropy: SOLVED,
    index: 0,
  };

  /// Scores one cell: -1 when solved, 0 when contradicted, otherwise the
  /// summed weights of its tiles plus half of the tie breaking bias
  pub fn of(index: CellIndex, mask: Mask, weights: &[f64], bias: f64) -> Self {
    let entropy = match mask.count_ones() {
      0 => CONTRADICTED,
      1 => SOLVED,
      _ => {
        crate::util::bits(mask)
          .filter_map(|tile| weights.get(tile))
          .sum::<f64>()
          + bias * 0.5
      }
    };

    Self { entropy, index }
  }

  /// Solved cells give way to anything, otherwise the lower entropy wins and
  /// the lower index settles exact ties so every reduction order agrees
  pub fn merge(a: Self, b: Self) -> Self {
    if a.entropy < 0.0 {
      return b;
    }
    if b.entropy < 0.0 {
      return a;
    }
    if b.entropy < a.entropy || (b.entropy == a.entropy && b.index < a.index) {
      b
    } else {
      a
    }
  }
}

/// Collapses the cell of lowest entropy, sampling its tile by weight
#[derive(Debug, Clone)]
pub struct EntropyObserver<E: Executor> {
  seed: u64,
  rng: ChaCha20Rng,
  executor: E,
  bias: Vec<f64>,
}

impl<E: Executor + Default> Default for EntropyObserver<E> {
  fn default() -> Self {
    Self::new(None, E::default())
  }
}

impl<E: Executor> EntropyObserver<E> {
  pub fn new(seed: Option<u64>, executor: E) -> Self {
    let (rng, seed) = seed
      .map(|seed| (ChaCha20Rng::seed_from_u64(seed), seed))
      .unwrap_or_else(|| {
        let seed = rand::rng().next_u64();
        (ChaCha20Rng::seed_from_u64(seed), seed)
      });

    Self {
      seed,
      rng,
      executor,
      bias: Vec::new(),
    }
  }

  pub fn seed(&self) -> u64 {
    self.seed
  }

  pub fn executor(&self) -> &E {
    &self.executor
  }

  /// Finds the cell of lowest entropy, drawing a fresh bias for every cell
  #[profiling::function]
  pub fn lowest<S: Socket, const DIM: usize>(
    &mut self,
    model: &Model<S, DIM>,
    grid: &Grid<DIM>,
  ) -> Lowest {
    // drawn in cell order so the result does not depend on the executor
    self.bias.clear();
    self
      .bias
      .extend((0..grid.len()).map(|_| self.rng.random::<f64>()));

    let weights = model.weights();
    let bias = &self.bias;

    self.executor.map_reduce(
      grid.len(),
      Lowest::NEUTRAL,
      |i| Lowest::of(i, grid[i], weights, bias[i]),
      Lowest::merge,
    )
  }

  /// Samples one of the tiles still possible at `index`, proportionally to their weights
  #[profiling::function]
  pub fn collapse<S: Socket, const DIM: usize>(
    &mut self,
    model: &Model<S, DIM>,
    grid: &Grid<DIM>,
    index: CellIndex,
  ) -> Result<Mask, Error<DIM>> {
    let mask = grid[index];
    let tile = model
      .allowed_tiles(mask)
      .collect::<Vec<_>>()
      .choose_weighted(&mut self.rng, |tile| tile.weight())
      .map(|tile| tile.flag())
      .map_err(|_| Error::NoPossibilities {
        position: model.position(index),
      })?;

    trace!("collapsing cell {index} from {mask:#b} to {tile:#b}");

    Ok(tile)
  }
}

impl<E: Executor> Observer for EntropyObserver<E> {
  #[profiling::function]
  fn observe<S: Socket, const DIM: usize>(
    &mut self,
    model: &Model<S, DIM>,
    grid: &Grid<DIM>,
  ) -> Result<Status, Error<DIM>> {
    let lowest = self.lowest(model, grid);

    if lowest.entropy < 0.0 {
      debug!("grid solved");
      return Ok(Status::Done);
    }

    if lowest.entropy == CONTRADICTED {
      debug!(
        "cell {:?} overconstrained",
        model.position(lowest.index)
      );
      return Ok(Status::Contradiction);
    }

    debug!(
      "selected cell {:?} with entropy {}",
      model.position(lowest.index),
      lowest.entropy
    );

    let collapsed = self.collapse(model, grid, lowest.index)?;

    Ok(Status::Continue(Candidate::new(lowest.index, collapsed)))
  }
}

#[cfg(test)]
mod tests {
  use super::{EntropyObserver, Lowest, SOLVED};
  use crate::{
    Observer, Status,
    err::Error,
    model::{Model, ModelBuilder},
    prebuilt::executors::{Parallel, Sequential},
    tiles::Tile,
  };
  use rand::{Rng, SeedableRng};
  use rand_chacha::ChaCha20Rng;

  const SEED: u64 = 7;

  fn model() -> Model<char, 1> {
    let mut builder = ModelBuilder::new([8_usize]);
    builder.register(Tile::new(['a', 'a']).with_weight(1.0)).unwrap();
    builder.register(Tile::new(['a', 'a']).with_weight(3.0)).unwrap();
    builder.register(Tile::new(['a', 'a']).with_weight(0.5)).unwrap();
    builder.build().unwrap()
  }

  #[test]
  fn entropy_classes() {
    let weights = [1.0, 2.0, 4.0];
    assert_eq!(Lowest::of(3, 0b010, &weights, 0.9).entropy, SOLVED);
    assert_eq!(Lowest::of(3, 0, &weights, 0.9).entropy, 0.0);
    assert_eq!(Lowest::of(3, 0b101, &weights, 0.5).entropy, 5.25);
  }

  #[test]
  fn merge_is_associative_and_ignores_solved_cells() {
    let mut rng = ChaCha20Rng::seed_from_u64(SEED);
    let sample = |rng: &mut ChaCha20Rng, index| Lowest {
      entropy: match rng.random_range(0..4) {
        0 => SOLVED,
        1 => 0.0,
        _ => rng.random_range(1..4) as f64,
      },
      index,
    };

    for _ in 0..500 {
      let a = sample(&mut rng, 0);
      let b = sample(&mut rng, 1);
      let c = sample(&mut rng, 2);

      assert_eq!(
        Lowest::merge(Lowest::merge(a, b), c),
        Lowest::merge(a, Lowest::merge(b, c))
      );
      if a.entropy >= 0.0 || b.entropy >= 0.0 {
        assert_eq!(Lowest::merge(a, b), Lowest::merge(b, a));
      }
      assert_eq!(Lowest::merge(Lowest::NEUTRAL, a), a);
    }
  }

  #[test]
  fn solved_grid_is_done() {
    let model = model();
    let mut grid = model.build_grid();
    grid.iter_mut().for_each(|cell| *cell = 0b100);

    let mut observer = EntropyObserver::new(Some(SEED), Sequential);
    assert_eq!(observer.observe(&model, &grid).unwrap(), Status::Done);
  }

  #[test]
  fn contradiction_wins_over_undetermined_cells() {
    let model = model();
    let mut grid = model.build_grid();
    grid[5] = 0;
    grid[2] = 0b001;

    let mut observer = EntropyObserver::new(Some(SEED), Sequential);
    assert_eq!(
      observer.observe(&model, &grid).unwrap(),
      Status::Contradiction
    );
  }

  #[test]
  fn picks_the_lightest_cell_and_one_of_its_tiles() {
    let model = model();
    let mut grid = model.build_grid();
    grid[6] = 0b101;

    let mut observer = EntropyObserver::new(Some(SEED), Sequential);
    for _ in 0..20 {
      let Status::Continue(candidate) = observer.observe(&model, &grid).unwrap() else {
        panic!("expected a candidate");
      };
      assert_eq!(candidate.index, 6);
      assert!(candidate.mask == 0b001 || candidate.mask == 0b100);
    }
  }

  #[test]
  fn collapse_follows_weights() {
    let model = model();
    let grid = model.build_grid();
    let mut observer = EntropyObserver::new(Some(SEED), Sequential);

    let draws = 4500;
    let mut counts = [0_usize; 3];
    for _ in 0..draws {
      let mask = observer.collapse(&model, &grid, 0).unwrap();
      assert_eq!(mask.count_ones(), 1);
      counts[mask.trailing_zeros() as usize] += 1;
    }

    // expected shares are 2/9, 6/9 and 1/9
    assert!((800..1200).contains(&counts[0]), "{counts:?}");
    assert!((2700..3300).contains(&counts[1]), "{counts:?}");
    assert!((300..700).contains(&counts[2]), "{counts:?}");
  }

  #[test]
  fn collapsing_nothing_is_an_error() {
    let model = model();
    let mut grid = model.build_grid();
    grid[1] = 0;

    let mut observer = EntropyObserver::new(Some(SEED), Sequential);
    assert!(matches!(
      observer.collapse(&model, &grid, 1),
      Err(Error::NoPossibilities { .. })
    ));
  }

  #[test]
  fn executors_observe_alike() {
    let model = model();
    let mut grid = model.build_grid();
    for i in (0..grid.len()).step_by(3) {
      grid[i] = 0b011;
    }

    let mut sequential = EntropyObserver::new(Some(SEED), Sequential);
    let mut parallel = EntropyObserver::new(Some(SEED), Parallel::default());

    for _ in 0..10 {
      assert_eq!(
        sequential.observe(&model, &grid).unwrap(),
        parallel.observe(&model, &grid).unwrap()
      );
    }
  }

  #[test]
  fn unseeded_observers_report_their_seed() {
    let a = EntropyObserver::new(None, Sequential);
    let b = EntropyObserver::new(Some(a.seed()), Sequential);
    assert_eq!(a.seed(), b.seed());
  }
}
