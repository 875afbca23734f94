use crate::{
  CellIndex, DirectionId, Executor, Mask, Propagator, Socket, grid::Grid, model::Model,
};
use ordermap::OrderSet;
use tracing::trace;

/// Depth first propagation over an explicit stack of changed cells.
///
/// The stack is an ordered set so a cell waiting to be processed is never queued twice
#[derive(Default, Debug, Clone)]
pub struct WorklistPropagator {
  worklist: OrderSet<CellIndex>,
}

impl WorklistPropagator {
  fn drain<S: Socket, const DIM: usize>(
    &mut self,
    model: &Model<S, DIM>,
    grid: &mut Grid<DIM>,
  ) -> usize {
    let adjacency = model.adjacency();
    let mut reductions = 0;

    while let Some(index) = self.worklist.pop() {
      let mask = grid[index];

      for dir in DirectionId::all::<DIM>() {
        let neighbor = adjacency.neighbor(index, dir);
        let before = grid[neighbor];
        let after = before & adjacency.support(mask, dir);

        if after != before {
          grid[neighbor] = after;
          reductions += 1;
          self.worklist.insert(neighbor);
        }
      }
    }

    reductions
  }
}

impl Propagator for WorklistPropagator {
  #[profiling::function]
  fn propagate<S: Socket, const DIM: usize>(
    &mut self,
    model: &Model<S, DIM>,
    grid: &mut Grid<DIM>,
    index: CellIndex,
    collapsed: Mask,
  ) -> usize {
    let before = grid[index];
    grid[index] &= collapsed;
    let seeded = usize::from(grid[index] != before);

    // the seed is processed even when unchanged, its neighbors may not be closed yet
    self.worklist.clear();
    self.worklist.insert(index);

    let reductions = seeded + self.drain(model, grid);
    trace!("propagated cell {index} with {reductions} reductions");
    reductions
  }

  #[profiling::function]
  fn settle<S: Socket, const DIM: usize>(
    &mut self,
    model: &Model<S, DIM>,
    grid: &mut Grid<DIM>,
  ) -> usize {
    self.worklist.clear();
    self.worklist.extend((0..grid.len()).rev());
    self.drain(model, grid)
  }
}

/// Synchronous whole grid sweeps, every cell is recomputed from the previous sweep only
#[derive(Debug, Clone, Default)]
pub struct SweepPropagator<E: Executor> {
  executor: E,
  scratch: Vec<Mask>,
}

impl<E: Executor> SweepPropagator<E> {
  pub fn new(executor: E) -> Self {
    Self {
      executor,
      scratch: Vec::new(),
    }
  }

  pub fn executor(&self) -> &E {
    &self.executor
  }

  /// Sweeps until a sweep leaves every cell as it was, returns the summed change counts
  fn close<S: Socket, const DIM: usize>(
    &mut self,
    model: &Model<S, DIM>,
    grid: &mut Grid<DIM>,
  ) -> usize {
    let mut reductions = 0;
    let mut sweeps = 0;

    loop {
      self.scratch.resize(grid.len(), 0);

      let adjacency = model.adjacency();
      let prev = grid.cells();
      let changed = self.executor.sweep(prev, &mut self.scratch, |index| {
        DirectionId::all::<DIM>().fold(prev[index], |acc, dir| {
          let neighbor = prev[adjacency.neighbor(index, dir)];
          acc & adjacency.support(neighbor, dir.opposite::<DIM>())
        })
      });

      sweeps += 1;
      if changed == 0 {
        break;
      }

      std::mem::swap(grid.cells_mut(), &mut self.scratch);
      reductions += changed;
    }

    trace!("closed grid after {sweeps} sweeps with {reductions} reductions");
    reductions
  }
}

impl<E: Executor> Propagator for SweepPropagator<E> {
  #[profiling::function]
  fn propagate<S: Socket, const DIM: usize>(
    &mut self,
    model: &Model<S, DIM>,
    grid: &mut Grid<DIM>,
    index: CellIndex,
    collapsed: Mask,
  ) -> usize {
    let before = grid[index];
    grid[index] &= collapsed;
    let seeded = usize::from(grid[index] != before);

    seeded + self.close(model, grid)
  }

  #[profiling::function]
  fn settle<S: Socket, const DIM: usize>(
    &mut self,
    model: &Model<S, DIM>,
    grid: &mut Grid<DIM>,
  ) -> usize {
    self.close(model, grid)
  }
}
