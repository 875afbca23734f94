use crate::{
  Candidate, Observer, Propagator, Socket, Status, TileId,
  err::Error,
  grid::Grid,
  model::Model,
  util::IPos,
};
use tracing::{debug, info, warn};

/// Successful steps between two snapshots unless configured otherwise
pub const DEFAULT_SNAPSHOT_EVERY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
  Running,
  Solved,
  Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
  Running(Candidate),
  Solved,
  Failed,
}

impl From<Status> for Phase {
  fn from(status: Status) -> Self {
    match status {
      Status::Done => Self::Solved,
      Status::Contradiction => Self::Failed,
      Status::Continue(candidate) => Self::Running(candidate),
    }
  }
}

pub struct RunnerBuilder<S: Socket, O: Observer, P: Propagator, const DIM: usize> {
  model: Model<S, DIM>,
  observer: O,
  propagator: P,
  snapshot_every: Option<usize>,
  initial_snapshot: bool,
  presets: Vec<(IPos<DIM>, TileId)>,
}

impl<S, O, P, const DIM: usize> RunnerBuilder<S, O, P, DIM>
where
  S: Socket,
  O: Observer,
  P: Propagator,
{
  pub fn new(model: Model<S, DIM>, observer: O, propagator: P) -> Self {
    Self {
      model,
      observer,
      propagator,
      snapshot_every: Some(DEFAULT_SNAPSHOT_EVERY),
      initial_snapshot: false,
      presets: Vec::new(),
    }
  }

  pub fn with_snapshot_every(&mut self, every: usize) -> &mut Self {
    self.snapshot_every = Some(every);
    self
  }

  /// Snapshots the settled starting grid, so a contradiction before the first periodic
  /// snapshot restarts from there once. Ignored without backtracking
  pub fn with_initial_snapshot(&mut self) -> &mut Self {
    self.initial_snapshot = true;
    self
  }

  /// Never snapshots, the first contradiction fails the solve
  pub fn without_backtracking(&mut self) -> &mut Self {
    self.snapshot_every = None;
    self
  }

  /// Fixes the cell at `pos` to `tile` before solving starts
  pub fn insert(&mut self, pos: impl Into<IPos<DIM>>, tile: TileId) -> &mut Self {
    self.presets.push((pos.into(), tile));
    self
  }

  pub fn model(&self) -> &Model<S, DIM> {
    &self.model
  }

  /// Applies the presets, closes the grid and makes the first observation
  #[profiling::function]
  pub fn build(self) -> Result<Runner<S, O, P, DIM>, Error<DIM>> {
    let Self {
      model,
      mut observer,
      mut propagator,
      snapshot_every,
      initial_snapshot,
      presets,
    } = self;

    let mut grid = model.build_grid();
    for (pos, tile) in presets {
      let flag = model.tile(tile)?.flag();
      grid[model.index(pos)] &= flag;
    }

    let reductions = propagator.settle(&model, &mut grid);
    debug!("initial closure applied {reductions} reductions");

    let status = observer.observe(&model, &grid)?;
    let phase = Phase::from(status);
    match phase {
      Phase::Solved => info!("solved without a single step"),
      Phase::Failed => warn!("tile set admits no solution for this world"),
      Phase::Running(_) => {}
    }

    let snapshot = (initial_snapshot && snapshot_every.is_some()).then(|| grid.clone());

    Ok(Runner {
      model,
      observer,
      propagator,
      grid,
      snapshot,
      snapshot_every,
      snapshot_age: 0,
      backtracks: 0,
      phase,
    })
  }
}

/// Drives observation and propagation over a single grid, with single level snapshot backtracking
#[derive(Debug)]
pub struct Runner<S: Socket, O: Observer, P: Propagator, const DIM: usize> {
  model: Model<S, DIM>,
  observer: O,
  propagator: P,
  grid: Grid<DIM>,
  snapshot: Option<Grid<DIM>>,
  snapshot_every: Option<usize>,
  snapshot_age: usize,
  backtracks: usize,
  phase: Phase,
}

impl<S, O, P, const DIM: usize> Runner<S, O, P, DIM>
where
  S: Socket,
  O: Observer,
  P: Propagator,
{
  /// Applies the pending candidate and observes the result.
  ///
  /// A contradiction with a snapshot available restores it and retries with a fresh
  /// candidate, so a single call may propagate more than once
  #[profiling::function]
  pub fn step(&mut self) -> Result<Status, Error<DIM>> {
    let mut candidate = match self.phase {
      Phase::Running(candidate) => candidate,
      Phase::Solved => return Ok(Status::Done),
      Phase::Failed => return Ok(Status::Contradiction),
    };

    loop {
      self
        .propagator
        .propagate(&self.model, &mut self.grid, candidate.index, candidate.mask);

      match self.observer.observe(&self.model, &self.grid)? {
        Status::Continue(next) => {
          self.phase = Phase::Running(next);
          self.age_snapshot();
          return Ok(Status::Continue(next));
        }
        Status::Done => {
          info!("solved after {} backtracks", self.backtracks);
          self.phase = Phase::Solved;
          return Ok(Status::Done);
        }
        Status::Contradiction => {
          let Some(snapshot) = self.snapshot.take() else {
            warn!("contradiction with no snapshot to return to");
            self.phase = Phase::Failed;
            return Ok(Status::Contradiction);
          };

          self.grid = snapshot;
          self.backtracks += 1;
          self.snapshot_age = self.snapshot_every.unwrap_or_default();
          debug!("contradiction, restored snapshot ({} so far)", self.backtracks);

          match self.observer.observe(&self.model, &self.grid)? {
            Status::Continue(next) => candidate = next,
            status => {
              self.phase = Phase::from(status);
              return Ok(status);
            }
          }
        }
      }
    }
  }

  fn age_snapshot(&mut self) {
    let Some(every) = self.snapshot_every else {
      return;
    };

    self.snapshot_age += 1;
    if self.snapshot_age >= every {
      match &mut self.snapshot {
        Some(snapshot) => snapshot.clone_from(&self.grid),
        None => self.snapshot = Some(self.grid.clone()),
      }
      self.snapshot_age = 0;
    }
  }

  /// Steps until the runner is solved or failed, yielding every status on the way
  pub fn run(&mut self) -> Steps<'_, S, O, P, DIM> {
    Steps {
      runner: self,
      errored: false,
    }
  }

  /// Runs to completion and reports how the solve ended
  pub fn finish(&mut self) -> Result<Status, Error<DIM>> {
    for status in self.run() {
      status?;
    }
    Ok(self.status())
  }

  pub fn state(&self) -> RunState {
    match self.phase {
      Phase::Running(_) => RunState::Running,
      Phase::Solved => RunState::Solved,
      Phase::Failed => RunState::Failed,
    }
  }

  /// The last status observed, terminal once the runner stops
  pub fn status(&self) -> Status {
    match self.phase {
      Phase::Running(candidate) => Status::Continue(candidate),
      Phase::Solved => Status::Done,
      Phase::Failed => Status::Contradiction,
    }
  }

  /// The candidate the next step will apply
  pub fn candidate(&self) -> Option<Candidate> {
    match self.phase {
      Phase::Running(candidate) => Some(candidate),
      _ => None,
    }
  }

  pub fn grid(&self) -> &Grid<DIM> {
    &self.grid
  }

  pub fn model(&self) -> &Model<S, DIM> {
    &self.model
  }

  pub fn observer(&self) -> &O {
    &self.observer
  }

  pub fn propagator(&self) -> &P {
    &self.propagator
  }

  pub fn snapshot_every(&self) -> Option<usize> {
    self.snapshot_every
  }

  pub fn snapshot_age(&self) -> usize {
    self.snapshot_age
  }

  pub fn has_snapshot(&self) -> bool {
    self.snapshot.is_some()
  }

  /// Number of snapshot restores so far
  pub fn backtracks(&self) -> usize {
    self.backtracks
  }
}

/// Iterator over the statuses of a run, ends after the terminal one or the first error
pub struct Steps<'r, S: Socket, O: Observer, P: Propagator, const DIM: usize> {
  runner: &'r mut Runner<S, O, P, DIM>,
  errored: bool,
}

impl<S, O, P, const DIM: usize> Iterator for Steps<'_, S, O, P, DIM>
where
  S: Socket,
  O: Observer,
  P: Propagator,
{
  type Item = Result<Status, Error<DIM>>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.errored || self.runner.state() != RunState::Running {
      return None;
    }

    let result = self.runner.step();
    self.errored = result.is_err();
    Some(result)
  }
}
