use prebuilt::{
  Dim2d,
  executors::{Parallel, Sequential},
  observers::EntropyObserver,
  propagators::{SweepPropagator, WorklistPropagator},
};
use std::error::Error;
use tilewave::prelude::*;

const STEP_BY_STEP: bool = false;
const PARALLEL: bool = false;

const ROWS: usize = 16;
const COLS: usize = 32;

/// Pipe pieces by their open sides, one bit per direction in `Dim2d` order
const PIECES: [(u8, char, f64); 8] = [
  (0b0000, ' ', 4.0),
  (0b0101, '─', 2.0),
  (0b1010, '│', 2.0),
  (0b0011, '┘', 1.0),
  (0b0110, '└', 1.0),
  (0b1100, '┌', 1.0),
  (0b1001, '┐', 1.0),
  (0b1111, '┼', 0.5),
];

fn main() -> Result<(), Box<dyn Error>> {
  #[cfg(feature = "profiling")]
  let _guards = tilewave::perf::enable_profiling()?;

  let seed = std::env::args()
    .nth(1)
    .map(|arg| arg.parse::<u64>())
    .transpose()?;

  let mut builder = ModelBuilder::new([COLS, ROWS]);
  for (sides, _, weight) in PIECES {
    let tile = Tile::from_fn(|dir: Dim2d| (sides >> *dir.id()) & 1).with_weight(weight);
    builder.register(tile)?;
  }
  let model = builder.build()?;

  if PARALLEL {
    let observer = EntropyObserver::new(seed, Parallel::default());
    println!("Seed: {}", observer.seed());
    solve(model, observer, SweepPropagator::new(Parallel::default()))
  } else {
    let observer = EntropyObserver::new(seed, Sequential);
    println!("Seed: {}", observer.seed());
    solve(model, observer, WorklistPropagator::default())
  }
}

fn solve<O, P>(model: Model<u8, 2>, observer: O, propagator: P) -> Result<(), Box<dyn Error>>
where
  O: Observer,
  P: Propagator,
{
  let mut builder = RunnerBuilder::new(model, observer, propagator);
  builder.with_snapshot_every(DEFAULT_SNAPSHOT_EVERY);
  let mut runner = builder.build()?;

  let status = if STEP_BY_STEP {
    let mut status = runner.status();
    while runner.state() == RunState::Running {
      status = runner.step()?;
      println!("\n{}", render(runner.grid()));
    }
    status
  } else {
    runner.finish()?
  };

  println!("\n{}\n", render(runner.grid()));

  match status {
    Status::Done => println!("Solved with {} backtracks", runner.backtracks()),
    _ => println!("Gave up after {} backtracks", runner.backtracks()),
  }

  Ok(())
}

fn render(grid: &Grid<2>) -> String {
  let glyph = |index| match grid.state(index) {
    CellState::Solved(tile) => PIECES.get(tile).map(|(_, glyph, _)| *glyph).unwrap_or('?'),
    CellState::Undetermined(_) => '·',
    CellState::Contradiction => '!',
  };

  itertools::join(
    (0..ROWS).map(|y| {
      (0..COLS)
        .map(|x| glyph(UPos::new([x, y]).index(grid.size())))
        .collect::<String>()
    }),
    "\n",
  )
}
