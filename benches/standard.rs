use criterion::{criterion_group, criterion_main};

criterion_main!(base);

criterion_group!(base, pipes::bench, cubes::bench);

const SEED: u64 = 123;

use tilewave::{Socket, prelude::*};

fn solve<S, O, P, const DIM: usize>(model: Model<S, DIM>, observer: O, propagator: P) -> Status
where
  S: Socket,
  O: Observer,
  P: Propagator,
{
  let mut runner = RunnerBuilder::new(model, observer, propagator)
    .build()
    .expect("Failed to build runner");

  runner.finish().expect("Failed to run")
}

mod pipes {
  use crate::{SEED, solve};
  use criterion::Criterion;
  use tilewave::{
    prebuilt::{
      Dim2d,
      executors::{Parallel, Sequential},
      observers::EntropyObserver,
      propagators::{SweepPropagator, WorklistPropagator},
    },
    prelude::*,
  };

  fn model(dims: usize) -> Model<u8, 2> {
    let mut builder = ModelBuilder::new([dims, dims]);
    for sides in 0_u8..16 {
      if sides.count_ones() % 2 == 0 {
        let tile = Tile::from_fn(|dir: Dim2d| (sides >> *dir.id()) & 1);
        builder.register(tile).expect("Failed to register tile");
      }
    }
    builder.build().expect("Failed to build model")
  }

  pub fn bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipes");

    for pow in 4_u32..7_u32 {
      let dims = 2_usize.pow(pow);
      let model = model(dims);

      group.bench_function(format!("worklist {dims}x{dims}"), |b| {
        b.iter(|| {
          solve(
            model.clone(),
            EntropyObserver::new(Some(SEED), Sequential),
            WorklistPropagator::default(),
          )
        })
      });

      group.bench_function(format!("sweep {dims}x{dims}"), |b| {
        b.iter(|| {
          solve(
            model.clone(),
            EntropyObserver::new(Some(SEED), Sequential),
            SweepPropagator::new(Sequential),
          )
        })
      });

      group.bench_function(format!("parallel sweep {dims}x{dims}"), |b| {
        b.iter(|| {
          solve(
            model.clone(),
            EntropyObserver::new(Some(SEED), Parallel::default()),
            SweepPropagator::new(Parallel::default()),
          )
        })
      });
    }
  }
}

mod cubes {
  use crate::{SEED, solve};
  use criterion::Criterion;
  use tilewave::{
    prebuilt::{
      Dim3d,
      executors::{Parallel, Sequential},
      observers::EntropyObserver,
      propagators::{SweepPropagator, WorklistPropagator},
    },
    prelude::*,
  };

  /// Pipes running along all three axes
  fn model(size: [usize; 3]) -> Model<u8, 3> {
    let mut builder = ModelBuilder::new(size);
    for sides in 0_u8..64 {
      if sides.count_ones() % 2 == 0 {
        let tile = Tile::from_fn(|dir: Dim3d| (sides >> *dir.id()) & 1);
        builder.register(tile).expect("Failed to register tile");
      }
    }
    builder.build().expect("Failed to build model")
  }

  pub fn bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("cubes");
    group.sample_size(10);

    for (name, size) in [("24x24x24", [24, 24, 24]), ("chunk", [16, 64, 16])] {
      let model = model(size);

      group.bench_function(format!("worklist {name}"), |b| {
        b.iter(|| {
          solve(
            model.clone(),
            EntropyObserver::new(Some(SEED), Sequential),
            WorklistPropagator::default(),
          )
        })
      });

      group.bench_function(format!("parallel sweep {name}"), |b| {
        b.iter(|| {
          solve(
            model.clone(),
            EntropyObserver::new(Some(SEED), Parallel::default()),
            SweepPropagator::new(Parallel::default()),
          )
        })
      });
    }
  }
}
