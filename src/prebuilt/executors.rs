use crate::{Executor, Mask};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder, prelude::*};
use std::{fmt, sync::Arc};

/// Runs every cell in order on the calling thread, the reference the parallel backend is held to
#[derive(Default, Debug, Clone, Copy)]
pub struct Sequential;

impl Executor for Sequential {
  fn map_reduce<T, M, R>(&self, len: usize, neutral: T, map: M, reduce: R) -> T
  where
    T: Clone + Send + Sync,
    M: Fn(usize) -> T + Send + Sync,
    R: Fn(T, T) -> T + Send + Sync,
  {
    (0..len).map(map).fold(neutral, reduce)
  }

  fn sweep<F>(&self, prev: &[Mask], next: &mut [Mask], update: F) -> usize
  where
    F: Fn(usize) -> Mask + Send + Sync,
  {
    next
      .iter_mut()
      .enumerate()
      .map(|(i, slot)| {
        *slot = update(i);
        usize::from(*slot != prev[i])
      })
      .sum()
  }
}

/// Spreads cells over a rayon pool, the global one unless a dedicated pool was built
#[derive(Default, Clone)]
pub struct Parallel {
  pool: Option<Arc<ThreadPool>>,
}

impl fmt::Debug for Parallel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Parallel")
      .field("threads", &self.threads())
      .finish()
  }
}

impl Parallel {
  pub fn with_threads(threads: usize) -> Result<Self, ThreadPoolBuildError> {
    let pool = ThreadPoolBuilder::new()
      .num_threads(threads)
      .thread_name(|i| format!("tilewave-{i}"))
      .build()?;

    Ok(Self {
      pool: Some(Arc::new(pool)),
    })
  }

  pub fn threads(&self) -> usize {
    self
      .pool
      .as_ref()
      .map(|pool| pool.current_num_threads())
      .unwrap_or_else(rayon::current_num_threads)
  }

  fn install<T: Send>(&self, op: impl FnOnce() -> T + Send) -> T {
    match &self.pool {
      Some(pool) => pool.install(op),
      None => op(),
    }
  }
}

impl Executor for Parallel {
  #[profiling::function]
  fn map_reduce<T, M, R>(&self, len: usize, neutral: T, map: M, reduce: R) -> T
  where
    T: Clone + Send + Sync,
    M: Fn(usize) -> T + Send + Sync,
    R: Fn(T, T) -> T + Send + Sync,
  {
    self.install(|| {
      (0..len)
        .into_par_iter()
        .map(map)
        .reduce(|| neutral.clone(), reduce)
    })
  }

  #[profiling::function]
  fn sweep<F>(&self, prev: &[Mask], next: &mut [Mask], update: F) -> usize
  where
    F: Fn(usize) -> Mask + Send + Sync,
  {
    self.install(|| {
      next
        .par_iter_mut()
        .enumerate()
        .map(|(i, slot)| {
          *slot = update(i);
          usize::from(*slot != prev[i])
        })
        .sum()
    })
  }
}

#[cfg(test)]
mod tests {
  use super::{Parallel, Sequential};
  use crate::Executor;

  fn min_with_index(a: (u32, usize), b: (u32, usize)) -> (u32, usize) {
    if b < a { b } else { a }
  }

  #[test]
  fn backends_reduce_alike() {
    let values = (0..1000_u32).map(|i| (i * 7919) % 613).collect::<Vec<_>>();
    let map = |i: usize| (values[i], i);

    let neutral = (u32::MAX, usize::MAX);
    let expected = Sequential.map_reduce(values.len(), neutral, map, min_with_index);
    let pooled = Parallel::with_threads(3).unwrap();

    assert_eq!(
      Parallel::default().map_reduce(values.len(), neutral, map, min_with_index),
      expected
    );
    assert_eq!(
      pooled.map_reduce(values.len(), neutral, map, min_with_index),
      expected
    );
    assert_eq!(pooled.threads(), 3);
  }

  #[test]
  fn sweeps_count_changes() {
    let prev = vec![0b111_u64; 64];
    let update = |i: usize| if i % 4 == 0 { 0b011 } else { 0b111 };

    let mut sequential = vec![0; 64];
    let mut parallel = vec![0; 64];

    assert_eq!(Sequential.sweep(&prev, &mut sequential, update), 16);
    assert_eq!(Parallel::default().sweep(&prev, &mut parallel, update), 16);
    assert_eq!(sequential, parallel);
  }

  #[test]
  fn empty_reductions_return_neutral() {
    assert_eq!(Sequential.map_reduce(0, 5, |i| i, |a, b| a + b), 5);
    assert_eq!(Parallel::default().map_reduce(0, 5, |i| i, |a, b| a + b), 5);
  }
}
