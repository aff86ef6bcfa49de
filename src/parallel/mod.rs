//! Parallel execution provider.
//!
//! Kernels consume exactly two primitives: `parallel_for` over a row range with no
//! ordering guarantee, and `parallel_reduce` implementing the Init / Accumulate /
//! Combine phases of [`Reducer`]. `SerialExec` runs both inline; `RayonExec`
//! (feature `rayon`) splits rows across a rayon pool. `UniverseExec` selects one of
//! them at runtime.

use crate::config::KernelOptions;
use crate::reduce::{AccBuf, Reducer};

pub trait ExecSpace: Sync {
    /// Short backend name, used in log records.
    fn name(&self) -> &'static str;
    /// Number of workers a call may use.
    fn concurrency(&self) -> usize;
    /// Call `body(i)` once for every `i` in `[0, n)`, in no particular order.
    fn parallel_for<F>(&self, n: usize, body: F)
    where
        F: Fn(usize) + Sync + Send;
    /// Reduce rows `[0, n)` with `reducer`; returns the combined, unfinalized accumulator.
    fn parallel_reduce<R>(&self, n: usize, reducer: &R) -> AccBuf<R::Value>
    where
        R: Reducer;
}

#[cfg(feature = "rayon")]
pub mod rayon_exec;
#[cfg(feature = "rayon")]
pub use rayon_exec::RayonExec;

/// Runs every loop on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialExec;

impl ExecSpace for SerialExec {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn concurrency(&self) -> usize {
        1
    }

    fn parallel_for<F>(&self, n: usize, body: F)
    where
        F: Fn(usize) + Sync + Send,
    {
        (0..n).for_each(body);
    }

    fn parallel_reduce<R>(&self, n: usize, reducer: &R) -> AccBuf<R::Value>
    where
        R: Reducer,
    {
        let mut acc = reducer.identity();
        for i in 0..n {
            reducer.accumulate(i, &mut acc);
        }
        acc
    }
}

pub enum UniverseExec {
    Serial(SerialExec),
    #[cfg(feature = "rayon")]
    Rayon(RayonExec),
}

impl UniverseExec {
    /// Rayon-backed when the feature is enabled, serial otherwise.
    pub fn from_options(opts: &KernelOptions) -> Self {
        #[cfg(feature = "rayon")]
        {
            UniverseExec::Rayon(RayonExec::from_options(opts))
        }
        #[cfg(not(feature = "rayon"))]
        {
            let _ = opts;
            UniverseExec::Serial(SerialExec)
        }
    }
}

impl Default for UniverseExec {
    fn default() -> Self {
        Self::from_options(&KernelOptions::default())
    }
}

impl ExecSpace for UniverseExec {
    fn name(&self) -> &'static str {
        match self {
            UniverseExec::Serial(exec) => exec.name(),
            #[cfg(feature = "rayon")]
            UniverseExec::Rayon(exec) => exec.name(),
        }
    }

    fn concurrency(&self) -> usize {
        match self {
            UniverseExec::Serial(exec) => exec.concurrency(),
            #[cfg(feature = "rayon")]
            UniverseExec::Rayon(exec) => exec.concurrency(),
        }
    }

    fn parallel_for<F>(&self, n: usize, body: F)
    where
        F: Fn(usize) + Sync + Send,
    {
        match self {
            UniverseExec::Serial(exec) => exec.parallel_for(n, body),
            #[cfg(feature = "rayon")]
            UniverseExec::Rayon(exec) => exec.parallel_for(n, body),
        }
    }

    fn parallel_reduce<R>(&self, n: usize, reducer: &R) -> AccBuf<R::Value>
    where
        R: Reducer,
    {
        match self {
            UniverseExec::Serial(exec) => exec.parallel_reduce(n, reducer),
            #[cfg(feature = "rayon")]
            UniverseExec::Rayon(exec) => exec.parallel_reduce(n, reducer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn serial_for_visits_every_index_once() {
        let hits: Vec<AtomicUsize> = (0..17).map(|_| AtomicUsize::new(0)).collect();
        SerialExec.parallel_for(hits.len(), |i| {
            hits[i].fetch_add(1, Ordering::Relaxed);
        });
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn universe_default_runs_loops() {
        let exec = UniverseExec::default();
        assert!(exec.concurrency() >= 1);
        let total = AtomicUsize::new(0);
        exec.parallel_for(100, |i| {
            total.fetch_add(i, Ordering::Relaxed);
        });
        assert_eq!(total.load(Ordering::Relaxed), 4950);
    }
}
