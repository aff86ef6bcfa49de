// rayon-based execution space

use rayon::prelude::*;

use super::{ExecSpace, SerialExec};
use crate::config::KernelOptions;
use crate::reduce::{AccBuf, Reducer};

pub struct RayonExec {
    pool: Option<rayon::ThreadPool>,
    serial_cutoff: usize,
    min_rows_per_task: usize,
}

impl RayonExec {
    /// Execution space on the global pool, sized by `num_cpus`.
    pub fn new() -> Self {
        Self::from_options(&KernelOptions::default())
    }

    /// Uses a private pool when `opts.num_threads` is set, the global pool otherwise.
    pub fn from_options(opts: &KernelOptions) -> Self {
        let pool = match opts.num_threads {
            Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => {
                    log::debug!("mvkernels: private rayon pool with {threads} threads");
                    Some(pool)
                }
                Err(err) => {
                    log::warn!("mvkernels: cannot build a {threads}-thread pool ({err}); using the global pool");
                    None
                }
            },
            None => None,
        };
        if pool.is_none() {
            let built = rayon::ThreadPoolBuilder::new()
                .num_threads(num_cpus::get())
                .build_global()
                .is_ok();
            if built {
                log::debug!("mvkernels: global rayon pool with {} threads", num_cpus::get());
            }
        }
        RayonExec {
            pool,
            serial_cutoff: opts.serial_cutoff,
            min_rows_per_task: opts.min_rows_per_task.max(1),
        }
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl Default for RayonExec {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecSpace for RayonExec {
    fn name(&self) -> &'static str {
        "rayon"
    }

    fn concurrency(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    fn parallel_for<F>(&self, n: usize, body: F)
    where
        F: Fn(usize) + Sync + Send,
    {
        if n < self.serial_cutoff {
            return SerialExec.parallel_for(n, body);
        }
        let min_len = self.min_rows_per_task;
        self.install(|| (0..n).into_par_iter().with_min_len(min_len).for_each(body));
    }

    fn parallel_reduce<R>(&self, n: usize, reducer: &R) -> AccBuf<R::Value>
    where
        R: Reducer,
    {
        if n < self.serial_cutoff {
            return SerialExec.parallel_reduce(n, reducer);
        }
        let min_len = self.min_rows_per_task;
        self.install(|| {
            (0..n)
                .into_par_iter()
                .with_min_len(min_len)
                .fold(
                    || reducer.identity(),
                    |mut acc, i| {
                        reducer.accumulate(i, &mut acc);
                        acc
                    },
                )
                .reduce(
                    || reducer.identity(),
                    |mut dst, src| {
                        reducer.join(&mut dst, &src);
                        dst
                    },
                )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SumIndex;

    impl Reducer for SumIndex {
        type Value = f64;

        fn width(&self) -> usize {
            2
        }

        fn accumulate(&self, i: usize, acc: &mut [f64]) {
            acc[0] += i as f64;
            acc[1] += 1.0;
        }

        fn join(&self, dst: &mut [f64], src: &[f64]) {
            dst[0] += src[0];
            dst[1] += src[1];
        }
    }

    fn forced_parallel() -> RayonExec {
        let opts = KernelOptions { serial_cutoff: 0, min_rows_per_task: 8, ..KernelOptions::default() };
        RayonExec::from_options(&opts)
    }

    #[test]
    fn parallel_for_covers_range() {
        let exec = forced_parallel();
        let hits: Vec<AtomicUsize> = (0..1000).map(|_| AtomicUsize::new(0)).collect();
        exec.parallel_for(hits.len(), |i| {
            hits[i].fetch_add(1, Ordering::Relaxed);
        });
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn parallel_reduce_matches_serial() {
        let exec = forced_parallel();
        let par = exec.parallel_reduce(1000, &SumIndex);
        let ser = SerialExec.parallel_reduce(1000, &SumIndex);
        assert_eq!(par.as_slice(), ser.as_slice());
        assert_eq!(par[0], 499_500.0);
    }

    #[test]
    fn private_pool_size() {
        let opts = KernelOptions { num_threads: Some(2), ..KernelOptions::default() };
        let exec = RayonExec::from_options(&opts);
        assert_eq!(exec.concurrency(), 2);
    }
}
