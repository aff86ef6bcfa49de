//! Dispatch and execution options.
//!
//! `KernelOptions` holds the knobs the dispatch layer and the rayon execution
//! space read: the column count up to which the unrolled path is used, the row
//! count below which loops run inline, the rayon split granularity and an
//! optional private pool size. Each can be overridden from the environment.

use std::str::FromStr;

/// Column count above which kernels use the generic runtime loop.
pub const DEFAULT_UNROLL_LIMIT: usize = 16;
/// Row count below which the rayon space runs a loop inline.
pub const DEFAULT_SERIAL_CUTOFF: usize = 4096;
/// Smallest row block a rayon task receives.
pub const DEFAULT_MIN_ROWS_PER_TASK: usize = 256;

/// Kernel dispatch & execution parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelOptions {
    /// Largest column count served by the unrolled path
    pub unroll_limit: usize,

    /// Row count below which loops are not split across threads
    pub serial_cutoff: usize,

    /// Minimum rows per rayon task
    pub min_rows_per_task: usize,

    /// Size of a private thread pool; `None` uses the global pool
    pub num_threads: Option<usize>,
}

impl Default for KernelOptions {
    fn default() -> Self {
        Self {
            unroll_limit: DEFAULT_UNROLL_LIMIT,
            serial_cutoff: DEFAULT_SERIAL_CUTOFF,
            min_rows_per_task: DEFAULT_MIN_ROWS_PER_TASK,
            num_threads: None,
        }
    }
}

impl KernelOptions {
    /// Defaults overridden by `MVKERNELS_UNROLL_LIMIT`, `MVKERNELS_SERIAL_CUTOFF`,
    /// `MVKERNELS_MIN_ROWS_PER_TASK` and `MVKERNELS_NUM_THREADS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut opts = Self::default();
        if let Some(v) = parse_var(&lookup, "MVKERNELS_UNROLL_LIMIT") {
            opts.unroll_limit = v;
        }
        if let Some(v) = parse_var(&lookup, "MVKERNELS_SERIAL_CUTOFF") {
            opts.serial_cutoff = v;
        }
        if let Some(v) = parse_var(&lookup, "MVKERNELS_MIN_ROWS_PER_TASK") {
            opts.min_rows_per_task = v;
        }
        if let Some(v) = parse_var::<usize>(&lookup, "MVKERNELS_NUM_THREADS") {
            opts.num_threads = (v > 0).then_some(v);
        }
        opts
    }

    pub fn with_unroll_limit(mut self, limit: usize) -> Self {
        self.unroll_limit = limit;
        self
    }

    pub fn with_serial_cutoff(mut self, rows: usize) -> Self {
        self.serial_cutoff = rows;
        self
    }

    pub fn with_min_rows_per_task(mut self, rows: usize) -> Self {
        self.min_rows_per_task = rows;
        self
    }

    pub fn with_num_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }
}

fn parse_var<V: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<V> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("mvkernels: ignoring {key}={raw:?}, not an unsigned integer");
            None
        }
    }
}
