//! mvkernels: BLAS-1 kernels for multivectors
//!
//! A multivector is a batch of equal-length columns processed together. Every
//! operation picks, per call and before any parallel work starts, a loop shape from
//! the column count, a coefficient plan from the shape and sign of its scaling
//! coefficients, and an in-place route when the destination shares storage with a
//! source. Execution runs on rayon by default or serially without the `rayon`
//! feature.

pub mod parallel;

pub mod config;
pub mod core;
pub mod dispatch;
pub mod error;
mod kernels;
pub mod multivector;
pub mod ops;
pub mod reduce;
pub mod vector;

// Re-exports for convenience
pub use config::*;
pub use self::core::*;
pub use dispatch::{Aliasing, AxpbyPlan, Coeff, ColumnShape, Sign, WeightRank};
pub use error::*;
pub use multivector::{overlap, MultiVector, MvMut, MvRef, Overlap};
pub use ops::*;
pub use parallel::{ExecSpace, SerialExec, UniverseExec};
#[cfg(feature = "rayon")]
pub use parallel::RayonExec;
