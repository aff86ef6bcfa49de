//! Configuration for dispatch thresholds and the execution space.

pub mod options;
pub use options::KernelOptions;
