//! Numeric trait provider: the element-type contract every kernel is generic over.

pub mod scalars;
pub mod traits;

pub use traits::{RealScalar, Scalar};
