//! Dispatch / specialization layer.
//!
//! Every public operation resolves, before its parallel region starts:
//! - the column shape ([`ColumnShape`]): single, unrolled, or generic loop,
//! - the coefficient plan ([`Coeff`], [`Sign`], [`AxpbyPlan`]),
//! - the aliasing route ([`Aliasing`]): separate source views, or an in-place
//!   variant when the destination shares identical storage with a source.
//!
//! Shape checks that abort a call also live here.

pub mod coeff;
pub mod columns;

use bitflags::bitflags;

use crate::error::{KernelError, Result};
use crate::multivector::{overlap, view, MvRef, Overlap};

pub use coeff::{AxpbyPlan, ColumnCoeff, Coeff, PerColumnCoeff, SharedCoeff, Sign};
pub(crate) use coeff::with_coeff;
pub use columns::{ColumnShape, GenericLoop, RowLoop, SingleLoop, UnrolledLoop, UNROLL};
pub(crate) use columns::with_row_loop;

bitflags! {
    /// Which sources share identical storage with the destination.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct Aliasing: u8 {
        const DEST_IS_X = 0b01;
        const DEST_IS_Y = 0b10;
        const DEST_IS_BOTH = Self::DEST_IS_X.bits() | Self::DEST_IS_Y.bits();
    }
}

/// Resolve the optional row-count override against the operand row count.
pub fn resolve_rows(op: &'static str, rows: Option<usize>, available: usize) -> Result<usize> {
    match rows {
        None => Ok(available),
        Some(n) if n <= available => Ok(n),
        Some(n) => Err(KernelError::RowOverride { op, requested: n, available }),
    }
}

/// Require a destination whose rows do not share elements, so row tasks can
/// write it in parallel.
pub fn check_dest<T>(op: &'static str, dest: &MvRef<'_, T>) -> Result<()> {
    view::check_row_stride(dest.nrows(), dest.ncols(), dest.row_stride()).inspect_err(|_| {
        log::warn!("mvkernels: {op} rejected, destination rows overlap");
    })
}

/// Require `found` to have the same shape as `expected`.
pub fn check_same_shape<T>(op: &'static str, expected: &MvRef<'_, T>, found: &MvRef<'_, T>) -> Result<()> {
    check_rows(op, expected.nrows(), found.nrows())?;
    check_cols(op, expected.ncols(), found.ncols())
}

pub fn check_rows(op: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(KernelError::RowMismatch { op, expected, found });
    }
    Ok(())
}

pub fn check_cols(op: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(KernelError::ColumnMismatch { op, expected, found });
    }
    Ok(())
}

pub fn check_result_len(op: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(KernelError::ResultLength { op, expected, found });
    }
    Ok(())
}

/// Whether a destination is identical to a source; partial overlap is an error.
pub fn identical_storage<T>(op: &'static str, dest: &MvRef<'_, T>, src: &MvRef<'_, T>) -> Result<bool> {
    match overlap(dest, src) {
        Overlap::Disjoint => Ok(false),
        Overlap::Identical => Ok(true),
        Overlap::Partial => {
            log::warn!("mvkernels: {op} rejected, destination partially overlaps a source");
            Err(KernelError::PartialOverlap(op))
        }
    }
}

/// How weights of a weighted dot map onto the columns of `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightRank {
    /// One weight column shared by every column of `x`.
    Broadcast,
    /// One weight column per column of `x`.
    PerColumn,
}

impl WeightRank {
    /// Classify a weight view with `w_cols` columns against `m` columns of `x`.
    pub fn classify(op: &'static str, w_cols: usize, m: usize) -> Result<WeightRank> {
        if w_cols == 1 {
            Ok(WeightRank::Broadcast)
        } else if w_cols == m {
            Ok(WeightRank::PerColumn)
        } else {
            Err(KernelError::WeightShape { op, expected: m, found: w_cols })
        }
    }
}

/// Aliasing route of a destination against two sources.
pub fn aliasing<T>(
    op: &'static str,
    dest: &MvRef<'_, T>,
    x: &MvRef<'_, T>,
    y: &MvRef<'_, T>,
) -> Result<Aliasing> {
    let mut route = Aliasing::empty();
    if identical_storage(op, dest, x)? {
        route |= Aliasing::DEST_IS_X;
    }
    if identical_storage(op, dest, y)? {
        route |= Aliasing::DEST_IS_Y;
    }
    Ok(route)
}
