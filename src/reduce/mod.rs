//! The four-phase reduction protocol shared by every reduction kernel.
//!
//! 1. **Init**: each worker's accumulator, one slot per column, is set to the
//!    operation's identity ([`Reducer::identity`]).
//! 2. **Accumulate**: each row assigned to the worker updates every slot
//!    ([`Reducer::accumulate`]).
//! 3. **Combine**: worker accumulators are merged pairwise ([`Reducer::join`]); the
//!    merge tree belongs to the execution space, so only associativity and
//!    commutativity of `join` may be assumed.
//! 4. **Finalize**: the merged accumulator is post-processed
//!    ([`Reducer::finalize`]) and written once to the caller's buffer.

use num_traits::Zero;
use smallvec::SmallVec;

use crate::parallel::ExecSpace;

/// Column count up to which an accumulator lives inline.
pub const INLINE_COLUMNS: usize = 16;

/// Per-worker accumulator: inline for up to [`INLINE_COLUMNS`] columns, heap beyond.
pub type AccBuf<V> = SmallVec<[V; INLINE_COLUMNS]>;

/// A per-column reduction over the rows of one or more multivectors.
pub trait Reducer: Sync {
    type Value: Copy + Send + Sync + Zero;

    /// Accumulator length; always the column count of the reduced operands.
    fn width(&self) -> usize;

    /// Set every slot to the identity of `join`.
    fn init(&self, acc: &mut [Self::Value]) {
        acc.fill(Self::Value::zero());
    }

    /// Fold row `i` into `acc`.
    fn accumulate(&self, i: usize, acc: &mut [Self::Value]);

    /// Merge `src` into `dst`.
    fn join(&self, dst: &mut [Self::Value], src: &[Self::Value]);

    /// Post-process the fully combined accumulator.
    fn finalize(&self, _acc: &mut [Self::Value]) {}

    /// Fresh accumulator holding the identity.
    fn identity(&self) -> AccBuf<Self::Value> {
        let mut acc = AccBuf::from_elem(Self::Value::zero(), self.width());
        self.init(&mut acc);
        acc
    }
}

/// Run `reducer` over rows `[0, n)` on `exec` and write the result into `out`.
///
/// `out` is written exactly once, after the combine and finalize phases.
pub fn run_reduction<E, R>(exec: &E, n: usize, reducer: &R, out: &mut [R::Value])
where
    E: ExecSpace,
    R: Reducer,
{
    debug_assert_eq!(out.len(), reducer.width());
    let mut acc = exec.parallel_reduce(n, reducer);
    reducer.finalize(&mut acc);
    out.copy_from_slice(&acc);
}
