use std::panic::{self, AssertUnwindSafe};

use crossbeam_utils::thread;

use crate::ops::BinaryOp;
use crate::{worker_count, MIN_GRAIN};

/// Folds a slice with a binary operator, in parallel.
///
/// The slice is partitioned into one contiguous block per worker (at
/// least 25 elements each; small inputs fold sequentially). Each worker
/// folds its block starting from the operator's identity element, and the
/// partial results are folded in block order starting from `init`, so any
/// *associative* operator — commutative or not — matches the sequential
/// fold. Non-associative operators produce a defined but
/// partition-dependent result.
///
/// A panic in the operator is re-raised here after all workers are
/// joined.
///
/// # Examples
///
/// ```
/// use conflux_parallel::{accumulate, ops};
///
/// let nums: Vec<u64> = (1..=10).collect();
/// assert_eq!(accumulate(&nums, 0, &ops::Add), 55);
/// assert_eq!(accumulate(&[2, 3, 4, 5], 1, &ops::Mul), 120);
/// ```
pub fn accumulate<T, O>(items: &[T], init: T, op: &O) -> T
where
    T: Clone + Send + Sync,
    O: BinaryOp<T> + Sync,
{
    let workers = worker_count(items.len(), MIN_GRAIN);
    if workers == 1 {
        return items
            .iter()
            .cloned()
            .fold(init, |acc, x| op.apply(acc, x));
    }

    let block = items.len() / workers;
    let mut partials: Vec<T> = Vec::with_capacity(workers);
    let mut failure = None;

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers - 1);
        for chunk in items.chunks(block).take(workers - 1) {
            handles.push(scope.spawn(move |_| fold_block(chunk, op)));
        }

        // The caller folds the last block, remainder included.
        let rest = &items[block * (workers - 1)..];
        let local = panic::catch_unwind(AssertUnwindSafe(|| fold_block(rest, op)));

        for handle in handles {
            match handle.join() {
                Ok(partial) => partials.push(partial),
                Err(payload) => {
                    failure.get_or_insert(payload);
                }
            }
        }
        match local {
            Ok(partial) => partials.push(partial),
            Err(payload) => {
                failure.get_or_insert(payload);
            }
        }
    })
    .unwrap();

    if let Some(payload) = failure {
        panic::resume_unwind(payload);
    }

    // Partials are in block order; folding from `init` preserves the
    // sequential association for associative operators.
    partials.into_iter().fold(init, |acc, p| op.apply(acc, p))
}

fn fold_block<T, O>(block: &[T], op: &O) -> T
where
    T: Clone,
    O: BinaryOp<T>,
{
    block
        .iter()
        .cloned()
        .fold(op.identity(), |acc, x| op.apply(acc, x))
}
