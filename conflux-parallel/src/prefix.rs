use std::panic::{self, AssertUnwindSafe};

use crossbeam_utils::thread;

use crate::ops::BinaryOp;
use crate::{worker_count, MIN_GRAIN};

/// Computes an inclusive scan of a slice, preceded by the identity
/// element, in parallel.
///
/// The output has `items.len() + 1` elements: `out[0]` is the operator's
/// identity and `out[i + 1] = op(out[i], items[i])`. The scan runs in two
/// passes: every worker scans its own block seeded from the identity and
/// records its block total, the block totals reduce sequentially into
/// per-block offsets, and the workers then fold their offset into every
/// element of their block. For associative operators the result equals
/// the sequential scan.
///
/// A panic in the operator is re-raised here after all workers are
/// joined.
///
/// # Examples
///
/// ```
/// use conflux_parallel::{prefix_scan, ops};
///
/// assert_eq!(
///     prefix_scan(&[1, 2, 3, 4, 5], &ops::Add),
///     vec![0, 1, 3, 6, 10, 15],
/// );
/// ```
pub fn prefix_scan<T, O>(items: &[T], op: &O) -> Vec<T>
where
    T: Clone + Send + Sync,
    O: BinaryOp<T> + Sync,
{
    let n = items.len();
    let workers = worker_count(n, MIN_GRAIN);
    if workers == 1 {
        let mut out = Vec::with_capacity(n + 1);
        out.push(op.identity());
        out.extend(scan_block(items, op));
        return out;
    }

    let block = n / workers;

    // Pass one: independent scans, one block per worker.
    let mut scans: Vec<Vec<T>> = Vec::with_capacity(workers);
    let mut failure = None;

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers - 1);
        for chunk in items.chunks(block).take(workers - 1) {
            handles.push(scope.spawn(move |_| scan_block(chunk, op)));
        }
        let rest = &items[block * (workers - 1)..];
        let local = panic::catch_unwind(AssertUnwindSafe(|| scan_block(rest, op)));

        for handle in handles {
            match handle.join() {
                Ok(scan) => scans.push(scan),
                Err(payload) => {
                    failure.get_or_insert(payload);
                }
            }
        }
        match local {
            Ok(scan) => scans.push(scan),
            Err(payload) => {
                failure.get_or_insert(payload);
            }
        }
    })
    .unwrap();

    if let Some(payload) = failure {
        panic::resume_unwind(payload);
    }

    // Block totals reduce into the offset each block's elements carry.
    let mut offsets: Vec<T> = Vec::with_capacity(workers);
    let mut acc = op.identity();
    for scan in &scans {
        offsets.push(acc.clone());
        if let Some(total) = scan.last() {
            acc = op.apply(acc, total.clone());
        }
    }

    // Pass two: fold each block's offset into its elements. The first
    // block's offset is the identity, so it stays as computed.
    let mut failure = None;
    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers - 1);
        for (scan, offset) in scans.iter_mut().zip(offsets.iter()).skip(1) {
            handles.push(scope.spawn(move |_| {
                for value in scan.iter_mut() {
                    *value = op.apply(offset.clone(), value.clone());
                }
            }));
        }
        for handle in handles {
            if let Err(payload) = handle.join() {
                failure.get_or_insert(payload);
            }
        }
    })
    .unwrap();

    if let Some(payload) = failure {
        panic::resume_unwind(payload);
    }

    let mut out = Vec::with_capacity(n + 1);
    out.push(op.identity());
    for scan in scans {
        out.extend(scan);
    }
    out
}

fn scan_block<T, O>(block: &[T], op: &O) -> Vec<T>
where
    T: Clone,
    O: BinaryOp<T>,
{
    let mut out = Vec::with_capacity(block.len());
    let mut acc = op.identity();
    for x in block {
        acc = op.apply(acc, x.clone());
        out.push(acc.clone());
    }
    out
}
