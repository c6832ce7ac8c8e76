use conflux_queue::MsQueue;
use crossbeam_utils::thread;

use crate::failure::FirstFailure;
use crate::{worker_count, MIN_GRAIN};

/// Applies `f` to every element of a slice, in parallel, with a static
/// block partition.
///
/// The slice is split into one contiguous block per worker (at least 25
/// elements each; small inputs run sequentially) and each worker walks
/// its block to completion. Use this when every element costs about the
/// same; for uneven workloads see [`for_each_dynamic`].
///
/// If `f` panics, the remaining workers finish their blocks, and the
/// first captured panic is re-raised here after all are joined. Elements
/// already visited stay mutated.
///
/// # Examples
///
/// ```
/// use conflux_parallel::for_each;
///
/// let mut nums: Vec<u64> = (0..100).collect();
/// for_each(&mut nums, |x| *x *= 2);
/// assert_eq!(nums[40], 80);
/// ```
pub fn for_each<T, F>(items: &mut [T], f: F)
where
    T: Send,
    F: Fn(&mut T) + Sync,
{
    let n = items.len();
    let workers = worker_count(n, MIN_GRAIN);
    if workers == 1 {
        for x in items.iter_mut() {
            f(x);
        }
        return;
    }

    let block = n / workers;
    let failure = FirstFailure::new();
    let (head, rest) = items.split_at_mut(block * (workers - 1));

    thread::scope(|scope| {
        let f = &f;
        let failure = &failure;
        for chunk in head.chunks_mut(block) {
            scope.spawn(move |_| {
                failure.run(|| {
                    for x in chunk.iter_mut() {
                        f(x);
                    }
                });
            });
        }

        failure.run(|| {
            for x in rest.iter_mut() {
                f(x);
            }
        });
    })
    .unwrap();

    failure.rethrow();
}

/// Applies `f` to every element of a slice, in parallel, with dynamic
/// load balancing.
///
/// The slice is cut into small blocks that are fed through a shared
/// lock-free task queue; each worker pops blocks until the queue drains.
/// Blocks whose elements happen to be expensive no longer stall the rest
/// of the slice, at the cost of queue traffic per block.
///
/// If `f` panics, a cancellation flag stops every worker at its next
/// block boundary, unprocessed blocks are discarded, and the first
/// captured panic is re-raised here after all workers are joined.
///
/// # Examples
///
/// ```
/// use conflux_parallel::for_each_dynamic;
///
/// let mut nums: Vec<u64> = (0..100).collect();
/// for_each_dynamic(&mut nums, |x| *x += 1);
/// assert_eq!(nums[99], 100);
/// ```
pub fn for_each_dynamic<T, F>(items: &mut [T], f: F)
where
    T: Send,
    F: Fn(&mut T) + Sync,
{
    let n = items.len();
    let workers = worker_count(n, MIN_GRAIN);
    if workers == 1 {
        for x in items.iter_mut() {
            f(x);
        }
        return;
    }

    let tasks: MsQueue<&mut [T]> = MsQueue::new();
    for chunk in items.chunks_mut(MIN_GRAIN) {
        tasks.push(chunk);
    }
    let failure = FirstFailure::new();

    thread::scope(|scope| {
        for _ in 0..workers - 1 {
            let tasks = &tasks;
            let f = &f;
            let failure = &failure;
            scope.spawn(move |_| drain(tasks, f, failure));
        }
        drain(&tasks, &f, &failure);
    })
    .unwrap();

    failure.rethrow();
}

fn drain<T, F>(tasks: &MsQueue<&mut [T]>, f: &F, failure: &FirstFailure)
where
    T: Send,
    F: Fn(&mut T) + Sync,
{
    // The cancellation flag is checked at every block boundary.
    while !failure.tripped() {
        match tasks.try_pop() {
            Some(chunk) => failure.run(|| {
                for x in chunk.iter_mut() {
                    f(x);
                }
            }),
            None => break,
        }
    }
}
