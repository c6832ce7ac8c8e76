use core::cmp::Reverse;

use conflux_queue::PriorityQueue;
use crossbeam_utils::thread::scope;
use rand::{seq::SliceRandom, thread_rng};

#[test]
fn pops_in_priority_order() {
    let q = PriorityQueue::new();
    q.push(3);
    q.push(7);
    q.push(1);
    q.push(5);

    assert_eq!(q.try_pop(), Some(7));
    assert_eq!(q.try_pop(), Some(5));
    assert_eq!(q.try_pop(), Some(3));
    assert_eq!(q.try_pop(), Some(1));
    assert_eq!(q.try_pop(), None);
}

#[test]
fn min_heap_via_reverse() {
    let q = PriorityQueue::new();
    q.push(Reverse(3));
    q.push(Reverse(7));
    q.push(Reverse(1));

    assert_eq!(q.try_pop(), Some(Reverse(1)));
    assert_eq!(q.try_pop(), Some(Reverse(3)));
    assert_eq!(q.try_pop(), Some(Reverse(7)));
}

#[test]
fn shuffled_input_drains_sorted() {
    let mut values: Vec<u32> = (0..1000).collect();
    values.shuffle(&mut thread_rng());

    let q = PriorityQueue::new();
    for v in &values {
        q.push(*v);
    }

    let mut prev = u32::MAX;
    while let Some(v) = q.try_pop() {
        assert!(v <= prev);
        prev = v;
    }
}

#[test]
fn bounded_backpressure() {
    let q = PriorityQueue::bounded(2);
    assert_eq!(q.capacity(), Some(2));
    assert_eq!(q.remaining_capacity(), Some(2));

    assert!(q.try_push(1).is_ok());
    assert!(q.try_push(2).is_ok());
    assert!(q.try_push(3).is_err());
    assert_eq!(q.remaining_capacity(), Some(0));

    assert_eq!(q.wait_and_pop(), 2);
    assert!(q.try_push(3).is_ok());
}

#[test]
fn unbounded_has_no_capacity() {
    let q = PriorityQueue::<i32>::new();
    assert_eq!(q.capacity(), None);
    assert_eq!(q.remaining_capacity(), None);
}

#[test]
#[should_panic(expected = "capacity")]
fn bounded_zero() {
    let _ = PriorityQueue::<i32>::bounded(0);
}

#[test]
fn blocked_producer_resumes() {
    let q = PriorityQueue::bounded(1);
    q.push(10);

    scope(|scope| {
        scope.spawn(|_| {
            q.push(20);
        });

        assert_eq!(q.wait_and_pop(), 10);
        assert_eq!(q.wait_and_pop(), 20);
    })
    .unwrap();
}

#[test]
fn concurrent_drain_is_a_permutation() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 5_000;

    let q: PriorityQueue<usize> = PriorityQueue::new();
    let mut received = Vec::new();

    scope(|scope| {
        for p in 0..PRODUCERS {
            let q = &q;
            scope.spawn(move |_| {
                for i in 0..PER_PRODUCER {
                    q.push(p * PER_PRODUCER + i);
                }
            });
        }

        for _ in 0..PRODUCERS * PER_PRODUCER {
            received.push(q.wait_and_pop());
        }
    })
    .unwrap();

    received.sort();
    let expected: Vec<usize> = (0..PRODUCERS * PER_PRODUCER).collect();
    assert_eq!(received, expected);
}
