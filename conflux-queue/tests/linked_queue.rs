use std::collections::HashSet;

use conflux_queue::LinkedQueue;
use crossbeam_utils::thread::scope;

const COUNT: usize = 100_000;

#[test]
fn smoke() {
    let q = LinkedQueue::new();
    q.push(1);
    q.push(2);
    q.push(3);

    assert_eq!(q.wait_and_pop(), 1);
    assert_eq!(q.wait_and_pop(), 2);
    assert_eq!(q.wait_and_pop(), 3);
    assert!(q.is_empty());
}

#[test]
fn try_pop_empty() {
    let q: LinkedQueue<i32> = LinkedQueue::new();
    assert_eq!(q.try_pop(), None);
    q.push(7);
    assert_eq!(q.try_pop(), Some(7));
    assert_eq!(q.try_pop(), None);
}

#[test]
fn drop_with_elements() {
    let q = LinkedQueue::new();
    for i in 0..1000 {
        q.push(vec![i; 4]);
    }
    drop(q);
}

#[test]
fn spsc_order() {
    let q: LinkedQueue<usize> = LinkedQueue::new();

    scope(|scope| {
        scope.spawn(|_| {
            for i in 0..COUNT {
                assert_eq!(q.wait_and_pop(), i);
            }
        });

        for i in 0..COUNT {
            q.push(i);
        }
    })
    .unwrap();

    assert!(q.is_empty());
}

#[test]
fn producers_and_consumers_disjoint() {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 2;
    const PER_PRODUCER: usize = 25_000;

    let q: LinkedQueue<usize> = LinkedQueue::new();
    let mut received = Vec::new();

    scope(|scope| {
        let handles: Vec<_> = (0..CONSUMERS)
            .map(|_| {
                scope.spawn(|_| {
                    let mut got = Vec::new();
                    for _ in 0..PRODUCERS * PER_PRODUCER / CONSUMERS {
                        got.push(q.wait_and_pop());
                    }
                    got
                })
            })
            .collect();

        for p in 0..PRODUCERS {
            let q = &q;
            scope.spawn(move |_| {
                for i in 0..PER_PRODUCER {
                    q.push(p * PER_PRODUCER + i);
                }
            });
        }

        for h in handles {
            received.extend(h.join().unwrap());
        }
    })
    .unwrap();

    let set: HashSet<_> = received.iter().copied().collect();
    assert_eq!(received.len(), PRODUCERS * PER_PRODUCER);
    assert_eq!(set.len(), PRODUCERS * PER_PRODUCER);
}

#[test]
fn per_producer_order() {
    const PRODUCERS: usize = 3;
    const PER_PRODUCER: usize = 20_000;

    let q: LinkedQueue<(usize, usize)> = LinkedQueue::new();

    scope(|scope| {
        for p in 0..PRODUCERS {
            let q = &q;
            scope.spawn(move |_| {
                for i in 0..PER_PRODUCER {
                    q.push((p, i));
                }
            });
        }

        let mut next = [0usize; PRODUCERS];
        for _ in 0..PRODUCERS * PER_PRODUCER {
            let (p, i) = q.wait_and_pop();
            assert_eq!(i, next[p]);
            next[p] = i + 1;
        }
    })
    .unwrap();
}
