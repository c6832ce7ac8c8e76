use std::collections::HashSet;

use conflux_queue::RingQueue;
use crossbeam_utils::thread::scope;

#[test]
fn smoke() {
    let q = RingQueue::new(4);
    assert!(q.push(1).is_ok());
    assert!(q.push(2).is_ok());
    assert!(q.push(3).is_ok());

    assert_eq!(q.try_pop(), Some(1));
    assert_eq!(q.try_pop(), Some(2));
    assert_eq!(q.try_pop(), Some(3));
    assert_eq!(q.try_pop(), None);
}

#[test]
fn full_and_empty() {
    let q = RingQueue::new(2);
    assert!(q.is_empty());
    assert!(!q.is_full());

    assert!(q.push('a').is_ok());
    assert!(q.push('b').is_ok());
    assert!(q.is_full());
    assert_eq!(q.len(), 2);

    let err = q.push('c').unwrap_err();
    assert_eq!(err.into_inner(), 'c');

    assert_eq!(q.try_pop(), Some('a'));
    assert!(q.push('c').is_ok());
    assert_eq!(q.try_pop(), Some('b'));
    assert_eq!(q.try_pop(), Some('c'));
    assert!(q.is_empty());
}

#[test]
fn wraps_around_many_laps() {
    let q = RingQueue::new(3);
    for i in 0..1000 {
        assert!(q.push(i).is_ok());
        assert_eq!(q.try_pop(), Some(i));
    }
    assert!(q.is_empty());
}

#[test]
#[should_panic(expected = "capacity")]
fn capacity_too_small() {
    let _ = RingQueue::<i32>::new(1);
}

#[test]
fn capacity() {
    let q = RingQueue::<i32>::new(7);
    assert_eq!(q.capacity(), 7);
}

#[test]
fn drop_with_elements() {
    let q = RingQueue::new(16);
    for i in 0..10 {
        q.push(vec![i; 4]).unwrap();
    }
    drop(q);
}

#[test]
fn spsc_order() {
    const COUNT: usize = 100_000;
    let q = RingQueue::new(8);

    scope(|scope| {
        scope.spawn(|_| {
            let mut next = 0;
            while next < COUNT {
                if let Some(i) = q.try_pop() {
                    assert_eq!(i, next);
                    next += 1;
                }
            }
        });

        for i in 0..COUNT {
            while q.push(i).is_err() {}
        }
    })
    .unwrap();
}

#[test]
fn mpmc_no_loss_no_dup() {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const PER_PRODUCER: usize = 10_000;

    let q: RingQueue<usize> = RingQueue::new(16);
    let mut received = Vec::new();

    scope(|scope| {
        let handles: Vec<_> = (0..CONSUMERS)
            .map(|_| {
                scope.spawn(|_| {
                    let mut got = Vec::new();
                    for _ in 0..PRODUCERS * PER_PRODUCER / CONSUMERS {
                        loop {
                            if let Some(v) = q.try_pop() {
                                got.push(v);
                                break;
                            }
                        }
                    }
                    got
                })
            })
            .collect();

        for p in 0..PRODUCERS {
            let q = &q;
            scope.spawn(move |_| {
                for i in 0..PER_PRODUCER {
                    while q.push(p * PER_PRODUCER + i).is_err() {}
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
