use std::collections::HashSet;

use conflux_queue::TreiberStack;
use crossbeam_utils::thread::scope;

#[test]
fn smoke() {
    let s = TreiberStack::new();
    assert!(s.is_empty());

    s.push(1);
    s.push(2);
    s.push(3);
    assert!(!s.is_empty());

    assert_eq!(s.try_pop(), Some(3));
    assert_eq!(s.try_pop(), Some(2));
    assert_eq!(s.try_pop(), Some(1));
    assert_eq!(s.try_pop(), None);
    assert!(s.is_empty());
}

#[test]
fn drop_with_elements() {
    let s = TreiberStack::new();
    for i in 0..1000 {
        s.push(i.to_string());
    }
    drop(s);
}

#[test]
fn concurrent_no_loss_no_dup() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 10_000;

    let s: TreiberStack<usize> = TreiberStack::new();
    let mut received = Vec::new();

    scope(|scope| {
        for p in 0..PRODUCERS {
            let s = &s;
            scope.spawn(move |_| {
                for i in 0..PER_PRODUCER {
                    s.push(p * PER_PRODUCER + i);
                }
            });
        }

        while received.len() < PRODUCERS * PER_PRODUCER {
            if let Some(v) = s.try_pop() {
                received.push(v);
            }
        }
    })
    .unwrap();

    let set: HashSet<_> = received.iter().copied().collect();
    assert_eq!(set.len(), PRODUCERS * PER_PRODUCER);
}
