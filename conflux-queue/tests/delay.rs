use std::time::{Duration, Instant};

use conflux_queue::DelayQueue;
use crossbeam_utils::thread::scope;

#[test]
fn pops_in_deadline_order() {
    let q = DelayQueue::new();

    // Pushed out of deadline order on purpose.
    q.push(1, Duration::from_millis(150));
    q.push(2, Duration::from_millis(50));
    q.push(3, Duration::from_millis(250));

    assert_eq!(q.pop(), 2);
    assert_eq!(q.pop(), 1);
    assert_eq!(q.pop(), 3);
    assert!(q.is_empty());
}

#[test]
fn never_pops_early() {
    let q = DelayQueue::new();
    let delay = Duration::from_millis(80);

    let start = Instant::now();
    q.push("x", delay);
    assert_eq!(q.pop(), "x");
    assert!(start.elapsed() >= delay);
}

#[test]
fn try_pop_only_returns_expired() {
    let q = DelayQueue::new();
    q.push(1, Duration::from_secs(60));
    assert_eq!(q.try_pop(), None);
    assert_eq!(q.len(), 1);

    q.push(2, Duration::ZERO);
    assert_eq!(q.try_pop(), Some(2));
    assert_eq!(q.try_pop(), None);
}

#[test]
fn sooner_push_shortens_the_wait() {
    let q = DelayQueue::new();
    q.push("slow", Duration::from_secs(30));

    scope(|scope| {
        scope.spawn(|_| {
            std::thread::sleep(Duration::from_millis(20));
            q.push("fast", Duration::ZERO);
        });

        // Sleeps towards the 30 s deadline until the sooner element lands.
        let start = Instant::now();
        assert_eq!(q.pop(), "fast");
        assert!(start.elapsed() < Duration::from_secs(5));
    })
    .unwrap();

    q.clear();
}

#[test]
fn ties_are_fifo() {
    let q = DelayQueue::new();
    q.push(1, Duration::ZERO);
    q.push(2, Duration::ZERO);
    q.push(3, Duration::ZERO);

    // Identical (sub-nanosecond apart) deadlines cannot reorder pushes.
    let a = q.pop();
    let b = q.pop();
    let c = q.pop();
    assert!(a < b && b < c);
}

#[test]
fn blocking_pop_waits_for_first_push() {
    let q: DelayQueue<i32> = DelayQueue::new();

    scope(|scope| {
        scope.spawn(|_| {
            std::thread::sleep(Duration::from_millis(30));
            q.push(9, Duration::ZERO);
        });

        assert_eq!(q.pop(), 9);
    })
    .unwrap();
}
