use conflux_queue::MsQueue;
use crossbeam_utils::thread::scope;

const CONC_COUNT: i64 = 100_000;

#[test]
fn push_pop_1() {
    let q: MsQueue<i64> = MsQueue::new();
    q.push(37);
    assert_eq!(q.try_pop(), Some(37));
}

#[test]
fn push_pop_2() {
    let q: MsQueue<i64> = MsQueue::new();
    q.push(37);
    q.push(48);
    assert_eq!(q.try_pop(), Some(37));
    assert_eq!(q.try_pop(), Some(48));
}

#[test]
fn push_pop_empty_check() {
    let q: MsQueue<i64> = MsQueue::new();
    assert!(q.is_empty());
    q.push(42);
    assert!(!q.is_empty());
    assert_eq!(q.try_pop(), Some(42));
    assert!(q.is_empty());
}

#[test]
fn push_pop_many_seq() {
    let q: MsQueue<i64> = MsQueue::new();
    for i in 0..200 {
        q.push(i)
    }
    for i in 0..200 {
        assert_eq!(q.try_pop(), Some(i));
    }
}

#[test]
fn drop_with_elements() {
    let q: MsQueue<String> = MsQueue::new();
    for i in 0..1000 {
        q.push(i.to_string());
    }
    q.try_pop();
    drop(q);
}

#[test]
fn push_pop_many_spsc() {
    let q: MsQueue<i64> = MsQueue::new();

    scope(|scope| {
        scope.spawn(|_| {
            let mut next = 0;

            while next < CONC_COUNT {
                if let Some(elem) = q.try_pop() {
                    assert_eq!(elem, next);
                    next += 1;
                }
            }
        });

        for i in 0..CONC_COUNT {
            q.push(i)
        }
    })
    .unwrap();
}

#[test]
fn push_pop_many_spmc() {
    fn recv(_t: i32, q: &MsQueue<i64>) {
        let mut cur = -1;
        for _i in 0..CONC_COUNT {
            if let Some(elem) = q.try_pop() {
                assert!(elem > cur);
                cur = elem;

                if cur == CONC_COUNT - 1 {
                    break;
                }
            }
        }
    }

    let q: MsQueue<i64> = MsQueue::new();
    scope(|scope| {
        for i in 0..3 {
            let q = &q;
            scope.spawn(move |_| recv(i, q));
        }

        scope.spawn(|_| {
            for i in 0..CONC_COUNT {
                q.push(i);
            }
        });
    })
    .unwrap();
}

#[test]
fn push_pop_many_mpmc() {
    enum LR {
        Left(i64),
        Right(i64),
    }

    let q: MsQueue<LR> = MsQueue::new();

    scope(|scope| {
        for _t in 0..2 {
            scope.spawn(|_| {
                for i in 0..CONC_COUNT {
                    q.push(LR::Left(i))
                }
            });
            scope.spawn(|_| {
                for i in 0..CONC_COUNT {
                    q.push(LR::Right(i))
                }
            });
            scope.spawn(|_| {
                let mut vl = vec![];
                let mut vr = vec![];
                for _i in 0..CONC_COUNT {
                    match q.try_pop() {
                        Some(LR::Left(x)) => vl.push(x),
                        Some(LR::Right(x)) => vr.push(x),
                        _ => {}
                    }
                }

                let mut vl2 = vl.clone();
                let mut vr2 = vr.clone();
                vl2.sort();
                vr2.sort();

                assert_eq!(vl, vl2);
                assert_eq!(vr, vr2);
            });
        }
    })
    .unwrap();
}
