use std::panic;

use conflux_parallel::{merge_sort, merge_sort_with};
use rand::{seq::SliceRandom, thread_rng, Rng};

#[test]
fn sorts_small_slices() {
    let mut v = vec![3, 1, 4, 1, 5, 9, 2, 6];
    merge_sort(&mut v);
    assert_eq!(v, vec![1, 1, 2, 3, 4, 5, 6, 9]);
}

#[test]
fn empty_and_single() {
    let mut empty: Vec<i32> = Vec::new();
    merge_sort(&mut empty);
    assert!(empty.is_empty());

    let mut single = vec![42];
    merge_sort(&mut single);
    assert_eq!(single, vec![42]);
}

#[test]
fn already_sorted_and_reversed() {
    let mut asc: Vec<u32> = (0..10_000).collect();
    merge_sort(&mut asc);
    assert!(asc.windows(2).all(|w| w[0] <= w[1]));

    let mut desc: Vec<u32> = (0..10_000).rev().collect();
    merge_sort(&mut desc);
    assert!(desc.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn sorts_a_permutation_of_the_input() {
    let mut rng = thread_rng();
    let mut v: Vec<i64> = (0..100_000).map(|_| rng.gen_range(-5000..5000)).collect();
    let mut expected = v.clone();

    merge_sort(&mut v);
    expected.sort();
    assert_eq!(v, expected);
}

#[test]
fn stable_under_index_tagged_comparator() {
    // Only the key participates in the ordering; the tag records input
    // position.
    #[derive(Clone, Debug)]
    struct Tagged {
        key: u8,
        tag: usize,
    }

    impl PartialEq for Tagged {
        fn eq(&self, other: &Tagged) -> bool {
            self.key == other.key
        }
    }

    impl Eq for Tagged {}

    impl PartialOrd for Tagged {
        fn partial_cmp(&self, other: &Tagged) -> Option<std::cmp::Ordering> {
            Some(self.cmp(other))
        }
    }

    impl Ord for Tagged {
        fn cmp(&self, other: &Tagged) -> std::cmp::Ordering {
            self.key.cmp(&other.key)
        }
    }

    let mut rng = thread_rng();
    let mut v: Vec<Tagged> = (0..50_000)
        .map(|tag| Tagged {
            key: rng.gen_range(0..8),
            tag,
        })
        .collect();

    merge_sort(&mut v);

    // Within every run of equal keys, tags must still ascend.
    for w in v.windows(2) {
        assert!(w[0].key <= w[1].key);
        if w[0].key == w[1].key {
            assert!(w[0].tag < w[1].tag);
        }
    }
}

#[test]
fn respects_explicit_budget() {
    let mut rng = thread_rng();
    let mut v: Vec<i32> = (0..50_000).map(|_| rng.gen()).collect();
    let mut expected = v.clone();

    // A budget of one thread degenerates to the sequential sort.
    merge_sort_with(&mut v, 100, 1);
    expected.sort();
    assert_eq!(v, expected);
}

#[test]
fn small_cutoff_still_sorts() {
    let mut v: Vec<u16> = (0..20_000).map(|i| (i * 7919 % 1024) as u16).collect();
    let mut expected = v.clone();

    merge_sort_with(&mut v, 16, 4);
    expected.sort();
    assert_eq!(v, expected);
}

#[test]
fn comparator_panic_reaches_the_caller() {
    #[derive(Clone, PartialEq, Eq)]
    struct Grenade(u32);

    impl PartialOrd for Grenade {
        fn partial_cmp(&self, other: &Grenade) -> Option<std::cmp::Ordering> {
            Some(self.cmp(other))
        }
    }

    impl Ord for Grenade {
        fn cmp(&self, other: &Grenade) -> std::cmp::Ordering {
            if self.0 == 1234 || other.0 == 1234 {
                panic!("cannot compare 1234");
            }
            self.0.cmp(&other.0)
        }
    }

    let mut rng = thread_rng();
    let mut v: Vec<Grenade> = (0..10_000).map(|_| Grenade(rng.gen_range(0..1000))).collect();
    v.shuffle(&mut rng);
    v[5000] = Grenade(1234);

    let result = panic::catch_unwind(panic::AssertUnwindSafe(|| merge_sort(&mut v)));
    assert!(result.is_err());
}
