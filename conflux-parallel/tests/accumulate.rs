use std::panic;

use conflux_parallel::ops::{self, op_fn, BinaryOp};
use conflux_parallel::accumulate;
use rand::{thread_rng, Rng};

#[test]
fn sums_small_range() {
    let nums: Vec<u64> = (1..=10).collect();
    assert_eq!(accumulate(&nums, 0, &ops::Add), 55);
}

#[test]
fn product_with_unit_init() {
    assert_eq!(accumulate(&[2u64, 3, 4, 5], 1, &ops::Mul), 120);
}

#[test]
fn init_is_folded_in() {
    let nums: Vec<i64> = (1..=10).collect();
    assert_eq!(accumulate(&nums, 100, &ops::Add), 155);
}

#[test]
fn empty_slice_returns_init() {
    let nums: Vec<i32> = Vec::new();
    assert_eq!(accumulate(&nums, 42, &ops::Add), 42);
    assert_eq!(accumulate(&nums, 7, &ops::Mul), 7);
}

#[test]
fn min_and_max() {
    let nums = vec![5i32, -3, 17, 0, 9];
    assert_eq!(accumulate(&nums, i32::MAX, &ops::Min), -3);
    assert_eq!(accumulate(&nums, i32::MIN, &ops::Max), 17);
}

#[test]
fn concatenates_in_order() {
    let parts: Vec<String> = (0..200).map(|i| format!("{i},")).collect();
    let expected: String = parts.concat();
    assert_eq!(
        accumulate(&parts, String::new(), &ops::Concat),
        expected
    );
}

#[test]
fn matches_sequential_on_large_random_input() {
    let mut rng = thread_rng();
    let nums: Vec<i64> = (0..100_000).map(|_| rng.gen_range(-1000..1000)).collect();

    let sequential: i64 = nums.iter().sum();
    assert_eq!(accumulate(&nums, 0, &ops::Add), sequential);
}

#[test]
fn custom_op_with_explicit_identity() {
    let op = op_fn(|a: u32, b: u32| a | b, 0);
    let nums: Vec<u32> = (0..1000u32).map(|i| 1u32 << (i % 16)).collect();
    assert_eq!(accumulate(&nums, 0, &op), 0xFFFF);
    assert_eq!(op.identity(), 0);
}

#[test]
fn worker_panic_reaches_the_caller() {
    let nums: Vec<i32> = (0..10_000).collect();
    let op = op_fn(
        |a: i32, b: i32| {
            if b == 7777 {
                panic!("boom at 7777");
            }
            a + b
        },
        0,
    );

    let result = panic::catch_unwind(|| accumulate(&nums, 0, &op));
    let payload = result.unwrap_err();
    let msg = payload.downcast_ref::<&str>().copied().unwrap_or_default();
    assert!(msg.contains("boom at 7777"));
}
