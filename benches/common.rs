#![allow(dead_code)]

use alloy_primitives::{I256, U256};
use clmm_core::math::bit_math::{least_significant_bit, most_significant_bit};
use clmm_core::math::math_helpers::{mul_div, mul_div_rounding_up};
use clmm_core::math::sqrt_price_math::{
    get_amount_0_delta_base, get_amount_1_delta_base, get_next_sqrt_price_from_input,
};
use clmm_core::math::swap_math::compute_swap_step;
use clmm_core::math::tick_bitmap::{flip_tick, next_initialized_tick_within_one_word};
use clmm_core::math::tick_math::{get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio};
use clmm_core::FastMap;
use criterion::{black_box, Criterion};

const LIQUIDITY: u128 = 1_000_000_000_000_000_000;

pub fn bench_tick_math(c: &mut Criterion) {
    c.bench_function("tick_math/get_sqrt_ratio_at_tick", |b| {
        b.iter(|| get_sqrt_ratio_at_tick(black_box(-340767)).unwrap())
    });

    let price = get_sqrt_ratio_at_tick(-340767).unwrap();
    c.bench_function("tick_math/get_tick_at_sqrt_ratio", |b| {
        b.iter(|| get_tick_at_sqrt_ratio(black_box(price)).unwrap())
    });
}

pub fn bench_sqrt_price_math(c: &mut Criterion) {
    let price = get_sqrt_ratio_at_tick(0).unwrap();
    let upper = get_sqrt_ratio_at_tick(1000).unwrap();
    let amount = U256::from(100_000_000_000_000_000u128);

    c.bench_function("sqrt_price_math/next_price_from_input", |b| {
        b.iter(|| {
            get_next_sqrt_price_from_input(black_box(price), LIQUIDITY, amount, true).unwrap()
        })
    });

    c.bench_function("sqrt_price_math/amount_0_delta", |b| {
        b.iter(|| get_amount_0_delta_base(black_box(price), upper, LIQUIDITY, true).unwrap())
    });

    c.bench_function("sqrt_price_math/amount_1_delta", |b| {
        b.iter(|| get_amount_1_delta_base(black_box(price), upper, LIQUIDITY, false).unwrap())
    });
}

pub fn bench_swap_math(c: &mut Criterion) {
    let current = get_sqrt_ratio_at_tick(0).unwrap();
    let target = get_sqrt_ratio_at_tick(-100).unwrap();
    let amount = I256::try_from(1_000_000_000i64).unwrap();

    c.bench_function("swap_math/compute_swap_step", |b| {
        b.iter(|| compute_swap_step(black_box(current), target, LIQUIDITY, amount, 3000).unwrap())
    });
}

pub fn bench_math_helpers(c: &mut Criterion) {
    let a = U256::MAX / U256::from(3u8);
    let b_term = U256::from(987_654_321u64);
    let d = U256::from(1_000_000_007u64);

    c.bench_function("math_helpers/mul_div", |b| {
        b.iter(|| mul_div(black_box(a), b_term, d).unwrap())
    });

    c.bench_function("math_helpers/mul_div_rounding_up", |b| {
        b.iter(|| mul_div_rounding_up(black_box(a), b_term, d).unwrap())
    });
}

pub fn bench_tick_bitmap(c: &mut Criterion) {
    let mut bitmap: FastMap<i16, U256> = FastMap::default();
    for tick in [-887270, -500, -60, 0, 60, 500, 887270] {
        flip_tick(&mut bitmap, tick, 10).unwrap();
    }

    c.bench_function("tick_bitmap/next_initialized_down", |b| {
        b.iter(|| next_initialized_tick_within_one_word(&bitmap, black_box(55), 10, true).unwrap())
    });

    c.bench_function("tick_bitmap/next_initialized_up", |b| {
        b.iter(|| {
            next_initialized_tick_within_one_word(&bitmap, black_box(55), 10, false).unwrap()
        })
    });
}

pub fn bench_bit_math(c: &mut Criterion) {
    let value = (U256::ONE << 200) | U256::ONE;

    c.bench_function("bit_math/most_significant_bit", |b| {
        b.iter(|| most_significant_bit(black_box(value)).unwrap())
    });

    c.bench_function("bit_math/least_significant_bit", |b| {
        b.iter(|| least_significant_bit(black_box(value)).unwrap())
    });
}
