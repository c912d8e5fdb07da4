//! Benchmarks for commission planning and rank evaluation
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use referral_engine::{
    network_sales_share, plan_commissions, resolve_upline, CommissionRates, RankTable,
    DEFAULT_MAX_DEPTH,
};

fn bench_plan_commissions(c: &mut Criterion) {
    let rates = CommissionRates::default();

    c.bench_function("plan_commissions depth 6", |b| {
        b.iter(|| {
            let upline = resolve_upline(black_box(1_000u32), DEFAULT_MAX_DEPTH, |user| {
                user.checked_sub(1)
            });
            plan_commissions(black_box(123_456), &upline.ancestors, &rates)
        });
    });
}

fn bench_network_sales(c: &mut Criterion) {
    let rates = CommissionRates::default();
    let orders: Vec<i64> = (1..=10_000).map(|n| n * 37).collect();

    c.bench_function("network_sales_share 10k orders", |b| {
        b.iter(|| network_sales_share(black_box(orders.iter().copied()), 2, &rates));
    });
}

fn bench_rank_progress(c: &mut Criterion) {
    let table = RankTable::default();

    c.bench_function("rank progress", |b| {
        b.iter(|| table.progress(black_box(2_345_678)));
    });
}

criterion_group!(benches, bench_plan_commissions, bench_network_sales, bench_rank_progress);
criterion_main!(benches);
