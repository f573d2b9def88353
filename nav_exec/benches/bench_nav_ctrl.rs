//! # Navigation Control Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use nav_lib::{
    geo::GeoPosition,
    nav_ctrl::{InputData, NavCtrl, Params},
};
use util::module::State;

fn nav_ctrl_benchmark(c: &mut Criterion) {
    // ---- Build a controller steering towards a distant target ----

    let start = GeoPosition::new(50.0, 20.0);
    let target = start.destination_point(0.6, 2000.0);

    let mut nav_ctrl = NavCtrl::new(Params::default()).unwrap();
    nav_ctrl.add_target(target);

    // Fixes creeping north-east, far enough apart to be distinct but well inside the jump limit
    let fixes: Vec<GeoPosition> = (0..1000)
        .map(|i| start.destination_point(0.3, 0.5 * i as f64))
        .collect();

    // Prime the controller so it is steering rather than aligning
    for fix in fixes.iter().take(3) {
        nav_ctrl.proc(&InputData { raw_fix: *fix }).unwrap();
    }

    c.bench_function("NavCtrl::send_commands", |b| {
        b.iter(|| nav_ctrl.clone().send_commands())
    });

    // Bench a full cycle, filter included
    let mut i = 3;
    c.bench_function("NavCtrl::proc", |b| {
        b.iter(|| {
            i = if i + 1 < fixes.len() { i + 1 } else { 3 };
            nav_ctrl.proc(&InputData { raw_fix: fixes[i] }).unwrap()
        })
    });
}

criterion_group!(benches, nav_ctrl_benchmark);
criterion_main!(benches);
