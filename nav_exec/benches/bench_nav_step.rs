//! # Navigation Step Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use comms_if::eqpt::cam::AnchorObservation;
use nav_lib::{
    nav_ctrl::{DroneController, NavCtrlParams},
    tracker::{AnchorTracker, TrackerParams},
};

fn nav_step_benchmark(c: &mut Criterion) {
    let mut tracker = AnchorTracker::new(TrackerParams::default());
    let mut ctrl = DroneController::new(NavCtrlParams::default());
    let conf_min = ctrl.params().conf_min;

    // Anchor drifting across the image, dropping out every tenth frame
    let mut k: u64 = 0;

    c.bench_function("tracker + controller step", |b| {
        b.iter(|| {
            let t = k as f64 * 0.05;
            let obs = if k % 10 == 9 {
                AnchorObservation::not_detected(t)
            }
            else {
                AnchorObservation {
                    timestamp_s: t,
                    detected: true,
                    confidence: 0.9,
                    cx: 0.4 * (0.3 * t).sin(),
                    cy: 0.1 * (0.5 * t).cos(),
                    size: 0.2,
                }
            };
            k += 1;

            let st = tracker.update(black_box(&obs), conf_min);
            ctrl.step(&st, 0.05)
        })
    });
}

criterion_group!(benches, nav_step_benchmark);
criterion_main!(benches);
