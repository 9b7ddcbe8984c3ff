use std::time::Duration;

use criterion::{Criterion, Throughput};

pub const SAMPLE_SIZE: usize = 30;
pub const WARM_UP: Duration = Duration::from_millis(500);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(3);

/// Composition passes are short; fewer warm-up cycles suffice.
pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// Evenly spaced control values `0.0..=1.0` in `steps` intervals.
pub fn control_sweep(steps: usize) -> impl Iterator<Item = f32> {
    let steps = steps.max(1);
    (0..=steps).map(move |step| step as f32 / steps as f32)
}
