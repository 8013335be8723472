mod test_project_basic;

use crate::geom::{Point3, Sample, SampleBuffer};

/// Evenly spaced samples along +X, one unit apart.
pub(super) fn line_buffer(count: usize) -> SampleBuffer {
    let last = (count - 1) as f64;
    let samples = (0..count)
        .map(|i| Sample::new(Point3::new(i as f64, 0.0, 0.0), i as f64 / last))
        .collect();
    SampleBuffer::new(samples).expect("valid line samples")
}

/// Closed unit square: the last sample repeats the first.
///
/// ```text
/// 3 ---- 2
/// |      |
/// 0/4 -- 1
/// ```
pub(super) fn square_loop() -> SampleBuffer {
    let corners = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0],
    ];
    let samples = corners
        .iter()
        .enumerate()
        .map(|(i, c)| Sample::new(Point3::from_array(*c), i as f64 / 4.0))
        .collect();
    SampleBuffer::new(samples)
        .expect("valid square samples")
        .with_loop_samples(true)
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
