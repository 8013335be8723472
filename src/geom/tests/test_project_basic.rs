//! Tests for nearest-point projection.

use super::{assert_close, line_buffer, square_loop};
use crate::geom::{DEFAULT_CONTROL_POINTS, Point3, Sample, SampleBuffer, SampleMode};

#[test]
fn projection_near_a_sample_lands_on_it() {
    let buffer = line_buffer(5);
    let result = buffer.project(Point3::new(3.0, 0.5, 0.0), DEFAULT_CONTROL_POINTS);
    assert!(result.percent > 0.5 && result.percent < 1.0);
    assert_close(result.percent, 0.75);
    assert_eq!(result.position, Point3::new(3.0, 0.0, 0.0));
}

#[test]
fn projection_between_samples_interpolates() {
    let buffer = line_buffer(5);
    let result = buffer.project(Point3::new(1.5, 1.0, 0.0), DEFAULT_CONTROL_POINTS);
    assert_close(result.percent, 0.375);
    assert_close(result.position.x, 1.5);
}

#[test]
fn projection_beyond_the_ends_clamps() {
    let buffer = line_buffer(5);
    let before = buffer.project(Point3::new(-3.0, 0.0, 0.0), DEFAULT_CONTROL_POINTS);
    assert_close(before.percent, 0.0);
    let after = buffer.project(Point3::new(9.0, 2.0, 0.0), DEFAULT_CONTROL_POINTS);
    assert_close(after.percent, 1.0);
}

#[test]
fn coarse_stride_still_finds_the_nearest_region() {
    // 101 samples with a single control-point segment: the coarse pass
    // strides over many samples before the fine pass narrows it down.
    let buffer = line_buffer(101);
    let result = buffer.project(Point3::new(37.25, -0.5, 0.0), 2);
    assert_close(result.percent, 0.3725);
}

#[test]
fn projection_range_stays_inside_the_range() {
    let buffer = line_buffer(5);
    let result = buffer.project_range(Point3::new(4.0, 0.0, 0.0), DEFAULT_CONTROL_POINTS, 0.0, 0.5);
    assert_close(result.percent, 0.5);

    let swapped = buffer.project_range(Point3::new(0.0, 0.0, 0.0), DEFAULT_CONTROL_POINTS, 0.75, 0.25);
    assert_close(swapped.percent, 0.25);
}

#[test]
fn uniform_mode_reports_index_based_percent() {
    let percents = [0.0, 0.1, 0.5, 0.9, 1.0];
    let samples = percents
        .iter()
        .enumerate()
        .map(|(i, &p)| Sample::new(Point3::new(i as f64, 0.0, 0.0), p))
        .collect();
    let buffer = SampleBuffer::new(samples).unwrap().with_mode(SampleMode::Uniform);

    let on_sample = buffer.project(Point3::new(3.0, 0.2, 0.0), DEFAULT_CONTROL_POINTS);
    assert_close(on_sample.percent, 0.75);

    let direct = buffer.clone().with_mode(SampleMode::Direct);
    assert_close(direct.project(Point3::new(3.0, 0.2, 0.0), DEFAULT_CONTROL_POINTS).percent, 0.9);
}

#[test]
fn looped_buffer_rechecks_the_seam() {
    let point = Point3::new(-0.1, 0.3, 0.0);

    let looped = square_loop();
    let result = looped.project(point, DEFAULT_CONTROL_POINTS);
    assert_close(result.percent, 0.925);
    assert_close(result.position.y, 0.3);

    let open = square_loop().with_loop_samples(false);
    assert_close(open.project(point, DEFAULT_CONTROL_POINTS).percent, 0.0);
}

#[test]
fn degenerate_buffers_project_to_defaults() {
    assert_eq!(
        SampleBuffer::empty().project(Point3::new(1.0, 2.0, 3.0), DEFAULT_CONTROL_POINTS),
        Sample::default()
    );
    let only = Sample::new(Point3::new(5.0, 0.0, 0.0), 0.0);
    let single = SampleBuffer::new(vec![only]).unwrap();
    assert_eq!(single.project(Point3::ORIGIN, DEFAULT_CONTROL_POINTS), only);
}

#[test]
fn project_many_matches_single_projection() {
    let buffer = square_loop();
    let points = [
        Point3::new(0.5, -0.2, 0.0),
        Point3::new(1.2, 0.5, 0.0),
        Point3::new(0.3, 1.1, 0.0),
        Point3::new(-0.1, 0.3, 0.0),
    ];
    let batch = buffer.project_many(&points, DEFAULT_CONTROL_POINTS);
    assert_eq!(batch.len(), points.len());
    for (point, sample) in points.iter().zip(&batch) {
        assert_eq!(*sample, buffer.project(*point, DEFAULT_CONTROL_POINTS));
    }
}
