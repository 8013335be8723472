use spline_engine::Engine;
use spline_engine::geom::{Direction, Point3, Sample, SampleBuffer, SampleBufferError, Vec3};
use spline_engine::tracer::{
    FollowMode, FollowerConfig, SplineFollower, Trigger, TriggerKind, WrapMode,
};

fn line_samples(count: usize, length: f64) -> Vec<Sample> {
    let last = (count - 1) as f64;
    (0..count)
        .map(|i| {
            let t = i as f64 / last;
            Sample::new(Point3::new(t * length, 0.0, 0.0), t).with_frame(Vec3::X, Vec3::Z)
        })
        .collect()
}

fn circle_buffer(count: usize, radius: f64) -> SampleBuffer {
    let last = (count - 1) as f64;
    let samples = (0..count)
        .map(|i| {
            let t = i as f64 / last;
            let (sin, cos) = (t * std::f64::consts::TAU).sin_cos();
            Sample::new(Point3::new(radius * cos, radius * sin, 0.0), t)
        })
        .collect();
    SampleBuffer::new(samples)
        .expect("valid circle samples")
        .with_loop_samples(true)
        .with_clip_range(0.0, 0.0)
}

#[test]
fn engine_starts_empty() {
    let mut engine = Engine::new();
    assert!(!engine.is_loaded());
    assert_eq!(engine.evaluate_sample(0.5), Sample::default());
    let report = engine.tick_follower(0.1);
    assert_eq!(report.sample, Sample::default());
}

#[test]
fn engine_rejects_unordered_samples() {
    let mut engine = Engine::new();
    let mut samples = line_samples(4, 3.0);
    samples.swap(1, 2);
    let err = engine.load_sample_list(samples).unwrap_err();
    assert!(matches!(err, SampleBufferError::DecreasingPercent { index: 2, .. }));
    assert!(!engine.is_loaded());
}

#[test]
fn engine_queries_loaded_buffer() {
    let mut engine = Engine::new();
    engine.load_sample_list(line_samples(5, 4.0)).expect("load samples");
    assert!(engine.is_loaded());

    assert_eq!(engine.evaluate_sample(0.5).position, Point3::new(2.0, 0.0, 0.0));
    let projected = engine.project_point(Point3::new(3.0, 0.5, 0.0), 4);
    assert!(projected.percent > 0.5 && projected.percent < 1.0);

    let travel = engine.travel_from(0.0, 10.0, Direction::Forward);
    assert_eq!(travel.percent, 1.0);
    assert!(travel.moved < 10.0);
    assert!((engine.length() - 4.0).abs() < 1e-9);
}

#[test]
fn engine_clip_window_survives_reload() {
    let mut engine = Engine::new();
    engine.set_clip_range(0.25, 0.75);
    engine.load_sample_list(line_samples(5, 4.0)).expect("load samples");
    assert_eq!(engine.evaluate_sample(0.0).position, Point3::new(1.0, 0.0, 0.0));
    assert_eq!(engine.buffer().clip_to(), 0.75);
}

#[test]
fn clamp_follower_reports_end_once_through_engine() {
    let mut engine = Engine::new();
    engine.load_sample_list(line_samples(5, 4.0)).expect("load samples");
    engine.follower_mut().set_config(FollowerConfig {
        mode: FollowMode::Uniform,
        wrap: WrapMode::Clamp,
        speed: 3.0,
        ..FollowerConfig::default()
    });

    let reports: Vec<_> = (0..6).map(|_| engine.tick_follower(0.5)).collect();
    let ends = reports.iter().filter(|r| r.end_reached).count();
    assert_eq!(ends, 1);
    assert_eq!(reports.last().map(|r| r.percent), Some(1.0));
    assert_eq!(reports.last().map(|r| r.sample.position), Some(Point3::new(4.0, 0.0, 0.0)));
}

#[test]
fn looping_follower_fires_trigger_every_lap() {
    let buffer = circle_buffer(65, 1.0);
    let mut follower = SplineFollower::new(FollowerConfig {
        mode: FollowMode::Time,
        wrap: WrapMode::Loop,
        duration: 1.0,
        ..FollowerConfig::default()
    });
    follower.add_trigger(Trigger::new("start_line", 0.95, TriggerKind::Forward));

    let mut laps = 0;
    let mut hits = 0;
    for _ in 0..24 {
        let report = follower.update(&buffer, 0.125);
        laps += usize::from(report.end_reached);
        hits += report.triggers.len();
        assert!((0.0..=1.0).contains(&report.percent));
    }
    assert_eq!(laps, 3);
    assert_eq!(hits, 3);
}

#[test]
fn followers_share_a_buffer_across_threads() {
    let buffer = circle_buffer(129, 3.0);
    let config = FollowerConfig {
        mode: FollowMode::Uniform,
        wrap: WrapMode::PingPong,
        speed: 5.0,
        ..FollowerConfig::default()
    };

    let run = |start: f64| {
        let mut follower = SplineFollower::new(FollowerConfig {
            start_percent: start,
            ..config.clone()
        });
        (0..50)
            .map(|_| follower.update(&buffer, 0.05).percent)
            .collect::<Vec<f64>>()
    };

    let starts = [0.0, 0.25, 0.5, 0.75];
    let threaded: Vec<Vec<f64>> = std::thread::scope(|scope| {
        let handles: Vec<_> = starts.iter().map(|&s| scope.spawn(move || run(s))).collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("follower thread"))
            .collect()
    });
    let sequential: Vec<Vec<f64>> = starts.iter().map(|&s| run(s)).collect();
    assert_eq!(threaded, sequential);
}

#[test]
fn ping_pong_returns_along_the_same_path() {
    let buffer = SampleBuffer::new(line_samples(11, 10.0)).expect("valid line");
    let mut follower = SplineFollower::new(FollowerConfig {
        mode: FollowMode::Uniform,
        wrap: WrapMode::PingPong,
        speed: 3.0,
        start_percent: 0.5,
        ..FollowerConfig::default()
    });

    let first = follower.update(&buffer, 1.0);
    assert!((first.percent - 0.8).abs() < 1e-9);
    let bounce = follower.update(&buffer, 1.0);
    assert!((bounce.percent - 0.9).abs() < 1e-9);
    assert_eq!(bounce.direction, Direction::Backward);
    assert!(bounce.end_reached);
    let back = follower.update(&buffer, 1.0);
    assert!((back.percent - 0.6).abs() < 1e-9);
}

#[test]
fn timings_follow_the_metrics_feature() {
    let mut engine = Engine::new();
    engine.load_sample_list(line_samples(5, 4.0)).expect("load samples");
    let _ = engine.evaluate_sample(0.3);
    let _ = engine.tick_follower(0.1);

    let timings = engine.timings();
    if cfg!(feature = "engine_metrics") {
        let timings = timings.expect("metrics enabled");
        assert_eq!(timings.calls, 2);
    } else {
        assert!(timings.is_none());
    }
}
