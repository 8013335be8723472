//! Tick-driven cursor over a [`SampleBuffer`].
//!
//! The follower owns only its cursor, configuration, triggers and observers.
//! The buffer is borrowed per call so several followers can share one buffer
//! across threads.

use std::fmt;
use std::mem;

use serde::{Deserialize, Serialize};

use super::trigger::{Trigger, TriggerHit, check_triggers};
use super::wrap::{
    Boundary, BoundaryResolution, WrapMode, bound_ahead, bound_behind, reached_boundary,
    resolve_boundary,
};
use crate::geom::{
    DEFAULT_CONTROL_POINTS, Direction, EngineMetrics, Point3, Sample, SampleBuffer,
    TimingBucket, TimingReport, clamp01,
};

/// How a tick converts elapsed time into motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FollowMode {
    /// `speed` world units per second, measured along the sample chords.
    #[default]
    Uniform,
    /// `speed` local percent per second.
    Parametric,
    /// The whole clip window in `duration` seconds.
    Time,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowerConfig {
    /// Advance on every tick. When `false` ticks only seed the cursor.
    pub follow: bool,
    pub mode: FollowMode,
    pub wrap: WrapMode,
    pub speed: f64,
    pub duration: f64,
    /// Local percent the cursor starts from.
    pub start_percent: f64,
    /// Seed the first tick by projecting the anchor onto the buffer.
    pub auto_start: bool,
    pub direction: Direction,
    /// Control point count forwarded to [`SampleBuffer::project`].
    pub project_control_points: usize,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            follow: true,
            mode: FollowMode::Uniform,
            wrap: WrapMode::Clamp,
            speed: 1.0,
            duration: 1.0,
            start_percent: 0.0,
            auto_start: false,
            direction: Direction::Forward,
            project_control_points: DEFAULT_CONTROL_POINTS,
        }
    }
}

impl FollowerConfig {
    /// Clamps speed and duration to non-negative values and the start percent to `[0, 1]`.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.speed = non_negative(self.speed);
        self.duration = non_negative(self.duration);
        self.start_percent = finite_percent(self.start_percent);
        self.project_control_points = self.project_control_points.max(2);
        self
    }
}

/// Position of a follower in the clip window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cursor {
    /// Local percent.
    pub percent: f64,
    pub direction: Direction,
    /// Cleared until the first tick seeds the cursor.
    pub started: bool,
}

/// Everything that happened during one move.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TickReport {
    /// Evaluated pose. Its `percent` is global.
    pub sample: Sample,
    /// Local percent of the cursor after the move.
    pub percent: f64,
    pub direction: Direction,
    pub end_reached: bool,
    pub beginning_reached: bool,
    pub triggers: Vec<TriggerHit>,
}

type Observer = Box<dyn FnMut() + Send>;
type TriggerObserver = Box<dyn FnMut(&TriggerHit) + Send>;

pub struct SplineFollower {
    config: FollowerConfig,
    cursor: Cursor,
    anchor: Option<Point3>,
    sample: Sample,
    triggers: Vec<Trigger>,
    on_end_reached: Vec<Observer>,
    on_beginning_reached: Vec<Observer>,
    on_trigger: Vec<TriggerObserver>,
    metrics: EngineMetrics,
}

impl fmt::Debug for SplineFollower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplineFollower")
            .field("config", &self.config)
            .field("cursor", &self.cursor)
            .field("anchor", &self.anchor)
            .field("triggers", &self.triggers.len())
            .field("observers", &(self.on_end_reached.len() + self.on_beginning_reached.len()))
            .finish_non_exhaustive()
    }
}

impl Default for SplineFollower {
    fn default() -> Self {
        Self::new(FollowerConfig::default())
    }
}

impl SplineFollower {
    #[must_use]
    pub fn new(config: FollowerConfig) -> Self {
        let config = config.sanitized();
        let mut metrics = EngineMetrics::default();
        metrics.begin();
        Self {
            cursor: Cursor {
                percent: config.start_percent,
                direction: config.direction,
                started: false,
            },
            config,
            anchor: None,
            sample: Sample::default(),
            triggers: Vec::new(),
            on_end_reached: Vec::new(),
            on_beginning_reached: Vec::new(),
            on_trigger: Vec::new(),
            metrics,
        }
    }

    // ── configuration ───────────────────────────────────────────────────────

    #[must_use]
    pub const fn config(&self) -> &FollowerConfig {
        &self.config
    }

    /// Replaces the configuration. Before the first tick this also re-seeds
    /// the cursor percent and direction.
    pub fn set_config(&mut self, config: FollowerConfig) {
        self.config = config.sanitized();
        if !self.cursor.started {
            self.cursor.percent = self.config.start_percent;
            self.cursor.direction = self.config.direction;
        }
    }

    #[must_use]
    pub const fn anchor(&self) -> Option<Point3> {
        self.anchor
    }

    /// World position projected onto the buffer when `auto_start` is set.
    pub fn set_anchor(&mut self, anchor: Option<Point3>) {
        self.anchor = anchor;
    }

    // ── state ───────────────────────────────────────────────────────────────

    #[must_use]
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    #[must_use]
    pub const fn percent(&self) -> f64 {
        self.cursor.percent
    }

    #[must_use]
    pub fn global_percent(&self, buffer: &SampleBuffer) -> f64 {
        buffer.unclip_percent(self.cursor.percent)
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.cursor.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.cursor.direction = direction;
    }

    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.cursor.started
    }

    /// Pose produced by the latest move.
    #[must_use]
    pub const fn result(&self) -> &Sample {
        &self.sample
    }

    // ── triggers and observers ──────────────────────────────────────────────

    /// Adds a trigger, clamping its position into the window.
    pub fn add_trigger(&mut self, trigger: Trigger) {
        self.triggers.push(trigger.sanitized());
    }

    #[must_use]
    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    pub fn triggers_mut(&mut self) -> &mut Vec<Trigger> {
        &mut self.triggers
    }

    /// Re-arms every `work_once` trigger.
    pub fn reset_triggers(&mut self) {
        self.triggers.iter_mut().for_each(Trigger::reset);
    }

    pub fn on_end_reached(&mut self, observer: impl FnMut() + Send + 'static) {
        self.on_end_reached.push(Box::new(observer));
    }

    pub fn on_beginning_reached(&mut self, observer: impl FnMut() + Send + 'static) {
        self.on_beginning_reached.push(Box::new(observer));
    }

    pub fn on_trigger(&mut self, observer: impl FnMut(&TriggerHit) + Send + 'static) {
        self.on_trigger.push(Box::new(observer));
    }

    // ── metrics ─────────────────────────────────────────────────────────────

    /// Accumulated tick timings, or `None` without the `engine_metrics` feature.
    #[must_use]
    pub fn timing_report(&self) -> Option<TimingReport> {
        self.metrics.end()
    }

    pub fn reset_metrics(&mut self) {
        self.metrics.begin();
    }

    // ── motion ──────────────────────────────────────────────────────────────

    /// Advances the follower by `delta_time` seconds.
    ///
    /// The first tick seeds the cursor, from the projected anchor when
    /// `auto_start` is set, and then moves in the same tick.
    pub fn update(&mut self, buffer: &SampleBuffer, delta_time: f64) -> TickReport {
        let mut metrics = mem::take(&mut self.metrics);
        let report = metrics.time(TimingBucket::Tick, || self.tick(buffer, delta_time));
        self.metrics = metrics;
        report
    }

    fn tick(&mut self, buffer: &SampleBuffer, delta_time: f64) -> TickReport {
        if buffer.is_empty() {
            return self.stationary(buffer);
        }
        if !self.cursor.started {
            self.seed(buffer);
        }
        if !self.config.follow || !(delta_time > 0.0) {
            return self.stationary(buffer);
        }
        match self.config.mode {
            FollowMode::Uniform => self.move_distance(buffer, self.config.speed * delta_time),
            FollowMode::Parametric => self.move_percent(buffer, self.config.speed * delta_time),
            FollowMode::Time if self.config.duration > 0.0 => {
                self.move_percent(buffer, delta_time / self.config.duration)
            }
            FollowMode::Time => self.stationary(buffer),
        }
    }

    fn seed(&mut self, buffer: &SampleBuffer) {
        if self.config.auto_start {
            if let Some(anchor) = self.anchor {
                let projected = buffer.project(anchor, self.config.project_control_points);
                self.cursor.percent = buffer.clip_percent(projected.percent);
            }
        }
        self.cursor.started = true;
        self.sample = buffer.evaluate(self.cursor.percent);
        log::debug!("follower started at percent {:.4}", self.cursor.percent);
    }

    /// Clears the started flag and parks the cursor at `start_percent`.
    /// Direction, triggers and observers are kept.
    pub fn restart(&mut self, start_percent: f64) {
        self.cursor.started = false;
        self.cursor.percent = finite_percent(start_percent);
        self.config.start_percent = self.cursor.percent;
    }

    /// Moves the cursor to a local percent without checking triggers or firing events.
    pub fn set_percent(&mut self, buffer: &SampleBuffer, percent: f64) -> Sample {
        self.cursor.percent = finite_percent(percent);
        self.sample = buffer.evaluate(self.cursor.percent);
        self.sample
    }

    /// Moves the cursor `distance` world units from the start of the window.
    pub fn set_distance(&mut self, buffer: &SampleBuffer, distance: f64) -> Sample {
        let (percent, _) = travel_local(buffer, 0.0, distance, Direction::Forward);
        self.set_percent(buffer, percent)
    }

    /// Moves by `delta` local percent in the current direction.
    pub fn move_percent(&mut self, buffer: &SampleBuffer, delta: f64) -> TickReport {
        if buffer.count() <= 1 || delta == 0.0 || !delta.is_finite() {
            return self.stationary(buffer);
        }
        let start = self.cursor.percent;
        let direction = self.cursor.direction;
        let proposed = start + delta * direction.sign();
        let resolution = resolve_boundary(self.config.wrap, start, proposed, direction);
        self.apply(buffer, resolution)
    }

    /// Moves `distance` world units along the buffer in the current direction.
    ///
    /// Distance left over at a bound is carried: a looping follower continues
    /// from the opposite bound, a ping-pong follower travels back.
    pub fn move_distance(&mut self, buffer: &SampleBuffer, distance: f64) -> TickReport {
        if buffer.count() <= 1 || !(distance > 0.0) || !distance.is_finite() {
            return self.stationary(buffer);
        }
        let start = self.cursor.percent;
        let direction = self.cursor.direction;
        let bound = bound_ahead(direction);

        let (percent, moved) = travel_local(buffer, start, distance, direction);
        let remainder = distance - moved;
        if remainder <= 0.0 && percent != bound {
            return self.apply(buffer, BoundaryResolution::inside(start, percent, direction));
        }

        let reached = reached_boundary(start, direction);
        let mut segments = vec![(start, bound)];
        let (percent, direction) = match self.config.wrap {
            WrapMode::Loop if remainder > 0.0 => {
                let restart = bound_behind(direction);
                let (percent, _) = travel_local(buffer, restart, remainder, direction);
                segments.push((restart, percent));
                (percent, direction)
            }
            WrapMode::Clamp | WrapMode::Loop => (bound, direction),
            WrapMode::PingPong => {
                let flipped = direction.flipped();
                let (percent, _) = travel_local(buffer, bound, remainder, flipped);
                segments.push((bound, percent));
                (percent, flipped)
            }
        };

        self.apply(
            buffer,
            BoundaryResolution {
                percent,
                direction,
                reached,
                segments,
            },
        )
    }

    /// Commits a resolved move: evaluates the pose, checks triggers and notifies observers.
    fn apply(&mut self, buffer: &SampleBuffer, resolution: BoundaryResolution) -> TickReport {
        self.cursor.percent = resolution.percent;
        self.cursor.direction = resolution.direction;
        self.sample = buffer.evaluate(resolution.percent);

        let mut hits = Vec::new();
        for &(from, to) in &resolution.segments {
            check_triggers(&mut self.triggers, from, to, &mut hits);
        }

        let end_reached = resolution.reached == Some(Boundary::End);
        let beginning_reached = resolution.reached == Some(Boundary::Beginning);
        if end_reached {
            log::debug!("follower reached the end, now at {:.4}", resolution.percent);
            self.on_end_reached.iter_mut().for_each(|observer| observer());
        } else if beginning_reached {
            log::debug!("follower reached the beginning, now at {:.4}", resolution.percent);
            self.on_beginning_reached.iter_mut().for_each(|observer| observer());
        }
        for hit in &hits {
            for observer in &mut self.on_trigger {
                observer(hit);
            }
        }

        TickReport {
            sample: self.sample,
            percent: self.cursor.percent,
            direction: self.cursor.direction,
            end_reached,
            beginning_reached,
            triggers: hits,
        }
    }

    fn stationary(&mut self, buffer: &SampleBuffer) -> TickReport {
        self.sample = buffer.evaluate(self.cursor.percent);
        TickReport {
            sample: self.sample,
            percent: self.cursor.percent,
            direction: self.cursor.direction,
            ..TickReport::default()
        }
    }
}

/// Arc-length travel in local percent space.
///
/// A walk that stops short of `distance` ended on the window bound ahead. The
/// bound is reported directly because a full looped window maps its end back
/// to local `0.0`.
fn travel_local(buffer: &SampleBuffer, start: f64, distance: f64, direction: Direction) -> (f64, f64) {
    if !(distance > 0.0) {
        return (start, 0.0);
    }
    let result = buffer.travel(start, distance, direction);
    let bound_global = match direction {
        Direction::Forward => buffer.clip_to(),
        Direction::Backward => buffer.clip_from(),
    };
    let percent = if result.moved < distance || result.percent == bound_global {
        bound_ahead(direction)
    } else {
        buffer.clip_percent(result.percent)
    };
    (percent, result.moved)
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

fn finite_percent(value: f64) -> f64 {
    if value.is_finite() { clamp01(value) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::tracer::TriggerKind;

    fn line(count: usize) -> SampleBuffer {
        let last = (count - 1) as f64;
        let samples = (0..count)
            .map(|i| Sample::new(Point3::new(i as f64, 0.0, 0.0), i as f64 / last))
            .collect();
        SampleBuffer::new(samples).unwrap()
    }

    fn follower(mode: FollowMode, wrap: WrapMode) -> SplineFollower {
        SplineFollower::new(FollowerConfig {
            mode,
            wrap,
            ..FollowerConfig::default()
        })
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn clamp_fires_end_once() {
        let buffer = line(5);
        let mut f = follower(FollowMode::Parametric, WrapMode::Clamp);
        let ends = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ends);
        f.on_end_reached(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut reports = Vec::new();
        for _ in 0..5 {
            reports.push(f.update(&buffer, 0.4));
        }
        assert_eq!(f.percent(), 1.0);
        assert_eq!(ends.load(Ordering::SeqCst), 1);
        assert_eq!(reports.iter().filter(|r| r.end_reached).count(), 1);
        assert!(reports[2].end_reached);
    }

    #[test]
    fn out_of_window_trigger_is_clamped_and_fires_at_the_end() {
        let buffer = line(5);
        let mut f = follower(FollowMode::Parametric, WrapMode::Clamp);
        f.add_trigger(Trigger {
            name: "finish".to_string(),
            position: 1.5,
            kind: TriggerKind::Forward,
            ..Trigger::default()
        });
        assert_eq!(f.triggers()[0].position, 1.0);

        let hits: Vec<usize> = (0..4)
            .map(|_| f.update(&buffer, 0.4).triggers.len())
            .collect();
        assert_eq!(hits, vec![0, 0, 1, 0]);
    }

    #[test]
    fn backward_clamp_fires_beginning() {
        let buffer = line(5);
        let mut f = SplineFollower::new(FollowerConfig {
            mode: FollowMode::Parametric,
            start_percent: 0.3,
            direction: Direction::Backward,
            ..FollowerConfig::default()
        });
        let report = f.update(&buffer, 0.5);
        assert!(report.beginning_reached);
        assert!(!report.end_reached);
        assert_eq!(report.percent, 0.0);
        assert!(!f.update(&buffer, 0.5).beginning_reached);
    }

    #[test]
    fn ping_pong_round_trip() {
        let buffer = line(5);
        let mut f = SplineFollower::new(FollowerConfig {
            mode: FollowMode::Parametric,
            wrap: WrapMode::PingPong,
            start_percent: 0.9,
            ..FollowerConfig::default()
        });
        let report = f.update(&buffer, 0.2);
        assert!(close(report.percent, 0.9));
        assert_eq!(report.direction, Direction::Backward);
        assert!(report.end_reached);

        let back = f.update(&buffer, 0.2);
        assert!(close(back.percent, 0.7));
        assert_eq!(back.direction, Direction::Backward);
    }

    #[test]
    fn loop_checks_triggers_before_wrapping() {
        let buffer = line(5);
        let mut f = SplineFollower::new(FollowerConfig {
            mode: FollowMode::Parametric,
            wrap: WrapMode::Loop,
            start_percent: 0.9,
            ..FollowerConfig::default()
        });
        f.add_trigger(Trigger::new("late", 0.97, TriggerKind::Forward));
        f.add_trigger(Trigger::new("early", 0.05, TriggerKind::Forward));
        f.add_trigger(Trigger::new("missed", 0.5, TriggerKind::Double));

        let report = f.update(&buffer, 0.2);
        assert!(close(report.percent, 0.1));
        assert_eq!(report.direction, Direction::Forward);
        assert!(report.end_reached);
        let names: Vec<&str> = report.triggers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["late", "early"]);
    }

    #[test]
    fn time_mode_divides_by_duration() {
        let buffer = line(5);
        let mut f = SplineFollower::new(FollowerConfig {
            mode: FollowMode::Time,
            duration: 2.0,
            ..FollowerConfig::default()
        });
        assert!(close(f.update(&buffer, 0.5).percent, 0.25));

        let mut idle = SplineFollower::new(FollowerConfig {
            mode: FollowMode::Time,
            duration: 0.0,
            start_percent: 0.4,
            ..FollowerConfig::default()
        });
        let report = idle.update(&buffer, 1.0);
        assert_eq!(report.percent, 0.4);
        assert!(report.triggers.is_empty() && !report.end_reached);
    }

    #[test]
    fn uniform_mode_travels_world_distance() {
        let buffer = line(5);
        let mut f = follower(FollowMode::Uniform, WrapMode::Clamp);
        let report = f.update(&buffer, 1.0);
        assert!(close(report.percent, 0.25));
        assert!(close(report.sample.position.x, 1.0));

        let report = f.update(&buffer, 10.0);
        assert_eq!(report.percent, 1.0);
        assert!(report.end_reached);
    }

    #[test]
    fn uniform_loop_carries_the_remainder() {
        let buffer = line(5);
        let mut f = SplineFollower::new(FollowerConfig {
            wrap: WrapMode::Loop,
            start_percent: 0.9,
            ..FollowerConfig::default()
        });
        let report = f.update(&buffer, 1.0);
        assert!(close(report.percent, 0.15));
        assert!(report.end_reached);
        assert_eq!(report.direction, Direction::Forward);
    }

    #[test]
    fn uniform_ping_pong_travels_back() {
        let buffer = line(5);
        let mut f = SplineFollower::new(FollowerConfig {
            wrap: WrapMode::PingPong,
            start_percent: 0.9,
            ..FollowerConfig::default()
        });
        let report = f.update(&buffer, 1.0);
        assert!(close(report.percent, 0.85));
        assert_eq!(report.direction, Direction::Backward);
    }

    #[test]
    fn auto_start_projects_the_anchor() {
        let buffer = line(5);
        let mut f = SplineFollower::new(FollowerConfig {
            follow: false,
            auto_start: true,
            ..FollowerConfig::default()
        });
        f.set_anchor(Some(Point3::new(2.2, 1.0, 0.0)));
        let report = f.update(&buffer, 0.1);
        assert!(f.is_started());
        assert!(close(report.percent, 0.55));
        assert!(close(f.result().position.x, 2.2));
    }

    #[test]
    fn restart_reseeds_and_keeps_direction() {
        let buffer = line(5);
        let mut f = SplineFollower::new(FollowerConfig {
            mode: FollowMode::Parametric,
            ..FollowerConfig::default()
        });
        f.update(&buffer, 0.5);
        f.set_direction(Direction::Backward);
        f.restart(0.75);
        assert!(!f.is_started());
        let report = f.update(&buffer, 0.25);
        assert!(close(report.percent, 0.5));
        assert_eq!(report.direction, Direction::Backward);
    }

    #[test]
    fn set_distance_reaches_end_of_full_loop() {
        let corners = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]];
        let samples = corners
            .iter()
            .enumerate()
            .map(|(i, c)| Sample::new(Point3::new(c[0], c[1], 0.0), i as f64 / 4.0))
            .collect();
        let buffer = SampleBuffer::new(samples)
            .unwrap()
            .with_loop_samples(true)
            .with_clip_range(0.0, 0.0);

        let mut f = SplineFollower::default();
        f.set_distance(&buffer, 4.0);
        assert_eq!(f.percent(), 1.0);
        f.set_distance(&buffer, 1.0);
        assert!(close(f.percent(), 0.25));
    }

    #[test]
    fn empty_buffer_ticks_are_no_ops() {
        let buffer = SampleBuffer::empty();
        let mut f = SplineFollower::default();
        let report = f.update(&buffer, 1.0);
        assert_eq!(report.sample, Sample::default());
        assert!(!f.is_started());
    }

    #[test]
    fn config_is_sanitized() {
        let config = FollowerConfig {
            speed: -3.0,
            duration: f64::NAN,
            start_percent: 4.0,
            project_control_points: 0,
            ..FollowerConfig::default()
        }
        .sanitized();
        assert_eq!(config.speed, 0.0);
        assert_eq!(config.duration, 0.0);
        assert_eq!(config.start_percent, 1.0);
        assert_eq!(config.project_control_points, 2);
    }
}
