#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;
pub mod tracer;

use std::fmt;

use geom::{
    Direction, EngineMetrics, Point3, Sample, SampleBuffer, SampleBufferError, SampleMode,
    TimingBucket, TimingReport, TravelResult,
};
use tracer::{FollowerConfig, SplineFollower, TickReport, Trigger};
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// Public entry point for consumers: one sample buffer and one follower over it.
#[wasm_bindgen]
pub struct Engine {
    buffer: SampleBuffer,
    follower: SplineFollower,
    metrics: EngineMetrics,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Engine {
        let mut metrics = EngineMetrics::default();
        metrics.begin();
        Engine {
            buffer: SampleBuffer::empty(),
            follower: SplineFollower::default(),
            metrics,
        }
    }

    /// Whether a non-empty sample buffer has been loaded.
    #[wasm_bindgen]
    pub fn is_loaded(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Replace the samples. Expects an array of `Sample` objects ordered by percent.
    #[wasm_bindgen]
    pub fn load_samples(&mut self, samples: JsValue) -> Result<(), JsValue> {
        let samples: Vec<Sample> = serde_wasm_bindgen::from_value(samples).map_err(to_js_error)?;
        self.load_sample_list(samples).map_err(to_js_error)
    }

    /// Install an optimized index table for the loaded samples.
    #[wasm_bindgen]
    pub fn load_optimized_indices(&mut self, indices: Vec<u32>) -> Result<(), JsValue> {
        let indices = indices.into_iter().map(|index| index as usize).collect();
        self.buffer
            .set_optimized_indices(indices)
            .map_err(to_js_error)
    }

    /// Switch addressing mode: `"Direct"`, `"Uniform"` or `"Optimized"`.
    #[wasm_bindgen]
    pub fn set_sample_mode(&mut self, mode: JsValue) -> Result<(), JsValue> {
        let mode: SampleMode = serde_wasm_bindgen::from_value(mode).map_err(to_js_error)?;
        self.buffer.set_mode(mode);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn set_clip_range(&mut self, from: f64, to: f64) {
        self.buffer.set_clip_range(from, to);
    }

    #[wasm_bindgen]
    pub fn set_loop_samples(&mut self, loop_samples: bool) {
        self.buffer.set_loop_samples(loop_samples);
    }

    /// Evaluate the buffer at a local percent.
    #[wasm_bindgen]
    pub fn evaluate(&mut self, percent: f64) -> Result<JsValue, JsValue> {
        let sample = self.evaluate_sample(percent);
        serde_wasm_bindgen::to_value(&sample).map_err(to_js_error)
    }

    /// Nearest point on the buffer.
    #[wasm_bindgen]
    pub fn project(&mut self, x: f64, y: f64, z: f64, control_points: u32) -> Result<JsValue, JsValue> {
        let sample = self.project_point(Point3::new(x, y, z), control_points as usize);
        serde_wasm_bindgen::to_value(&sample).map_err(to_js_error)
    }

    /// Arc-length travel from a local percent. Returns `{ percent, moved }`.
    #[wasm_bindgen]
    pub fn travel(&mut self, start: f64, distance: f64, backward: bool) -> Result<JsValue, JsValue> {
        let direction = if backward {
            Direction::Backward
        } else {
            Direction::Forward
        };
        let result = self.travel_from(start, distance, direction);
        serde_wasm_bindgen::to_value(&result).map_err(to_js_error)
    }

    /// Chord length of the clip window.
    #[wasm_bindgen]
    pub fn length(&mut self) -> f64 {
        let buffer = &self.buffer;
        self.metrics.time(TimingBucket::Length, || buffer.length())
    }

    /// One-line summary of the buffer shape.
    #[wasm_bindgen]
    pub fn diagnostics(&self) -> String {
        self.buffer.diagnostics().summary()
    }

    /// Replace the follower configuration (`FollowerConfig` object, missing fields default).
    #[wasm_bindgen]
    pub fn configure_follower(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config: FollowerConfig = serde_wasm_bindgen::from_value(config).map_err(to_js_error)?;
        self.follower.set_config(config);
        Ok(())
    }

    /// World position used to seed the follower when `auto_start` is set.
    #[wasm_bindgen]
    pub fn set_anchor(&mut self, x: f64, y: f64, z: f64) {
        self.follower.set_anchor(Some(Point3::new(x, y, z)));
    }

    #[wasm_bindgen]
    pub fn add_trigger(&mut self, trigger: JsValue) -> Result<(), JsValue> {
        let trigger: Trigger = serde_wasm_bindgen::from_value(trigger).map_err(to_js_error)?;
        self.follower.add_trigger(trigger);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn restart(&mut self, start_percent: f64) {
        self.follower.restart(start_percent);
    }

    /// Advance the follower by `delta_time` seconds and return the tick report.
    #[wasm_bindgen]
    pub fn tick(&mut self, delta_time: f64) -> Result<JsValue, JsValue> {
        let report = self.tick_follower(delta_time);
        serde_wasm_bindgen::to_value(&report).map_err(to_js_error)
    }

    /// Accumulated query and tick timings, `null` without the `engine_metrics` feature.
    #[wasm_bindgen]
    pub fn timing_report(&self) -> Result<JsValue, JsValue> {
        let report = self.timings();
        serde_wasm_bindgen::to_value(&report).map_err(to_js_error)
    }
}

impl Engine {
    /// Native counterpart of [`Engine::load_samples`].
    pub fn load_sample_list(&mut self, samples: Vec<Sample>) -> Result<(), SampleBufferError> {
        self.buffer.set_samples(samples)?;
        debug_log!("loaded samples: {}", self.buffer.diagnostics().summary());
        Ok(())
    }

    #[must_use]
    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut SampleBuffer {
        &mut self.buffer
    }

    #[must_use]
    pub fn follower(&self) -> &SplineFollower {
        &self.follower
    }

    pub fn follower_mut(&mut self) -> &mut SplineFollower {
        &mut self.follower
    }

    pub fn evaluate_sample(&mut self, percent: f64) -> Sample {
        let buffer = &self.buffer;
        self.metrics.time(TimingBucket::Evaluate, || buffer.evaluate(percent))
    }

    pub fn project_point(&mut self, point: Point3, control_points: usize) -> Sample {
        let buffer = &self.buffer;
        self.metrics
            .time(TimingBucket::Projection, || buffer.project(point, control_points))
    }

    pub fn travel_from(&mut self, start: f64, distance: f64, direction: Direction) -> TravelResult {
        let buffer = &self.buffer;
        self.metrics
            .time(TimingBucket::Travel, || buffer.travel(start, distance, direction))
    }

    pub fn tick_follower(&mut self, delta_time: f64) -> TickReport {
        self.follower.update(&self.buffer, delta_time)
    }

    /// Query timings merged with the follower's tick time. `None` when timing is compiled out.
    #[must_use]
    pub fn timings(&self) -> Option<TimingReport> {
        let mut report = self.metrics.end()?;
        if let Some(ticks) = self.follower.timing_report() {
            report.tick_ns = ticks.tick_ns;
            report.calls = report.calls.saturating_add(ticks.calls);
        }
        Some(report)
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
