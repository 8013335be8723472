//! Ordered sample buffer with a clip window.
//!
//! A [`SampleBuffer`] stores a pre-sampled curve and answers every query the
//! tracer needs: percent evaluation, arc-length travel, nearest-point projection
//! and chord length. Two parameter spaces are involved:
//!
//! - **global** percent addresses the full buffer (`Sample::percent`);
//! - **local** percent addresses the clip window, `0.0` at `clip_from` and `1.0`
//!   at `clip_to`, wrapping through the seam when the buffer is looped.
//!
//! Public queries take local percents unless the method name says otherwise and
//! return samples carrying global percents. None of the queries fail: an empty
//! buffer yields default samples and out-of-range inputs are clamped.

use serde::{Deserialize, Serialize};

use super::core::{
    Point3, clamp01, inverse_lerp, lerp, project_on_segment, segment_parameter,
};
use super::diagnostics::{BufferDiagnostics, SampleBufferError};
use super::sample::Sample;

/// Control point count used by [`SampleBuffer::project`] callers that have no
/// better estimate of the source curve.
pub const DEFAULT_CONTROL_POINTS: usize = 4;

/// Coarse projection probes per control-point segment.
const PROJECTION_PROBES_PER_SEGMENT: usize = 6;

/// Travel direction along the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }

    #[must_use]
    pub const fn is_forward(self) -> bool {
        matches!(self, Self::Forward)
    }

    /// `1.0` going forward, `-1.0` going backward.
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Backward => -1.0,
        }
    }
}

/// How a global percent is resolved to a sample index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleMode {
    /// Samples are evenly spaced in percent; the index is `percent * (count - 1)`.
    #[default]
    Direct,
    /// Samples are evenly spaced by arc length. Addressed like [`SampleMode::Direct`],
    /// but projection derives the result percent from the sample index.
    Uniform,
    /// Samples are curvature-adaptive and addressed through the optimized index table.
    Optimized,
}

/// Outcome of [`SampleBuffer::travel`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TravelResult {
    /// Global percent reached.
    pub percent: f64,
    /// Distance actually covered. Smaller than requested when a bound was hit.
    pub moved: f64,
}

impl TravelResult {
    const fn stationary(percent: f64) -> Self {
        Self { percent, moved: 0.0 }
    }
}

/// Sample range covered by the clip window, see [`SampleBuffer::clipped_sample_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClippedRange {
    pub count: usize,
    pub start_index: usize,
    pub end_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<Sample>,
    optimized_indices: Vec<usize>,
    mode: SampleMode,
    clip_from: f64,
    clip_to: f64,
    loop_samples: bool,
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

impl SampleBuffer {
    /// A buffer without samples. Every query on it returns a default result.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            samples: Vec::new(),
            optimized_indices: Vec::new(),
            mode: SampleMode::Direct,
            clip_from: 0.0,
            clip_to: 1.0,
            loop_samples: false,
        }
    }

    /// Builds a buffer from samples ordered by non-decreasing percent.
    pub fn new(samples: Vec<Sample>) -> Result<Self, SampleBufferError> {
        let mut buffer = Self::empty();
        buffer.set_samples(samples)?;
        Ok(buffer)
    }

    /// Replaces the sample sequence, keeping the clip window and loop flag.
    ///
    /// The optimized index table is dropped because it indexes the old samples.
    pub fn set_samples(&mut self, samples: Vec<Sample>) -> Result<(), SampleBufferError> {
        validate_samples(&samples)?;
        log::debug!("sample buffer rebuilt with {} samples", samples.len());
        self.samples = samples;
        self.optimized_indices.clear();
        if self.mode == SampleMode::Optimized {
            self.mode = SampleMode::Direct;
        }
        Ok(())
    }

    /// Installs an optimized index table and switches to [`SampleMode::Optimized`].
    pub fn with_optimized_indices(mut self, indices: Vec<usize>) -> Result<Self, SampleBufferError> {
        self.set_optimized_indices(indices)?;
        Ok(self)
    }

    pub fn set_optimized_indices(&mut self, indices: Vec<usize>) -> Result<(), SampleBufferError> {
        validate_optimized_indices(&indices, self.samples.len())?;
        log::debug!("installed optimized index table with {} entries", indices.len());
        self.optimized_indices = indices;
        self.mode = SampleMode::Optimized;
        Ok(())
    }

    #[must_use]
    pub fn with_mode(mut self, mode: SampleMode) -> Self {
        self.set_mode(mode);
        self
    }

    #[must_use]
    pub fn with_clip_range(mut self, from: f64, to: f64) -> Self {
        self.set_clip_range(from, to);
        self
    }

    #[must_use]
    pub fn with_loop_samples(mut self, loop_samples: bool) -> Self {
        self.loop_samples = loop_samples;
        self
    }

    // ── accessors ───────────────────────────────────────────────────────────

    #[must_use]
    pub fn count(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[must_use]
    pub fn sample(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    #[must_use]
    pub fn optimized_indices(&self) -> &[usize] {
        &self.optimized_indices
    }

    #[must_use]
    pub const fn mode(&self) -> SampleMode {
        self.mode
    }

    /// Optimized mode without an index table resolves like [`SampleMode::Direct`].
    pub fn set_mode(&mut self, mode: SampleMode) {
        self.mode = mode;
    }

    #[must_use]
    pub const fn clip_from(&self) -> f64 {
        self.clip_from
    }

    #[must_use]
    pub const fn clip_to(&self) -> f64 {
        self.clip_to
    }

    pub fn set_clip_from(&mut self, from: f64) {
        self.clip_from = sanitize_clip(from, self.clip_from);
    }

    pub fn set_clip_to(&mut self, to: f64) {
        self.clip_to = sanitize_clip(to, self.clip_to);
    }

    /// Sets both clip bounds. Values are clamped to `[0, 1]`; non-finite values are ignored.
    pub fn set_clip_range(&mut self, from: f64, to: f64) {
        self.set_clip_from(from);
        self.set_clip_to(to);
    }

    #[must_use]
    pub const fn loop_samples(&self) -> bool {
        self.loop_samples
    }

    pub fn set_loop_samples(&mut self, loop_samples: bool) {
        self.loop_samples = loop_samples;
    }

    /// The clip window wraps through the 1.0 → 0.0 seam.
    #[must_use]
    pub fn is_looped(&self) -> bool {
        self.loop_samples && self.clip_from >= self.clip_to
    }

    /// Global percent covered by the clip window.
    #[must_use]
    pub fn span(&self) -> f64 {
        if self.is_looped() {
            (1.0 - self.clip_from) + self.clip_to
        } else {
            self.clip_to - self.clip_from
        }
    }

    // ── percent mapping ─────────────────────────────────────────────────────

    /// Maps a global percent into the clip window.
    ///
    /// Inside a looped window, globals in the dead zone between `clip_to` and
    /// `clip_from` snap to `1.0` when they sit in the first half of that gap
    /// (closer to `clip_to`) and to `0.0` otherwise.
    #[must_use]
    pub fn clip_percent(&self, global: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let global = clamp01(global);
        if !self.is_looped() {
            return inverse_lerp(self.clip_from, self.clip_to, global);
        }

        let span = self.span();
        if global >= self.clip_from {
            inverse_lerp(self.clip_from, self.clip_from + span, global)
        } else if global <= self.clip_to {
            inverse_lerp(self.clip_to - span, self.clip_to, global)
        } else if inverse_lerp(self.clip_to, self.clip_from, global) < 0.5 {
            1.0
        } else {
            0.0
        }
    }

    /// Maps a local percent back to the full buffer. Exact at both window bounds.
    #[must_use]
    pub fn unclip_percent(&self, local: f64) -> f64 {
        let local = clamp01(local);
        if local == 0.0 {
            return self.clip_from;
        }
        if local == 1.0 {
            return self.clip_to;
        }
        if !self.is_looped() {
            return clamp01(lerp(self.clip_from, self.clip_to, local));
        }

        let span = self.span();
        if span <= 0.0 {
            return self.clip_from;
        }
        let from_share = (1.0 - self.clip_from) / span;
        let global = if local < from_share {
            lerp(self.clip_from, 1.0, local / from_share)
        } else {
            let to_share = self.clip_to / span;
            if to_share <= 0.0 {
                return 0.0;
            }
            lerp(0.0, self.clip_to, (local - from_share) / to_share)
        };
        clamp01(global)
    }

    // ── addressing ──────────────────────────────────────────────────────────

    /// Resolves a global percent to `(sample_index, lerp)`.
    ///
    /// `lerp` blends `samples[sample_index]` towards `samples[sample_index + 1]`
    /// and is zero on the last sample.
    #[must_use]
    pub fn sampling_values(&self, global: f64) -> (usize, f64) {
        let count = self.samples.len();
        if count == 0 {
            return (0, 0.0);
        }
        let percent = clamp01(global);
        match self.mode {
            SampleMode::Optimized if !self.optimized_indices.is_empty() => {
                self.optimized_sampling_values(percent)
            }
            _ => direct_sampling_values(percent, count),
        }
    }

    fn optimized_sampling_values(&self, percent: f64) -> (usize, f64) {
        let last = self.samples.len() - 1;
        let table_last = self.optimized_indices.len() - 1;
        if table_last == 0 {
            let index = self.optimized_indices[0].min(last);
            return (index, self.blend_towards_next(index, percent));
        }

        let index_value = percent * table_last as f64;
        let slot = (index_value.floor() as usize).min(table_last);
        let target = if slot < table_last {
            let slot_percent = slot as f64 / table_last as f64;
            let next_percent = (slot + 1) as f64 / table_last as f64;
            lerp(slot_percent, next_percent, index_value - slot as f64)
        } else {
            percent
        };

        // The table only marks where a slot starts; step to the samples that
        // actually bracket `target` before measuring the blend.
        let mut index = self.optimized_indices[slot].min(last);
        let stop = self
            .optimized_indices
            .get(slot + 1)
            .copied()
            .unwrap_or(last)
            .min(last);
        while index < stop && self.samples[index + 1].percent <= target {
            index += 1;
        }
        while index > 0 && self.samples[index].percent > target {
            index -= 1;
        }
        (index, self.blend_towards_next(index, target))
    }

    fn blend_towards_next(&self, index: usize, target: f64) -> f64 {
        match self.samples.get(index + 1) {
            Some(next) => inverse_lerp(self.samples[index].percent, next.percent, target),
            None => 0.0,
        }
    }

    /// Percent a sample would have on an evenly spaced buffer.
    #[must_use]
    pub fn uniform_percent(&self, index: usize) -> f64 {
        let count = self.samples.len();
        if count <= 1 {
            return 0.0;
        }
        index.min(count - 1) as f64 / (count - 1) as f64
    }

    /// Sample range touched by the clip window, counting both segments of a looped window.
    #[must_use]
    pub fn clipped_sample_count(&self) -> ClippedRange {
        let count = self.samples.len();
        if count == 0 {
            return ClippedRange::default();
        }
        let last = count - 1;
        let (start_index, end_index) = match self.mode {
            SampleMode::Direct => (
                ((last as f64 * self.clip_from).floor() as usize).min(last),
                ((last as f64 * self.clip_to).ceil() as usize).min(last),
            ),
            _ => {
                let (start, _) = self.sampling_values(self.clip_from);
                let (mut end, end_lerp) = self.sampling_values(self.clip_to);
                if end_lerp > 0.0 && end < last {
                    end += 1;
                }
                (start, end)
            }
        };

        let clipped = if self.is_looped() {
            (end_index + 1) + (count - start_index)
        } else {
            end_index.saturating_sub(start_index) + 1
        };
        ClippedRange {
            count: clipped,
            start_index,
            end_index,
        }
    }

    // ── evaluation ──────────────────────────────────────────────────────────

    /// Evaluates the buffer at a local percent.
    #[must_use]
    pub fn evaluate(&self, percent: f64) -> Sample {
        self.evaluate_global(self.unclip_percent(percent))
    }

    /// Evaluates the buffer at a global percent, ignoring the clip window.
    #[must_use]
    pub fn evaluate_global(&self, global: f64) -> Sample {
        if self.samples.is_empty() {
            return Sample::default();
        }
        let (index, t) = self.sampling_values(global);
        match self.samples.get(index + 1) {
            Some(next) if t > 0.0 => Sample::lerp(&self.samples[index], next, t),
            _ => self.samples[index],
        }
    }

    /// Position at a local percent.
    #[must_use]
    pub fn evaluate_position(&self, percent: f64) -> Point3 {
        self.evaluate_position_global(self.unclip_percent(percent))
    }

    #[must_use]
    pub fn evaluate_position_global(&self, global: f64) -> Point3 {
        if self.samples.is_empty() {
            return Point3::ORIGIN;
        }
        let (index, t) = self.sampling_values(global);
        match self.samples.get(index + 1) {
            Some(next) if t > 0.0 => self.samples[index].position.lerp(next.position, t),
            _ => self.samples[index].position,
        }
    }

    /// Samples covering the local range `[from, to]`.
    ///
    /// The first and last entries are evaluated exactly at the bounds; the
    /// samples strictly between them are copied. A range crossing the seam of a
    /// looped window is returned in travel order.
    #[must_use]
    pub fn evaluate_range(&self, from: f64, to: f64) -> Vec<Sample> {
        let mut out = Vec::new();
        if self.samples.is_empty() {
            return out;
        }
        for (a, b) in self.global_segments(from, to) {
            let (from_index, to_index) = self.bracket_indices(a, b);
            out.push(self.evaluate_global(a));
            out.extend_from_slice(&self.samples[(from_index + 1).min(to_index)..to_index]);
            out.push(self.evaluate_global(b));
        }
        out
    }

    /// Positions covering the local range `[from, to]`, see [`Self::evaluate_range`].
    #[must_use]
    pub fn evaluate_positions(&self, from: f64, to: f64) -> Vec<Point3> {
        let mut out = Vec::new();
        if self.samples.is_empty() {
            return out;
        }
        for (a, b) in self.global_segments(from, to) {
            let (from_index, to_index) = self.bracket_indices(a, b);
            out.push(self.evaluate_position_global(a));
            out.extend(
                self.samples[(from_index + 1).min(to_index)..to_index]
                    .iter()
                    .map(|s| s.position),
            );
            out.push(self.evaluate_position_global(b));
        }
        out
    }

    // ── length ──────────────────────────────────────────────────────────────

    /// Chord length of the local range `[from, to]`.
    #[must_use]
    pub fn calculate_length(&self, from: f64, to: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.global_segments(from, to)
            .into_iter()
            .map(|(a, b)| self.global_length(a, b))
            .sum()
    }

    /// Chord length of the whole clip window.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.calculate_length(0.0, 1.0)
    }

    /// Chord length of the full buffer, ignoring the clip window.
    #[must_use]
    pub fn total_length(&self) -> f64 {
        self.samples
            .windows(2)
            .map(|pair| pair[0].position.distance_to(pair[1].position))
            .sum()
    }

    fn global_length(&self, a: f64, b: f64) -> f64 {
        let (from_index, to_index) = self.bracket_indices(a, b);
        let mut position = self.evaluate_position_global(a);
        let mut length = 0.0;
        for sample in &self.samples[(from_index + 1).min(to_index)..to_index] {
            length += sample.position.distance_to(position);
            position = sample.position;
        }
        length + self.evaluate_position_global(b).distance_to(position)
    }

    /// Sample index at or before `a`, and the first sample at or after `b`.
    fn bracket_indices(&self, a: f64, b: f64) -> (usize, usize) {
        let last = self.samples.len() - 1;
        let (from_index, _) = self.sampling_values(a);
        let (mut to_index, to_lerp) = self.sampling_values(b);
        if to_lerp > 0.0 && to_index < last {
            to_index += 1;
        }
        (from_index, to_index.max(from_index))
    }

    /// Splits a local range into ascending global ranges, two when it crosses the seam.
    fn global_segments(&self, from: f64, to: f64) -> Vec<(f64, f64)> {
        let (from, to) = format_range(from, to);
        let a = self.unclip_percent(from);
        let b = self.unclip_percent(to);
        let crosses_seam = self.is_looped() && (a > b || (a == b && from < to));
        if crosses_seam {
            vec![(a, 1.0), (0.0, b)]
        } else {
            vec![(a.min(b), a.max(b))]
        }
    }

    // ── travel ──────────────────────────────────────────────────────────────

    /// Walks `distance` along the chords of the buffer from the local percent `start`.
    ///
    /// Returns the global percent reached and the distance covered. The walk
    /// stops at the clip window bounds; inside a looped window it wraps through
    /// the seam once. A zero distance returns the unclipped start untouched.
    #[must_use]
    pub fn travel(&self, start: f64, distance: f64, direction: Direction) -> TravelResult {
        let count = self.samples.len();
        if count == 0 {
            return TravelResult::default();
        }
        match direction {
            Direction::Forward if start >= 1.0 => return TravelResult::stationary(self.clip_to),
            Direction::Backward if start <= 0.0 => {
                return TravelResult::stationary(self.clip_from);
            }
            _ => {}
        }

        let start_global = self.unclip_percent(start);
        if !(distance > 0.0) {
            return TravelResult::stationary(start_global);
        }
        if count == 1 {
            return TravelResult::stationary(self.samples[0].percent);
        }
        self.travel_global(start_global, distance, direction)
    }

    fn travel_global(&self, start: f64, distance: f64, direction: Direction) -> TravelResult {
        let last = self.samples.len() - 1;
        let looped = self.is_looped();

        let mut last_position = self.evaluate_position_global(start);
        let mut last_percent = start;
        let (mut index, start_lerp) = self.sampling_values(start);
        if direction.is_forward() && start_lerp > 0.0 {
            index = (index + 1).min(last);
        }

        // Inside a looped window the bound only applies once the walk is on the
        // same side of the seam as that bound.
        let mut bounded = !looped
            || match direction {
                Direction::Forward => start < self.clip_from,
                Direction::Backward => start > self.clip_to,
            };
        let mut wrapped = false;
        let mut moved = 0.0;

        loop {
            let mut target_position = self.samples[index].position;
            let mut target_percent = self.samples[index].percent;
            let mut terminal = false;
            if bounded {
                let bound = match direction {
                    Direction::Forward if target_percent >= self.clip_to => Some(self.clip_to),
                    Direction::Backward if target_percent <= self.clip_from => Some(self.clip_from),
                    _ => None,
                };
                if let Some(bound) = bound {
                    if target_percent != bound {
                        target_position = self.evaluate_position_global(bound);
                        target_percent = bound;
                    }
                    terminal = true;
                }
            }

            let step = last_position.distance_to(target_position);
            moved += step;
            if moved >= distance {
                let excess = moved - distance;
                let fraction = if step > 0.0 { 1.0 - excess / step } else { 1.0 };
                return TravelResult {
                    percent: clamp01(lerp(last_percent, target_percent, fraction)),
                    moved: distance,
                };
            }

            last_position = target_position;
            last_percent = target_percent;
            if terminal {
                return TravelResult {
                    percent: last_percent,
                    moved,
                };
            }

            match direction {
                Direction::Forward if index == last => {
                    if !looped || wrapped {
                        return TravelResult {
                            percent: last_percent,
                            moved,
                        };
                    }
                    wrapped = true;
                    bounded = true;
                    last_position = self.samples[0].position;
                    last_percent = self.samples[0].percent;
                    index = 1;
                }
                Direction::Forward => index += 1,
                Direction::Backward if index == 0 => {
                    if !looped || wrapped {
                        return TravelResult {
                            percent: last_percent,
                            moved,
                        };
                    }
                    wrapped = true;
                    bounded = true;
                    last_position = self.samples[last].position;
                    last_percent = self.samples[last].percent;
                    index = last - 1;
                }
                Direction::Backward => index -= 1,
            }
        }
    }

    // ── projection ──────────────────────────────────────────────────────────

    /// Nearest point on the buffer to `point`.
    ///
    /// `control_point_count` is the number of control points of the source
    /// curve; it sizes the coarse pass at six probes per curve segment.
    #[must_use]
    pub fn project(&self, point: Point3, control_point_count: usize) -> Sample {
        self.project_range(point, control_point_count, 0.0, 1.0)
    }

    /// Nearest point restricted to the global range `[from, to]`.
    #[must_use]
    pub fn project_range(
        &self,
        point: Point3,
        control_point_count: usize,
        from: f64,
        to: f64,
    ) -> Sample {
        let count = self.samples.len();
        if count == 0 {
            return Sample::default();
        }
        if count == 1 {
            return self.samples[0];
        }
        let last = count - 1;
        let (from, to) = format_range(from, to);

        let probes = (control_point_count.saturating_sub(1) * PROJECTION_PROBES_PER_SEGMENT).max(1);
        let stride = (count / probes).max(1);
        let from_index = if from > 0.0 {
            self.sampling_values(from).0
        } else {
            0
        };
        let to_index = if to < 1.0 {
            let (index, t) = self.sampling_values(to);
            if t > 0.0 && index < last { index + 1 } else { index }
        } else {
            last
        }
        .max(from_index);

        // Coarse pass: find the neighbourhood of the closest probe.
        let mut best = f64::INFINITY;
        let mut check_from = from_index;
        let mut check_to = to_index;
        let mut i = from_index;
        loop {
            let dist = point.distance_squared_to(self.samples[i].position);
            if dist < best {
                best = dist;
                check_from = i.saturating_sub(stride).max(from_index);
                check_to = (i + stride).min(to_index);
            }
            if i >= to_index {
                break;
            }
            i = (i + stride).min(to_index);
        }

        // Fine pass over the neighbourhood.
        let mut index = check_from;
        let mut best = point.distance_squared_to(self.samples[check_from].position);
        for i in check_from + 1..=check_to {
            let dist = point.distance_squared_to(self.samples[i].position);
            if dist < best {
                best = dist;
                index = i;
            }
        }

        let mut result = self.project_around(point, index, from_index, to_index);

        if self.loop_samples && from == 0.0 && to == 1.0 && result.percent < self.samples[1].percent {
            let seam_end = self.samples[last].position;
            let seam_start = self.samples[last - 1].position;
            let projected = project_on_segment(seam_end, seam_start, point);
            if point.distance_squared_to(projected) < point.distance_squared_to(result.position) {
                let t = segment_parameter(seam_end, seam_start, point);
                result = self.blend_indices(last, last - 1, t);
            }
        }
        log::trace!("projected point onto percent {:.6}", result.percent);
        result
    }

    /// Projects `point` onto the segments around `index` inside `[lo, hi]` and keeps the nearer one.
    fn project_around(&self, point: Point3, index: usize, lo: usize, hi: usize) -> Sample {
        let back = index.saturating_sub(1).max(lo);
        let front = (index + 1).min(hi);
        let center = self.samples[index].position;

        let use_back = if back < index && index < front {
            let back_projection = project_on_segment(self.samples[back].position, center, point);
            let front_projection = project_on_segment(center, self.samples[front].position, point);
            point.distance_squared_to(back_projection) < point.distance_squared_to(front_projection)
        } else {
            back < index
        };

        if use_back {
            let t = segment_parameter(self.samples[back].position, center, point);
            self.blend_indices(back, index, t)
        } else {
            let t = segment_parameter(self.samples[front].position, center, point);
            self.blend_indices(front, index, t)
        }
    }

    fn blend_indices(&self, a: usize, b: usize, t: f64) -> Sample {
        let mut sample = Sample::lerp(&self.samples[a], &self.samples[b], t);
        if self.mode == SampleMode::Uniform {
            sample.percent = lerp(self.uniform_percent(a), self.uniform_percent(b), t);
        }
        sample
    }

    /// Projects many points at once. Runs on the rayon pool with the `parallel` feature.
    #[cfg(feature = "parallel")]
    #[must_use]
    pub fn project_many(&self, points: &[Point3], control_point_count: usize) -> Vec<Sample> {
        use rayon::prelude::*;
        points
            .par_iter()
            .map(|point| self.project(*point, control_point_count))
            .collect()
    }

    /// Projects many points at once. Runs on the rayon pool with the `parallel` feature.
    #[cfg(not(feature = "parallel"))]
    #[must_use]
    pub fn project_many(&self, points: &[Point3], control_point_count: usize) -> Vec<Sample> {
        points
            .iter()
            .map(|point| self.project(*point, control_point_count))
            .collect()
    }

    // ── diagnostics ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn diagnostics(&self) -> BufferDiagnostics {
        let mut diagnostics = BufferDiagnostics {
            sample_count: self.samples.len(),
            optimized_index_count: self.optimized_indices.len(),
            zero_length_segment_count: self
                .samples
                .windows(2)
                .filter(|pair| pair[0].position == pair[1].position)
                .count(),
            total_length: self.total_length(),
            looped: self.is_looped(),
            span: self.span(),
            warnings: Vec::new(),
        };
        if self.samples.is_empty() {
            diagnostics.add_warning("buffer has no samples");
        }
        if diagnostics.span <= 0.0 {
            diagnostics.add_warning(format!(
                "clip window [{}, {}] is empty",
                self.clip_from, self.clip_to
            ));
        }
        if self.mode == SampleMode::Optimized && self.optimized_indices.is_empty() {
            diagnostics.add_warning("optimized mode without an index table; using direct addressing");
        }
        diagnostics
    }
}

fn direct_sampling_values(percent: f64, count: usize) -> (usize, f64) {
    let last = count - 1;
    let scaled = percent * last as f64;
    let index = (scaled.floor() as usize).min(last);
    if index == last {
        (index, 0.0)
    } else {
        (index, scaled - index as f64)
    }
}

/// Clamps both bounds to `[0, 1]` and orders them.
fn format_range(from: f64, to: f64) -> (f64, f64) {
    let from = clamp01(from);
    let to = clamp01(to);
    if from > to { (to, from) } else { (from, to) }
}

fn sanitize_clip(value: f64, previous: f64) -> f64 {
    if !value.is_finite() {
        log::warn!("ignoring non-finite clip bound {value}");
        return previous;
    }
    let clamped = clamp01(value);
    if clamped != value {
        log::warn!("clip bound {value} clamped to {clamped}");
    }
    clamped
}

fn validate_samples(samples: &[Sample]) -> Result<(), SampleBufferError> {
    let mut previous = 0.0;
    for (index, sample) in samples.iter().enumerate() {
        if !sample.is_finite() {
            return Err(SampleBufferError::NonFiniteSample { index });
        }
        if !(0.0..=1.0).contains(&sample.percent) {
            return Err(SampleBufferError::PercentOutOfRange {
                index,
                percent: sample.percent,
            });
        }
        if index > 0 && sample.percent < previous {
            return Err(SampleBufferError::DecreasingPercent {
                index,
                percent: sample.percent,
                previous,
            });
        }
        previous = sample.percent;
    }
    Ok(())
}

fn validate_optimized_indices(indices: &[usize], count: usize) -> Result<(), SampleBufferError> {
    for (position, &value) in indices.iter().enumerate() {
        if value >= count {
            return Err(SampleBufferError::OptimizedIndexOutOfRange {
                position,
                value,
                count,
            });
        }
        if position > 0 && value < indices[position - 1] {
            return Err(SampleBufferError::OptimizedIndicesDecreasing { position });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(count: usize) -> SampleBuffer {
        let last = (count - 1) as f64;
        let samples = (0..count)
            .map(|i| Sample::new(Point3::new(i as f64, 0.0, 0.0), i as f64 / last))
            .collect();
        SampleBuffer::new(samples).unwrap()
    }

    #[test]
    fn direct_sampling_values_split_index_and_fraction() {
        let buffer = line(5);
        assert_eq!(buffer.sampling_values(0.0), (0, 0.0));
        assert_eq!(buffer.sampling_values(0.5), (2, 0.0));
        assert_eq!(buffer.sampling_values(1.0), (4, 0.0));
        let (index, t) = buffer.sampling_values(0.375);
        assert_eq!(index, 1);
        assert!((t - 0.5).abs() < 1e-12);
    }

    #[test]
    fn format_range_orders_and_clamps() {
        assert_eq!(format_range(0.8, 0.2), (0.2, 0.8));
        assert_eq!(format_range(-1.0, 2.0), (0.0, 1.0));
    }

    #[test]
    fn rejects_decreasing_percents() {
        let samples = vec![
            Sample::new(Point3::ORIGIN, 0.0),
            Sample::new(Point3::new(1.0, 0.0, 0.0), 0.6),
            Sample::new(Point3::new(2.0, 0.0, 0.0), 0.5),
        ];
        assert!(matches!(
            SampleBuffer::new(samples),
            Err(SampleBufferError::DecreasingPercent { index: 2, .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_optimized_indices() {
        let result = line(3).with_optimized_indices(vec![0, 1, 3]);
        assert!(matches!(
            result,
            Err(SampleBufferError::OptimizedIndexOutOfRange { position: 2, value: 3, count: 3 })
        ));
        assert!(matches!(
            line(3).with_optimized_indices(vec![0, 2, 1]),
            Err(SampleBufferError::OptimizedIndicesDecreasing { position: 2 })
        ));
        assert!(line(3).with_optimized_indices(vec![0, 0, 1, 2, 2]).is_ok());
    }

    #[test]
    fn clip_setters_clamp_and_ignore_nan() {
        let mut buffer = line(3);
        buffer.set_clip_range(-0.5, 1.5);
        assert_eq!((buffer.clip_from(), buffer.clip_to()), (0.0, 1.0));
        buffer.set_clip_from(f64::NAN);
        assert_eq!(buffer.clip_from(), 0.0);
    }

    #[test]
    fn direction_helpers() {
        assert_eq!(Direction::Forward.flipped(), Direction::Backward);
        assert_eq!(Direction::Backward.sign(), -1.0);
        assert!(Direction::default().is_forward());
    }
}
