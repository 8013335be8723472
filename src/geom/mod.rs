mod buffer;
mod core;
mod diagnostics;
mod metrics;
mod sample;

pub use buffer::{
    ClippedRange, DEFAULT_CONTROL_POINTS, Direction, SampleBuffer, SampleMode, TravelResult,
};
pub use core::{
    Point3, Vec3, clamp01, inverse_lerp, lerp, project_on_segment, segment_parameter,
};
pub use diagnostics::{BufferDiagnostics, SampleBufferError};
pub use metrics::{EngineMetrics, TimingBucket, TimingReport};
pub use sample::Sample;

#[cfg(test)]
mod tests;
