//! Validation errors and soft diagnostics for sample buffers.
//!
//! Hard errors only happen while a buffer is being built: queries on a built
//! buffer never fail. Anything that is merely suspicious (zero-length segments,
//! an empty clip window) is reported through [`BufferDiagnostics`] instead.
//!
//! # Example
//!
//! ```ignore
//! use spline_engine::geom::SampleBuffer;
//!
//! let buffer = SampleBuffer::new(samples)?;
//! let diagnostics = buffer.diagnostics();
//! if !diagnostics.is_clean() {
//!     for warning in &diagnostics.warnings {
//!         log::warn!("{warning}");
//!     }
//! }
//! ```

use std::fmt;

/// Reasons a sample buffer cannot be built.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SampleBufferError {
    #[error("sample {index} contains non-finite values")]
    NonFiniteSample { index: usize },
    #[error("sample {index} has percent {percent} outside [0, 1]")]
    PercentOutOfRange { index: usize, percent: f64 },
    #[error("sample {index} has percent {percent} lower than the previous sample ({previous})")]
    DecreasingPercent {
        index: usize,
        percent: f64,
        previous: f64,
    },
    #[error("optimized index {value} at position {position} is out of range for {count} samples")]
    OptimizedIndexOutOfRange {
        position: usize,
        value: usize,
        count: usize,
    },
    #[error("optimized indices must be non-decreasing (position {position})")]
    OptimizedIndicesDecreasing { position: usize },
}

/// Soft diagnostics describing the shape of a sample buffer.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BufferDiagnostics {
    /// Number of samples in the buffer.
    pub sample_count: usize,

    /// Number of entries in the optimized index table.
    pub optimized_index_count: usize,

    /// Consecutive sample pairs sharing the same position.
    ///
    /// They are harmless for evaluation but contribute nothing to travel and
    /// make projection ambiguous.
    pub zero_length_segment_count: usize,

    /// Chord length of the whole buffer, ignoring the clip window.
    pub total_length: f64,

    /// Whether the clip window wraps through the seam.
    pub looped: bool,

    /// Global percent covered by the clip window.
    pub span: f64,

    /// Human-readable warnings.
    pub warnings: Vec<String>,
}

impl BufferDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no warnings were recorded and no segment is degenerate.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.zero_length_segment_count == 0 && self.warnings.is_empty()
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Returns a short summary string suitable for logging.
    ///
    /// Format: `"S:{samples} L:{length} [issues...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("S:{} L:{:.4}", self.sample_count, self.total_length)];
        if self.optimized_index_count > 0 {
            parts.push(format!("optimized:{}", self.optimized_index_count));
        }
        if self.looped {
            parts.push(format!("looped span:{:.4}", self.span));
        }
        if self.zero_length_segment_count > 0 {
            parts.push(format!("zero-length:{}", self.zero_length_segment_count));
        }
        parts.join(" ")
    }
}

impl fmt::Display for BufferDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sample Buffer Diagnostics:")?;
        writeln!(f, "  Samples: {}", self.sample_count)?;
        writeln!(f, "  Length: {:.6}", self.total_length)?;
        writeln!(f, "  Span: {:.6}{}", self.span, if self.looped { " (looped)" } else { "" })?;
        if self.optimized_index_count > 0 {
            writeln!(f, "  Optimized indices: {}", self.optimized_index_count)?;
        }
        if self.zero_length_segment_count > 0 {
            writeln!(f, "  Zero-length segments: {}", self.zero_length_segment_count)?;
        }
        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }
        Ok(())
    }
}
