//! Boundary policies for a cursor moving in local percent space.

use serde::{Deserialize, Serialize};

use crate::geom::{Direction, clamp01};

/// What happens when the cursor runs past either end of the clip window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WrapMode {
    /// Stop at the exceeded bound.
    #[default]
    Clamp,
    /// Re-enter from the opposite bound, keeping the direction.
    Loop,
    /// Reflect off the exceeded bound and reverse.
    PingPong,
}

/// A window bound reached by the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Boundary {
    /// Local percent 1.0 while moving forward.
    End,
    /// Local percent 0.0 while moving backward.
    Beginning,
}

/// Outcome of one boundary-resolved move.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundaryResolution {
    /// Resolved local percent, always inside `[0, 1]`.
    pub percent: f64,
    pub direction: Direction,
    /// Bound reached during the move, unless the cursor was already parked on it.
    pub reached: Option<Boundary>,
    /// Local percent segments swept by the move, in order. Triggers are checked
    /// against each of them, so nothing crossed before a wrap is skipped.
    pub segments: Vec<(f64, f64)>,
}

impl BoundaryResolution {
    /// A move that stays strictly inside the window.
    #[must_use]
    pub fn inside(start: f64, percent: f64, direction: Direction) -> Self {
        Self {
            percent,
            direction,
            reached: None,
            segments: vec![(start, percent)],
        }
    }
}

/// Bound faced when moving in `direction`.
#[must_use]
pub const fn bound_ahead(direction: Direction) -> f64 {
    match direction {
        Direction::Forward => 1.0,
        Direction::Backward => 0.0,
    }
}

/// Bound the cursor re-enters from after looping in `direction`.
#[must_use]
pub const fn bound_behind(direction: Direction) -> f64 {
    match direction {
        Direction::Forward => 0.0,
        Direction::Backward => 1.0,
    }
}

/// The bound `direction` is heading towards, if the cursor is not already parked on it.
#[must_use]
pub fn reached_boundary(start: f64, direction: Direction) -> Option<Boundary> {
    match direction {
        Direction::Forward if start < 1.0 => Some(Boundary::End),
        Direction::Backward if start > 0.0 => Some(Boundary::Beginning),
        _ => None,
    }
}

/// Resolves a proposed local percent against the wrap policy.
///
/// `start` is the percent before the move and `proposed` the unconstrained
/// result of it. Only the bound ahead of `direction` is considered: a forward
/// move that ends at or past `1.0` resolves, one that ends below `0.0` is
/// simply clamped.
#[must_use]
pub fn resolve_boundary(
    wrap: WrapMode,
    start: f64,
    proposed: f64,
    direction: Direction,
) -> BoundaryResolution {
    let past_bound = match direction {
        Direction::Forward => proposed >= 1.0,
        Direction::Backward => proposed <= 0.0,
    };
    if !past_bound {
        return BoundaryResolution::inside(start, clamp01(proposed), direction);
    }

    let bound = bound_ahead(direction);
    let reached = reached_boundary(start, direction);
    let mut segments = vec![(start, bound)];
    let (percent, direction) = match wrap {
        WrapMode::Clamp => (bound, direction),
        WrapMode::Loop if proposed == bound => (bound, direction),
        WrapMode::Loop => {
            let percent = wrap_overshoot(proposed, direction);
            segments.push((bound_behind(direction), percent));
            (percent, direction)
        }
        WrapMode::PingPong => {
            let percent = match direction {
                Direction::Forward => clamp01(1.0 - (proposed - 1.0)),
                Direction::Backward => clamp01(-proposed),
            };
            segments.push((bound, percent));
            (percent, direction.flipped())
        }
    };

    BoundaryResolution {
        percent,
        direction,
        reached,
        segments,
    }
}

/// Brings an overshoot back into the window by whole turns.
///
/// Landing exactly on a bound keeps it: `1.0` going forward stays `1.0`.
fn wrap_overshoot(proposed: f64, direction: Direction) -> f64 {
    match direction {
        Direction::Forward => proposed - (proposed - 1.0).ceil(),
        Direction::Backward => proposed + (-proposed).ceil(),
    }
}
