//! Markers along the clip window that fire when the cursor sweeps over them.

use serde::{Deserialize, Serialize};

use crate::geom::{Direction, clamp01};

/// Sweep direction a trigger reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TriggerKind {
    /// Either direction.
    #[default]
    Double,
    Forward,
    Backward,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trigger {
    pub name: String,
    /// Local percent of the marker.
    pub position: f64,
    pub kind: TriggerKind,
    pub enabled: bool,
    /// Fire at most once until [`Trigger::reset`] is called.
    pub work_once: bool,
    #[serde(skip)]
    pub(crate) worked: bool,
}

impl Default for Trigger {
    fn default() -> Self {
        Self {
            name: String::new(),
            position: 0.5,
            kind: TriggerKind::Double,
            enabled: true,
            work_once: false,
            worked: false,
        }
    }
}

impl Trigger {
    #[must_use]
    pub fn new(name: impl Into<String>, position: f64, kind: TriggerKind) -> Self {
        Self {
            name: name.into(),
            position: clamp01(position),
            kind,
            ..Self::default()
        }
    }

    /// Clamps the marker into the window; a non-finite position moves to `0.0`.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.position = if self.position.is_finite() {
            clamp01(self.position)
        } else {
            0.0
        };
        self
    }

    #[must_use]
    pub fn once(mut self) -> Self {
        self.work_once = true;
        self
    }

    #[must_use]
    pub const fn has_worked(&self) -> bool {
        self.worked
    }

    pub fn reset(&mut self) {
        self.worked = false;
    }

    /// Returns `true` if sweeping from `previous` to `current` crosses the marker
    /// in a direction this trigger reacts to. A zero-length sweep never fires.
    pub fn check(&mut self, previous: f64, current: f64) -> bool {
        if !self.enabled || (self.work_once && self.worked) || previous == current {
            return false;
        }
        let forward = previous <= self.position && current >= self.position;
        let backward = current <= self.position && previous >= self.position;
        let passed = match self.kind {
            TriggerKind::Double => forward || backward,
            TriggerKind::Forward => forward,
            TriggerKind::Backward => backward,
        };
        if passed {
            self.worked = true;
        }
        passed
    }
}

/// A trigger that fired during a move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerHit {
    pub name: String,
    pub position: f64,
    /// Direction of the sweep that crossed the marker.
    pub direction: Direction,
}

/// Checks every trigger against one swept segment, appending hits in trigger order.
pub fn check_triggers(triggers: &mut [Trigger], from: f64, to: f64, hits: &mut Vec<TriggerHit>) {
    if from == to {
        return;
    }
    let direction = if to > from {
        Direction::Forward
    } else {
        Direction::Backward
    };
    for trigger in triggers.iter_mut() {
        if trigger.check(from, to) {
            log::trace!("trigger '{}' fired at {:.4}", trigger.name, trigger.position);
            hits.push(TriggerHit {
                name: trigger.name.clone(),
                position: trigger.position,
                direction,
            });
        }
    }
}
