//! Cursor traversal over sample buffers.

mod follower;
mod trigger;
mod wrap;

pub use follower::{Cursor, FollowMode, FollowerConfig, SplineFollower, TickReport};
pub use trigger::{Trigger, TriggerHit, TriggerKind, check_triggers};
pub use wrap::{
    Boundary, BoundaryResolution, WrapMode, bound_ahead, bound_behind, reached_boundary,
    resolve_boundary,
};
