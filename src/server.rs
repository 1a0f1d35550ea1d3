//! Hosting rooms on the tokio runtime.
//!
//! Each room runs as a [`RoomActor`]: a task that owns the [`Room`] and
//! processes one message or one tick at a time, so handlers never
//! interleave. The [`RoomRegistry`] maps room ids to the handles used to
//! reach those tasks.
//!
//! [`Room`]: crate::room::Room

mod actor;
mod registry;

pub use actor::{RoomActor, RoomHandle, RoomMessage};
pub use registry::{RoomRegistry, RoomSummary};
