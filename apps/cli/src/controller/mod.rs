//! Controller layer: UI events, the screen reducer, and dispatch from orchestration updates.

pub mod dispatch;
pub mod events;
pub mod reducer;
