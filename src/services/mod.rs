//! Domain services used by the engine command loop.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the chat rules so the engine can stay focused on
//! command dispatch and event fan-out. `visibility` and `dashboard` are
//! pure functions over a message log; `room` mutates room state.

pub mod dashboard;
pub mod room;
pub mod visibility;
