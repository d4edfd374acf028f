//! Polled input: window events accumulate into `InputState`, the frame loop
//! takes one `FrameInput` snapshot per frame.
//!
//! This crate knows nothing about the windowing library. The desktop app
//! maps its key codes to `Key` and forwards them.
//!
//! # Invariants
//! - A toggle action is produced once per physical press, never on repeat.
//! - Cursor and scroll deltas are consumed by exactly one `take_frame`.

pub mod action;
pub mod state;

pub use action::{Action, Key, Movement};
pub use state::{FrameInput, InputState};
