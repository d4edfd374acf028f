//! Remote object control.
//!
//! A TCP server speaks line-delimited JSON-RPC 2.0 and turns each request
//! into a `SceneCommand`. Commands travel to the render thread over a
//! channel and are applied between frames; the reply travels back the same
//! way. The server never touches the scene itself.
//!
//! # Invariants
//! - Commands are applied in arrival order, at most `MAX_COMMANDS_PER_FRAME`
//!   per frame, before the frame's sort and draw.
//! - Every request receives exactly one response line.
//! - A request whose reply does not arrive within the reply timeout fails
//!   with `RENDER_UNAVAILABLE`; the scene is never left half-updated.

pub mod channel;
pub mod client;
pub mod error;
pub mod protocol;
pub mod server;

pub use channel::{
    ChannelError, CommandInbox, CommandReply, CommandSender, MAX_COMMANDS_PER_FRAME,
    REPLY_TIMEOUT, RemoteRequest, channel,
};
pub use client::RemoteClient;
pub use error::RemoteError;
pub use server::{RemoteServer, ServerHandle};
