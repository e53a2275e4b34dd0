//! Façade over the media session service.
//!
//! A room in SFU mode owns one [`MediaSession`]; every connection in that room joins it
//! as a [`SessionPeer`] through a [`SessionAdapter`], which also turns the session's
//! asynchronous [`SessionEvent`]s into envelopes for the owning connection.

mod forwarder;
mod session_adapter;
mod session_event;
mod webrtc_forwarder;

pub use forwarder::*;
pub use session_adapter::*;
pub use session_event::*;
pub use webrtc_forwarder::*;
