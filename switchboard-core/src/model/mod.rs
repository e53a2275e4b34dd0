mod ice;
mod peer;
mod room;
mod signaling;

pub use ice::{DEFAULT_ICE_TTL_SECS, IceConfig, IceServerConfig};
pub use peer::PeerId;
pub use room::RoomId;
pub use signaling::{Signal, SignalKind, SignalingEnvelope};
