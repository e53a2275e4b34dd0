pub use switchboard_core::model::{PeerId, RoomId, SignalingEnvelope};

pub mod model {
    pub use switchboard_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use switchboard_server::*;
}
