mod connection;
mod connection_handle;
mod connection_registry;
mod pump;
mod router;
mod signaling_output;
mod signaling_service;
mod ws_handler;

pub use connection::*;
pub use connection_handle::*;
pub use connection_registry::*;
pub use pump::*;
pub use router::*;
pub use signaling_output::*;
pub use signaling_service::*;
pub use ws_handler::*;
