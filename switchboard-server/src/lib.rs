pub mod config;
pub mod error;
pub mod http;
pub mod ice;
pub mod naming;
pub mod room;
pub mod session;
pub mod signaling;

pub use config::*;
pub use error::*;
pub use http::app;
pub use ice::*;
pub use naming::*;
pub use room::*;
pub use session::*;
pub use signaling::*;
