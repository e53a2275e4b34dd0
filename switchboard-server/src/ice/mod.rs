mod cloudflare;
mod ice_provider;

pub use cloudflare::*;
pub use ice_provider::*;
