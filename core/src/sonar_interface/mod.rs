pub mod overlay;
pub mod ping;

pub use overlay::PingOverlay;
pub use ping::Ping;
