// blueiris-api: Async Rust client for the Blue Iris web server API

pub mod error;
pub mod mjpeg;
pub mod protocol;
pub mod transport;

pub use error::Error;
pub use mjpeg::MjpegStream;
pub use protocol::Client;
