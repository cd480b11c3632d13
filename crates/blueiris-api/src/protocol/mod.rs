// Blue Iris JSON command protocol
//
// Client for the `/json` command endpoint plus the byte-oriented image
// and stream paths. Operation groups (auth, cameras, control, media) are
// implemented as inherent methods via separate files to keep client.rs
// focused on transport mechanics.

pub mod auth;
pub mod cameras;
pub mod client;
pub mod control;
pub mod inventory;
pub mod media;
pub mod models;

pub use client::Client;
pub use control::{CamSetOptions, MoveMode, Zoom};
pub use inventory::{Camera, DeviceBase, DeviceEntry, GridSize, Group, PixelSize, Rect, Rgb};
pub use models::{Envelope, ResponseResult, SystemInfo};
