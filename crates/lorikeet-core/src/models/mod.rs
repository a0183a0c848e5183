//! Data models for the application
//!
//! `asset` holds the persisted entities and the records written for them,
//! `image` the MIME whitelist and size classes, `upload` the transport-facing
//! descriptor every front end fills in.

mod asset;
mod image;
mod upload;

pub use asset::*;
pub use image::*;
pub use upload::*;
