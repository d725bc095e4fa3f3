//! The pixeltrack command line client.

pub mod client;
pub mod options;
pub mod report;

pub use self::client::{Error, PixeltrackClient};
