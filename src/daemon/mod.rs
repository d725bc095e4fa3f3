//! The pixeltrack daemon.

pub mod http;
pub mod start;
