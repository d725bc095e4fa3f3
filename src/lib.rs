//! The _pixeltrack_ library crate.
//!
//! Pixeltrack serves transparent tracking pixels, records every fetch in an
//! append-only event log, and offers the recent events to clients.

pub mod api;
pub mod cli;
pub mod commons;
pub mod config;
pub mod constants;
pub mod daemon;
pub mod eventlog;
