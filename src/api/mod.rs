//! Data structures for the API, shared between client and server.

pub mod event;
pub mod opens;
pub mod status;
pub mod token;
