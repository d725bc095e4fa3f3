//! The HTTP front end of the daemon.

pub mod dispatch;
pub mod request;
pub mod response;
pub mod server;
