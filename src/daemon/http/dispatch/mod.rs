//! Dispatching of HTTP requests.

pub use self::error::DispatchError;
pub use self::root::dispatch_request;

mod error;
mod root;
