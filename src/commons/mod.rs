//! Common types used by the various pixeltrack components.
pub mod error;
pub mod ext_serde;
