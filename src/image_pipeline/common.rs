//! Common types module
//!
//! Error type and result alias shared by the AIM and container pipelines.

pub mod error;

pub use error::{ConversionError, Result};
