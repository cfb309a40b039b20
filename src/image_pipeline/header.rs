//! Processing log module
//!
//! Parsing and rendering of the text log embedded in AIM files, and the
//! calibration constants derived from it.

pub mod calibration;
pub mod codec;
pub mod types;

pub use calibration::{CalibrationConstants, CalibrationKeys, derive_hu_equation, extract_constants};
pub use codec::{LINEBREAK_SENTINEL, decode_log_metadata, encode_log_metadata, parse, serialize};
pub use types::{LogValue, ProcessingLog};
