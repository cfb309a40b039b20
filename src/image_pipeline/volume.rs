//! Generic volume module
//!
//! The container-side volume type, its unit tags and the unit arithmetic.

pub mod scaling;
pub mod types;

pub use scaling::{UnitTransform, to_native, to_unit};
pub use types::{PROCESSING_LOG_KEY, Scaling, UNIT_KEY, Unit, VoxelVolume};
