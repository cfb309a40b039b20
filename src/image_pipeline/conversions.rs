//! Pipeline conversions module
//!
//! This module contains orchestration logic for AIM to container conversion
//! and back.

mod aim_to_volume;
pub mod paths;
pub mod types;
mod volume_to_aim;


pub use aim_to_volume::AimToVolumePipeline;
pub use paths::{resolve_output_path, sibling_path};
pub use types::{ConversionConfig, ConversionConfigBuilder};
pub use volume_to_aim::VolumeToAimPipeline;
