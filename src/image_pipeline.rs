//! Image processing pipeline module
//!
//! This module provides a structured approach to AIM conversions, with
//! separate modules for the processing log, AIM and container I/O, unit
//! scaling, and conversion orchestration.

pub mod aim;
pub mod common;
pub mod conversions;
pub mod header;
pub mod metaimage;
pub mod volume;

pub use common::{
    ConversionError,
    Result,
};

pub use aim::{
    AimImage,
    AimReader,
    AimV020Reader,
    AimV020Writer,
    AimWriter,
};

pub use header::{
    CalibrationConstants,
    CalibrationKeys,
    LogValue,
    ProcessingLog,
};

pub use metaimage::{
    ElementType,
    MetaImageReader,
    MetaImageWriter,
    VolumeReader,
    VolumeWriter,
};

pub use volume::{
    Scaling,
    Unit,
    VoxelVolume,
};

pub use conversions::{
    AimToVolumePipeline,
    ConversionConfig,
    ConversionConfigBuilder,
    VolumeToAimPipeline,
};
