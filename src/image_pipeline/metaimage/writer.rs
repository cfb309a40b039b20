use std::io::Write;
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::conversions::types::ConversionConfig;
use crate::image_pipeline::volume::types::VoxelVolume;

pub trait VolumeWriter {
    fn write_volume(&self, volume: &VoxelVolume, output: &mut dyn Write, config: &ConversionConfig) -> Result<()>;
}
