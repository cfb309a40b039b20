use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::volume::types::VoxelVolume;

pub trait VolumeReader {
    fn read_volume(&self, data: &[u8]) -> Result<VoxelVolume>;
}
