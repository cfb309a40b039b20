use crate::image_pipeline::aim::types::AimImage;
use crate::image_pipeline::common::error::Result;

pub trait AimReader {
    fn read_aim(&self, data: &[u8]) -> Result<AimImage>;
}
