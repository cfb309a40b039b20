use std::io::Write;
use crate::image_pipeline::aim::types::AimImage;
use crate::image_pipeline::common::error::Result;

pub trait AimWriter {
    fn write_aim(&self, image: &AimImage, output: &mut dyn Write) -> Result<()>;
}
