use std::io::Write;

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::image_pipeline::aim::layout::{self, image_struct, pre_header};
use crate::image_pipeline::aim::types::AimImage;
use crate::image_pipeline::aim::writer::AimWriter;
use crate::image_pipeline::common::error::{ConversionError, Result};

/// Writes AIM version 020 files with 16-bit voxels.
pub struct AimV020Writer;

fn to_i32(value: usize, what: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| ConversionError::EncodeError(format!("{what} too large for AIM: {value}")))
}

impl AimWriter for AimV020Writer {
    fn write_aim(&self, image: &AimImage, output: &mut dyn Write) -> Result<()> {
        let [nx, ny, nz] = image.dimensions();
        debug!("Encoding AIM image: {}x{}x{}", nx, ny, nz);

        if nx == 0 || ny == 0 || nz == 0 {
            return Err(ConversionError::InvalidDimensions([nx, ny, nz]));
        }

        let log = image.processing_log.as_bytes();
        let data_len = nx * ny * nz * 2;

        let mut pre = [0u8; pre_header::SIZE];
        LittleEndian::write_i32(&mut pre[pre_header::PRE_HEADER_LEN..], to_i32(pre_header::SIZE, "pre-header")?);
        LittleEndian::write_i32(&mut pre[pre_header::IMAGE_STRUCT_LEN..], to_i32(image_struct::SIZE, "image structure")?);
        LittleEndian::write_i32(&mut pre[pre_header::LOG_LEN..], to_i32(log.len(), "processing log")?);
        LittleEndian::write_i32(&mut pre[pre_header::DATA_LEN..], to_i32(data_len, "image data")?);
        LittleEndian::write_i32(&mut pre[pre_header::ASSOC_LEN..], 0);

        let mut header = [0u8; image_struct::SIZE];
        LittleEndian::write_i32(&mut header[image_struct::TYPE..], layout::TYPE_SHORT);
        for axis in 0..3 {
            let spacing = image.spacing[axis];
            let pos = if spacing != 0.0 {
                (image.origin[axis] / spacing).round() as i32
            } else {
                0
            };
            let dim = to_i32(image.dimensions()[axis], "dimension")?;
            LittleEndian::write_i32(&mut header[image_struct::POS + axis * 4..], pos);
            LittleEndian::write_i32(&mut header[image_struct::DIM + axis * 4..], dim);
            LittleEndian::write_i32(&mut header[image_struct::SUPDIM + axis * 4..], dim);
            LittleEndian::write_i32(&mut header[image_struct::SUBDIM + axis * 4..], dim);
            LittleEndian::write_u32(
                &mut header[image_struct::EL_SIZE_MM + axis * 4..],
                layout::vax_f32_to_bits(spacing as f32),
            );
        }

        // Reversed axes iterate with x fastest, the on-disk order
        let values: Vec<i16> = image.data.t().iter().copied().collect();
        let mut payload = vec![0u8; data_len];
        LittleEndian::write_i16_into(&values, &mut payload);

        output.write_all(&pre)?;
        output.write_all(&header)?;
        output.write_all(log)?;
        output.write_all(&payload)?;

        debug!("AIM encoding complete");
        Ok(())
    }
}
