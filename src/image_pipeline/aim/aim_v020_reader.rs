//! AIM reader for the uncompressed version 020 layout.
//!
//! Supports 8-bit (`char`) and 16-bit (`short`) voxels, which covers the
//! grey-scale and segmented images written by the scanner software.
//! Compressed voxel types and version 030 files are rejected.

use byteorder::{ByteOrder, LittleEndian};
use ndarray::{Array3, ShapeBuilder};
use tracing::debug;

use crate::image_pipeline::aim::layout::{self, image_struct, pre_header};
use crate::image_pipeline::aim::reader::AimReader;
use crate::image_pipeline::aim::types::AimImage;
use crate::image_pipeline::common::error::{ConversionError, Result};

pub struct AimV020Reader;

fn read_i32x3(bytes: &[u8], offset: usize) -> [i32; 3] {
    [
        LittleEndian::read_i32(&bytes[offset..offset + 4]),
        LittleEndian::read_i32(&bytes[offset + 4..offset + 8]),
        LittleEndian::read_i32(&bytes[offset + 8..offset + 12]),
    ]
}

fn block_len(bytes: &[u8], offset: usize, name: &str) -> Result<usize> {
    let value = LittleEndian::read_i32(&bytes[offset..offset + 4]);
    usize::try_from(value)
        .map_err(|_| ConversionError::DecodeError(format!("negative {name} length: {value}")))
}

impl AimReader for AimV020Reader {
    fn read_aim(&self, data: &[u8]) -> Result<AimImage> {
        debug!("Decoding AIM image, {} bytes", data.len());

        if data.starts_with(layout::V030_MAGIC) {
            return Err(ConversionError::UnsupportedFormat(
                "AIM version 030".to_string(),
            ));
        }
        if data.len() < pre_header::SIZE + image_struct::SIZE {
            return Err(ConversionError::DecodeError(format!(
                "file too small for an AIM header ({} bytes)",
                data.len()
            )));
        }

        let pre_len = block_len(data, pre_header::PRE_HEADER_LEN, "pre-header")?;
        let struct_len = block_len(data, pre_header::IMAGE_STRUCT_LEN, "image structure")?;
        let log_len = block_len(data, pre_header::LOG_LEN, "processing log")?;
        let data_len = block_len(data, pre_header::DATA_LEN, "image data")?;
        if pre_len != pre_header::SIZE || struct_len != image_struct::SIZE {
            return Err(ConversionError::UnsupportedFormat(format!(
                "AIM block layout {pre_len}/{struct_len}, expected {}/{}",
                pre_header::SIZE,
                image_struct::SIZE
            )));
        }

        let header = &data[pre_len..pre_len + struct_len];
        let voxel_type = LittleEndian::read_i32(&header[image_struct::TYPE..image_struct::TYPE + 4]);
        let bytes_per_voxel = match voxel_type {
            layout::TYPE_CHAR => 1,
            layout::TYPE_SHORT => 2,
            other => {
                return Err(ConversionError::UnsupportedFormat(format!(
                    "AIM voxel type {other:#010x}"
                )));
            }
        };

        let dim = read_i32x3(header, image_struct::DIM);
        let [nx, ny, nz] = dim.map(|d| usize::try_from(d).unwrap_or(0));
        if nx == 0 || ny == 0 || nz == 0 || nx.checked_mul(ny).and_then(|v| v.checked_mul(nz)).is_none() {
            return Err(ConversionError::InvalidDimensions([nx, ny, nz]));
        }

        let pos = read_i32x3(header, image_struct::POS);
        let mut spacing = [0.0f64; 3];
        for (axis, value) in spacing.iter_mut().enumerate() {
            let offset = image_struct::EL_SIZE_MM + axis * 4;
            let raw = LittleEndian::read_u32(&header[offset..offset + 4]);
            *value = f64::from(layout::vax_f32_from_bits(raw));
        }
        let origin = [
            f64::from(pos[0]) * spacing[0],
            f64::from(pos[1]) * spacing[1],
            f64::from(pos[2]) * spacing[2],
        ];

        let log_start = pre_len + struct_len;
        let data_start = log_start + log_len;
        let voxel_count = nx * ny * nz;
        let expected = voxel_count
            .checked_mul(bytes_per_voxel)
            .ok_or(ConversionError::InvalidDimensions([nx, ny, nz]))?;
        if data_len < expected || data.len() < data_start + expected {
            return Err(ConversionError::DecodeError(format!(
                "truncated image data: need {expected} bytes for {nx}x{ny}x{nz}, block holds {data_len}, file holds {}",
                data.len().saturating_sub(data_start)
            )));
        }

        let processing_log = String::from_utf8_lossy(&data[log_start..data_start])
            .trim_end_matches('\0')
            .to_string();

        let payload = &data[data_start..data_start + expected];
        let values: Vec<i16> = if bytes_per_voxel == 1 {
            payload.iter().map(|&b| i16::from(b as i8)).collect()
        } else {
            let mut values = vec![0i16; voxel_count];
            LittleEndian::read_i16_into(payload, &mut values);
            values
        };

        // x varies fastest on disk
        let data = Array3::from_shape_vec((nx, ny, nz).f(), values)
            .map_err(|e| ConversionError::DecodeError(e.to_string()))?;

        debug!("Decoded AIM image: {}x{}x{}, log {} bytes", nx, ny, nz, log_len);

        Ok(AimImage {
            data,
            origin,
            spacing,
            processing_log,
        })
    }
}
