use std::io::Write;

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::conversions::types::ConversionConfig;
use crate::image_pipeline::metaimage::types::{ElementType, RESERVED_KEYS};
use crate::image_pipeline::metaimage::writer::VolumeWriter;
use crate::image_pipeline::volume::types::VoxelVolume;

/// Writes single-file MetaImage volumes in little-endian byte order.
pub struct MetaImageWriter;

fn join(values: &[f64; 3]) -> String {
    values.map(|v| v.to_string()).join(" ")
}

fn encode_payload(volume: &VoxelVolume, element_type: ElementType) -> Vec<u8> {
    let size = element_type.size();
    let mut payload = vec![0u8; volume.data().len() * size];

    // Float to integer casts saturate at the type bounds
    for (chunk, &v) in payload.chunks_exact_mut(size).zip(volume.data().iter()) {
        match element_type {
            ElementType::Char => chunk[0] = (v.round() as i8) as u8,
            ElementType::UChar => chunk[0] = v.round() as u8,
            ElementType::Short => LittleEndian::write_i16(chunk, v.round() as i16),
            ElementType::UShort => LittleEndian::write_u16(chunk, v.round() as u16),
            ElementType::Int => LittleEndian::write_i32(chunk, v.round() as i32),
            ElementType::UInt => LittleEndian::write_u32(chunk, v.round() as u32),
            ElementType::Float => LittleEndian::write_f32(chunk, v as f32),
            ElementType::Double => LittleEndian::write_f64(chunk, v),
        }
    }
    payload
}

impl VolumeWriter for MetaImageWriter {
    fn write_volume(&self, volume: &VoxelVolume, output: &mut dyn Write, config: &ConversionConfig) -> Result<()> {
        let [nx, ny, nz] = volume.size();
        debug!("Encoding MetaImage volume: {}x{}x{} {}", nx, ny, nz, config.element_type);

        for (key, value) in volume.metadata() {
            if key.is_empty() || key.contains(['=', '\n', '\r']) || key.trim() != key {
                return Err(ConversionError::EncodeError(format!("invalid metadata key {key:?}")));
            }
            if RESERVED_KEYS.contains(&key.as_str()) {
                return Err(ConversionError::EncodeError(format!("metadata key {key} is reserved")));
            }
            if value.contains(['\n', '\r']) {
                return Err(ConversionError::EncodeError(format!(
                    "metadata value for {key} spans several lines"
                )));
            }
        }

        let mut header = format!(
            "ObjectType = Image\n\
             NDims = 3\n\
             BinaryData = True\n\
             BinaryDataByteOrderMSB = False\n\
             CompressedData = False\n\
             TransformMatrix = 1 0 0 0 1 0 0 0 1\n\
             Offset = {}\n\
             CenterOfRotation = 0 0 0\n\
             AnatomicalOrientation = RAI\n\
             ElementSpacing = {}\n\
             DimSize = {nx} {ny} {nz}\n",
            join(&volume.origin()),
            join(&volume.spacing()),
        );
        for (key, value) in volume.metadata() {
            header.push_str(&format!("{key} = {value}\n"));
        }
        header.push_str(&format!(
            "ElementType = {}\nElementDataFile = LOCAL\n",
            config.element_type
        ));

        output.write_all(header.as_bytes())?;
        output.write_all(&encode_payload(volume, config.element_type))?;

        debug!("MetaImage encoding complete");
        Ok(())
    }
}
