//! Reader for single-file MetaImage (`.mha`) volumes.
//!
//! The header is a block of `Key = Value` lines ending with
//! `ElementDataFile = LOCAL`; the raw voxel payload follows immediately,
//! x varying fastest. Keys the codec does not interpret are kept, in order,
//! as volume metadata.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use ndarray::Array3;
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::metaimage::reader::VolumeReader;
use crate::image_pipeline::metaimage::types::{ElementType, RESERVED_KEYS};
use crate::image_pipeline::volume::types::VoxelVolume;

pub struct MetaImageReader;

#[derive(Debug, Default)]
struct Header {
    fields: Vec<(String, String)>,
    data_offset: usize,
}

impl Header {
    fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| ConversionError::DecodeError(format!("MetaImage header lacks {key}")))
    }

    fn flag(&self, keys: &[&str]) -> bool {
        keys.iter()
            .find_map(|k| self.get(k))
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    fn vector3(&self, keys: &[&str], default: f64) -> Result<[f64; 3]> {
        let Some(text) = keys.iter().find_map(|k| self.get(k)) else {
            return Ok([default; 3]);
        };
        let values = text
            .split_whitespace()
            .map(|p| p.parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ConversionError::DecodeError(format!("bad vector {text:?}: {e}")))?;
        <[f64; 3]>::try_from(values)
            .map_err(|v| ConversionError::DecodeError(format!("expected 3 components, got {}", v.len())))
    }
}

fn parse_header(data: &[u8]) -> Result<Header> {
    let mut header = Header::default();
    let mut position = 0;

    while position < data.len() {
        let end = data[position..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(data.len(), |i| position + i);
        let line = std::str::from_utf8(&data[position..end])
            .map_err(|e| ConversionError::DecodeError(format!("MetaImage header is not text: {e}")))?;
        position = (end + 1).min(data.len());

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| ConversionError::DecodeError(format!("bad MetaImage header line {line:?}")))?;
        let (key, value) = (key.trim(), value.trim());
        header.fields.push((key.to_string(), value.to_string()));

        if key == "ElementDataFile" {
            header.data_offset = position;
            return Ok(header);
        }
    }

    Err(ConversionError::DecodeError(
        "MetaImage header has no ElementDataFile entry".to_string(),
    ))
}

fn decode_payload<E: ByteOrder>(payload: &[u8], element_type: ElementType) -> Vec<f64> {
    let size = element_type.size();
    payload
        .chunks_exact(size)
        .map(|c| match element_type {
            ElementType::Char => f64::from(c[0] as i8),
            ElementType::UChar => f64::from(c[0]),
            ElementType::Short => f64::from(E::read_i16(c)),
            ElementType::UShort => f64::from(E::read_u16(c)),
            ElementType::Int => f64::from(E::read_i32(c)),
            ElementType::UInt => f64::from(E::read_u32(c)),
            ElementType::Float => f64::from(E::read_f32(c)),
            ElementType::Double => E::read_f64(c),
        })
        .collect()
}

impl VolumeReader for MetaImageReader {
    fn read_volume(&self, data: &[u8]) -> Result<VoxelVolume> {
        debug!("Decoding MetaImage volume, {} bytes", data.len());
        let header = parse_header(data)?;

        let ndims = header.require("NDims")?;
        if ndims != "3" {
            return Err(ConversionError::UnsupportedFormat(format!(
                "{ndims}-dimensional MetaImage"
            )));
        }
        if header.flag(&["CompressedData"]) {
            return Err(ConversionError::UnsupportedFormat(
                "compressed MetaImage data".to_string(),
            ));
        }
        if header.get("ElementNumberOfChannels").is_some_and(|c| c != "1") {
            return Err(ConversionError::UnsupportedFormat(
                "multi-channel MetaImage".to_string(),
            ));
        }
        let data_file = header.require("ElementDataFile")?;
        if data_file != "LOCAL" {
            return Err(ConversionError::UnsupportedFormat(format!(
                "detached MetaImage data file {data_file}"
            )));
        }

        let element_type: ElementType = header.require("ElementType")?.parse()?;
        let dims = header
            .require("DimSize")?
            .split_whitespace()
            .map(|p| p.parse::<usize>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ConversionError::DecodeError(format!("bad DimSize: {e}")))?;
        let [nx, ny, nz] = <[usize; 3]>::try_from(dims)
            .map_err(|v| ConversionError::DecodeError(format!("DimSize has {} entries", v.len())))?;
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(ConversionError::InvalidDimensions([nx, ny, nz]));
        }

        let spacing = header.vector3(&["ElementSpacing", "ElementSize"], 1.0)?;
        let origin = header.vector3(&["Offset", "Origin", "Position"], 0.0)?;
        let big_endian = header.flag(&["BinaryDataByteOrderMSB", "ElementByteOrderMSB"]);

        let expected = nx
            .checked_mul(ny)
            .and_then(|v| v.checked_mul(nz))
            .and_then(|v| v.checked_mul(element_type.size()))
            .ok_or(ConversionError::InvalidDimensions([nx, ny, nz]))?;
        let payload = &data[header.data_offset..];
        if payload.len() < expected {
            return Err(ConversionError::DecodeError(format!(
                "truncated MetaImage data: need {expected} bytes, found {}",
                payload.len()
            )));
        }
        let payload = &payload[..expected];

        let values = if big_endian {
            decode_payload::<BigEndian>(payload, element_type)
        } else {
            decode_payload::<LittleEndian>(payload, element_type)
        };
        let array = Array3::from_shape_vec((nz, ny, nx), values)
            .map_err(|e| ConversionError::DecodeError(e.to_string()))?;

        let metadata: Vec<(String, String)> = header
            .fields
            .into_iter()
            .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
            .collect();

        debug!(
            "Decoded MetaImage volume: {}x{}x{} {}, {} metadata entries",
            nx,
            ny,
            nz,
            element_type,
            metadata.len()
        );

        Ok(VoxelVolume::from_parts(array, origin, spacing, metadata))
    }
}
