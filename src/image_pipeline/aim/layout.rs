//! Byte layout of AIM version 020 files.
//!
//! A file is a pre-header of five little-endian `i32` block lengths, the
//! image structure, the processing log and the voxel data, in that order.

/// Pre-header fields (byte offsets from the start of the file).
pub mod pre_header {
    pub const PRE_HEADER_LEN: usize = 0;
    pub const IMAGE_STRUCT_LEN: usize = 4;
    pub const LOG_LEN: usize = 8;
    pub const DATA_LEN: usize = 12;
    pub const ASSOC_LEN: usize = 16;

    pub const SIZE: usize = 20;
}

/// Image structure fields (byte offsets from the start of the structure).
pub mod image_struct {
    pub const VERSION: usize = 0;
    pub const PROC_LOG_PTR: usize = 4;
    pub const DATA_PTR: usize = 8;
    pub const ID: usize = 12;
    pub const REF: usize = 16;
    pub const TYPE: usize = 20;
    pub const POS: usize = 24;
    pub const DIM: usize = 36;
    pub const OFF: usize = 48;
    pub const SUPDIM: usize = 60;
    pub const SUPPOS: usize = 72;
    pub const SUBDIM: usize = 84;
    pub const TESTOFF: usize = 96;
    pub const EL_SIZE_MM: usize = 108;
    pub const ASSOC: usize = 120;

    pub const SIZE: usize = 140;
}

/// Magic prefix of version 030 files, which use 64-bit block lengths.
pub const V030_MAGIC: &[u8] = b"AIMDATA_V030";

/// Voxel type codes.
pub const TYPE_CHAR: i32 = 0x0001_0001;
pub const TYPE_SHORT: i32 = 0x0002_0002;

/// Decodes a VAX F-float read as a little-endian `u32`.
///
/// VAX stores the word holding sign and exponent first and uses an exponent
/// bias two higher than IEEE single precision.
pub fn vax_f32_from_bits(raw: u32) -> f32 {
    f32::from_bits(raw.rotate_left(16)) / 4.0
}

/// Encodes a value as a VAX F-float to be written as a little-endian `u32`.
pub fn vax_f32_to_bits(value: f32) -> u32 {
    (value * 4.0).to_bits().rotate_left(16)
}
