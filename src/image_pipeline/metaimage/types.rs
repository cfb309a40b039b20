//! MetaImage element types

use std::fmt;
use std::str::FromStr;

use crate::image_pipeline::common::error::ConversionError;

/// Voxel storage type of a MetaImage payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    /// 32-bit float (compact, loses precision on large calibrated values)
    Float,
    /// 64-bit float (default)
    Double,
}

impl ElementType {
    pub fn tag(self) -> &'static str {
        match self {
            ElementType::Char => "MET_CHAR",
            ElementType::UChar => "MET_UCHAR",
            ElementType::Short => "MET_SHORT",
            ElementType::UShort => "MET_USHORT",
            ElementType::Int => "MET_INT",
            ElementType::UInt => "MET_UINT",
            ElementType::Float => "MET_FLOAT",
            ElementType::Double => "MET_DOUBLE",
        }
    }

    pub fn size(self) -> usize {
        match self {
            ElementType::Char | ElementType::UChar => 1,
            ElementType::Short | ElementType::UShort => 2,
            ElementType::Int | ElementType::UInt | ElementType::Float => 4,
            ElementType::Double => 8,
        }
    }
}

impl FromStr for ElementType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MET_CHAR" => Ok(ElementType::Char),
            "MET_UCHAR" => Ok(ElementType::UChar),
            "MET_SHORT" => Ok(ElementType::Short),
            "MET_USHORT" => Ok(ElementType::UShort),
            "MET_INT" => Ok(ElementType::Int),
            "MET_UINT" => Ok(ElementType::UInt),
            "MET_FLOAT" => Ok(ElementType::Float),
            "MET_DOUBLE" => Ok(ElementType::Double),
            other => Err(ConversionError::UnsupportedFormat(format!(
                "MetaImage element type {other}"
            ))),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Header keys interpreted by the codec; every other key is user metadata.
pub const RESERVED_KEYS: [&str; 22] = [
    "ObjectType",
    "ObjectSubType",
    "NDims",
    "BinaryData",
    "BinaryDataByteOrderMSB",
    "ElementByteOrderMSB",
    "CompressedData",
    "CompressedDataSize",
    "TransformMatrix",
    "Rotation",
    "Orientation",
    "Offset",
    "Origin",
    "Position",
    "CenterOfRotation",
    "AnatomicalOrientation",
    "ElementSpacing",
    "ElementSize",
    "DimSize",
    "ElementNumberOfChannels",
    "ElementType",
    "ElementDataFile",
];
