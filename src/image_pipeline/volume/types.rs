//! Voxel volume and unit types

use std::fmt;
use std::str::FromStr;

use ndarray::Array3;

use crate::image_pipeline::common::error::ConversionError;
use crate::image_pipeline::header::codec::decode_log_metadata;

/// Metadata key holding the sentinel-encoded processing log.
pub const PROCESSING_LOG_KEY: &str = "processing_log";
/// Metadata key holding the unit tag.
pub const UNIT_KEY: &str = "unit";

/// Unit tag stored with a converted volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Raw scanner values
    Native,
    /// Linear attenuation coefficient (1/cm)
    Mu,
    /// Hounsfield units
    Hu,
    /// Bone mineral density (mg HA/ccm)
    Bmd,
}

impl Unit {
    pub const ACCEPTED: &'static str = "'mu', 'HU', 'BMD' or 'native'";

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Native => "native",
            Unit::Mu => "mu",
            Unit::Hu => "HU",
            Unit::Bmd => "BMD",
        }
    }
}

impl FromStr for Unit {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(Unit::Native),
            "mu" => Ok(Unit::Mu),
            "HU" => Ok(Unit::Hu),
            "BMD" => Ok(Unit::Bmd),
            other => Err(ConversionError::InvalidUnit {
                unit: other.to_string(),
                accepted: Unit::ACCEPTED,
            }),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit requested when converting native AIM values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scaling {
    /// Keep native values
    #[default]
    None,
    Mu,
    Hu,
    Bmd,
}

impl Scaling {
    pub const ACCEPTED: &'static str = "'HU', 'mu', 'BMD' or 'none'";

    /// Tag carried by a volume scaled this way.
    pub fn unit(self) -> Unit {
        match self {
            Scaling::None => Unit::Native,
            Scaling::Mu => Unit::Mu,
            Scaling::Hu => Unit::Hu,
            Scaling::Bmd => Unit::Bmd,
        }
    }
}

impl FromStr for Scaling {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Scaling::None),
            "mu" => Ok(Scaling::Mu),
            "HU" => Ok(Scaling::Hu),
            "BMD" => Ok(Scaling::Bmd),
            other => Err(ConversionError::InvalidUnit {
                unit: other.to_string(),
                accepted: Scaling::ACCEPTED,
            }),
        }
    }
}

impl fmt::Display for Scaling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scaling::None => f.write_str("none"),
            other => f.write_str(other.unit().as_str()),
        }
    }
}

/// A 3-D volume in the generic container layout.
///
/// `data` is indexed `[z, y, x]`; `origin` and `spacing` are `(x, y, z)` in
/// millimetres. String metadata entries keep their order.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelVolume {
    data: Array3<f64>,
    origin: [f64; 3],
    spacing: [f64; 3],
    metadata: Vec<(String, String)>,
}

impl VoxelVolume {
    /// Wraps container contents as read from disk or built by a caller.
    pub fn from_parts(
        data: Array3<f64>,
        origin: [f64; 3],
        spacing: [f64; 3],
        metadata: Vec<(String, String)>,
    ) -> Self {
        Self {
            data,
            origin,
            spacing,
            metadata,
        }
    }

    /// Volume whose values were just scaled to `unit`; the tag is set here
    /// and nowhere else.
    pub(crate) fn tagged(
        data: Array3<f64>,
        origin: [f64; 3],
        spacing: [f64; 3],
        unit: Unit,
        encoded_log: String,
    ) -> Self {
        Self {
            data,
            origin,
            spacing,
            metadata: vec![
                (PROCESSING_LOG_KEY.to_string(), encoded_log),
                (UNIT_KEY.to_string(), unit.as_str().to_string()),
            ],
        }
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn into_data(self) -> Array3<f64> {
        self.data
    }

    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// Size as `(x, y, z)`.
    pub fn size(&self) -> [usize; 3] {
        let (nz, ny, nx) = self.data.dim();
        [nx, ny, nz]
    }

    pub fn metadata(&self) -> &[(String, String)] {
        &self.metadata
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Unit tag as stored, without validation.
    pub fn unit_tag(&self) -> Option<&str> {
        self.metadata_value(UNIT_KEY)
    }

    /// Processing log with line breaks restored.
    pub fn processing_log(&self) -> Option<String> {
        self.metadata_value(PROCESSING_LOG_KEY).map(decode_log_metadata)
    }
}
