//! AIM image data types

use ndarray::Array3;

/// Decoded AIM image in native scanner units
#[derive(Debug, Clone, PartialEq)]
pub struct AimImage {
    /// Voxel values indexed `[x, y, z]`
    pub data: Array3<i16>,
    /// Position of the first voxel in millimetres `(x, y, z)`
    pub origin: [f64; 3],
    /// Voxel size in millimetres `(x, y, z)`
    pub spacing: [f64; 3],
    /// Processing log text as stored in the file
    pub processing_log: String,
}

impl AimImage {
    /// Size as `(x, y, z)`.
    pub fn dimensions(&self) -> [usize; 3] {
        let (nx, ny, nz) = self.data.dim();
        [nx, ny, nz]
    }
}
