//! Conversion configuration types

use std::path::PathBuf;

use crate::image_pipeline::header::calibration::CalibrationKeys;
use crate::image_pipeline::metaimage::types::ElementType;
use crate::image_pipeline::volume::types::Scaling;

/// Configuration for AIM <-> volume conversion
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Unit to scale native AIM values to
    pub scaling: Scaling,
    /// Whether converted images are written to disk
    pub write_output: bool,
    /// Destination file; derived from the input path when unset
    pub output_path: Option<PathBuf>,
    /// Swap the first and last origin/spacing components along with the
    /// array axes (legacy behaviour of some tools)
    pub swap_geometry_axes: bool,
    /// Store the log re-rendered in the canonical layout instead of verbatim
    pub normalize_log: bool,
    /// Element type of written volumes
    pub element_type: ElementType,
    /// Log keys holding the calibration
    pub calibration_keys: CalibrationKeys,
    /// Whether to reject empty images before conversion
    pub validate_dimensions: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            scaling: Scaling::None,
            write_output: false,
            output_path: None,
            swap_geometry_axes: false,
            normalize_log: false,
            element_type: ElementType::Double,
            calibration_keys: CalibrationKeys::default(),
            validate_dimensions: true,
        }
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }
}

/// Builder for ConversionConfig
#[derive(Default)]
pub struct ConversionConfigBuilder {
    scaling: Option<Scaling>,
    write_output: Option<bool>,
    output_path: Option<Option<PathBuf>>,
    swap_geometry_axes: Option<bool>,
    normalize_log: Option<bool>,
    element_type: Option<ElementType>,
    calibration_keys: Option<CalibrationKeys>,
    validate_dimensions: Option<bool>,
}

impl ConversionConfigBuilder {
    pub fn scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = Some(scaling);
        self
    }

    pub fn write_output(mut self, enable: bool) -> Self {
        self.write_output = Some(enable);
        self
    }

    pub fn output_path(mut self, path: Option<PathBuf>) -> Self {
        self.output_path = Some(path);
        self
    }

    pub fn swap_geometry_axes(mut self, enable: bool) -> Self {
        self.swap_geometry_axes = Some(enable);
        self
    }

    pub fn normalize_log(mut self, enable: bool) -> Self {
        self.normalize_log = Some(enable);
        self
    }

    pub fn element_type(mut self, element_type: ElementType) -> Self {
        self.element_type = Some(element_type);
        self
    }

    pub fn calibration_keys(mut self, keys: CalibrationKeys) -> Self {
        self.calibration_keys = Some(keys);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn build(self) -> ConversionConfig {
        let default = ConversionConfig::default();
        ConversionConfig {
            scaling: self.scaling.unwrap_or(default.scaling),
            write_output: self.write_output.unwrap_or(default.write_output),
            output_path: self.output_path.unwrap_or(default.output_path),
            swap_geometry_axes: self.swap_geometry_axes.unwrap_or(default.swap_geometry_axes),
            normalize_log: self.normalize_log.unwrap_or(default.normalize_log),
            element_type: self.element_type.unwrap_or(default.element_type),
            calibration_keys: self.calibration_keys.unwrap_or(default.calibration_keys),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
        }
    }
}
