use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::image_pipeline::{
    aim::{AimImage, AimReader, AimV020Reader},
    common::error::{ConversionError, Result},
    conversions::{paths, types::ConversionConfig},
    header::{codec, extract_constants},
    metaimage::{MetaImageWriter, VolumeWriter},
    volume::{Unit, VoxelVolume, to_unit},
};

/// Converts AIM images in native units into tagged container volumes.
pub struct AimToVolumePipeline<R: AimReader, W: VolumeWriter> {
    reader: R,
    writer: W,
    config: ConversionConfig,
}

impl AimToVolumePipeline<AimV020Reader, MetaImageWriter> {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            reader: AimV020Reader,
            writer: MetaImageWriter,
            config,
        }
    }
}

impl<R: AimReader, W: VolumeWriter> AimToVolumePipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: ConversionConfig) -> Self {
        Self {
            reader,
            writer,
            config,
        }
    }

    fn validate_dimensions(&self, dims: [usize; 3]) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if dims.contains(&0) {
            return Err(ConversionError::InvalidDimensions(dims));
        }

        Ok(())
    }

    /// Scales `image` to the configured unit and re-lays it out for the
    /// container. The unit tag is set together with the scaled values.
    #[instrument(skip(self, image), fields(scaling = %self.config.scaling))]
    pub fn convert(&self, image: &AimImage) -> Result<VoxelVolume> {
        let dims = image.dimensions();
        {
            let _span = tracing::info_span!("validate_dimensions", ?dims).entered();
            self.validate_dimensions(dims)?;
        }

        let unit = self.config.scaling.unit();
        let calibration = if unit == Unit::Native {
            None
        } else {
            let _span = tracing::info_span!("extract_calibration").entered();
            let log = codec::parse(&image.processing_log);
            Some(extract_constants(&log, &self.config.calibration_keys)?)
        };

        let scaled = {
            let _span = tracing::info_span!("scale_values", %unit).entered();
            to_unit(&image.data.mapv(f64::from), unit, calibration.as_ref())?
        };

        // [x, y, z] -> [z, y, x]
        let data = scaled.reversed_axes();
        let mut origin = image.origin;
        let mut spacing = image.spacing;
        if self.config.swap_geometry_axes {
            origin.swap(0, 2);
            spacing.swap(0, 2);
        }

        let log_text = if self.config.normalize_log {
            codec::serialize(&codec::parse(&image.processing_log))
        } else {
            image.processing_log.clone()
        };

        match unit {
            Unit::Native => info!("Image values are unchanged"),
            Unit::Mu => info!("Image converted to linear attenuation"),
            Unit::Hu => info!("Image converted to Hounsfield units"),
            Unit::Bmd => info!("Image converted to bone mineral density"),
        }

        Ok(VoxelVolume::tagged(
            data,
            origin,
            spacing,
            unit,
            codec::encode_log_metadata(&log_text),
        ))
    }

    /// Decodes an AIM file held in memory and converts it.
    pub fn convert_bytes(&self, input_data: &[u8]) -> Result<VoxelVolume> {
        let image = {
            let _span = tracing::info_span!("decode_aim", input_size = input_data.len()).entered();
            self.reader.read_aim(input_data)?
        };
        self.convert(&image)
    }

    /// Reads and converts an AIM file, writing the volume when configured.
    #[instrument(skip(self, input_path))]
    pub fn convert_file<P: AsRef<Path>>(&self, input_path: P) -> Result<VoxelVolume> {
        let input_path = input_path.as_ref();
        info!(input = %input_path.display(), "Converting AIM file");

        // Fail before decoding when the output cannot be placed
        let output_path = if self.config.write_output {
            Some(paths::resolve_output_path(
                self.config.output_path.as_deref(),
                Some(input_path),
                "mha",
            )?)
        } else {
            None
        };

        let input_data = {
            let _span = tracing::info_span!("read_input_file").entered();
            std::fs::read(input_path).map_err(|e| {
                ConversionError::InputReadError(format!("{}: {}", input_path.display(), e))
            })?
        };

        let volume = self.convert_bytes(&input_data)?;

        if let Some(output_path) = output_path {
            self.write_to(&volume, &output_path)?;
        }

        Ok(volume)
    }

    /// Writes `volume` to the configured output path, or next to
    /// `input_path` when none is configured.
    pub fn write(&self, volume: &VoxelVolume, input_path: Option<&Path>) -> Result<PathBuf> {
        let output_path =
            paths::resolve_output_path(self.config.output_path.as_deref(), input_path, "mha")?;
        self.write_to(volume, &output_path)?;
        Ok(output_path)
    }

    fn write_to(&self, volume: &VoxelVolume, output_path: &Path) -> Result<()> {
        info!(output = %output_path.display(), "Writing image");

        let mut output_file = {
            let _span = tracing::info_span!("create_output_file").entered();
            std::fs::File::create(output_path).map_err(|e| {
                ConversionError::OutputWriteError(format!("{}: {}", output_path.display(), e))
            })?
        };

        let _span = tracing::info_span!("encode_volume").entered();
        self.writer
            .write_volume(volume, &mut output_file, &self.config)
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ConversionConfig) {
        self.config = config;
    }
}
