use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::image_pipeline::{
    aim::{AimImage, AimV020Writer, AimWriter},
    common::error::{ConversionError, Result},
    conversions::{paths, types::ConversionConfig},
    header::{codec, extract_constants},
    metaimage::{MetaImageReader, VolumeReader},
    volume::{Unit, VoxelVolume, to_native},
};

/// Converts tagged container volumes back into native-unit AIM images.
pub struct VolumeToAimPipeline<R: VolumeReader, W: AimWriter> {
    reader: R,
    writer: W,
    config: ConversionConfig,
}

impl VolumeToAimPipeline<MetaImageReader, AimV020Writer> {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            reader: MetaImageReader,
            writer: AimV020Writer,
            config,
        }
    }
}

impl<R: VolumeReader, W: AimWriter> VolumeToAimPipeline<R, W> {
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

    /// Unit stored with `volume`; an absent tag means native values.
    fn stored_unit(volume: &VoxelVolume) -> Result<Unit> {
        match volume.unit_tag() {
            Some(tag) => tag.parse(),
            None => {
                warn!("No unit specified for image, assuming native units");
                Ok(Unit::Native)
            }
        }
    }

    /// Restores native AIM values from a tagged volume.
    ///
    /// Values are rounded and saturated into the 16-bit AIM range.
    #[instrument(skip(self, volume))]
    pub fn convert(&self, volume: &VoxelVolume) -> Result<AimImage> {
        let processing_log = volume.processing_log().ok_or(ConversionError::MissingHeader)?;
        let unit = Self::stored_unit(volume)?;
        {
            let _span = tracing::info_span!("validate_dimensions", dims = ?volume.size()).entered();
            self.validate_dimensions(volume.size())?;
        }

        let calibration = if unit == Unit::Native {
            None
        } else {
            let _span = tracing::info_span!("extract_calibration").entered();
            let log = codec::parse(&processing_log);
            Some(extract_constants(&log, &self.config.calibration_keys)?)
        };

        let native = {
            let _span = tracing::info_span!("restore_native", %unit).entered();
            to_native(volume.data(), unit, calibration.as_ref())?
        };

        let clipped = native
            .iter()
            .filter(|v| !(f64::from(i16::MIN)..=f64::from(i16::MAX)).contains(&v.round()))
            .count();
        if clipped > 0 {
            warn!(clipped, "Values outside the 16-bit AIM range were saturated");
        }

        // [z, y, x] -> [x, y, z]
        let data = native.mapv(|v| v.round() as i16).reversed_axes();
        let mut origin = volume.origin();
        let mut spacing = volume.spacing();
        if self.config.swap_geometry_axes {
            origin.swap(0, 2);
            spacing.swap(0, 2);
        }

        info!(%unit, "Image converted to native units");

        Ok(AimImage {
            data,
            origin,
            spacing,
            processing_log,
        })
    }

    /// Converts a volume read from `input_path` or, failing that, the given
    /// in-memory `volume`, writing the AIM file when configured.
    ///
    /// A path takes precedence over an in-memory volume.
    #[instrument(skip(self, input_path, volume))]
    pub fn convert_input(&self, input_path: Option<&Path>, volume: Option<&VoxelVolume>) -> Result<AimImage> {
        if input_path.is_none() && volume.is_none() {
            return Err(ConversionError::NoInputSpecified);
        }

        let output_path = if self.config.write_output {
            Some(paths::resolve_output_path(
                self.config.output_path.as_deref(),
                input_path,
                "aim",
            )?)
        } else {
            None
        };

        let loaded;
        let volume = match input_path {
            Some(path) => {
                loaded = self.read_file(path)?;
                &loaded
            }
            None => volume.ok_or(ConversionError::NoInputSpecified)?,
        };

        let image = self.convert(volume)?;

        if let Some(output_path) = output_path {
            self.write_to(&image, &output_path)?;
        }

        Ok(image)
    }

    /// Reads and converts a container file, writing the AIM file when
    /// configured.
    pub fn convert_file<P: AsRef<Path>>(&self, input_path: P) -> Result<AimImage> {
        self.convert_input(Some(input_path.as_ref()), None)
    }

    /// Decodes a container held in memory and converts it.
    pub fn convert_bytes(&self, input_data: &[u8]) -> Result<AimImage> {
        let volume = {
            let _span = tracing::info_span!("decode_volume", input_size = input_data.len()).entered();
            self.reader.read_volume(input_data)?
        };
        self.convert(&volume)
    }

    fn read_file(&self, input_path: &Path) -> Result<VoxelVolume> {
        info!(input = %input_path.display(), "Reading image");

        let input_data = {
            let _span = tracing::info_span!("read_input_file").entered();
            std::fs::read(input_path).map_err(|e| {
                ConversionError::InputReadError(format!("{}: {}", input_path.display(), e))
            })?
        };

        let _span = tracing::info_span!("decode_volume").entered();
        self.reader.read_volume(&input_data)
    }

    /// Writes `image` to the configured output path, or next to `input_path`
    /// when none is configured.
    pub fn write(&self, image: &AimImage, input_path: Option<&Path>) -> Result<PathBuf> {
        let output_path =
            paths::resolve_output_path(self.config.output_path.as_deref(), input_path, "aim")?;
        self.write_to(image, &output_path)?;
        Ok(output_path)
    }

    fn write_to(&self, image: &AimImage, output_path: &Path) -> Result<()> {
        info!(output = %output_path.display(), "Writing AIM file");

        let mut output_file = {
            let _span = tracing::info_span!("create_output_file").entered();
            std::fs::File::create(output_path).map_err(|e| {
                ConversionError::OutputWriteError(format!("{}: {}", output_path.display(), e))
            })?
        };

        let _span = tracing::info_span!("encode_aim").entered();
        self.writer.write_aim(image, &mut output_file)
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ConversionConfig) {
        self.config = config;
    }
}
