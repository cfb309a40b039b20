use std::fs;

use aim_convert_rs::image_pipeline::{
    AimImage, AimReader, AimToVolumePipeline, AimV020Reader, AimV020Writer, AimWriter,
    ConversionConfig, ConversionError, ElementType, MetaImageReader, Scaling, VolumeReader,
    VolumeToAimPipeline,
};
use ndarray::Array3;

const LOG: &str = "! Processing Log\n\
!\n\
Mu_Scaling                                       8192\n\
HU: mu water                                  0.24090\n\
HU: mu air                                    0.00000\n\
Density: slope                         1.60304004e+03\n\
Density: intercept                    -3.91106812e+02\n";

fn sample_image() -> AimImage {
    AimImage {
        data: Array3::from_shape_fn((5, 4, 3), |(x, y, z)| {
            (x as i16) * 700 - (y as i16) * 90 + (z as i16) * 1100 - 400
        }),
        origin: [1.0, 0.5, -2.0],
        spacing: [0.5, 0.25, 0.5],
        processing_log: LOG.to_string(),
    }
}

fn write_aim(path: &std::path::Path, image: &AimImage) {
    let mut bytes = Vec::new();
    AimV020Writer.write_aim(image, &mut bytes).unwrap();
    fs::write(path, bytes).unwrap();
}

#[test]
fn aim_to_mha_and_back_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let aim_path = dir.path().join("C0004711.AIM;1");
    let original = sample_image();
    write_aim(&aim_path, &original);

    for scaling in [Scaling::None, Scaling::Mu, Scaling::Hu, Scaling::Bmd] {
        let config = ConversionConfig::builder()
            .scaling(scaling)
            .write_output(true)
            .build();

        let volume = AimToVolumePipeline::new(config.clone())
            .convert_file(&aim_path)
            .unwrap();
        let mha_path = dir.path().join("C0004711.mha");
        assert!(mha_path.exists());

        let stored = MetaImageReader.read_volume(&fs::read(&mha_path).unwrap()).unwrap();
        assert_eq!(stored.unit_tag(), Some(scaling.unit().as_str()));
        assert_eq!(stored.size(), [5, 4, 3]);
        assert_eq!(stored.origin(), original.origin);
        assert_eq!(stored.data(), volume.data());

        let restored = VolumeToAimPipeline::new(config).convert_file(&mha_path).unwrap();
        let written = AimV020Reader
            .read_aim(&fs::read(dir.path().join("C0004711.aim")).unwrap())
            .unwrap();

        assert_eq!(restored, original, "in-memory round trip through {scaling}");
        assert_eq!(written, original, "file round trip through {scaling}");
    }
}

#[test]
fn explicit_output_path_and_float_payload() {
    let dir = tempfile::tempdir().unwrap();
    let aim_path = dir.path().join("scan.aim");
    write_aim(&aim_path, &sample_image());

    let output = dir.path().join("nested.mha");
    let config = ConversionConfig::builder()
        .scaling(Scaling::Hu)
        .write_output(true)
        .output_path(Some(output.clone()))
        .element_type(ElementType::Float)
        .build();
    AimToVolumePipeline::new(config).convert_file(&aim_path).unwrap();

    let text = String::from_utf8_lossy(&fs::read(&output).unwrap()).into_owned();
    assert!(text.contains("ElementType = MET_FLOAT"));
    assert!(text.contains("unit = HU"));
    assert!(!dir.path().join("scan.mha").exists());
}

#[test]
fn missing_input_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = AimToVolumePipeline::new(ConversionConfig::default());

    let result = pipeline.convert_file(dir.path().join("absent.aim"));
    assert!(matches!(result, Err(ConversionError::InputReadError(_))));
}

#[test]
fn foreign_volume_without_log_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mha_path = dir.path().join("foreign.mha");
    let mut bytes = b"ObjectType = Image\n\
NDims = 3\n\
DimSize = 2 1 1\n\
ElementType = MET_SHORT\n\
ElementDataFile = LOCAL\n"
        .to_vec();
    bytes.extend_from_slice(&[1, 0, 2, 0]);
    fs::write(&mha_path, bytes).unwrap();

    let pipeline = VolumeToAimPipeline::new(ConversionConfig::default());
    let result = pipeline.convert_file(&mha_path);
    assert!(matches!(result, Err(ConversionError::MissingHeader)));
}
