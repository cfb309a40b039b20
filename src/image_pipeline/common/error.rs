use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("'{unit}' is not a valid unit. Enter with {accepted}")]
    InvalidUnit { unit: String, accepted: &'static str },

    #[error("No processing log present in image metadata")]
    MissingHeader,

    #[error("Calibration key not found in processing log: {0}")]
    KeyNotFound(String),

    #[error("Invalid calibration value for '{key}': {reason}")]
    InvalidCalibrationValue { key: String, reason: String },

    #[error("Malformed processing log line {line_number}: {line:?}")]
    MalformedHeaderLine { line_number: usize, line: String },

    #[error("No input specified: provide either a file path or an in-memory image")]
    NoInputSpecified,

    #[error("No output path given and none can be derived from the input")]
    NoOutputPath,

    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Failed to encode image: {0}")]
    EncodeError(String),

    #[error("Invalid image dimensions: {0:?}")]
    InvalidDimensions([usize; 3]),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConversionError>;
