//! Calibration constants stored in an AIM processing log.

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::header::types::ProcessingLog;

/// Log keys holding the five calibration values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationKeys {
    pub mu_scaling: String,
    pub hu_mu_water: String,
    pub hu_mu_air: String,
    pub density_slope: String,
    pub density_intercept: String,
}

impl Default for CalibrationKeys {
    fn default() -> Self {
        Self {
            mu_scaling: "Mu_Scaling".to_string(),
            hu_mu_water: "HU: mu water".to_string(),
            hu_mu_air: "HU: mu air".to_string(),
            density_slope: "Density: slope".to_string(),
            density_intercept: "Density: intercept".to_string(),
        }
    }
}

/// Scanner calibration read from a processing log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationConstants {
    /// Native units per 1/cm of linear attenuation
    pub mu_scaling: f64,
    /// Linear attenuation of water (1/cm)
    pub hu_mu_water: f64,
    /// Linear attenuation of air (1/cm)
    pub hu_mu_air: f64,
    /// BMD per unit of linear attenuation (mg HA/ccm per 1/cm)
    pub density_slope: f64,
    /// BMD at zero attenuation (mg HA/ccm)
    pub density_intercept: f64,
}

impl CalibrationConstants {
    /// Linear map from native values to Hounsfield units.
    ///
    /// `HU = 1000 * (mu - mu_water) / (mu_water - mu_air)` with
    /// `mu = native / mu_scaling`, returned as `(slope, intercept)`.
    pub fn hu_equation(&self) -> Result<(f64, f64)> {
        hu_line(self.mu_scaling, self.hu_mu_water, self.hu_mu_air)
    }
}

fn hu_line(mu_scaling: f64, mu_water: f64, mu_air: f64) -> Result<(f64, f64)> {
    let range = mu_water - mu_air;
    if range == 0.0 || mu_scaling == 0.0 {
        return Err(ConversionError::InvalidCalibrationValue {
            key: "HU: mu water".to_string(),
            reason: format!(
                "degenerate HU calibration (mu_scaling={mu_scaling}, mu_water={mu_water}, mu_air={mu_air})"
            ),
        });
    }
    let slope = 1000.0 / (mu_scaling * range);
    let intercept = -1000.0 * mu_water / range;
    Ok((slope, intercept))
}

fn lookup(log: &ProcessingLog, key: &str) -> Result<f64> {
    let value = log
        .get(key)
        .ok_or_else(|| ConversionError::KeyNotFound(key.to_string()))?;
    value
        .as_f64()
        .ok_or_else(|| ConversionError::InvalidCalibrationValue {
            key: key.to_string(),
            reason: format!("expected a number, found {value:?}"),
        })
}

/// Reads all five calibration values; a missing key is an error.
pub fn extract_constants(log: &ProcessingLog, keys: &CalibrationKeys) -> Result<CalibrationConstants> {
    Ok(CalibrationConstants {
        mu_scaling: lookup(log, &keys.mu_scaling)?,
        hu_mu_water: lookup(log, &keys.hu_mu_water)?,
        hu_mu_air: lookup(log, &keys.hu_mu_air)?,
        density_slope: lookup(log, &keys.density_slope)?,
        density_intercept: lookup(log, &keys.density_intercept)?,
    })
}

/// Slope and intercept of the native-to-HU map for the calibration in `log`.
///
/// Only the scaling and the two attenuation references are read; the density
/// keys may be absent.
pub fn derive_hu_equation(log: &ProcessingLog, keys: &CalibrationKeys) -> Result<(f64, f64)> {
    hu_line(
        lookup(log, &keys.mu_scaling)?,
        lookup(log, &keys.hu_mu_water)?,
        lookup(log, &keys.hu_mu_air)?,
    )
}
