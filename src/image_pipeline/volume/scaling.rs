//! Unit conversion of voxel values.
//!
//! Every supported unit is an affine function of the native scanner value,
//! `value = native * slope + intercept`, so converting back is the exact
//! algebraic inverse of the same map.

use ndarray::Array3;
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::header::calibration::CalibrationConstants;
use crate::image_pipeline::volume::types::Unit;

/// Affine map from native values to a unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitTransform {
    pub slope: f64,
    pub intercept: f64,
}

impl UnitTransform {
    pub const IDENTITY: UnitTransform = UnitTransform {
        slope: 1.0,
        intercept: 0.0,
    };

    /// Transform for `unit`. `calibration` may only be absent for
    /// [`Unit::Native`].
    pub fn for_unit(unit: Unit, calibration: Option<&CalibrationConstants>) -> Result<Self> {
        let transform = match unit {
            Unit::Native => return Ok(Self::IDENTITY),
            Unit::Mu => {
                let c = require(unit, calibration)?;
                nonzero("Mu_Scaling", c.mu_scaling)?;
                UnitTransform {
                    slope: 1.0 / c.mu_scaling,
                    intercept: 0.0,
                }
            }
            Unit::Hu => {
                let (slope, intercept) = require(unit, calibration)?.hu_equation()?;
                UnitTransform { slope, intercept }
            }
            Unit::Bmd => {
                let c = require(unit, calibration)?;
                nonzero("Mu_Scaling", c.mu_scaling)?;
                nonzero("Density: slope", c.density_slope)?;
                UnitTransform {
                    slope: c.density_slope / c.mu_scaling,
                    intercept: c.density_intercept,
                }
            }
        };
        debug!(%unit, slope = transform.slope, intercept = transform.intercept, "Unit transform");
        Ok(transform)
    }

    pub fn apply(&self, native: f64) -> f64 {
        native * self.slope + self.intercept
    }

    pub fn invert(&self, value: f64) -> f64 {
        (value - self.intercept) / self.slope
    }
}

/// Scales native values to `unit`.
///
/// `calibration` must be present for every unit except [`Unit::Native`].
pub fn to_unit(native: &Array3<f64>, unit: Unit, calibration: Option<&CalibrationConstants>) -> Result<Array3<f64>> {
    if unit == Unit::Native {
        return Ok(native.clone());
    }
    let calibration = require(unit, calibration)?;
    let transform = UnitTransform::for_unit(unit, Some(calibration))?;

    Ok(match unit {
        // Keep the legacy operation order so results match bit for bit
        Unit::Mu => native.mapv(|v| v / calibration.mu_scaling),
        Unit::Bmd => native.mapv(|v| {
            v / calibration.mu_scaling * calibration.density_slope + calibration.density_intercept
        }),
        Unit::Hu | Unit::Native => native.mapv(|v| transform.apply(v)),
    })
}

/// Recovers native values from values stored in `unit`.
pub fn to_native(values: &Array3<f64>, unit: Unit, calibration: Option<&CalibrationConstants>) -> Result<Array3<f64>> {
    if unit == Unit::Native {
        return Ok(values.clone());
    }
    let calibration = require(unit, calibration)?;
    let transform = UnitTransform::for_unit(unit, Some(calibration))?;

    Ok(match unit {
        Unit::Mu => values.mapv(|v| v * calibration.mu_scaling),
        Unit::Bmd => values.mapv(|v| {
            (v - calibration.density_intercept) * calibration.mu_scaling / calibration.density_slope
        }),
        Unit::Hu | Unit::Native => values.mapv(|v| transform.invert(v)),
    })
}

// Divisors of the forward or inverse map
fn nonzero(key: &str, value: f64) -> Result<()> {
    if value == 0.0 || !value.is_finite() {
        return Err(ConversionError::InvalidCalibrationValue {
            key: key.to_string(),
            reason: format!("{value} cannot be used as a divisor"),
        });
    }
    Ok(())
}

fn require(unit: Unit, calibration: Option<&CalibrationConstants>) -> Result<&CalibrationConstants> {
    calibration.ok_or_else(|| ConversionError::InvalidCalibrationValue {
        key: unit.as_str().to_string(),
        reason: "calibration constants required for calibrated units".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn constants() -> CalibrationConstants {
        CalibrationConstants {
            mu_scaling: 8192.0,
            hu_mu_water: 0.2409,
            hu_mu_air: 0.0,
            density_slope: 1603.04004,
            density_intercept: -2.0,
        }
    }

    fn native_ramp() -> Array3<f64> {
        Array::from_shape_fn((3, 4, 5), |(x, y, z)| (x * 100 + y * 10 + z) as f64 - 50.0)
    }

    #[test]
    fn test_zeros_to_bmd_yield_intercept() {
        let zeros = Array3::<f64>::zeros((4, 4, 4));
        let bmd = to_unit(&zeros, Unit::Bmd, Some(&constants())).unwrap();
        assert!(bmd.iter().all(|&v| v == -2.0));
    }

    #[test]
    fn test_mu_divides_by_scaling() {
        let native = Array3::from_elem((2, 2, 2), 8192.0);
        let mu = to_unit(&native, Unit::Mu, Some(&constants())).unwrap();
        assert!(mu.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_hu_uses_affine_map_on_native_values() {
        let c = constants();
        let water = Array3::from_elem((1, 1, 1), c.hu_mu_water * c.mu_scaling);
        let hu = to_unit(&water, Unit::Hu, Some(&c)).unwrap();
        assert!(hu[[0, 0, 0]].abs() < 1e-9);

        let air = Array3::zeros((1, 1, 1));
        let hu = to_unit(&air, Unit::Hu, Some(&c)).unwrap();
        assert!((hu[[0, 0, 0]] + 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_all_units() {
        let native = native_ramp();
        for unit in [Unit::Native, Unit::Mu, Unit::Hu, Unit::Bmd] {
            let scaled = to_unit(&native, unit, Some(&constants())).unwrap();
            let restored = to_native(&scaled, unit, Some(&constants())).unwrap();
            for (a, b) in native.iter().zip(restored.iter()) {
                assert!((a - b).abs() < 1e-9, "{unit}: {a} != {b}");
            }
        }
    }

    #[test]
    fn test_native_needs_no_calibration() {
        let native = native_ramp();
        assert_eq!(to_unit(&native, Unit::Native, None).unwrap(), native);
        assert_eq!(to_native(&native, Unit::Native, None).unwrap(), native);
        assert!(to_unit(&native, Unit::Mu, None).is_err());
    }

    #[test]
    fn test_zero_mu_scaling_is_rejected() {
        let c = CalibrationConstants { mu_scaling: 0.0, ..constants() };
        let native = Array3::from_elem((1, 1, 1), 100.0);

        for unit in [Unit::Mu, Unit::Hu, Unit::Bmd] {
            assert!(
                matches!(
                    to_unit(&native, unit, Some(&c)),
                    Err(ConversionError::InvalidCalibrationValue { .. })
                ),
                "{unit} accepted a zero scaling"
            );
            assert!(to_native(&native, unit, Some(&c)).is_err());
        }
    }

    #[test]
    fn test_zero_density_slope_is_rejected() {
        let c = CalibrationConstants { density_slope: 0.0, ..constants() };
        let native = Array3::from_elem((1, 1, 1), 100.0);

        match to_unit(&native, Unit::Bmd, Some(&c)) {
            Err(ConversionError::InvalidCalibrationValue { key, .. }) => assert_eq!(key, "Density: slope"),
            other => panic!("expected InvalidCalibrationValue, got {other:?}"),
        }
        assert!(to_native(&native, Unit::Bmd, Some(&c)).is_err());
        // the other units do not divide by the density slope
        assert!(to_unit(&native, Unit::Mu, Some(&c)).is_ok());
        assert!(to_unit(&native, Unit::Hu, Some(&c)).is_ok());
    }

    #[test]
    fn test_transform_matches_array_conversion() {
        let c = constants();
        for unit in [Unit::Mu, Unit::Hu, Unit::Bmd] {
            let transform = UnitTransform::for_unit(unit, Some(&c)).unwrap();
            let value = to_unit(&Array3::from_elem((1, 1, 1), 1234.0), unit, Some(&c)).unwrap();
            assert!((transform.apply(1234.0) - value[[0, 0, 0]]).abs() < 1e-9);
            assert!((transform.invert(value[[0, 0, 0]]) - 1234.0).abs() < 1e-9);
        }
    }
}
