//! Input-impedance engine boundary and the built-in transfer-matrix engine.
//!
//! The engine works in SI units: bore positions and diameters in metres,
//! frequencies in Hz, impedance in Pa·s/m³. Unit conversion from the mm
//! geometry is the adapter's job.
//!
//! [`TransferMatrixEngine`] models the bore as a chain of cylinders, one per
//! sampled interval, each described by the plane-wave transfer matrix
//!
//! ```text
//! | p_in |   | cos kL        j·Zc·sin kL | | p_out |
//! | U_in | = | j·sin kL / Zc cos kL      | | U_out |
//! ```
//!
//! with `Zc = ρc / (πa²)` and a complex wavenumber `k = ω/c − jα` when wall
//! losses are enabled. The far end is loaded by the unflanged-pipe radiation
//! impedance (low-frequency approximation).

use nalgebra::{Complex, Matrix2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ratio of specific heats of air.
pub const GAMMA_AIR: f64 = 1.402;
/// Prandtl number of air.
pub const PRANDTL_AIR: f64 = 0.71;
/// Unflanged end correction coefficient (Levine–Schwinger).
pub const UNFLANGED_END_CORRECTION: f64 = 0.6133;
/// Standard atmospheric pressure (Pa).
pub const ATMOSPHERIC_PRESSURE: f64 = 101_325.0;

const ZERO_CELSIUS_K: f64 = 273.15;
const R_DRY_AIR: f64 = 287.058;
const R_WATER_VAPOUR: f64 = 461.495;

/// Errors internal to an impedance engine.
///
/// Adapters translate these into `BoreError::SimulationFailure`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("bore needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    #[error("non-positive radius {radius} m at point {index}")]
    NonPositiveRadius { index: usize, radius: f64 },

    #[error("bore positions must strictly increase (point {index})")]
    NonIncreasingPosition { index: usize },

    #[error("frequency axis is empty")]
    EmptyFrequencyAxis,

    #[error("input impedance is not finite at {frequency} Hz")]
    NonFinite { frequency: f64 },

    #[error("invalid ambient conditions: {0}")]
    InvalidConditions(String),
}

/// Everything an engine needs for one sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineRequest {
    /// `(position, diameter)` pairs in metres, entry first
    pub bore: Vec<(f64, f64)>,
    /// Air temperature (°C)
    pub temperature: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Include visco-thermal wall losses
    pub losses: bool,
    /// Kinematic viscosity used for the boundary layer (m²/s)
    pub kinematic_viscosity: f64,
    /// Frequencies to evaluate (Hz)
    pub frequencies: Vec<f64>,
}

/// Complex input impedance over the requested frequencies.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineResponse {
    pub frequencies: Vec<f64>,
    pub impedance: Vec<Complex<f64>>,
    /// Speed of sound used (m/s)
    pub speed_of_sound: f64,
    /// Air density used (kg/m³)
    pub air_density: f64,
}

/// Computes the input impedance of a bore.
pub trait ImpedanceEngine {
    fn compute(&self, request: &EngineRequest) -> Result<EngineResponse, EngineError>;
}

/// Speed of sound and density of humid air.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirProperties {
    /// m/s
    pub speed_of_sound: f64,
    /// kg/m³
    pub density: f64,
}

impl AirProperties {
    /// Properties at `temperature` °C and `humidity` % RH, sea-level pressure.
    pub fn at(temperature: f64, humidity: f64) -> Result<Self, EngineError> {
        let t_kelvin = temperature + ZERO_CELSIUS_K;
        if !(t_kelvin.is_finite() && t_kelvin > 0.0) {
            return Err(EngineError::InvalidConditions(format!(
                "temperature {temperature} °C"
            )));
        }
        if !(humidity.is_finite() && (0.0..=100.0).contains(&humidity)) {
            return Err(EngineError::InvalidConditions(format!(
                "relative humidity {humidity} %"
            )));
        }

        // Magnus formula for the saturation vapour pressure.
        let p_sat = 610.78 * 10f64.powf(7.5 * temperature / (temperature + 237.3));
        let p_vapour = (humidity / 100.0) * p_sat;
        let p_dry = ATMOSPHERIC_PRESSURE - p_vapour;
        let density = p_dry / (R_DRY_AIR * t_kelvin) + p_vapour / (R_WATER_VAPOUR * t_kelvin);

        let speed_of_sound = 331.45 * (t_kelvin / ZERO_CELSIUS_K).sqrt() + 0.0124 * humidity;

        Ok(Self {
            speed_of_sound,
            density,
        })
    }

    /// Characteristic impedance of a duct of radius `radius` (m).
    pub fn characteristic_impedance(&self, radius: f64) -> f64 {
        self.density * self.speed_of_sound / (std::f64::consts::PI * radius * radius)
    }
}

/// Plane-wave transfer-matrix engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferMatrixEngine;

impl TransferMatrixEngine {
    pub fn new() -> Self {
        Self
    }

    fn validate(request: &EngineRequest) -> Result<(), EngineError> {
        if request.bore.len() < 2 {
            return Err(EngineError::TooFewPoints(request.bore.len()));
        }
        for (index, &(position, diameter)) in request.bore.iter().enumerate() {
            if !(diameter.is_finite() && diameter > 0.0) {
                return Err(EngineError::NonPositiveRadius {
                    index,
                    radius: diameter / 2.0,
                });
            }
            if !position.is_finite() {
                return Err(EngineError::NonIncreasingPosition { index });
            }
        }
        if let Some(index) = request
            .bore
            .windows(2)
            .position(|w| w[1].0 <= w[0].0)
        {
            return Err(EngineError::NonIncreasingPosition { index: index + 1 });
        }
        if request.frequencies.is_empty() {
            return Err(EngineError::EmptyFrequencyAxis);
        }
        Ok(())
    }

    /// Chain matrix of the whole bore at angular frequency `omega`.
    fn chain_matrix(
        bore: &[(f64, f64)],
        omega: f64,
        air: &AirProperties,
        loss_factor: Option<f64>,
    ) -> Matrix2<Complex<f64>> {
        let j = Complex::new(0.0, 1.0);
        let c = air.speed_of_sound;

        bore.windows(2).fold(Matrix2::identity(), |acc, w| {
            let length = w[1].0 - w[0].0;
            let radius = (w[0].1 + w[1].1) / 4.0;
            let zc = air.characteristic_impedance(radius);

            let alpha = loss_factor.map_or(0.0, |factor| factor * (omega).sqrt() / (radius * c));
            let k = Complex::new(omega / c, -alpha);
            let kl = k * length;
            let (cos, sin) = (kl.cos(), kl.sin());

            let segment = Matrix2::new(cos, j * sin * zc, j * sin / zc, cos);
            acc * segment
        })
    }
}

impl ImpedanceEngine for TransferMatrixEngine {
    fn compute(&self, request: &EngineRequest) -> Result<EngineResponse, EngineError> {
        Self::validate(request)?;
        let air = AirProperties::at(request.temperature, request.humidity)?;

        // α = sqrt(ων/2)·(1 + (γ−1)/√Pr) / (a·c); the ω-independent part here.
        let loss_factor = (request.losses && request.kinematic_viscosity > 0.0).then(|| {
            (request.kinematic_viscosity / 2.0).sqrt() * (1.0 + (GAMMA_AIR - 1.0) / PRANDTL_AIR.sqrt())
        });

        let j = Complex::new(0.0, 1.0);
        let exit_radius = request.bore[request.bore.len() - 1].1 / 2.0;
        let exit_zc = air.characteristic_impedance(exit_radius);

        let mut impedance = Vec::with_capacity(request.frequencies.len());
        for &frequency in &request.frequencies {
            let omega = 2.0 * std::f64::consts::PI * frequency;
            let ka = omega / air.speed_of_sound * exit_radius;
            let z_rad = (Complex::new(ka * ka / 4.0, 0.0) + j * (UNFLANGED_END_CORRECTION * ka)) * exit_zc;

            let m = Self::chain_matrix(&request.bore, omega, &air, loss_factor);
            let z_in = (m[(0, 0)] * z_rad + m[(0, 1)]) / (m[(1, 0)] * z_rad + m[(1, 1)]);

            if !(z_in.re.is_finite() && z_in.im.is_finite()) {
                return Err(EngineError::NonFinite { frequency });
            }
            impedance.push(z_in);
        }

        Ok(EngineResponse {
            frequencies: request.frequencies.clone(),
            impedance,
            speed_of_sound: air.speed_of_sound,
            air_density: air.density,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cylinder_request(length: f64, diameter: f64, losses: bool) -> EngineRequest {
        let n = 11;
        EngineRequest {
            bore: (0..n)
                .map(|i| (length * i as f64 / (n - 1) as f64, diameter))
                .collect(),
            temperature: 20.0,
            humidity: 0.0,
            losses,
            kinematic_viscosity: 1.5e-5,
            frequencies: (1..=2000).map(|f| f as f64).collect(),
        }
    }

    #[test]
    fn air_properties_at_room_temperature() {
        let air = AirProperties::at(20.0, 0.0).unwrap();
        assert!((air.speed_of_sound - 343.2).abs() < 0.5);
        assert!((air.density - 1.204).abs() < 0.01);

        let humid = AirProperties::at(20.0, 100.0).unwrap();
        assert!(humid.density < air.density);
        assert!(humid.speed_of_sound > air.speed_of_sound);

        assert!(AirProperties::at(-300.0, 50.0).is_err());
        assert!(AirProperties::at(20.0, 120.0).is_err());
    }

    #[test]
    fn lossless_cylinder_resonates_near_quarter_wave() {
        let request = cylinder_request(0.3, 0.015, false);
        let response = TransferMatrixEngine.compute(&request).unwrap();
        let magnitudes: Vec<f64> = response.impedance.iter().map(|z| z.norm()).collect();

        let peak = (1..magnitudes.len() - 1)
            .find(|&i| magnitudes[i] > magnitudes[i - 1] && magnitudes[i] >= magnitudes[i + 1])
            .unwrap();
        let f_peak = response.frequencies[peak];

        // Closed-open pipe with end correction 0.6133·a.
        let c = response.speed_of_sound;
        let expected = c / (4.0 * (0.3 + 0.6133 * 0.0075));
        assert!((f_peak - expected).abs() < 3.0, "peak {f_peak} vs {expected}");
    }

    #[test]
    fn losses_reduce_peak_height() {
        let lossless = TransferMatrixEngine
            .compute(&cylinder_request(0.3, 0.015, false))
            .unwrap();
        let lossy = TransferMatrixEngine
            .compute(&cylinder_request(0.3, 0.015, true))
            .unwrap();
        let max = |r: &EngineResponse| r.impedance.iter().map(|z| z.norm()).fold(0.0, f64::max);
        assert!(max(&lossy) < max(&lossless));
    }

    #[test]
    fn rejects_bad_requests() {
        let mut request = cylinder_request(0.1, 0.015, true);
        request.bore.truncate(1);
        assert_eq!(
            TransferMatrixEngine.compute(&request).unwrap_err(),
            EngineError::TooFewPoints(1)
        );

        let mut request = cylinder_request(0.1, 0.015, true);
        request.bore[3].1 = 0.0;
        assert!(matches!(
            TransferMatrixEngine.compute(&request),
            Err(EngineError::NonPositiveRadius { index: 3, .. })
        ));

        let mut request = cylinder_request(0.1, 0.015, true);
        request.bore[4].0 = request.bore[3].0;
        assert_eq!(
            TransferMatrixEngine.compute(&request).unwrap_err(),
            EngineError::NonIncreasingPosition { index: 4 }
        );

        let mut request = cylinder_request(0.1, 0.015, true);
        request.frequencies.clear();
        assert_eq!(
            TransferMatrixEngine.compute(&request).unwrap_err(),
            EngineError::EmptyFrequencyAxis
        );
    }
}
