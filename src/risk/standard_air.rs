//! StandardAir probabilistic model (Van Liew & Flynn, NEDU TR 04-42).
//!
//! Maps depth, bottom time and an accepted probability of decompression
//! sickness to the total decompression time (TDT) an air dive needs:
//!
//! ```text
//! TDT = b * (D_ft - c) * (1 - exp(-d * T^f)) / (logit(p) - a) + g
//! ```
//!
//! Negative raw values mean no mandatory decompression and are clipped to 0.

use serde::Serialize;

use super::units::{logit, meters_to_feet};
use crate::config::StandardAirCoefficients;
use crate::dive::{require_non_negative, require_positive, RiskTarget};
use crate::error::{Error, Result};

/// Probabilities drawn as reference curves on the TDT chart.
pub const REFERENCE_PROBABILITIES: [f64; 5] = [0.01, 0.016, 0.02, 0.026, 0.03];

/// Samples per reference curve.
pub const CHART_SAMPLES: usize = 100;

/// The closed-form model with a fixed coefficient set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StandardAirModel {
    coefficients: StandardAirCoefficients,
}

impl StandardAirModel {
    pub fn new(coefficients: StandardAirCoefficients) -> Self {
        Self { coefficients }
    }

    pub fn coefficients(&self) -> &StandardAirCoefficients {
        &self.coefficients
    }

    /// Required total decompression time in minutes.
    pub fn tdt(&self, depth_m: f64, bottom_time_min: f64, risk: RiskTarget) -> Result<f64> {
        require_positive("depth", depth_m)?;
        require_positive("bottom_time", bottom_time_min)?;
        let denominator = self.risk_denominator(risk)?;
        Ok(self.evaluate(depth_m, bottom_time_min, denominator))
    }

    /// TDT at each of `times`, for plotting sweeps. Zero is accepted so a sweep
    /// can start at the origin.
    pub fn tdt_series(&self, depth_m: f64, times: &[f64], risk: RiskTarget) -> Result<Vec<f64>> {
        require_positive("depth", depth_m)?;
        for &t in times {
            require_non_negative("bottom_time", t)?;
        }
        let denominator = self.risk_denominator(risk)?;
        Ok(times
            .iter()
            .map(|&t| self.evaluate(depth_m, t, denominator))
            .collect())
    }

    /// Reference curves and the caller's own point for a TDT-vs-time chart.
    pub fn chart(&self, depth_m: f64, bottom_time_min: f64, risk: RiskTarget) -> Result<TdtChart> {
        let reference_tdt = self.tdt(depth_m, bottom_time_min, risk)?;
        let times = linspace(0.0, bottom_time_min * 2.0, CHART_SAMPLES);

        let curves = REFERENCE_PROBABILITIES
            .iter()
            .map(|&p| {
                let target = RiskTarget::new(p)?;
                let tdt = self.tdt_series(depth_m, &times, target)?;
                Ok(TdtCurve {
                    probability: p,
                    points: times
                        .iter()
                        .zip(tdt)
                        .map(|(&time_min, tdt_min)| TdtPoint { time_min, tdt_min })
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TdtChart {
            depth_m,
            curves,
            reference: TdtPoint {
                time_min: bottom_time_min,
                tdt_min: reference_tdt,
            },
            reference_probability: risk.probability(),
            tdt_axis_max: reference_tdt * 2.0,
        })
    }

    /// `logit(p) - a`. The model has a pole where this reaches zero and turns
    /// meaningless below it, so such probabilities are rejected.
    fn risk_denominator(&self, risk: RiskTarget) -> Result<f64> {
        let denominator = logit(risk.probability())? - self.coefficients.a;
        if denominator <= 0.0 {
            let floor = 1.0 / (1.0 + (-self.coefficients.a).exp());
            return Err(Error::invalid(
                "probability",
                format!(
                    "{} is at or below the model floor of {floor:.5}",
                    risk.probability()
                ),
            ));
        }
        Ok(denominator)
    }

    fn evaluate(&self, depth_m: f64, bottom_time_min: f64, denominator: f64) -> f64 {
        let StandardAirCoefficients { b, c, d, f, g, .. } = self.coefficients;
        let exposure = 1.0 - (-d * bottom_time_min.powf(f)).exp();
        let tdt = b * (meters_to_feet(depth_m) - c) * exposure / denominator + g;
        tdt.max(0.0)
    }
}

/// [`StandardAirModel::tdt`] with the published coefficients.
pub fn standard_air_tdt(depth_m: f64, bottom_time_min: f64, probability: f64) -> Result<f64> {
    StandardAirModel::default().tdt(depth_m, bottom_time_min, RiskTarget::new(probability)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TdtPoint {
    pub time_min: f64,
    pub tdt_min: f64,
}

/// One probability level swept over bottom time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TdtCurve {
    pub probability: f64,
    pub points: Vec<TdtPoint>,
}

/// Chart data: reference curves plus the planned dive's point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TdtChart {
    pub depth_m: f64,
    pub curves: Vec<TdtCurve>,
    pub reference: TdtPoint,
    pub reference_probability: f64,
    /// Suggested upper bound for the TDT axis.
    pub tdt_axis_max: f64,
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}
