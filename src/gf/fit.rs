//! Fit a symmetric gradient factor to a target total decompression time.

use serde::Serialize;

use crate::config::Settings;
use crate::dive::{require_positive, GasMix};
use crate::error::{Error, Result, SearchKind};
use crate::simulator::{DivePlan, GfSetting, Simulator, SimulatorError};

use super::GradientFactor;

/// Outcome of a successful fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GfFit {
    pub gf: GradientFactor,
    /// Simulated TDT at `gf`, strictly above the target.
    pub simulated_tdt_min: f64,
    pub candidates_evaluated: usize,
    pub infeasible_candidates: usize,
}

/// Runs the GF search against one simulator with one set of settings.
#[derive(Debug, Clone, Copy)]
pub struct GfFitter<'a, S: ?Sized> {
    simulator: &'a S,
    settings: &'a Settings,
}

impl<'a, S: Simulator + ?Sized> GfFitter<'a, S> {
    pub fn new(simulator: &'a S, settings: &'a Settings) -> Self {
        Self {
            simulator,
            settings,
        }
    }

    pub fn simulator(&self) -> &'a S {
        self.simulator
    }

    pub fn settings(&self) -> &'a Settings {
        self.settings
    }

    /// Fresh square-profile plan at symmetric `gf` on `gas`.
    pub fn plan(
        &self,
        bottom_time_min: f64,
        depth_m: f64,
        gf: GradientFactor,
        gas: GasMix,
    ) -> DivePlan {
        DivePlan::single(depth_m, bottom_time_min, GfSetting::symmetric(gf), gas)
            .with_travel(self.settings.rates, self.settings.last_stop_depth_m)
    }

    /// Simulated TDT (runtime minus bottom time) at symmetric `gf`.
    pub fn simulated_tdt(
        &self,
        bottom_time_min: f64,
        depth_m: f64,
        gf: GradientFactor,
        gas: GasMix,
    ) -> std::result::Result<f64, SimulatorError> {
        let plan = self.plan(bottom_time_min, depth_m, gf, gas);
        self.simulator
            .simulate(&plan)?
            .total_deco_time_min(bottom_time_min)
    }

    /// Highest GF, scanning down from the top of the fit domain, whose
    /// simulated TDT exceeds `target_tdt_min`.
    ///
    /// Infeasible candidates are skipped. When no candidate qualifies the
    /// search fails with [`Error::SearchExhausted`] instead of returning the
    /// bottom of the domain.
    pub fn fit(
        &self,
        bottom_time_min: f64,
        depth_m: f64,
        target_tdt_min: f64,
        gas: GasMix,
    ) -> Result<GfFit> {
        require_positive("bottom_time", bottom_time_min)?;
        require_positive("depth", depth_m)?;
        if !(target_tdt_min.is_finite() && target_tdt_min >= 0.0) {
            return Err(Error::invalid(
                "target_tdt",
                format!("must be a non-negative number, got {target_tdt_min}"),
            ));
        }
        gas.validate()?;

        let domain = self.settings.fit_domain;
        let mut evaluated = 0;
        let mut infeasible = 0;

        for candidate in domain.candidates() {
            evaluated += 1;
            match self.simulated_tdt(bottom_time_min, depth_m, candidate, gas) {
                Ok(tdt) if tdt > target_tdt_min => {
                    tracing::info!(
                        gf = candidate,
                        tdt_min = tdt,
                        target_tdt_min,
                        depth_m,
                        bottom_time_min,
                        %gas,
                        "fitted gradient factor"
                    );
                    return Ok(GfFit {
                        gf: candidate,
                        simulated_tdt_min: tdt,
                        candidates_evaluated: evaluated,
                        infeasible_candidates: infeasible,
                    });
                }
                Ok(tdt) => {
                    tracing::debug!(gf = candidate, tdt_min = tdt, target_tdt_min, "too short");
                }
                Err(err) => {
                    infeasible += 1;
                    tracing::debug!(gf = candidate, error = %err, "candidate infeasible");
                }
            }
        }

        tracing::warn!(
            highest = domain.highest,
            lowest = domain.lowest,
            infeasible,
            target_tdt_min,
            "no gradient factor reaches the target decompression time"
        );
        Err(Error::SearchExhausted {
            search: SearchKind::TdtFit,
            highest: domain.highest,
            lowest: domain.lowest,
            infeasible,
        })
    }
}

/// Fit with default settings.
pub fn fit_gf_to_tdt<S: Simulator + ?Sized>(
    simulator: &S,
    bottom_time_min: f64,
    depth_m: f64,
    target_tdt_min: f64,
    gas: GasMix,
) -> Result<GfFit> {
    let settings = Settings::default();
    GfFitter::new(simulator, &settings).fit(bottom_time_min, depth_m, target_tdt_min, gas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use crate::test_helpers::{tdt_simulator, RecordingSimulator};

    /// TDT falls by one minute per GF point: 100 -> 10, 50 -> 60.
    fn linear(gf: GradientFactor) -> Option<f64> {
        Some(110.0 - gf as f64)
    }

    #[test]
    fn test_finds_highest_gf_exceeding_target() {
        let sim = tdt_simulator(linear);
        let fit = fit_gf_to_tdt(&sim, 30.0, 40.0, 45.5, GasMix::AIR).unwrap();
        // 110 - 64 = 46 > 45.5, 110 - 65 = 45 is not
        assert_eq!(fit.gf, 64);
        assert_eq!(fit.simulated_tdt_min, 46.0);
        assert_eq!(fit.candidates_evaluated, 37);
    }

    #[test]
    fn test_fit_is_tight() {
        let sim = tdt_simulator(linear);
        let settings = Settings::default();
        let fitter = GfFitter::new(&sim, &settings);
        for target in [12.0, 20.5, 47.0, 80.0, 99.9] {
            let fit = fitter.fit(30.0, 40.0, target, GasMix::AIR).unwrap();
            let at = fitter.simulated_tdt(30.0, 40.0, fit.gf, GasMix::AIR).unwrap();
            assert!(at >= target);
            if fit.gf < 100 {
                let above = fitter
                    .simulated_tdt(30.0, 40.0, fit.gf + 1, GasMix::AIR)
                    .unwrap();
                assert!(above <= target, "GF {} is not the highest", fit.gf);
            }
        }
    }

    #[test]
    fn test_equal_tdt_does_not_stop() {
        let sim = tdt_simulator(linear);
        // GF 60 gives exactly 50, which does not exceed it.
        let fit = fit_gf_to_tdt(&sim, 30.0, 40.0, 50.0, GasMix::AIR).unwrap();
        assert_eq!(fit.gf, 59);
    }

    #[test]
    fn test_zero_target_returns_top_of_domain() {
        let sim = tdt_simulator(linear);
        let fit = fit_gf_to_tdt(&sim, 30.0, 40.0, 0.0, GasMix::AIR).unwrap();
        assert_eq!(fit.gf, 100);
        assert_eq!(fit.candidates_evaluated, 1);
    }

    #[test]
    fn test_infeasible_candidates_are_skipped() {
        let sim = tdt_simulator(|gf| {
            if (70..=80).contains(&gf) {
                None
            } else {
                linear(gf)
            }
        });
        // 75 would be the answer, but 70..=80 are infeasible; 69 gives 41.
        let fit = fit_gf_to_tdt(&sim, 30.0, 40.0, 34.5, GasMix::AIR).unwrap();
        assert_eq!(fit.gf, 69);
        assert_eq!(fit.infeasible_candidates, 11);
    }

    #[test]
    fn test_exhaustion_is_an_error() {
        let sim = tdt_simulator(linear);
        let err = fit_gf_to_tdt(&sim, 30.0, 40.0, 500.0, GasMix::AIR).unwrap_err();
        assert!(matches!(
            err,
            Error::SearchExhausted {
                search: SearchKind::TdtFit,
                highest: 100,
                lowest: 6,
                infeasible: 0,
            }
        ));
    }

    #[test]
    fn test_all_infeasible_reports_count() {
        let sim = tdt_simulator(|_| None);
        let err = fit_gf_to_tdt(&sim, 30.0, 40.0, 10.0, GasMix::AIR).unwrap_err();
        assert!(matches!(err, Error::SearchExhausted { infeasible: 95, .. }));
    }

    #[test]
    fn test_invalid_input_never_reaches_simulator() {
        let sim = RecordingSimulator::new(linear);
        assert!(fit_gf_to_tdt(&sim, 0.0, 40.0, 10.0, GasMix::AIR).is_err());
        assert!(fit_gf_to_tdt(&sim, 30.0, -1.0, 10.0, GasMix::AIR).is_err());
        assert!(fit_gf_to_tdt(&sim, 30.0, 40.0, f64::NAN, GasMix::AIR).is_err());
        assert!(fit_gf_to_tdt(&sim, 30.0, 40.0, 10.0, GasMix { o2: 21.0, he: 90.0 }).is_err());
        assert!(sim.plans().is_empty());
    }

    #[test]
    fn test_each_candidate_gets_a_fresh_plan() {
        let sim = RecordingSimulator::new(linear);
        let gas = GasMix { o2: 21.0, he: 35.0 };
        fit_gf_to_tdt(&sim, 25.0, 45.0, 15.5, gas).unwrap();

        let plans = sim.plans();
        let gfs: Vec<GradientFactor> = plans.iter().map(|p| p.gf.high).collect();
        assert_eq!(gfs, vec![100, 99, 98, 97, 96, 95, 94]);
        for plan in &plans {
            assert_eq!(plan.gf.low, plan.gf.high);
            assert_eq!(plan.bottom_time_min, 25.0);
            assert_eq!(plan.bottom_depth_m, 45.0);
            assert_eq!(plan.max_depth_m, 45.0);
            assert_abs_diff_eq!(plan.descent_time_min, 45.0 / 99.0, epsilon = 1e-12);
            assert_eq!(plan.tanks.enabled_gases(), vec![gas]);
            assert!(plan.repetitive.is_none());
        }
    }

    #[test]
    fn test_custom_domain() {
        let sim = tdt_simulator(linear);
        let settings = Settings {
            fit_domain: crate::config::GfDomain::new(90, 80),
            ..Settings::default()
        };
        let fitter = GfFitter::new(&sim, &settings);
        assert_eq!(fitter.fit(30.0, 40.0, 15.0, GasMix::AIR).unwrap().gf, 90);
        assert!(matches!(
            fitter.fit(30.0, 40.0, 40.0, GasMix::AIR),
            Err(Error::SearchExhausted {
                highest: 90,
                lowest: 80,
                ..
            })
        ));
    }
}
