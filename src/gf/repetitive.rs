//! Repetitive-dive GF search.
//!
//! Given a first dive, a surface interval and a second dive whose length is
//! the table no-decompression time, find where ZHL-16C starts asking for a
//! stop on the second dive.

use serde::Serialize;

use crate::config::{GfDomain, Settings};
use crate::dive::{require_non_negative, require_positive, GasMix};
use crate::error::{Error, Result, SearchKind};
use crate::risk::units::meters_to_feet;
use crate::simulator::{DivePlan, GfSetting, RepeatDive, RepetitiveSchedule, Simulator};

use super::GradientFactor;

/// Ceiling assigned to candidates the simulator could not schedule.
pub const INFEASIBLE_CEILING_M: f64 = -100.0;

/// Table lookup of the no-decompression time left for a second dive.
///
/// Returns 0 when the first dive already required decompression.
pub trait NoDecoTimeLookup {
    fn no_deco_time_min(
        &self,
        first_dive_time_min: f64,
        surface_interval_hours: f64,
        depth_ft: f64,
    ) -> f64;
}

impl<F> NoDecoTimeLookup for F
where
    F: Fn(f64, f64, f64) -> f64,
{
    fn no_deco_time_min(
        &self,
        first_dive_time_min: f64,
        surface_interval_hours: f64,
        depth_ft: f64,
    ) -> f64 {
        self(first_dive_time_min, surface_interval_hours, depth_ft)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoDecoGf {
    pub gf: GradientFactor,
    /// Deepest ceiling seen at `gf`; always positive.
    pub max_ceiling_m: f64,
    /// The scan began at the simulator's GF limit, below the top of the
    /// domain, and `gf` is that limit. The real answer may lie above it.
    pub capped: bool,
    pub candidates_evaluated: usize,
    pub infeasible_candidates: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RepetitiveRecommendation {
    pub second_dive_time_min: f64,
    pub search: NoDecoGf,
}

/// Scan the repetitive domain from the top and return the first GF at which
/// the two-dive sequence shows a positive ceiling.
///
/// The first dive always runs at the configured check-dive GF. Infeasible
/// candidates count as [`INFEASIBLE_CEILING_M`] and the scan continues.
///
/// The value returned is the highest GF that does require a stop, not the one
/// above it that still avoids one. Callers wanting the last stop-free GF must
/// add one themselves.
///
/// Candidates above [`Simulator::max_gradient_factor`] would all run at that
/// limit, so the scan starts there instead. A hit on the very first candidate
/// is then marked [`NoDecoGf::capped`].
pub fn find_no_deco_gf_high<S: Simulator + ?Sized>(
    simulator: &S,
    settings: &Settings,
    depth_m: f64,
    dive_times_min: [f64; 2],
    surface_interval_hours: f64,
) -> Result<NoDecoGf> {
    require_positive("depth", depth_m)?;
    require_positive("first_dive_time", dive_times_min[0])?;
    require_positive("second_dive_time", dive_times_min[1])?;
    require_non_negative("surface_time", surface_interval_hours)?;

    let domain = scanned_domain(simulator, settings.repetitive_domain)?;
    let capped_top = domain.highest < settings.repetitive_domain.highest;
    if let Some(limit) = simulator.max_gradient_factor() {
        if settings.check_dive_gf > limit {
            tracing::warn!(
                check_dive_gf = settings.check_dive_gf,
                limit,
                "simulator runs the check dive at its GF limit"
            );
        }
    }
    let check_dive = GfSetting::symmetric(settings.check_dive_gf);
    let mut evaluated = 0;
    let mut infeasible = 0;

    for candidate in domain.candidates() {
        evaluated += 1;
        let schedule = RepetitiveSchedule {
            surface_interval_hours,
            dives: vec![
                RepeatDive {
                    bottom_time_min: dive_times_min[0],
                    gf: check_dive,
                },
                RepeatDive {
                    bottom_time_min: dive_times_min[1],
                    gf: GfSetting::symmetric(candidate),
                },
            ],
        };
        let plan = DivePlan::repetitive(depth_m, GasMix::AIR, schedule)
            .with_travel(settings.rates, settings.last_stop_depth_m);

        let max_ceiling = match simulator.simulate(&plan) {
            Ok(result) => result.max_ceiling().unwrap_or(INFEASIBLE_CEILING_M),
            Err(err) => {
                infeasible += 1;
                tracing::debug!(gf = candidate, error = %err, "candidate infeasible");
                INFEASIBLE_CEILING_M
            }
        };

        if max_ceiling > 0.0 {
            let capped = capped_top && candidate == domain.highest;
            if capped {
                tracing::warn!(
                    gf = candidate,
                    requested_highest = settings.repetitive_domain.highest,
                    "second dive needs a stop at the simulator's GF limit"
                );
            }
            tracing::info!(
                gf = candidate,
                max_ceiling_m = max_ceiling,
                depth_m,
                surface_interval_hours,
                "second dive first needs a stop"
            );
            return Ok(NoDecoGf {
                gf: candidate,
                max_ceiling_m: max_ceiling,
                capped,
                candidates_evaluated: evaluated,
                infeasible_candidates: infeasible,
            });
        }
        tracing::debug!(gf = candidate, max_ceiling_m = max_ceiling, "no stop required");
    }

    tracing::warn!(
        highest = domain.highest,
        lowest = domain.lowest,
        infeasible,
        "no candidate produced a mandatory stop"
    );
    Err(Error::SearchExhausted {
        search: SearchKind::NoDecoCeiling,
        highest: domain.highest,
        lowest: domain.lowest,
        infeasible,
    })
}

/// The configured domain, topped at what `simulator` can represent.
fn scanned_domain<S: Simulator + ?Sized>(simulator: &S, domain: GfDomain) -> Result<GfDomain> {
    let Some(limit) = simulator.max_gradient_factor() else {
        return Ok(domain);
    };
    if domain.lowest > limit {
        return Err(Error::Config {
            key: "GF_REPETITIVE_LOWEST".to_string(),
            message: format!(
                "{} is above the simulator's GF limit of {limit}",
                domain.lowest
            ),
        });
    }
    Ok(GfDomain::new(domain.highest.min(limit), domain.lowest))
}

/// Look up the second dive's no-decompression time, then run
/// [`find_no_deco_gf_high`] with it.
pub fn recommend_repetitive<S, L>(
    simulator: &S,
    settings: &Settings,
    lookup: &L,
    depth_m: f64,
    first_dive_time_min: f64,
    surface_interval_hours: f64,
) -> Result<RepetitiveRecommendation>
where
    S: Simulator + ?Sized,
    L: NoDecoTimeLookup + ?Sized,
{
    require_positive("depth", depth_m)?;
    require_positive("first_dive_time", first_dive_time_min)?;
    require_non_negative("surface_time", surface_interval_hours)?;

    let second_dive_time_min = lookup.no_deco_time_min(
        first_dive_time_min,
        surface_interval_hours,
        meters_to_feet(depth_m),
    );
    if !(second_dive_time_min.is_finite() && second_dive_time_min > 0.0) {
        return Err(Error::NoDecoTimeUnavailable);
    }

    let search = find_no_deco_gf_high(
        simulator,
        settings,
        depth_m,
        [first_dive_time_min, second_dive_time_min],
        surface_interval_hours,
    )?;
    Ok(RepetitiveRecommendation {
        second_dive_time_min,
        search,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    use crate::simulator::{BuhlmannSimulator, SimulationResult, SimulatorError};
    use crate::test_helpers::{ceiling_simulator, RecordingSimulator};

    /// Stub backend that, like ZHL-16C here, cannot go above GF 100.
    struct CappedAt100<F>(F);

    impl<F> Simulator for CappedAt100<F>
    where
        F: Fn(&DivePlan) -> std::result::Result<SimulationResult, SimulatorError>,
    {
        fn simulate(
            &self,
            plan: &DivePlan,
        ) -> std::result::Result<SimulationResult, SimulatorError> {
            (self.0)(plan)
        }

        fn max_gradient_factor(&self) -> Option<GradientFactor> {
            Some(100)
        }
    }

    /// Ceiling turns positive once the second dive's GF drops to `limit`.
    fn stop_below(limit: GradientFactor) -> impl Fn(GradientFactor) -> Option<f64> {
        move |gf| Some(if gf <= limit { 3.0 } else { -1.0 })
    }

    #[test]
    fn test_returns_first_gf_needing_a_stop() {
        let sim = ceiling_simulator(stop_below(99));
        let found =
            find_no_deco_gf_high(&sim, &Settings::default(), 18.0, [40.0, 30.0], 1.0).unwrap();
        assert!(found.gf >= 99);
        assert_eq!(found.gf, 99);
        assert_eq!(found.max_ceiling_m, 3.0);
        assert_eq!(found.candidates_evaluated, 22);
    }

    #[test]
    fn test_uncapped_backend_is_never_flagged() {
        let sim = ceiling_simulator(|_| Some(0.5));
        let found =
            find_no_deco_gf_high(&sim, &Settings::default(), 30.0, [25.0, 20.0], 0.5).unwrap();
        assert!(!found.capped);
    }

    #[test]
    fn test_scan_starts_at_backend_limit() {
        let sim = CappedAt100(ceiling_simulator(|_| Some(2.0)));
        let found =
            find_no_deco_gf_high(&sim, &Settings::default(), 30.0, [20.0, 25.0], 1.0).unwrap();
        assert_eq!(found.gf, 100);
        assert!(found.capped);
        assert_eq!(found.candidates_evaluated, 1);

        let sim = CappedAt100(ceiling_simulator(stop_below(90)));
        let found =
            find_no_deco_gf_high(&sim, &Settings::default(), 18.0, [40.0, 30.0], 1.0).unwrap();
        assert_eq!(found.gf, 90);
        assert!(!found.capped);
        assert_eq!(found.candidates_evaluated, 11);
    }

    #[test]
    fn test_domain_entirely_above_backend_limit() {
        let sim = CappedAt100(ceiling_simulator(|_| Some(2.0)));
        let mut settings = Settings::default();
        settings.repetitive_domain = GfDomain::new(120, 105);
        assert!(matches!(
            find_no_deco_gf_high(&sim, &settings, 30.0, [20.0, 25.0], 1.0),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_zhl16c_stop_at_gf_100_is_capped() {
        let found = find_no_deco_gf_high(
            &BuhlmannSimulator::default(),
            &Settings::default(),
            30.0,
            [20.0, 25.0],
            1.0,
        )
        .unwrap();
        assert_eq!(found.gf, 100);
        assert!(found.capped);
        assert_eq!(found.candidates_evaluated, 1);
        assert!(found.max_ceiling_m > 0.0);
    }

    #[test]
    fn test_zhl16c_no_deco_repeat_resolves_below_limit() {
        let found = find_no_deco_gf_high(
            &BuhlmannSimulator::default(),
            &Settings::default(),
            18.0,
            [40.0, 30.0],
            1.0,
        )
        .unwrap();
        assert!(!found.capped);
        assert!((51..100).contains(&found.gf), "got {}", found.gf);
    }

    #[test]
    fn test_literal_off_by_one() {
        // 88 is the lowest GF that keeps the second dive stop-free; the search
        // reports 87, the first one that does not.
        let sim = ceiling_simulator(stop_below(87));
        let found =
            find_no_deco_gf_high(&sim, &Settings::default(), 18.0, [40.0, 30.0], 1.0).unwrap();
        assert_eq!(found.gf, 87);
    }

    #[test]
    fn test_positive_at_top_of_domain() {
        let sim = ceiling_simulator(|_| Some(0.5));
        let found =
            find_no_deco_gf_high(&sim, &Settings::default(), 30.0, [25.0, 20.0], 0.5).unwrap();
        assert_eq!(found.gf, 120);
        assert_eq!(found.candidates_evaluated, 1);
    }

    #[test]
    fn test_infeasible_candidates_count_as_clear() {
        let sim = ceiling_simulator(|gf| {
            if (95..=100).contains(&gf) {
                None
            } else {
                Some(if gf <= 97 { 6.0 } else { 0.0 })
            }
        });
        let found =
            find_no_deco_gf_high(&sim, &Settings::default(), 18.0, [40.0, 30.0], 1.0).unwrap();
        assert_eq!(found.gf, 94);
        assert_eq!(found.infeasible_candidates, 6);
    }

    #[test]
    fn test_zero_ceiling_is_clear() {
        let sim = ceiling_simulator(|gf| Some(if gf <= 60 { 1.0 } else { 0.0 }));
        let found =
            find_no_deco_gf_high(&sim, &Settings::default(), 18.0, [40.0, 30.0], 1.0).unwrap();
        assert_eq!(found.gf, 60);
    }

    #[test]
    fn test_all_infeasible_is_exhaustion() {
        let sim = ceiling_simulator(|_| None);
        let err =
            find_no_deco_gf_high(&sim, &Settings::default(), 18.0, [40.0, 30.0], 1.0).unwrap_err();
        assert!(matches!(
            err,
            Error::SearchExhausted {
                search: SearchKind::NoDecoCeiling,
                highest: 120,
                lowest: 51,
                infeasible: 70,
            }
        ));
    }

    #[test]
    fn test_never_positive_is_exhaustion() {
        let sim = ceiling_simulator(|_| Some(-2.0));
        let err =
            find_no_deco_gf_high(&sim, &Settings::default(), 18.0, [40.0, 30.0], 1.0).unwrap_err();
        assert!(matches!(err, Error::SearchExhausted { infeasible: 0, .. }));
    }

    #[test]
    fn test_plans_carry_check_dive_and_candidate() {
        let sim = RecordingSimulator::with_ceiling(stop_below(117));
        find_no_deco_gf_high(&sim, &Settings::default(), 21.0, [35.0, 22.0], 1.25).unwrap();

        let plans = sim.plans();
        assert_eq!(plans.len(), 4);
        for (plan, candidate) in plans.iter().zip([120, 119, 118, 117]) {
            let schedule = plan.repetitive.as_ref().unwrap();
            assert_eq!(schedule.surface_interval_hours, 1.25);
            assert_eq!(schedule.dives.len(), 2);
            assert_eq!(schedule.dives[0].gf, GfSetting::symmetric(115));
            assert_eq!(schedule.dives[0].bottom_time_min, 35.0);
            assert_eq!(schedule.dives[1].gf, GfSetting::symmetric(candidate));
            assert_eq!(schedule.dives[1].bottom_time_min, 22.0);
            assert_eq!(plan.bottom_depth_m, 21.0);
        }
    }

    #[test]
    fn test_recommend_uses_lookup_in_feet() {
        let sim = RecordingSimulator::with_ceiling(stop_below(90));
        let lookup = |first: f64, surface: f64, depth_ft: f64| {
            assert_eq!(first, 40.0);
            assert_eq!(surface, 2.0);
            assert_abs_diff_eq!(depth_ft, 59.055118, epsilon = 1e-5);
            27.0
        };
        let rec =
            recommend_repetitive(&sim, &Settings::default(), &lookup, 18.0, 40.0, 2.0).unwrap();
        assert_eq!(rec.second_dive_time_min, 27.0);
        assert_eq!(rec.search.gf, 90);
        assert_eq!(
            sim.plans()[0].repetitive.as_ref().unwrap().dives[1].bottom_time_min,
            27.0
        );
    }

    #[test]
    fn test_recommend_without_no_deco_time() {
        let sim = RecordingSimulator::with_ceiling(stop_below(90));
        let lookup = |_: f64, _: f64, _: f64| 0.0;
        let err =
            recommend_repetitive(&sim, &Settings::default(), &lookup, 30.0, 60.0, 0.5).unwrap_err();
        assert!(matches!(err, Error::NoDecoTimeUnavailable));
        assert!(sim.plans().is_empty());
    }

    #[test]
    fn test_invalid_inputs() {
        let sim = ceiling_simulator(stop_below(90));
        let settings = Settings::default();
        assert!(find_no_deco_gf_high(&sim, &settings, 0.0, [40.0, 30.0], 1.0).is_err());
        assert!(find_no_deco_gf_high(&sim, &settings, 18.0, [40.0, 0.0], 1.0).is_err());
        assert!(find_no_deco_gf_high(&sim, &settings, 18.0, [40.0, 30.0], -1.0).is_err());
    }
}
