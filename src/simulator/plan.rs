//! Dive plans handed to a simulator.

use serde::Serialize;

use super::SimulatorError;
use crate::config::TravelRates;
use crate::dive::GasMix;
use crate::gf::GradientFactor;

/// GF low/high pair, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GfSetting {
    pub low: GradientFactor,
    pub high: GradientFactor,
}

impl GfSetting {
    /// GF low equal to GF high.
    pub const fn symmetric(gf: GradientFactor) -> Self {
        Self { low: gf, high: gf }
    }
}

impl std::fmt::Display for GfSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.low, self.high)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tank {
    pub gas: GasMix,
    pub enabled: bool,
}

impl Tank {
    pub const fn enabled(gas: GasMix) -> Self {
        Self { gas, enabled: true }
    }

    pub const fn disabled() -> Self {
        Self {
            gas: GasMix::AIR,
            enabled: false,
        }
    }
}

/// Tank slots of a plan. Only the bottom tank is used for the fitting plans.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tanks {
    pub bottom: Tank,
    pub deco1: Tank,
    pub deco2: Tank,
    pub travel: Tank,
}

impl Tanks {
    /// Bottom gas only, all deco and travel tanks disabled.
    pub const fn bottom_only(gas: GasMix) -> Self {
        Self {
            bottom: Tank::enabled(gas),
            deco1: Tank::disabled(),
            deco2: Tank::disabled(),
            travel: Tank::disabled(),
        }
    }

    /// Gases of the enabled tanks, bottom gas first.
    pub fn enabled_gases(&self) -> Vec<GasMix> {
        [self.bottom, self.deco1, self.deco2, self.travel]
            .into_iter()
            .filter(|tank| tank.enabled)
            .map(|tank| tank.gas)
            .collect()
    }
}

/// One dive of a repetitive sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RepeatDive {
    pub bottom_time_min: f64,
    pub gf: GfSetting,
}

/// Dives separated by a surface interval, all to the plan's bottom depth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepetitiveSchedule {
    pub surface_interval_hours: f64,
    pub dives: Vec<RepeatDive>,
}

/// Everything a simulator needs to produce one schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DivePlan {
    pub bottom_time_min: f64,
    pub bottom_depth_m: f64,
    pub max_depth_m: f64,
    pub rates: TravelRates,
    pub descent_time_min: f64,
    pub last_stop_depth_m: f64,
    pub gf: GfSetting,
    pub tanks: Tanks,
    /// Present for repetitive-dive plans; overrides bottom time and GF per dive.
    pub repetitive: Option<RepetitiveSchedule>,
}

impl DivePlan {
    /// Square single-dive profile on one bottom gas with default travel rates.
    pub fn single(depth_m: f64, bottom_time_min: f64, gf: GfSetting, gas: GasMix) -> Self {
        let rates = TravelRates::default();
        Self {
            bottom_time_min,
            bottom_depth_m: depth_m,
            max_depth_m: depth_m,
            rates,
            descent_time_min: depth_m / rates.descent,
            last_stop_depth_m: 3.0,
            gf,
            tanks: Tanks::bottom_only(gas),
            repetitive: None,
        }
    }

    /// Two or more dives to the same depth, separated by one surface interval.
    pub fn repetitive(depth_m: f64, gas: GasMix, schedule: RepetitiveSchedule) -> Self {
        let first = schedule.dives.first().copied();
        let mut plan = Self::single(
            depth_m,
            first.map_or(0.0, |d| d.bottom_time_min),
            first.map_or(GfSetting::symmetric(100), |d| d.gf),
            gas,
        );
        plan.repetitive = Some(schedule);
        plan
    }

    /// Replace travel rates and last stop depth; descent time follows the new rate.
    pub fn with_travel(mut self, rates: TravelRates, last_stop_depth_m: f64) -> Self {
        self.rates = rates;
        self.descent_time_min = self.bottom_depth_m / rates.descent;
        self.last_stop_depth_m = last_stop_depth_m;
        self
    }

    pub fn dive_count(&self) -> usize {
        self.repetitive.as_ref().map_or(1, |s| s.dives.len())
    }

    /// Per-dive bottom time and GF, in order.
    pub fn dives(&self) -> Vec<RepeatDive> {
        match &self.repetitive {
            Some(schedule) => schedule.dives.clone(),
            None => vec![RepeatDive {
                bottom_time_min: self.bottom_time_min,
                gf: self.gf,
            }],
        }
    }

    /// Structural checks every simulator backend relies on.
    pub fn validate(&self) -> Result<(), SimulatorError> {
        let invalid = |reason: String| Err(SimulatorError::InvalidPlan { reason });

        if !(self.bottom_depth_m.is_finite() && self.bottom_depth_m > 0.0) {
            return invalid(format!("bottom depth {} m", self.bottom_depth_m));
        }
        if self.max_depth_m < self.bottom_depth_m {
            return invalid(format!(
                "max depth {} m is shallower than bottom depth {} m",
                self.max_depth_m, self.bottom_depth_m
            ));
        }
        let rates = [
            self.rates.descent,
            self.rates.ascent_to_deco,
            self.rates.ascent_at_deco,
            self.rates.ascent_to_surface,
        ];
        if rates.iter().any(|r| !(r.is_finite() && *r > 0.0)) {
            return invalid(format!("travel rates must be positive: {:?}", self.rates));
        }
        if !self.tanks.bottom.enabled {
            return invalid("bottom tank is disabled".to_string());
        }
        for gas in self.tanks.enabled_gases() {
            if gas.validate().is_err() {
                return invalid(format!("gas {gas} is not a valid mix"));
            }
        }
        if let Some(schedule) = &self.repetitive {
            if schedule.dives.is_empty() {
                return invalid("repetitive schedule has no dives".to_string());
            }
            if !(schedule.surface_interval_hours.is_finite()
                && schedule.surface_interval_hours >= 0.0)
            {
                return invalid(format!(
                    "surface interval {} h",
                    schedule.surface_interval_hours
                ));
            }
        }
        for dive in self.dives() {
            if !(dive.bottom_time_min.is_finite() && dive.bottom_time_min > 0.0) {
                return invalid(format!("bottom time {} min", dive.bottom_time_min));
            }
            if dive.gf.low < 1 || dive.gf.high < 1 {
                return invalid(format!("gradient factors {} below 1", dive.gf));
            }
        }
        Ok(())
    }
}
