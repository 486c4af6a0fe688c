//! Engine settings: empirical model coefficients, plan rates and search domains.
//!
//! Defaults reproduce the published calibration. Rates and search bounds can be
//! overridden through `GF_*` environment variables (a `.env` file is honoured by
//! the binary through `dotenvy`).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::gf::GradientFactor;

/// Coefficients of the StandardAir model.
///
/// Source: Van Liew, H. D., and E. T. Flynn. A simple probabilistic model for
/// estimating the risk of standard air dives. NEDU TR 04-42, 2004.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardAirCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub f: f64,
    pub g: f64,
}

impl StandardAirCoefficients {
    pub const NEDU_TR_04_42: Self = Self {
        a: -6.022169,
        b: 86.596315,
        c: 25.091718,
        d: 0.002929,
        f: 0.918547,
        g: -170.304442,
    };
}

impl Default for StandardAirCoefficients {
    fn default() -> Self {
        Self::NEDU_TR_04_42
    }
}

/// Travel rates used when building simulator plans, in metres per minute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelRates {
    pub descent: f64,
    pub ascent_to_deco: f64,
    pub ascent_at_deco: f64,
    pub ascent_to_surface: f64,
}

impl Default for TravelRates {
    fn default() -> Self {
        Self {
            descent: 99.0,
            ascent_to_deco: 10.0,
            ascent_at_deco: 3.0,
            ascent_to_surface: 1.0,
        }
    }
}

/// Inclusive descending candidate range scanned by a GF search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GfDomain {
    pub highest: GradientFactor,
    pub lowest: GradientFactor,
}

impl GfDomain {
    pub const fn new(highest: GradientFactor, lowest: GradientFactor) -> Self {
        Self { highest, lowest }
    }

    /// Candidates from `highest` down to `lowest`.
    pub fn candidates(&self) -> impl Iterator<Item = GradientFactor> {
        (self.lowest..=self.highest).rev()
    }
}

/// What to do with a GF that leaves 1..=100 after additive adjustments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangePolicy {
    #[default]
    Reject,
    Clamp,
}

impl std::str::FromStr for RangePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "clamp" => Ok(Self::Clamp),
            other => Err(format!("expected reject or clamp, got {other:?}")),
        }
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub coefficients: StandardAirCoefficients,
    pub rates: TravelRates,
    /// Depth of the shallowest stop; no-stop ascents slow down here too.
    pub last_stop_depth_m: f64,
    pub fit_domain: GfDomain,
    pub repetitive_domain: GfDomain,
    /// GF used on the first dive of a repetitive sequence.
    pub check_dive_gf: GradientFactor,
    /// Simulated runtimes beyond this are treated as infeasible plans.
    pub max_runtime_min: f64,
    pub range_policy: RangePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            coefficients: StandardAirCoefficients::default(),
            rates: TravelRates::default(),
            last_stop_depth_m: 3.0,
            fit_domain: GfDomain::new(100, 6),
            repetitive_domain: GfDomain::new(120, 51),
            check_dive_gf: 115,
            max_runtime_min: 24.0 * 60.0,
            range_policy: RangePolicy::Reject,
        }
    }
}

impl Settings {
    /// Build settings from `GF_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let settings = Self {
            coefficients: defaults.coefficients,
            rates: TravelRates {
                descent: parse_or(&lookup, "GF_DESCENT_RATE", defaults.rates.descent)?,
                ascent_to_deco: parse_or(
                    &lookup,
                    "GF_ASCENT_RATE_TO_DECO",
                    defaults.rates.ascent_to_deco,
                )?,
                ascent_at_deco: parse_or(
                    &lookup,
                    "GF_ASCENT_RATE_AT_DECO",
                    defaults.rates.ascent_at_deco,
                )?,
                ascent_to_surface: parse_or(
                    &lookup,
                    "GF_ASCENT_RATE_TO_SURFACE",
                    defaults.rates.ascent_to_surface,
                )?,
            },
            last_stop_depth_m: parse_or(&lookup, "GF_LAST_STOP_DEPTH", defaults.last_stop_depth_m)?,
            fit_domain: GfDomain::new(
                parse_or(&lookup, "GF_FIT_HIGHEST", defaults.fit_domain.highest)?,
                parse_or(&lookup, "GF_FIT_LOWEST", defaults.fit_domain.lowest)?,
            ),
            repetitive_domain: GfDomain::new(
                parse_or(
                    &lookup,
                    "GF_REPETITIVE_HIGHEST",
                    defaults.repetitive_domain.highest,
                )?,
                parse_or(
                    &lookup,
                    "GF_REPETITIVE_LOWEST",
                    defaults.repetitive_domain.lowest,
                )?,
            ),
            check_dive_gf: parse_or(&lookup, "GF_CHECK_DIVE", defaults.check_dive_gf)?,
            max_runtime_min: parse_or(&lookup, "GF_MAX_RUNTIME_MIN", defaults.max_runtime_min)?,
            range_policy: parse_or(&lookup, "GF_RANGE_POLICY", defaults.range_policy)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings no search or plan could work with.
    pub fn validate(&self) -> Result<()> {
        let rates = [
            ("GF_DESCENT_RATE", self.rates.descent),
            ("GF_ASCENT_RATE_TO_DECO", self.rates.ascent_to_deco),
            ("GF_ASCENT_RATE_AT_DECO", self.rates.ascent_at_deco),
            ("GF_ASCENT_RATE_TO_SURFACE", self.rates.ascent_to_surface),
        ];
        for (key, rate) in rates {
            if !(rate.is_finite() && rate > 0.0) {
                return Err(config_error(key, format!("rate must be positive, got {rate}")));
            }
        }
        if !(self.last_stop_depth_m.is_finite() && self.last_stop_depth_m >= 0.0) {
            return Err(config_error(
                "GF_LAST_STOP_DEPTH",
                format!("must not be negative, got {}", self.last_stop_depth_m),
            ));
        }
        for (key, domain) in [
            ("GF_FIT_LOWEST", self.fit_domain),
            ("GF_REPETITIVE_LOWEST", self.repetitive_domain),
        ] {
            if domain.lowest < 1 || domain.lowest > domain.highest {
                return Err(config_error(
                    key,
                    format!(
                        "domain {}..={} must be non-empty and start above 0",
                        domain.highest, domain.lowest
                    ),
                ));
            }
        }
        if !(self.max_runtime_min.is_finite() && self.max_runtime_min > 0.0) {
            return Err(config_error(
                "GF_MAX_RUNTIME_MIN",
                format!("must be positive, got {}", self.max_runtime_min),
            ));
        }
        Ok(())
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| config_error(key, e.to_string())),
        _ => Ok(default),
    }
}

fn config_error(key: &str, message: String) -> Error {
    Error::Config {
        key: key.to_string(),
        message,
    }
}
