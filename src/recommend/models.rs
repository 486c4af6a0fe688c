//! Data types for GF recommendations.

use serde::{Deserialize, Serialize};

use crate::config::RangePolicy;
use crate::gf::{AdjustedGf, GradientFactor};
use crate::risk::TdtChart;
use crate::simulator::ProfileSample;

/// Request payload for a recommendation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RecommendationRequest {
    /// Depth in meters
    pub depth_m: f64,
    /// Bottom time in minutes
    pub bottom_time_min: f64,
    /// Oxygen percentage
    #[serde(default = "default_o2")]
    pub o2: f64,
    /// Helium percentage
    #[serde(default)]
    pub he: f64,
    /// Accepted probability of DCS, in percent
    #[serde(default = "default_pdcs_percent")]
    pub pdcs_percent: f64,
    /// Hours since the previous dive, if any
    #[serde(default)]
    pub surface_interval_hours: Option<f64>,
    /// Signed GF points added at the end
    #[serde(default)]
    pub personal_adjustment: i32,
    /// Overrides the configured range policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_policy: Option<RangePolicy>,
}

fn default_o2() -> f64 {
    21.0
}

fn default_pdcs_percent() -> f64 {
    2.0
}

/// Nitrogen-load figures for the planned dive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiveSummary {
    /// Pressure root time
    pub prt: f64,
    /// PRT above the level where ZHL-16C is reported to need adjustment
    pub prt_exceeds_threshold: bool,
    /// Equivalent air depth in meters
    pub ead_m: f64,
}

/// Simulated schedule of the real dive at the final GF.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanProfile {
    pub gf: GradientFactor,
    pub samples: Vec<ProfileSample>,
    pub tdt_min: f64,
}

/// Response payload of a recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationReport {
    /// Tool identifier
    pub tool: &'static str,
    /// Tool version
    pub tool_version: &'static str,
    /// Decompression model fitted against
    pub model: &'static str,

    pub summary: DiveSummary,
    /// Accepted probability of DCS (0-1)
    pub pdcs: f64,
    /// StandardAir total decompression time in minutes
    pub tdt_min: f64,
    pub chart: TdtChart,

    /// Every stage of the GF composition
    pub gf: AdjustedGf,
    /// Recommended GF high
    pub gf_high: GradientFactor,
    /// Recommended GF low (symmetric)
    pub gf_low: GradientFactor,
    /// Alternative GF low at 83 % of GF high
    pub gf_low_alternative: GradientFactor,

    /// Final plan profile, absent if the simulator could not schedule it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<PlanProfile>,

    /// SHA256 hash of input
    pub input_hash: String,

    /// Warning messages
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
