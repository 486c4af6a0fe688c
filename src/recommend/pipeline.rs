//! End-to-end recommendation: summary, StandardAir TDT, GF fits and adjustments.

use sha2::{Digest, Sha256};

use super::models::{DiveSummary, PlanProfile, RecommendationReport, RecommendationRequest};
use crate::config::Settings;
use crate::dive::{require_non_negative, DiveParameters, GasMix, RiskTarget};
use crate::error::{Error, Result};
use crate::gf::adjust::{compose, gf_low_suggestion, Adjustments};
use crate::gf::GfFitter;
use crate::risk::units::{equivalent_air_depth, pressure_root_time, PRT_ADJUSTMENT_THRESHOLD};
use crate::risk::StandardAirModel;
use crate::simulator::Simulator;

pub const TOOL: &str = "gf-recommend";
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const MODEL: &str = "Bühlmann ZHL-16C";

/// Compute SHA256 hash of input string.
fn sha256_hex(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let digest = hasher.finalize();
    format!("sha256:{}", hex::encode(digest))
}

/// Run the whole recommendation for one planned dive.
pub fn recommend<S: Simulator + ?Sized>(
    simulator: &S,
    settings: &Settings,
    request: &RecommendationRequest,
) -> Result<RecommendationReport> {
    // Basic validation
    let dive = DiveParameters::new(
        request.depth_m,
        request.bottom_time_min,
        GasMix::new(request.o2, request.he)?,
    )?;
    let risk = RiskTarget::from_percent(request.pdcs_percent)?;
    if let Some(hours) = request.surface_interval_hours {
        require_non_negative("surface_time", hours)?;
    }

    let input_hash = sha256_hex(&serde_json::to_string(request)?);
    let mut warnings = Vec::new();

    let prt = pressure_root_time(dive.depth_m, dive.bottom_time_min)?;
    let ead_m = equivalent_air_depth(dive.depth_m, dive.gas.o2)?;
    if ead_m <= 0.0 {
        return Err(Error::invalid(
            "depth",
            format!("equivalent air depth {ead_m:.1} m is not positive for {}", dive.gas),
        ));
    }
    let summary = DiveSummary {
        prt,
        prt_exceeds_threshold: prt > PRT_ADJUSTMENT_THRESHOLD,
        ead_m,
    };
    if summary.prt_exceeds_threshold {
        warnings.push(format!(
            "PRT {prt:.1} exceeds {PRT_ADJUSTMENT_THRESHOLD}; unadjusted ZHL-16C may under-decompress"
        ));
    }

    let model = StandardAirModel::new(settings.coefficients);
    let tdt_min = model.tdt(ead_m, dive.bottom_time_min, risk)?;
    let chart = model.chart(ead_m, dive.bottom_time_min, risk)?;

    let mut settings = settings.clone();
    if let Some(policy) = request.range_policy {
        settings.range_policy = policy;
    }
    let fitter = GfFitter::new(simulator, &settings);

    let gf = compose(
        &fitter,
        dive.bottom_time_min,
        ead_m,
        tdt_min,
        dive.gas.he,
        Adjustments {
            surface_interval_hours: request.surface_interval_hours,
            personal: request.personal_adjustment,
        },
    )?;
    if gf.checked.clamped {
        warnings.push(format!(
            "adjusted GF {:.1} is outside 1..=100 and was clamped to {}",
            gf.checked.unchecked, gf.checked.gf
        ));
    }
    let gf_high = gf.checked.gf;

    let plan = fitter.plan(dive.bottom_time_min, dive.depth_m, gf_high, dive.gas);
    let profile = match simulator.simulate(&plan) {
        Ok(result) => match result.total_deco_time_min(dive.bottom_time_min) {
            Ok(plan_tdt) => Some(PlanProfile {
                gf: gf_high,
                samples: result.samples,
                tdt_min: plan_tdt,
            }),
            Err(err) => {
                warnings.push(format!("no profile for the final plan: {err}"));
                None
            }
        },
        Err(err) => {
            tracing::warn!(gf = gf_high, error = %err, "final plan could not be simulated");
            warnings.push(format!("no profile for the final plan: {err}"));
            None
        }
    };

    tracing::info!(
        gf_high,
        tdt_min,
        ead_m,
        prt,
        input_hash = %input_hash,
        "recommendation ready"
    );

    Ok(RecommendationReport {
        tool: TOOL,
        tool_version: TOOL_VERSION,
        model: MODEL,
        summary,
        pdcs: risk.probability(),
        tdt_min,
        chart,
        gf,
        gf_high,
        gf_low: gf_high,
        gf_low_alternative: gf_low_suggestion(gf_high),
        profile,
        input_hash,
        warnings,
    })
}
