//! Post-fit adjustments: helium refit, surface interval penalty, personal
//! offset and the final range check.

use serde::Serialize;

use crate::config::RangePolicy;
use crate::dive::{require_non_negative, GasMix};
use crate::error::{Error, Result};
use crate::simulator::Simulator;

use super::fit::GfFitter;
use super::GradientFactor;

/// GF points lost right after surfacing.
pub const SURFACE_PENALTY_MAX: f64 = 37.0;

/// Minutes of surface interval that win back one GF point.
pub const SURFACE_RECOVERY_MIN_PER_POINT: f64 = 5.0;

/// Ratio for the alternative GF low suggestion (GF low = 83 % of GF high).
pub const GF_LOW_RATIO: f64 = 0.83;

pub const GF_MIN: GradientFactor = 1;
pub const GF_MAX: GradientFactor = 100;

/// GF points to subtract for a surface interval of `hours`.
///
/// Linear recovery from [`SURFACE_PENALTY_MAX`] at zero, reaching nothing
/// after about 3.08 hours.
pub fn surface_time_penalty(hours: f64) -> Result<f64> {
    require_non_negative("surface_time", hours)?;
    Ok((SURFACE_PENALTY_MAX - hours * 60.0 / SURFACE_RECOVERY_MIN_PER_POINT).max(0.0))
}

pub fn adjust_gf_for_surface_time(gf: f64, hours: f64) -> Result<f64> {
    Ok(gf - surface_time_penalty(hours)?)
}

/// Signed expert override. No clamping happens here.
pub fn apply_personal_adjustment(gf: f64, adjustment: i32) -> f64 {
    gf + f64::from(adjustment)
}

/// A GF that passed the range check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CheckedGf {
    pub gf: GradientFactor,
    /// Value before rounding and clamping.
    pub unchecked: f64,
    pub clamped: bool,
}

/// Enforce 1..=100 on the unrounded value according to `policy`, then round
/// to a whole percentage.
pub fn check_gf_range(gf: f64, policy: RangePolicy) -> Result<CheckedGf> {
    if !gf.is_finite() {
        return Err(Error::invalid("gradient_factor", format!("got {gf}")));
    }
    let rounded = gf.round();
    if (f64::from(GF_MIN)..=f64::from(GF_MAX)).contains(&gf) {
        return Ok(CheckedGf {
            gf: rounded as GradientFactor,
            unchecked: gf,
            clamped: false,
        });
    }
    match policy {
        RangePolicy::Reject => Err(Error::OutOfRange {
            value: gf,
            min: GF_MIN,
            max: GF_MAX,
        }),
        RangePolicy::Clamp => {
            let clamped = rounded.clamp(f64::from(GF_MIN), f64::from(GF_MAX)) as GradientFactor;
            tracing::warn!(gf, clamped, "gradient factor outside valid range, clamping");
            Ok(CheckedGf {
                gf: clamped,
                unchecked: gf,
                clamped: true,
            })
        }
    }
}

/// Alternative GF low: 83 % of GF high, rounded.
pub fn gf_low_suggestion(gf_high: GradientFactor) -> GradientFactor {
    (f64::from(gf_high) * GF_LOW_RATIO).round() as GradientFactor
}

/// Surface interval and personal offset applied after the fits.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Adjustments {
    /// Hours since the previous dive; `None` for a first dive of the day.
    pub surface_interval_hours: Option<f64>,
    pub personal: i32,
}

/// Every intermediate GF of the composition, in order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdjustedGf {
    /// Fit on air.
    pub air: GradientFactor,
    /// Fit with the dive's helium.
    pub helium: GradientFactor,
    pub after_surface_interval: f64,
    pub after_personal: f64,
    pub checked: CheckedGf,
}

/// Fit on air, refit with helium, then apply surface interval and personal
/// adjustments and check the range.
///
/// Both fits run at `depth_m` (normally the equivalent air depth) with 21 %
/// oxygen, less when the helium leaves no room for it (see
/// [`GasMix::air_with_he`]). The helium fit is skipped when `he_percent` is
/// zero.
pub fn compose<S: Simulator + ?Sized>(
    fitter: &GfFitter<'_, S>,
    bottom_time_min: f64,
    depth_m: f64,
    target_tdt_min: f64,
    he_percent: f64,
    adjustments: Adjustments,
) -> Result<AdjustedGf> {
    let helium_gas = GasMix::air_with_he(he_percent)?;
    if let Some(hours) = adjustments.surface_interval_hours {
        require_non_negative("surface_time", hours)?;
    }

    let air = fitter
        .fit(bottom_time_min, depth_m, target_tdt_min, GasMix::AIR)?
        .gf;
    let helium = if he_percent > 0.0 {
        fitter
            .fit(bottom_time_min, depth_m, target_tdt_min, helium_gas)?
            .gf
    } else {
        air
    };

    let after_surface_interval = match adjustments.surface_interval_hours {
        Some(hours) => adjust_gf_for_surface_time(f64::from(helium), hours)?,
        None => f64::from(helium),
    };
    let after_personal = apply_personal_adjustment(after_surface_interval, adjustments.personal);
    let checked = check_gf_range(after_personal, fitter.settings().range_policy)?;

    Ok(AdjustedGf {
        air,
        helium,
        after_surface_interval,
        after_personal,
        checked,
    })
}
