//! Unit conversions and the small formulas feeding the risk model.

use crate::dive::{require_non_negative, require_positive};
use crate::error::{Error, Result};

pub const FEET_PER_METER: f64 = 3.2808399;

/// Meters of seawater per bar.
pub const METERS_PER_BAR: f64 = 10.0;

/// Nitrogen fraction of air used for equivalent air depth.
pub const AIR_N2_FRACTION: f64 = 0.79;

/// PRT above which ZHL-16C schedules are reported to need extra conservatism.
pub const PRT_ADJUSTMENT_THRESHOLD: f64 = 25.0;

pub fn meters_to_feet(meters: f64) -> f64 {
    meters * FEET_PER_METER
}

/// Absolute pressure in bar at `depth_m`.
pub fn ambient_pressure_bar(depth_m: f64) -> f64 {
    depth_m / METERS_PER_BAR + 1.0
}

/// Pressure root time: bottom pressure (bar) times the square root of bottom
/// time (minutes).
pub fn pressure_root_time(depth_m: f64, bottom_time_min: f64) -> Result<f64> {
    require_non_negative("depth", depth_m)?;
    require_positive("bottom_time", bottom_time_min)?;
    Ok(ambient_pressure_bar(depth_m) * bottom_time_min.sqrt())
}

/// Equivalent air depth in meters for a mix with `o2_percent` oxygen.
///
/// Helium counts as inert gas here, so the result is the air depth with the
/// same total inert partial pressure. Shallow rich mixes give negative values.
pub fn equivalent_air_depth(depth_m: f64, o2_percent: f64) -> Result<f64> {
    require_non_negative("depth", depth_m)?;
    if !(o2_percent.is_finite() && (0.0..=100.0).contains(&o2_percent)) {
        return Err(Error::invalid(
            "o2",
            format!("percentage must be within 0..=100, got {o2_percent}"),
        ));
    }
    let p_inert = ambient_pressure_bar(depth_m) * (1.0 - o2_percent / 100.0);
    Ok((p_inert / AIR_N2_FRACTION - 1.0) * METERS_PER_BAR)
}

/// `ln(p / (1 - p))`, defined only for `0 < p < 1`.
pub fn logit(probability: f64) -> Result<f64> {
    if !(probability.is_finite() && probability > 0.0 && probability < 1.0) {
        return Err(Error::invalid(
            "probability",
            format!("must be inside (0, 1), got {probability}"),
        ));
    }
    Ok((probability / (1.0 - probability)).ln())
}
