//! Gradient factor searches and adjustments.

pub mod adjust;
pub mod batch;
pub mod fit;
pub mod repetitive;

/// Gradient factor as a whole percentage. Searches may go above 100 and
/// adjustments may leave 1..=100 entirely.
pub type GradientFactor = i32;

pub use adjust::{
    adjust_gf_for_surface_time, apply_personal_adjustment, check_gf_range, compose, AdjustedGf,
    Adjustments, CheckedGf,
};
pub use batch::{fit_batch, CalibrationResult, CalibrationRow};
pub use fit::{fit_gf_to_tdt, GfFit, GfFitter};
pub use repetitive::{
    find_no_deco_gf_high, recommend_repetitive, NoDecoGf, NoDecoTimeLookup,
    RepetitiveRecommendation,
};
