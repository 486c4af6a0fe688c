//! GF recommendation pipeline.
//!
//! Combines the StandardAir model with the GF searches the way the planning
//! wizard walks a diver through them: dive summary, accepted risk, helium,
//! surface interval and personal adjustment.

mod models;
mod pipeline;

pub use models::{DiveSummary, PlanProfile, RecommendationReport, RecommendationRequest};
pub use pipeline::{recommend, MODEL, TOOL, TOOL_VERSION};
