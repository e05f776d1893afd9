mod build_profile;
mod extrusion;

pub use build_profile::{BuildProfile, PlacementParams, ProfileLoops};
pub use extrusion::{ExtrudeDirection, ExtrusionPlan, ResolveExtrusion};

use crate::catalog::PipeSpec;
use crate::error::Result;

/// Builds the section loops and resolves the extrusion for one invocation.
///
/// Pure: identical inputs always give identical outputs.
///
/// # Errors
///
/// Returns a validation error for a non-positive pipe dimension, a
/// non-finite placement value or a zero-length custom direction.
pub fn build(pipe: PipeSpec, placement: &PlacementParams) -> Result<(ProfileLoops, ExtrusionPlan)> {
    let loops = BuildProfile::new(pipe, *placement).execute()?;
    let plan = ResolveExtrusion::from_placement(placement).execute()?;
    Ok((loops, plan))
}
