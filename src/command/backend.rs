use crate::error::HostError;
use crate::math::Point2;
use crate::operations::profile::ExtrusionPlan;

use super::RunMode;

/// The host's sketch and extrude capability.
///
/// A command run opens one sketch, draws the profile loops into it, extrudes
/// and commits. If any step fails the sketch is handed back to
/// [`SketchBackend::discard`], which must remove everything created since
/// [`SketchBackend::begin_sketch`].
pub trait SketchBackend {
    /// Handle for a user-selected plane, face or sketch.
    type Plane;
    /// Handle for a user-selected model-space point.
    type Point;
    /// An open sketch owned by the running command.
    type Sketch;

    /// Returns `true` if a modeling document is open.
    fn has_active_design(&self) -> bool;

    /// Creates a new component named `component_name` with a sketch on
    /// `plane`, shifted `offset_z` along the plane normal.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the host cannot create the sketch.
    fn begin_sketch(
        &mut self,
        component_name: &str,
        plane: &Self::Plane,
        offset_z: f64,
    ) -> Result<Self::Sketch, HostError>;

    /// Removes any geometry the host seeded into a new sketch.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the host rejects the edit.
    fn clear_sketch(&mut self, sketch: &mut Self::Sketch) -> Result<(), HostError>;

    /// Converts a selected point into the sketch's plane-local frame.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the point cannot be resolved.
    fn to_sketch_space(&self, sketch: &Self::Sketch, point: &Self::Point)
        -> Result<Point2, HostError>;

    /// Draws a closed polygon through `points`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the host rejects the geometry.
    fn draw_loop(&mut self, sketch: &mut Self::Sketch, points: &[Point2]) -> Result<(), HostError>;

    /// Extrudes the sketch's profile into a new body.
    ///
    /// Hosts with several candidate profiles should choose with
    /// [`pick_profile`].
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if there is no usable profile or the feature fails.
    fn extrude(&mut self, sketch: &mut Self::Sketch, plan: &ExtrusionPlan) -> Result<(), HostError>;

    /// Finishes the run.
    ///
    /// On [`RunMode::Execute`] everything created becomes one undo step. On
    /// [`RunMode::Preview`] the result is shown without an undo step and is
    /// replaced by the next run.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the host cannot close the group.
    fn commit(&mut self, sketch: &mut Self::Sketch, mode: RunMode) -> Result<(), HostError>;

    /// Deletes the sketch and anything created from it.
    fn discard(&mut self, sketch: Self::Sketch);
}

/// Chooses the profile to extrude: the first with more than one loop (outer
/// boundary plus cavity), otherwise the first candidate.
pub fn pick_profile<T>(candidates: &[T], loop_count: impl Fn(&T) -> usize) -> Option<&T> {
    candidates
        .iter()
        .find(|c| loop_count(*c) > 1)
        .or_else(|| candidates.first())
}
