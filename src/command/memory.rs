//! In-memory sketch host.
//!
//! Records sketches, loops and extruded bodies instead of driving a CAD
//! application. Used for previews outside a host and to exercise the command
//! runner in tests.

use tracing::debug;

use crate::error::HostError;
use crate::geometry::plane::SketchPlane;
use crate::math::polygon_2d::{loop_contains, signed_area_2d};
use crate::math::{Point2, Point3, Vector3};
use crate::operations::profile::ExtrusionPlan;

use super::backend::{pick_profile, SketchBackend};
use super::RunMode;

/// Step at which [`MemoryBackend`] should report a host failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Begin,
    Draw,
    Extrude,
    Commit,
}

/// An extruded prism: the base section in model space plus the cap offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub outer: Vec<Point3>,
    pub inner: Option<Vec<Point3>>,
    pub displacement: Vector3,
}

/// A sketch opened by a running command.
#[derive(Debug)]
pub struct MemorySketch {
    name: String,
    plane: SketchPlane,
    loops: Vec<Vec<Point2>>,
    body: Option<Body>,
}

/// A committed component: one sketch and the body extruded from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub plane: SketchPlane,
    pub loops: Vec<Vec<Point2>>,
    pub body: Body,
}

/// Sketch host that keeps everything in memory.
#[derive(Debug)]
pub struct MemoryBackend {
    active_design: bool,
    components: Vec<Component>,
    preview: Option<Component>,
    open_sketches: usize,
    undo_groups: usize,
    fail_on: Option<FailPoint>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Creates a backend with an open design and no components.
    #[must_use]
    pub fn new() -> Self {
        Self {
            active_design: true,
            components: Vec::new(),
            preview: None,
            open_sketches: 0,
            undo_groups: 0,
            fail_on: None,
        }
    }

    /// Simulates a host with no modeling document open.
    #[must_use]
    pub fn without_design(mut self) -> Self {
        self.active_design = false;
        self
    }

    /// Makes the given step fail with [`HostError::Backend`].
    #[must_use]
    pub fn failing_at(mut self, point: FailPoint) -> Self {
        self.fail_on = Some(point);
        self
    }

    /// Committed components in creation order.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Output of the last preview run, if no run has started since.
    #[must_use]
    pub fn preview(&self) -> Option<&Component> {
        self.preview.as_ref()
    }

    /// Sketches begun but neither committed nor discarded.
    #[must_use]
    pub fn open_sketches(&self) -> usize {
        self.open_sketches
    }

    /// Number of undo steps recorded.
    #[must_use]
    pub fn undo_groups(&self) -> usize {
        self.undo_groups
    }

    fn check(&self, point: FailPoint) -> Result<(), HostError> {
        if self.fail_on == Some(point) {
            return Err(HostError::Backend(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

/// A closed region of a sketch: a boundary loop and the loops nested directly in it.
struct Region<'a> {
    loops: Vec<&'a [Point2]>,
    area: f64,
}

/// Splits sketch loops into regions, smallest first, like a host's profile list.
fn regions(loops: &[Vec<Point2>]) -> Vec<Region<'_>> {
    let mut regions: Vec<Region<'_>> = loops
        .iter()
        .map(|boundary| {
            let mut members = vec![boundary.as_slice()];
            members.extend(
                loops
                    .iter()
                    .filter(|other| !std::ptr::eq(*other, boundary) && loop_contains(boundary, other))
                    .map(Vec::as_slice),
            );
            let area: f64 = members
                .iter()
                .enumerate()
                .map(|(i, pts)| {
                    let a = signed_area_2d(pts).abs();
                    if i == 0 {
                        a
                    } else {
                        -a
                    }
                })
                .sum();
            Region {
                loops: members,
                area,
            }
        })
        .collect();
    regions.sort_by(|a, b| a.area.total_cmp(&b.area));
    regions
}

impl SketchBackend for MemoryBackend {
    type Plane = SketchPlane;
    type Point = Point3;
    type Sketch = MemorySketch;

    fn has_active_design(&self) -> bool {
        self.active_design
    }

    fn begin_sketch(
        &mut self,
        component_name: &str,
        plane: &SketchPlane,
        offset_z: f64,
    ) -> Result<MemorySketch, HostError> {
        self.preview = None;
        self.check(FailPoint::Begin)?;
        self.open_sketches += 1;
        Ok(MemorySketch {
            name: component_name.to_owned(),
            plane: plane.offset(offset_z),
            loops: Vec::new(),
            body: None,
        })
    }

    fn clear_sketch(&mut self, sketch: &mut MemorySketch) -> Result<(), HostError> {
        sketch.loops.clear();
        Ok(())
    }

    fn to_sketch_space(&self, sketch: &MemorySketch, point: &Point3) -> Result<Point2, HostError> {
        Ok(sketch.plane.to_local(point))
    }

    fn draw_loop(&mut self, sketch: &mut MemorySketch, points: &[Point2]) -> Result<(), HostError> {
        self.check(FailPoint::Draw)?;
        if points.len() < 3 {
            return Err(HostError::Backend(format!(
                "a closed loop needs at least 3 points, got {}",
                points.len()
            )));
        }
        sketch.loops.push(points.to_vec());
        Ok(())
    }

    fn extrude(&mut self, sketch: &mut MemorySketch, plan: &ExtrusionPlan) -> Result<(), HostError> {
        self.check(FailPoint::Extrude)?;
        let regions = regions(&sketch.loops);
        let region = pick_profile(&regions, |r| r.loops.len())
            .ok_or_else(|| HostError::Backend("sketch has no closed profile".into()))?;

        let lift = |pts: &[Point2]| -> Vec<Point3> {
            pts.iter().map(|p| sketch.plane.to_model(p)).collect()
        };
        let body = Body {
            outer: lift(region.loops[0]),
            inner: region.loops.get(1).map(|pts| lift(*pts)),
            displacement: plan.vector(sketch.plane.normal()),
        };
        debug!(name = %sketch.name, hollow = body.inner.is_some(), "extruded body");
        sketch.body = Some(body);
        Ok(())
    }

    fn commit(&mut self, sketch: &mut MemorySketch, mode: RunMode) -> Result<(), HostError> {
        self.check(FailPoint::Commit)?;
        let body = sketch
            .body
            .take()
            .ok_or_else(|| HostError::Backend("nothing was extruded".into()))?;
        let component = Component {
            name: std::mem::take(&mut sketch.name),
            plane: sketch.plane.clone(),
            loops: std::mem::take(&mut sketch.loops),
            body,
        };
        self.open_sketches = self.open_sketches.saturating_sub(1);
        match mode {
            RunMode::Preview => self.preview = Some(component),
            RunMode::Execute => {
                self.components.push(component);
                self.undo_groups += 1;
            }
        }
        Ok(())
    }

    fn discard(&mut self, sketch: MemorySketch) {
        debug!(name = %sketch.name, "discarded sketch");
        self.open_sketches = self.open_sketches.saturating_sub(1);
    }
}
