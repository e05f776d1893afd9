//! Dialog command: turns captured dialog values into a pipe on the host.
//!
//! [`PipeCommand::run`] is the single entry point for both live preview and
//! final execution. It never panics and never returns an error; every outcome
//! is folded into a [`CommandReport`] for the host to display.

mod backend;
pub mod memory;

pub use backend::{pick_profile, SketchBackend};

use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use tracing::{error, info, warn};

use crate::catalog::{mm_to_internal, PipeCatalog, PipeRecord, PipeSpec};
use crate::error::{HostError, Result, SquarePipeError, ValidationError};
use crate::math::{Vector3, TOLERANCE};
use crate::operations::profile::{BuildProfile, ExtrusionPlan, PlacementParams, ResolveExtrusion};

/// Dialog values captured for one invocation, in dialog units (millimeters, radians).
#[derive(Debug, Clone)]
pub struct PipeCommandInputs<P, Q> {
    pub pipe_index: usize,
    pub length_mm: f64,
    /// X, Y and plane-normal Z offsets.
    pub offset_mm: [f64; 3],
    pub rotation: f64,
    pub reverse: bool,
    pub plane: Option<P>,
    pub origin: Option<Q>,
    pub custom_direction: Option<Vector3>,
}

impl<P, Q> PipeCommandInputs<P, Q> {
    /// First catalog pipe, `length_mm` long, on `plane`, no offsets.
    #[must_use]
    pub fn new(plane: Option<P>, length_mm: f64) -> Self {
        Self {
            pipe_index: 0,
            length_mm,
            offset_mm: [0.0; 3],
            rotation: 0.0,
            reverse: false,
            plane,
            origin: None,
            custom_direction: None,
        }
    }

    /// Placement in internal units, without the host-projected origin.
    fn placement(&self) -> PlacementParams {
        let [offset_x, offset_y, offset_z] = self.offset_mm.map(mm_to_internal);
        PlacementParams {
            origin: None,
            offset_x,
            offset_y,
            offset_z,
            rotation: self.rotation,
            length: mm_to_internal(self.length_mm),
            reverse: self.reverse,
            custom_direction: self.custom_direction,
        }
    }
}

/// Whether the run is a live preview or the final confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Preview,
    Execute,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Previewed,
    Failed,
}

/// What the host shows the user after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReport {
    pub outcome: Outcome,
    /// Text for a message box; `None` for a quiet preview.
    pub message: Option<String>,
}

impl CommandReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome != Outcome::Failed
    }
}

/// Summary of a pipe that was drawn and extruded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreatedPipe {
    pub record: PipeRecord,
    pub length_mm: f64,
    pub hollow: bool,
}

impl CreatedPipe {
    fn confirmation(&self) -> String {
        format!(
            "Created square pipe {}mm x {}mm t{}, length {:.0}mm.",
            self.record.width_mm,
            self.record.height_mm,
            self.record.thickness_mm,
            self.length_mm.abs()
        )
    }
}

/// Runs the square pipe command against a sketch host.
pub struct PipeCommand<'a> {
    catalog: &'a PipeCatalog,
}

impl<'a> PipeCommand<'a> {
    /// Creates a command drawing pipes from `catalog`.
    #[must_use]
    pub fn new(catalog: &'a PipeCatalog) -> Self {
        Self { catalog }
    }

    /// Runs the command and reports the result.
    ///
    /// Validation failures, host failures and panics all become a
    /// [`Outcome::Failed`] report; the host never sees an unwinding panic.
    pub fn run<B: SketchBackend>(
        &self,
        inputs: &PipeCommandInputs<B::Plane, B::Point>,
        backend: &mut B,
        mode: RunMode,
    ) -> CommandReport {
        match contain(|| self.execute(inputs, backend, mode)) {
            Ok(created) => {
                info!(
                    pipe = %created.record.label(),
                    length_mm = created.length_mm,
                    hollow = created.hollow,
                    ?mode,
                    "square pipe created"
                );
                match mode {
                    RunMode::Execute => CommandReport {
                        outcome: Outcome::Created,
                        message: Some(created.confirmation()),
                    },
                    RunMode::Preview => CommandReport {
                        outcome: Outcome::Previewed,
                        message: None,
                    },
                }
            }
            Err(SquarePipeError::Validation(err)) => {
                warn!(error = %err, ?mode, "square pipe input rejected");
                CommandReport {
                    outcome: Outcome::Failed,
                    message: Some(format!("Cannot create square pipe: {err}.")),
                }
            }
            Err(err) => {
                error!(error = %err, ?mode, "square pipe creation failed");
                CommandReport {
                    outcome: Outcome::Failed,
                    message: Some(format!("Square pipe creation failed:\n{err}")),
                }
            }
        }
    }

    /// Validates inputs, then draws and extrudes the pipe.
    ///
    /// Every input is checked before the host is asked for a sketch. Nothing
    /// is left on the host when this returns an error.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for missing or out-of-range inputs,
    /// [`HostError`] when the host refuses a step, and
    /// [`SquarePipeError::Unexpected`] if the host panics mid-sketch.
    pub fn execute<B: SketchBackend>(
        &self,
        inputs: &PipeCommandInputs<B::Plane, B::Point>,
        backend: &mut B,
        mode: RunMode,
    ) -> Result<CreatedPipe> {
        let plane = inputs
            .plane
            .as_ref()
            .ok_or(ValidationError::NoPlaneSelected)?;
        if !backend.has_active_design() {
            return Err(HostError::NoActiveDesign.into());
        }
        let record = *self
            .catalog
            .record(inputs.pipe_index)
            .ok_or(ValidationError::PipeIndexOutOfRange {
                index: inputs.pipe_index,
                len: self.catalog.len(),
            })?;
        if inputs.length_mm.abs() < TOLERANCE {
            return Err(ValidationError::ZeroLength.into());
        }
        let pipe = record.to_spec();
        pipe.validate()?;
        let placement = inputs.placement();
        placement.validate()?;
        let plan = ResolveExtrusion::from_placement(&placement).execute()?;

        let name = record.component_name(inputs.length_mm);
        let mut sketch = backend.begin_sketch(&name, plane, placement.offset_z)?;

        let staged = contain(|| {
            Self::stage(inputs, pipe, placement, &plan, backend, &mut sketch, mode)
        });
        match staged {
            Ok(hollow) => Ok(CreatedPipe {
                record,
                length_mm: inputs.length_mm,
                hollow,
            }),
            Err(err) => {
                backend.discard(sketch);
                Err(err)
            }
        }
    }

    /// Everything after the sketch exists; any error here triggers a discard.
    fn stage<B: SketchBackend>(
        inputs: &PipeCommandInputs<B::Plane, B::Point>,
        pipe: PipeSpec,
        mut placement: PlacementParams,
        plan: &ExtrusionPlan,
        backend: &mut B,
        sketch: &mut B::Sketch,
        mode: RunMode,
    ) -> Result<bool> {
        backend.clear_sketch(sketch)?;

        placement.origin = inputs
            .origin
            .as_ref()
            .map(|point| backend.to_sketch_space(sketch, point))
            .transpose()?;
        let loops = BuildProfile::new(pipe, placement).execute()?;
        for points in loops.loops() {
            backend.draw_loop(sketch, points)?;
        }
        backend.extrude(sketch, plan)?;
        backend.commit(sketch, mode)?;
        Ok(loops.is_hollow())
    }
}

thread_local! {
    static PANIC_LOCATION: RefCell<Option<String>> = const { RefCell::new(None) };
}

static LOCATION_HOOK: Once = Once::new();

/// Chains a panic hook that remembers where the last panic on this thread happened.
fn install_location_hook() {
    LOCATION_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if let Some(location) = info.location() {
                PANIC_LOCATION.with(|slot| *slot.borrow_mut() = Some(location.to_string()));
            }
            previous(info);
        }));
    });
}

/// Runs `f`, turning a panic into [`SquarePipeError::Unexpected`] carrying the
/// payload text and, when known, the panic location.
fn contain<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    install_location_hook();
    PANIC_LOCATION.with(|slot| slot.borrow_mut().take());
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        let detail = match PANIC_LOCATION.with(|slot| slot.borrow_mut().take()) {
            Some(location) => format!("{message} (at {location})"),
            None => message,
        };
        Err(SquarePipeError::Unexpected(detail))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::memory::{FailPoint, MemoryBackend};
    use super::*;
    use crate::geometry::plane::SketchPlane;
    use crate::math::{Point2, Point3};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn catalog() -> PipeCatalog {
        PipeCatalog::from_json(
            r#"[
                {"width_mm": 20, "height_mm": 20, "thickness_mm": 2},
                {"width_mm": 40, "height_mm": 20, "thickness_mm": 10},
                {"width_mm": 30, "height_mm": 10, "thickness_mm": 1.5}
            ]"#,
        )
        .unwrap()
    }

    fn inputs(length_mm: f64) -> PipeCommandInputs<SketchPlane, Point3> {
        PipeCommandInputs::new(Some(SketchPlane::xy()), length_mm)
    }

    #[test]
    fn execute_creates_hollow_pipe_with_confirmation() {
        init_tracing();
        let catalog = catalog();
        let mut backend = MemoryBackend::new();
        let report = PipeCommand::new(&catalog).run(&inputs(100.0), &mut backend, RunMode::Execute);

        assert_eq!(report.outcome, Outcome::Created);
        assert_eq!(
            report.message.as_deref(),
            Some("Created square pipe 20mm x 20mm t2, length 100mm.")
        );
        let component = &backend.components()[0];
        assert_eq!(component.name, "SquarePipe_20x20_t2_L100mm");
        assert_eq!(component.loops.len(), 2);
        assert_relative_eq!(component.loops[0][2], Point2::new(2.0, 2.0));
        assert_relative_eq!(component.loops[1][0], Point2::new(0.2, 0.2));
        assert_relative_eq!(component.body.displacement, Vector3::new(0.0, 0.0, 10.0));
        assert!(component.body.inner.is_some());
        assert_eq!(backend.undo_groups(), 1);
    }

    #[test]
    fn preview_is_quiet() {
        let catalog = catalog();
        let mut backend = MemoryBackend::new();
        let report = PipeCommand::new(&catalog).run(&inputs(10.0), &mut backend, RunMode::Preview);
        assert_eq!(report.outcome, Outcome::Previewed);
        assert!(report.message.is_none());
        assert!(report.is_success());
    }

    #[test]
    fn thick_wall_pipe_is_solid() {
        let catalog = catalog();
        let mut backend = MemoryBackend::new();
        let mut input = inputs(10.0);
        input.pipe_index = 1;
        let created = PipeCommand::new(&catalog).execute(&input, &mut backend, RunMode::Execute).unwrap();
        assert!(!created.hollow);
        assert_eq!(backend.components()[0].loops.len(), 1);
        assert!(backend.components()[0].body.inner.is_none());
    }

    #[test]
    fn origin_offset_rotation_and_reverse_reach_the_host() {
        let catalog = catalog();
        let mut backend = MemoryBackend::new();
        let mut input = inputs(-50.0);
        input.pipe_index = 2;
        input.origin = Some(Point3::new(1.0, 2.0, 5.0));
        input.offset_mm = [10.0, -10.0, 30.0];
        input.rotation = FRAC_PI_2;
        input.reverse = true;
        PipeCommand::new(&catalog).execute(&input, &mut backend, RunMode::Execute).unwrap();

        let component = &backend.components()[0];
        assert_relative_eq!(*component.plane.origin(), Point3::new(0.0, 0.0, 3.0));
        // base = origin (1, 2) projected + offset (1, -1) = (2, 1); (3, 0) rotates to (0, 3)
        assert_relative_eq!(component.loops[0][0], Point2::new(2.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(component.loops[0][1], Point2::new(2.0, 4.0), epsilon = 1e-12);
        // negative length and reverse cancel out
        assert_relative_eq!(component.body.displacement, Vector3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn custom_direction_overrides_normal() {
        let catalog = catalog();
        let mut backend = MemoryBackend::new();
        let mut input = inputs(20.0);
        input.custom_direction = Some(Vector3::new(1.0, 0.0, 0.0));
        PipeCommand::new(&catalog).execute(&input, &mut backend, RunMode::Execute).unwrap();
        assert_relative_eq!(
            backend.components()[0].body.displacement,
            Vector3::new(2.0, 0.0, 0.0)
        );
    }

    #[test]
    fn missing_plane_is_rejected_before_host_work() {
        let catalog = catalog();
        let mut backend = MemoryBackend::new();
        let input: PipeCommandInputs<SketchPlane, Point3> = PipeCommandInputs::new(None, 10.0);
        let report = PipeCommand::new(&catalog).run(&input, &mut backend, RunMode::Execute);
        assert_eq!(report.outcome, Outcome::Failed);
        assert_eq!(
            report.message.as_deref(),
            Some("Cannot create square pipe: select a sketch plane.")
        );
        assert_eq!(backend.open_sketches(), 0);
    }

    #[test]
    fn no_active_design_is_reported() {
        let catalog = catalog();
        let mut backend = MemoryBackend::new().without_design();
        let err = PipeCommand::new(&catalog)
            .execute(&inputs(10.0), &mut backend, RunMode::Execute)
            .unwrap_err();
        assert!(matches!(err, SquarePipeError::Host(HostError::NoActiveDesign)));
    }

    #[test]
    fn out_of_range_pipe_and_zero_length_are_rejected() {
        let catalog = catalog();
        let mut backend = MemoryBackend::new();
        let mut input = inputs(10.0);
        input.pipe_index = 3;
        assert!(matches!(
            PipeCommand::new(&catalog).execute(&input, &mut backend, RunMode::Execute).unwrap_err(),
            SquarePipeError::Validation(ValidationError::PipeIndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(matches!(
            PipeCommand::new(&catalog).execute(&inputs(0.0), &mut backend, RunMode::Execute).unwrap_err(),
            SquarePipeError::Validation(ValidationError::ZeroLength)
        ));
        assert!(backend.components().is_empty());
    }

    #[test]
    fn host_failure_leaves_nothing_behind() {
        init_tracing();
        let catalog = catalog();
        for point in [FailPoint::Draw, FailPoint::Extrude, FailPoint::Commit] {
            let mut backend = MemoryBackend::new().failing_at(point);
            let report = PipeCommand::new(&catalog).run(&inputs(10.0), &mut backend, RunMode::Execute);
            assert_eq!(report.outcome, Outcome::Failed, "{point:?}");
            assert!(report
                .message
                .unwrap()
                .starts_with("Square pipe creation failed:\n"));
            assert!(backend.components().is_empty());
            assert_eq!(backend.open_sketches(), 0);
        }
    }

    #[test]
    fn nan_rotation_is_a_validation_failure() {
        let catalog = catalog();
        let mut backend = MemoryBackend::new();
        let mut input = inputs(10.0);
        input.rotation = f64::NAN;
        let report = PipeCommand::new(&catalog).run(&input, &mut backend, RunMode::Execute);
        assert_eq!(report.outcome, Outcome::Failed);
        assert_eq!(
            report.message.as_deref(),
            Some("Cannot create square pipe: rotation must be a finite number.")
        );
        assert_eq!(backend.open_sketches(), 0);
    }

    #[test]
    fn bad_placement_never_reaches_the_host() {
        let catalog = catalog();
        let mut cases = Vec::new();
        for field in 0..3 {
            let mut input = inputs(10.0);
            input.offset_mm[field] = f64::NAN;
            cases.push(input);
        }
        let mut input = inputs(f64::INFINITY);
        input.offset_mm = [0.0, 0.0, 5.0];
        cases.push(input);
        let mut input = inputs(10.0);
        input.rotation = f64::NEG_INFINITY;
        cases.push(input);
        let mut input = inputs(10.0);
        input.custom_direction = Some(Vector3::new(f64::NAN, 0.0, 1.0));
        cases.push(input);
        let mut input = inputs(10.0);
        input.custom_direction = Some(Vector3::zeros());
        cases.push(input);

        for input in &cases {
            // a host that refuses every sketch proves validation came first
            let mut backend = MemoryBackend::new().failing_at(FailPoint::Begin);
            let err = PipeCommand::new(&catalog)
                .execute(input, &mut backend, RunMode::Execute)
                .unwrap_err();
            assert!(matches!(err, SquarePipeError::Validation(_)), "{err}");
        }
    }

    #[test]
    fn previews_are_replaced_until_execute() {
        let catalog = catalog();
        let mut backend = MemoryBackend::new();
        let command = PipeCommand::new(&catalog);
        for length_mm in [10.0, 20.0, 30.0] {
            let report = command.run(&inputs(length_mm), &mut backend, RunMode::Preview);
            assert_eq!(report.outcome, Outcome::Previewed);
        }
        assert!(backend.components().is_empty());
        assert_eq!(backend.undo_groups(), 0);
        assert_eq!(backend.preview().unwrap().name, "SquarePipe_20x20_t2_L30mm");

        let report = command.run(&inputs(40.0), &mut backend, RunMode::Execute);
        assert_eq!(report.outcome, Outcome::Created);
        assert_eq!(backend.components().len(), 1);
        assert_eq!(backend.components()[0].name, "SquarePipe_20x20_t2_L40mm");
        assert_eq!(backend.undo_groups(), 1);
        assert!(backend.preview().is_none());
        assert_eq!(backend.open_sketches(), 0);
    }

    struct PanickingBackend {
        inner: MemoryBackend,
    }

    impl SketchBackend for PanickingBackend {
        type Plane = SketchPlane;
        type Point = Point3;
        type Sketch = memory::MemorySketch;

        fn has_active_design(&self) -> bool {
            true
        }

        fn begin_sketch(
            &mut self,
            component_name: &str,
            plane: &SketchPlane,
            offset_z: f64,
        ) -> std::result::Result<Self::Sketch, HostError> {
            self.inner.begin_sketch(component_name, plane, offset_z)
        }

        fn clear_sketch(&mut self, _sketch: &mut Self::Sketch) -> std::result::Result<(), HostError> {
            panic!("host crashed while clearing");
        }

        fn to_sketch_space(
            &self,
            sketch: &Self::Sketch,
            point: &Point3,
        ) -> std::result::Result<Point2, HostError> {
            self.inner.to_sketch_space(sketch, point)
        }

        fn draw_loop(
            &mut self,
            sketch: &mut Self::Sketch,
            points: &[Point2],
        ) -> std::result::Result<(), HostError> {
            self.inner.draw_loop(sketch, points)
        }

        fn extrude(
            &mut self,
            sketch: &mut Self::Sketch,
            plan: &ExtrusionPlan,
        ) -> std::result::Result<(), HostError> {
            self.inner.extrude(sketch, plan)
        }

        fn commit(
            &mut self,
            sketch: &mut Self::Sketch,
            mode: RunMode,
        ) -> std::result::Result<(), HostError> {
            self.inner.commit(sketch, mode)
        }

        fn discard(&mut self, sketch: Self::Sketch) {
            self.inner.discard(sketch);
        }
    }

    #[test]
    fn host_panic_is_contained_and_rolled_back() {
        let catalog = catalog();
        let mut backend = PanickingBackend {
            inner: MemoryBackend::new(),
        };
        let report = PipeCommand::new(&catalog).run(&inputs(10.0), &mut backend, RunMode::Execute);
        assert_eq!(report.outcome, Outcome::Failed);
        let message = report.message.unwrap();
        assert!(message.contains("host crashed while clearing"));
        assert!(message.contains("src/command/mod.rs:"), "{message}");
        assert_eq!(backend.inner.open_sketches(), 0);
    }
}
