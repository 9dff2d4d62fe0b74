//! Per-frame orchestration of an ice surface.
//!
//! The host calls [`Renderable::before_frame`] once per frame, right before
//! the surface itself is drawn. The sequence is fixed:
//!
//! 1. rebuild the texture matrix from this frame's camera
//! 2. advance the flow cycle and publish the shading uniforms
//! 3. copy the surface world transform to both captures
//! 4. hide the surface
//! 5. reflection capture, then refraction capture
//! 6. show the surface
//!
//! A failed capture is logged and skipped; its target keeps last frame's
//! content and the rest of the sequence still runs.

use std::fmt;

use bevy::math::Mat4;
use bevy_log::{error, warn};

use super::{
    CameraView, EffectConfiguration, FlowCycleState, IceError, ProjectionMatrixBuilder,
    ShadingUniforms,
};
use crate::constants::{REFLECTOR_NAME, REFRACTOR_NAME};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureKind {
    Reflection,
    Refraction,
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureKind::Reflection => write!(f, "reflection"),
            CaptureKind::Refraction => write!(f, "refraction"),
        }
    }
}

/// A render-to-texture pass that re-renders the scene into a target it owns.
///
/// The reflection capture renders from a camera mirrored across the surface,
/// the refraction capture from the unmodified camera.
pub trait RenderToTexture {
    /// Handle to the sampleable color output.
    type Target: Clone;

    fn render_target(&self) -> Self::Target;

    fn set_world_transform(&mut self, world_from_local: Mat4);

    /// Performs one capture pass for the given camera.
    fn on_before_render(&mut self, camera: &CameraView) -> Result<(), IceError>;
}

/// Visibility switch of the drawable that carries the surface.
pub trait SurfaceVisibility {
    fn set_visible(&mut self, visible: bool);
}

impl SurfaceVisibility for bool {
    fn set_visible(&mut self, visible: bool) {
        *self = visible;
    }
}

/// Everything the host knows about the frame about to be drawn.
pub struct FrameInput<'a> {
    pub camera: &'a CameraView,
    pub surface_world: Mat4,
    /// Elapsed time since the previous frame
    pub delta_seconds: f32,
    pub visibility: &'a mut dyn SurfaceVisibility,
}

/// Captures that failed during one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub failures: Vec<IceError>,
}

impl FrameReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, kind: CaptureKind) -> bool {
        self.failures.iter().any(|failure| {
            matches!(failure, IceError::RenderStepFailure { target, .. } if *target == kind)
        })
    }
}

/// Something that must prepare itself before the host draws it.
pub trait Renderable {
    fn before_frame(&mut self, frame: FrameInput<'_>) -> FrameReport;
}

/// Owns the per-frame state: flow cycle, projection and published uniforms.
#[derive(Debug, Clone)]
pub struct SurfaceRenderCoordinator {
    projection: ProjectionMatrixBuilder,
    cycle: FlowCycleState,
    uniforms: ShadingUniforms,
}

impl SurfaceRenderCoordinator {
    pub fn new<T>(config: &EffectConfiguration<T>) -> Self {
        let cycle = FlowCycleState::default();
        Self {
            projection: ProjectionMatrixBuilder::default(),
            uniforms: ShadingUniforms::new(config, &cycle),
            cycle,
        }
    }

    pub fn uniforms(&self) -> &ShadingUniforms {
        &self.uniforms
    }

    pub fn cycle(&self) -> &FlowCycleState {
        &self.cycle
    }

    /// Runs the six steps for one frame.
    pub fn run_frame<Rf, Rr>(
        &mut self,
        frame: FrameInput<'_>,
        reflector: &mut Rf,
        refractor: &mut Rr,
    ) -> FrameReport
    where
        Rf: RenderToTexture + ?Sized,
        Rr: RenderToTexture + ?Sized,
    {
        let FrameInput {
            camera,
            surface_world,
            delta_seconds,
            visibility,
        } = frame;

        self.uniforms.texture_matrix = self.projection.build(camera, surface_world);

        self.cycle.advance(delta_seconds);
        self.uniforms.set_cycle(&self.cycle);

        reflector.set_world_transform(surface_world);
        refractor.set_world_transform(surface_world);

        visibility.set_visible(false);

        let mut report = FrameReport::default();
        let captures = [
            (CaptureKind::Reflection, reflector.on_before_render(camera)),
            (CaptureKind::Refraction, refractor.on_before_render(camera)),
        ];
        for (kind, result) in captures {
            if let Err(err) = result {
                warn!("Ice {kind} capture skipped, keeping previous target contents: {err}");
                report.failures.push(err);
            }
        }

        visibility.set_visible(true);

        report
    }
}

/// An ice surface: configuration, per-frame state and its two captures.
pub struct Surface<Rf: RenderToTexture, Rr: RenderToTexture, T> {
    config: EffectConfiguration<T>,
    coordinator: SurfaceRenderCoordinator,
    reflector: Rf,
    refractor: Rr,
}

impl<Rf: RenderToTexture, Rr: RenderToTexture, T> Surface<Rf, Rr, T> {
    /// Fails with [`IceError::MissingDependency`] when a capture is missing;
    /// no surface exists in that case.
    pub fn new(
        config: EffectConfiguration<T>,
        reflector: Option<Rf>,
        refractor: Option<Rr>,
    ) -> Result<Self, IceError> {
        let Some(reflector) = reflector else {
            error!("Ice surface: required component {REFLECTOR_NAME} not found");
            return Err(IceError::MissingDependency(REFLECTOR_NAME));
        };
        let Some(refractor) = refractor else {
            error!("Ice surface: required component {REFRACTOR_NAME} not found");
            return Err(IceError::MissingDependency(REFRACTOR_NAME));
        };

        Ok(Self {
            coordinator: SurfaceRenderCoordinator::new(&config),
            config,
            reflector,
            refractor,
        })
    }

    pub fn config(&self) -> &EffectConfiguration<T> {
        &self.config
    }

    pub fn uniforms(&self) -> &ShadingUniforms {
        self.coordinator.uniforms()
    }

    pub fn cycle(&self) -> &FlowCycleState {
        self.coordinator.cycle()
    }

    pub fn reflector(&self) -> &Rf {
        &self.reflector
    }

    pub fn refractor(&self) -> &Rr {
        &self.refractor
    }

    pub fn reflection_target(&self) -> Rf::Target {
        self.reflector.render_target()
    }

    pub fn refraction_target(&self) -> Rr::Target {
        self.refractor.render_target()
    }
}

impl<Rf: RenderToTexture, Rr: RenderToTexture, T> Renderable for Surface<Rf, Rr, T> {
    fn before_frame(&mut self, frame: FrameInput<'_>) -> FrameReport {
        self.coordinator
            .run_frame(frame, &mut self.reflector, &mut self.refractor)
    }
}
