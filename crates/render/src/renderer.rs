use crate::backend::{Blend, DepthCompare, Program, RenderBackend};
use crate::camera::Camera;
use crate::draw::Drawable;
use crate::lighting::LightingParameters;
use crate::skybox::Skybox;
use lumen_scene::{GpuResources, Scene};

/// Per-frame toggles owned by the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameToggles {
    pub flashlight: bool,
    pub wireframe: bool,
}

/// What one frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub models: usize,
    pub draw_calls: u32,
}

/// Orchestrates one frame: sort, lighting, models, skybox.
///
/// Reads the scene but only reorders it; transforms are never touched here.
#[derive(Debug)]
pub struct SceneRenderer {
    skybox: Option<Skybox>,
    shininess: f32,
}

impl SceneRenderer {
    pub fn new(skybox: Option<Skybox>, shininess: f32) -> Self {
        Self { skybox, shininess }
    }

    pub fn has_skybox(&self) -> bool {
        self.skybox.is_some()
    }

    pub fn render_frame(
        &self,
        backend: &mut dyn RenderBackend,
        scene: &mut Scene,
        camera: &Camera,
        aspect_ratio: f32,
        toggles: FrameToggles,
    ) -> FrameStats {
        scene.sort_back_to_front(camera.position());

        let view = camera.view_matrix();
        let projection = camera.projection_matrix(aspect_ratio);

        backend.set_wireframe(toggles.wireframe);
        backend.set_depth_compare(DepthCompare::Less);
        backend.set_blend(Blend::Disabled);
        backend.use_program(Program::Lighting);
        backend.set_mat4("projection", projection);
        backend.set_mat4("view", view);
        backend.set_float("material.shininess", self.shininess);
        LightingParameters::assemble(camera.position(), camera.front(), toggles.flashlight)
            .apply(backend);

        let mut draw_calls: u32 = scene.models().iter().map(|m| m.draw(backend)).sum();

        if let Some(skybox) = &self.skybox {
            skybox.draw(backend, view, projection);
            draw_calls += 1;
        }

        FrameStats {
            models: scene.len(),
            draw_calls,
        }
    }

    /// Free the skybox geometry.
    pub fn release(self, gpu: &mut dyn GpuResources) {
        if let Some(skybox) = self.skybox {
            skybox.release(gpu);
        }
    }
}
