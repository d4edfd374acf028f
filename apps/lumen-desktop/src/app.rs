use lumen_common::Config;
use lumen_input::{Action, InputState};
use lumen_remote::{CommandInbox, MAX_COMMANDS_PER_FRAME};
use lumen_render::{
    Camera, FixedTicker, FpsCounter, FrameStats, FrameToggles, RenderBackend, SceneRenderer,
};
use lumen_scene::Scene;
use std::time::Duration;

/// Speed multiplier while sprint is held.
const SPRINT_MULTIPLIER: f32 = 2.0;

/// Outcome of one frame's update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameUpdate {
    pub quit: bool,
    /// Set once per second with the measured frame rate.
    pub fps: Option<u32>,
}

/// Render-thread state: the scene, the camera and everything that feeds
/// them between frames.
pub struct AppState {
    config: Config,
    scene: Scene,
    camera: Camera,
    input: InputState,
    ticker: FixedTicker,
    fps: FpsCounter,
    toggles: FrameToggles,
    /// Discrete actions waiting for the next fixed tick.
    pending: Vec<Action>,
    inbox: CommandInbox,
}

impl AppState {
    pub fn new(config: Config, scene: Scene, inbox: CommandInbox) -> Self {
        Self {
            camera: Camera::from_config(&config),
            config,
            scene,
            input: InputState::new(),
            ticker: FixedTicker::default(),
            fps: FpsCounter::new(),
            toggles: FrameToggles::default(),
            pending: Vec::new(),
            inbox,
        }
    }

    pub fn input(&mut self) -> &mut InputState {
        &mut self.input
    }

    #[cfg(test)]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[cfg(test)]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[cfg(test)]
    pub fn toggles(&self) -> FrameToggles {
        self.toggles
    }

    /// Apply remote commands and this frame's input.
    pub fn update(&mut self, frame_time: Duration) -> FrameUpdate {
        self.inbox.drain(&mut self.scene, MAX_COMMANDS_PER_FRAME);

        let frame = self.input.take_frame();
        if let Some(cursor) = frame.cursor {
            self.camera.process_cursor(cursor);
        }
        if frame.scroll != 0.0 {
            self.camera.adjust_zoom(frame.scroll);
        }

        let dt = frame_time.as_secs_f32();
        let speed = if frame.sprint {
            self.config.camera_speed * SPRINT_MULTIPLIER
        } else {
            self.config.camera_speed
        };
        for movement in frame.movements {
            self.camera.translate(movement, speed, dt);
        }

        let mut quit = false;
        for action in frame.actions {
            match action {
                Action::Quit => quit = true,
                other => self.pending.push(other),
            }
        }

        if self.ticker.advance(frame_time) {
            self.fixed_update();
        }

        FrameUpdate {
            quit,
            fps: self.fps.frame(frame_time),
        }
    }

    fn fixed_update(&mut self) {
        for action in self.pending.drain(..) {
            match action {
                Action::ToggleFlashlight => {
                    self.toggles.flashlight = !self.toggles.flashlight;
                    tracing::info!(enabled = self.toggles.flashlight, "flashlight toggled");
                }
                Action::ToggleWireframe => {
                    self.toggles.wireframe = !self.toggles.wireframe;
                    tracing::info!(enabled = self.toggles.wireframe, "wireframe toggled");
                }
                Action::Move(_) | Action::Sprint | Action::Quit => {}
            }
        }
    }

    /// Record the frame's draws into `backend`.
    pub fn render(
        &mut self,
        renderer: &SceneRenderer,
        backend: &mut dyn RenderBackend,
        aspect_ratio: f32,
    ) -> FrameStats {
        renderer.render_frame(
            backend,
            &mut self.scene,
            &self.camera,
            aspect_ratio,
            self.toggles,
        )
    }
}
