mod app;

use anyhow::{Context, Result};
use app::AppState;
use clap::Parser;
use lumen_assets::{SceneLoad, load_missing_texture, load_scene, load_skybox_cubemap};
use lumen_common::Config;
use lumen_input::Key;
use lumen_remote::{CommandInbox, RemoteServer};
use lumen_render::{SceneRenderer, Skybox};
use lumen_render_wgpu::WgpuBackend;
use lumen_scene::SceneDescription;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

const WINDOW_TITLE: &str = "Lumen";
/// Longest frame time fed to the update, so a stall does not fling the camera.
const MAX_FRAME_TIME: Duration = Duration::from_millis(100);
/// Touchpad pixels per scroll line.
const PIXELS_PER_LINE: f64 = 40.0;

#[derive(Parser)]
#[command(name = "lumen-desktop", about = "Lumen scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Scene description file
    #[arg(long, default_value = "scene.yaml")]
    scene: PathBuf,
}

/// Map a physical key to a viewer binding.
fn map_key(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::Space => Key::Space,
        KeyCode::ControlLeft => Key::LeftControl,
        KeyCode::ShiftLeft => Key::LeftShift,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyZ => Key::Z,
        KeyCode::Escape => Key::Escape,
        _ => return None,
    };
    Some(key)
}

/// Everything loaded before the window exists.
struct Startup {
    config: Config,
    description: SceneDescription,
    inbox: CommandInbox,
}

/// The running viewer: window, surface, backend and render-thread state.
struct Viewer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    backend: WgpuBackend,
    renderer: SceneRenderer,
    state: AppState,
    last_frame: Instant,
}

struct GpuApp {
    startup: Option<Startup>,
    viewer: Option<Viewer>,
    error: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(startup: Startup) -> Self {
        Self {
            startup: Some(startup),
            viewer: None,
            error: None,
        }
    }
}

fn init_viewer(event_loop: &ActiveEventLoop, startup: Startup) -> Result<Viewer> {
    let Startup {
        config,
        description,
        inbox,
    } = startup;

    let attrs = Window::default_attributes()
        .with_title(WINDOW_TITLE)
        .with_inner_size(PhysicalSize::new(config.width, config.height));
    let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    let surface = instance
        .create_surface(window.clone())
        .context("create surface")?;

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: Some(&surface),
        force_fallback_adapter: false,
    }))
    .context("no compatible GPU adapter")?;

    let supports_wireframe = adapter
        .features()
        .contains(wgpu::Features::POLYGON_MODE_LINE);
    let required_features = if supports_wireframe {
        wgpu::Features::POLYGON_MODE_LINE
    } else {
        wgpu::Features::empty()
    };
    let (device, queue) = pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("lumen_device"),
            required_features,
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
        },
        None,
    ))
    .context("create device")?;

    let size = window.inner_size();
    let caps = surface.get_capabilities(&adapter);
    let surface_format = caps
        .formats
        .iter()
        .find(|f| f.is_srgb())
        .or_else(|| caps.formats.first())
        .copied()
        .context("surface reports no formats")?;
    let surface_config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: surface_format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: if config.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        },
        alpha_mode: caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto),
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };
    surface.configure(&device, &surface_config);

    let mut backend = WgpuBackend::new(
        device,
        queue,
        surface_format,
        surface_config.width,
        surface_config.height,
        supports_wireframe,
    );
    tracing::info!(
        backend = adapter.get_info().backend.to_str(),
        wireframe = supports_wireframe,
        "GPU initialized"
    );

    let missing = load_missing_texture(&config.missing_texture, &mut backend).with_context(|| {
        format!(
            "load missing texture {}",
            config.missing_texture.display()
        )
    })?;
    backend.set_missing_texture(missing);

    let skybox = match &config.skybox {
        Some(dir) => {
            let cubemap = load_skybox_cubemap(dir, &mut backend)
                .with_context(|| format!("load skybox {}", dir.display()))?;
            Some(Skybox::new(&mut backend, cubemap))
        }
        None => None,
    };
    let renderer = SceneRenderer::new(skybox, config.shininess);

    let SceneLoad { scene, skipped } = load_scene(&description, &mut backend);
    if !skipped.is_empty() {
        tracing::warn!("{} of {} objects failed to load", skipped.len(), description.objects.len());
    }

    capture_cursor(&window);

    Ok(Viewer {
        window,
        surface,
        surface_config,
        backend,
        renderer,
        state: AppState::new(config, scene, inbox),
        last_frame: Instant::now(),
    })
}

/// Hide the cursor and keep it in the window for mouse look.
fn capture_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(e) = grabbed {
        tracing::warn!("cursor grab unavailable: {e}");
    }
    window.set_cursor_visible(false);
}

impl Viewer {
    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.surface_config.width = size.width.max(1);
        self.surface_config.height = size.height.max(1);
        self.surface
            .configure(self.backend.device(), &self.surface_config);
        self.backend
            .resize(self.surface_config.width, self.surface_config.height);
    }

    /// Update and draw one frame. Returns false when the viewer should close.
    fn frame(&mut self) -> bool {
        let now = Instant::now();
        let frame_time = (now - self.last_frame).min(MAX_FRAME_TIME);
        self.last_frame = now;

        let update = self.state.update(frame_time);
        if update.quit {
            return false;
        }
        if let Some(fps) = update.fps {
            self.window.set_title(&format!("{WINDOW_TITLE} - {fps} FPS"));
        }

        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface
                    .configure(self.backend.device(), &self.surface_config);
                return true;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return true;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let aspect_ratio =
            self.surface_config.width as f32 / self.surface_config.height.max(1) as f32;
        self.backend.begin_frame();
        let stats = self
            .state
            .render(&self.renderer, &mut self.backend, aspect_ratio);
        self.backend.submit(&view);
        output.present();
        tracing::trace!(models = stats.models, draw_calls = stats.draw_calls, "frame");
        true
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(startup) = self.startup.take() else {
            return;
        };
        match init_viewer(event_loop, startup) {
            Ok(viewer) => self.viewer = Some(viewer),
            Err(e) => {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(viewer) = &mut self.viewer else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => viewer.resize(new_size),
            WindowEvent::Focused(false) => viewer.state.input().release_all(),
            WindowEvent::Focused(true) => capture_cursor(&viewer.window),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if let Some(key) = map_key(code) {
                    viewer
                        .state
                        .input()
                        .key(key, key_state == ElementState::Pressed);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / PIXELS_PER_LINE) as f32,
                };
                viewer.state.input().scroll(lines);
            }
            WindowEvent::RedrawRequested => {
                if viewer.frame() {
                    viewer.window.request_redraw();
                } else {
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let (Some(viewer), DeviceEvent::MouseMotion { delta }) = (&mut self.viewer, event) {
            viewer
                .state
                .input()
                .mouse_motion(delta.0 as f32, delta.1 as f32);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(viewer) = &self.viewer {
            viewer.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("lumen-desktop starting");

    let config = Config::load(&cli.config)
        .with_context(|| format!("load config {}", cli.config.display()))?;
    let description = SceneDescription::load(&cli.scene)
        .with_context(|| format!("load scene {}", cli.scene.display()))?;

    let (sender, inbox) = lumen_remote::channel();
    let server = match RemoteServer::bind(config.remote_address.as_str())
        .and_then(|server| server.spawn(sender))
    {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(
                "remote control disabled, cannot listen on {}: {e}",
                config.remote_address
            );
            None
        }
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(Startup {
        config,
        description,
        inbox,
    });
    event_loop.run_app(&mut app)?;

    if let Some(server) = server {
        server.shutdown();
    }
    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
