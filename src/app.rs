//! Application event loop and per-frame composition.
//!
//! The loop is single-threaded and frame-stepped: winit callbacks only fold
//! events into the [`InputState`] snapshot, and each `RedrawRequested` reads
//! that snapshot once, advances the camera, rebuilds the per-material
//! instance lists from the static grid and submits one instanced draw per
//! material group. The vsync wait at present time paces the loop; the loop
//! exits when the close request is observed.

use std::iter;
use std::path::PathBuf;
use std::sync::Arc;

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window},
};

use crate::{
    context::Context,
    data_structures::{
        catalog::Catalog, grid::Grid, instance::InstanceRaw, texture::Texture,
    },
    input::InputState,
    resources, scene,
};

/// Asset locations and window settings, all resolvable before any GPU work.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub grid_image: PathBuf,
    /// Where to write the diagnostic re-encoding of the loaded grid.
    pub grid_snapshot: Option<PathBuf>,
    pub tileset_obj: PathBuf,
    pub texture_dir: PathBuf,
    pub metadata: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "gridscape".to_string(),
            grid_image: "assets/map.png".into(),
            grid_snapshot: Some("assets/map_roundtrip.png".into()),
            tileset_obj: "assets/tileset.obj".into(),
            texture_dir: "assets".into(),
            metadata: "assets/metadata.json".into(),
            width: 800,
            height: 600,
        }
    }
}

/// Everything that exists once the load phase succeeded.
#[derive(Debug)]
struct AppState {
    ctx: Context,
    catalog: Catalog,
    grid: Grid,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, config: &AppConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;

        let mut catalog =
            resources::load_catalog(&config.tileset_obj, &config.texture_dir, &config.metadata)
                .await?;
        catalog.upload(&ctx.device, &ctx.queue, &ctx.material_bind_group_layout)?;

        let grid = Grid::load(&config.grid_image, catalog.palette())?;
        if let Some(snapshot) = &config.grid_snapshot {
            // Diagnostic artifact only, a failed write is not fatal.
            if let Err(e) = grid.save(snapshot, catalog.palette()) {
                log::warn!("could not write grid snapshot to {:?}: {e}", snapshot);
            }
        }

        Ok(Self {
            ctx,
            catalog,
            grid,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        // The grid is static, so these lists are identical every frame.
        // Rebuilding them anyway keeps the composition step stateless.
        let lists = scene::build_instance_lists(&self.grid, &self.catalog);
        let instance_data: Vec<Vec<InstanceRaw>> = lists
            .iter()
            .map(|list| list.iter().map(|&world| world.into()).collect())
            .collect();
        for (group, instances) in self.catalog.groups.iter_mut().zip(&instance_data) {
            group.write_instances(&self.ctx.device, &self.ctx.queue, instances);
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.ctx.tile_pipeline);
            render_pass.set_bind_group(1, &self.ctx.camera.bind_group, &[]);
            render_pass.set_bind_group(2, &self.ctx.light.bind_group, &[]);
            // One instanced draw per material group; each draw leaves its
            // buffers and texture bound for the next one to overwrite.
            for (group, instances) in self.catalog.groups.iter().zip(&instance_data) {
                group.draw(&mut render_pass, instances.len() as u32);
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App {
    config: AppConfig,
    async_runtime: tokio::runtime::Runtime,
    state: Option<AppState>,
    input: InputState,
    last_time: Instant,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(config: AppConfig, async_runtime: tokio::runtime::Runtime) -> Self {
        Self {
            config,
            async_runtime,
            state: None,
            input: InputState::default(),
            last_time: Instant::now(),
            fatal: None,
        }
    }

    fn set_cursor_lock(&mut self, locked: bool) {
        let Some(state) = &self.state else {
            return;
        };
        let window = &state.ctx.window;
        if locked {
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(e) = grabbed {
                log::warn!("could not lock cursor: {e}");
                return;
            }
            window.set_cursor_visible(false);
            self.input.cursor_locked = true;
        } else {
            let _ = window.set_cursor_grab(CursorGrabMode::None);
            window.set_cursor_visible(true);
            self.input.cursor_locked = false;
        }
    }

    fn handle_key(&mut self, code: KeyCode, pressed: bool, repeat: bool) {
        match code {
            KeyCode::KeyW => self.input.forward = pressed,
            KeyCode::KeyS => self.input.backward = pressed,
            KeyCode::KeyA => self.input.left = pressed,
            KeyCode::KeyD => self.input.right = pressed,
            KeyCode::ShiftLeft => self.input.sprint = pressed,
            KeyCode::KeyG if pressed && !repeat => {
                if let Some(state) = &mut self.state {
                    state.ctx.camera.camera.toggle_mode();
                    log::debug!("camera mode: {:?}", state.ctx.camera.camera.mode());
                }
            }
            KeyCode::Escape if pressed && self.input.cursor_locked => {
                self.set_cursor_lock(false);
            }
            _ => (),
        }
    }

    fn frame(&mut self) {
        let dt = self.last_time.elapsed();
        self.last_time = Instant::now();

        let Some(state) = &mut self.state else {
            return;
        };

        state.ctx.camera.camera.advance(&mut self.input, dt);
        state
            .ctx
            .camera
            .uniform
            .update_view_proj(&state.ctx.camera.camera, &state.ctx.projection);
        state.ctx.queue.write_buffer(
            &state.ctx.camera.buffer,
            0,
            bytemuck::cast_slice(&[state.ctx.camera.uniform]),
        );

        match state.render() {
            Ok(_) => (),
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
            }
            Err(e) => {
                log::error!("Unable to render {}", e);
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window_attributes = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fatal = Some(anyhow::Error::new(e).context("failed to create the window"));
                event_loop.exit();
                return;
            }
        };

        let state = self
            .async_runtime
            .block_on(AppState::new(window, &self.config));
        match state {
            Ok(state) => {
                self.state = Some(state);
                self.set_cursor_lock(true);
                self.last_time = Instant::now();
            }
            Err(e) => {
                log::error!("startup failed: {e:#}");
                self.fatal = Some(e);
                event_loop.exit();
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        // Pointer look only applies while the cursor is locked.
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.input.cursor_locked {
                self.input.accumulate_look(dx, dy);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(state) = &mut self.state {
                    state.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.handle_key(code, event.state.is_pressed(), event.repeat);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left && state.is_pressed() && !self.input.cursor_locked {
                    self.set_cursor_lock(true);
                }
            }
            WindowEvent::RedrawRequested => self.frame(),
            _ => {}
        }
    }
}

/// Run the renderer until the window is closed.
///
/// Startup failures (missing catalog assets, surface/device creation) are
/// fatal and propagate out so the binary can report them and exit non-zero.
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    }

    let async_runtime = tokio::runtime::Runtime::new()?;
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, async_runtime);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
