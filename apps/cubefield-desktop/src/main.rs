use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cubefield_common::Rgb;
use cubefield_input::ControlAction;
use cubefield_kernel::{FieldConfig, FieldProfile, SimParams, Simulation};
use cubefield_render::{DebugTextRenderer, LightRig, Renderer, SceneToggles, describe_field};
use cubefield_render_wgpu::{OrbitCamera, SceneDecor, WgpuRenderer};
use cubefield_tools::{FieldInspector, FrameTimer};
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "cubefield-desktop", about = "Random cube field viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Named field preset
    #[arg(long, default_value = "resting")]
    profile: FieldProfile,

    /// YAML field config; overrides --profile
    #[arg(long)]
    config: Option<PathBuf>,

    /// RNG seed; omit for a non-reproducible run
    #[arg(long)]
    seed: Option<u64>,
}

/// Upper bound of the expand slider.
const EXPAND_MAX: f32 = 2.0;
/// Pixels of wheel travel per zoom step.
const PIXELS_PER_ZOOM_STEP: f64 = 50.0;

fn action_for_key(key: KeyCode) -> Option<ControlAction> {
    match key {
        KeyCode::KeyN => Some(ControlAction::AddBatch),
        KeyCode::KeyR => Some(ControlAction::ResetAll),
        KeyCode::KeyC => Some(ControlAction::ResetCamera),
        KeyCode::KeyO => Some(ControlAction::OutputObjects),
        KeyCode::KeyE => Some(ControlAction::ToggleExplode),
        KeyCode::Space => Some(ControlAction::ToggleRotateCamera),
        KeyCode::F1 => Some(ControlAction::TogglePanel),
        _ => None,
    }
}

/// Application state.
struct AppState {
    sim: Simulation,
    /// `None` when the config came from a file.
    profile: Option<FieldProfile>,
    params: SimParams,
    lights: LightRig,
    toggles: SceneToggles,
    camera: OrbitCamera,
    frame_timer: FrameTimer,
    show_panel: bool,
    // Input state
    dragging: bool,
    last_cursor: Option<(f64, f64)>,
    last_frame: Instant,
}

impl AppState {
    fn new(sim: Simulation, profile: Option<FieldProfile>) -> Self {
        let lights = LightRig::for_plane(sim.config().plane);
        Self {
            sim,
            profile,
            params: SimParams::default(),
            lights,
            toggles: SceneToggles::default(),
            camera: OrbitCamera::default(),
            frame_timer: FrameTimer::default(),
            show_panel: true,
            dragging: false,
            last_cursor: None,
            last_frame: Instant::now(),
        }
    }

    fn update(&mut self, dt: f32) {
        if self.toggles.rotate_camera {
            self.camera.auto_rotate(dt);
        }

        if let Err(e) = self.sim.tick(&self.params) {
            tracing::error!("tick failed: {e}");
        }
        for event in self.sim.field_mut().drain_events() {
            tracing::debug!(?event, "field event");
        }
    }

    /// Open the frame-timer bracket and advance one tick. Only called once a
    /// surface texture is in hand; `FrameTimer::end` closes it after present.
    fn begin_frame(&mut self) {
        self.frame_timer.begin();
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;
        self.update(dt);
    }

    fn apply(&mut self, action: ControlAction) {
        match action {
            ControlAction::AddBatch => {
                if let Err(e) = self.sim.add_batch() {
                    tracing::error!("failed to add cubes: {e}");
                }
            }
            ControlAction::ResetAll => {
                self.sim.reset_all(&mut self.params);
                self.toggles.reset();
                self.camera.reset();
            }
            ControlAction::ResetCamera => self.camera.reset(),
            ControlAction::OutputObjects => {
                let dump = DebugTextRenderer::new().render(self.sim.field(), &self.camera.scene_view());
                tracing::info!("\n{dump}");
            }
            ControlAction::ToggleExplode => self.params.exploding = !self.params.exploding,
            ControlAction::ToggleRotateCamera => {
                self.toggles.rotate_camera = !self.toggles.rotate_camera;
            }
            ControlAction::TogglePanel => self.show_panel = !self.show_panel,
        }
    }

    /// Swap the generator preset. Existing particles stay; later batches
    /// follow the new preset. The current scale mode is kept.
    fn switch_profile(&mut self, profile: FieldProfile) {
        let config = FieldConfig {
            scale_mode: self.sim.config().scale_mode,
            ..FieldConfig::profile(profile)
        };
        match self.sim.set_config(config) {
            Ok(()) => {
                self.profile = Some(profile);
                self.lights = LightRig {
                    ambient: self.lights.ambient,
                    ambient_enabled: self.lights.ambient_enabled,
                    spot: self.lights.spot,
                    ..LightRig::for_plane(self.sim.config().plane)
                };
                tracing::info!(%profile, "profile switched");
            }
            Err(e) => tracing::error!("failed to switch profile: {e}"),
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        if let Some(action) = action_for_key(key) {
            tracing::debug!(%action, "shortcut");
            self.apply(action);
        }
    }

    fn handle_cursor(&mut self, x: f64, y: f64) {
        if self.dragging {
            if let Some((lx, ly)) = self.last_cursor {
                self.camera.rotate((x - lx) as f32, (y - ly) as f32);
            }
        }
        self.last_cursor = Some((x, y));
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_panel {
            return;
        }

        let summary = FieldInspector::summary(&self.sim);
        let mut actions = Vec::new();
        let mut profile = self.profile;

        egui::SidePanel::right("controls")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Random Cubes");
                ui.separator();

                egui::CollapsingHeader::new("Cubes")
                    .default_open(true)
                    .show(ui, |ui| {
                        egui::ComboBox::from_label("profile")
                            .selected_text(profile.map_or("custom", FieldProfile::name))
                            .show_ui(ui, |ui| {
                                for p in FieldProfile::ALL {
                                    ui.selectable_value(&mut profile, Some(p), p.name());
                                }
                            });
                        if ui.button(ControlAction::AddBatch.caption()).clicked() {
                            actions.push(ControlAction::AddBatch);
                        }
                        ui.add(
                            egui::Slider::new(
                                &mut self.params.rotation_speed,
                                0.0..=SimParams::ROTATION_SPEED_MAX,
                            )
                            .text("rotation speed"),
                        );
                        ui.add(
                            egui::Slider::new(
                                &mut self.params.wave_frequency,
                                0.0..=SimParams::WAVE_FREQUENCY_MAX,
                            )
                            .text("sine wave freq"),
                        );
                        ui.checkbox(&mut self.params.exploding, "exploding (E)");
                        let expand = ui.add(
                            egui::Slider::new(&mut self.params.expand, 0.0..=EXPAND_MAX)
                                .text("expand"),
                        );
                        if expand.changed() {
                            self.sim.apply_scale(self.params.expand);
                        }
                        ui.checkbox(&mut self.params.auto_grow, "grow to cap");
                    });

                egui::CollapsingHeader::new("Lights")
                    .default_open(true)
                    .show(ui, |ui| {
                        ui.checkbox(&mut self.lights.ambient_enabled, "ambient light");
                        ui.checkbox(&mut self.lights.spot.enabled, "spot light");
                        ui.horizontal(|ui| {
                            color_edit(ui, &mut self.lights.ambient);
                            ui.label("ambient color");
                        });
                        ui.horizontal(|ui| {
                            color_edit(ui, &mut self.lights.spot.color);
                            ui.label("spot color");
                        });
                    });

                egui::CollapsingHeader::new("Helpers").show(ui, |ui| {
                    ui.checkbox(&mut self.toggles.show_axes, "show axes");
                    ui.checkbox(&mut self.toggles.show_plane, "show plane");
                    ui.checkbox(&mut self.toggles.show_spot_helper, "show spot light");
                });

                ui.separator();
                ui.label(format!(
                    "Particles: {} / {}",
                    summary.particle_count, summary.cap
                ));
                ui.checkbox(&mut self.toggles.rotate_camera, "rotate camera (Space)");
                for action in [
                    ControlAction::OutputObjects,
                    ControlAction::ResetCamera,
                    ControlAction::ResetAll,
                ] {
                    if ui.button(action.caption()).clicked() {
                        actions.push(action);
                    }
                }

                ui.separator();
                let avg = self.frame_timer.average();
                ui.label(format!(
                    "{:.0} fps  {:.2} ms (max {:.2})",
                    self.frame_timer.fps(),
                    avg.as_secs_f64() * 1000.0,
                    self.frame_timer.max().as_secs_f64() * 1000.0
                ));
                ui.label(format!("Tick: {}", summary.tick));

                ui.separator();
                ui.small("F1: Toggle Panel | LMB: Orbit | Wheel: Zoom");
            });

        if let Some(p) = profile.filter(|p| self.profile != Some(*p)) {
            self.switch_profile(p);
        }
        for action in actions {
            self.apply(action);
        }
    }
}

fn color_edit(ui: &mut egui::Ui, color: &mut Rgb) {
    let mut rgb = color.components();
    if ui.color_edit_button_srgb(&mut rgb).changed() {
        *color = Rgb::from_components(rgb[0], rgb[1], rgb[2]);
    }
}

/// Everything created once a window exists.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Random Cubes")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("create window")?,
        );

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
        .ok_or_else(|| anyhow!("no suitable GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("cubefield_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(sim: Simulation, profile: Option<FieldProfile>) -> Self {
        Self {
            state: AppState::new(sim, profile),
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn redraw(&mut self) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };

        // No tick without a frame to show it in.
        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        self.state.begin_frame();

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let boxes = describe_field(self.state.sim.field());
        let decor = SceneDecor {
            lights: &self.state.lights,
            toggles: self.state.toggles,
            plane: self.state.sim.config().plane,
        };
        gpu.renderer.render(
            &gpu.device,
            &gpu.queue,
            &view,
            &self.state.camera,
            &boxes,
            &decor,
        );

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });

        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        self.state.frame_timer.end();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        match Gpu::new(event_loop, &self.egui_ctx) {
            Ok(gpu) => {
                self.state.camera.aspect = gpu.aspect();
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialize graphics: {e:#}");
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
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                    self.state.camera.aspect = gpu.aspect();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.state.handle_key(key);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                self.state.dragging = btn_state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state.handle_cursor(position.x, position.y);
            }
            WindowEvent::CursorLeft { .. } => {
                self.state.dragging = false;
                self.state.last_cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / PIXELS_PER_ZOOM_STEP) as f32,
                };
                self.state.camera.zoom(steps);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => FieldConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => FieldConfig::profile(cli.profile),
    };
    let sim = Simulation::new(config, cli.seed)?;
    let profile = cli.config.is_none().then_some(cli.profile);

    tracing::info!(profile = %cli.profile, seed = ?cli.seed, "cubefield-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(sim, profile);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_action_has_a_key() {
        let keys = [
            KeyCode::KeyN,
            KeyCode::KeyR,
            KeyCode::KeyC,
            KeyCode::KeyO,
            KeyCode::KeyE,
            KeyCode::Space,
            KeyCode::F1,
        ];
        let mapped: Vec<_> = keys.into_iter().filter_map(action_for_key).collect();
        for action in ControlAction::ALL {
            assert!(mapped.contains(&action), "{action} has no key");
        }
        assert_eq!(action_for_key(KeyCode::KeyZ), None);
    }

    #[test]
    fn frame_bracket_covers_exactly_one_tick() {
        let sim = Simulation::new(FieldConfig::default(), Some(3)).unwrap();
        let mut state = AppState::new(sim, Some(FieldProfile::Resting));
        assert_eq!(state.frame_timer.end(), None);

        state.begin_frame();
        assert_eq!(state.sim.tick_count(), 1);
        assert!(state.frame_timer.end().is_some());
        assert_eq!(state.frame_timer.count(), 1);
        assert_eq!(state.frame_timer.end(), None);
    }

    #[test]
    fn switch_profile_updates_config_and_keeps_field() {
        let sim = Simulation::new(FieldConfig::default(), Some(2)).unwrap();
        let mut state = AppState::new(sim, Some(FieldProfile::Resting));
        state.apply(ControlAction::AddBatch);
        state.lights.ambient = Rgb(0x123456);

        state.switch_profile(FieldProfile::Floating);

        assert_eq!(state.profile, Some(FieldProfile::Floating));
        assert_eq!(
            state.sim.config(),
            &FieldConfig::profile(FieldProfile::Floating)
        );
        assert_eq!(state.sim.field().len(), 100);
        assert_eq!(state.lights.ambient, Rgb(0x123456));
    }

    #[test]
    fn reset_all_restores_host_state() {
        let sim = Simulation::new(FieldConfig::default(), Some(1)).unwrap();
        let mut state = AppState::new(sim, Some(FieldProfile::Resting));
        state.apply(ControlAction::AddBatch);
        state.apply(ControlAction::ToggleExplode);
        state.toggles.show_axes = true;
        state.camera.rotate(200.0, 50.0);

        state.apply(ControlAction::ResetAll);

        assert!(state.sim.field().is_empty());
        assert!(!state.params.exploding);
        assert!(!state.toggles.show_axes);
        assert!(!state.toggles.show_plane);
        assert!(state.camera.position().abs_diff_eq(
            cubefield_render::SceneView::HOME_EYE,
            1e-2
        ));
    }
}
