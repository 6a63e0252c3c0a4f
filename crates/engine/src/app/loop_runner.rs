use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{error, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowBuilder};

use super::clock::FrameClock;
use super::input::{ActionStates, InputAction, InputSnapshot, KeyReleaseTracker};
use super::metrics::LoopMetrics;
use super::rendering::Renderer;
use super::scene::{Scene, SceneCommand, SceneRuntime};
use super::SimError;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    /// Framebuffer size in simulation pixels; the window is this times
    /// `window_scale`.
    pub framebuffer_width: u32,
    pub framebuffer_height: u32,
    pub window_scale: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub sprite_dir: PathBuf,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Platformer".to_string(),
            framebuffer_width: 400,
            framebuffer_height: 400,
            window_scale: 2,
            target_tps: 50,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            sprite_dir: PathBuf::from("assets/base/sprites"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("simulation failed: {0}")]
    Simulation(#[from] SimError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window and drives `scene` at a fixed tick rate until the window
/// closes, Escape is pressed, or a tick fails.
pub fn run_app(config: LoopConfig, scene: Box<dyn Scene>) -> Result<(), AppError> {
    let mut runtime = SceneRuntime::new(scene);
    runtime.load()?;

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let scale = config.window_scale.max(1);
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                f64::from(config.framebuffer_width * scale),
                f64::from(config.framebuffer_height * scale),
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let renderer = Renderer::new(
        Arc::clone(&window),
        config.framebuffer_width,
        config.framebuffer_height,
        config.sprite_dir.clone(),
    )
    .map_err(AppError::CreateRenderer)?;

    let clock = FrameClock::new(
        config.target_tps,
        config.max_frame_delta,
        config.max_ticks_per_frame,
    );
    info!(
        target_tps = config.target_tps.max(1),
        fixed_dt_ms = clock.step().as_millis() as u64,
        max_ticks_per_frame = clock.max_ticks(),
        framebuffer_width = config.framebuffer_width,
        framebuffer_height = config.framebuffer_height,
        window_scale = scale,
        "loop_config"
    );

    let mut state = LoopState {
        metrics: LoopMetrics::new(config.metrics_log_interval),
        base_title: config.window_title,
        window,
        renderer,
        runtime,
        clock,
        input: InputCollector::default(),
        applied_title: None,
        fatal: None,
    };

    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop
        .run(|event, target| match event {
            Event::WindowEvent { window_id, event } if window_id == state.window.id() => {
                state.on_window_event(event, target);
            }
            Event::AboutToWait => state.window.request_redraw(),
            Event::LoopExiting => {
                state.runtime.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)?;

    match state.fatal {
        Some(err) => Err(AppError::Simulation(err)),
        None => Ok(()),
    }
}

struct LoopState {
    window: Arc<Window>,
    renderer: Renderer,
    runtime: SceneRuntime,
    clock: FrameClock,
    metrics: LoopMetrics,
    input: InputCollector,
    base_title: String,
    applied_title: Option<String>,
    fatal: Option<SimError>,
}

impl LoopState {
    fn on_window_event(&mut self, event: WindowEvent, target: &EventLoopWindowTarget<()>) {
        match event {
            WindowEvent::CloseRequested => {
                self.input.mark_quit_requested();
                info!(reason = "window_close", "shutdown_requested");
                target.exit();
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height, target),
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = self.window.inner_size();
                self.resize(size.width, size.height, target);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.input
                    .handle_keyboard_input(&event, self.runtime.releases_mut());
                if self.input.quit_requested {
                    info!(reason = "escape_key", "shutdown_requested");
                    target.exit();
                }
            }
            WindowEvent::RedrawRequested => self.frame(Instant::now(), target),
            _ => {}
        }
    }

    fn resize(&mut self, width: u32, height: u32, target: &EventLoopWindowTarget<()>) {
        if let Err(error) = self.renderer.resize(width, height) {
            warn!(error = %error, "renderer_resize_failed");
            target.exit();
        }
    }

    fn frame(&mut self, now: Instant, target: &EventLoopWindowTarget<()>) {
        let budget = self.clock.begin_frame(now);
        let mut ticks_run = 0;
        while ticks_run < budget.ticks {
            let snapshot = self.input.snapshot_for_tick();
            let command = self.runtime.tick(&snapshot);
            ticks_run += 1;
            match command {
                Ok(SceneCommand::None) => {}
                Ok(SceneCommand::Quit) => {
                    info!(reason = "scene_quit", "shutdown_requested");
                    target.exit();
                    break;
                }
                Err(err) => {
                    error!(error = %err, "simulation_failed");
                    self.fatal = Some(err);
                    target.exit();
                    return;
                }
            }
        }
        if budget.dropped > Duration::ZERO {
            warn!(
                dropped_backlog_ms = budget.dropped.as_millis() as u64,
                max_ticks_per_frame = self.clock.max_ticks(),
                "sim_clamp_triggered"
            );
        }

        if let Err(error) = self.renderer.render_registry(self.runtime.registry_mut()) {
            warn!(error = %error, "renderer_draw_failed");
            target.exit();
        }
        self.refresh_title();

        self.metrics.record(&budget, ticks_run);
        if let Some(report) = self.metrics.report_due(now) {
            info!(
                fps = report.fps,
                tps = report.tps,
                frame_time_ms = report.mean_frame_ms,
                worst_frame_ms = report.worst_frame_ms,
                dropped_ms = report.dropped_ms,
                entity_count = self.runtime.registry().len(),
                "loop_metrics"
            );
        }
    }

    fn refresh_title(&mut self) {
        let title = self.runtime.debug_title();
        if title == self.applied_title {
            return;
        }
        self.window
            .set_title(title.as_deref().unwrap_or(&self.base_title));
        self.applied_title = title;
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    held: ActionStates,
    pressed_edges: ActionStates,
}

impl InputCollector {
    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent, releases: &mut KeyReleaseTracker) {
        let Some(action) = action_for_key(key_event.physical_key) else {
            return;
        };
        self.handle_action_state(action, key_event.state, releases);
    }

    fn handle_action_state(
        &mut self,
        action: InputAction,
        state: ElementState,
        releases: &mut KeyReleaseTracker,
    ) {
        match state {
            ElementState::Pressed => {
                if !self.held.is_down(action) {
                    self.pressed_edges.set(action, true);
                }
                self.held.set(action, true);
                if action == InputAction::Quit {
                    self.mark_quit_requested();
                }
            }
            ElementState::Released => {
                if self.held.is_down(action) {
                    releases.on_key_release(action);
                }
                self.held.set(action, false);
            }
        }
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(self.quit_requested, self.held, self.pressed_edges);
        self.pressed_edges = ActionStates::default();
        snapshot
    }
}

fn action_for_key(key: PhysicalKey) -> Option<InputAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    match code {
        KeyCode::ArrowUp | KeyCode::KeyW => Some(InputAction::MoveUp),
        KeyCode::ArrowDown | KeyCode::KeyS => Some(InputAction::MoveDown),
        KeyCode::ArrowLeft | KeyCode::KeyA => Some(InputAction::MoveLeft),
        KeyCode::ArrowRight | KeyCode::KeyD => Some(InputAction::MoveRight),
        KeyCode::KeyZ | KeyCode::Space => Some(InputAction::Jump),
        KeyCode::KeyX => Some(InputAction::Cast),
        KeyCode::KeyR => Some(InputAction::ToggleRed),
        KeyCode::KeyG => Some(InputAction::ToggleGreen),
        KeyCode::KeyB => Some(InputAction::ToggleBlue),
        KeyCode::Escape => Some(InputAction::Quit),
        _ => None,
    }
}
