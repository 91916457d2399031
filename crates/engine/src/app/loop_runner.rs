use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use super::feed::SnapshotFeed;
use super::frame::{FrameScheduler, FrameTick};
use super::input::InputCollector;
use super::interpolation::DEFAULT_LERP_SPEED;
use super::metrics::MetricsAccumulator;
use super::rendering::{FrameStyle, Renderer, TileBrush, DEFAULT_TILE_SIZE_PX};
use super::session::{inventory_summary, ClientSession};
use super::snapshot::{Inventory, WorldSnapshot};

pub const DEFAULT_WORLD_SIZE: u32 = 32;
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub window_title: String,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub tile_size_px: f32,
    pub world_size: u32,
    pub lerp_speed: f32,
    pub max_frame_delta: Duration,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
    pub server_addr: String,
    pub connect_timeout: Duration,
    pub tile_brush: TileBrush,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            window_title: "Torus".to_string(),
            canvas_width: 640,
            canvas_height: 480,
            tile_size_px: DEFAULT_TILE_SIZE_PX,
            world_size: DEFAULT_WORLD_SIZE,
            lerp_speed: DEFAULT_LERP_SPEED,
            max_frame_delta: Duration::from_millis(250),
            metrics_log_interval: Duration::from_secs(1),
            max_render_fps: None,
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            connect_timeout: Duration::from_secs(2),
            tile_brush: TileBrush::Flat,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("world size must be at least 1")]
    ZeroWorldSize,
    #[error("tile size must be finite, at least 1 pixel and no larger than the canvas, got {0}")]
    InvalidTileSize(f32),
    #[error("lerp speed must be finite and positive, got {0}")]
    InvalidLerpSpeed(f32),
    #[error("canvas must be at least 1x1 pixels, got {width}x{height}")]
    EmptyCanvas { width: u32, height: u32 },
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world_size == 0 {
            return Err(ConfigError::ZeroWorldSize);
        }
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(ConfigError::EmptyCanvas {
                width: self.canvas_width,
                height: self.canvas_height,
            });
        }
        let longest_canvas_side = self.canvas_width.max(self.canvas_height) as f32;
        if !(self.tile_size_px.is_finite()
            && self.tile_size_px >= 1.0
            && self.tile_size_px <= longest_canvas_side)
        {
            return Err(ConfigError::InvalidTileSize(self.tile_size_px));
        }
        if !(self.lerp_speed.is_finite() && self.lerp_speed > 0.0) {
            return Err(ConfigError::InvalidLerpSpeed(self.lerp_speed));
        }
        Ok(())
    }

    fn frame_style(&self) -> FrameStyle {
        FrameStyle {
            tile_size_px: self.tile_size_px,
            world_size: self.world_size,
            brush: self.tile_brush,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid client configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// What one display refresh does: interpolate, then redraw everything.
struct ClientFrame {
    session: ClientSession,
    renderer: Renderer,
    style: FrameStyle,
    metrics: MetricsAccumulator,
    render_error: Option<PixelsError>,
}

impl FrameTick for ClientFrame {
    fn tick(&mut self, dt: Duration) {
        let started = Instant::now();
        self.session.advance(dt.as_secs_f32());
        if let Err(error) = self.renderer.render(self.session.state(), self.style) {
            self.render_error = Some(error);
        }
        self.metrics.record_frame(started.elapsed());
    }
}

impl ClientFrame {
    fn deliver(&mut self, snapshots: &mut Vec<WorldSnapshot>) {
        self.metrics.record_snapshots(snapshots.len());
        for snapshot in snapshots.drain(..) {
            self.session.receive(snapshot);
        }
    }

    fn take_render_error(&mut self) -> Option<PixelsError> {
        self.render_error.take()
    }
}

pub fn run_client(config: ClientConfig, mut feed: Box<dyn SnapshotFeed>) -> Result<(), AppError> {
    config.validate()?;

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.canvas_width as f64,
                config.canvas_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    info!(
        world_size = config.world_size,
        tile_size_px = config.tile_size_px,
        lerp_speed = config.lerp_speed,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        brush = ?config.tile_brush,
        "loop_config"
    );

    let frame = ClientFrame {
        session: ClientSession::new(config.world_size, config.lerp_speed),
        renderer,
        style: config.frame_style(),
        metrics: MetricsAccumulator::new(metrics_log_interval, Instant::now()),
        render_error: None,
    };
    let mut scheduler = FrameScheduler::new(frame, max_frame_delta);
    let mut input = InputCollector::default();
    let mut inbound = Vec::new();
    let mut last_present_instant = Instant::now();
    let mut last_title_inventory: Option<Rc<Inventory>> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    let renderer = &mut scheduler.target_mut().renderer;
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input.handle_key(event.physical_key, event.state);
                    for intent in input.drain_intents() {
                        feed.send_intent(intent);
                    }
                    if input.quit_requested() {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    let now = Instant::now();
                    scheduler.on_display_refresh(now);
                    last_present_instant = Instant::now();

                    let frame = scheduler.target_mut();
                    if let Some(error) = frame.take_render_error() {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                        return;
                    }

                    let inventory = &frame.session.state().inventory;
                    let title_stale = last_title_inventory
                        .as_ref()
                        .map_or(true, |shown| !Rc::ptr_eq(shown, inventory));
                    if frame.session.state().has_snapshot() && title_stale {
                        window.set_title(&window_title(&config.window_title, inventory));
                        last_title_inventory = Some(Rc::clone(inventory));
                    }

                    if let Some(snapshot) = frame.metrics.maybe_snapshot(now) {
                        let player = frame.session.state().player;
                        info!(
                            fps = snapshot.fps,
                            snapshots_per_second = snapshot.snapshots_per_second,
                            frame_time_ms = snapshot.frame_time_ms,
                            player_x = player.x,
                            player_y = player.y,
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                feed.poll_snapshots(&mut inbound);
                if !inbound.is_empty() {
                    scheduler.target_mut().deliver(&mut inbound);
                }
                window.request_redraw();
            }
            Event::LoopExiting => {
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn window_title(base: &str, inventory: &Inventory) -> String {
    if inventory.is_empty() {
        base.to_string()
    } else {
        format!("{base} | {}", inventory_summary(inventory))
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

// Window, surface and event loop are not constructible in unit tests; these
// cover the pure pieces around them.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ClientConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.world_size, 32);
        assert_eq!(config.tile_size_px, 32.0);
        assert_eq!(config.lerp_speed, 5.0);
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        let zero_world = ClientConfig {
            world_size: 0,
            ..ClientConfig::default()
        };
        assert_eq!(zero_world.validate(), Err(ConfigError::ZeroWorldSize));

        let tiny_tile = ClientConfig {
            tile_size_px: 0.5,
            ..ClientConfig::default()
        };
        assert!(matches!(
            tiny_tile.validate(),
            Err(ConfigError::InvalidTileSize(_))
        ));

        let huge_tile = ClientConfig {
            tile_size_px: 1e12,
            ..ClientConfig::default()
        };
        assert_eq!(huge_tile.validate(), Err(ConfigError::InvalidTileSize(1e12)));
        let canvas_sized_tile = ClientConfig {
            tile_size_px: 640.0,
            ..ClientConfig::default()
        };
        assert_eq!(canvas_sized_tile.validate(), Ok(()));

        let nan_speed = ClientConfig {
            lerp_speed: f32::NAN,
            ..ClientConfig::default()
        };
        assert!(matches!(
            nan_speed.validate(),
            Err(ConfigError::InvalidLerpSpeed(_))
        ));

        let flat_canvas = ClientConfig {
            canvas_height: 0,
            ..ClientConfig::default()
        };
        assert_eq!(
            flat_canvas.validate(),
            Err(ConfigError::EmptyCanvas {
                width: 640,
                height: 0
            })
        );
    }

    #[test]
    fn window_title_appends_inventory() {
        let mut inventory = Inventory::new();
        assert_eq!(window_title("Torus", &inventory), "Torus");

        inventory.insert("ore".to_string(), 4);
        assert_eq!(window_title("Torus", &inventory), "Torus | Ore: 4");
    }

    #[test]
    fn target_frame_duration_none_when_cap_off() {
        assert_eq!(target_frame_duration(None), None);
    }

    #[test]
    fn target_frame_duration_for_60hz_is_expected() {
        let duration = target_frame_duration(Some(60)).expect("duration");
        assert!((duration.as_secs_f64() - (1.0 / 60.0)).abs() < 0.000_001);
    }

    #[test]
    fn compute_cap_sleep_zero_when_over_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(20), target_frame_duration(Some(60)));
        assert_eq!(sleep, Duration::ZERO);
    }

    #[test]
    fn compute_cap_sleep_positive_when_under_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(5), target_frame_duration(Some(60)));
        assert!(sleep > Duration::ZERO);
    }

    #[test]
    fn normalize_render_fps_cap_disables_zero() {
        assert_eq!(normalize_render_fps_cap(Some(0)), None);
        assert_eq!(normalize_render_fps_cap(Some(60)), Some(60));
    }

    #[test]
    fn zero_durations_fall_back() {
        assert_eq!(
            normalize_non_zero_duration(Duration::ZERO, Duration::from_secs(1)),
            Duration::from_secs(1)
        );
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(5), Duration::from_secs(1)),
            Duration::from_millis(5)
        );
    }
}
