use std::str::FromStr;

use torus_engine::{ClientConfig, SnapshotFeed, TcpSnapshotFeed, TileBrush};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const SERVER_ADDR_ENV_VAR: &str = "TORUS_SERVER_ADDR";
const WORLD_SIZE_ENV_VAR: &str = "TORUS_WORLD_SIZE";
const TILE_SIZE_ENV_VAR: &str = "TORUS_TILE_SIZE_PX";
const LERP_SPEED_ENV_VAR: &str = "TORUS_LERP_SPEED";
const TILE_BRUSH_ENV_VAR: &str = "TORUS_TILE_BRUSH";
const MAX_RENDER_FPS_ENV_VAR: &str = "TORUS_MAX_RENDER_FPS";

pub(crate) struct AppWiring {
    pub(crate) config: ClientConfig,
    pub(crate) feed: Box<dyn SnapshotFeed>,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Torus Client Startup ===");

    let config = config_from_lookup(|name| std::env::var(name).ok());
    info!(server_addr = %config.server_addr, "connecting");
    let feed = TcpSnapshotFeed::connect(&config.server_addr, config.connect_timeout);

    AppWiring {
        config,
        feed: Box::new(feed),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn config_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClientConfig {
    let defaults = ClientConfig::default();
    let server_addr = lookup(SERVER_ADDR_ENV_VAR)
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .unwrap_or(defaults.server_addr.clone());
    let tile_brush = match lookup(TILE_BRUSH_ENV_VAR) {
        Some(raw) => TileBrush::from_name(&raw).unwrap_or_else(|| {
            warn!(
                env_var = TILE_BRUSH_ENV_VAR,
                value = raw.as_str(),
                "invalid tile brush; falling back to default"
            );
            defaults.tile_brush
        }),
        None => defaults.tile_brush,
    };
    let max_render_fps = match lookup(MAX_RENDER_FPS_ENV_VAR) {
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(fps) => Some(fps),
            Err(_) => {
                warn!(
                    env_var = MAX_RENDER_FPS_ENV_VAR,
                    value = raw.as_str(),
                    "invalid env var value; falling back to default"
                );
                defaults.max_render_fps
            }
        },
        None => defaults.max_render_fps,
    };

    ClientConfig {
        world_size: parse_or_default(
            WORLD_SIZE_ENV_VAR,
            lookup(WORLD_SIZE_ENV_VAR).as_deref(),
            defaults.world_size,
        ),
        tile_size_px: parse_or_default(
            TILE_SIZE_ENV_VAR,
            lookup(TILE_SIZE_ENV_VAR).as_deref(),
            defaults.tile_size_px,
        ),
        lerp_speed: parse_or_default(
            LERP_SPEED_ENV_VAR,
            lookup(LERP_SPEED_ENV_VAR).as_deref(),
            defaults.lerp_speed,
        ),
        server_addr,
        tile_brush,
        max_render_fps,
        ..defaults
    }
}

fn parse_or_default<T>(env_var: &'static str, raw: Option<&str>, default: T) -> T
where
    T: FromStr + Copy,
{
    let Some(value) = raw else {
        return default;
    };
    match value.trim().parse::<T>() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(
                env_var,
                value, "invalid env var value; falling back to default"
            );
            default
        }
    }
}
