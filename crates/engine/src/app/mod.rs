mod feed;
mod frame;
mod input;
mod interpolation;
mod loop_runner;
mod metrics;
mod rendering;
mod session;
mod snapshot;

pub use feed::{SnapshotFeed, TcpSnapshotFeed};
pub use frame::{FrameClock, FrameScheduler, FrameTick};
pub use input::{Direction, InputAction, PlayerIntent};
pub use interpolation::{
    shortest_wrapped_delta, wrap_coordinate, Interpolator, RenderState, DEFAULT_LERP_SPEED,
};
pub use loop_runner::{
    run_client, AppError, ClientConfig, ConfigError, DEFAULT_SERVER_ADDR, DEFAULT_WORLD_SIZE,
};
pub use rendering::{
    draw_world, tile_style, wrap_tile_index, CanvasSize, FrameStyle, Renderer, TileBrush,
    TileStyle, Viewport, VisibleTile, DEFAULT_TILE_SIZE_PX,
};
pub use session::{inventory_summary, ClientSession};
pub use snapshot::{
    decode_snapshot, Inventory, ResourceKind, SnapshotDecodeError, SnapshotStore, TileGrid, Vec2,
    WorldSnapshot,
};
