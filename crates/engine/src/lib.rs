pub mod app;

pub use app::{
    decode_snapshot, draw_world, inventory_summary, run_client, shortest_wrapped_delta,
    tile_style, wrap_coordinate, wrap_tile_index, AppError, CanvasSize, ClientConfig,
    ClientSession, ConfigError, Direction, FrameClock, FrameScheduler, FrameStyle, FrameTick,
    InputAction, Interpolator, Inventory, PlayerIntent, RenderState, Renderer,
    ResourceKind, SnapshotDecodeError, SnapshotFeed, SnapshotStore, TcpSnapshotFeed, TileBrush,
    TileGrid, TileStyle, Vec2, Viewport, VisibleTile, WorldSnapshot, DEFAULT_LERP_SPEED,
    DEFAULT_SERVER_ADDR, DEFAULT_TILE_SIZE_PX, DEFAULT_WORLD_SIZE,
};
