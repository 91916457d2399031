mod renderer;
mod style;
mod transform;

pub use renderer::{draw_world, FrameStyle, Renderer};
pub use style::{tile_style, TileBrush, TileStyle};
pub use transform::{wrap_tile_index, CanvasSize, Viewport, VisibleTile, DEFAULT_TILE_SIZE_PX};
