use crate::app::Vec2;

pub const DEFAULT_TILE_SIZE_PX: f32 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn center_px(self) -> Vec2 {
        Vec2::new(self.width as f32 * 0.5, self.height as f32 * 0.5)
    }
}

/// One cell of the visible window: where it samples the map and where it
/// lands on screen (top-left corner, pixels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleTile {
    pub map_col: u32,
    pub map_row: u32,
    pub screen_px: Vec2,
}

/// Camera placement and tile window for a single frame.
///
/// Screen positions are linear in the unwrapped window index while map
/// lookups wrap, so the finite grid repeats seamlessly in every direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub camera_offset_px: Vec2,
    pub start_col: i64,
    pub start_row: i64,
    pub visible_cols: u32,
    pub visible_rows: u32,
    pub tile_size_px: f32,
    pub world_size: u32,
}

impl Viewport {
    pub fn compute(player: Vec2, canvas: CanvasSize, tile_size_px: f32, world_size: u32) -> Self {
        let tile = safe_tile_size(tile_size_px);
        let center = canvas.center_px();
        let camera_offset_px = Vec2::new(center.x - player.x * tile, center.y - player.y * tile);
        let (visible_cols, visible_rows) = if world_size == 0 {
            (0, 0)
        } else {
            (
                visible_tile_count(canvas.width, tile),
                visible_tile_count(canvas.height, tile),
            )
        };

        Self {
            camera_offset_px,
            start_col: start_tile_index(camera_offset_px.x, tile),
            start_row: start_tile_index(camera_offset_px.y, tile),
            visible_cols,
            visible_rows,
            tile_size_px: tile,
            world_size,
        }
    }

    pub fn tile_to_screen_px(&self, col: i64, row: i64) -> Vec2 {
        Vec2::new(
            col as f32 * self.tile_size_px + self.camera_offset_px.x,
            row as f32 * self.tile_size_px + self.camera_offset_px.y,
        )
    }

    pub fn world_to_screen_px(&self, world: Vec2) -> Vec2 {
        Vec2::new(
            world.x * self.tile_size_px + self.camera_offset_px.x,
            world.y * self.tile_size_px + self.camera_offset_px.y,
        )
    }

    pub fn tile_count(&self) -> usize {
        self.visible_cols as usize * self.visible_rows as usize
    }

    pub fn tiles(&self) -> impl Iterator<Item = VisibleTile> + '_ {
        (0..self.visible_rows as i64).flat_map(move |row_offset| {
            (0..self.visible_cols as i64).map(move |col_offset| {
                let col = self.start_col + col_offset;
                let row = self.start_row + row_offset;
                VisibleTile {
                    map_col: wrap_tile_index(col, self.world_size),
                    map_row: wrap_tile_index(row, self.world_size),
                    screen_px: self.tile_to_screen_px(col, row),
                }
            })
        })
    }
}

pub fn wrap_tile_index(index: i64, world_size: u32) -> u32 {
    if world_size == 0 {
        return 0;
    }
    index.rem_euclid(world_size as i64) as u32
}

fn start_tile_index(camera_offset_px: f32, tile_size_px: f32) -> i64 {
    ((-camera_offset_px / tile_size_px).floor() as i64).saturating_sub(1)
}

fn visible_tile_count(canvas_px: u32, tile_size_px: f32) -> u32 {
    ((canvas_px as f32 / tile_size_px).ceil() as u32).saturating_add(2)
}

fn safe_tile_size(tile_size_px: f32) -> f32 {
    if tile_size_px.is_finite() && tile_size_px >= 1.0 {
        tile_size_px
    } else {
        DEFAULT_TILE_SIZE_PX
    }
}
