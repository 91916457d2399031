use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::{RenderState, TileGrid};

use super::style::{darken, tile_style, TileBrush};
use super::transform::{CanvasSize, Viewport};

const CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];
const PLAYER_COLOR: [u8; 4] = [64, 112, 255, 255];
const PLAYER_OUTLINE_COLOR: [u8; 4] = [220, 230, 255, 255];
const PLAYER_INSET_FRACTION: f32 = 0.15;

/// Everything that stays fixed while drawing one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameStyle {
    pub tile_size_px: f32,
    pub world_size: u32,
    pub brush: TileBrush,
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    canvas: CanvasSize,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            canvas: CanvasSize {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.canvas = CanvasSize { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub fn render(&mut self, state: &RenderState, style: FrameStyle) -> Result<(), Error> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Ok(());
        }
        draw_world(self.pixels.frame_mut(), self.canvas, state, style);
        self.pixels.render()
    }
}

/// Clears `frame` and redraws the whole visible world around the player.
pub fn draw_world(frame: &mut [u8], canvas: CanvasSize, state: &RenderState, style: FrameStyle) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&CLEAR_COLOR);
    }
    if canvas.width == 0 || canvas.height == 0 {
        return;
    }

    let viewport = Viewport::compute(state.player, canvas, style.tile_size_px, style.world_size);
    draw_tiles(frame, canvas, &viewport, &state.map, style.brush);
    draw_player(frame, canvas, &viewport, state);
}

fn draw_tiles(
    frame: &mut [u8],
    canvas: CanvasSize,
    viewport: &Viewport,
    map: &TileGrid,
    brush: TileBrush,
) {
    let tile = viewport.tile_size_px;
    for visible in viewport.tiles() {
        let Some(kind) = map.tile_at(visible.map_col, visible.map_row) else {
            continue;
        };
        let color = tile_style(kind).color;
        let rect = ScreenRectPx::from_corner(visible.screen_px.x, visible.screen_px.y, tile, tile);
        match brush {
            TileBrush::Flat => fill_rect_clipped(frame, canvas, rect, color),
            TileBrush::Bordered => {
                fill_rect_clipped(frame, canvas, rect, darken(color));
                fill_rect_clipped(frame, canvas, rect.inset(1), color);
            }
        }
    }
}

fn draw_player(frame: &mut [u8], canvas: CanvasSize, viewport: &Viewport, state: &RenderState) {
    let tile = viewport.tile_size_px;
    let corner = viewport.world_to_screen_px(state.player);
    let inset = tile * PLAYER_INSET_FRACTION;
    let rect = ScreenRectPx::from_corner(
        corner.x + inset,
        corner.y + inset,
        tile - 2.0 * inset,
        tile - 2.0 * inset,
    );
    fill_rect_clipped(frame, canvas, rect, PLAYER_OUTLINE_COLOR);
    fill_rect_clipped(frame, canvas, rect.inset(1), PLAYER_COLOR);
}

/// Half-open pixel rectangle `[left, right) x [top, bottom)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenRectPx {
    left: i32,
    right: i32,
    top: i32,
    bottom: i32,
}

impl ScreenRectPx {
    // Rounding both edges (not the size) keeps neighbouring tiles gap-free.
    fn from_corner(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            left: round_px(x),
            right: round_px(x + width),
            top: round_px(y),
            bottom: round_px(y + height),
        }
    }

    fn inset(self, px: i32) -> Self {
        Self {
            left: self.left.saturating_add(px),
            right: self.right.saturating_sub(px),
            top: self.top.saturating_add(px),
            bottom: self.bottom.saturating_sub(px),
        }
    }
}

fn round_px(value: f32) -> i32 {
    if value.is_finite() {
        value.round().clamp(i32::MIN as f32, i32::MAX as f32) as i32
    } else {
        0
    }
}

fn fill_rect_clipped(frame: &mut [u8], canvas: CanvasSize, rect: ScreenRectPx, color: [u8; 4]) {
    let left = rect.left.max(0);
    let top = rect.top.max(0);
    let right = rect.right.min(canvas.width as i32);
    let bottom = rect.bottom.min(canvas.height as i32);
    if left >= right || top >= bottom {
        return;
    }
    for y in top..bottom {
        for x in left..right {
            write_pixel_rgba_clipped(frame, canvas.width as usize, x, y, color);
        }
    }
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}
