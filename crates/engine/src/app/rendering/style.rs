use crate::app::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileStyle {
    pub color: [u8; 4],
    pub label: &'static str,
}

const GROUND: TileStyle = TileStyle {
    color: [46, 52, 44, 255],
    label: "Ground",
};
const STONE: TileStyle = TileStyle {
    color: [128, 128, 128, 255],
    label: "Stone",
};
const ORE: TileStyle = TileStyle {
    color: [139, 84, 42, 255],
    label: "Ore",
};
const ENERGY: TileStyle = TileStyle {
    color: [236, 206, 48, 255],
    label: "Energy",
};
const WOOD: TileStyle = TileStyle {
    color: [64, 122, 52, 255],
    label: "Wood",
};

pub const fn tile_style(kind: ResourceKind) -> TileStyle {
    match kind {
        ResourceKind::None => GROUND,
        ResourceKind::Stone => STONE,
        ResourceKind::Ore => ORE,
        ResourceKind::Energy => ENERGY,
        ResourceKind::Wood => WOOD,
    }
}

/// How a single tile cell is filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TileBrush {
    #[default]
    Flat,
    Bordered,
}

impl TileBrush {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "flat" => Some(TileBrush::Flat),
            "bordered" => Some(TileBrush::Bordered),
            _ => None,
        }
    }
}

pub(crate) fn darken(color: [u8; 4]) -> [u8; 4] {
    [
        (color[0] as u16 * 3 / 4) as u8,
        (color[1] as u16 * 3 / 4) as u8,
        (color[2] as u16 * 3 / 4) as u8,
        color[3],
    ]
}
