use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    None,
    Stone,
    Ore,
    Energy,
    Wood,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::None,
        ResourceKind::Stone,
        ResourceKind::Ore,
        ResourceKind::Energy,
        ResourceKind::Wood,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(ResourceKind::None),
            "stone" => Some(ResourceKind::Stone),
            "ore" => Some(ResourceKind::Ore),
            "energy" => Some(ResourceKind::Energy),
            "wood" => Some(ResourceKind::Wood),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ResourceKind::None => "none",
            ResourceKind::Stone => "stone",
            ResourceKind::Ore => "ore",
            ResourceKind::Energy => "energy",
            ResourceKind::Wood => "wood",
        }
    }
}

/// Row-major grid of map cells as the server sent them.
///
/// Rows may be ragged; a cell is `None` when it was missing, null, not a
/// string, or named a kind this client does not know.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileGrid {
    rows: Vec<Vec<Option<ResourceKind>>>,
}

impl TileGrid {
    pub fn from_rows(rows: Vec<Vec<Option<ResourceKind>>>) -> Self {
        Self { rows }
    }

    pub fn tile_at(&self, col: u32, row: u32) -> Option<ResourceKind> {
        self.rows
            .get(row as usize)
            .and_then(|cells| cells.get(col as usize))
            .copied()
            .flatten()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn max_row_len(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_square_of(&self, size: u32) -> bool {
        self.rows.len() == size as usize && self.rows.iter().all(|row| row.len() == size as usize)
    }
}

pub type Inventory = BTreeMap<String, u64>;

#[derive(Debug, Clone, PartialEq)]
pub struct WorldSnapshot {
    pub player: Vec2,
    pub map: Rc<TileGrid>,
    pub inventory: Rc<Inventory>,
}

impl WorldSnapshot {
    pub fn new(player: Vec2, map: TileGrid, inventory: Inventory) -> Self {
        Self {
            player,
            map: Rc::new(map),
            inventory: Rc::new(inventory),
        }
    }
}

#[derive(Debug, Error)]
pub enum SnapshotDecodeError {
    #[error("snapshot is not valid json at {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct WirePlayer {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct WireSnapshot {
    player: WirePlayer,
    map: Vec<Value>,
    #[serde(default)]
    inventory: Value,
}

/// Decodes one snapshot line.
///
/// Only the outer shape is enforced: a `player` with numeric `x`/`y` and a
/// `map` array. Everything inside the map and inventory degrades to
/// "absent" instead of failing the snapshot.
pub fn decode_snapshot(raw: &str) -> Result<WorldSnapshot, SnapshotDecodeError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let wire: WireSnapshot =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            SnapshotDecodeError::Json {
                path: error.path().to_string(),
                source: error.into_inner(),
            }
        })?;

    let rows = wire.map.iter().map(decode_row).collect();
    Ok(WorldSnapshot::new(
        Vec2::new(wire.player.x as f32, wire.player.y as f32),
        TileGrid::from_rows(rows),
        decode_inventory(&wire.inventory),
    ))
}

fn decode_row(row: &Value) -> Vec<Option<ResourceKind>> {
    match row {
        Value::Array(cells) => cells
            .iter()
            .map(|cell| cell.as_str().and_then(ResourceKind::from_name))
            .collect(),
        _ => Vec::new(),
    }
}

// The reference server stores the inventory as a json string column and
// sends it through unchanged.
fn decode_inventory(value: &Value) -> Inventory {
    match value {
        Value::Object(entries) => entries
            .iter()
            .filter_map(|(name, count)| count.as_u64().map(|count| (name.clone(), count)))
            .collect(),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(inner @ Value::Object(_)) => decode_inventory(&inner),
            _ => Inventory::new(),
        },
        _ => Inventory::new(),
    }
}

/// Holds the single current snapshot. Latest wins; nothing is queued.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: Option<Rc<WorldSnapshot>>,
    version: u64,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, snapshot: WorldSnapshot) {
        self.current = Some(Rc::new(snapshot));
        self.version = self.version.wrapping_add(1);
    }

    pub fn latest(&self) -> Option<&Rc<WorldSnapshot>> {
        self.current.as_ref()
    }

    /// Bumped on every publish; zero until the first snapshot arrives.
    pub fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_reference_server_payload() {
        let raw = r#"{"player":{"x":3,"y":4},"inventory":"{\"stone\": 2, \"ore\": 0, \"energy\": 1}","map":[["stone","none"],["ore","energy"]]}"#;
        let snapshot = decode_snapshot(raw).expect("decode");

        assert_eq!(snapshot.player, Vec2::new(3.0, 4.0));
        assert_eq!(snapshot.map.tile_at(0, 0), Some(ResourceKind::Stone));
        assert_eq!(snapshot.map.tile_at(1, 0), Some(ResourceKind::None));
        assert_eq!(snapshot.map.tile_at(1, 1), Some(ResourceKind::Energy));
        assert_eq!(snapshot.inventory.get("stone"), Some(&2));
        assert_eq!(snapshot.inventory.get("energy"), Some(&1));
    }

    #[test]
    fn inventory_object_form_is_accepted() {
        let raw = r#"{"player":{"x":0.5,"y":1.5},"map":[],"inventory":{"wood":7,"bad":"x"}}"#;
        let snapshot = decode_snapshot(raw).expect("decode");

        assert_eq!(snapshot.inventory.get("wood"), Some(&7));
        assert!(!snapshot.inventory.contains_key("bad"));
    }

    #[test]
    fn missing_or_garbage_inventory_is_empty() {
        let missing = decode_snapshot(r#"{"player":{"x":0,"y":0},"map":[]}"#).expect("decode");
        let garbage =
            decode_snapshot(r#"{"player":{"x":0,"y":0},"map":[],"inventory":"not json"}"#)
                .expect("decode");

        assert!(missing.inventory.is_empty());
        assert!(garbage.inventory.is_empty());
    }

    #[test]
    fn unknown_kinds_and_ragged_rows_decode_as_absent() {
        let raw = r#"{"player":{"x":0,"y":0},"map":[["stone","unknown_kind",null,4],["wood"],"row"],"inventory":{}}"#;
        let snapshot = decode_snapshot(raw).expect("decode");
        let map = &snapshot.map;

        assert_eq!(map.tile_at(0, 0), Some(ResourceKind::Stone));
        assert_eq!(map.tile_at(1, 0), None);
        assert_eq!(map.tile_at(2, 0), None);
        assert_eq!(map.tile_at(3, 0), None);
        assert_eq!(map.tile_at(0, 1), Some(ResourceKind::Wood));
        assert_eq!(map.tile_at(1, 1), None);
        assert_eq!(map.tile_at(0, 2), None);
        assert_eq!(map.tile_at(0, 99), None);
        assert_eq!(map.row_count(), 3);
        assert_eq!(map.max_row_len(), 4);
        assert!(!map.is_square_of(4));
    }

    #[test]
    fn structural_errors_report_path() {
        let error = decode_snapshot(r#"{"player":{"x":"left","y":0},"map":[]}"#)
            .expect_err("player.x must be numeric");
        let SnapshotDecodeError::Json { path, .. } = error;
        assert_eq!(path, "player.x");

        assert!(decode_snapshot(r#"{"map":[]}"#).is_err());
        assert!(decode_snapshot("{").is_err());
    }

    #[test]
    fn resource_names_round_trip_through_lookup() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ResourceKind::from_name("Stone"), None);
    }

    #[test]
    fn store_replaces_wholesale_and_versions() {
        let mut store = SnapshotStore::new();
        assert!(store.latest().is_none());
        assert_eq!(store.version(), 0);

        store.publish(WorldSnapshot::new(
            Vec2::new(1.0, 1.0),
            TileGrid::default(),
            Inventory::new(),
        ));
        let first = Rc::clone(store.latest().expect("first"));

        store.publish(WorldSnapshot::new(
            Vec2::new(2.0, 3.0),
            TileGrid::default(),
            Inventory::new(),
        ));
        let second = store.latest().expect("second");

        assert_eq!(store.version(), 2);
        assert_eq!(second.player, Vec2::new(2.0, 3.0));
        assert_eq!(first.player, Vec2::new(1.0, 1.0));
    }
}
