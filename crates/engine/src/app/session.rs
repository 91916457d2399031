use super::interpolation::{Interpolator, RenderState};
use super::rendering::tile_style;
use super::snapshot::{Inventory, ResourceKind, SnapshotStore, WorldSnapshot};

/// The store and the render state it feeds, with the single writer for each.
#[derive(Debug)]
pub struct ClientSession {
    store: SnapshotStore,
    state: RenderState,
    interpolator: Interpolator,
}

impl ClientSession {
    pub fn new(world_size: u32, lerp_speed: f32) -> Self {
        Self {
            store: SnapshotStore::new(),
            state: RenderState::default(),
            interpolator: Interpolator::new(world_size, lerp_speed),
        }
    }

    /// Delivery callback: the newest snapshot replaces whatever was current.
    pub fn receive(&mut self, snapshot: WorldSnapshot) {
        self.store.publish(snapshot);
    }

    pub fn advance(&mut self, dt_seconds: f32) {
        self.interpolator
            .advance(&mut self.state, &self.store, dt_seconds);
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn world_size(&self) -> u32 {
        self.interpolator.world_size()
    }
}

/// Inventory counts for the window title, e.g. `Energy: 1  Stone: 2`.
/// Known resource names use their tile label; anything else is shown as sent.
pub fn inventory_summary(inventory: &Inventory) -> String {
    inventory
        .iter()
        .map(|(name, count)| {
            let label = ResourceKind::from_name(name)
                .map(|kind| tile_style(kind).label)
                .unwrap_or(name.as_str());
            format!("{label}: {count}")
        })
        .collect::<Vec<_>>()
        .join("  ")
}
