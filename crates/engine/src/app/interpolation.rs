use std::rc::Rc;

use tracing::{debug, warn};

use super::snapshot::{Inventory, SnapshotStore, TileGrid, Vec2, WorldSnapshot};

pub const DEFAULT_LERP_SPEED: f32 = 5.0;

/// Continuously valued view of the world used for drawing.
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pub player: Vec2,
    pub map: Rc<TileGrid>,
    pub inventory: Rc<Inventory>,
    applied_version: u64,
    seeded: bool,
}

impl RenderState {
    pub fn has_snapshot(&self) -> bool {
        self.seeded
    }

    pub fn applied_version(&self) -> u64 {
        self.applied_version
    }

    fn adopt(&mut self, snapshot: &WorldSnapshot, version: u64) {
        self.map = Rc::clone(&snapshot.map);
        self.inventory = Rc::clone(&snapshot.inventory);
        self.applied_version = version;
    }
}

/// Signed offset from `current` to `target` along the shorter way around a
/// ring of circumference `world_size`.
pub fn shortest_wrapped_delta(current: f32, target: f32, world_size: f32) -> f32 {
    let delta = target - current;
    let half = world_size * 0.5;
    if delta.abs() > half {
        if delta > 0.0 {
            delta - world_size
        } else {
            delta + world_size
        }
    } else {
        delta
    }
}

/// Maps any finite coordinate into `[0, world_size)`.
pub fn wrap_coordinate(value: f32, world_size: f32) -> f32 {
    let wrapped = ((value % world_size) + world_size) % world_size;
    // Tiny negative inputs round up to exactly `world_size`.
    if wrapped >= world_size {
        0.0
    } else {
        wrapped
    }
}

#[derive(Debug, Clone)]
pub struct Interpolator {
    world_size: u32,
    lerp_speed: f32,
    warned_map_size_mismatch: bool,
}

impl Interpolator {
    pub fn new(world_size: u32, lerp_speed: f32) -> Self {
        Self {
            world_size: world_size.max(1),
            lerp_speed,
            warned_map_size_mismatch: false,
        }
    }

    pub fn world_size(&self) -> u32 {
        self.world_size
    }

    /// Moves `state` one frame toward the store's latest snapshot.
    pub fn advance(&mut self, state: &mut RenderState, store: &SnapshotStore, dt_seconds: f32) {
        if !(dt_seconds.is_finite() && dt_seconds > 0.0) {
            return;
        }
        let Some(snapshot) = store.latest() else {
            return;
        };

        let world = self.world_size as f32;
        if state.applied_version != store.version() {
            self.check_map_size(&snapshot.map);
            debug!(
                version = store.version(),
                target_x = snapshot.player.x,
                target_y = snapshot.player.y,
                "snapshot_applied"
            );
        }

        if !state.seeded {
            if snapshot.player.is_finite() {
                state.player = Vec2::new(
                    wrap_coordinate(snapshot.player.x, world),
                    wrap_coordinate(snapshot.player.y, world),
                );
                state.seeded = true;
            }
        } else if snapshot.player.is_finite() {
            let factor = (self.lerp_speed * dt_seconds).clamp(0.0, 1.0);
            state.player = Vec2::new(
                step_axis(state.player.x, snapshot.player.x, factor, world),
                step_axis(state.player.y, snapshot.player.y, factor, world),
            );
        }

        state.adopt(snapshot, store.version());
    }

    fn check_map_size(&mut self, map: &TileGrid) {
        if self.warned_map_size_mismatch || map.is_square_of(self.world_size) {
            return;
        }
        self.warned_map_size_mismatch = true;
        warn!(
            world_size = self.world_size,
            rows = map.row_count(),
            widest_row = map.max_row_len(),
            "snapshot_map_size_mismatch"
        );
    }
}

fn step_axis(current: f32, target: f32, factor: f32, world_size: f32) -> f32 {
    let target = wrap_coordinate(target, world_size);
    let delta = shortest_wrapped_delta(current, target, world_size);
    wrap_coordinate(current + delta * factor, world_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD: u32 = 32;
    const EPSILON: f32 = 1e-3;

    fn snapshot_at(x: f32, y: f32) -> WorldSnapshot {
        WorldSnapshot::new(Vec2::new(x, y), TileGrid::default(), Inventory::new())
    }

    fn seeded_state(x: f32, y: f32) -> RenderState {
        RenderState {
            player: Vec2::new(x, y),
            seeded: true,
            ..RenderState::default()
        }
    }

    fn ring_distance(a: f32, b: f32, world: f32) -> f32 {
        let d = (a - b).abs() % world;
        d.min(world - d)
    }

    #[test]
    fn seam_crossing_takes_short_way() {
        assert!((shortest_wrapped_delta(31.0, 1.0, 32.0) - 2.0).abs() < EPSILON);
        assert!((shortest_wrapped_delta(1.0, 31.0, 32.0) + 2.0).abs() < EPSILON);
        assert!((shortest_wrapped_delta(4.0, 6.5, 32.0) - 2.5).abs() < EPSILON);
    }

    #[test]
    fn wrapped_delta_is_short_and_lands_on_target() {
        let world = WORLD as f32;
        for ci in 0..64 {
            for ti in 0..64 {
                let current = ci as f32 * 0.5;
                let target = ti as f32 * 0.5;
                let delta = shortest_wrapped_delta(current, target, world);
                assert!(delta.abs() <= world * 0.5 + EPSILON, "{current} -> {target}");
                let landed = wrap_coordinate(current + delta, world);
                assert!(
                    ring_distance(landed, target, world) < EPSILON,
                    "{current} -> {target} landed at {landed}"
                );
            }
        }
    }

    #[test]
    fn wrap_coordinate_stays_in_range() {
        let world = WORLD as f32;
        for value in [-64.5, -32.0, -0.25, -1e-9, 0.0, 31.999, 32.0, 95.5] {
            let wrapped = wrap_coordinate(value, world);
            assert!((0.0..world).contains(&wrapped), "{value} -> {wrapped}");
        }
        assert!((wrap_coordinate(-0.25, world) - 31.75).abs() < EPSILON);
        assert!((wrap_coordinate(33.5, world) - 1.5).abs() < EPSILON);
    }

    #[test]
    fn no_snapshot_leaves_default_state() {
        let mut interpolator = Interpolator::new(WORLD, DEFAULT_LERP_SPEED);
        let store = SnapshotStore::new();
        let mut state = RenderState::default();

        interpolator.advance(&mut state, &store, 0.016);

        assert!(!state.has_snapshot());
        assert_eq!(state.player, Vec2::default());
        assert_eq!(state.applied_version(), 0);
    }

    #[test]
    fn first_snapshot_seeds_position() {
        let mut interpolator = Interpolator::new(WORLD, DEFAULT_LERP_SPEED);
        let mut store = SnapshotStore::new();
        store.publish(snapshot_at(7.0, 9.0));
        let mut state = RenderState::default();

        interpolator.advance(&mut state, &store, 0.016);

        assert!(state.has_snapshot());
        assert_eq!(state.player, Vec2::new(7.0, 9.0));
        assert_eq!(state.applied_version(), 1);
    }

    #[test]
    fn seam_scenario_moves_forward_and_converges() {
        let mut interpolator = Interpolator::new(WORLD, 5.0);
        let mut store = SnapshotStore::new();
        store.publish(snapshot_at(1.0, 0.0));
        let mut state = seeded_state(31.0, 0.0);

        interpolator.advance(&mut state, &store, 0.016);
        // 2.0 * 5.0 * 0.016 forward across the seam, not 30 tiles backward.
        assert!((state.player.x - 31.16).abs() < EPSILON, "{}", state.player.x);

        for _ in 0..300 {
            interpolator.advance(&mut state, &store, 0.016);
        }
        assert!(ring_distance(state.player.x, 1.0, 32.0) < EPSILON);
        assert!(state.player.y.abs() < EPSILON);
    }

    #[test]
    fn converged_state_never_diverges() {
        let mut interpolator = Interpolator::new(WORLD, DEFAULT_LERP_SPEED);
        let mut store = SnapshotStore::new();
        store.publish(snapshot_at(20.0, 3.0));
        let mut state = seeded_state(2.0, 30.0);

        let mut converged_at = None;
        for step in 0..2000 {
            interpolator.advance(&mut state, &store, 1.0 / 60.0);
            let distance = ring_distance(state.player.x, 20.0, 32.0)
                + ring_distance(state.player.y, 3.0, 32.0);
            match converged_at {
                None if distance < EPSILON => converged_at = Some(step),
                Some(_) => assert!(distance < EPSILON, "diverged at step {step}"),
                None => {}
            }
        }
        assert!(converged_at.is_some());
    }

    #[test]
    fn zero_and_negative_dt_are_noops() {
        let mut interpolator = Interpolator::new(WORLD, DEFAULT_LERP_SPEED);
        let mut store = SnapshotStore::new();
        store.publish(snapshot_at(10.0, 10.0));
        let mut state = seeded_state(4.0, 4.0);

        interpolator.advance(&mut state, &store, 0.0);
        interpolator.advance(&mut state, &store, 0.0);
        assert_eq!(state.player, Vec2::new(4.0, 4.0));
        assert_eq!(state.applied_version(), 0);

        interpolator.advance(&mut state, &store, -0.5);
        interpolator.advance(&mut state, &store, f32::NAN);
        interpolator.advance(&mut state, &store, f32::INFINITY);
        assert_eq!(state.player, Vec2::new(4.0, 4.0));
    }

    #[test]
    fn huge_dt_does_not_overshoot() {
        let mut interpolator = Interpolator::new(WORLD, DEFAULT_LERP_SPEED);
        let mut store = SnapshotStore::new();
        store.publish(snapshot_at(12.0, 0.0));
        let mut state = seeded_state(10.0, 0.0);

        interpolator.advance(&mut state, &store, 30.0);

        assert!((state.player.x - 12.0).abs() < EPSILON);
    }

    #[test]
    fn non_finite_target_holds_position_but_adopts_map() {
        let mut interpolator = Interpolator::new(WORLD, DEFAULT_LERP_SPEED);
        let mut store = SnapshotStore::new();
        let mut inventory = Inventory::new();
        inventory.insert("ore".to_string(), 3);
        store.publish(WorldSnapshot::new(
            Vec2::new(f32::INFINITY, 2.0),
            TileGrid::default(),
            inventory,
        ));
        let mut state = seeded_state(5.0, 5.0);

        interpolator.advance(&mut state, &store, 0.016);

        assert_eq!(state.player, Vec2::new(5.0, 5.0));
        assert_eq!(state.inventory.get("ore"), Some(&3));
    }

    #[test]
    fn map_and_inventory_share_snapshot_allocation() {
        let mut interpolator = Interpolator::new(WORLD, DEFAULT_LERP_SPEED);
        let mut store = SnapshotStore::new();
        store.publish(snapshot_at(1.0, 1.0));
        let mut state = RenderState::default();

        interpolator.advance(&mut state, &store, 0.016);

        let latest = store.latest().expect("snapshot");
        assert!(Rc::ptr_eq(&state.map, &latest.map));
        assert!(Rc::ptr_eq(&state.inventory, &latest.inventory));
    }

    #[test]
    fn out_of_range_target_is_wrapped_before_stepping() {
        let mut interpolator = Interpolator::new(WORLD, DEFAULT_LERP_SPEED);
        let mut store = SnapshotStore::new();
        store.publish(snapshot_at(33.0, -1.0));
        let mut state = seeded_state(1.0, 31.0);

        interpolator.advance(&mut state, &store, 0.1);

        assert!((state.player.x - 1.0).abs() < EPSILON);
        assert!((state.player.y - 31.0).abs() < EPSILON);
    }
}
