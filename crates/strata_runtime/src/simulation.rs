//! Generated world, wandering entities and the per-tick loop.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;
use strata_core::collision::{reset_sweep_stats, sweep_stats};
use strata_core::glam::{DVec3, IVec3};
use strata_core::world::flat::{BlockKind, FlatEntity, FlatWorld};
use strata_core::{
    area_contains_block, block_collisions, box_collides_with_blocks, box_collides_with_entities,
    probe_below_feet, CellPos, Collider, CollisionView, EntityId, EntityKind, EntityTracker,
    ListenerHandle, NearbyEntityListener, ShapeContext,
};
use strata_metrics::{PhaseProfiler, TickTimer};
use strata_services::Settings;

const GRAVITY: f64 = 0.08;
const WALK_SPEED: f64 = 0.25;
const TURN_CHANCE: f64 = 0.05;
const TELEPORT_CHANCE: f64 = 0.002;
/// How far below the world an entity may fall before it is rescued.
const VOID_DEPTH: f64 = 64.0;

/// Range listener that only keeps counts.
#[derive(Debug, Default)]
pub struct Watcher {
    range: u32,
    exact: bool,
    in_range: i64,
    entered: u64,
    left: u64,
    moved: u64,
    populations: u64,
}

impl Watcher {
    fn new(range: u32, exact: bool) -> Self {
        Self {
            range,
            exact,
            ..Self::default()
        }
    }
}

impl NearbyEntityListener for Watcher {
    fn cell_range(&self) -> u32 {
        self.range
    }

    fn on_entity_entered_range(&mut self, _entity: EntityId) {
        self.in_range += 1;
        self.entered += 1;
    }

    fn on_entity_left_range(&mut self, _entity: EntityId) {
        self.in_range -= 1;
        self.left += 1;
    }

    fn on_initial_population_complete(&mut self) {
        self.populations += 1;
    }

    fn wants_exact_movement(&self) -> bool {
        self.exact
    }

    fn on_entity_moved_in_range(&mut self, _entity: EntityId) {
        self.moved += 1;
    }
}

#[derive(Debug, Clone, Copy)]
struct Walker {
    id: EntityId,
    heading: DVec3,
}

pub struct Simulation {
    world: FlatWorld,
    tracker: EntityTracker,
    walkers: Vec<Walker>,
    watchers: Vec<Rc<RefCell<Watcher>>>,
    rng: StdRng,
    spawn_radius: f64,
    teleports: u64,
    wet_ticks: u64,
    timer: TickTimer,
    profiler: PhaseProfiler,
}

impl Simulation {
    pub fn new(settings: &Settings) -> Result<Self> {
        let bounds = settings.world.vertical_bounds();
        let mut world = FlatWorld::new(bounds);
        world.set_border(settings.world.world_border());

        let mut rng = StdRng::seed_from_u64(settings.harness.seed);
        let spawn_radius = settings.harness.spawn_radius.max(1.0);
        build_terrain(&mut world, &mut rng, spawn_radius as i32);

        let mut simulation = Self {
            world,
            tracker: EntityTracker::new(bounds),
            walkers: Vec::new(),
            watchers: Vec::new(),
            rng,
            spawn_radius,
            teleports: 0,
            wet_ticks: 0,
            timer: TickTimer::new(20),
            profiler: PhaseProfiler::new(),
        };
        let listener_fraction = settings.harness.listener_fraction.clamp(0.0, 1.0);
        for _ in 0..settings.harness.entities {
            simulation.spawn(settings.tracker.listener_range, listener_fraction)?;
        }
        Ok(simulation)
    }

    pub fn entity_count(&self) -> usize {
        self.walkers.len()
    }

    pub fn listener_count(&self) -> usize {
        self.watchers.len()
    }

    pub fn run(&mut self, ticks: u32) -> Result<()> {
        reset_sweep_stats();
        for tick in 0..ticks {
            self.timer.begin();
            self.tick().with_context(|| format!("tick {tick}"))?;
            self.timer.end();
        }
        Ok(())
    }

    pub fn report(&self) {
        let stats = self.tracker.stats();
        tracing::info!(
            tracked = stats.tracked_entities,
            cells = stats.cells,
            listeners = stats.listeners,
            entered = stats.entered_notifications,
            left = stats.left_notifications,
            moved = stats.moved_notifications,
            "tracker"
        );

        let sweep = sweep_stats();
        tracing::info!(
            sections = sweep.sections,
            shape_tests = sweep.shape_tests,
            hits = sweep.hits,
            "block sweeps"
        );

        let in_range: i64 = self.watchers.iter().map(|w| w.borrow().in_range).sum();
        let (mut heard_enter, mut heard_leave) = (0u64, 0u64);
        let (mut exact_moves, mut populations) = (0u64, 0u64);
        for watcher in &self.watchers {
            let watcher = watcher.borrow();
            heard_enter += watcher.entered;
            heard_leave += watcher.left;
            exact_moves += watcher.moved;
            populations += watcher.populations;
        }
        tracing::info!(
            teleports = self.teleports,
            wet_ticks = self.wet_ticks,
            in_range,
            heard_enter,
            heard_leave,
            exact_moves,
            populations,
            "simulation"
        );

        let (min_ms, max_ms) = self.timer.tick_time_range_ms();
        tracing::info!(
            ticks = self.timer.ticks(),
            avg_ms = self.timer.tick_time_ms(),
            min_ms,
            max_ms,
            "timing"
        );
        for (phase, total) in self.profiler.report() {
            tracing::info!(phase, ms = total.as_secs_f64() * 1000.0, "phase total");
        }
    }

    fn spawn(&mut self, listener_range: u32, listener_fraction: f64) -> Result<()> {
        let position = self.random_surface_position();
        let (kind, size) = if self.rng.gen_bool(0.05) {
            (EntityKind::BOAT, DVec3::new(1.375, 0.5625, 1.375))
        } else {
            (EntityKind::new("zombie"), DVec3::new(0.6, 1.95, 0.6))
        };

        let mut entity = FlatEntity::new(kind, position, size);
        if listener_range > 0 && self.rng.gen_bool(listener_fraction) {
            let exact = self.rng.gen_bool(1.0 / 3.0);
            let watcher = Rc::new(RefCell::new(Watcher::new(listener_range, exact)));
            entity = entity.with_listener(ListenerHandle::new(watcher.clone()));
            self.watchers.push(watcher);
        }

        let id = self.world.spawn(entity);
        if let Some(entity) = self.world.entity(id) {
            self.tracker.on_entity_added(CellPos::from_position(position), entity)?;
        }
        let heading = random_heading(&mut self.rng);
        self.walkers.push(Walker { id, heading });
        Ok(())
    }

    fn tick(&mut self) -> Result<()> {
        for index in 0..self.walkers.len() {
            if self.rng.gen_bool(TURN_CHANCE) {
                self.walkers[index].heading = random_heading(&mut self.rng);
            }
            let Walker { id, heading } = self.walkers[index];

            if self.rng.gen_bool(TELEPORT_CHANCE) {
                self.teleport(id)?;
                continue;
            }

            let motion = strata_metrics::time_phase!(self.profiler, "collision", {
                resolve_motion(&self.world, id, heading)
            });
            let Some((delta, wet)) = motion else {
                continue;
            };
            if wet {
                self.wet_ticks += 1;
            }
            self.apply_motion(id, delta)?;
        }
        Ok(())
    }

    fn apply_motion(&mut self, id: EntityId, delta: DVec3) -> Result<()> {
        let Some(old) = self.world.entity(id).map(FlatEntity::position) else {
            return Ok(());
        };
        let new = old + delta;
        if new.y < f64::from(self.world.vertical_bounds().min_y()) - VOID_DEPTH {
            return self.teleport(id);
        }
        self.world.move_entity(id, new);

        let (from, to) = (CellPos::from_position(old), CellPos::from_position(new));
        let Some(entity) = self.world.entity(id) else {
            return Ok(());
        };
        if from != to {
            strata_metrics::time_phase!(self.profiler, "tracker", {
                self.tracker.on_entity_moved(from, to, entity)
            })?;
        } else if delta != DVec3::ZERO {
            self.tracker.on_entity_moved_within_cell(id);
        }
        Ok(())
    }

    fn teleport(&mut self, id: EntityId) -> Result<()> {
        if let Some(entity) = self.world.entity(id) {
            self.tracker.before_teleport(entity)?;
        }
        let target = self.random_surface_position();
        self.world.move_entity(id, target);
        if let Some(entity) = self.world.entity(id) {
            self.tracker.after_teleport(entity)?;
        }
        self.teleports += 1;
        tracing::debug!(entity = %id, ?target, "teleported");
        Ok(())
    }

    fn random_surface_position(&mut self) -> DVec3 {
        let r = self.spawn_radius;
        let floor = f64::from(self.world.vertical_bounds().min_y()) + 1.0;
        DVec3::new(self.rng.gen_range(-r..r), floor, self.rng.gen_range(-r..r))
    }
}

/// Motion for one tick: gravity clipped against the blocks below, then a
/// horizontal step cancelled when it would run into blocks or other kinds
/// of entities. Also reports whether the entity stands in water.
fn resolve_motion(world: &FlatWorld, id: EntityId, heading: DVec3) -> Option<(DVec3, bool)> {
    let entity: &dyn Collider = world.entity(id)?;
    let bbox = entity.bounding_box();
    let context = ShapeContext::of(entity);

    let dy = match probe_below_feet(world, &bbox, &context, -GRAVITY) {
        Some(dy) => dy,
        None => {
            let reach = bbox.union(&bbox.offset(DVec3::new(0.0, -GRAVITY, 0.0)));
            block_collisions(world, Some(entity), reach)
                .fold(-GRAVITY, |dy, shape| shape.clip_y_motion(&bbox, dy))
        }
    };

    let settled = bbox.offset(DVec3::new(0.0, dy, 0.0));
    let step = heading * WALK_SPEED;
    let target = settled.offset(step);
    let blocked = box_collides_with_blocks(world, Some(entity), target)
        || box_collides_with_entities(world, Some(entity), target, |other| {
            other.kind() != entity.kind()
        });
    let wet = area_contains_block(world, &settled, |block| *block == BlockKind::Water);

    let delta = if blocked {
        DVec3::new(0.0, dy, 0.0)
    } else {
        DVec3::new(step.x, dy, step.z)
    };
    Some((delta, wet))
}

fn random_heading(rng: &mut StdRng) -> DVec3 {
    let angle = rng.gen_range(0.0..TAU);
    DVec3::new(angle.cos(), 0.0, angle.sin())
}

/// A solid floor on the lowest row with scattered features on top.
fn build_terrain(world: &mut FlatWorld, rng: &mut StdRng, radius: i32) {
    let floor = world.vertical_bounds().min_y();
    for x in -radius..=radius {
        for z in -radius..=radius {
            world.set_block(IVec3::new(x, floor, z), BlockKind::Solid);
            let feature = match rng.gen_range(0..1000) {
                0..=14 => BlockKind::Fence,
                15..=29 => BlockKind::Slab,
                30..=39 => BlockKind::Platform,
                40..=59 => BlockKind::Water,
                60 => BlockKind::MovingPiston {
                    toward: [IVec3::X, IVec3::NEG_X, IVec3::Z, IVec3::NEG_Z]
                        [rng.gen_range(0..4usize)],
                },
                _ => continue,
            };
            world.set_block(IVec3::new(x, floor + 1, z), feature);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_settings() -> Settings {
        let mut settings = Settings::default();
        settings.harness.entities = 40;
        settings.harness.spawn_radius = 24.0;
        settings.harness.listener_fraction = 0.5;
        settings
    }

    #[test]
    fn tracker_follows_every_walker() {
        let mut simulation = Simulation::new(&small_settings()).unwrap();
        simulation.run(30).unwrap();

        assert_eq!(simulation.tracker.tracked_entity_count(), simulation.entity_count());
        for walker in &simulation.walkers {
            let entity = simulation.world.entity(walker.id).unwrap();
            assert_eq!(
                simulation.tracker.tracked_cell(walker.id),
                Some(CellPos::from_position(entity.position()))
            );
        }
        for watcher in &simulation.watchers {
            assert!(watcher.borrow().in_range >= 0);
        }
    }

    #[test]
    fn same_seed_same_outcome() {
        let positions = |settings: &Settings| {
            let mut simulation = Simulation::new(settings).unwrap();
            simulation.run(10).unwrap();
            simulation
                .walkers
                .iter()
                .map(|w| simulation.world.entity(w.id).unwrap().position())
                .collect::<Vec<_>>()
        };
        let settings = small_settings();
        assert_eq!(positions(&settings), positions(&settings));
    }

    #[test]
    fn walkers_stand_on_the_floor() {
        let mut settings = small_settings();
        settings.harness.entities = 1;
        let mut simulation = Simulation::new(&settings).unwrap();
        let id = simulation.walkers[0].id;
        simulation.world.move_entity(id, DVec3::new(0.5, 1.0, 0.5));
        simulation.world.set_block(IVec3::new(0, 1, 0), BlockKind::Air);

        let (delta, _) = resolve_motion(&simulation.world, id, DVec3::ZERO).unwrap();
        assert_eq!(delta.y, 0.0);
    }
}
