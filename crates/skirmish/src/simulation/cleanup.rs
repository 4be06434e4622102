//! Stage 8: release everything marked DEAD this tick.
//!
//! After this stage no row carries the DEAD flag, every released id has a
//! bumped generation and zeroed rows, and the rosters hold live ids only.

use skirmish_core::flags;
use tracing::warn;

use super::{Simulation, Stage};
use crate::error::SimError;

pub(super) fn sweep(sim: &mut Simulation) -> Result<(), SimError> {
    let capacity = sim.stores.capacity() as u32;

    // Descending, so the lowest released id ends on top of the free stack.
    for id in (0..capacity).rev() {
        if !sim.stores.flags.contains(id, flags::DEAD) {
            continue;
        }
        let Some(allocator) = sim.allocator_for_mut(id) else {
            return Err(SimError::UnownedIndex {
                stage: Stage::Cleanup,
                id,
            });
        };
        if allocator.is_live(id) {
            allocator.release(id);
        } else {
            warn!(id, "DEAD flag on an unallocated row, zeroing it");
        }

        sim.brains.remove(id);
        sim.grid.remove_static(id);
        sim.stores.reset(id);
    }

    let stores = &sim.stores;
    let live = |id: &u32| stores.flags.is_simulated(*id);
    sim.rosters.food.retain(live);
    sim.rosters.bosses.retain(live);
    sim.rosters.projectiles.retain(live);

    let (local, remote) = (&sim.local, sim.remote.as_ref());
    sim.remote_names
        .retain(|_, handle| local.is_valid(*handle) || remote.is_some_and(|r| r.is_valid(*handle)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::ecs::layout::transform;
    use skirmish_shared::SimConfig;

    fn sim() -> Simulation {
        Simulation::new(SimConfig {
            max_entities: 16,
            local_partition: Some(8),
            ..SimConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_dead_rows_are_released_and_zeroed() {
        let mut sim = sim();
        let bot = sim.spawn_bot(100.0, 100.0, None).unwrap();
        let food = sim.spawn_food(200.0, 200.0, false).unwrap();
        sim.stores_mut().flags.mark_dead(bot.index());
        sweep(&mut sim).unwrap();

        assert!(!sim.is_valid(bot));
        assert!(sim.brain(bot).is_none());
        assert_eq!(sim.stores().flags.get(bot.index()), 0);
        assert_eq!(sim.stores().transform.get(bot.index(), transform::X), Some(0.0));
        assert!(sim.is_valid(food));

        let again = sim.allocate_local().unwrap();
        assert_eq!(again.index(), bot.index());
        assert_eq!(again.generation(), bot.generation() + 1);
    }

    #[test]
    fn test_rosters_and_static_membership_are_compacted() {
        let mut sim = sim();
        let a = sim.spawn_food(10.0, 10.0, false).unwrap();
        sim.spawn_food(20.0, 20.0, false).unwrap();
        let rock = sim.spawn_obstacle(300.0, 300.0, 20.0).unwrap();
        sim.stores_mut().flags.mark_dead(a.index());
        sim.stores_mut().flags.mark_dead(rock.index());
        sweep(&mut sim).unwrap();

        assert_eq!(sim.rosters.food.len(), 1);
        assert_eq!(sim.food_count(), 1);
        assert!(!sim.grid().is_static(rock.index()));
        assert!(!sim.grid().is_static(a.index()));
        assert_eq!(sim.grid().static_count(), 1);
    }

    #[test]
    fn test_remote_partition_release() {
        let mut sim = sim();
        let remote = sim.allocate_remote().unwrap();
        assert_eq!(remote.index(), 8);
        sim.stores_mut().flags.set(remote.index(), flags::ACTIVE | flags::DEAD);
        sweep(&mut sim).unwrap();

        assert!(!sim.is_valid(remote));
        assert_eq!(sim.allocate_remote().unwrap().generation(), remote.generation() + 1);
    }

    #[test]
    fn test_stray_dead_flag_is_zeroed_without_release() {
        let mut sim = sim();
        sim.stores_mut().flags.set(3, flags::DEAD);
        sweep(&mut sim).unwrap();
        assert_eq!(sim.stores().flags.get(3), 0);
        assert_eq!(sim.alive_count(), 0);
    }
}
