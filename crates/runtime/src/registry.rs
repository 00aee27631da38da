//! Process-wide table of hunters and the per-tick driver.
//!
//! Request threads look hunters up (creating them on first touch) and edit
//! them in place while the scheduler runs [`HunterRegistry::tick`]. A tick
//! first snapshots the registered hunters, so the map is never locked while
//! routines run, then processes each hunter in isolation. Writes and
//! evictions discovered during the pass are queued and applied once the pass
//! is over.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Instant;

use autofarm_core::{EntityId, FarmConfig, World};
use crossbeam_queue::SegQueue;
use dashmap::DashMap;
use tracing::{debug, error, info, warn};

use crate::hunter::{Archetype, Hunter};
use crate::repository::{HunterRecord, HunterRepository, RepositoryError};

/// Summary of one [`HunterRegistry::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Hunters examined this tick.
    pub hunters: usize,
    /// Decision routines executed.
    pub routines: usize,
    /// Hunters deactivated because they died or ran out of time.
    pub stopped: usize,
    /// Hunters evicted after their player went offline.
    pub removed: usize,
    /// Hunters whose processing panicked.
    pub faulted: usize,
    /// Whether this tick closed a save interval.
    pub save_tick: bool,
    /// Rows handed to the batch write.
    pub flushed: usize,
    /// The tick found another tick still running and did nothing.
    pub overlapped: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Offline,
    Inactive,
    Stopped,
    Ran,
}

/// Clears the re-entrancy flag when a tick ends, even by unwinding.
struct TickGuard<'a>(&'a AtomicBool);

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct HunterRegistry {
    hunters: DashMap<EntityId, Arc<Hunter>>,
    world: Arc<dyn World>,
    repository: Arc<dyn HunterRepository>,
    config: Arc<FarmConfig>,
    tick_count: AtomicU32,
    ticking: AtomicBool,
    pending_writes: SegQueue<Arc<Hunter>>,
    pending_removals: SegQueue<EntityId>,
}

impl HunterRegistry {
    pub fn new(
        world: Arc<dyn World>,
        repository: Arc<dyn HunterRepository>,
        config: FarmConfig,
    ) -> Self {
        Self {
            hunters: DashMap::new(),
            world,
            repository,
            config: Arc::new(config.normalized()),
            tick_count: AtomicU32::new(0),
            ticking: AtomicBool::new(false),
            pending_writes: SegQueue::new(),
            pending_removals: SegQueue::new(),
        }
    }

    pub fn world(&self) -> &dyn World {
        self.world.as_ref()
    }

    pub fn config(&self) -> &FarmConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.hunters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hunters.is_empty()
    }

    pub fn get(&self, player: EntityId) -> Option<Arc<Hunter>> {
        self.hunters.get(&player).map(|entry| Arc::clone(entry.value()))
    }

    /// Hunters waiting for the next batch write.
    pub fn pending_writes(&self) -> usize {
        self.pending_writes.len()
    }

    /// Returns the registered hunter, loading or creating it on first access.
    ///
    /// A missing or unreadable record yields a fresh hunter with no time
    /// budget. When two threads race on the same player, both get the hunter
    /// that was inserted first.
    pub fn get_or_create(&self, player: EntityId) -> Arc<Hunter> {
        if let Some(hunter) = self.get(player) {
            return hunter;
        }

        let stored = self.repository.load(player).unwrap_or_else(|error| {
            warn!(player = %player, %error, "failed to load hunter record, starting fresh");
            None
        });

        let archetype = if self.world.is_caster_class(player) {
            Archetype::Caster
        } else {
            Archetype::Fighter
        };
        let name = self
            .world
            .name(player)
            .or_else(|| stored.as_ref().map(|record| record.name.clone()))
            .unwrap_or_else(|| player.to_string());
        let minutes = stored.as_ref().map_or(0, |record| record.remaining_minutes);

        let candidate = Arc::new(Hunter::new(
            player,
            name,
            archetype,
            minutes,
            Arc::clone(&self.config),
        ));
        let hunter = Arc::clone(self.hunters.entry(player).or_insert(candidate).value());
        hunter.recalculate_range(self.world.as_ref());

        debug!(
            player = %player,
            minutes = hunter.remaining_minutes(),
            restored = stored.is_some(),
            "hunter registered"
        );
        hunter
    }

    /// Drops a hunter immediately. Ticks use deferred removal instead.
    pub fn remove(&self, player: EntityId) -> Option<Arc<Hunter>> {
        self.hunters.remove(&player).map(|(_, hunter)| hunter)
    }

    /// Adds purchased minutes and writes the hunter through to storage.
    ///
    /// If the write fails the minutes are taken back and the error returned,
    /// so a purchase is never reported without being stored.
    pub fn purchase_time(&self, hunter: &Hunter, minutes: u32) -> Result<u32, RepositoryError> {
        let balance = hunter.add_minutes(minutes);
        if let Err(error) = self.repository.upsert(&hunter.record()) {
            hunter.remove_minutes(minutes);
            error!(player = %hunter.id(), minutes, %error, "failed to store purchased time");
            return Err(error);
        }
        info!(player = %hunter.id(), minutes, balance, "auto farm time purchased");
        Ok(balance)
    }

    pub fn tick(&self) -> TickReport {
        self.tick_at(Instant::now())
    }

    /// Runs one scheduler pass using `now` as the clock for stuck detection.
    pub fn tick_at(&self, now: Instant) -> TickReport {
        if self.hunters.is_empty() {
            // The last evicted hunters may still owe their final write.
            if self.pending_writes.is_empty() {
                return TickReport::default();
            }
            return TickReport {
                save_tick: true,
                flushed: self.flush_pending(),
                ..TickReport::default()
            };
        }
        if self.ticking.swap(true, Ordering::AcqRel) {
            debug!("previous tick still running, skipping");
            return TickReport {
                overlapped: true,
                ..TickReport::default()
            };
        }
        let _guard = TickGuard(&self.ticking);

        let save_tick = self.advance_tick_count();
        let snapshot: Vec<Arc<Hunter>> = self
            .hunters
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut report = TickReport {
            hunters: snapshot.len(),
            save_tick,
            ..TickReport::default()
        };

        for hunter in &snapshot {
            let outcome = catch_unwind(AssertUnwindSafe(|| self.process(hunter, save_tick, now)));
            match outcome {
                Ok(Outcome::Offline) => {}
                Ok(Outcome::Inactive) => {}
                Ok(Outcome::Stopped) => report.stopped += 1,
                Ok(Outcome::Ran) => report.routines += 1,
                Err(payload) => {
                    report.faulted += 1;
                    error!(
                        player = %hunter.id(),
                        panic = panic_message(payload.as_ref()),
                        "hunter routine panicked"
                    );
                }
            }
        }

        if save_tick {
            report.flushed = self.flush_pending();
        }
        report.removed = self.drain_removals();

        debug!(
            hunters = report.hunters,
            routines = report.routines,
            stopped = report.stopped,
            removed = report.removed,
            flushed = report.flushed,
            "tick complete"
        );
        report
    }

    /// Batch-writes every registered hunter plus anything still queued.
    pub fn flush_all(&self) -> Result<usize, RepositoryError> {
        let mut batch = self.drain_pending();
        for entry in self.hunters.iter() {
            batch.insert(*entry.key(), entry.value().record());
        }
        let records: Vec<HunterRecord> = batch.into_values().collect();
        self.repository.update_batch(&records)?;
        info!(count = records.len(), "flushed all hunters");
        Ok(records.len())
    }

    fn process(&self, hunter: &Arc<Hunter>, save_tick: bool, now: Instant) -> Outcome {
        let world = self.world.as_ref();
        let id = hunter.id();

        if !world.is_online(id) {
            self.pending_writes.push(Arc::clone(hunter));
            self.pending_removals.push(id);
            return Outcome::Offline;
        }
        if !hunter.is_active() {
            return Outcome::Inactive;
        }
        if world.is_dead(id) || hunter.remaining_minutes() == 0 {
            hunter.stop(world);
            self.pending_writes.push(Arc::clone(hunter));
            return Outcome::Stopped;
        }

        hunter.execute_routine(world, now);

        if save_tick {
            hunter.remove_minutes(1);
            self.pending_writes.push(Arc::clone(hunter));
        }
        Outcome::Ran
    }

    /// Advances the tick counter and reports whether a save interval closed.
    fn advance_tick_count(&self) -> bool {
        let interval = self.config.save_interval.max(1);
        let previous = self
            .tick_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                Some((count + 1) % interval)
            })
            .unwrap_or_else(|count| count);
        previous + 1 >= interval
    }

    fn drain_pending(&self) -> HashMap<EntityId, HunterRecord> {
        let mut batch = HashMap::with_capacity(self.pending_writes.len());
        while let Some(hunter) = self.pending_writes.pop() {
            batch.insert(hunter.id(), hunter.record());
        }
        batch
    }

    fn flush_pending(&self) -> usize {
        let records: Vec<HunterRecord> = self.drain_pending().into_values().collect();
        if records.is_empty() {
            return 0;
        }
        match self.repository.update_batch(&records) {
            Ok(()) => {
                info!(count = records.len(), "hunter batch saved");
                records.len()
            }
            Err(error) => {
                error!(count = records.len(), %error, "hunter batch save failed, dropping batch");
                0
            }
        }
    }

    fn drain_removals(&self) -> usize {
        let mut removed = 0;
        while let Some(id) = self.pending_removals.pop() {
            let evicted = self
                .hunters
                .remove_if(&id, |_, _| !self.world.is_online(id))
                .is_some();
            if evicted {
                debug!(player = %id, "hunter evicted");
                removed += 1;
            }
        }
        removed
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use autofarm_core::sandbox::SandboxWorld;
    use autofarm_core::{HostileKind, Position};

    use super::*;
    use crate::repository::InMemoryHunterRepository;

    const ME: EntityId = EntityId(1);

    fn registry(save_interval: u32) -> (Arc<SandboxWorld>, Arc<InMemoryHunterRepository>, HunterRegistry) {
        let world = Arc::new(SandboxWorld::new());
        world.add_player(ME, "Aria", Position::ORIGIN);
        let repository = Arc::new(InMemoryHunterRepository::new());
        let config = FarmConfig {
            save_interval,
            ..FarmConfig::default()
        };
        let registry = HunterRegistry::new(world.clone(), repository.clone(), config);
        (world, repository, registry)
    }

    #[test]
    fn save_interval_wraps() {
        let (_, _, registry) = registry(3);
        let saves: Vec<bool> = (0..7).map(|_| registry.advance_tick_count()).collect();
        assert_eq!(saves, vec![false, false, true, false, false, true, false]);
    }

    #[test]
    fn get_or_create_is_stable_and_named_after_player() {
        let (world, repository, registry) = registry(60);
        world.update(ME, |a| a.caster = true);

        let first = registry.get_or_create(ME);
        let second = registry.get_or_create(ME);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.name(), "Aria");
        assert_eq!(first.archetype(), Archetype::Caster);
        assert_eq!(first.remaining_minutes(), 0);
        assert_eq!(repository.stats().loads, 1);
    }

    #[test]
    fn stored_minutes_are_restored() {
        let world = Arc::new(SandboxWorld::new());
        world.add_player(ME, "Aria", Position::ORIGIN);
        let repository = Arc::new(InMemoryHunterRepository::with_records([HunterRecord {
            player_id: ME.get(),
            name: "Aria".into(),
            remaining_minutes: 90,
        }]));
        let registry = HunterRegistry::new(world, repository, FarmConfig::default());

        assert_eq!(registry.get_or_create(ME).remaining_minutes(), 90);
    }

    #[test]
    fn inactive_hunters_cost_nothing() {
        let (_, repository, registry) = registry(1);
        let hunter = registry.get_or_create(ME);
        registry.purchase_time(&hunter, 60).unwrap();

        let report = registry.tick();
        assert_eq!(report.routines, 0);
        assert_eq!(report.flushed, 0);
        assert_eq!(hunter.remaining_minutes(), 60);
        assert_eq!(repository.stats().batches, 0);
    }

    #[test]
    fn out_of_time_hunter_is_stopped_and_queued() {
        let (world, _, registry) = registry(60);
        world.add_hostile(EntityId(10), Position::new(100, 0, 0), HostileKind::Regular);
        let hunter = registry.get_or_create(ME);
        hunter.add_minutes(1);
        hunter.start(registry.world()).unwrap();
        hunter.remove_minutes(1);

        let report = registry.tick();
        assert_eq!(report.stopped, 1);
        assert!(!hunter.is_active());
        assert_eq!(registry.pending_writes(), 1);
    }

    #[test]
    fn offline_eviction_is_cancelled_by_reconnect() {
        let (world, _, registry) = registry(60);
        registry.get_or_create(ME);
        world.update(ME, |a| a.online = false);

        registry.process(&registry.get(ME).unwrap(), false, Instant::now());
        world.update(ME, |a| a.online = true);
        assert_eq!(registry.drain_removals(), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn final_write_of_last_evicted_hunter_is_not_stranded() {
        let (world, repository, registry) = registry(60);
        let hunter = registry.get_or_create(ME);
        registry.purchase_time(&hunter, 30).unwrap();
        world.update(ME, |a| a.online = false);

        let evicting = registry.tick();
        assert_eq!(evicting.removed, 1);
        assert!(registry.is_empty());
        assert_eq!(registry.pending_writes(), 1);

        let draining = registry.tick();
        assert_eq!(draining.flushed, 1);
        assert_eq!(registry.pending_writes(), 0);
        assert_eq!(repository.stats().batches, 1);

        assert_eq!(registry.tick(), TickReport::default());
        assert_eq!(repository.stats().batches, 1);
    }

    #[test]
    fn panic_payloads_are_readable() {
        let payload = catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom");
    }
}
