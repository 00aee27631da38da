use std::sync::Arc;
use std::time::{Duration, Instant};

use autofarm_core::sandbox::{Issued, SandboxWorld};
use autofarm_core::{EntityId, FarmConfig, HostileKind, Position, WorldQuery};
use autofarm_runtime::{
    Archetype, HunterRecord, HunterRegistry, InMemoryHunterRepository, Scheduler,
};

const ME: EntityId = EntityId(3);
const MOB: EntityId = EntityId(300);

fn world() -> Arc<SandboxWorld> {
    let world = Arc::new(SandboxWorld::new());
    world.add_player(ME, "Cade", Position::ORIGIN);
    world
}

fn stored(minutes: u32) -> InMemoryHunterRepository {
    InMemoryHunterRepository::with_records([HunterRecord {
        player_id: ME.get(),
        name: "Cade".into(),
        remaining_minutes: minutes,
    }])
}

/// The scheduler ticks once per period, decays time every save interval and
/// flushes everyone on shutdown.
#[tokio::test(start_paused = true)]
async fn test_scheduler_ticks_and_flushes_on_shutdown() {
    let world = world();
    let repository = Arc::new(stored(10));
    let config = FarmConfig {
        save_interval: 2,
        ..FarmConfig::default()
    };
    let registry = Arc::new(HunterRegistry::new(world, repository.clone(), config));
    let hunter = registry.get_or_create(ME);
    hunter.start(registry.world()).expect("hunter should start");

    let scheduler = Scheduler::spawn(Arc::clone(&registry), Duration::from_secs(1));

    // Ticks at 1s, 2s, 3s and 4s; saves at 2s and 4s.
    tokio::time::sleep(Duration::from_millis(4_500)).await;
    assert_eq!(hunter.remaining_minutes(), 8);
    assert_eq!(repository.stats().batches, 2);

    let flushed = scheduler.shutdown().await.expect("clean shutdown");
    assert_eq!(flushed, 1);
    assert_eq!(repository.stats().batches, 3);
    assert_eq!(
        repository.get(ME).expect("readable").map(|r| r.remaining_minutes),
        Some(8)
    );
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_idles_on_empty_registry() {
    let repository = Arc::new(InMemoryHunterRepository::new());
    let registry = Arc::new(HunterRegistry::new(
        world(),
        repository.clone(),
        FarmConfig::default(),
    ));

    let scheduler = Scheduler::spawn(Arc::clone(&registry), Duration::from_millis(100));
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(scheduler.shutdown().await.expect("clean shutdown"), 0);
    assert_eq!(repository.stats().total_calls(), 0);
}

/// A target that never loses HP is abandoned after the hit timeout and the
/// hunter heads back to its origin.
#[test]
fn test_unproductive_target_triggers_return() {
    let world = world();
    world.update(ME, |a| a.caster = true);
    world.add_hostile(MOB, Position::new(300, 0, 0), HostileKind::Regular);
    let registry = HunterRegistry::new(
        world.clone(),
        Arc::new(stored(60)),
        FarmConfig::default(),
    );
    let hunter = registry.get_or_create(ME);
    assert_eq!(hunter.archetype(), Archetype::Caster);
    hunter.start(registry.world()).expect("hunter should start");
    world.update(ME, |a| a.position = Position::new(290, 0, 0));

    let t0 = Instant::now();
    registry.tick_at(t0);
    assert_eq!(world.target_of(ME), Some(MOB));

    registry.tick_at(t0 + Duration::from_secs(10));
    assert!(!hunter.is_returning());
    world.take_issued();

    registry.tick_at(t0 + Duration::from_secs(16));
    assert!(hunter.is_returning());
    assert_eq!(world.target_of(ME), None);
    assert_eq!(
        world.take_issued(),
        vec![
            Issued::MoveTo {
                actor: ME,
                destination: Position::ORIGIN
            },
            Issued::SetTarget {
                actor: ME,
                target: None
            },
        ]
    );
}
