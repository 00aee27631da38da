//! Stand-alone auto-farm host backed by the sandbox world.
//!
//! Seeds a small hunting ground, enables one player's hunter through the
//! regular command path and ticks it until Ctrl-C.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use autofarm_core::sandbox::SandboxWorld;
use autofarm_core::{EntityId, HostileKind, Position, SkillCategory, SkillId, SkillInfo};
use autofarm_runtime::logging::setup_logging;
use autofarm_runtime::{
    CommandDispatcher, FileHunterRepository, HunterRegistry, HunterRepository,
    InMemoryHunterRepository, RuntimeConfig, Scheduler,
};
use tracing::{info, warn};

const PLAYER: EntityId = EntityId(1);

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let mut config = RuntimeConfig::from_env();
    if config.log.directory.is_none() {
        config.log.directory = Some(project_dir(Kind::Logs));
    }
    let _guard = setup_logging(&config.log).context("failed to set up logging")?;

    let data_file = config
        .data_file
        .clone()
        .unwrap_or_else(|| project_dir(Kind::Data).join("hunters.json"));
    let repository: Arc<dyn HunterRepository> =
        match FileHunterRepository::open(&data_file, config.farm.batch_size) {
            Ok(repository) => {
                info!(path = %data_file.display(), "using file-backed hunter storage");
                Arc::new(repository)
            }
            Err(error) => {
                warn!(path = %data_file.display(), %error, "falling back to in-memory storage");
                Arc::new(InMemoryHunterRepository::new())
            }
        };

    let world = Arc::new(seed_world());
    let registry = Arc::new(HunterRegistry::new(world, repository, config.farm.clone()));

    let dispatcher = CommandDispatcher::new(Arc::clone(&registry));
    for command in [
        "autofarm buytime 2",
        "autofarm select 1177 1",
        "autofarm select 1011 1",
        "autofarm state",
    ] {
        let reply = dispatcher.dispatch(PLAYER, command);
        info!(command, ?reply, "demo command");
    }

    let scheduler = Scheduler::spawn(Arc::clone(&registry), config.tick_period);
    info!(period = ?config.tick_period, "scheduler running, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    let flushed = scheduler.shutdown().await?;
    info!(flushed, "shutdown complete");
    Ok(())
}

fn seed_world() -> SandboxWorld {
    let world = SandboxWorld::new();
    world.add_player(PLAYER, "Aria", Position::ORIGIN);

    let strike = SkillId(1177);
    let heal = SkillId(1011);
    world.define_skill(
        SkillInfo::new(strike, "Wind Strike", SkillCategory::Attack).with_cast_range(600),
    );
    world.define_skill(SkillInfo::new(heal, "Heal", SkillCategory::Heal).with_cast_range(600));
    world.grant_skill(PLAYER, strike);
    world.grant_skill(PLAYER, heal);

    for (n, x) in (0..6).zip((300..).step_by(200)) {
        world.add_hostile(EntityId(100 + n), Position::new(x, 120, 0), HostileKind::Regular);
    }
    world
}

enum Kind {
    Data,
    Logs,
}

fn project_dir(kind: Kind) -> PathBuf {
    let dirs = directories::ProjectDirs::from("", "", "autofarm");
    match (kind, dirs) {
        (Kind::Data, Some(dirs)) => dirs.data_dir().to_path_buf(),
        (Kind::Logs, Some(dirs)) => dirs.cache_dir().join("logs"),
        (Kind::Data, None) => PathBuf::from("./save_data"),
        (Kind::Logs, None) => PathBuf::from("/tmp/autofarm/logs"),
    }
}
