//! Leash and stuck-target bookkeeping for a single hunter.
//!
//! The controller remembers where the hunter was started, whether it is
//! currently walking back there, and which target it has been fighting for
//! how long. Two distinct radii keep the leash from oscillating: the hunter
//! must walk back once it is outside `max(search radius, LEASH_FLOOR)` and
//! only counts as home again when strictly inside the (smaller) arrival
//! radius.

use std::time::Instant;

use autofarm_core::{EntityId, FarmConfig, Position, World};

/// Outcome of one [`MovementController::begin_return`] step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Homing {
    /// Inside the arrival radius; the return is finished.
    Arrived,
    /// A move towards the origin was issued.
    Underway,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TargetLock {
    target: EntityId,
    locked_at: Instant,
    last_hit_at: Instant,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MovementController {
    origin: Option<Position>,
    returning: bool,
    lock: Option<TargetLock>,
}

impl MovementController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn origin(&self) -> Option<Position> {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Position) {
        self.origin = Some(origin);
    }

    pub fn is_returning(&self) -> bool {
        self.returning
    }

    pub fn set_returning(&mut self, returning: bool) {
        self.returning = returning;
    }

    /// True when `position` is outside the leash around the origin. A hunter
    /// without an origin is never far.
    pub fn is_far_from_origin(&self, position: Position, radius: u32) -> bool {
        self.origin.is_some_and(|origin| {
            !origin.is_in_2d_radius(&position, FarmConfig::leash_radius(radius))
        })
    }

    /// True when `position` is strictly inside the arrival radius.
    pub fn is_at_origin(&self, position: Position, arrival_radius: u32) -> bool {
        self.origin
            .is_none_or(|origin| origin.is_in_2d_radius(&position, arrival_radius))
    }

    /// Walks the hunter one step back home.
    ///
    /// On arrival the returning flag and the current target are cleared.
    /// Otherwise a move is issued, and the target is released the first time
    /// the return starts.
    pub fn begin_return(
        &mut self,
        world: &dyn World,
        actor: EntityId,
        position: Position,
        arrival_radius: u32,
    ) -> Homing {
        let origin = match self.origin {
            Some(origin) if !self.is_at_origin(position, arrival_radius) => origin,
            _ => {
                self.returning = false;
                world.set_target(actor, None);
                return Homing::Arrived;
            }
        };

        world.move_to(actor, origin);
        if !self.returning {
            self.returning = true;
            world.set_target(actor, None);
        }
        Homing::Underway
    }

    /// Tracks progress against `target` and reports whether it is stuck.
    ///
    /// A new target (re)starts both timers and is never stuck. For the same
    /// target, any missing HP refreshes the last-hit timer; the engagement is
    /// stuck once either the time since the last hit exceeds the hit timeout
    /// or the time since the lock exceeds the same-target ceiling.
    pub fn check_stuck(
        &mut self,
        target: EntityId,
        target_hp_ratio: f64,
        now: Instant,
        config: &FarmConfig,
    ) -> bool {
        let lock = match self.lock.as_mut() {
            Some(lock) if lock.target == target => lock,
            _ => {
                self.lock = Some(TargetLock {
                    target,
                    locked_at: now,
                    last_hit_at: now,
                });
                return false;
            }
        };

        if target_hp_ratio < 1.0 {
            lock.last_hit_at = now;
        }

        let since_hit = now.saturating_duration_since(lock.last_hit_at);
        let since_lock = now.saturating_duration_since(lock.locked_at);
        since_hit > config.hit_timeout || since_lock > config.same_target_timeout
    }

    pub fn reset_stuck(&mut self) {
        self.lock = None;
    }

    pub fn locked_target(&self) -> Option<EntityId> {
        self.lock.map(|lock| lock.target)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use autofarm_core::sandbox::{Issued, SandboxWorld};

    use super::*;

    const ME: EntityId = EntityId(1);
    const MOB: EntityId = EntityId(10);

    fn config() -> FarmConfig {
        FarmConfig {
            hit_timeout: Duration::from_secs(10),
            same_target_timeout: Duration::from_secs(30),
            arrival_radius: 100,
            ..FarmConfig::default()
        }
    }

    #[test]
    fn untouched_target_becomes_stuck_after_hit_timeout() {
        let config = config();
        let mut movement = MovementController::new();
        let t0 = Instant::now();

        assert!(!movement.check_stuck(MOB, 1.0, t0, &config));
        assert!(!movement.check_stuck(MOB, 1.0, t0 + Duration::from_secs(5), &config));
        assert!(!movement.check_stuck(MOB, 1.0, t0 + Duration::from_secs(10), &config));
        assert!(movement.check_stuck(MOB, 1.0, t0 + Duration::from_millis(10_001), &config));
    }

    #[test]
    fn damaged_target_still_hits_same_target_ceiling() {
        let config = config();
        let mut movement = MovementController::new();
        let t0 = Instant::now();

        assert!(!movement.check_stuck(MOB, 1.0, t0, &config));
        for secs in (5..=30).step_by(5) {
            let now = t0 + Duration::from_secs(secs);
            assert!(!movement.check_stuck(MOB, 0.5, now, &config), "at {secs}s");
        }
        assert!(movement.check_stuck(MOB, 0.4, t0 + Duration::from_secs(31), &config));
    }

    #[test]
    fn switching_target_restarts_timers() {
        let config = config();
        let mut movement = MovementController::new();
        let t0 = Instant::now();

        movement.check_stuck(MOB, 1.0, t0, &config);
        let later = t0 + Duration::from_secs(20);
        assert!(!movement.check_stuck(EntityId(11), 1.0, later, &config));
        assert_eq!(movement.locked_target(), Some(EntityId(11)));

        movement.reset_stuck();
        assert_eq!(movement.locked_target(), None);
        assert!(!movement.check_stuck(EntityId(11), 1.0, later + Duration::from_secs(60), &config));
    }

    #[test]
    fn leash_boundary_is_far_and_arrival_uses_smaller_radius() {
        let config = config();
        let mut movement = MovementController::new();
        movement.set_origin(Position::ORIGIN);

        // Radius below the floor is lifted to the floor.
        assert!(movement.is_far_from_origin(Position::new(500, 0, 0), 200));
        assert!(!movement.is_far_from_origin(Position::new(499, 0, 0), 200));

        // Well inside the leash but not yet home.
        let halfway = Position::new(300, 0, 0);
        assert!(!movement.is_far_from_origin(halfway, 200));
        assert!(!movement.is_at_origin(halfway, config.arrival_radius));
        assert!(movement.is_at_origin(Position::new(99, 0, 0), config.arrival_radius));
    }

    #[test]
    fn without_origin_hunter_is_home() {
        let movement = MovementController::new();
        assert!(!movement.is_far_from_origin(Position::new(9_999, 0, 0), 100));
        assert!(movement.is_at_origin(Position::new(9_999, 0, 0), 100));
    }

    #[test]
    fn begin_return_releases_target_once_and_clears_on_arrival() {
        let world = SandboxWorld::new();
        world.add_player(ME, "hunter", Position::new(1_300, 0, 0));
        let mut movement = MovementController::new();
        movement.set_origin(Position::ORIGIN);

        let here = Position::new(1_300, 0, 0);
        assert_eq!(movement.begin_return(&world, ME, here, 100), Homing::Underway);
        assert!(movement.is_returning());
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

        let closer = Position::new(1_050, 0, 0);
        assert_eq!(movement.begin_return(&world, ME, closer, 100), Homing::Underway);
        assert_eq!(
            world.take_issued(),
            vec![Issued::MoveTo {
                actor: ME,
                destination: Position::ORIGIN
            }]
        );

        let home = Position::new(50, 0, 0);
        assert_eq!(movement.begin_return(&world, ME, home, 100), Homing::Arrived);
        assert!(!movement.is_returning());
        assert_eq!(
            world.take_issued(),
            vec![Issued::SetTarget {
                actor: ME,
                target: None
            }]
        );
    }
}
