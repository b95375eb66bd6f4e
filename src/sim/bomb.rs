//! Bomb state machine and chain reactions
//!
//! ```text
//! IDLE --(hero close | carrier shield down)--> ARMED
//! ARMED --(carrier dies)--> DETACHED
//! ARMED | DETACHED --(timer out | hero contact)--> EXPLODING --(settle)--> DEAD
//! any --(round over / hero gone when it would fire)--> DEAD
//! ```
//!
//! Damage is applied once, on the way into EXPLODING. Bombs caught in a blast
//! are never detonated from inside another detonation: their timer is driven
//! down to `chain_fuse` and they go off on their own turn.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::combat::{self, DamageOutcome};
use super::enemy::Enemy;
use super::entity::{Body, EntityId};
use super::events::{GameEvent, SoundEvent};
use super::hero::{AttackerSnapshot, DeathCause, Hero};
use crate::tuning::BombTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BombState {
    /// Riding on its carrier, passive
    Idle,
    /// Counting down on its carrier
    Armed,
    /// On the ground after the carrier died, still counting down
    Detached,
    /// Blast settling visually; damage already applied
    Exploding,
    /// Ready for removal
    Dead,
}

/// What the owner should do after [`Bomb::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BombStep {
    /// Nothing to do
    Ticking,
    /// Call [`Bomb::detonate`] now
    Detonate,
    /// Would have fired but was suppressed; now DEAD, no damage dealt
    Cancelled,
    /// DEAD, remove it
    Settled,
}

/// Summary of one detonation pass
#[derive(Debug, Clone, PartialEq)]
pub struct BlastReport {
    pub bomb: EntityId,
    pub center: Vec2,
    pub radius: f32,
    /// Damage the hero actually took (after armor)
    pub hero_damage: f32,
    /// Enemies killed by this pass
    pub kills: u32,
    /// Bombs whose fuse was cut short
    pub ignited: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bomb {
    pub body: Body,
    pub state: BombState,
    /// Countdown while ARMED or DETACHED
    pub timer: f32,
    /// Remaining visual settle while EXPLODING
    pub settle_timer: f32,
    pub explosion_radius: f32,
    pub damage: f32,
    /// Current carrier; cleared on detach or detonation
    pub carrier: Option<EntityId>,
    /// Who carried it first, kept for attribution and self-destruct
    pub original_carrier: Option<EntityId>,
    /// Carrier as it was when the bomb detached
    pub attacker: Option<AttackerSnapshot>,
    /// Accumulates while counting down (drives the render pulse)
    pub pulse: f32,
}

/// Linear falloff: full damage at the center, zero at and past the edge
pub fn falloff_damage(max_damage: f32, radius: f32, distance: f32) -> f32 {
    if radius <= 0.0 || distance >= radius {
        return 0.0;
    }
    (max_damage * (1.0 - distance / radius)).clamp(0.0, max_damage.max(0.0))
}

impl Bomb {
    /// A fresh idle bomb riding on `carrier`
    pub fn carried(id: EntityId, carrier: EntityId, pos: Vec2, tuning: &BombTuning) -> Self {
        Self {
            body: Body::new(id, pos, tuning.radius),
            state: BombState::Idle,
            timer: 0.0,
            settle_timer: 0.0,
            explosion_radius: tuning.explosion_radius,
            damage: tuning.max_damage,
            carrier: Some(carrier),
            original_carrier: Some(carrier),
            attacker: None,
            pulse: 0.0,
        }
    }

    /// Not yet exploded
    pub fn is_live(&self) -> bool {
        matches!(
            self.state,
            BombState::Idle | BombState::Armed | BombState::Detached
        )
    }

    pub fn is_counting_down(&self) -> bool {
        matches!(self.state, BombState::Armed | BombState::Detached)
    }

    /// IDLE -> ARMED with the configured countdown
    pub fn arm(&mut self, tuning: &BombTuning) -> bool {
        self.arm_with_fuse(tuning.countdown)
    }

    /// IDLE -> ARMED with an explicit countdown
    pub fn arm_with_fuse(&mut self, fuse: f32) -> bool {
        if self.state != BombState::Idle {
            return false;
        }
        self.state = BombState::Armed;
        self.timer = fuse.max(0.0);
        true
    }

    /// Chain ignition: force-arm and cut the fuse to `fuse`.
    ///
    /// Never detonates directly; the bomb fires on its own update.
    pub fn ignite(&mut self, fuse: f32) -> bool {
        match self.state {
            BombState::Idle => {
                self.state = BombState::Armed;
                self.timer = fuse;
                true
            }
            BombState::Armed | BombState::Detached => {
                self.timer = self.timer.min(fuse);
                true
            }
            BombState::Exploding | BombState::Dead => false,
        }
    }

    /// Carrier died: hand the bomb to the global pool.
    ///
    /// Armed bombs keep their remaining countdown; idle ones get the
    /// detached lifetime.
    pub fn detach(&mut self, tuning: &BombTuning) -> bool {
        match self.state {
            BombState::Idle | BombState::Armed => {
                if self.state == BombState::Idle || self.timer <= 0.0 {
                    self.timer = tuning.detached_lifetime;
                }
                self.state = BombState::Detached;
                self.carrier = None;
                true
            }
            _ => false,
        }
    }

    /// Advance timers and decide whether the bomb fires this frame.
    ///
    /// `carrier` must be the enemy currently holding the bomb (None once it
    /// is in the global pool). `round_active` is false outside WAVE; a bomb
    /// that would fire then is cancelled instead.
    pub fn update(
        &mut self,
        dt: f32,
        hero: &Hero,
        carrier: Option<&Enemy>,
        round_active: bool,
        tuning: &BombTuning,
    ) -> BombStep {
        if self.body.fading {
            self.body.fade(tuning.fade_rate, dt);
            return BombStep::Ticking;
        }

        match self.state {
            BombState::Dead => return BombStep::Settled,
            BombState::Exploding => {
                self.settle_timer = (self.settle_timer - dt).max(0.0);
                if self.settle_timer <= 0.0 {
                    self.state = BombState::Dead;
                    self.body.alive = false;
                    return BombStep::Settled;
                }
                return BombStep::Ticking;
            }
            _ => {}
        }

        if let Some(carrier) = carrier {
            self.body.pos = carrier.body.pos;
            if self.state == BombState::Idle {
                let hero_close = hero.body.alive
                    && self.body.pos.distance(hero.body.pos) < tuning.activation_distance;
                if hero_close || carrier.shield <= 0.0 {
                    self.arm(tuning);
                    log::debug!("Bomb {:?} armed", self.body.id);
                }
            }
        }

        if !self.is_counting_down() {
            return BombStep::Ticking;
        }

        self.timer = (self.timer - dt).max(0.0);
        self.pulse += dt;

        let contact =
            hero.body.alive && self.body.pos.distance(hero.body.pos) < tuning.contact_range;
        if self.timer > 0.0 && !contact {
            return BombStep::Ticking;
        }

        if !round_active || !hero.body.alive {
            self.state = BombState::Dead;
            self.body.alive = false;
            log::debug!("Bomb {:?} fizzled (round inactive)", self.body.id);
            return BombStep::Cancelled;
        }
        BombStep::Detonate
    }

    /// Run the detonation pass. Returns `None` if the bomb already went off.
    ///
    /// `enemies` is every enemy in play (the original carrier included);
    /// `loose` is every other bomb in the global pool. The bomb itself must
    /// not be reachable through either.
    pub fn detonate<'a>(
        &mut self,
        hero: &mut Hero,
        enemies: &mut [Enemy],
        loose: impl IntoIterator<Item = &'a mut Bomb>,
        tuning: &BombTuning,
        events: &mut Vec<GameEvent>,
    ) -> Option<BlastReport> {
        if !self.is_live() {
            return None;
        }

        let was_detached = self.carrier.is_none();
        self.state = BombState::Exploding;
        self.settle_timer = tuning.settle_duration;
        self.timer = 0.0;
        self.carrier = None;

        let center = self.body.pos;
        let radius = self.explosion_radius;
        let mut report = BlastReport {
            bomb: self.body.id,
            center,
            radius,
            hero_damage: 0.0,
            kills: 0,
            ignited: 0,
        };

        // 1. Hero
        if hero.body.alive {
            let raw = falloff_damage(self.damage, radius, center.distance(hero.body.pos));
            if raw > 0.0 {
                let attacker = self
                    .original_carrier
                    .and_then(|id| {
                        enemies
                            .iter()
                            .find(|enemy| enemy.id() == id)
                            .map(AttackerSnapshot::of)
                    })
                    .or(self.attacker);
                let cause = DeathCause {
                    origin: center,
                    radius,
                    bomb: self.body.id,
                    detached: was_detached,
                    attacker,
                };
                report.hero_damage = hero.take_damage(raw, Some(cause));
                events.push(GameEvent::Sound(SoundEvent::Hit));
            }
        }

        // 2. Enemies
        for enemy in enemies.iter_mut() {
            if !enemy.body.alive {
                continue;
            }
            if Some(enemy.id()) == self.original_carrier {
                if combat::apply_lethal(enemy) == DamageOutcome::Killed {
                    report.kills += 1;
                }
                continue;
            }

            let dist = center.distance(enemy.body.pos);
            if dist >= radius {
                continue;
            }
            if let Some(bomb) = enemy.bomb.as_mut() {
                if bomb.ignite(tuning.chain_fuse) {
                    report.ignited += 1;
                }
            }
            if enemy.shield > 0.0 {
                combat::strip_shield(enemy);
            } else {
                let damage = falloff_damage(self.damage, radius, dist);
                if combat::apply_damage(enemy, damage) == DamageOutcome::Killed {
                    report.kills += 1;
                }
            }
        }

        // 3. Loose bombs
        for other in loose {
            if other.is_live()
                && center.distance(other.body.pos) < radius
                && other.ignite(tuning.chain_fuse)
            {
                report.ignited += 1;
            }
        }

        // 4. Collaborator notifications
        events.push(GameEvent::Sound(SoundEvent::Explode));
        events.push(GameEvent::Shake {
            intensity: tuning.shake_intensity,
            duration: tuning.shake_duration,
        });

        // 5. Combo side-channel
        if report.kills >= 2 {
            events.push(GameEvent::Combo {
                kills: report.kills,
                pos: center,
            });
        }

        log::debug!(
            "Bomb {:?} detonated at ({:.1}, {:.1}): hero -{:.1}, kills {}, ignited {}",
            self.body.id,
            center.x,
            center.y,
            report.hero_damage,
            report.kills,
            report.ignited
        );
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::EnemyKind;
    use crate::sim::entity::IdGen;
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    struct Arena {
        ids: IdGen,
        tuning: Tuning,
        hero: Hero,
        enemies: Vec<Enemy>,
        events: Vec<GameEvent>,
    }

    impl Arena {
        fn new() -> Self {
            let tuning = Tuning::default();
            let mut ids = IdGen::default();
            let hero = Hero::new(ids.next(), Vec2::ZERO, &tuning);
            Self {
                ids,
                tuning,
                hero,
                enemies: Vec::new(),
                events: Vec::new(),
            }
        }

        fn enemy(&mut self, kind: EnemyKind, pos: Vec2) -> usize {
            let enemy = Enemy::spawn(&mut self.ids, kind, pos, 1, &self.tuning);
            self.enemies.push(enemy);
            self.enemies.len() - 1
        }
    }

    #[test]
    fn test_arms_when_hero_close() {
        let mut arena = Arena::new();
        let i = arena.enemy(EnemyKind::Standard, Vec2::new(2.0, 0.0));
        let mut bomb = arena.enemies[i].bomb.take().unwrap();
        let step = bomb.update(
            0.016,
            &arena.hero,
            Some(&arena.enemies[i]),
            true,
            &arena.tuning.bomb,
        );
        assert_eq!(step, BombStep::Ticking);
        assert_eq!(bomb.state, BombState::Armed);
    }

    #[test]
    fn test_arms_when_shield_down() {
        let mut arena = Arena::new();
        let i = arena.enemy(EnemyKind::Standard, Vec2::new(20.0, 0.0));
        arena.enemies[i].shield = 0.0;
        let mut bomb = arena.enemies[i].bomb.take().unwrap();
        bomb.update(0.016, &arena.hero, Some(&arena.enemies[i]), true, &arena.tuning.bomb);
        assert_eq!(bomb.state, BombState::Armed);
    }

    #[test]
    fn test_stays_idle_when_far() {
        let mut arena = Arena::new();
        let i = arena.enemy(EnemyKind::Standard, Vec2::new(20.0, 0.0));
        let mut bomb = arena.enemies[i].bomb.take().unwrap();
        bomb.update(0.016, &arena.hero, Some(&arena.enemies[i]), true, &arena.tuning.bomb);
        assert_eq!(bomb.state, BombState::Idle);
    }

    #[test]
    fn test_countdown_requests_detonation() {
        let mut arena = Arena::new();
        let i = arena.enemy(EnemyKind::Standard, Vec2::new(20.0, 0.0));
        let mut bomb = arena.enemies[i].bomb.take().unwrap();
        bomb.arm_with_fuse(0.1);
        let step = bomb.update(0.2, &arena.hero, Some(&arena.enemies[i]), true, &arena.tuning.bomb);
        assert_eq!(step, BombStep::Detonate);
        assert_eq!(bomb.timer, 0.0);
    }

    #[test]
    fn test_contact_detonates_immediately() {
        let mut arena = Arena::new();
        let i = arena.enemy(EnemyKind::Standard, Vec2::new(0.5, 0.0));
        let mut bomb = arena.enemies[i].bomb.take().unwrap();
        bomb.arm(&arena.tuning.bomb);
        let step = bomb.update(0.016, &arena.hero, Some(&arena.enemies[i]), true, &arena.tuning.bomb);
        assert_eq!(step, BombStep::Detonate);
    }

    #[test]
    fn test_suppressed_outside_round() {
        let mut arena = Arena::new();
        let i = arena.enemy(EnemyKind::Standard, Vec2::new(20.0, 0.0));
        let mut bomb = arena.enemies[i].bomb.take().unwrap();
        bomb.arm_with_fuse(0.01);
        let step = bomb.update(0.1, &arena.hero, None, false, &arena.tuning.bomb);
        assert_eq!(step, BombStep::Cancelled);
        assert_eq!(bomb.state, BombState::Dead);
        assert!(bomb.detonate(&mut arena.hero, &mut arena.enemies, [], &arena.tuning.bomb, &mut arena.events).is_none());
        assert_eq!(arena.hero.hp, arena.hero.max_hp);
    }

    #[test]
    fn test_fading_bomb_only_fades() {
        let mut arena = Arena::new();
        let i = arena.enemy(EnemyKind::Standard, Vec2::new(0.5, 0.0));
        let mut bomb = arena.enemies[i].bomb.take().unwrap();
        bomb.arm_with_fuse(0.01);
        bomb.body.begin_fade();
        let step = bomb.update(0.1, &arena.hero, None, true, &arena.tuning.bomb);
        assert_eq!(step, BombStep::Ticking);
        assert_eq!(bomb.state, BombState::Armed);
        assert!(bomb.body.opacity < 1.0);
    }

    #[test]
    fn test_detach_keeps_armed_countdown() {
        let tuning = BombTuning::default();
        let mut bomb = Bomb::carried(EntityId(2), EntityId(1), Vec2::ZERO, &tuning);
        bomb.arm_with_fuse(1.25);
        assert!(bomb.detach(&tuning));
        assert_eq!(bomb.state, BombState::Detached);
        assert_eq!(bomb.timer, 1.25);
        assert_eq!(bomb.carrier, None);
        assert_eq!(bomb.original_carrier, Some(EntityId(1)));

        let mut idle = Bomb::carried(EntityId(4), EntityId(3), Vec2::ZERO, &tuning);
        assert!(idle.detach(&tuning));
        assert_eq!(idle.timer, tuning.detached_lifetime);
        assert!(!idle.detach(&tuning), "already detached");
    }

    #[test]
    fn test_detached_bomb_remembers_attacker() {
        let mut arena = Arena::new();
        arena.hero.hp = 1.0;
        let i = arena.enemy(EnemyKind::Fast, Vec2::new(1.0, 0.0));
        let carrier = AttackerSnapshot::of(&arena.enemies[i]);
        let mut bomb = arena.enemies[i].bomb.take().unwrap();
        bomb.attacker = Some(carrier);
        bomb.detach(&arena.tuning.bomb);

        // Carrier is gone from play by the time the bomb goes off
        arena.enemies.clear();
        bomb.detonate(&mut arena.hero, &mut arena.enemies, [], &arena.tuning.bomb, &mut arena.events)
            .unwrap();

        let cause = arena.hero.death_cause.unwrap();
        assert!(cause.detached);
        assert_eq!(cause.attacker, Some(carrier));
        assert_eq!(cause.attacker.unwrap().kind, EnemyKind::Fast);
    }

    #[test]
    fn test_detonation_is_at_most_once() {
        let mut arena = Arena::new();
        let i = arena.enemy(EnemyKind::Standard, Vec2::new(2.0, 0.0));
        let mut bomb = arena.enemies[i].bomb.take().unwrap();

        let first = bomb.detonate(&mut arena.hero, &mut arena.enemies, [], &arena.tuning.bomb, &mut arena.events);
        assert!(first.is_some());
        assert_eq!(bomb.state, BombState::Exploding);
        let hp_after = arena.hero.hp;

        let second = bomb.detonate(&mut arena.hero, &mut arena.enemies, [], &arena.tuning.bomb, &mut arena.events);
        assert!(second.is_none());
        assert_eq!(arena.hero.hp, hp_after);

        // Settles into DEAD, then stays there
        let step = bomb.update(1.0, &arena.hero, None, true, &arena.tuning.bomb);
        assert_eq!(step, BombStep::Settled);
        assert_eq!(bomb.state, BombState::Dead);
        assert!(bomb.detonate(&mut arena.hero, &mut arena.enemies, [], &arena.tuning.bomb, &mut arena.events).is_none());
    }

    #[test]
    fn test_hero_falloff_damage() {
        let mut arena = Arena::new();
        let i = arena.enemy(EnemyKind::Standard, Vec2::new(2.5, 0.0));
        let mut bomb = arena.enemies[i].bomb.take().unwrap();
        bomb.explosion_radius = 5.0;
        bomb.damage = 40.0;

        let report = bomb
            .detonate(&mut arena.hero, &mut arena.enemies, [], &arena.tuning.bomb, &mut arena.events)
            .unwrap();
        assert!((report.hero_damage - 20.0).abs() < 1e-4);
        assert!((arena.hero.hp - 80.0).abs() < 1e-4);
        assert!(arena.events.contains(&GameEvent::Sound(SoundEvent::Explode)));
        assert!(arena.events.iter().any(|e| matches!(e, GameEvent::Shake { .. })));
    }

    #[test]
    fn test_carrier_always_dies() {
        let mut arena = Arena::new();
        let i = arena.enemy(EnemyKind::Tank, Vec2::new(30.0, 0.0));
        let mut bomb = arena.enemies[i].bomb.take().unwrap();
        // Blast centered far away from the carrier
        bomb.body.pos = Vec2::new(-30.0, 0.0);
        let report = bomb
            .detonate(&mut arena.hero, &mut arena.enemies, [], &arena.tuning.bomb, &mut arena.events)
            .unwrap();
        assert!(!arena.enemies[i].body.alive);
        assert_eq!(report.kills, 1);
    }

    #[test]
    fn test_chain_reaction_defers() {
        let mut arena = Arena::new();
        let carrier = arena.enemy(EnemyKind::Standard, Vec2::new(10.0, 0.0));
        let shielded = arena.enemy(EnemyKind::Standard, Vec2::new(11.0, 0.0));
        let bare = arena.enemy(EnemyKind::Standard, Vec2::new(10.0, 1.0));
        arena.enemies[bare].shield = 0.0;
        let bare_hp = arena.enemies[bare].hp;

        let mut loose = Bomb::carried(arena.ids.next(), EntityId(999), Vec2::new(9.0, 0.0), &arena.tuning.bomb);
        loose.detach(&arena.tuning.bomb);

        let mut bomb = arena.enemies[carrier].bomb.take().unwrap();
        let report = bomb
            .detonate(
                &mut arena.hero,
                &mut arena.enemies,
                std::iter::once(&mut loose),
                &arena.tuning.bomb,
                &mut arena.events,
            )
            .unwrap();

        // Shield stripped, no hp lost, its bomb ignited but not exploded
        let neighbour = &arena.enemies[shielded];
        assert_eq!(neighbour.shield, 0.0);
        assert_eq!(neighbour.hp, neighbour.max_hp);
        let chained = neighbour.bomb.as_ref().unwrap();
        assert_eq!(chained.state, BombState::Armed);
        assert!(chained.timer <= arena.tuning.bomb.chain_fuse);

        // Unshielded neighbour takes falloff damage
        assert!(arena.enemies[bare].hp < bare_hp);

        // Loose bomb fuse cut, still live
        assert_eq!(loose.state, BombState::Detached);
        assert!(loose.timer <= arena.tuning.bomb.chain_fuse);
        assert_eq!(report.ignited, 3);
    }

    #[test]
    fn test_combo_event_on_multi_kill() {
        let mut arena = Arena::new();
        let carrier = arena.enemy(EnemyKind::Standard, Vec2::new(10.0, 0.0));
        let weak = arena.enemy(EnemyKind::Mini, Vec2::new(10.2, 0.0));
        arena.enemies[weak].shield = 0.0;
        let mut bomb = arena.enemies[carrier].bomb.take().unwrap();
        let report = bomb
            .detonate(&mut arena.hero, &mut arena.enemies, [], &arena.tuning.bomb, &mut arena.events)
            .unwrap();
        assert_eq!(report.kills, 2);
        assert!(arena.events.iter().any(|e| matches!(e, GameEvent::Combo { kills: 2, .. })));
    }

    #[test]
    fn test_falloff_at_half_radius() {
        assert!((falloff_damage(40.0, 5.0, 2.5) - 20.0).abs() < 1e-6);
        assert_eq!(falloff_damage(40.0, 5.0, 5.0), 0.0);
        assert_eq!(falloff_damage(40.0, 5.0, 0.0), 40.0);
    }

    proptest! {
        #[test]
        fn falloff_is_bounded(
            max in 0.0f32..500.0,
            radius in 0.01f32..50.0,
            dist in 0.0f32..100.0,
        ) {
            let damage = falloff_damage(max, radius, dist);
            prop_assert!(damage >= 0.0);
            prop_assert!(damage <= max);
            if dist >= radius {
                prop_assert_eq!(damage, 0.0);
            }
        }
    }
}
