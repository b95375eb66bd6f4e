//! Arena hazards
//!
//! Barrels stand in the arena and can be shot. A fuel barrel bursts into a
//! blast that arms every bomb around it and leaves a [`FireZone`] behind; a
//! cryo barrel freezes nearby enemies and stalls loose bombs.
//!
//! Barrels caught in a blast are primed, not burst on the spot: they go off
//! on their own update, the same way chained bombs do.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bomb::{Bomb, falloff_damage};
use super::enemy::Enemy;
use super::entity::{Body, EntityId};
use super::events::{GameEvent, SoundEvent};
use super::hero::{DeathCause, Hero};
use crate::tuning::{FireZoneTuning, HazardTuning, Tuning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarrelKind {
    Fuel,
    Cryo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarrelState {
    Intact,
    /// Caught in a blast, bursts when `timer` runs out
    Primed,
    /// Cryo shards still flying; no longer interactive
    Shattering,
    Spent,
}

/// What the owner should do after [`Barrel::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrelStep {
    Standing,
    /// Call [`Barrel::burst`] now
    Burst,
    /// Remove it
    Spent,
}

/// Summary of one barrel burst
#[derive(Debug, Clone, PartialEq)]
pub struct BurstReport {
    pub barrel: EntityId,
    pub kind: BarrelKind,
    pub center: Vec2,
    pub hero_damage: f32,
    /// Bombs armed, ignited or stalled
    pub bombs_affected: u32,
    pub enemies_frozen: u32,
    /// Spawn a fire zone at `center`
    pub leaves_fire: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Barrel {
    pub body: Body,
    pub kind: BarrelKind,
    pub hp: f32,
    pub max_hp: f32,
    pub state: BarrelState,
    /// Fuse while PRIMED, shard time while SHATTERING
    pub timer: f32,
    pub damage_flash: f32,
}

impl Barrel {
    pub fn new(id: EntityId, kind: BarrelKind, pos: Vec2, tuning: &HazardTuning) -> Self {
        let (radius, hp) = match kind {
            BarrelKind::Fuel => (tuning.fuel.radius, tuning.fuel.hp),
            BarrelKind::Cryo => (tuning.cryo.radius, tuning.cryo.hp),
        };
        Self {
            body: Body::new(id, pos, radius),
            kind,
            hp,
            max_hp: hp,
            state: BarrelState::Intact,
            timer: 0.0,
            damage_flash: 0.0,
        }
    }

    /// Can still be shot or primed
    pub fn is_standing(&self) -> bool {
        matches!(self.state, BarrelState::Intact | BarrelState::Primed)
    }

    /// Returns true when this hit breaks it. The burst happens on its update.
    pub fn take_damage(&mut self, amount: f32, flash: f32) -> bool {
        if !self.is_standing() || self.hp <= 0.0 || amount <= 0.0 {
            return false;
        }
        self.hp = (self.hp - amount).max(0.0);
        self.damage_flash = flash;
        self.hp <= 0.0
    }

    /// Set it to burst after `fuse` seconds (or sooner if already primed)
    pub fn prime(&mut self, fuse: f32) -> bool {
        match self.state {
            BarrelState::Intact => {
                self.state = BarrelState::Primed;
                self.timer = fuse.max(0.0);
                true
            }
            BarrelState::Primed => {
                self.timer = self.timer.min(fuse);
                true
            }
            BarrelState::Shattering | BarrelState::Spent => false,
        }
    }

    pub fn update(&mut self, dt: f32) -> BarrelStep {
        self.damage_flash = (self.damage_flash - dt).max(0.0);
        match self.state {
            BarrelState::Intact if self.hp <= 0.0 => BarrelStep::Burst,
            BarrelState::Intact => BarrelStep::Standing,
            BarrelState::Primed => {
                self.timer = (self.timer - dt).max(0.0);
                if self.timer <= 0.0 {
                    BarrelStep::Burst
                } else {
                    BarrelStep::Standing
                }
            }
            BarrelState::Shattering => {
                self.timer = (self.timer - dt).max(0.0);
                if self.timer <= 0.0 {
                    self.state = BarrelState::Spent;
                    self.body.alive = false;
                    BarrelStep::Spent
                } else {
                    BarrelStep::Standing
                }
            }
            BarrelState::Spent => BarrelStep::Spent,
        }
    }

    /// Apply the burst. Returns `None` if it already went off.
    ///
    /// `loose` is the global bomb pool; `others` is every other barrel.
    pub fn burst<'a, 'b>(
        &mut self,
        hero: &mut Hero,
        enemies: &mut [Enemy],
        loose: impl IntoIterator<Item = &'a mut Bomb>,
        others: impl IntoIterator<Item = &'b mut Barrel>,
        tuning: &Tuning,
        events: &mut Vec<GameEvent>,
    ) -> Option<BurstReport> {
        if !self.is_standing() {
            return None;
        }
        self.hp = 0.0;

        let report = match self.kind {
            BarrelKind::Fuel => self.burst_fuel(hero, enemies, loose, others, tuning, events),
            BarrelKind::Cryo => self.burst_cryo(enemies, loose, tuning, events),
        };
        log::debug!(
            "{:?} barrel {:?} burst: hero -{:.1}, bombs {}, frozen {}",
            self.kind,
            self.body.id,
            report.hero_damage,
            report.bombs_affected,
            report.enemies_frozen
        );
        Some(report)
    }

    fn burst_fuel<'a, 'b>(
        &mut self,
        hero: &mut Hero,
        enemies: &mut [Enemy],
        loose: impl IntoIterator<Item = &'a mut Bomb>,
        others: impl IntoIterator<Item = &'b mut Barrel>,
        tuning: &Tuning,
        events: &mut Vec<GameEvent>,
    ) -> BurstReport {
        let fuel = &tuning.hazards.fuel;
        self.state = BarrelState::Spent;
        self.body.alive = false;

        let center = self.body.pos;
        let radius = fuel.explosion_radius;
        let mut report = BurstReport {
            barrel: self.body.id,
            kind: BarrelKind::Fuel,
            center,
            hero_damage: 0.0,
            bombs_affected: 0,
            enemies_frozen: 0,
            leaves_fire: true,
        };

        if hero.body.alive {
            let raw = falloff_damage(fuel.damage, radius, center.distance(hero.body.pos));
            if raw > 0.0 {
                let cause = DeathCause {
                    origin: center,
                    radius,
                    bomb: self.body.id,
                    detached: false,
                    attacker: None,
                };
                report.hero_damage = hero.take_damage(raw, Some(cause));
                events.push(GameEvent::Sound(SoundEvent::Hit));
            }
        }

        for enemy in enemies.iter_mut().filter(|e| e.body.is_active()) {
            if center.distance(enemy.body.pos) >= radius {
                continue;
            }
            if let Some(bomb) = enemy.bomb.as_mut() {
                if bomb.arm(&tuning.bomb) {
                    report.bombs_affected += 1;
                }
            }
        }

        for bomb in loose {
            if bomb.is_counting_down()
                && center.distance(bomb.body.pos) < radius
                && bomb.ignite(fuel.bomb_fuse)
            {
                report.bombs_affected += 1;
            }
        }

        for other in others {
            if center.distance(other.body.pos) < radius {
                other.prime(fuel.chain_fuse);
            }
        }

        events.push(GameEvent::Sound(SoundEvent::Explode));
        events.push(GameEvent::Shake {
            intensity: fuel.shake_intensity,
            duration: fuel.shake_duration,
        });
        report
    }

    fn burst_cryo<'a>(
        &mut self,
        enemies: &mut [Enemy],
        loose: impl IntoIterator<Item = &'a mut Bomb>,
        tuning: &Tuning,
        events: &mut Vec<GameEvent>,
    ) -> BurstReport {
        let cryo = &tuning.hazards.cryo;
        self.state = BarrelState::Shattering;
        self.timer = cryo.shatter_duration;

        let center = self.body.pos;
        let radius = cryo.freeze_radius;
        let mut report = BurstReport {
            barrel: self.body.id,
            kind: BarrelKind::Cryo,
            center,
            hero_damage: 0.0,
            bombs_affected: 0,
            enemies_frozen: 0,
            leaves_fire: false,
        };

        for enemy in enemies.iter_mut().filter(|e| e.body.is_active()) {
            if center.distance(enemy.body.pos) < radius {
                enemy.freeze(cryo.freeze_duration);
                report.enemies_frozen += 1;
            }
        }

        // Loose bombs lose momentum
        for bomb in loose {
            if bomb.is_counting_down() && center.distance(bomb.body.pos) < radius {
                bomb.timer += cryo.bomb_delay;
                report.bombs_affected += 1;
            }
        }

        events.push(GameEvent::Sound(SoundEvent::Shatter));
        events.push(GameEvent::Shake {
            intensity: cryo.shake_intensity,
            duration: cryo.shake_duration,
        });
        report
    }
}

/// Burning ground left by a fuel barrel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireZone {
    pub body: Body,
    pub age: f32,
    pub duration: f32,
    /// Time since the last burn tick
    pub burn_timer: f32,
}

impl FireZone {
    pub fn new(id: EntityId, pos: Vec2, tuning: &FireZoneTuning) -> Self {
        Self {
            body: Body::new(id, pos, tuning.radius),
            age: 0.0,
            duration: tuning.duration,
            burn_timer: 0.0,
        }
    }

    /// Burn the hero on a fixed tick and arm every enemy bomb standing in
    /// the flames. Returns the damage the hero took this frame.
    pub fn update(&mut self, dt: f32, hero: &mut Hero, enemies: &mut [Enemy], tuning: &Tuning) -> f32 {
        if self.body.fading {
            self.body.fade(tuning.feel.enemy_fade_rate, dt);
            return 0.0;
        }

        self.age += dt;
        if self.age >= self.duration {
            self.body.alive = false;
            return 0.0;
        }

        let fire = &tuning.hazards.fire;
        let center = self.body.pos;
        let mut dealt = 0.0;
        self.burn_timer += dt;
        if self.burn_timer >= fire.tick_interval {
            self.burn_timer = 0.0;
            if hero.body.alive && center.distance(hero.body.pos) < self.body.radius {
                let cause = DeathCause {
                    origin: center,
                    radius: self.body.radius,
                    bomb: self.body.id,
                    detached: false,
                    attacker: None,
                };
                dealt = hero.take_damage(fire.burn_damage, Some(cause));
            }
        }

        for enemy in enemies.iter_mut().filter(|e| e.body.is_active()) {
            if center.distance(enemy.body.pos) < self.body.radius {
                if let Some(bomb) = enemy.bomb.as_mut() {
                    bomb.arm(&tuning.bomb);
                }
            }
        }
        dealt
    }
}
