//! Enemies
//!
//! One record for every subtype. The [`EnemyKind`] tag picks the stat
//! profile from [`EnemyTuning`] and switches the few behaviours that differ
//! (blinking, splitting on death, pre-armed bombs).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bomb::{Bomb, BombState};
use super::collision::{move_toward, separation_push};
use super::entity::{Body, EntityId, IdGen};
use super::wave::{hp_multiplier, shield_multiplier};
use crate::tuning::{EnemyTuning, Tuning};

/// Enemy subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Standard,
    Fast,
    Tank,
    Blinker,
    Splitter,
    /// Spawned by a splitter, never by the wave roster
    Mini,
}

/// What happens at the moment an enemy dies, besides score and coins
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeathEffect {
    None,
    Split { count: u32, offset: f32 },
}

impl EnemyKind {
    pub fn on_death(self, tuning: &EnemyTuning) -> DeathEffect {
        match self {
            EnemyKind::Splitter => DeathEffect::Split {
                count: tuning.split_count,
                offset: tuning.split_offset,
            },
            _ => DeathEffect::None,
        }
    }

    pub fn blinks(self) -> bool {
        self == EnemyKind::Blinker
    }
}

/// An enemy and the bomb it carries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub body: Body,
    pub kind: EnemyKind,
    pub hp: f32,
    pub max_hp: f32,
    pub shield: f32,
    pub max_shield: f32,
    pub walk_speed: f32,
    pub charge_speed: f32,
    /// Exclusively owned; `None` once detonated or detached
    pub bomb: Option<Bomb>,
    /// Facing angle toward the hero (radians)
    pub angle: f32,
    pub blink_timer: f32,
    /// Held in place while positive
    pub freeze_timer: f32,
    /// Score, coins and on-death effects have been applied
    pub death_handled: bool,
}

impl Enemy {
    /// Build an enemy of `kind` at `pos`, scaled for `wave`
    pub fn spawn(ids: &mut IdGen, kind: EnemyKind, pos: Vec2, wave: u32, tuning: &Tuning) -> Self {
        Self::spawn_scaled(
            ids,
            kind,
            pos,
            hp_multiplier(wave, &tuning.waves),
            shield_multiplier(wave, &tuning.waves),
            tuning,
        )
    }

    /// Build an enemy with explicit hp/shield multipliers
    pub fn spawn_scaled(
        ids: &mut IdGen,
        kind: EnemyKind,
        pos: Vec2,
        hp_mult: f32,
        shield_mult: f32,
        tuning: &Tuning,
    ) -> Self {
        let profile = tuning.enemies.profile(kind);
        let id = ids.next();

        let mut bomb = Bomb::carried(ids.next(), id, pos, &tuning.bomb);
        if let Some(damage) = profile.bomb_damage {
            bomb.damage = damage;
        }
        if let Some(radius) = profile.bomb_radius {
            bomb.explosion_radius = radius;
        }
        if let Some(fuse) = profile.armed_fuse {
            bomb.arm_with_fuse(fuse);
        }

        let max_hp = profile.hp * hp_mult;
        let max_shield = profile.shield * shield_mult;
        Self {
            body: Body::new(id, pos, profile.radius),
            kind,
            hp: max_hp,
            max_hp,
            shield: max_shield,
            max_shield,
            walk_speed: profile.walk_speed,
            charge_speed: profile.charge_speed,
            bomb: Some(bomb),
            angle: 0.0,
            blink_timer: tuning.enemies.blink_cooldown,
            freeze_timer: 0.0,
            death_handled: false,
        }
    }

    pub fn id(&self) -> EntityId {
        self.body.id
    }

    /// Carrying a bomb whose countdown is running
    pub fn is_charging(&self) -> bool {
        self.bomb
            .as_ref()
            .is_some_and(|bomb| bomb.state == BombState::Armed)
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze_timer > 0.0
    }

    /// Stop moving and blinking for `duration` (never shortens a freeze)
    pub fn freeze(&mut self, duration: f32) {
        self.freeze_timer = self.freeze_timer.max(duration);
    }

    /// Chase the hero, keep apart from neighbours, blink if able
    pub fn update(&mut self, dt: f32, hero_pos: Vec2, separation: Vec2, tuning: &EnemyTuning, fade_rate: f32) {
        if self.body.fading {
            self.body.fade(fade_rate, dt);
            return;
        }
        if !self.body.alive {
            return;
        }
        if self.is_frozen() {
            self.freeze_timer = (self.freeze_timer - dt).max(0.0);
            return;
        }

        let to_hero = hero_pos - self.body.pos;
        let dist = to_hero.length();
        self.angle = to_hero.y.atan2(to_hero.x);

        if dist > 0.1 {
            let speed = if self.is_charging() {
                self.charge_speed
            } else {
                self.walk_speed
            };
            self.body.pos = move_toward(self.body.pos, hero_pos, speed * dt);
            self.body.pos += separation * self.walk_speed * tuning.separation * dt;
        }

        if self.kind.blinks() {
            self.blink_timer -= dt;
            if self.blink_timer <= 0.0 {
                // Never blink past the hero
                let hop = tuning.blink_distance.min((dist - self.body.radius).max(0.0));
                self.body.pos = move_toward(self.body.pos, hero_pos, hop);
                self.blink_timer = if self.is_charging() {
                    tuning.blink_cooldown_armed
                } else {
                    tuning.blink_cooldown
                };
                log::debug!("Blinker {:?} blinked {:.1}", self.body.id, hop);
            }
        }
    }

    /// Keep the carried bomb glued to the carrier
    pub fn sync_bomb(&mut self) {
        let pos = self.body.pos;
        if let Some(bomb) = self.bomb.as_mut() {
            bomb.body.pos = pos;
        }
    }
}

/// Soft push away from overlapping enemies (unit-ish direction, not scaled by dt)
pub fn separation(enemies: &[Enemy], index: usize) -> Vec2 {
    let Some(me) = enemies.get(index) else {
        return Vec2::ZERO;
    };
    let neighbours = enemies
        .iter()
        .enumerate()
        .filter(|(i, other)| *i != index && other.body.is_active())
        .map(|(_, other)| other.body.pos);
    separation_push(me.body.pos, me.body.radius * 2.0, neighbours)
}
