//! The hero
//!
//! Movement, dash, blaster, push-back, regen, and armored damage intake.
//! Upgradable numbers live here rather than in [`Tuning`] so a restart is
//! just a fresh `Hero`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::push_out_of_obstacles;
use super::enemy::{Enemy, EnemyKind};
use super::entity::{Body, EntityId, IdGen, Obstacle};
use super::events::{GameEvent, SoundEvent};
use super::projectile::Bullet;
use super::tick::TickInput;
use crate::tuning::Tuning;

/// The enemy behind a killing blast, as it was at detonation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackerSnapshot {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub angle: f32,
}

impl AttackerSnapshot {
    pub fn of(enemy: &Enemy) -> Self {
        Self {
            id: enemy.id(),
            kind: enemy.kind,
            pos: enemy.body.pos,
            angle: enemy.angle,
        }
    }
}

/// Recorded when hp reaches zero, for the death screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeathCause {
    pub origin: Vec2,
    pub radius: f32,
    /// Bomb or hazard that dealt the blow
    pub bomb: EntityId,
    /// Bomb was lying on the ground rather than carried
    pub detached: bool,
    pub attacker: Option<AttackerSnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dash {
    pub active: bool,
    pub timer: f32,
    pub vector: Vec2,
    pub cooldown: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hero {
    pub body: Body,
    pub hp: f32,
    pub max_hp: f32,
    pub stamina: f32,
    pub max_stamina: f32,
    /// Seconds until stamina starts regenerating again
    pub stamina_delay: f32,
    /// HP per second
    pub hp_regen: f32,
    /// Fraction of damage removed
    pub armor: f32,

    pub ammo: u32,
    pub max_ammo: u32,
    /// Counting down while reloading
    pub reload_timer: f32,
    pub fire_timer: f32,
    pub fire_interval: f32,
    pub bullet_damage: f32,
    pub multishot: u32,

    pub dash: Dash,
    pub push_cooldown: f32,
    pub damage_flash: f32,
    flash_duration: f32,
    pub death_cause: Option<DeathCause>,
}

impl Hero {
    pub fn new(id: EntityId, pos: Vec2, tuning: &Tuning) -> Self {
        let hero = &tuning.hero;
        let blaster = &tuning.blaster;
        Self {
            body: Body::new(id, pos, hero.radius),
            hp: hero.base_hp,
            max_hp: hero.base_hp,
            stamina: hero.base_stamina,
            max_stamina: hero.base_stamina,
            stamina_delay: 0.0,
            hp_regen: hero.hp_regen,
            armor: hero.armor,
            ammo: blaster.magazine_size,
            max_ammo: blaster.magazine_size,
            reload_timer: 0.0,
            fire_timer: 0.0,
            fire_interval: blaster.fire_interval,
            bullet_damage: blaster.bullet_damage,
            multishot: blaster.multishot.max(1),
            dash: Dash::default(),
            push_cooldown: 0.0,
            damage_flash: 0.0,
            flash_duration: hero.damage_flash,
            death_cause: None,
        }
    }

    pub fn is_reloading(&self) -> bool {
        self.reload_timer > 0.0
    }

    /// Full heal and stamina refill (between waves)
    pub fn restore(&mut self) {
        self.hp = self.max_hp;
        self.stamina = self.max_stamina;
    }

    /// Apply armored damage; returns the damage actually taken.
    ///
    /// Records `cause` on the killing blow. No-op once dead.
    pub fn take_damage(&mut self, amount: f32, cause: Option<DeathCause>) -> f32 {
        if !self.body.alive || amount <= 0.0 {
            return 0.0;
        }
        let dealt = (amount * (1.0 - self.armor)).max(0.0);
        self.hp = (self.hp - dealt).max(0.0);
        self.damage_flash = self.flash_duration;

        if self.hp <= 0.0 {
            self.body.alive = false;
            self.death_cause = cause;
            log::info!("Hero killed ({:.1} damage)", dealt);
        }
        dealt
    }

    fn start_reload(&mut self, tuning: &Tuning, events: &mut Vec<GameEvent>) {
        self.reload_timer = tuning.blaster.reload_time;
        events.push(GameEvent::Sound(SoundEvent::Reload));
    }

    /// One frame of hero control. Only called while a wave is running.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        dt: f32,
        input: &TickInput,
        tuning: &Tuning,
        ids: &mut IdGen,
        bullets: &mut Vec<Bullet>,
        enemies: &mut [Enemy],
        obstacles: &[Obstacle],
        events: &mut Vec<GameEvent>,
    ) {
        if !self.body.alive {
            return;
        }

        // 1. Cooldowns
        self.dash.cooldown = (self.dash.cooldown - dt).max(0.0);
        self.fire_timer = (self.fire_timer - dt).max(0.0);
        self.push_cooldown = (self.push_cooldown - dt).max(0.0);
        self.damage_flash = (self.damage_flash - dt).max(0.0);
        if self.reload_timer > 0.0 {
            self.reload_timer = (self.reload_timer - dt).max(0.0);
            if self.reload_timer <= 0.0 {
                self.ammo = self.max_ammo;
            }
        }

        // 2. Dash in progress overrides everything else
        if self.dash.active {
            let dash = &tuning.abilities.dash;
            let speed = dash.distance / dash.duration.max(f32::EPSILON);
            self.body.pos += self.dash.vector * speed * dt;
            self.dash.timer -= dt;
            if self.dash.timer <= 0.0 {
                self.dash.active = false;
                self.stamina_delay = tuning.hero.stamina_regen_delay;
            }
            self.body.pos = push_out_of_obstacles(self.body.pos, self.body.radius, obstacles);
            return;
        }

        // 3. Push-back
        if input.push_pressed && self.push_cooldown <= 0.0 {
            self.push_back(enemies, tuning);
        }

        // 4. Manual reload
        if input.reload_pressed && !self.is_reloading() && self.ammo < self.max_ammo {
            self.start_reload(tuning, events);
        }

        // 5. Shooting
        if input.fire_held && self.fire_timer <= 0.0 && !self.is_reloading() && self.ammo > 0 {
            self.fire(input.aim, tuning, ids, bullets, events);
        }

        // 6. Movement / dash start
        let axis = input.move_axis;
        if axis != Vec2::ZERO {
            let dash = &tuning.abilities.dash;
            if input.dash_pressed && self.dash.cooldown <= 0.0 && self.stamina >= dash.stamina_cost {
                self.dash = Dash {
                    active: true,
                    timer: dash.duration,
                    vector: axis.normalize_or_zero(),
                    cooldown: dash.cooldown,
                };
                self.stamina -= dash.stamina_cost;
            } else {
                self.body.pos += axis * tuning.hero.move_speed * dt;
            }
        }

        // 7. Regen
        if !self.dash.active {
            if self.stamina_delay > 0.0 {
                self.stamina_delay = (self.stamina_delay - dt).max(0.0);
            } else {
                self.stamina =
                    (self.stamina + tuning.hero.stamina_regen * dt).min(self.max_stamina);
            }
        }
        self.hp = (self.hp + self.hp_regen * dt).min(self.max_hp);

        self.body.pos = push_out_of_obstacles(self.body.pos, self.body.radius, obstacles);
    }

    fn fire(
        &mut self,
        aim: Vec2,
        tuning: &Tuning,
        ids: &mut IdGen,
        bullets: &mut Vec<Bullet>,
        events: &mut Vec<GameEvent>,
    ) {
        let to_aim = aim - self.body.pos;
        if to_aim.length_squared() <= f32::EPSILON {
            return;
        }
        self.ammo -= 1;
        self.fire_timer = self.fire_interval;

        // Fan centered on the aim direction
        let base_angle = to_aim.y.atan2(to_aim.x);
        let count = self.multishot.max(1);
        let center = (count - 1) as f32 / 2.0;
        for i in 0..count {
            let angle = base_angle + (i as f32 - center) * tuning.blaster.spread;
            bullets.push(Bullet::new(
                ids.next(),
                self.body.pos,
                Vec2::from_angle(angle),
                self.bullet_damage,
                &tuning.blaster,
            ));
        }
        events.push(GameEvent::Sound(SoundEvent::Shoot));

        if self.ammo == 0 {
            self.start_reload(tuning, events);
        }
    }

    fn push_back(&mut self, enemies: &mut [Enemy], tuning: &Tuning) {
        let push = &tuning.abilities.push_back;
        self.push_cooldown = push.cooldown;

        let mut pushed = 0;
        for enemy in enemies.iter_mut().filter(|e| e.body.is_active()) {
            let away = enemy.body.pos - self.body.pos;
            if away.length() <= push.radius {
                let dir = away.try_normalize().unwrap_or(Vec2::X);
                enemy.body.pos += dir * push.distance;
                enemy.sync_bomb();
                pushed += 1;
            }
        }
        log::debug!("Push-back moved {} enemies", pushed);
    }
}
