//! Blaster bullets

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::hits_obstacle;
use super::enemy::Enemy;
use super::entity::{Body, EntityId, Obstacle};
use super::hazard::Barrel;
use crate::tuning::BlasterTuning;

/// Result of advancing a bullet one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletStep {
    Flying,
    Expired,
    /// Index into the enemy slice that was hit
    HitEnemy(usize),
    /// Index into the barrel slice that was hit
    HitBarrel(usize),
    HitObstacle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub body: Body,
    pub vel: Vec2,
    pub damage: f32,
    pub age: f32,
    pub lifetime: f32,
}

impl Bullet {
    pub fn new(id: EntityId, pos: Vec2, dir: Vec2, damage: f32, tuning: &BlasterTuning) -> Self {
        Self {
            body: Body::new(id, pos, tuning.bullet_radius),
            vel: dir.normalize_or_zero() * tuning.bullet_speed,
            damage,
            age: 0.0,
            lifetime: tuning.bullet_range / tuning.bullet_speed.max(f32::EPSILON),
        }
    }

    pub fn update(
        &mut self,
        dt: f32,
        enemies: &[Enemy],
        barrels: &[Barrel],
        obstacles: &[Obstacle],
        fade_rate: f32,
    ) -> BulletStep {
        if self.body.fading {
            self.body.fade(fade_rate, dt);
            return BulletStep::Flying;
        }

        self.body.pos += self.vel * dt;
        self.age += dt;
        if self.age >= self.lifetime {
            return BulletStep::Expired;
        }

        if let Some(index) = enemies
            .iter()
            .position(|enemy| enemy.body.is_active() && enemy.body.overlaps(&self.body))
        {
            return BulletStep::HitEnemy(index);
        }
        if let Some(index) = barrels
            .iter()
            .position(|barrel| barrel.is_standing() && barrel.body.overlaps(&self.body))
        {
            return BulletStep::HitBarrel(index);
        }
        if hits_obstacle(self.body.pos, self.body.radius, obstacles) {
            return BulletStep::HitObstacle;
        }
        BulletStep::Flying
    }
}
