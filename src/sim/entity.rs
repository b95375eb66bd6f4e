//! Shared entity attributes
//!
//! Every simulated object (hero, enemies, bombs, bullets, coins) carries a
//! [`Body`]: where it is, how big it is, and where it is in its lifecycle.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Identity token, unique within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Hands out entity IDs in spawn order
#[derive(Debug, Clone)]
pub struct IdGen {
    next: u32,
}

impl Default for IdGen {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdGen {
    pub fn next(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

/// Position, collision radius and lifecycle flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: EntityId,
    pub pos: Vec2,
    pub radius: f32,
    pub alive: bool,
    /// Set when the round ends; the entity only fades from then on
    pub fading: bool,
    /// 1.0 = fully visible
    pub opacity: f32,
}

impl Body {
    pub fn new(id: EntityId, pos: Vec2, radius: f32) -> Self {
        Self {
            id,
            pos,
            radius,
            alive: true,
            fading: false,
            opacity: 1.0,
        }
    }

    pub fn distance_to(&self, other: &Body) -> f32 {
        self.pos.distance(other.pos)
    }

    /// Circles overlap (touching counts as no overlap)
    pub fn overlaps(&self, other: &Body) -> bool {
        self.distance_to(other) < self.radius + other.radius
    }

    pub fn begin_fade(&mut self) {
        self.fading = true;
    }

    /// Decay opacity while fading, clamped at zero
    pub fn fade(&mut self, rate: f32, dt: f32) {
        if self.fading {
            self.opacity = (self.opacity - rate * dt).max(0.0);
        }
    }

    /// Still taking part in gameplay (not dead, not fading out)
    pub fn is_active(&self) -> bool {
        self.alive && !self.fading
    }
}

/// Static circular obstacle supplied by the host's terrain layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Obstacle {
    pub pos: Vec2,
    pub radius: f32,
}

impl Obstacle {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self { pos, radius }
    }

    pub fn contains(&self, point: Vec2, margin: f32) -> bool {
        self.pos.distance(point) < self.radius + margin
    }

    /// Move a circle out of this obstacle along the center line
    pub fn push_out(&self, pos: Vec2, radius: f32) -> Vec2 {
        let offset = pos - self.pos;
        let dist = offset.length();
        let min_dist = self.radius + radius;
        if dist >= min_dist {
            return pos;
        }
        // Centers coincide: pick a fixed direction
        let dir = if dist > 1e-4 { offset / dist } else { Vec2::X };
        self.pos + dir * min_dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_clamps_at_zero() {
        let mut body = Body::new(EntityId(1), Vec2::ZERO, 0.5);
        body.fade(10.0, 1.0);
        assert_eq!(body.opacity, 1.0, "not fading yet");

        body.begin_fade();
        body.fade(10.0, 1.0);
        assert_eq!(body.opacity, 0.0);
        assert!(!body.is_active());
    }

    #[test]
    fn test_obstacle_push_out() {
        let rock = Obstacle::new(Vec2::ZERO, 1.0);
        let pushed = rock.push_out(Vec2::new(0.5, 0.0), 0.5);
        assert!((pushed.x - 1.5).abs() < 1e-5);

        // Already clear: unchanged
        let clear = Vec2::new(3.0, 0.0);
        assert_eq!(rock.push_out(clear, 0.5), clear);
    }
}
