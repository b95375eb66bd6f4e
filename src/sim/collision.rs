//! Circle collision helpers
//!
//! Everything in the arena is a circle, so collision is distance checks plus
//! a push-out along the center line.

use glam::Vec2;

use super::entity::Obstacle;

/// Step from `from` toward `to` by at most `max_step`, never overshooting
pub fn move_toward(from: Vec2, to: Vec2, max_step: f32) -> Vec2 {
    let delta = to - from;
    let dist = delta.length();
    if dist <= max_step || dist <= f32::EPSILON {
        to
    } else {
        from + delta / dist * max_step
    }
}

/// Resolve overlap with every obstacle, in order
pub fn push_out_of_obstacles(pos: Vec2, radius: f32, obstacles: &[Obstacle]) -> Vec2 {
    obstacles
        .iter()
        .fold(pos, |pos, obstacle| obstacle.push_out(pos, radius))
}

pub fn hits_obstacle(pos: Vec2, radius: f32, obstacles: &[Obstacle]) -> bool {
    obstacles.iter().any(|obstacle| obstacle.contains(pos, radius))
}

/// Sum of unit directions away from every neighbour closer than `range`
pub fn separation_push(pos: Vec2, range: f32, neighbours: impl IntoIterator<Item = Vec2>) -> Vec2 {
    let mut push = Vec2::ZERO;
    for other in neighbours {
        let away = pos - other;
        let dist = away.length();
        if dist < range && dist > 0.01 {
            push += away / dist;
        }
    }
    push
}
