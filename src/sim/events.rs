//! Requests emitted to the rendering and audio collaborators
//!
//! The simulation never plays sounds or shakes the camera itself. It pushes
//! [`GameEvent`]s into `GameState::events`; the host drains them once per
//! frame and forwards them. Nothing here is awaited or acknowledged.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Named sound triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundEvent {
    /// Blaster fired
    Shoot,
    /// Bomb or fuel barrel detonated
    Explode,
    /// Cryo barrel burst
    Shatter,
    /// Hero or enemy took damage
    Hit,
    /// Regular coin collected
    CoinPickup,
    /// Lucky coin collected
    Jackpot,
    /// Shop upgrade bought
    Purchase,
    /// Reload started
    Reload,
    /// Hero died
    Death,
}

/// Fire-and-forget notifications for collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Sound(SoundEvent),
    Shake { intensity: f32, duration: f32 },
    /// One detonation killed several enemies
    Combo { kills: u32, pos: Vec2 },
    WaveStarted { wave: u32 },
    WaveCleared { wave: u32 },
    ShopOpened { wave: u32 },
    HeroDied,
}
