//! Simulation core
//!
//! All gameplay logic lives here. Nothing in this module renders, plays
//! audio or reads devices:
//! - Inputs arrive as a [`TickInput`] snapshot per frame
//! - Side effects leave as [`GameEvent`]s in `GameState::events`
//! - Randomness comes only from the seeded RNG in [`GameState`]

pub mod autopilot;
pub mod bomb;
pub mod collision;
pub mod combat;
pub mod economy;
pub mod enemy;
pub mod entity;
pub mod events;
pub mod hazard;
pub mod hero;
pub mod projectile;
pub mod state;
pub mod tick;
pub mod wave;

pub use autopilot::autopilot;
pub use bomb::{BlastReport, Bomb, BombState, BombStep, falloff_damage};
pub use combat::{DamageOutcome, apply_damage};
pub use economy::{Coin, Ledger, PurchaseOutcome, ShopOffer, UpgradeKind};
pub use enemy::{Enemy, EnemyKind};
pub use entity::{Body, EntityId, Obstacle};
pub use events::{GameEvent, SoundEvent};
pub use hazard::{Barrel, BarrelKind, BarrelState, FireZone};
pub use hero::{AttackerSnapshot, DeathCause, Hero};
pub use projectile::Bullet;
pub use state::GameState;
pub use tick::{FrameClock, TickInput, tick};
pub use wave::{WaveDirector, WaveState};
