//! Swarm Arena - wave-based arena survival simulation
//!
//! A hero fights swarms of bomb-carrying enemies across timed waves, collects
//! coins and spends them on upgrades between waves.
//!
//! Core modules:
//! - `sim`: the simulation engine (entities, bombs, waves, economy, frame loop)
//! - `tuning`: data-driven game balance
//!
//! The host owns rendering, audio, raw input and scheduling. It calls
//! [`sim::tick`] once per frame and drains [`sim::GameState::drain_events`].

pub mod sim;
pub mod tuning;

pub use tuning::{Tuning, TuningError};
