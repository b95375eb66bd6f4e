//! Wave director
//!
//! ```text
//! READY --advance--> COUNTDOWN --timer--> WAVE --timer--> WAVE_COMPLETE
//!   --delay--> SHOP --advance--> COUNTDOWN ...
//! ```
//!
//! The director only decides *what* should happen; [`DirectorEvent`]s are
//! applied to the world by the simulation loop.

use glam::Vec2;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

use super::enemy::EnemyKind;
use crate::tuning::{Tuning, WaveTuning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveState {
    Ready,
    Countdown,
    Wave,
    WaveComplete,
    Shop,
}

/// Pending spawn marker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnTelegraph {
    pub pos: Vec2,
    pub kind: EnemyKind,
    pub timer: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DirectorEvent {
    CountdownStarted,
    WaveStarted(u32),
    /// A telegraph resolved into an enemy
    Spawn { kind: EnemyKind, pos: Vec2 },
    /// Wave timer ran out; transient entities should fade
    WaveEnded(u32),
    /// Settle delay done; clear the field and open the shop
    ShopOpened(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveDirector {
    pub state: WaveState,
    /// Current (or last finished) wave, 0 before the first
    pub wave: u32,
    pub timer: f32,
    pub spawn_timer: f32,
    pub telegraphs: Vec<SpawnTelegraph>,
}

impl Default for WaveDirector {
    fn default() -> Self {
        Self {
            state: WaveState::Ready,
            wave: 0,
            timer: 0.0,
            spawn_timer: 0.0,
            telegraphs: Vec::new(),
        }
    }
}

impl WaveDirector {
    /// External "go" from READY or SHOP. Ignored in any other phase.
    pub fn advance_phase(&mut self, tuning: &WaveTuning) -> Option<DirectorEvent> {
        match self.state {
            WaveState::Ready | WaveState::Shop => {
                self.state = WaveState::Countdown;
                self.timer = tuning.countdown;
                log::info!("Countdown to wave {}", self.wave + 1);
                Some(DirectorEvent::CountdownStarted)
            }
            _ => None,
        }
    }

    pub fn is_wave_active(&self) -> bool {
        self.state == WaveState::Wave
    }

    /// Seconds left in the current phase
    pub fn time_remaining(&self) -> f32 {
        self.timer.max(0.0)
    }

    /// Advance timers. `enemy_count` is the number of live enemies on the
    /// field, used against the per-wave cap.
    pub fn update(
        &mut self,
        dt: f32,
        enemy_count: usize,
        hero_pos: Vec2,
        rng: &mut impl Rng,
        tuning: &Tuning,
    ) -> Vec<DirectorEvent> {
        let waves = &tuning.waves;
        let mut events = Vec::new();

        match self.state {
            WaveState::Ready | WaveState::Shop => {}
            WaveState::Countdown => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    self.wave += 1;
                    self.state = WaveState::Wave;
                    self.timer = wave_duration(self.wave, waves);
                    self.spawn_timer = 0.0;
                    log::info!("Wave {} started ({:.0}s)", self.wave, self.timer);
                    events.push(DirectorEvent::WaveStarted(self.wave));
                }
            }
            WaveState::Wave => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    self.state = WaveState::WaveComplete;
                    self.timer = waves.complete_delay;
                    if !self.telegraphs.is_empty() {
                        log::debug!("Discarding {} pending telegraphs", self.telegraphs.len());
                    }
                    self.telegraphs.clear();
                    log::info!("Wave {} complete", self.wave);
                    events.push(DirectorEvent::WaveEnded(self.wave));
                    return events;
                }

                // Resolve telegraphs that finished their anticipation
                self.telegraphs.retain_mut(|telegraph| {
                    telegraph.timer -= dt;
                    if telegraph.timer <= 0.0 {
                        events.push(DirectorEvent::Spawn {
                            kind: telegraph.kind,
                            pos: telegraph.pos,
                        });
                        false
                    } else {
                        true
                    }
                });

                self.spawn_timer -= dt;
                if self.spawn_timer <= 0.0 {
                    self.spawn_timer = spawn_interval(self.wave, waves);
                    let pending = enemy_count + self.telegraphs.len();
                    if pending < enemy_cap(self.wave, waves) as usize {
                        if let Some(kind) = pick_kind(self.wave, rng, waves) {
                            let pos = spawn_position(hero_pos, rng, waves);
                            self.telegraphs.push(SpawnTelegraph {
                                pos,
                                kind,
                                timer: waves.telegraph_delay,
                            });
                        }
                    }
                }
            }
            WaveState::WaveComplete => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    self.state = WaveState::Shop;
                    self.timer = 0.0;
                    events.push(DirectorEvent::ShopOpened(self.wave));
                }
            }
        }

        events
    }
}

/// Seconds between telegraphs. Gentle linear ramp first, then geometric decay.
pub fn spawn_interval(wave: u32, tuning: &WaveTuning) -> f32 {
    let wave = wave.max(1);
    let gentle = tuning.gentle_waves.max(1);
    let interval = if wave <= gentle {
        tuning.spawn_interval_base - tuning.spawn_interval_gentle_step * (wave - 1) as f32
    } else {
        let gentle_end =
            tuning.spawn_interval_base - tuning.spawn_interval_gentle_step * (gentle - 1) as f32;
        gentle_end * tuning.spawn_interval_steep_decay.powi((wave - gentle) as i32)
    };
    interval.max(tuning.spawn_interval_min)
}

/// Maximum enemies on the field (live + telegraphed)
pub fn enemy_cap(wave: u32, tuning: &WaveTuning) -> u32 {
    let wave = wave.max(1);
    let gentle = tuning.gentle_waves.max(1);
    let cap = if wave <= gentle {
        tuning.enemy_cap_base + tuning.enemy_cap_gentle_step * (wave - 1)
    } else {
        tuning.enemy_cap_base
            + tuning.enemy_cap_gentle_step * (gentle - 1)
            + tuning.enemy_cap_steep_step * (wave - gentle)
    };
    cap.min(tuning.enemy_cap_max)
}

pub fn wave_duration(wave: u32, tuning: &WaveTuning) -> f32 {
    tuning.base_duration + tuning.duration_growth * wave.saturating_sub(1) as f32
}

pub fn hp_multiplier(wave: u32, tuning: &WaveTuning) -> f32 {
    tuning.hp_growth.powi(wave.saturating_sub(1) as i32)
}

pub fn shield_multiplier(wave: u32, tuning: &WaveTuning) -> f32 {
    tuning.shield_growth.powi(wave.saturating_sub(1) as i32)
}

/// Weighted roll over the kinds unlocked by `wave`
pub fn pick_kind(wave: u32, rng: &mut impl Rng, tuning: &WaveTuning) -> Option<EnemyKind> {
    let unlocked: Vec<_> = tuning
        .roster
        .iter()
        .filter(|entry| entry.unlock_wave <= wave.max(1) && entry.weight > 0)
        .collect();
    let weights = WeightedIndex::new(unlocked.iter().map(|entry| entry.weight)).ok()?;
    Some(unlocked[weights.sample(rng)].kind)
}

/// Random point on a ring around the hero
fn spawn_position(hero_pos: Vec2, rng: &mut impl Rng, tuning: &WaveTuning) -> Vec2 {
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    let distance = if tuning.spawn_max_distance > tuning.spawn_min_distance {
        rng.random_range(tuning.spawn_min_distance..tuning.spawn_max_distance)
    } else {
        tuning.spawn_min_distance
    };
    hero_pos + Vec2::from_angle(angle) * distance
}
