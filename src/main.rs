//! Swarm Arena headless driver
//!
//! Runs an autopilot session at a simulated 60 Hz and logs what happened.
//!
//! ```text
//! swarm-arena [TUNING.json] [--seed N] [--minutes M]
//! ```

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use glam::Vec2;
    use serde::Serialize;

    use swarm_arena::Tuning;
    use swarm_arena::sim::{
        BarrelKind, FrameClock, GameEvent, GameState, Obstacle, SoundEvent, autopilot, tick,
    };

    const FRAME_MS: f64 = 1000.0 / 60.0;

    struct Args {
        tuning: Option<String>,
        seed: u64,
        minutes: f64,
    }

    fn parse_args() -> Result<Args, String> {
        let mut args = Args {
            tuning: None,
            seed: 0x5eed,
            minutes: 5.0,
        };
        let mut iter = std::env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--seed" => {
                    let value = iter.next().ok_or("--seed needs a value")?;
                    args.seed = value.parse().map_err(|e| format!("bad seed {value:?}: {e}"))?;
                }
                "--minutes" => {
                    let value = iter.next().ok_or("--minutes needs a value")?;
                    args.minutes = value
                        .parse()
                        .map_err(|e| format!("bad minutes {value:?}: {e}"))?;
                }
                path => args.tuning = Some(path.to_string()),
            }
        }
        Ok(args)
    }

    /// End-of-run report
    #[derive(Debug, Default, Serialize)]
    struct Summary {
        seed: u64,
        seconds: f32,
        wave: u32,
        score: u64,
        currency: u32,
        explosions: u32,
        freezes: u32,
        best_combo: u32,
        purchases: u32,
        hero_alive: bool,
    }

    /// A few rocks so obstacle handling gets exercised
    fn scatter_rocks() -> Vec<Obstacle> {
        (0..6)
            .map(|i| {
                let angle = i as f32 * std::f32::consts::TAU / 6.0;
                Obstacle::new(Vec2::from_angle(angle) * 9.0, 1.2)
            })
            .collect()
    }

    /// Barrels between the rocks, alternating fuel and cryo
    fn barrel_layout() -> Vec<(BarrelKind, Vec2)> {
        (0..4)
            .map(|i| {
                let angle = (i as f32 + 0.5) * std::f32::consts::TAU / 4.0;
                let kind = if i % 2 == 0 { BarrelKind::Fuel } else { BarrelKind::Cryo };
                (kind, Vec2::from_angle(angle) * 6.0)
            })
            .collect()
    }

    pub fn run() {
        env_logger::init();

        let args = match parse_args() {
            Ok(args) => args,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(2);
            }
        };

        let tuning = match &args.tuning {
            Some(path) => match Tuning::load(path) {
                Ok(tuning) => tuning,
                Err(e) => {
                    log::error!("{e}");
                    std::process::exit(1);
                }
            },
            None => Tuning::default(),
        };

        log::info!("Swarm Arena (headless) starting with seed {}", args.seed);
        let mut clock = FrameClock::new(tuning.feel.max_frame_dt);
        let mut state = GameState::new(args.seed, tuning)
            .with_obstacles(scatter_rocks())
            .with_barrels(barrel_layout());
        let mut summary = Summary {
            seed: args.seed,
            ..Default::default()
        };

        let frames = (args.minutes * 60.0 * 60.0) as u64;
        let mut now = 0.0;
        for _ in 0..frames {
            let dt = clock.delta(now);
            now += FRAME_MS;

            let input = autopilot(&state);
            tick(&mut state, &input, dt);

            for event in state.drain_events() {
                match event {
                    GameEvent::Sound(SoundEvent::Explode) => summary.explosions += 1,
                    GameEvent::Sound(SoundEvent::Shatter) => summary.freezes += 1,
                    GameEvent::Sound(SoundEvent::Purchase) => summary.purchases += 1,
                    GameEvent::Combo { kills, .. } => {
                        summary.best_combo = summary.best_combo.max(kills);
                    }
                    GameEvent::WaveCleared { wave } => {
                        log::info!("Cleared wave {} (score {})", wave, state.score);
                    }
                    _ => {}
                }
            }

            if state.is_game_over() && state.death_pause_timer <= 0.0 {
                if let Some(cause) = &state.hero.death_cause {
                    log::info!(
                        "Killed by a {} bomb at ({:.1}, {:.1})",
                        if cause.detached { "dropped" } else { "carried" },
                        cause.origin.x,
                        cause.origin.y
                    );
                }
                break;
            }
        }

        summary.seconds = state.time;
        summary.wave = state.director.wave;
        summary.score = state.score;
        summary.currency = state.ledger.currency;
        summary.hero_alive = !state.is_game_over();

        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Failed to write summary: {e}"),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    native::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web host drives `swarm_arena::sim::tick` directly
}
