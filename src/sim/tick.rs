//! Per-frame simulation loop
//!
//! One call to [`tick`] advances the world by one variable frame delta:
//! pause, time-dilation gates, then Hero -> Wave Director -> Enemies (and
//! their bombs) -> pooled bombs -> bullets -> hazards -> coins, then reaping.
//!
//! Pools are walked in reverse so the current element can be removed
//! without skipping anything. Entities appended mid-pass (splitter minis,
//! newly detached bombs) land past the cursor and wait for the next frame.

use glam::Vec2;

use super::bomb::{BlastReport, BombState, BombStep};
use super::collision::push_out_of_obstacles;
use super::combat::{self, DamageOutcome};
use super::enemy::separation;
use super::events::{GameEvent, SoundEvent};
use super::hazard::{BarrelStep, FireZone};
use super::projectile::BulletStep;
use super::state::GameState;
use super::wave::DirectorEvent;

/// Input intents for one frame, already normalized by the host
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement axis, length <= 1
    pub move_axis: Vec2,
    /// Aim target in world space
    pub aim: Vec2,
    pub fire_held: bool,
    pub dash_pressed: bool,
    pub reload_pressed: bool,
    pub push_pressed: bool,
    pub pause_pressed: bool,
    /// Leave READY/SHOP
    pub advance_pressed: bool,
    /// Start over after death
    pub restart_pressed: bool,
    /// Shop offer to buy
    pub purchase: Option<usize>,
}

/// Turns host timestamps into frame deltas
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_ms: Option<f64>,
    max_dt: f32,
}

impl FrameClock {
    pub fn new(max_dt: f32) -> Self {
        Self { last_ms: None, max_dt }
    }

    /// Seconds since the previous call (0 on the first), clamped
    pub fn delta(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        clamp_dt(dt, self.max_dt)
    }
}

/// Negative, NaN and infinite deltas become 0; long stalls are capped
pub fn clamp_dt(dt: f32, max_dt: f32) -> f32 {
    if !dt.is_finite() || dt <= 0.0 {
        0.0
    } else {
        dt.min(max_dt)
    }
}

/// Advance the game by `frame_dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, frame_dt: f32) {
    if input.pause_pressed && !state.is_game_over() {
        state.paused = !state.paused;
        log::info!("{}", if state.paused { "Paused" } else { "Resumed" });
    }
    if state.paused {
        return;
    }

    let dt = clamp_dt(frame_dt, state.tuning.feel.max_frame_dt);
    state.time += dt;
    state.death_highlight_timer = (state.death_highlight_timer - dt).max(0.0);

    // Gates, highest priority first
    if state.hitstop_timer > 0.0 {
        state.hitstop_timer = (state.hitstop_timer - dt).max(0.0);
        return;
    }
    if state.death_pause_timer > 0.0 {
        state.death_pause_timer = (state.death_pause_timer - dt).max(0.0);
        settle_explosions(state, dt);
        return;
    }
    if state.is_game_over() {
        if input.restart_pressed {
            state.restart();
        } else {
            settle_explosions(state, dt);
        }
        return;
    }

    // Between waves: shop and phase control
    state.ledger.tick_cooldown(dt);
    if let Some(index) = input.purchase {
        state.purchase(index);
    }
    if input.advance_pressed {
        state.advance_phase();
    }

    // Hero
    if state.round_active() {
        state.hero.update(
            dt,
            input,
            &state.tuning,
            &mut state.ids,
            &mut state.bullets,
            &mut state.enemies,
            &state.obstacles,
            &mut state.events,
        );
    }

    // Wave director
    let live = state.live_enemy_count();
    let hero_pos = state.hero.body.pos;
    let directives = state
        .director
        .update(dt, live, hero_pos, &mut state.rng, &state.tuning);
    for directive in directives {
        apply_directive(state, directive);
    }

    let round_active = state.round_active();
    update_enemies(state, dt, round_active);
    update_bombs(state, dt, round_active);
    update_bullets(state, dt);
    update_hazards(state, dt, round_active);
    update_coins(state, dt);
    reap(state);
}

fn apply_directive(state: &mut GameState, directive: DirectorEvent) {
    match directive {
        DirectorEvent::CountdownStarted => {}
        DirectorEvent::WaveStarted(wave) => state.events.push(GameEvent::WaveStarted { wave }),
        DirectorEvent::Spawn { kind, pos } => state.spawn_enemy(kind, pos),
        DirectorEvent::WaveEnded(wave) => {
            state.begin_round_fade();
            state.events.push(GameEvent::WaveCleared { wave });
        }
        DirectorEvent::ShopOpened(wave) => state.open_shop(wave),
    }
}

fn update_enemies(state: &mut GameState, dt: f32, round_active: bool) {
    let mut i = state.enemies.len();
    while i > 0 {
        i -= 1;

        let hero_pos = state.hero.body.pos;
        let push = separation(&state.enemies, i);
        let enemy = &mut state.enemies[i];
        enemy.update(
            dt,
            hero_pos,
            push,
            &state.tuning.enemies,
            state.tuning.feel.enemy_fade_rate,
        );
        if enemy.body.is_active() {
            enemy.body.pos = push_out_of_obstacles(enemy.body.pos, enemy.body.radius, &state.obstacles);
        }
        enemy.sync_bomb();

        // The carried bomb is taken out for its update so the detonation
        // pass can borrow every enemy, the carrier included.
        if let Some(mut bomb) = state.enemies[i].bomb.take() {
            let step = bomb.update(
                dt,
                &state.hero,
                Some(&state.enemies[i]),
                round_active,
                &state.tuning.bomb,
            );
            match step {
                BombStep::Ticking => state.enemies[i].bomb = Some(bomb),
                BombStep::Detonate => {
                    let report = bomb.detonate(
                        &mut state.hero,
                        &mut state.enemies,
                        state.bombs.iter_mut(),
                        &state.tuning.bomb,
                        &mut state.events,
                    );
                    // Settles in the pool
                    state.bombs.push(bomb);
                    if let Some(report) = report {
                        after_blast(state, &report);
                    }
                }
                BombStep::Cancelled | BombStep::Settled => {}
            }
        }

        if !state.enemies[i].body.alive {
            combat::resolve_deaths(state);
            state.enemies.remove(i);
        }
    }
}

fn update_bombs(state: &mut GameState, dt: f32, round_active: bool) {
    let mut i = state.bombs.len();
    while i > 0 {
        i -= 1;
        let step = state.bombs[i].update(dt, &state.hero, None, round_active, &state.tuning.bomb);
        match step {
            BombStep::Ticking => {}
            BombStep::Detonate => {
                let (before, rest) = state.bombs.split_at_mut(i);
                let Some((bomb, after)) = rest.split_first_mut() else {
                    continue;
                };
                let report = bomb.detonate(
                    &mut state.hero,
                    &mut state.enemies,
                    before.iter_mut().chain(after.iter_mut()),
                    &state.tuning.bomb,
                    &mut state.events,
                );
                if let Some(report) = report {
                    after_blast(state, &report);
                }
            }
            BombStep::Cancelled | BombStep::Settled => {
                state.bombs.swap_remove(i);
            }
        }
    }
}

fn after_blast(state: &mut GameState, report: &BlastReport) {
    if report.kills > 0 {
        combat::resolve_deaths(state);
    }
    if report.hero_damage > 0.0 {
        state.hitstop_timer = state.tuning.feel.hit_stop;
    }
    for barrel in &mut state.barrels {
        if barrel.body.pos.distance(report.center) < report.radius {
            barrel.prime(state.tuning.bomb.chain_fuse);
        }
    }
    state.check_hero_death();
}

fn update_bullets(state: &mut GameState, dt: f32) {
    let fade_rate = state.tuning.feel.enemy_fade_rate;
    let mut i = state.bullets.len();
    while i > 0 {
        i -= 1;
        let step = state.bullets[i].update(
            dt,
            &state.enemies,
            &state.barrels,
            &state.obstacles,
            fade_rate,
        );
        match step {
            BulletStep::Flying => {}
            BulletStep::Expired | BulletStep::HitObstacle => {
                state.bullets.swap_remove(i);
            }
            BulletStep::HitEnemy(index) => {
                let bullet = state.bullets.swap_remove(i);
                let outcome = combat::apply_damage(&mut state.enemies[index], bullet.damage);
                if outcome != DamageOutcome::Ignored {
                    state.events.push(GameEvent::Sound(SoundEvent::Hit));
                }
                if outcome == DamageOutcome::Killed {
                    combat::resolve_deaths(state);
                }
            }
            BulletStep::HitBarrel(index) => {
                let bullet = state.bullets.swap_remove(i);
                let flash = state.tuning.hazards.damage_flash;
                state.barrels[index].take_damage(bullet.damage, flash);
                state.events.push(GameEvent::Sound(SoundEvent::Hit));
            }
        }
    }
}

/// Barrels burst only while a wave runs; fire zones fade with the round
fn update_hazards(state: &mut GameState, dt: f32, round_active: bool) {
    if round_active {
        let mut i = state.barrels.len();
        while i > 0 {
            i -= 1;
            match state.barrels[i].update(dt) {
                BarrelStep::Standing => {}
                BarrelStep::Burst => {
                    let (before, rest) = state.barrels.split_at_mut(i);
                    let Some((barrel, after)) = rest.split_first_mut() else {
                        continue;
                    };
                    let report = barrel.burst(
                        &mut state.hero,
                        &mut state.enemies,
                        state.bombs.iter_mut(),
                        before.iter_mut().chain(after.iter_mut()),
                        &state.tuning,
                        &mut state.events,
                    );
                    let Some(report) = report else {
                        continue;
                    };
                    if report.leaves_fire {
                        let id = state.ids.next();
                        state
                            .fire_zones
                            .push(FireZone::new(id, report.center, &state.tuning.hazards.fire));
                    }
                    if report.hero_damage > 0.0 {
                        state.hitstop_timer = state.tuning.feel.hit_stop;
                    }
                    state.check_hero_death();
                }
                BarrelStep::Spent => {
                    state.barrels.swap_remove(i);
                }
            }
        }
    }

    let mut i = state.fire_zones.len();
    while i > 0 {
        i -= 1;
        state.fire_zones[i].update(dt, &mut state.hero, &mut state.enemies, &state.tuning);
        if !state.fire_zones[i].body.alive {
            state.fire_zones.swap_remove(i);
        }
    }
    state.check_hero_death();
}

fn update_coins(state: &mut GameState, dt: f32) {
    if !state.hero.body.alive {
        return;
    }
    let hero_pos = state.hero.body.pos;
    let mut i = state.coins.len();
    while i > 0 {
        i -= 1;
        if state.coins[i].update(dt, hero_pos, &state.tuning.economy) {
            let coin = state.coins.swap_remove(i);
            state.collect_coin(&coin);
        }
    }
}

/// Despawn stragglers and drop the dead
fn reap(state: &mut GameState) {
    let hero_pos = state.hero.body.pos;
    let limit = state.tuning.feel.despawn_distance;

    for enemy in &mut state.enemies {
        if enemy.body.alive && enemy.body.pos.distance(hero_pos) > limit {
            // Strays leave without a reward
            enemy.body.alive = false;
            enemy.death_handled = true;
            log::debug!("Despawned {:?} (too far)", enemy.body.id);
        }
    }
    combat::resolve_deaths(state);

    state.enemies.retain(|enemy| enemy.body.alive);
    state.coins.retain(|coin| coin.body.pos.distance(hero_pos) <= limit);
    state.bullets.retain(|bullet| bullet.body.pos.distance(hero_pos) <= limit);
}

/// Death-pause update: only blasts already in flight keep settling
fn settle_explosions(state: &mut GameState, dt: f32) {
    for bomb in state
        .bombs
        .iter_mut()
        .filter(|bomb| bomb.state == BombState::Exploding)
    {
        bomb.update(dt, &state.hero, None, false, &state.tuning.bomb);
    }
    state.bombs.retain(|bomb| bomb.state != BombState::Dead);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::bomb::Bomb;
    use crate::sim::economy::Coin;
    use crate::sim::enemy::EnemyKind;
    use crate::sim::entity::{Body, EntityId};
    use crate::sim::hazard::BarrelKind;
    use crate::sim::wave::WaveState;
    use crate::tuning::Tuning;

    const DT: f32 = 1.0 / 60.0;

    fn advance() -> TickInput {
        TickInput {
            advance_pressed: true,
            ..Default::default()
        }
    }

    /// Run until the director reaches `target`
    fn run_until(state: &mut GameState, target: WaveState) {
        for _ in 0..100_000 {
            if state.phase() == target {
                return;
            }
            tick(state, &TickInput::default(), DT);
        }
        panic!("never reached {target:?}");
    }

    /// Mid-wave with the director's spawning held off
    fn in_wave(mut state: GameState) -> GameState {
        tick(&mut state, &advance(), DT);
        run_until(&mut state, WaveState::Wave);
        state.director.telegraphs.clear();
        state.director.spawn_timer = 100.0;
        state.drain_events();
        state
    }

    #[test]
    fn test_ready_to_wave() {
        let mut state = GameState::new(12345, Tuning::default());
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase(), WaveState::Ready);

        tick(&mut state, &advance(), DT);
        assert_eq!(state.phase(), WaveState::Countdown);

        run_until(&mut state, WaveState::Wave);
        assert_eq!(state.director.wave, 1);
        assert!(state.drain_events().contains(&GameEvent::WaveStarted { wave: 1 }));
    }

    #[test]
    fn test_tick_pause() {
        let mut state = GameState::new(12345, Tuning::default());
        tick(&mut state, &advance(), DT);
        let timer = state.director.timer;

        let pause = TickInput {
            pause_pressed: true,
            ..Default::default()
        };
        tick(&mut state, &pause, DT);
        assert!(state.paused);
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.director.timer, timer);

        tick(&mut state, &pause, DT);
        assert!(!state.paused);
        assert!(state.director.timer < timer);
    }

    #[test]
    fn test_frame_clock_clamps() {
        let mut clock = FrameClock::new(0.1);
        assert_eq!(clock.delta(1000.0), 0.0);
        assert!((clock.delta(1016.0) - 0.016).abs() < 1e-6);
        // Tab stall
        assert_eq!(clock.delta(5000.0), 0.1);
        // Clock went backwards
        assert_eq!(clock.delta(4000.0), 0.0);
        assert_eq!(clamp_dt(f32::NAN, 0.1), 0.0);
    }

    #[test]
    fn test_hitstop_freezes_world() {
        let mut state = GameState::new(1, Tuning::default());
        tick(&mut state, &advance(), DT);
        let timer = state.director.timer;
        state.hitstop_timer = 0.05;
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.director.timer, timer);
        assert!(state.hitstop_timer < 0.05);
    }

    #[test]
    fn test_blast_on_hero_starts_hitstop() {
        let mut state = in_wave(GameState::new(2, Tuning::default()));
        state.spawn_enemy(EnemyKind::Standard, Vec2::new(2.0, 0.0));
        state.enemies[0].bomb.as_mut().unwrap().arm_with_fuse(0.001);

        tick(&mut state, &TickInput::default(), DT);
        assert!(state.hero.hp < state.hero.max_hp);
        assert_eq!(state.hitstop_timer, state.tuning.feel.hit_stop);

        // World holds still for the hit-stop
        let timer = state.director.timer;
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.director.timer, timer);
    }

    #[test]
    fn test_strays_despawn_without_reward() {
        let mut state = in_wave(GameState::new(4, Tuning::default()));
        let far = state.tuning.feel.despawn_distance + 5.0;
        state.spawn_enemy(EnemyKind::Standard, Vec2::new(far, 0.0));
        state.coins.push(Coin {
            body: Body::new(state.ids.next(), Vec2::new(0.0, far), 0.3),
            value: 1,
            lucky: false,
            magnet_radius: 3.0,
        });

        tick(&mut state, &TickInput::default(), DT);
        assert!(state.enemies.is_empty());
        assert!(state.coins.is_empty());
        assert!(state.bombs.is_empty(), "carried bomb leaves with its enemy");
        assert_eq!(state.score, 0);
        assert_eq!(state.ledger.currency, 0);
    }

    #[test]
    fn test_death_pause_settles_blasts_only() {
        let mut state = in_wave(GameState::new(6, Tuning::default()));
        let tuning = state.tuning.bomb.clone();

        let mut settling = Bomb::carried(state.ids.next(), EntityId(900), Vec2::new(20.0, 0.0), &tuning);
        settling.state = BombState::Exploding;
        settling.settle_timer = 0.01;
        let mut waiting = Bomb::carried(state.ids.next(), EntityId(901), Vec2::new(-20.0, 0.0), &tuning);
        waiting.detach(&tuning);
        waiting.timer = 0.01;
        let waiting_id = waiting.body.id;
        state.bombs.push(settling);
        state.bombs.push(waiting);

        state.hero.take_damage(10_000.0, None);
        state.check_hero_death();
        state.drain_events();

        tick(&mut state, &TickInput::default(), DT);
        assert!(state.death_pause_timer > 0.0);
        assert_eq!(state.bombs.len(), 1);
        let frozen = &state.bombs[0];
        assert_eq!(frozen.body.id, waiting_id);
        assert_eq!(frozen.state, BombState::Detached);
        assert_eq!(frozen.timer, 0.01);
        assert!(!state.drain_events().contains(&GameEvent::Sound(SoundEvent::Explode)));
    }

    #[test]
    fn test_shot_fuel_barrel_leaves_fire() {
        let state = GameState::new(8, Tuning::default())
            .with_barrels(vec![(BarrelKind::Fuel, Vec2::new(6.0, 0.0))]);
        let mut state = in_wave(state);
        let fire = TickInput {
            fire_held: true,
            aim: Vec2::new(6.0, 0.0),
            ..Default::default()
        };

        let mut events = Vec::new();
        for _ in 0..120 {
            tick(&mut state, &fire, DT);
            events.extend(state.drain_events());
            if !state.fire_zones.is_empty() {
                break;
            }
        }
        assert_eq!(state.fire_zones.len(), 1);
        assert_eq!(state.fire_zones[0].body.pos, Vec2::new(6.0, 0.0));
        assert!(events.contains(&GameEvent::Sound(SoundEvent::Explode)));
        assert_eq!(state.hero.hp, state.hero.max_hp, "hero outside the blast");

        tick(&mut state, &TickInput::default(), DT);
        assert!(state.barrels.is_empty());
    }

    #[test]
    fn test_hero_only_moves_during_wave() {
        let mut state = GameState::new(1, Tuning::default());
        let walk = TickInput {
            move_axis: Vec2::X,
            ..Default::default()
        };
        tick(&mut state, &walk, DT);
        assert_eq!(state.hero.body.pos, Vec2::ZERO);

        tick(&mut state, &advance(), DT);
        run_until(&mut state, WaveState::Wave);
        tick(&mut state, &walk, DT);
        assert!(state.hero.body.pos.x > 0.0);
    }

    #[test]
    fn test_bullet_kill_drops_coins_same_frame() {
        let mut state = GameState::new(3, Tuning::default());
        tick(&mut state, &advance(), DT);
        run_until(&mut state, WaveState::Wave);
        state.director.telegraphs.clear();
        state.director.spawn_timer = 100.0;

        state.spawn_enemy(EnemyKind::Mini, Vec2::new(8.0, 0.0));
        state.enemies[0].hp = 1.0;
        let fire = TickInput {
            fire_held: true,
            aim: Vec2::new(8.0, 0.0),
            ..Default::default()
        };
        for _ in 0..30 {
            tick(&mut state, &fire, DT);
            if state.enemies.is_empty() {
                break;
            }
        }
        assert!(state.enemies.is_empty());
        assert_eq!(state.score, state.tuning.economy.kill_score);
        assert_eq!(state.coins.len(), state.tuning.economy.coins_per_kill as usize);
        // Its armed bomb went to the pool
        assert_eq!(state.bombs.len(), 1);
    }

    #[test]
    fn test_wave_end_fades_then_clears() {
        let mut state = GameState::new(9, Tuning::default());
        tick(&mut state, &advance(), DT);
        run_until(&mut state, WaveState::Wave);
        state.spawn_enemy(EnemyKind::Tank, Vec2::new(30.0, 0.0));
        state.director.timer = DT / 2.0;

        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase(), WaveState::WaveComplete);
        assert!(state.enemies.iter().all(|e| e.body.fading));
        let pos = state.enemies[0].body.pos;

        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.enemies[0].body.pos, pos, "fading enemies stay put");

        run_until(&mut state, WaveState::Shop);
        assert!(state.enemies.is_empty());
        assert!(state.bombs.is_empty());
        assert_eq!(state.hero.hp, state.hero.max_hp);
        assert!(!state.ledger.offers.is_empty());
    }

    #[test]
    fn test_death_pause_then_restart() {
        let mut state = GameState::new(5, Tuning::default());
        tick(&mut state, &advance(), DT);
        run_until(&mut state, WaveState::Wave);

        state.hero.take_damage(10_000.0, None);
        state.check_hero_death();
        assert!(state.death_pause_timer > 0.0);
        assert!(state.drain_events().contains(&GameEvent::HeroDied));

        // Restart is ignored during the pause
        let restart = TickInput {
            restart_pressed: true,
            ..Default::default()
        };
        tick(&mut state, &restart, DT);
        assert!(state.is_game_over());

        for _ in 0..200 {
            tick(&mut state, &TickInput::default(), DT);
        }
        tick(&mut state, &restart, DT);
        assert!(!state.is_game_over());
        assert_eq!(state.phase(), WaveState::Ready);
    }

    #[test]
    fn test_determinism() {
        let mut a = GameState::new(99999, Tuning::default());
        let mut b = GameState::new(99999, Tuning::default());

        let inputs = [
            advance(),
            TickInput {
                move_axis: Vec2::new(0.0, 1.0),
                ..Default::default()
            },
            TickInput {
                fire_held: true,
                aim: Vec2::new(3.0, 4.0),
                ..Default::default()
            },
            TickInput::default(),
        ];

        for frame in 0..1200 {
            let input = &inputs[frame % inputs.len()];
            tick(&mut a, input, DT);
            tick(&mut b, input, DT);
        }

        assert_eq!(a.director.wave, b.director.wave);
        assert_eq!(a.enemies.len(), b.enemies.len());
        assert_eq!(a.score, b.score);
        assert_eq!(a.hero.body.pos, b.hero.body.pos);
        assert_eq!(a.hero.hp, b.hero.hp);
    }
}
