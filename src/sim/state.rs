//! Game state
//!
//! `GameState` owns every entity pool plus the wave director, ledger and
//! RNG. Sub-systems borrow from it for the length of one tick.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::bomb::Bomb;
use super::collision::push_out_of_obstacles;
use super::economy::{Coin, Ledger, PurchaseOutcome};
use super::enemy::{Enemy, EnemyKind};
use super::entity::{IdGen, Obstacle};
use super::events::{GameEvent, SoundEvent};
use super::hazard::{Barrel, BarrelKind, FireZone};
use super::hero::Hero;
use super::projectile::Bullet;
use super::wave::{WaveDirector, WaveState};
use crate::tuning::Tuning;

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub ids: IdGen,

    pub hero: Hero,
    pub enemies: Vec<Enemy>,
    /// Global pool: detached bombs and bombs settling after their blast
    pub bombs: Vec<Bomb>,
    pub bullets: Vec<Bullet>,
    pub coins: Vec<Coin>,
    /// Static terrain supplied by the host
    pub obstacles: Vec<Obstacle>,
    /// Shootable barrels, restocked from `barrel_layout` every round
    pub barrels: Vec<Barrel>,
    pub barrel_layout: Vec<(BarrelKind, Vec2)>,
    pub fire_zones: Vec<FireZone>,

    pub director: WaveDirector,
    pub ledger: Ledger,
    pub score: u64,

    pub paused: bool,
    pub hitstop_timer: f32,
    pub death_pause_timer: f32,
    /// Drives the "what killed you" highlight on the death screen
    pub death_highlight_timer: f32,
    pub death_sequence_started: bool,
    /// Simulated seconds since the run started
    pub time: f32,

    /// Collaborator requests emitted since the last drain
    pub events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let mut ids = IdGen::default();
        let hero = Hero::new(ids.next(), Vec2::ZERO, &tuning);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            ids,
            hero,
            enemies: Vec::new(),
            bombs: Vec::new(),
            bullets: Vec::new(),
            coins: Vec::new(),
            obstacles: Vec::new(),
            barrels: Vec::new(),
            barrel_layout: Vec::new(),
            fire_zones: Vec::new(),
            director: WaveDirector::default(),
            ledger: Ledger::default(),
            score: 0,
            paused: false,
            hitstop_timer: 0.0,
            death_pause_timer: 0.0,
            death_highlight_timer: 0.0,
            death_sequence_started: false,
            time: 0.0,
            events: Vec::new(),
        }
    }

    pub fn with_obstacles(mut self, obstacles: Vec<Obstacle>) -> Self {
        self.obstacles = obstacles;
        self
    }

    pub fn with_barrels(mut self, layout: Vec<(BarrelKind, Vec2)>) -> Self {
        self.barrel_layout = layout;
        self.restock_barrels();
        self
    }

    /// Put every barrel from the layout back, intact
    pub fn restock_barrels(&mut self) {
        self.barrels = self
            .barrel_layout
            .iter()
            .map(|&(kind, pos)| Barrel::new(self.ids.next(), kind, pos, &self.tuning.hazards))
            .collect();
    }

    /// Fresh run with the same tuning and terrain. The RNG keeps going so
    /// the next run differs from the last.
    pub fn restart(&mut self) {
        self.hero = Hero::new(self.ids.next(), Vec2::ZERO, &self.tuning);
        self.clear_field();
        self.restock_barrels();
        self.director = WaveDirector::default();
        self.ledger = Ledger::default();
        self.score = 0;
        self.paused = false;
        self.hitstop_timer = 0.0;
        self.death_pause_timer = 0.0;
        self.death_highlight_timer = 0.0;
        self.death_sequence_started = false;
        self.time = 0.0;
        self.events.clear();
        log::info!("Run restarted");
    }

    /// Take the collaborator requests queued so far
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn phase(&self) -> WaveState {
        self.director.state
    }

    /// True while a wave is being fought
    pub fn round_active(&self) -> bool {
        self.director.is_wave_active()
    }

    pub fn is_game_over(&self) -> bool {
        !self.hero.body.alive
    }

    /// External "advance phase" (READY/SHOP -> COUNTDOWN). Ignored during
    /// the shop input cooldown.
    pub fn advance_phase(&mut self) -> bool {
        if self.is_game_over() || self.ledger.cooldown > 0.0 {
            return false;
        }
        let advanced = self.director.advance_phase(&self.tuning.waves).is_some();
        if advanced {
            self.ledger.cooldown = self.tuning.shop.advance_cooldown;
        }
        advanced
    }

    /// Buy shop offer `index`
    pub fn purchase(&mut self, index: usize) -> PurchaseOutcome {
        let shop_open = self.director.state == WaveState::Shop;
        let outcome = self
            .ledger
            .purchase(index, &mut self.hero, &self.tuning.shop, shop_open);
        if matches!(outcome, PurchaseOutcome::Bought { .. }) {
            self.events.push(GameEvent::Sound(SoundEvent::Purchase));
        }
        outcome
    }

    pub fn live_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.body.is_active()).count()
    }

    /// Place a new enemy for the current wave, clear of obstacles
    pub fn spawn_enemy(&mut self, kind: EnemyKind, pos: Vec2) {
        let radius = self.tuning.enemies.profile(kind).radius;
        let pos = push_out_of_obstacles(pos, radius, &self.obstacles);
        let enemy = Enemy::spawn(&mut self.ids, kind, pos, self.director.wave, &self.tuning);
        log::debug!("Spawned {:?} {:?} at ({:.1}, {:.1})", kind, enemy.id(), pos.x, pos.y);
        self.enemies.push(enemy);
    }

    /// Credit a picked-up coin to currency and score
    pub fn collect_coin(&mut self, coin: &Coin) {
        let credited = self.ledger.collect(coin, &self.tuning.economy);
        self.score += self.tuning.economy.coin_score * credited as u64;
        let sound = if coin.lucky {
            SoundEvent::Jackpot
        } else {
            SoundEvent::CoinPickup
        };
        self.events.push(GameEvent::Sound(sound));
    }

    /// Round over: every transient entity starts fading out
    pub fn begin_round_fade(&mut self) {
        for enemy in &mut self.enemies {
            enemy.body.begin_fade();
            if let Some(bomb) = enemy.bomb.as_mut() {
                bomb.body.begin_fade();
            }
        }
        for bomb in &mut self.bombs {
            bomb.body.begin_fade();
        }
        for bullet in &mut self.bullets {
            bullet.body.begin_fade();
        }
        for coin in &mut self.coins {
            coin.body.begin_fade();
        }
        for zone in &mut self.fire_zones {
            zone.body.begin_fade();
        }
    }

    /// Drop every transient entity and pending telegraph
    pub fn clear_field(&mut self) {
        self.enemies.clear();
        self.bombs.clear();
        self.bullets.clear();
        self.coins.clear();
        self.fire_zones.clear();
        self.director.telegraphs.clear();
    }

    /// Shop is opening: clear the field, patch the hero up, roll offers
    pub fn open_shop(&mut self, wave: u32) {
        self.clear_field();
        self.restock_barrels();
        self.hero.restore();
        self.ledger
            .generate_offers(wave, &mut self.rng, &self.tuning.shop);
        self.events.push(GameEvent::ShopOpened { wave });
    }

    /// Start the death sequence the first time the hero is found dead
    pub fn check_hero_death(&mut self) {
        if self.hero.body.alive || self.death_sequence_started {
            return;
        }
        self.death_sequence_started = true;
        self.death_pause_timer = self.tuning.feel.death_pause;
        self.death_highlight_timer = self.tuning.feel.death_highlight;
        self.events.push(GameEvent::Sound(SoundEvent::Death));
        self.events.push(GameEvent::HeroDied);
        log::info!(
            "Game over at wave {} with score {}",
            self.director.wave,
            self.score
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_waits_in_ready() {
        let state = GameState::new(1, Tuning::default());
        assert_eq!(state.phase(), WaveState::Ready);
        assert!(state.hero.body.alive);
        assert!(!state.round_active());
        assert_eq!(state.ledger.currency, 0);
    }

    #[test]
    fn test_purchase_outside_shop_rejected() {
        let mut state = GameState::new(1, Tuning::default());
        state.ledger.currency = 1000;
        state.open_shop(1);
        state.director.state = WaveState::Ready;
        assert_eq!(state.purchase(0), PurchaseOutcome::ShopClosed);
    }

    #[test]
    fn test_open_shop_restores_hero() {
        let mut state = GameState::new(1, Tuning::default());
        state.hero.hp = 5.0;
        state.hero.stamina = 0.0;
        state.spawn_enemy(EnemyKind::Standard, Vec2::new(5.0, 0.0));
        state.open_shop(1);
        assert_eq!(state.hero.hp, state.hero.max_hp);
        assert_eq!(state.hero.stamina, state.hero.max_stamina);
        assert!(state.enemies.is_empty());
        assert_eq!(state.ledger.offers.len(), state.tuning.shop.offers_per_visit);
        assert_eq!(state.drain_events(), vec![GameEvent::ShopOpened { wave: 1 }]);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_spawn_pushed_out_of_obstacles() {
        let mut state = GameState::new(1, Tuning::default())
            .with_obstacles(vec![Obstacle::new(Vec2::new(5.0, 0.0), 2.0)]);
        state.spawn_enemy(EnemyKind::Standard, Vec2::new(5.5, 0.0));
        let enemy = &state.enemies[0];
        assert!(enemy.body.pos.distance(Vec2::new(5.0, 0.0)) >= 2.0 + enemy.body.radius - 1e-4);
        assert_eq!(enemy.bomb.as_ref().unwrap().body.pos, enemy.body.pos);
    }

    #[test]
    fn test_advance_starts_input_cooldown() {
        let mut state = GameState::new(1, Tuning::default());
        assert!(state.advance_phase());
        assert_eq!(state.phase(), WaveState::Countdown);
        assert_eq!(state.ledger.cooldown, state.tuning.shop.advance_cooldown);

        // A held key can't skip straight through the next shop
        state.director.state = WaveState::Shop;
        assert!(!state.advance_phase());
        state.ledger.tick_cooldown(state.tuning.shop.advance_cooldown);
        assert!(state.advance_phase());
    }

    #[test]
    fn test_barrels_restocked_each_round() {
        let layout = vec![
            (BarrelKind::Fuel, Vec2::new(6.0, 0.0)),
            (BarrelKind::Cryo, Vec2::new(-6.0, 0.0)),
        ];
        let mut state = GameState::new(1, Tuning::default()).with_barrels(layout);
        assert_eq!(state.barrels.len(), 2);

        state.barrels.clear();
        state.fire_zones.push(FireZone::new(
            state.ids.next(),
            Vec2::ZERO,
            &state.tuning.hazards.fire,
        ));
        state.open_shop(1);
        assert_eq!(state.barrels.len(), 2);
        assert!(state.barrels.iter().all(|b| b.is_standing()));
        assert!(state.fire_zones.is_empty());
    }

    #[test]
    fn test_restart_resets_run() {
        let mut state = GameState::new(1, Tuning::default());
        state.score = 900;
        state.ledger.currency = 40;
        state.hero.take_damage(1000.0, None);
        state.check_hero_death();
        assert!(state.death_sequence_started);

        state.restart();
        assert!(state.hero.body.alive);
        assert_eq!(state.score, 0);
        assert_eq!(state.ledger.currency, 0);
        assert_eq!(state.phase(), WaveState::Ready);
        assert!(!state.death_sequence_started);
    }
}
