//! Demo mode: a simple AI that plays the game
//!
//! Produces the same [`TickInput`] a human would, so the headless driver and
//! attract screens exercise the real input path.

use glam::Vec2;

use super::bomb::Bomb;
use super::state::GameState;
use super::tick::TickInput;
use super::wave::WaveState;

/// Keep this far from anything about to go off
const DANGER_MARGIN: f32 = 1.5;
/// Preferred distance to the nearest enemy
const KITE_DISTANCE: f32 = 6.0;

/// Pick this frame's input for `state`
pub fn autopilot(state: &GameState) -> TickInput {
    let mut input = TickInput::default();
    if state.is_game_over() {
        return input;
    }

    match state.phase() {
        WaveState::Ready => {
            input.advance_pressed = true;
        }
        WaveState::Shop => {
            // Spend on the cheapest thing we can afford, then move on
            let cheapest = state
                .ledger
                .offers
                .iter()
                .enumerate()
                .filter(|(_, offer)| offer.cost <= state.ledger.currency)
                .min_by_key(|(_, offer)| offer.cost)
                .map(|(index, _)| index);
            match cheapest {
                Some(index) if state.ledger.cooldown <= 0.0 => input.purchase = Some(index),
                Some(_) => {}
                None => input.advance_pressed = true,
            }
        }
        WaveState::Wave => fight(state, &mut input),
        WaveState::Countdown | WaveState::WaveComplete => {}
    }
    input
}

fn fight(state: &GameState, input: &mut TickInput) {
    let hero = &state.hero;
    let pos = hero.body.pos;

    let nearest = state
        .enemies
        .iter()
        .filter(|enemy| enemy.body.is_active())
        .min_by(|a, b| {
            a.body
                .pos
                .distance(pos)
                .partial_cmp(&b.body.pos.distance(pos))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    // Flee from every counting-down bomb whose blast would reach us
    let live_bombs = state
        .bombs
        .iter()
        .chain(state.enemies.iter().filter_map(|enemy| enemy.bomb.as_ref()))
        .filter(|bomb| bomb.is_counting_down());
    let flee = live_bombs.fold(Vec2::ZERO, |acc, bomb| acc + threat(bomb, pos))
        + state
            .fire_zones
            .iter()
            .filter(|zone| zone.body.is_active())
            .fold(Vec2::ZERO, |acc, zone| {
                acc + away_from(zone.body.pos, zone.body.radius + DANGER_MARGIN, pos)
            });

    if let Some(enemy) = nearest {
        input.aim = enemy.body.pos;
        let dist = enemy.body.pos.distance(pos);
        input.fire_held = dist <= state.tuning.blaster.bullet_range;
        if dist < state.tuning.abilities.push_back.radius && enemy.is_charging() {
            input.push_pressed = true;
        }
    }

    let move_dir = if flee != Vec2::ZERO {
        input.dash_pressed = flee.length() > 1.0;
        flee
    } else if let Some(enemy) = nearest {
        let away = pos - enemy.body.pos;
        if away.length() < KITE_DISTANCE {
            away
        } else {
            nearest_coin(state, pos).map_or(Vec2::ZERO, |coin| coin - pos)
        }
    } else {
        nearest_coin(state, pos).map_or(Vec2::ZERO, |coin| coin - pos)
    };
    input.move_axis = move_dir.normalize_or_zero();
}

/// Push away from `bomb`, stronger the closer it is
fn threat(bomb: &Bomb, pos: Vec2) -> Vec2 {
    away_from(bomb.body.pos, bomb.explosion_radius + DANGER_MARGIN, pos)
}

fn away_from(danger: Vec2, reach: f32, pos: Vec2) -> Vec2 {
    let away = pos - danger;
    let dist = away.length();
    if dist >= reach {
        return Vec2::ZERO;
    }
    away.try_normalize().unwrap_or(Vec2::X) * (1.0 - dist / reach) * 2.0
}

fn nearest_coin(state: &GameState, pos: Vec2) -> Option<Vec2> {
    state
        .coins
        .iter()
        .filter(|coin| !coin.body.fading)
        .map(|coin| coin.body.pos)
        .min_by(|a, b| {
            a.distance(pos)
                .partial_cmp(&b.distance(pos))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::economy::{ShopOffer, UpgradeKind};
    use crate::sim::enemy::EnemyKind;
    use crate::sim::hazard::FireZone;
    use crate::sim::tick::tick;
    use crate::tuning::Tuning;

    #[test]
    fn test_starts_the_run() {
        let state = GameState::new(1, Tuning::default());
        assert!(autopilot(&state).advance_pressed);
    }

    #[test]
    fn test_shops_then_advances() {
        let mut state = GameState::new(1, Tuning::default());
        state.director.state = WaveState::Shop;
        state.ledger.currency = 70;
        state.ledger.offers = vec![
            ShopOffer { kind: UpgradeKind::Armor, cost: 110 },
            ShopOffer { kind: UpgradeKind::Damage, cost: 60 },
        ];
        assert_eq!(autopilot(&state).purchase, Some(1));

        state.ledger.currency = 10;
        assert!(autopilot(&state).advance_pressed);
    }

    #[test]
    fn test_aims_and_kites_nearest() {
        let mut state = GameState::new(1, Tuning::default());
        state.director.state = WaveState::Wave;
        state.spawn_enemy(EnemyKind::Mini, Vec2::new(2.0, 0.0));

        let input = autopilot(&state);
        assert_eq!(input.aim, Vec2::new(2.0, 0.0));
        assert!(input.fire_held);
        assert!(input.move_axis.x < 0.0);
    }

    #[test]
    fn test_steps_out_of_fire() {
        let mut state = GameState::new(1, Tuning::default());
        state.director.state = WaveState::Wave;
        let id = state.ids.next();
        state.fire_zones.push(FireZone::new(id, Vec2::new(1.0, 0.0), &state.tuning.hazards.fire));

        let input = autopilot(&state);
        assert!(input.move_axis.x < 0.0);
    }

    #[test]
    fn test_plays_into_first_wave() {
        let mut state = GameState::new(42, Tuning::default());
        for _ in 0..600 {
            let input = autopilot(&state);
            tick(&mut state, &input, 1.0 / 60.0);
        }
        assert_eq!(state.director.wave, 1);
    }
}
