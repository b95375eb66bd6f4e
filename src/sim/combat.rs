//! Combat resolver
//!
//! Shield and hp damage for enemies, and the bookkeeping that follows a
//! death (score, coin drops, splitting, bomb hand-off).

use std::f32::consts::TAU;

use glam::Vec2;

use super::economy::drop_coins;
use super::enemy::{DeathEffect, Enemy, EnemyKind};
use super::hero::AttackerSnapshot;
use super::state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Target already dead, or nothing to apply
    Ignored,
    /// Shield took all of it
    Absorbed,
    /// Hp went down but stayed positive
    Damaged,
    /// This hit was the killing blow
    Killed,
}

/// Shield first, overflow into hp. Repeated calls after death are no-ops.
pub fn apply_damage(enemy: &mut Enemy, amount: f32) -> DamageOutcome {
    if !enemy.body.alive || amount <= 0.0 {
        return DamageOutcome::Ignored;
    }

    let mut to_hp = amount;
    if enemy.shield > 0.0 {
        let remaining = enemy.shield - amount;
        enemy.shield = remaining.max(0.0);
        if remaining >= 0.0 {
            return DamageOutcome::Absorbed;
        }
        to_hp = -remaining;
    }

    enemy.hp = (enemy.hp - to_hp).max(0.0);
    if enemy.hp <= 0.0 {
        enemy.body.alive = false;
        DamageOutcome::Killed
    } else {
        DamageOutcome::Damaged
    }
}

/// Knock the shield to zero without touching hp
pub fn strip_shield(enemy: &mut Enemy) {
    if enemy.body.alive {
        enemy.shield = 0.0;
    }
}

/// Guaranteed kill, whatever the shield and hp
pub fn apply_lethal(enemy: &mut Enemy) -> DamageOutcome {
    if !enemy.body.alive {
        return DamageOutcome::Ignored;
    }
    enemy.shield = 0.0;
    enemy.hp = 0.0;
    enemy.body.alive = false;
    DamageOutcome::Killed
}

/// Run death effects for every enemy killed since the last call.
///
/// Score and coins are credited once per enemy. A carried bomb that has not
/// gone off is detached into the global pool. Splitter children are
/// appended to the enemy list right away.
pub fn resolve_deaths(state: &mut GameState) {
    let mut spawned = Vec::new();

    for enemy in state.enemies.iter_mut() {
        if enemy.body.alive || enemy.death_handled {
            continue;
        }
        enemy.death_handled = true;
        let pos = enemy.body.pos;

        state.score += state.tuning.economy.kill_score;
        state.coins.extend(drop_coins(
            &mut state.ids,
            pos,
            &mut state.rng,
            &state.tuning.economy,
        ));

        if let Some(mut bomb) = enemy.bomb.take() {
            bomb.attacker = Some(AttackerSnapshot::of(enemy));
            if bomb.detach(&state.tuning.bomb) {
                log::debug!("Bomb {:?} detached from {:?}", bomb.body.id, enemy.body.id);
                state.bombs.push(bomb);
            }
        }

        if let DeathEffect::Split { count, offset } = enemy.kind.on_death(&state.tuning.enemies) {
            for i in 0..count {
                let angle = TAU / count as f32 * i as f32;
                spawned.push(Enemy::spawn_scaled(
                    &mut state.ids,
                    EnemyKind::Mini,
                    pos + Vec2::from_angle(angle) * offset,
                    1.0,
                    1.0,
                    &state.tuning,
                ));
            }
            log::debug!("Splitter {:?} split into {}", enemy.body.id, count);
        }
    }

    state.enemies.extend(spawned);
}
