//! Economy ledger
//!
//! Coins dropped on kills, the currency they credit, and the between-wave
//! shop that turns currency into permanent hero upgrades.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::entity::{Body, IdGen};
use super::hero::Hero;
use crate::tuning::{EconomyTuning, ShopTuning};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    pub body: Body,
    pub value: u32,
    /// Pays out `lucky_multiplier` times its value
    pub lucky: bool,
    pub magnet_radius: f32,
}

impl Coin {
    /// Drift toward the hero inside the magnet radius.
    /// Returns true once close enough to pick up.
    pub fn update(&mut self, dt: f32, hero_pos: Vec2, tuning: &EconomyTuning) -> bool {
        if self.body.fading {
            self.body.fade(tuning.fade_rate, dt);
            return false;
        }

        let to_hero = hero_pos - self.body.pos;
        let dist = to_hero.length();
        if dist <= tuning.pickup_distance {
            return true;
        }
        if dist <= self.magnet_radius {
            let step = (tuning.magnet_speed * dt).min(dist);
            self.body.pos += to_hero / dist * step;
        }
        self.body.pos.distance(hero_pos) <= tuning.pickup_distance
    }
}

/// Scatter the per-kill coins around `pos`, rolling luck for each
pub fn drop_coins(ids: &mut IdGen, pos: Vec2, rng: &mut impl Rng, tuning: &EconomyTuning) -> Vec<Coin> {
    (0..tuning.coins_per_kill)
        .map(|_| {
            let lucky = rng.random_bool(tuning.lucky_chance.clamp(0.0, 1.0));
            let offset = Vec2::new(
                rng.random_range(-1.0..=1.0),
                rng.random_range(-1.0..=1.0),
            ) * tuning.coin_scatter;
            let radius = if lucky {
                tuning.lucky_coin_radius
            } else {
                tuning.coin_radius
            };
            Coin {
                body: Body::new(ids.next(), pos + offset, radius),
                value: 1,
                lucky,
                magnet_radius: tuning.magnet_radius,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    Damage,
    FireRate,
    Multishot,
    /// Also heals to full
    MaxHp,
    /// Also refills stamina
    MaxStamina,
    /// Also refills the magazine
    MaxAmmo,
    Regen,
    Armor,
}

impl UpgradeKind {
    /// Permanent stat change on the hero
    pub fn apply(self, hero: &mut Hero, tuning: &ShopTuning) {
        match self {
            UpgradeKind::Damage => hero.bullet_damage += tuning.damage_step,
            UpgradeKind::FireRate => {
                hero.fire_interval =
                    (hero.fire_interval - tuning.fire_interval_step).max(tuning.fire_interval_min);
            }
            UpgradeKind::Multishot => hero.multishot += tuning.multishot_step,
            UpgradeKind::MaxHp => {
                hero.max_hp += tuning.max_hp_step;
                hero.hp = hero.max_hp;
            }
            UpgradeKind::MaxStamina => {
                hero.max_stamina += tuning.max_stamina_step;
                hero.stamina = hero.max_stamina;
            }
            UpgradeKind::MaxAmmo => {
                hero.max_ammo += tuning.max_ammo_step;
                hero.ammo = hero.max_ammo;
                hero.reload_timer = 0.0;
            }
            UpgradeKind::Regen => hero.hp_regen += tuning.regen_step,
            UpgradeKind::Armor => {
                hero.armor = (hero.armor + tuning.armor_step).min(tuning.armor_cap);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopOffer {
    pub kind: UpgradeKind,
    pub cost: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Bought { kind: UpgradeKind, cost: u32 },
    Unaffordable { cost: u32, currency: u32 },
    /// Still in the cooldown that follows any purchase attempt
    CoolingDown,
    NoSuchOffer,
    ShopClosed,
}

/// Currency and the current shop offers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    pub currency: u32,
    pub offers: Vec<ShopOffer>,
    pub cooldown: f32,
}

impl Ledger {
    /// Credit a picked-up coin, returns the amount credited
    pub fn collect(&mut self, coin: &Coin, tuning: &EconomyTuning) -> u32 {
        let amount = if coin.lucky {
            coin.value * tuning.lucky_multiplier
        } else {
            coin.value
        };
        self.currency = self.currency.saturating_add(amount);
        amount
    }

    /// Roll a fresh set of distinct offers priced for `wave`
    pub fn generate_offers(&mut self, wave: u32, rng: &mut impl Rng, tuning: &ShopTuning) {
        let scale = tuning.cost_growth.powi(wave.saturating_sub(1) as i32);
        self.offers = tuning
            .catalog
            .choose_multiple(rng, tuning.offers_per_visit)
            .map(|entry| ShopOffer {
                kind: entry.kind,
                cost: (entry.base_cost as f32 * scale).round() as u32,
            })
            .collect();
        log::debug!("Shop offers for wave {}: {:?}", wave, self.offers);
    }

    pub fn tick_cooldown(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
    }

    /// Buy offer `index`. Every attempt that reaches the offer starts a
    /// short cooldown; a rejected one for lack of funds changes nothing else.
    pub fn purchase(&mut self, index: usize, hero: &mut Hero, tuning: &ShopTuning, shop_open: bool) -> PurchaseOutcome {
        if !shop_open {
            return PurchaseOutcome::ShopClosed;
        }
        if self.cooldown > 0.0 {
            return PurchaseOutcome::CoolingDown;
        }
        let Some(offer) = self.offers.get(index).copied() else {
            return PurchaseOutcome::NoSuchOffer;
        };
        if self.currency < offer.cost {
            self.cooldown = tuning.purchase_cooldown;
            log::debug!("Can't afford {:?} ({} < {})", offer.kind, self.currency, offer.cost);
            return PurchaseOutcome::Unaffordable {
                cost: offer.cost,
                currency: self.currency,
            };
        }

        self.currency -= offer.cost;
        self.offers.remove(index);
        self.cooldown = tuning.purchase_cooldown;
        offer.kind.apply(hero, tuning);
        log::info!("Bought {:?} for {}", offer.kind, offer.cost);
        PurchaseOutcome::Bought {
            kind: offer.kind,
            cost: offer.cost,
        }
    }
}
