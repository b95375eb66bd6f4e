//! Data-driven game balance
//!
//! Everything the simulation reads as a number lives here. Loaded from JSON
//! by the host; every section is `#[serde(default)]` so a tuning file only
//! needs to list the values it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sim::enemy::EnemyKind;
use crate::sim::economy::UpgradeKind;

/// Errors produced while loading or validating a tuning file
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid tuning value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Hero base stats
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroTuning {
    pub base_hp: f32,
    pub radius: f32,
    pub move_speed: f32,
    pub base_stamina: f32,
    /// Stamina per second
    pub stamina_regen: f32,
    /// Seconds of no stamina regen after a dash ends
    pub stamina_regen_delay: f32,
    /// HP per second (0 until upgraded)
    pub hp_regen: f32,
    /// Fraction of incoming damage removed (0.0 - armor cap)
    pub armor: f32,
    pub damage_flash: f32,
}

impl Default for HeroTuning {
    fn default() -> Self {
        Self {
            base_hp: 100.0,
            radius: 0.5,
            move_speed: 6.0,
            base_stamina: 100.0,
            stamina_regen: 20.0,
            stamina_regen_delay: 0.5,
            hp_regen: 0.0,
            armor: 0.0,
            damage_flash: 0.08,
        }
    }
}

/// Hero weapon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlasterTuning {
    pub bullet_damage: f32,
    /// Seconds between shots
    pub fire_interval: f32,
    pub bullet_speed: f32,
    pub bullet_range: f32,
    pub bullet_radius: f32,
    pub magazine_size: u32,
    pub reload_time: f32,
    pub multishot: u32,
    /// Angle between multishot bullets (radians)
    pub spread: f32,
}

impl Default for BlasterTuning {
    fn default() -> Self {
        Self {
            bullet_damage: 10.0,
            fire_interval: 0.15,
            bullet_speed: 25.0,
            bullet_range: 15.0,
            bullet_radius: 0.15,
            magazine_size: 12,
            reload_time: 1.2,
            multishot: 1,
            spread: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashTuning {
    pub distance: f32,
    pub duration: f32,
    pub cooldown: f32,
    pub stamina_cost: f32,
}

impl Default for DashTuning {
    fn default() -> Self {
        Self {
            distance: 4.0,
            duration: 0.15,
            cooldown: 1.0,
            stamina_cost: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PushBackTuning {
    pub radius: f32,
    pub distance: f32,
    pub cooldown: f32,
}

impl Default for PushBackTuning {
    fn default() -> Self {
        Self {
            radius: 3.0,
            distance: 2.5,
            cooldown: 5.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityTuning {
    pub dash: DashTuning,
    pub push_back: PushBackTuning,
}

/// Stat profile for one enemy subtype
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyProfile {
    pub hp: f32,
    pub shield: f32,
    pub walk_speed: f32,
    /// Speed while carrying an armed bomb
    pub charge_speed: f32,
    pub radius: f32,
    /// Overrides for the carried bomb (None = bomb section defaults)
    pub bomb_damage: Option<f32>,
    pub bomb_radius: Option<f32>,
    /// Spawn with the bomb already armed on this fuse
    pub armed_fuse: Option<f32>,
}

impl Default for EnemyProfile {
    fn default() -> Self {
        Self {
            hp: 30.0,
            shield: 20.0,
            walk_speed: 2.0,
            charge_speed: 4.0,
            radius: 0.6,
            bomb_damage: None,
            bomb_radius: None,
            armed_fuse: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub standard: EnemyProfile,
    pub fast: EnemyProfile,
    pub tank: EnemyProfile,
    pub blinker: EnemyProfile,
    pub splitter: EnemyProfile,
    pub mini: EnemyProfile,
    pub blink_distance: f32,
    pub blink_cooldown: f32,
    pub blink_cooldown_armed: f32,
    /// Minis spawned by a splitter on death
    pub split_count: u32,
    pub split_offset: f32,
    /// Push strength (fraction of walk speed) when overlapping another enemy
    pub separation: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            standard: EnemyProfile::default(),
            fast: EnemyProfile {
                hp: 10.0,
                shield: 10.0,
                walk_speed: 4.5,
                charge_speed: 7.0,
                radius: 0.6,
                bomb_damage: Some(25.0),
                bomb_radius: Some(3.0),
                armed_fuse: None,
            },
            tank: EnemyProfile {
                hp: 200.0,
                shield: 150.0,
                walk_speed: 0.8,
                charge_speed: 1.6,
                radius: 0.9,
                ..EnemyProfile::default()
            },
            blinker: EnemyProfile {
                walk_speed: 1.2,
                charge_speed: 3.0,
                radius: 0.7,
                ..EnemyProfile::default()
            },
            splitter: EnemyProfile {
                hp: 80.0,
                walk_speed: 1.0,
                charge_speed: 2.5,
                radius: 0.8,
                ..EnemyProfile::default()
            },
            mini: EnemyProfile {
                hp: 10.0,
                shield: 0.0,
                walk_speed: 2.5,
                charge_speed: 3.5,
                radius: 0.3,
                armed_fuse: Some(2.0),
                ..EnemyProfile::default()
            },
            blink_distance: 5.0,
            blink_cooldown: 3.0,
            blink_cooldown_armed: 1.5,
            split_count: 3,
            split_offset: 0.5,
            separation: 0.5,
        }
    }
}

impl EnemyTuning {
    pub fn profile(&self, kind: EnemyKind) -> &EnemyProfile {
        match kind {
            EnemyKind::Standard => &self.standard,
            EnemyKind::Fast => &self.fast,
            EnemyKind::Tank => &self.tank,
            EnemyKind::Blinker => &self.blinker,
            EnemyKind::Splitter => &self.splitter,
            EnemyKind::Mini => &self.mini,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BombTuning {
    /// Hero distance that arms an idle carried bomb
    pub activation_distance: f32,
    pub countdown: f32,
    /// Countdown given to an idle bomb when its carrier dies
    pub detached_lifetime: f32,
    pub explosion_radius: f32,
    pub max_damage: f32,
    /// Visual settle time between EXPLODING and DEAD
    pub settle_duration: f32,
    /// Timer a chain-ignited bomb is driven down to
    pub chain_fuse: f32,
    /// Hero distance that detonates an armed or detached bomb on contact
    pub contact_range: f32,
    pub radius: f32,
    pub shake_intensity: f32,
    pub shake_duration: f32,
    /// Fade speed (opacity per second) during round transitions
    pub fade_rate: f32,
}

impl Default for BombTuning {
    fn default() -> Self {
        Self {
            activation_distance: 3.0,
            countdown: 3.0,
            detached_lifetime: 2.0,
            explosion_radius: 4.0,
            max_damage: 50.0,
            settle_duration: 0.25,
            chain_fuse: 0.05,
            contact_range: 0.9,
            radius: 0.35,
            shake_intensity: 0.5,
            shake_duration: 0.2,
            fade_rate: 2.0,
        }
    }
}

/// One entry of the weighted spawn roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub kind: EnemyKind,
    /// First wave (1-based) this kind may spawn in
    pub unlock_wave: u32,
    pub weight: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    pub countdown: f32,
    pub base_duration: f32,
    /// Extra seconds per wave
    pub duration_growth: f32,
    /// Delay between WAVE_COMPLETE and SHOP
    pub complete_delay: f32,
    /// Telegraph anticipation before the enemy appears
    pub telegraph_delay: f32,
    /// Waves that use the gentle pacing curve
    pub gentle_waves: u32,
    pub spawn_interval_base: f32,
    /// Interval reduction per gentle wave
    pub spawn_interval_gentle_step: f32,
    /// Interval multiplier per wave past the gentle range
    pub spawn_interval_steep_decay: f32,
    pub spawn_interval_min: f32,
    pub enemy_cap_base: u32,
    pub enemy_cap_gentle_step: u32,
    pub enemy_cap_steep_step: u32,
    pub enemy_cap_max: u32,
    pub hp_growth: f32,
    pub shield_growth: f32,
    pub spawn_min_distance: f32,
    pub spawn_max_distance: f32,
    pub roster: Vec<RosterEntry>,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            countdown: 2.0,
            base_duration: 30.0,
            duration_growth: 5.0,
            complete_delay: 1.5,
            telegraph_delay: 1.0,
            gentle_waves: 3,
            spawn_interval_base: 1.5,
            spawn_interval_gentle_step: 0.1,
            spawn_interval_steep_decay: 0.85,
            spawn_interval_min: 0.35,
            enemy_cap_base: 4,
            enemy_cap_gentle_step: 1,
            enemy_cap_steep_step: 2,
            enemy_cap_max: 40,
            hp_growth: 1.15,
            shield_growth: 1.1,
            spawn_min_distance: 10.0,
            spawn_max_distance: 16.0,
            roster: vec![
                RosterEntry { kind: EnemyKind::Standard, unlock_wave: 1, weight: 10 },
                RosterEntry { kind: EnemyKind::Fast, unlock_wave: 2, weight: 4 },
                RosterEntry { kind: EnemyKind::Tank, unlock_wave: 3, weight: 2 },
                RosterEntry { kind: EnemyKind::Blinker, unlock_wave: 4, weight: 3 },
                RosterEntry { kind: EnemyKind::Splitter, unlock_wave: 5, weight: 2 },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyTuning {
    pub coins_per_kill: u32,
    /// Max offset of a dropped coin from the death point
    pub coin_scatter: f32,
    pub lucky_chance: f64,
    pub lucky_multiplier: u32,
    pub magnet_radius: f32,
    pub magnet_speed: f32,
    pub pickup_distance: f32,
    pub coin_radius: f32,
    pub lucky_coin_radius: f32,
    pub kill_score: u64,
    /// Score per collected coin value
    pub coin_score: u64,
    pub fade_rate: f32,
}

impl Default for EconomyTuning {
    fn default() -> Self {
        Self {
            coins_per_kill: 2,
            coin_scatter: 0.5,
            lucky_chance: 0.1,
            lucky_multiplier: 5,
            magnet_radius: 3.0,
            magnet_speed: 8.0,
            pickup_distance: 0.5,
            coin_radius: 0.3,
            lucky_coin_radius: 0.45,
            kill_score: 50,
            coin_score: 100,
            fade_rate: 0.8,
        }
    }
}

/// Catalog entry for the between-wave shop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub kind: UpgradeKind,
    pub base_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopTuning {
    pub catalog: Vec<CatalogEntry>,
    pub offers_per_visit: usize,
    /// Cost multiplier per wave cleared
    pub cost_growth: f32,
    /// Input lockout after any purchase attempt
    pub purchase_cooldown: f32,
    /// Input lockout after leaving READY or SHOP
    pub advance_cooldown: f32,
    pub damage_step: f32,
    pub fire_interval_step: f32,
    pub fire_interval_min: f32,
    pub multishot_step: u32,
    pub max_hp_step: f32,
    pub max_stamina_step: f32,
    pub max_ammo_step: u32,
    pub regen_step: f32,
    pub armor_step: f32,
    pub armor_cap: f32,
}

impl Default for ShopTuning {
    fn default() -> Self {
        Self {
            catalog: vec![
                CatalogEntry { kind: UpgradeKind::Damage, base_cost: 60 },
                CatalogEntry { kind: UpgradeKind::FireRate, base_cost: 90 },
                CatalogEntry { kind: UpgradeKind::Multishot, base_cost: 120 },
                CatalogEntry { kind: UpgradeKind::MaxHp, base_cost: 80 },
                CatalogEntry { kind: UpgradeKind::MaxStamina, base_cost: 100 },
                CatalogEntry { kind: UpgradeKind::MaxAmmo, base_cost: 70 },
                CatalogEntry { kind: UpgradeKind::Regen, base_cost: 90 },
                CatalogEntry { kind: UpgradeKind::Armor, base_cost: 110 },
            ],
            offers_per_visit: 3,
            cost_growth: 1.15,
            purchase_cooldown: 0.3,
            advance_cooldown: 0.5,
            damage_step: 5.0,
            fire_interval_step: 0.05,
            fire_interval_min: 0.05,
            multishot_step: 1,
            max_hp_step: 25.0,
            max_stamina_step: 60.0,
            max_ammo_step: 4,
            regen_step: 1.0,
            armor_step: 0.05,
            armor_cap: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelBarrelTuning {
    pub radius: f32,
    pub hp: f32,
    pub explosion_radius: f32,
    /// Hero damage at the center, falling off to zero at the edge
    pub damage: f32,
    /// Fuse given to loose bombs in the blast
    pub bomb_fuse: f32,
    /// Fuse given to other barrels in the blast
    pub chain_fuse: f32,
    pub shake_intensity: f32,
    pub shake_duration: f32,
}

impl Default for FuelBarrelTuning {
    fn default() -> Self {
        Self {
            radius: 0.7,
            hp: 20.0,
            explosion_radius: 5.0,
            damage: 50.0,
            bomb_fuse: 0.1,
            chain_fuse: 0.1,
            shake_intensity: 0.15,
            shake_duration: 0.35,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryoBarrelTuning {
    pub radius: f32,
    pub hp: f32,
    pub freeze_radius: f32,
    pub freeze_duration: f32,
    /// Seconds added to loose bomb countdowns in range
    pub bomb_delay: f32,
    pub shatter_duration: f32,
    pub shake_intensity: f32,
    pub shake_duration: f32,
}

impl Default for CryoBarrelTuning {
    fn default() -> Self {
        Self {
            radius: 0.7,
            hp: 20.0,
            freeze_radius: 5.0,
            freeze_duration: 3.0,
            bomb_delay: 1.0,
            shatter_duration: 0.5,
            shake_intensity: 0.1,
            shake_duration: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FireZoneTuning {
    pub radius: f32,
    pub duration: f32,
    /// Seconds between burns
    pub tick_interval: f32,
    pub burn_damage: f32,
}

impl Default for FireZoneTuning {
    fn default() -> Self {
        Self {
            radius: 2.5,
            duration: 5.0,
            tick_interval: 0.25,
            burn_damage: 3.0,
        }
    }
}

/// Shootable barrels and the fire they leave
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardTuning {
    pub fuel: FuelBarrelTuning,
    pub cryo: CryoBarrelTuning,
    pub fire: FireZoneTuning,
    pub damage_flash: f32,
}

impl Default for HazardTuning {
    fn default() -> Self {
        Self {
            fuel: FuelBarrelTuning::default(),
            cryo: CryoBarrelTuning::default(),
            fire: FireZoneTuning::default(),
            damage_flash: 0.15,
        }
    }
}

/// Game-feel timings (hit-stop, death pause, frame clamp)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeelTuning {
    pub hit_stop: f32,
    pub death_pause: f32,
    pub death_highlight: f32,
    /// Largest frame delta the loop will simulate (seconds)
    pub max_frame_dt: f32,
    /// Enemies and coins farther than this from the hero are dropped
    pub despawn_distance: f32,
    pub enemy_fade_rate: f32,
}

impl Default for FeelTuning {
    fn default() -> Self {
        Self {
            hit_stop: 0.08,
            death_pause: 0.3,
            death_highlight: 0.7,
            max_frame_dt: 0.1,
            despawn_distance: 40.0,
            enemy_fade_rate: 2.0,
        }
    }
}

/// Full tuning tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub hero: HeroTuning,
    pub blaster: BlasterTuning,
    pub abilities: AbilityTuning,
    pub enemies: EnemyTuning,
    pub bomb: BombTuning,
    pub waves: WaveTuning,
    pub economy: EconomyTuning,
    pub shop: ShopTuning,
    pub hazards: HazardTuning,
    pub feel: FeelTuning,
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Read, parse and validate a tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    pub fn to_json_pretty(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(TuningError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                })
            }
        }

        positive("hero.base_hp", self.hero.base_hp)?;
        positive("hero.radius", self.hero.radius)?;
        positive("blaster.bullet_speed", self.blaster.bullet_speed)?;
        positive("blaster.fire_interval", self.blaster.fire_interval)?;
        positive("bomb.explosion_radius", self.bomb.explosion_radius)?;
        positive("bomb.countdown", self.bomb.countdown)?;
        positive("bomb.chain_fuse", self.bomb.chain_fuse)?;
        positive("waves.base_duration", self.waves.base_duration)?;
        positive("waves.spawn_interval_min", self.waves.spawn_interval_min)?;
        positive("feel.max_frame_dt", self.feel.max_frame_dt)?;
        positive("hazards.fire.tick_interval", self.hazards.fire.tick_interval)?;
        positive("hazards.fuel.hp", self.hazards.fuel.hp)?;
        positive("hazards.cryo.hp", self.hazards.cryo.hp)?;

        if self.waves.hp_growth < 1.0 {
            return Err(TuningError::Invalid {
                field: "waves.hp_growth",
                reason: format!("must be >= 1.0, got {}", self.waves.hp_growth),
            });
        }
        if self.waves.shield_growth < 1.0 {
            return Err(TuningError::Invalid {
                field: "waves.shield_growth",
                reason: format!("must be >= 1.0, got {}", self.waves.shield_growth),
            });
        }
        let decay = self.waves.spawn_interval_steep_decay;
        if !(decay > 0.0 && decay <= 1.0) {
            return Err(TuningError::Invalid {
                field: "waves.spawn_interval_steep_decay",
                reason: format!("must be in (0, 1], got {decay}"),
            });
        }
        if self.waves.spawn_min_distance > self.waves.spawn_max_distance {
            return Err(TuningError::Invalid {
                field: "waves.spawn_min_distance",
                reason: "must not exceed spawn_max_distance".to_string(),
            });
        }
        if !self.waves.roster.iter().any(|entry| entry.weight > 0) {
            return Err(TuningError::Invalid {
                field: "waves.roster",
                reason: "needs at least one entry with a positive weight".to_string(),
            });
        }
        if !(0.0..1.0).contains(&self.shop.armor_cap) {
            return Err(TuningError::Invalid {
                field: "shop.armor_cap",
                reason: format!("must be in [0, 1), got {}", self.shop.armor_cap),
            });
        }
        if self.shop.catalog.is_empty() {
            return Err(TuningError::Invalid {
                field: "shop.catalog",
                reason: "must list at least one upgrade".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let tuning = Tuning::from_json(r#"{ "bomb": { "max_damage": 80.0 } }"#).unwrap();
        assert_eq!(tuning.bomb.max_damage, 80.0);
        // Untouched fields keep their defaults
        assert_eq!(tuning.bomb.countdown, BombTuning::default().countdown);
        assert_eq!(tuning.hero.base_hp, HeroTuning::default().base_hp);
    }

    #[test]
    fn test_shrinking_growth_rejected() {
        let err = Tuning::from_json(r#"{ "waves": { "hp_growth": 0.9 } }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::Invalid { field: "waves.hp_growth", .. }
        ));
    }

    #[test]
    fn test_hazard_override() {
        let tuning = Tuning::from_json(r#"{ "hazards": { "fire": { "burn_damage": 6.0 } } }"#).unwrap();
        assert_eq!(tuning.hazards.fire.burn_damage, 6.0);
        assert_eq!(tuning.hazards.fire.radius, FireZoneTuning::default().radius);

        let err = Tuning::from_json(r#"{ "hazards": { "fire": { "tick_interval": 0.0 } } }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::Invalid { field: "hazards.fire.tick_interval", .. }
        ));
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }

    #[test]
    fn test_json_roundtrip_keeps_roster() {
        let json = Tuning::default().to_json_pretty().unwrap();
        let tuning = Tuning::from_json(&json).unwrap();
        assert_eq!(tuning.waves.roster.len(), WaveTuning::default().roster.len());
        assert_eq!(tuning.shop.catalog.len(), ShopTuning::default().catalog.len());
    }
}
