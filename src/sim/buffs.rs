//! Power-ups and the timed buff registry

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::BuffConfig;

/// Timed modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffKind {
    Speed,
    Shield,
    SlowTime,
    DoubleScore,
    Piercing,
    Homing,
    RapidFire,
}

impl BuffKind {
    pub const ALL: [BuffKind; 7] = [
        BuffKind::Speed,
        BuffKind::Shield,
        BuffKind::SlowTime,
        BuffKind::DoubleScore,
        BuffKind::Piercing,
        BuffKind::Homing,
        BuffKind::RapidFire,
    ];
}

/// Everything a pickup can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    Speed,
    Shield,
    SlowTime,
    DoubleScore,
    Piercing,
    Homing,
    RapidFire,
    /// Instant: +1 life
    ExtraLife,
    /// Instant: clears the field
    Bomb,
}

impl PowerUpKind {
    /// The timer this pickup refreshes, `None` for instant effects
    pub fn as_buff(self) -> Option<BuffKind> {
        match self {
            PowerUpKind::Speed => Some(BuffKind::Speed),
            PowerUpKind::Shield => Some(BuffKind::Shield),
            PowerUpKind::SlowTime => Some(BuffKind::SlowTime),
            PowerUpKind::DoubleScore => Some(BuffKind::DoubleScore),
            PowerUpKind::Piercing => Some(BuffKind::Piercing),
            PowerUpKind::Homing => Some(BuffKind::Homing),
            PowerUpKind::RapidFire => Some(BuffKind::RapidFire),
            PowerUpKind::ExtraLife | PowerUpKind::Bomb => None,
        }
    }

    pub fn is_instant(self) -> bool {
        self.as_buff().is_none()
    }
}

/// Buff kind → expiry timestamp (ms). Active iff `now < expiry`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuffRegistry {
    expiries: BTreeMap<BuffKind, f64>,
}

impl BuffRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or refresh a buff. Expiries never move backwards.
    pub fn apply(&mut self, kind: BuffKind, now_ms: f64, duration_ms: f64) -> f64 {
        let candidate = now_ms + duration_ms.max(0.0);
        let expiry = self.expiries.entry(kind).or_insert(candidate);
        if candidate > *expiry {
            *expiry = candidate;
        }
        log::debug!("Buff {:?} active until {:.0}ms", kind, *expiry);
        *expiry
    }

    pub fn is_active(&self, kind: BuffKind, now_ms: f64) -> bool {
        self.expiries.get(&kind).is_some_and(|&t| now_ms < t)
    }

    pub fn expiry(&self, kind: BuffKind) -> Option<f64> {
        self.expiries.get(&kind).copied()
    }

    /// Milliseconds left, 0 when inactive
    pub fn remaining(&self, kind: BuffKind, now_ms: f64) -> f64 {
        self.expiries
            .get(&kind)
            .map(|&t| (t - now_ms).max(0.0))
            .unwrap_or(0.0)
    }

    /// Spend a buff early (shield absorbing a hit). Returns true if it was active.
    pub fn consume(&mut self, kind: BuffKind, now_ms: f64) -> bool {
        let active = self.is_active(kind, now_ms);
        self.expiries.remove(&kind);
        active
    }

    /// Drop every entry with `expiry <= now`, returning the kinds removed
    pub fn expire(&mut self, now_ms: f64) -> Vec<BuffKind> {
        let expired: Vec<BuffKind> = self
            .expiries
            .iter()
            .filter(|&(_, &t)| t <= now_ms)
            .map(|(&k, _)| k)
            .collect();
        for kind in &expired {
            self.expiries.remove(kind);
        }
        expired
    }

    /// Active buffs with their remaining time, in stable order
    pub fn active(&self, now_ms: f64) -> Vec<(BuffKind, f64)> {
        self.expiries
            .iter()
            .filter(|&(_, &t)| now_ms < t)
            .map(|(&k, &t)| (k, t - now_ms))
            .collect()
    }
}

/// Effective state derived from the active buff set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    /// Player movement multiplier
    pub speed: f32,
    /// World time dilation fed to the clock
    pub time_scale: f32,
    /// Extra score multiplier ("other active multipliers")
    pub score: f32,
    /// Fire cooldown multiplier
    pub fire_rate: f32,
    pub shield: bool,
    pub piercing: bool,
    pub homing: bool,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            speed: 1.0,
            time_scale: 1.0,
            score: 1.0,
            fire_rate: 1.0,
            shield: false,
            piercing: false,
            homing: false,
        }
    }
}

impl Modifiers {
    /// Recompute from whatever is still active at `now`
    pub fn from_registry(buffs: &BuffRegistry, now_ms: f64, config: &BuffConfig) -> Self {
        let on = |kind| buffs.is_active(kind, now_ms);
        Self {
            speed: if on(BuffKind::Speed) {
                config.speed_multiplier
            } else {
                1.0
            },
            time_scale: if on(BuffKind::SlowTime) {
                config.slow_time_scale
            } else {
                1.0
            },
            score: if on(BuffKind::DoubleScore) {
                config.score_multiplier
            } else {
                1.0
            },
            fire_rate: if on(BuffKind::RapidFire) {
                config.rapid_fire_factor
            } else {
                1.0
            },
            shield: on(BuffKind::Shield),
            piercing: on(BuffKind::Piercing),
            homing: on(BuffKind::Homing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_refresh_does_not_stack() {
        let mut buffs = BuffRegistry::new();
        buffs.apply(BuffKind::DoubleScore, 1000.0, 5000.0);
        buffs.apply(BuffKind::DoubleScore, 1000.0, 5000.0);
        assert_eq!(buffs.expiry(BuffKind::DoubleScore), Some(6000.0));

        // Later pickup refreshes from the new `now`
        buffs.apply(BuffKind::DoubleScore, 3000.0, 5000.0);
        assert_eq!(buffs.expiry(BuffKind::DoubleScore), Some(8000.0));
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut buffs = BuffRegistry::new();
        buffs.apply(BuffKind::Speed, 0.0, 1000.0);
        buffs.apply(BuffKind::Shield, 0.0, 3000.0);
        assert!(buffs.is_active(BuffKind::Speed, 500.0));
        assert!(buffs.is_active(BuffKind::Shield, 500.0));

        let expired = buffs.expire(1000.0);
        assert_eq!(expired, vec![BuffKind::Speed]);
        assert!(!buffs.is_active(BuffKind::Speed, 1000.0));
        assert!(buffs.is_active(BuffKind::Shield, 1000.0));
    }

    #[test]
    fn test_active_iff_before_expiry() {
        let mut buffs = BuffRegistry::new();
        buffs.apply(BuffKind::Homing, 0.0, 100.0);
        assert!(buffs.is_active(BuffKind::Homing, 99.9));
        assert!(!buffs.is_active(BuffKind::Homing, 100.0));
        assert_eq!(buffs.remaining(BuffKind::Homing, 40.0), 60.0);
    }

    #[test]
    fn test_consume_shield() {
        let mut buffs = BuffRegistry::new();
        assert!(!buffs.consume(BuffKind::Shield, 0.0));
        buffs.apply(BuffKind::Shield, 0.0, 1000.0);
        assert!(buffs.consume(BuffKind::Shield, 10.0));
        assert!(!buffs.is_active(BuffKind::Shield, 10.0));
    }

    #[test]
    fn test_modifiers_follow_registry() {
        let config = BuffConfig::default();
        let mut buffs = BuffRegistry::new();
        buffs.apply(BuffKind::SlowTime, 0.0, 1000.0);
        buffs.apply(BuffKind::DoubleScore, 0.0, 500.0);

        let mods = Modifiers::from_registry(&buffs, 100.0, &config);
        assert_eq!(mods.time_scale, config.slow_time_scale);
        assert_eq!(mods.score, config.score_multiplier);
        assert!(!mods.shield);

        let mods = Modifiers::from_registry(&buffs, 600.0, &config);
        assert_eq!(mods.score, 1.0);
        assert_eq!(mods.time_scale, config.slow_time_scale);
    }

    #[test]
    fn test_instant_kinds() {
        assert!(PowerUpKind::ExtraLife.is_instant());
        assert!(PowerUpKind::Bomb.is_instant());
        assert_eq!(PowerUpKind::Shield.as_buff(), Some(BuffKind::Shield));
    }

    proptest! {
        #[test]
        fn prop_expiry_never_decreases(
            pickups in proptest::collection::vec((0.0f64..10_000.0, 0.0f64..5_000.0), 1..20)
        ) {
            let mut buffs = BuffRegistry::new();
            let mut now = 0.0;
            let mut last = f64::MIN;
            for (gap, duration) in pickups {
                now += gap;
                let expiry = buffs.apply(BuffKind::Speed, now, duration);
                prop_assert!(expiry >= last);
                prop_assert!(expiry >= now + duration);
                last = expiry;
            }
        }
    }
}
