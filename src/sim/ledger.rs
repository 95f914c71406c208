//! Combo/scoring ledger and run statistics

use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;

/// Streak threshold → multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComboTier {
    pub min_streak: u32,
    pub multiplier: f32,
}

impl ComboTier {
    pub const fn new(min_streak: u32, multiplier: f32) -> Self {
        Self {
            min_streak,
            multiplier,
        }
    }
}

/// Score plus a streak that lapses after an idle window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboLedger {
    pub score: u64,
    pub streak: u32,
    pub best_streak: u32,
    pub last_score_ms: Option<f64>,
    pub decay_window_ms: f64,
    pub tiers: Vec<ComboTier>,
    pub max_multiplier: f32,
}

impl ComboLedger {
    pub fn new(config: &ScoringConfig) -> Self {
        let mut tiers = config.tiers.clone();
        tiers.sort_by_key(|t| t.min_streak);
        Self {
            score: 0,
            streak: 0,
            best_streak: 0,
            last_score_ms: None,
            decay_window_ms: config.decay_window_ms,
            tiers,
            max_multiplier: config.max_multiplier,
        }
    }

    /// Highest tier the streak reaches, capped
    pub fn multiplier_for(&self, streak: u32) -> f32 {
        self.tiers
            .iter()
            .rev()
            .find(|t| streak >= t.min_streak)
            .map_or(1.0, |t| t.multiplier)
            .min(self.max_multiplier)
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier_for(self.streak)
    }

    /// Reset the streak if the window has lapsed. Returns the lost streak.
    pub fn decay(&mut self, now_ms: f64) -> Option<u32> {
        match self.last_score_ms {
            Some(last) if self.streak > 0 && now_ms - last > self.decay_window_ms => {
                self.break_streak()
            }
            _ => None,
        }
    }

    /// Record a scoring hit and return the points awarded
    pub fn score_hit(&mut self, now_ms: f64, base: u32, bonus: f32) -> u64 {
        self.decay(now_ms);
        self.streak += 1;
        self.best_streak = self.best_streak.max(self.streak);
        self.last_score_ms = Some(now_ms);

        let awarded = (base as f32 * self.multiplier() * bonus).floor().max(0.0) as u64;
        self.score += awarded;
        awarded
    }

    /// Drop the streak to zero. Returns the lost streak if there was one.
    pub fn break_streak(&mut self) -> Option<u32> {
        let lost = std::mem::take(&mut self.streak);
        (lost > 0).then_some(lost)
    }
}

/// Counters for the end-of-run summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub shots_fired: u32,
    pub correct: u32,
    pub wrong: u32,
    pub kills: u32,
    pub bosses_defeated: u32,
    pub powerups: u32,
    pub damage_taken: u32,
}

impl RunStats {
    /// correct / (correct + wrong), 0 with no attempts
    pub fn accuracy(&self) -> f32 {
        let attempts = self.correct + self.wrong;
        if attempts == 0 {
            0.0
        } else {
            self.correct as f32 / attempts as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> ComboLedger {
        ComboLedger::new(&ScoringConfig::default())
    }

    #[test]
    fn test_first_hit_scores_base() {
        let mut ledger = ledger();
        let awarded = ledger.score_hit(0.0, 10, 1.0);
        assert_eq!(awarded, 10);
        assert_eq!(ledger.score, 10);
        assert_eq!(ledger.streak, 1);
        assert_eq!(ledger.multiplier(), 1.0);
    }

    #[test]
    fn test_tier_with_double_score() {
        let mut ledger = ledger();
        ledger.streak = 4;
        ledger.last_score_ms = Some(900.0);
        let awarded = ledger.score_hit(1000.0, 10, 2.0);
        assert_eq!(awarded, 60);
        assert_eq!(ledger.streak, 5);
    }

    #[test]
    fn test_streak_decays_after_window() {
        let mut ledger = ledger();
        for i in 0..3 {
            ledger.score_hit(i as f64 * 100.0, 10, 1.0);
        }
        assert_eq!(ledger.streak, 3);
        assert_eq!(ledger.decay(200.0 + ledger.decay_window_ms), None);
        assert_eq!(ledger.decay(201.0 + ledger.decay_window_ms), Some(3));
        assert_eq!(ledger.streak, 0);
        assert_eq!(ledger.best_streak, 3);
    }

    #[test]
    fn test_lazy_decay_on_hit() {
        let mut ledger = ledger();
        ledger.score_hit(0.0, 10, 1.0);
        ledger.score_hit(100.0, 10, 1.0);
        let awarded = ledger.score_hit(100.0 + ledger.decay_window_ms + 1.0, 10, 1.0);
        assert_eq!(awarded, 10);
        assert_eq!(ledger.streak, 1);
    }

    #[test]
    fn test_multiplier_is_capped() {
        let mut config = ScoringConfig::default();
        config.max_multiplier = 2.5;
        let ledger = ComboLedger::new(&config);
        assert_eq!(ledger.multiplier_for(1), 1.0);
        assert_eq!(ledger.multiplier_for(2), 1.5);
        assert_eq!(ledger.multiplier_for(50), 2.5);
    }

    #[test]
    fn test_break_streak() {
        let mut ledger = ledger();
        assert_eq!(ledger.break_streak(), None);
        ledger.score_hit(0.0, 10, 1.0);
        assert_eq!(ledger.break_streak(), Some(1));
    }

    #[test]
    fn test_accuracy() {
        let mut stats = RunStats::default();
        assert_eq!(stats.accuracy(), 0.0);
        stats.correct = 3;
        stats.wrong = 1;
        assert_eq!(stats.accuracy(), 0.75);
    }
}
