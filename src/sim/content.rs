//! Multiple-choice content source

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed quiz item
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("question '{prompt}' needs at least 2 options, got {count}")]
    TooFewOptions { prompt: String, count: usize },

    #[error("question '{prompt}' marks option {correct} correct but has {count} options")]
    CorrectOutOfRange {
        prompt: String,
        correct: usize,
        count: usize,
    },

    #[error("deck has no questions")]
    EmptyDeck,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct: usize,
}

impl QuizItem {
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: usize,
    ) -> Result<Self, ContentError> {
        let item = Self {
            prompt: prompt.into(),
            options,
            correct,
        };
        item.validate()?;
        Ok(item)
    }

    /// Check an item built without `new` (fields are public)
    pub fn validate(&self) -> Result<(), ContentError> {
        let count = self.options.len();
        if count < 2 {
            return Err(ContentError::TooFewOptions {
                prompt: self.prompt.clone(),
                count,
            });
        }
        if self.correct >= count {
            return Err(ContentError::CorrectOutOfRange {
                prompt: self.prompt.clone(),
                correct: self.correct,
                count,
            });
        }
        Ok(())
    }

    pub fn correct_text(&self) -> &str {
        &self.options[self.correct]
    }
}

/// The question currently in play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub item: QuizItem,
}

/// Where questions come from
pub trait ContentProvider {
    /// Next item, `None` if the provider has nothing to offer
    fn next_item(&mut self) -> Option<QuizItem>;

    /// Return to the initial state (restart)
    fn reset(&mut self) {}
}

/// Provider with no questions; every hostile spawns untagged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContent;

impl ContentProvider for NoContent {
    fn next_item(&mut self) -> Option<QuizItem> {
        None
    }
}

/// Draws items in a seeded shuffled order, reshuffling on exhaustion
#[derive(Debug, Clone)]
pub struct ShuffledDeck {
    items: Vec<QuizItem>,
    order: Vec<usize>,
    cursor: usize,
    last: Option<usize>,
    seed: u64,
    rng: Pcg32,
    /// Completed passes through the deck
    pub cycles: u32,
}

impl ShuffledDeck {
    pub fn new(items: Vec<QuizItem>, seed: u64) -> Result<Self, ContentError> {
        if items.is_empty() {
            return Err(ContentError::EmptyDeck);
        }
        let mut deck = Self {
            order: Vec::new(),
            items,
            cursor: 0,
            last: None,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            cycles: 0,
        };
        deck.shuffle();
        Ok(deck)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items left before the next reshuffle
    pub fn remaining(&self) -> usize {
        self.order.len() - self.cursor
    }

    fn shuffle(&mut self) {
        self.order = (0..self.items.len()).collect();
        self.order.shuffle(&mut self.rng);
        // Never show the same item twice in a row across the boundary
        if self.order.len() > 1 && self.order.first() == self.last.as_ref() {
            let end = self.order.len() - 1;
            self.order.swap(0, end);
        }
        self.cursor = 0;
    }
}

impl ContentProvider for ShuffledDeck {
    fn next_item(&mut self) -> Option<QuizItem> {
        if self.cursor >= self.order.len() {
            self.cycles += 1;
            log::debug!("Deck exhausted after cycle {}, reshuffling", self.cycles);
            self.shuffle();
        }
        let index = *self.order.get(self.cursor)?;
        self.cursor += 1;
        self.last = Some(index);
        self.items.get(index).cloned()
    }

    fn reset(&mut self) {
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.last = None;
        self.cycles = 0;
        self.shuffle();
    }
}

/// Built-in arithmetic questions for demos and tests
pub fn sample_items() -> Vec<QuizItem> {
    let facts: [(u32, char, u32); 12] = [
        (3, '+', 4),
        (7, '+', 8),
        (12, '-', 5),
        (9, '-', 3),
        (6, '×', 7),
        (8, '×', 4),
        (5, '+', 9),
        (15, '-', 6),
        (3, '×', 9),
        (11, '+', 11),
        (20, '-', 13),
        (4, '×', 6),
    ];
    facts
        .iter()
        .enumerate()
        .filter_map(|(i, &(a, op, b))| {
            let answer = match op {
                '+' => a + b,
                '-' => a - b,
                _ => a * b,
            };
            // Distractors around the answer; the correct slot rotates
            let correct = i % 4;
            let options = (0..4)
                .map(|slot| {
                    let offset = slot as i64 - correct as i64;
                    (answer as i64 + offset * 2).to_string()
                })
                .collect();
            QuizItem::new(format!("{a} {op} {b} = ?"), options, correct).ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(n: usize) -> QuizItem {
        QuizItem::new(format!("q{n}"), vec!["a".into(), "b".into()], 0).unwrap()
    }

    #[test]
    fn test_item_validation() {
        assert!(matches!(
            QuizItem::new("q", vec!["a".into()], 0),
            Err(ContentError::TooFewOptions { count: 1, .. })
        ));
        assert!(matches!(
            QuizItem::new("q", vec!["a".into(), "b".into()], 2),
            Err(ContentError::CorrectOutOfRange { correct: 2, .. })
        ));
        assert!(ShuffledDeck::new(Vec::new(), 1).is_err());

        let built_by_hand = QuizItem {
            prompt: "q".to_string(),
            options: Vec::new(),
            correct: 0,
        };
        assert_eq!(
            built_by_hand.validate(),
            Err(ContentError::TooFewOptions {
                prompt: "q".to_string(),
                count: 0,
            })
        );
    }

    #[test]
    fn test_deck_cycles_every_item_then_reshuffles() {
        let items: Vec<_> = (0..5).map(item).collect();
        let mut deck = ShuffledDeck::new(items, 42).unwrap();

        let mut first: Vec<String> = (0..5).map(|_| deck.next_item().unwrap().prompt).collect();
        first.sort();
        assert_eq!(first, vec!["q0", "q1", "q2", "q3", "q4"]);
        assert_eq!(deck.remaining(), 0);

        // Exhaustion reshuffles instead of running dry
        assert!(deck.next_item().is_some());
        assert_eq!(deck.cycles, 1);
        assert_eq!(deck.remaining(), 4);
    }

    #[test]
    fn test_no_repeat_across_boundary() {
        let items: Vec<_> = (0..3).map(item).collect();
        let mut deck = ShuffledDeck::new(items, 7).unwrap();
        let mut prev = deck.next_item().unwrap().prompt;
        for _ in 0..60 {
            let next = deck.next_item().unwrap().prompt;
            assert_ne!(next, prev);
            prev = next;
        }
    }

    #[test]
    fn test_single_item_deck_repeats() {
        let mut deck = ShuffledDeck::new(vec![item(0)], 1).unwrap();
        assert_eq!(deck.next_item().unwrap().prompt, "q0");
        assert_eq!(deck.next_item().unwrap().prompt, "q0");
    }

    #[test]
    fn test_reset_replays_order() {
        let mut deck = ShuffledDeck::new(sample_items(), 9).unwrap();
        let first: Vec<_> = (0..8).map(|_| deck.next_item().unwrap()).collect();
        deck.reset();
        let again: Vec<_> = (0..8).map(|_| deck.next_item().unwrap()).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn test_sample_items_are_consistent() {
        let items = sample_items();
        assert_eq!(items.len(), 12);
        assert_eq!(items[0].prompt, "3 + 4 = ?");
        assert_eq!(items[0].correct_text(), "7");
        assert_eq!(items[4].correct_text(), "42");
        assert!(NoContent.next_item().is_none());
    }
}
