use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use thiserror::Error;

use crate::error::EngineError;
use crate::model::{CategoryCounts, Hole, HoleView, Round, Score, ScoreCategory, StrokeDetails};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("round {round_id} already has a score for hole {hole_number} (golfer {golfer_id})")]
    DuplicateHole {
        round_id: i64,
        hole_number: u8,
        golfer_id: i64,
    },
    #[error("hole {0} is not part of this round's tee")]
    UnknownHole(u8),
}

impl From<LedgerError> for EngineError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::DuplicateHole {
                round_id,
                hole_number,
                golfer_id,
            } => Self::DuplicateHole {
                round_id,
                hole_number,
                golfer_id,
            },
            LedgerError::UnknownHole(number) => Self::NotFound(format!("hole {number}")),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct LedgerEntry {
    pub hole: Hole,
    pub score: Score,
}

/// The scores of one round joined with their holes.
#[derive(Clone, Debug)]
pub struct ScoreLedger {
    round: Round,
    holes: BTreeMap<u8, Hole>,
    entries: Vec<LedgerEntry>,
}

impl ScoreLedger {
    #[must_use]
    pub fn new(round: Round, holes: Vec<Hole>) -> Self {
        Self {
            round,
            holes: holes.into_iter().map(|h| (h.number, h)).collect(),
            entries: Vec::new(),
        }
    }

    /// Build a ledger from persisted scores.
    ///
    /// # Errors
    /// `NotFound` if a score references a hole outside `holes`, `DuplicateHole`
    /// if two scores share a (hole, golfer).
    pub fn from_scores(
        round: Round,
        holes: Vec<Hole>,
        scores: Vec<Score>,
    ) -> Result<Self, EngineError> {
        let by_id: BTreeMap<i64, Hole> = holes.iter().map(|h| (h.id, h.clone())).collect();
        let mut ledger = Self::new(round, holes);
        for score in scores {
            let hole = by_id
                .get(&score.hole_id)
                .cloned()
                .ok_or_else(|| EngineError::NotFound(format!("hole id {}", score.hole_id)))?;
            ledger.push(hole, score)?;
        }
        Ok(ledger)
    }

    /// Attach a new score to the ledger.
    ///
    /// # Errors
    /// `UnknownHole` if the tee has no such hole, `DuplicateHole` if the
    /// golfer already has a score on it.
    pub fn record(
        &mut self,
        hole_number: u8,
        golfer_id: i64,
        details: StrokeDetails,
    ) -> Result<&Score, LedgerError> {
        let hole = self
            .holes
            .get(&hole_number)
            .cloned()
            .ok_or(LedgerError::UnknownHole(hole_number))?;
        let next_id = self.entries.iter().map(|e| e.score.id).max().unwrap_or(0) + 1;
        let score = Score {
            id: next_id,
            round_id: self.round.id,
            hole_id: hole.id,
            golfer_id,
            details,
        };
        self.push(hole, score)?;
        self.entries
            .iter()
            .find(|e| e.hole.number == hole_number && e.score.golfer_id == golfer_id)
            .map(|e| &e.score)
            .ok_or(LedgerError::UnknownHole(hole_number))
    }

    fn push(&mut self, hole: Hole, score: Score) -> Result<(), LedgerError> {
        if self
            .entries
            .iter()
            .any(|e| e.hole.number == hole.number && e.score.golfer_id == score.golfer_id)
        {
            return Err(LedgerError::DuplicateHole {
                round_id: self.round.id,
                hole_number: hole.number,
                golfer_id: score.golfer_id,
            });
        }
        self.entries.push(LedgerEntry { hole, score });
        self.entries
            .sort_by_key(|e| (e.hole.number, e.score.golfer_id));
        Ok(())
    }

    #[must_use]
    pub fn round(&self) -> &Round {
        &self.round
    }

    #[must_use]
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    #[must_use]
    pub fn holes(&self) -> impl Iterator<Item = &Hole> {
        self.holes.values()
    }

    #[must_use]
    pub fn hole_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 0 for an empty ledger; check [`Self::is_empty`] to tell the two apart.
    /// Saturates at `u32::MAX`.
    #[must_use]
    pub fn total_strokes(&self) -> u32 {
        self.stroke_sum(|_| true)
    }

    fn stroke_sum(&self, keep: impl Fn(&Hole) -> bool) -> u32 {
        self.entries
            .iter()
            .filter(|e| keep(&e.hole))
            .map(|e| e.score.strokes())
            .fold(0, u32::saturating_add)
    }

    #[must_use]
    pub fn best_score(&self) -> Option<u32> {
        self.entries.iter().map(|e| e.score.strokes()).min()
    }

    #[must_use]
    pub fn worst_score(&self) -> Option<u32> {
        self.entries.iter().map(|e| e.score.strokes()).max()
    }

    #[must_use]
    pub fn average_per_hole(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        Some(f64::from(self.total_strokes()) / self.entries.len() as f64)
    }

    #[must_use]
    pub fn front_nine_total(&self) -> u32 {
        self.stroke_sum(Hole::is_front_nine)
    }

    #[must_use]
    pub fn back_nine_total(&self) -> u32 {
        self.stroke_sum(|hole| !hole.is_front_nine())
    }

    #[must_use]
    pub fn category_counts(&self) -> CategoryCounts {
        let mut counts = CategoryCounts::default();
        for entry in &self.entries {
            if let Some(category) = ScoreCategory::classify(entry.score.strokes(), entry.hole.par) {
                counts.add(category);
            }
        }
        counts
    }

    #[must_use]
    pub fn golfers(&self) -> Vec<i64> {
        self.entries
            .iter()
            .map(|e| e.score.golfer_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// A copy of this ledger holding only `golfer_id`'s scores.
    #[must_use]
    pub fn for_golfer(&self, golfer_id: i64) -> Self {
        Self {
            round: self.round.clone(),
            holes: self.holes.clone(),
            entries: self
                .entries
                .iter()
                .filter(|e| e.score.golfer_id == golfer_id)
                .cloned()
                .collect(),
        }
    }

    #[must_use]
    pub fn hole_scores(&self, hole_number: u8) -> Vec<&LedgerEntry> {
        self.entries
            .iter()
            .filter(|e| e.hole.number == hole_number)
            .collect()
    }

    /// Every golfer on the card has a score on every hole of `view`.
    #[must_use]
    pub fn is_complete(&self, view: HoleView) -> bool {
        let golfers = self.golfers();
        if golfers.is_empty() {
            return false;
        }
        golfers.iter().all(|&golfer_id| {
            view.hole_numbers().all(|number| {
                self.entries
                    .iter()
                    .any(|e| e.hole.number == number && e.score.golfer_id == golfer_id)
            })
        })
    }

    #[must_use]
    pub fn complete_views(&self) -> Vec<HoleView> {
        HoleView::ALL
            .into_iter()
            .filter(|&view| self.is_complete(view))
            .collect()
    }
}
