//! Answer ledger and scoring engine.
//!
//! The ledger records exactly one answer per `(question, player)` pair.
//! The first submission wins, every later one is rejected, and entries
//! are immutable once written; re-scoring a question can never change a
//! stored answer. Scoring is linear in response speed: an instantaneous
//! correct answer earns the full point budget, a correct answer at the
//! deadline earns nothing, and everything else interpolates.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use crate::{
    constants::answer::LATENCY_GRACE,
    error::RoomError,
    quiz::{ChoiceId, Question},
    registry::ParticipantId,
};

/// One immutable ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer {
    /// Chosen choice; `None` is the "no answer" sentinel
    pub choice: Option<ChoiceId>,
    /// Time between question open and submission, clamped to the limit
    pub latency: Duration,
    /// Points awarded, 0 for wrong choices and sentinels
    pub points: u64,
    /// When the ledger accepted the entry; drives tie-breaking
    pub submitted_at: Instant,
}

/// A player's aggregate over all recorded answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerTotal {
    /// Sum of awarded points
    pub total: u64,
    /// Acceptance instant of the last answer that scored points
    pub reached_at: Option<Instant>,
}

/// Computes the award for a correct answer.
///
/// `round(point_budget × (time_limit − latency) / time_limit)`, with
/// `latency` already clamped to `[0, time_limit]`.
fn score(point_budget: u64, time_limit: Duration, latency: Duration) -> u64 {
    let fraction = (time_limit.as_secs_f64() - latency.as_secs_f64()) / time_limit.as_secs_f64();
    (point_budget as f64 * fraction.max(0.0)).round() as u64
}

/// All recorded answers of one room, keyed by question index and
/// player.
#[derive(Debug, Default)]
pub struct AnswerLedger {
    answers: HashMap<(usize, ParticipantId), Answer>,
}

impl AnswerLedger {
    /// Records a player's answer for the open question.
    ///
    /// `open_index` is the question currently accepting answers;
    /// submissions for any other index fail with
    /// [`RoomError::StaleQuestion`]. A second submission by the same
    /// player fails with [`RoomError::DuplicateAnswer`] and leaves the
    /// first entry untouched. Latencies beyond the time limit plus a
    /// small jitter grace are rejected as
    /// [`RoomError::InvalidSubmission`]; within the grace they are
    /// clamped to the limit, which floors the award at zero.
    pub fn submit(
        &mut self,
        open_index: usize,
        question_index: usize,
        question: &Question,
        player: ParticipantId,
        choice: Option<ChoiceId>,
        latency: Duration,
        now: Instant,
    ) -> Result<Answer, RoomError> {
        if question_index != open_index {
            return Err(RoomError::StaleQuestion);
        }
        if self.answers.contains_key(&(question_index, player)) {
            return Err(RoomError::DuplicateAnswer);
        }
        if latency > question.time_limit + LATENCY_GRACE {
            return Err(RoomError::InvalidSubmission(
                "reported latency exceeds the question time limit".to_owned(),
            ));
        }
        let latency = latency.min(question.time_limit);
        let points = match choice {
            None => 0,
            Some(id) => {
                let chosen = question.choice(id).ok_or_else(|| {
                    RoomError::InvalidSubmission("unknown choice for this question".to_owned())
                })?;
                if chosen.correct {
                    score(question.point_budget, question.time_limit, latency)
                } else {
                    0
                }
            }
        };
        let answer = Answer {
            choice,
            latency,
            points,
            submitted_at: now,
        };
        self.answers.insert((question_index, player), answer);
        Ok(answer)
    }

    /// Fills zero-point sentinel entries for players who never answered
    /// a question, returning how many were filled.
    ///
    /// Existing entries are never overwritten, so a race between a late
    /// submission and the deadline keeps whichever the ledger accepted
    /// first.
    pub fn record_unanswered(
        &mut self,
        question_index: usize,
        time_limit: Duration,
        players: impl IntoIterator<Item = ParticipantId>,
        now: Instant,
    ) -> usize {
        let mut filled = 0;
        for player in players {
            self.answers
                .entry((question_index, player))
                .or_insert_with(|| {
                    filled += 1;
                    Answer {
                        choice: None,
                        latency: time_limit,
                        points: 0,
                        submitted_at: now,
                    }
                });
        }
        filled
    }

    /// Looks up a recorded answer.
    pub fn answer(&self, question_index: usize, player: ParticipantId) -> Option<&Answer> {
        self.answers.get(&(question_index, player))
    }

    /// Whether a player has a recorded answer for a question.
    pub fn has_answered(&self, question_index: usize, player: ParticipantId) -> bool {
        self.answers.contains_key(&(question_index, player))
    }

    /// Number of recorded answers for one question, sentinels included.
    pub fn answered_count(&self, question_index: usize) -> usize {
        self.answers
            .keys()
            .filter(|(index, _)| *index == question_index)
            .count()
    }

    /// Aggregates per-player totals over all recorded answers.
    pub fn totals(&self) -> HashMap<ParticipantId, PlayerTotal> {
        let mut totals: HashMap<ParticipantId, PlayerTotal> = HashMap::new();
        for ((_, player), answer) in &self.answers {
            let entry = totals.entry(*player).or_default();
            entry.total += answer.points;
            if answer.points > 0 {
                entry.reached_at = match entry.reached_at {
                    Some(instant) => Some(instant.max(answer.submitted_at)),
                    None => Some(answer.submitted_at),
                };
            }
        }
        totals
    }
}
