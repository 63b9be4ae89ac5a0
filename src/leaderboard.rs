//! Leaderboard aggregation.
//!
//! A leaderboard is a pure function of the roster and the answer
//! ledger: no state is kept between snapshots, and recomputing over the
//! same inputs always yields the same ranking. Ties on total score go
//! to whoever reached that score first, then to the player id so the
//! order stays fully deterministic.

use std::cmp::Reverse;

use itertools::Itertools;
use serde::Serialize;

use crate::{ledger::AnswerLedger, registry::ParticipantId, roster::Roster};

/// One ranked row of a leaderboard.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// The ranked player
    pub player_id: ParticipantId,
    /// The player's display name
    pub nickname: String,
    /// Sum of points over all answered questions
    pub total_score: u64,
    /// 1-indexed position in the ranking
    pub rank: usize,
    /// Whether the player is currently connected
    pub is_connected: bool,
}

/// Computes the current standings over every player that ever joined.
///
/// Disconnected players keep their row, flagged `is_connected: false`.
pub fn snapshot(roster: &Roster, ledger: &AnswerLedger) -> Vec<LeaderboardEntry> {
    let totals = ledger.totals();
    roster
        .iter()
        .map(|player| {
            let total = totals.get(&player.id).copied().unwrap_or_default();
            (player, total)
        })
        .sorted_by_key(|(player, total)| (Reverse(total.total), total.reached_at, player.id))
        .enumerate()
        .map(|(position, (player, total))| LeaderboardEntry {
            player_id: player.id,
            nickname: player.nickname.clone(),
            total_score: total.total,
            rank: position + 1,
            is_connected: player.connected,
        })
        .collect()
}
