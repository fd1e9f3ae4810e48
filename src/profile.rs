use std::collections::HashMap;

use serde::Serialize;

use crate::error::{LeagueError, Result};
use crate::model::{Match, MatchId, Outcome, Player, PlayerId, Side};
use crate::rankings::{RankingScope, compute_rankings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    Win,
    Loss,
    DoubleForfeit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub match_id: MatchId,
    pub opponent_id: PlayerId,
    pub opponent_name: String,
    pub result: MatchResult,
    pub week: Option<u32>,
    pub playoff_round: Option<u32>,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileStats {
    pub wins: u32,
    pub losses: u32,
    pub total_matches: u32,
    /// Percentage rounded to one decimal place.
    pub win_pct: f64,
    pub points_scored: u32,
    pub points_allowed: u32,
    pub point_diff: i64,
    pub playoff_wins: u32,
    pub playoff_losses: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerProfile {
    pub player: Player,
    pub rank: Option<usize>,
    pub stats: ProfileStats,
    pub history: Vec<HistoryEntry>,
}

/// Per-player statistics and history over every reported match, playoffs included.
pub fn player_profile(
    player_id: PlayerId,
    players: &[Player],
    matches: &[Match],
) -> Result<PlayerProfile> {
    let player = players
        .iter()
        .find(|p| p.id == player_id)
        .cloned()
        .ok_or_else(|| LeagueError::NotFound(format!("player {player_id}")))?;
    let names: HashMap<PlayerId, String> =
        players.iter().map(|p| (p.id, p.full_name())).collect();

    let mut played: Vec<&Match> = matches
        .iter()
        .filter(|m| m.is_played() && m.involves(player_id))
        .collect();
    played.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

    let mut stats = ProfileStats::default();
    let mut history = Vec::with_capacity(played.len());
    for m in played {
        let Some(side) = m.side_of(player_id) else {
            continue;
        };
        let Some(opponent_id) = m.player(side.other()) else {
            continue;
        };

        let result = match m.outcome() {
            Outcome::DoubleForfeit => MatchResult::DoubleForfeit,
            Outcome::Won { winner, .. } if winner == player_id => MatchResult::Win,
            Outcome::Won { .. } => MatchResult::Loss,
            Outcome::Pending | Outcome::Bye { .. } => continue,
        };

        stats.total_matches += 1;
        match result {
            MatchResult::Win => {
                stats.wins += 1;
                if m.is_playoff() {
                    stats.playoff_wins += 1;
                }
            }
            MatchResult::Loss | MatchResult::DoubleForfeit => {
                stats.losses += 1;
                if m.is_playoff() {
                    stats.playoff_losses += 1;
                }
            }
        }
        if result != MatchResult::DoubleForfeit {
            let (own, theirs) = match side {
                Side::Player1 => (m.score1, m.score2),
                Side::Player2 => (m.score2, m.score1),
            };
            stats.points_scored += own.unwrap_or(0);
            stats.points_allowed += theirs.unwrap_or(0);
        }

        history.push(HistoryEntry {
            match_id: m.id,
            opponent_id,
            opponent_name: names
                .get(&opponent_id)
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string()),
            result,
            week: m.week(),
            playoff_round: m.playoff_round(),
            summary: m.summary().unwrap_or_default(),
        });
    }

    stats.point_diff = i64::from(stats.points_scored) - i64::from(stats.points_allowed);
    if stats.total_matches > 0 {
        let pct = f64::from(stats.wins) / f64::from(stats.total_matches) * 100.0;
        stats.win_pct = (pct * 10.0).round() / 10.0;
    }

    let rank = compute_rankings(players, matches, RankingScope::AllMatches)
        .iter()
        .find(|row| row.player_id == player_id)
        .map(|row| row.rank);

    Ok(PlayerProfile {
        player,
        rank,
        stats,
        history,
    })
}
