use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::model::{Match, Outcome, Player, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingScope {
    /// Regular season only; this is what playoff seeding uses.
    #[default]
    RegularSeason,
    AllMatches,
}

impl RankingScope {
    fn includes(self, m: &Match) -> bool {
        match self {
            Self::RegularSeason => !m.is_playoff(),
            Self::AllMatches => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub rank: usize,
    pub player_id: PlayerId,
    pub first_name: String,
    pub last_name: String,
    pub wins: u32,
    pub losses: u32,
    pub points_scored: u32,
    pub points_allowed: u32,
    pub point_diff: i64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    wins: u32,
    losses: u32,
    scored: u32,
    allowed: u32,
}

/// Derive standings from scratch. Only reported matches against a real opponent count;
/// a double forfeit is a loss for both players and adds no points.
pub fn compute_rankings(players: &[Player], matches: &[Match], scope: RankingScope) -> Vec<Standing> {
    let mut tallies: HashMap<PlayerId, Tally> =
        players.iter().map(|p| (p.id, Tally::default())).collect();

    for m in matches.iter().filter(|m| m.is_played() && scope.includes(m)) {
        apply_match(&mut tallies, m);
    }

    let mut rows: Vec<Standing> = players
        .iter()
        .map(|p| {
            let t = tallies.get(&p.id).copied().unwrap_or_default();
            Standing {
                rank: 0,
                player_id: p.id,
                first_name: p.first_name.clone(),
                last_name: p.last_name.clone(),
                wins: t.wins,
                losses: t.losses,
                points_scored: t.scored,
                points_allowed: t.allowed,
                point_diff: i64::from(t.scored) - i64::from(t.allowed),
            }
        })
        .collect();

    rows.sort_by(standing_order);
    for (idx, row) in rows.iter_mut().enumerate() {
        row.rank = idx + 1;
    }
    rows
}

/// Wins, then point differential, then points scored (all descending), then last name.
/// First name and id only separate rows that are otherwise identical.
pub fn standing_order(a: &Standing, b: &Standing) -> Ordering {
    b.wins
        .cmp(&a.wins)
        .then(b.point_diff.cmp(&a.point_diff))
        .then(b.points_scored.cmp(&a.points_scored))
        .then_with(|| a.last_name.to_lowercase().cmp(&b.last_name.to_lowercase()))
        .then_with(|| a.first_name.to_lowercase().cmp(&b.first_name.to_lowercase()))
        .then(a.player_id.cmp(&b.player_id))
}

pub fn seeds(standings: &[Standing]) -> Vec<PlayerId> {
    standings.iter().map(|row| row.player_id).collect()
}

fn apply_match(tallies: &mut HashMap<PlayerId, Tally>, m: &Match) {
    let Some(player2) = m.player2_id else {
        return;
    };
    if !tallies.contains_key(&m.player1_id) || !tallies.contains_key(&player2) {
        return;
    }

    match m.outcome() {
        Outcome::DoubleForfeit => {
            for id in [m.player1_id, player2] {
                if let Some(t) = tallies.get_mut(&id) {
                    t.losses += 1;
                }
            }
            return;
        }
        Outcome::Won { winner, loser } => {
            if let Some(t) = tallies.get_mut(&winner) {
                t.wins += 1;
            }
            if let Some(t) = tallies.get_mut(&loser) {
                t.losses += 1;
            }
        }
        Outcome::Pending | Outcome::Bye { .. } => {}
    }

    let score1 = m.score1.unwrap_or(0);
    let score2 = m.score2.unwrap_or(0);
    if let Some(t) = tallies.get_mut(&m.player1_id) {
        t.scored += score1;
        t.allowed += score2;
    }
    if let Some(t) = tallies.get_mut(&player2) {
        t.scored += score2;
        t.allowed += score1;
    }
}
