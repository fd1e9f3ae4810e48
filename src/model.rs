use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type PlayerId = i64;
pub type MatchId = i64;

/// Length of the regular season.
pub const MAX_WEEKS: u32 = 8;
pub const MAX_GAMES: usize = 3;
pub const GAMES_TO_WIN: usize = 2;
/// Upper bound on a single game score; anything above is treated as a typo.
pub const MAX_GAME_POINTS: i32 = 99;
/// Aggregate credited to the opponent of a single-sided forfeit (two games to 11).
pub const FORFEIT_WIN_POINTS: u32 = 22;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub external_id: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl Player {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player1,
    Player2,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Self::Player1 => Self::Player2,
            Self::Player2 => Self::Player1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameScore {
    pub player1: u32,
    pub player2: u32,
}

impl GameScore {
    pub fn new(player1: u32, player2: u32) -> Self {
        Self { player1, player2 }
    }

    pub fn winner(&self) -> Option<Side> {
        if self.player1 > self.player2 {
            Some(Side::Player1)
        } else if self.player2 > self.player1 {
            Some(Side::Player2)
        } else {
            None
        }
    }
}

/// Position of a playoff match in the bracket arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SlotRef {
    pub round: u32,
    pub slot: u32,
}

impl SlotRef {
    pub fn new(round: u32, slot: u32) -> Self {
        Self { round, slot }
    }
}

/// A match belongs to exactly one of the regular season or the playoff bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    Regular {
        week: u32,
    },
    Playoff {
        round: u32,
        slot: u32,
        next: Option<SlotRef>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Not reported yet, or reported without a determinable winner.
    Pending,
    Bye {
        player: PlayerId,
    },
    Won {
        winner: PlayerId,
        loser: PlayerId,
    },
    DoubleForfeit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub id: MatchId,
    pub stage: Stage,
    pub player1_id: PlayerId,
    pub player2_id: Option<PlayerId>,
    pub games: [Option<GameScore>; MAX_GAMES],
    pub score1: Option<u32>,
    pub score2: Option<u32>,
    pub reported: bool,
    pub double_forfeit: bool,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn is_bye(&self) -> bool {
        self.player2_id.is_none()
    }

    pub fn is_playoff(&self) -> bool {
        matches!(self.stage, Stage::Playoff { .. })
    }

    pub fn week(&self) -> Option<u32> {
        match self.stage {
            Stage::Regular { week } => Some(week),
            Stage::Playoff { .. } => None,
        }
    }

    pub fn playoff_round(&self) -> Option<u32> {
        self.playoff_slot().map(|slot| slot.round)
    }

    pub fn playoff_slot(&self) -> Option<SlotRef> {
        match self.stage {
            Stage::Playoff { round, slot, .. } => Some(SlotRef::new(round, slot)),
            Stage::Regular { .. } => None,
        }
    }

    pub fn next_slot(&self) -> Option<SlotRef> {
        match self.stage {
            Stage::Playoff { next, .. } => next,
            Stage::Regular { .. } => None,
        }
    }

    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.player1_id == player_id || self.player2_id == Some(player_id)
    }

    pub fn side_of(&self, player_id: PlayerId) -> Option<Side> {
        if self.player1_id == player_id {
            Some(Side::Player1)
        } else if self.player2_id == Some(player_id) {
            Some(Side::Player2)
        } else {
            None
        }
    }

    pub fn player(&self, side: Side) -> Option<PlayerId> {
        match side {
            Side::Player1 => Some(self.player1_id),
            Side::Player2 => self.player2_id,
        }
    }

    /// Reported and against a real opponent; byes never count.
    pub fn is_played(&self) -> bool {
        self.reported && !self.is_bye()
    }

    /// Awaiting a result: a real pairing with nothing reported yet.
    pub fn is_open(&self) -> bool {
        !self.reported && !self.is_bye()
    }

    pub fn game_scores(&self) -> Vec<GameScore> {
        self.games.iter().flatten().copied().collect()
    }

    pub fn game_wins(&self) -> (usize, usize) {
        self.games
            .iter()
            .flatten()
            .fold((0, 0), |(w1, w2), game| match game.winner() {
                Some(Side::Player1) => (w1 + 1, w2),
                Some(Side::Player2) => (w1, w2 + 1),
                None => (w1, w2),
            })
    }

    pub fn outcome(&self) -> Outcome {
        let Some(player2) = self.player2_id else {
            return Outcome::Bye {
                player: self.player1_id,
            };
        };
        if !self.reported {
            return Outcome::Pending;
        }
        if self.double_forfeit {
            return Outcome::DoubleForfeit;
        }

        let (left, right) = if self.games.iter().any(Option::is_some) {
            let (w1, w2) = self.game_wins();
            (w1 as u32, w2 as u32)
        } else {
            (self.score1.unwrap_or(0), self.score2.unwrap_or(0))
        };
        if left > right {
            Outcome::Won {
                winner: self.player1_id,
                loser: player2,
            }
        } else if right > left {
            Outcome::Won {
                winner: player2,
                loser: self.player1_id,
            }
        } else {
            Outcome::Pending
        }
    }

    /// Player who advances from this match: the bye holder or the decided winner.
    pub fn winner(&self) -> Option<PlayerId> {
        match self.outcome() {
            Outcome::Bye { player } => Some(player),
            Outcome::Won { winner, .. } => Some(winner),
            Outcome::Pending | Outcome::DoubleForfeit => None,
        }
    }

    pub fn summary(&self) -> Option<String> {
        if self.is_bye() {
            return Some("Bye".to_string());
        }
        if self.double_forfeit {
            return Some("Double Forfeit".to_string());
        }
        if !self.reported {
            return None;
        }
        let games = self.game_scores();
        if games.is_empty() {
            return Some(format!(
                "{} - {}",
                self.score1.unwrap_or(0),
                self.score2.unwrap_or(0)
            ));
        }
        let (w1, w2) = self.game_wins();
        let details = games
            .iter()
            .map(|g| format!("{}-{}", g.player1, g.player2))
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!("{w1}-{w2} ({details})"))
    }
}

/// Row about to be inserted; scores start empty and byes are born resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NewMatch {
    pub stage: Stage,
    pub player1_id: PlayerId,
    pub player2_id: Option<PlayerId>,
}

impl NewMatch {
    pub fn regular(week: u32, player1_id: PlayerId, player2_id: Option<PlayerId>) -> Self {
        Self {
            stage: Stage::Regular { week },
            player1_id,
            player2_id,
        }
    }

    pub fn playoff(
        at: SlotRef,
        next: Option<SlotRef>,
        player1_id: PlayerId,
        player2_id: Option<PlayerId>,
    ) -> Self {
        Self {
            stage: Stage::Playoff {
                round: at.round,
                slot: at.slot,
                next,
            },
            player1_id,
            player2_id,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.player2_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{GameScore, Match, Outcome, Stage};

    fn played(games: &[(u32, u32)]) -> Match {
        let mut slots = [None; 3];
        for (idx, (a, b)) in games.iter().enumerate() {
            slots[idx] = Some(GameScore::new(*a, *b));
        }
        Match {
            id: 1,
            stage: Stage::Regular { week: 1 },
            player1_id: 10,
            player2_id: Some(20),
            games: slots,
            score1: Some(games.iter().map(|g| g.0).sum()),
            score2: Some(games.iter().map(|g| g.1).sum()),
            reported: true,
            double_forfeit: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn games_decide_the_winner() {
        // Player 2 scores more points overall but wins only one game.
        let m = played(&[(11, 9), (2, 11), (11, 9)]);
        assert_eq!(
            m.outcome(),
            Outcome::Won {
                winner: 10,
                loser: 20
            }
        );
        assert_eq!(m.summary().as_deref(), Some("2-1 (11-9, 2-11, 11-9)"));
    }

    #[test]
    fn bye_advances_player_one() {
        let mut m = played(&[]);
        m.player2_id = None;
        assert_eq!(m.winner(), Some(10));
        assert_eq!(m.summary().as_deref(), Some("Bye"));
        assert!(!m.is_played());
    }
}
