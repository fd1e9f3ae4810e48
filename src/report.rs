use serde::{Deserialize, Serialize};

use crate::error::{LeagueError, Result};
use crate::model::{
    FORFEIT_WIN_POINTS, GAMES_TO_WIN, GameScore, MAX_GAME_POINTS, MAX_GAMES, Match, PlayerId, Side,
    Stage,
};

/// What the shell submits for a match: raw per-game scores or a forfeit marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreReport {
    Games { games: Vec<(i32, i32)> },
    Forfeit { forfeiting: Side },
    DoubleForfeit,
}

impl ScoreReport {
    pub fn games(games: &[(i32, i32)]) -> Self {
        Self::Games {
            games: games.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub games: [Option<GameScore>; MAX_GAMES],
    pub score1: Option<u32>,
    pub score2: Option<u32>,
    pub double_forfeit: bool,
    pub winner: Option<PlayerId>,
}

impl Resolution {
    pub fn apply(&self, m: &mut Match) {
        m.games = self.games;
        m.score1 = self.score1;
        m.score2 = self.score2;
        m.double_forfeit = self.double_forfeit;
        m.reported = true;
    }
}

/// Validate and resolve a report for a match the shell is allowed to report right now.
pub fn report_match(m: &Match, report: &ScoreReport, current_week: u32) -> Result<Resolution> {
    check_reportable(m, current_week)?;
    resolve(m, report)
}

/// Regular-season matches are only open during their own week; playoff matches are open
/// once they exist. Byes never take a report.
pub fn check_reportable(m: &Match, current_week: u32) -> Result<()> {
    if m.is_bye() {
        return Err(LeagueError::StateConflict(
            "byes do not require score reports".to_string(),
        ));
    }
    if m.reported {
        return Err(LeagueError::StateConflict(format!(
            "match {} has already been reported",
            m.id
        )));
    }
    if let Stage::Regular { week } = m.stage {
        if week > current_week {
            return Err(LeagueError::StateConflict(format!(
                "week {week} is not open for reporting yet (current week is {current_week})"
            )));
        }
        if week < current_week {
            return Err(LeagueError::StateConflict(format!(
                "reporting for week {week} has closed (current week is {current_week})"
            )));
        }
    }
    Ok(())
}

/// Turn a report into stored scores without looking at reporting windows.
pub fn resolve(m: &Match, report: &ScoreReport) -> Result<Resolution> {
    let Some(player2) = m.player2_id else {
        return Err(LeagueError::StateConflict(
            "byes do not require score reports".to_string(),
        ));
    };

    match report {
        ScoreReport::Games { games } => {
            let games = validate_games(games)?;
            let (score1, score2) = games
                .iter()
                .flatten()
                .fold((0, 0), |(a, b), g| (a + g.player1, b + g.player2));
            let wins1 = games
                .iter()
                .flatten()
                .filter(|g| g.winner() == Some(Side::Player1))
                .count();
            let winner = if wins1 >= GAMES_TO_WIN {
                m.player1_id
            } else {
                player2
            };
            Ok(Resolution {
                games,
                score1: Some(score1),
                score2: Some(score2),
                double_forfeit: false,
                winner: Some(winner),
            })
        }
        ScoreReport::Forfeit { forfeiting } => {
            let (score1, score2, winner) = match forfeiting {
                Side::Player1 => (0, FORFEIT_WIN_POINTS, player2),
                Side::Player2 => (FORFEIT_WIN_POINTS, 0, m.player1_id),
            };
            Ok(Resolution {
                games: [None; MAX_GAMES],
                score1: Some(score1),
                score2: Some(score2),
                double_forfeit: false,
                winner: Some(winner),
            })
        }
        ScoreReport::DoubleForfeit => Ok(double_forfeit()),
    }
}

pub fn double_forfeit() -> Resolution {
    Resolution {
        games: [None; MAX_GAMES],
        score1: None,
        score2: None,
        double_forfeit: true,
        winner: None,
    }
}

/// Best of three to 11: every game needs a winner, nothing is played after a player reaches
/// two game wins, and someone must get there.
pub fn validate_games(raw: &[(i32, i32)]) -> Result<[Option<GameScore>; MAX_GAMES]> {
    if raw.len() > MAX_GAMES {
        return Err(LeagueError::Validation(format!(
            "best-of-three allows at most {MAX_GAMES} games, got {}",
            raw.len()
        )));
    }

    let mut out = [None; MAX_GAMES];
    let (mut wins1, mut wins2) = (0, 0);
    for (idx, &(a, b)) in raw.iter().enumerate() {
        let game = idx + 1;
        if a < 0 || b < 0 {
            return Err(LeagueError::invalid_score(game, "scores cannot be negative"));
        }
        if a > MAX_GAME_POINTS || b > MAX_GAME_POINTS {
            return Err(LeagueError::invalid_score(
                game,
                format!("scores above {MAX_GAME_POINTS} look like a typo; an admin can correct the match"),
            ));
        }
        if a == b {
            return Err(LeagueError::invalid_score(game, "games cannot end in a tie"));
        }
        if wins1 == GAMES_TO_WIN || wins2 == GAMES_TO_WIN {
            return Err(LeagueError::invalid_score(
                game,
                "played after the match was already decided",
            ));
        }
        if a > b {
            wins1 += 1;
        } else {
            wins2 += 1;
        }
        out[idx] = Some(GameScore::new(a as u32, b as u32));
    }

    if wins1 < GAMES_TO_WIN && wins2 < GAMES_TO_WIN {
        return Err(LeagueError::Validation(
            "best-of-three needs one player with two game wins".to_string(),
        ));
    }
    Ok(out)
}
