use std::collections::HashSet;

use serde::Serialize;

use crate::error::{LeagueError, Result};
use crate::model::{MAX_WEEKS, Match, MatchId};

/// Week number meaning "regular season over"; nothing is open for reporting.
pub const SEASON_CLOSED_WEEK: u32 = MAX_WEEKS + 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekChange {
    pub from: u32,
    pub to: u32,
    /// Matches that become double forfeits when this change commits.
    pub forfeited: Vec<MatchId>,
    pub season_complete: bool,
}

impl WeekChange {
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Plan a move of the league clock. Jumping forward auto-forfeits every open match in the
/// weeks being skipped, which requires `confirmed`; jumping back only reopens weeks.
pub fn advance_week(
    current_week: u32,
    target_week: u32,
    confirmed: bool,
    matches: &[Match],
) -> Result<WeekChange> {
    if !(1..=SEASON_CLOSED_WEEK).contains(&target_week) {
        return Err(LeagueError::Validation(format!(
            "week must be between 1 and {SEASON_CLOSED_WEEK}, got {target_week}"
        )));
    }

    let forfeited = if target_week > current_week {
        pending_forfeits(current_week, target_week, matches)
    } else {
        Vec::new()
    };

    if !forfeited.is_empty() && !confirmed {
        return Err(LeagueError::confirmation(
            format!("advancing from week {current_week} to week {target_week}"),
            forfeited.len(),
        ));
    }

    let season_complete = season_complete_after(target_week, &forfeited, matches);
    Ok(WeekChange {
        from: current_week,
        to: target_week,
        forfeited,
        season_complete,
    })
}

/// Open regular-season matches scheduled in `[from_week, to_week)`.
pub fn pending_forfeits(from_week: u32, to_week: u32, matches: &[Match]) -> Vec<MatchId> {
    matches
        .iter()
        .filter(|m| m.is_open())
        .filter(|m| m.week().is_some_and(|w| w >= from_week && w < to_week))
        .map(|m| m.id)
        .collect()
}

pub fn season_complete(current_week: u32, matches: &[Match]) -> bool {
    season_complete_after(current_week, &[], matches)
}

fn season_complete_after(week: u32, forfeited: &[MatchId], matches: &[Match]) -> bool {
    if week <= MAX_WEEKS {
        return false;
    }
    let forfeited: HashSet<MatchId> = forfeited.iter().copied().collect();
    let mut regular = matches.iter().filter(|m| !m.is_playoff()).peekable();
    if regular.peek().is_none() {
        return false;
    }
    regular.all(|m| !m.is_open() || forfeited.contains(&m.id))
}
