use std::path::Path;

use log::{debug, info};
use rusqlite::Connection;
use serde::Serialize;

use crate::bracket::{Bracket, RoundView, build_bracket, bracket_view};
use crate::error::{LeagueError, Result};
use crate::model::{Match, MatchId, Player, PlayerId, SlotRef};
use crate::playoffs::advance_bracket;
use crate::profile::{PlayerProfile, player_profile};
use crate::rankings::{RankingScope, Standing, compute_rankings, seeds};
use crate::report::{ScoreReport, report_match, resolve};
use crate::schedule::generate_schedule;
use crate::store;
use crate::week::{WeekChange, advance_week, season_complete};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleSummary {
    pub weeks: u32,
    pub matches: usize,
    pub byes: usize,
    /// Regular-season matches removed to make room for the new schedule.
    pub replaced: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlayoffProgress {
    pub created: Vec<Match>,
    pub halted: Vec<SlotRef>,
    pub champion: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueStatus {
    pub current_week: u32,
    pub players: usize,
    pub scheduled_weeks: u32,
    pub unreported_regular: usize,
    pub playoffs_started: bool,
    pub season_complete: bool,
    pub can_start_playoffs: bool,
    pub champion: Option<PlayerId>,
}

/// League state behind a SQLite connection. Every mutation runs in its own transaction and
/// either fully applies or leaves the database untouched.
pub struct League {
    conn: Connection,
}

impl League {
    pub fn open(path: &Path) -> Result<Self> {
        debug!("opening league database {}", path.display());
        Ok(Self {
            conn: store::open_db(path)?,
        })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: store::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn sign_up(&mut self, external_id: &str, first_name: &str, last_name: &str) -> Result<Player> {
        let external_id = external_id.trim().to_uppercase();
        let first_name = first_name.trim();
        let last_name = last_name.trim();
        if external_id.is_empty() || first_name.is_empty() || last_name.is_empty() {
            return Err(LeagueError::Validation(
                "external id, first name and last name are all required".to_string(),
            ));
        }

        let tx = self.conn.transaction()?;
        if store::external_id_taken(&tx, &external_id)? {
            return Err(LeagueError::StateConflict(format!(
                "a player with id {external_id} is already signed up"
            )));
        }
        let player = store::insert_player(&tx, &external_id, first_name, last_name)?;
        tx.commit()?;
        info!("signed up player {} ({})", player.id, player.full_name());
        Ok(player)
    }

    pub fn players(&self) -> Result<Vec<Player>> {
        store::load_players(&self.conn)
    }

    pub fn player(&self, player_id: PlayerId) -> Result<Player> {
        store::load_player(&self.conn, player_id)?
            .ok_or_else(|| LeagueError::NotFound(format!("player {player_id}")))
    }

    pub fn matches(&self) -> Result<Vec<Match>> {
        store::load_matches(&self.conn)
    }

    pub fn get_match(&self, match_id: MatchId) -> Result<Match> {
        store::load_match(&self.conn, match_id)?
            .ok_or_else(|| LeagueError::NotFound(format!("match {match_id}")))
    }

    pub fn current_week(&self) -> Result<u32> {
        store::current_week(&self.conn)
    }

    /// Replace the regular season with a fresh round robin and reset the clock to week 1.
    /// Replacing any existing regular-season match needs `confirmed`.
    pub fn generate_schedule(&mut self, confirmed: bool) -> Result<ScheduleSummary> {
        let tx = self.conn.transaction()?;
        let players = store::load_players(&tx)?;
        let existing = store::load_matches(&tx)?;

        let replacing = existing.iter().filter(|m| !m.is_playoff()).count();
        if replacing > 0 && !confirmed {
            return Err(LeagueError::confirmation(
                "regenerating the schedule",
                replacing,
            ));
        }

        let ids: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
        let planned = generate_schedule(&ids)?;

        let replaced = store::delete_regular_matches(&tx)?;
        let created = store::insert_matches(&tx, &planned)?;
        store::set_current_week(&tx, 1)?;
        tx.commit()?;

        let summary = ScheduleSummary {
            weeks: created.iter().filter_map(Match::week).max().unwrap_or(0),
            matches: created.iter().filter(|m| !m.is_bye()).count(),
            byes: created.iter().filter(|m| m.is_bye()).count(),
            replaced,
        };
        info!(
            "generated schedule: {} match(es), {} bye(s) over {} week(s); replaced {}",
            summary.matches, summary.byes, summary.weeks, summary.replaced
        );
        Ok(summary)
    }

    pub fn report_match(&mut self, match_id: MatchId, report: &ScoreReport) -> Result<Match> {
        let tx = self.conn.transaction()?;
        let mut m = store::load_match(&tx, match_id)?
            .ok_or_else(|| LeagueError::NotFound(format!("match {match_id}")))?;
        let current_week = store::current_week(&tx)?;

        let resolution = report_match(&m, report, current_week)?;
        store::save_resolution(&tx, match_id, &resolution)?;
        tx.commit()?;

        resolution.apply(&mut m);
        info!(
            "reported match {match_id}: {}",
            m.summary().unwrap_or_default()
        );
        Ok(m)
    }

    /// Admin override: re-resolve a match regardless of reporting windows, e.g. to replace a
    /// double forfeit. Playoff matches are locked once their successor exists.
    pub fn correct_match(&mut self, match_id: MatchId, report: &ScoreReport) -> Result<Match> {
        let tx = self.conn.transaction()?;
        let mut m = store::load_match(&tx, match_id)?
            .ok_or_else(|| LeagueError::NotFound(format!("match {match_id}")))?;

        if let Some(next) = m.next_slot() {
            let matches = store::load_matches(&tx)?;
            let advanced = Bracket::from_matches(&matches)?
                .is_some_and(|bracket| bracket.node(next).is_some());
            if advanced {
                return Err(LeagueError::StateConflict(format!(
                    "match {match_id} already feeds round {} slot {}; delete that match first",
                    next.round, next.slot
                )));
            }
        }

        let resolution = resolve(&m, report)?;
        store::save_resolution(&tx, match_id, &resolution)?;
        tx.commit()?;

        resolution.apply(&mut m);
        info!(
            "corrected match {match_id}: {}",
            m.summary().unwrap_or_default()
        );
        Ok(m)
    }

    pub fn standings(&self, scope: RankingScope) -> Result<Vec<Standing>> {
        let players = store::load_players(&self.conn)?;
        let matches = store::load_matches(&self.conn)?;
        Ok(compute_rankings(&players, &matches, scope))
    }

    /// Move the league clock. Forward jumps double-forfeit every open match left behind.
    pub fn advance_week(&mut self, target_week: u32, confirmed: bool) -> Result<WeekChange> {
        let tx = self.conn.transaction()?;
        let current = store::current_week(&tx)?;
        let matches = store::load_matches(&tx)?;
        let change = advance_week(current, target_week, confirmed, &matches)?;
        if change.is_noop() {
            return Ok(change);
        }

        store::mark_double_forfeits(&tx, &change.forfeited)?;
        store::set_current_week(&tx, change.to)?;
        tx.commit()?;

        info!(
            "week {} -> {}: {} match(es) forfeited",
            change.from,
            change.to,
            change.forfeited.len()
        );
        if change.season_complete {
            info!("regular season complete");
        }
        Ok(change)
    }

    /// Seed a new bracket from regular-season standings. An existing bracket is only
    /// replaced with `force`.
    pub fn build_playoff_bracket(&mut self, force: bool) -> Result<PlayoffProgress> {
        let tx = self.conn.transaction()?;
        let players = store::load_players(&tx)?;
        let matches = store::load_matches(&tx)?;

        if matches.iter().any(Match::is_playoff) {
            if !force {
                return Err(LeagueError::StateConflict(
                    "playoff bracket already exists; rebuild with force".to_string(),
                ));
            }
            let removed = store::delete_playoff_matches(&tx)?;
            info!("removed {removed} existing playoff match(es)");
        }

        let standings = compute_rankings(&players, &matches, RankingScope::RegularSeason);
        let first_round = build_bracket(&seeds(&standings))?;
        let mut created = store::insert_matches(&tx, &first_round)?;

        let all = store::load_matches(&tx)?;
        let progress = advance_stored(&tx, &all)?;
        tx.commit()?;

        info!(
            "built playoff bracket for {} player(s): {} first-round match(es)",
            players.len(),
            created.len()
        );
        created.extend(progress.created);
        Ok(PlayoffProgress {
            created,
            halted: progress.halted,
            champion: progress.champion,
        })
    }

    /// Create every next-round match whose feeders are decided.
    pub fn advance_playoffs(&mut self) -> Result<PlayoffProgress> {
        let tx = self.conn.transaction()?;
        let matches = store::load_matches(&tx)?;
        let progress = advance_stored(&tx, &matches)?;
        tx.commit()?;
        Ok(progress)
    }

    pub fn bracket(&self) -> Result<Option<Bracket>> {
        Bracket::from_matches(&store::load_matches(&self.conn)?)
    }

    pub fn bracket_view(&self) -> Result<Vec<RoundView>> {
        Ok(self.bracket()?.map(|b| bracket_view(&b)).unwrap_or_default())
    }

    /// Remove a player and their unplayed matches. Anyone in the bracket or with a reported
    /// result is protected.
    pub fn delete_player(&mut self, player_id: PlayerId) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let player = store::load_player(&tx, player_id)?
            .ok_or_else(|| LeagueError::NotFound(format!("player {player_id}")))?;
        let matches = store::load_matches(&tx)?;

        if matches.iter().any(|m| m.is_playoff() && m.involves(player_id)) {
            return Err(LeagueError::Precondition(format!(
                "{} appears in the playoff bracket and cannot be deleted",
                player.full_name()
            )));
        }
        let reported = matches
            .iter()
            .filter(|m| m.is_played() && m.involves(player_id))
            .count();
        if reported > 0 {
            return Err(LeagueError::Precondition(format!(
                "{} has {reported} reported match(es) and cannot be deleted",
                player.full_name()
            )));
        }

        let removed = store::delete_matches_for_player(&tx, player_id)?;
        store::delete_player(&tx, player_id)?;
        tx.commit()?;
        info!(
            "deleted player {player_id} ({}) and {removed} scheduled match(es)",
            player.full_name()
        );
        Ok(removed)
    }

    /// Unconditional; standings and bracket advancement simply re-derive without it.
    pub fn delete_match(&mut self, match_id: MatchId) -> Result<()> {
        let tx = self.conn.transaction()?;
        if store::delete_match(&tx, match_id)? == 0 {
            return Err(LeagueError::NotFound(format!("match {match_id}")));
        }
        tx.commit()?;
        info!("deleted match {match_id}");
        Ok(())
    }

    pub fn reset_league(&mut self, confirmed: bool) -> Result<(usize, usize)> {
        let tx = self.conn.transaction()?;
        let matches = store::load_matches(&tx)?.len();
        let players = store::load_players(&tx)?.len();
        if (matches > 0 || players > 0) && !confirmed {
            return Err(LeagueError::confirmation("resetting the league", matches));
        }
        let removed = store::delete_all(&tx)?;
        store::set_current_week(&tx, 1)?;
        tx.commit()?;
        info!(
            "league reset: {} match(es) and {} player(s) removed",
            removed.0, removed.1
        );
        Ok(removed)
    }

    pub fn status(&self) -> Result<LeagueStatus> {
        let current_week = store::current_week(&self.conn)?;
        let players = store::load_players(&self.conn)?;
        let matches = store::load_matches(&self.conn)?;

        let regular: Vec<&Match> = matches.iter().filter(|m| !m.is_playoff()).collect();
        let unreported_regular = regular.iter().filter(|m| m.is_open()).count();
        let playoffs_started = matches.iter().any(Match::is_playoff);
        let champion = Bracket::from_matches(&matches)?.and_then(|b| b.champion());

        Ok(LeagueStatus {
            current_week,
            players: players.len(),
            scheduled_weeks: regular.iter().filter_map(|m| m.week()).max().unwrap_or(0),
            unreported_regular,
            playoffs_started,
            season_complete: season_complete(current_week, &matches),
            can_start_playoffs: !regular.is_empty() && unreported_regular == 0 && !playoffs_started,
            champion,
        })
    }

    pub fn player_profile(&self, player_id: PlayerId) -> Result<PlayerProfile> {
        let players = store::load_players(&self.conn)?;
        let matches = store::load_matches(&self.conn)?;
        player_profile(player_id, &players, &matches)
    }
}

fn advance_stored(conn: &Connection, matches: &[Match]) -> Result<PlayoffProgress> {
    let Some(mut bracket) = Bracket::from_matches(matches)? else {
        return Err(LeagueError::Precondition(
            "no playoff bracket has been built".to_string(),
        ));
    };
    let advancement = advance_bracket(&mut bracket);
    let created = store::insert_matches(conn, &advancement.new_matches)?;
    for m in &created {
        if let Some(at) = m.playoff_slot() {
            info!(
                "created playoff match {} in round {} slot {}",
                m.id, at.round, at.slot
            );
        }
    }
    if let Some(champion) = advancement.champion {
        info!("playoffs complete; champion is player {champion}");
    }
    Ok(PlayoffProgress {
        created,
        halted: advancement.halted,
        champion: advancement.champion,
    })
}
