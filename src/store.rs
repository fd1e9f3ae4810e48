use std::path::Path;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::Result;
use crate::model::{GameScore, MAX_GAMES, Match, MatchId, NewMatch, Player, PlayerId, SlotRef, Stage};
use crate::report::Resolution;

const CURRENT_WEEK_KEY: &str = "current_week";

const MATCH_COLUMNS: &str = "id, week, player1_id, player2_id, \
     game1_p1, game1_p2, game2_p1, game2_p2, game3_p1, game3_p2, \
     score1, score2, reported, double_forfeit, playoff, playoff_round, slot, \
     next_round, next_slot, created_at";

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS players (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            week INTEGER NULL,
            player1_id INTEGER NOT NULL REFERENCES players(id),
            player2_id INTEGER NULL REFERENCES players(id),
            game1_p1 INTEGER NULL,
            game1_p2 INTEGER NULL,
            game2_p1 INTEGER NULL,
            game2_p2 INTEGER NULL,
            game3_p1 INTEGER NULL,
            game3_p2 INTEGER NULL,
            score1 INTEGER NULL,
            score2 INTEGER NULL,
            reported INTEGER NOT NULL DEFAULT 0,
            double_forfeit INTEGER NOT NULL DEFAULT 0,
            playoff INTEGER NOT NULL DEFAULT 0,
            playoff_round INTEGER NULL,
            slot INTEGER NULL,
            next_round INTEGER NULL,
            next_slot INTEGER NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_week ON matches(week);
        CREATE INDEX IF NOT EXISTS idx_matches_playoff ON matches(playoff, playoff_round);
        CREATE INDEX IF NOT EXISTS idx_matches_player1 ON matches(player1_id);
        CREATE INDEX IF NOT EXISTS idx_matches_player2 ON matches(player2_id);

        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Current time at the precision the database keeps.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn bool_to_i64(v: bool) -> i64 {
    if v { 1 } else { 0 }
}

pub fn insert_player(
    conn: &Connection,
    external_id: &str,
    first_name: &str,
    last_name: &str,
) -> Result<Player> {
    let created_at = now();
    conn.execute(
        "INSERT INTO players (external_id, first_name, last_name, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![external_id, first_name, last_name, timestamp(created_at)],
    )?;
    Ok(Player {
        id: conn.last_insert_rowid(),
        external_id: external_id.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        created_at,
    })
}

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get(0)?,
        external_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        created_at: parse_timestamp(row, 4)?,
    })
}

/// Players in signup order.
pub fn load_players(conn: &Connection) -> Result<Vec<Player>> {
    let mut stmt = conn.prepare(
        "SELECT id, external_id, first_name, last_name, created_at FROM players ORDER BY created_at, id",
    )?;
    let rows = stmt.query_map([], player_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn load_player(conn: &Connection, player_id: PlayerId) -> Result<Option<Player>> {
    Ok(conn
        .query_row(
            "SELECT id, external_id, first_name, last_name, created_at FROM players WHERE id = ?1",
            params![player_id],
            player_from_row,
        )
        .optional()?)
}

pub fn external_id_taken(conn: &Connection, external_id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM players WHERE UPPER(external_id) = UPPER(?1)",
        params![external_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn delete_player(conn: &Connection, player_id: PlayerId) -> Result<usize> {
    Ok(conn.execute("DELETE FROM players WHERE id = ?1", params![player_id])?)
}

/// Byes are stored resolved: reported with no scores.
pub fn insert_match(conn: &Connection, new_match: &NewMatch) -> Result<Match> {
    let created_at = now();
    let (week, playoff, round, slot, next) = match new_match.stage {
        Stage::Regular { week } => (Some(week), false, None, None, None),
        Stage::Playoff { round, slot, next } => (None, true, Some(round), Some(slot), next),
    };
    let reported = new_match.is_bye();
    conn.execute(
        "INSERT INTO matches (week, player1_id, player2_id, reported, double_forfeit, playoff, \
         playoff_round, slot, next_round, next_slot, created_at) \
         VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            week,
            new_match.player1_id,
            new_match.player2_id,
            bool_to_i64(reported),
            bool_to_i64(playoff),
            round,
            slot,
            next.map(|n| n.round),
            next.map(|n| n.slot),
            timestamp(created_at),
        ],
    )?;
    Ok(Match {
        id: conn.last_insert_rowid(),
        stage: new_match.stage,
        player1_id: new_match.player1_id,
        player2_id: new_match.player2_id,
        games: [None; MAX_GAMES],
        score1: None,
        score2: None,
        reported,
        double_forfeit: false,
        created_at,
    })
}

pub fn insert_matches(conn: &Connection, new_matches: &[NewMatch]) -> Result<Vec<Match>> {
    new_matches.iter().map(|m| insert_match(conn, m)).collect()
}

fn match_from_row(row: &Row<'_>) -> rusqlite::Result<Match> {
    let mut games = [None; MAX_GAMES];
    for (idx, game) in games.iter_mut().enumerate() {
        let p1: Option<u32> = row.get(4 + idx * 2)?;
        let p2: Option<u32> = row.get(5 + idx * 2)?;
        if let (Some(p1), Some(p2)) = (p1, p2) {
            *game = Some(GameScore::new(p1, p2));
        }
    }

    let playoff = row.get::<_, i64>(14)? != 0;
    let stage = if playoff {
        let next_round: Option<u32> = row.get(17)?;
        let next_slot: Option<u32> = row.get(18)?;
        Stage::Playoff {
            round: row.get(15)?,
            slot: row.get(16)?,
            next: next_round.zip(next_slot).map(|(r, s)| SlotRef::new(r, s)),
        }
    } else {
        Stage::Regular { week: row.get(1)? }
    };

    Ok(Match {
        id: row.get(0)?,
        stage,
        player1_id: row.get(2)?,
        player2_id: row.get(3)?,
        games,
        score1: row.get(10)?,
        score2: row.get(11)?,
        reported: row.get::<_, i64>(12)? != 0,
        double_forfeit: row.get::<_, i64>(13)? != 0,
        created_at: parse_timestamp(row, 19)?,
    })
}

pub fn load_matches(conn: &Connection) -> Result<Vec<Match>> {
    let mut stmt = conn.prepare(&format!("SELECT {MATCH_COLUMNS} FROM matches ORDER BY id"))?;
    let rows = stmt.query_map([], match_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn load_match(conn: &Connection, match_id: MatchId) -> Result<Option<Match>> {
    Ok(conn
        .query_row(
            &format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = ?1"),
            params![match_id],
            match_from_row,
        )
        .optional()?)
}

pub fn save_resolution(conn: &Connection, match_id: MatchId, resolution: &Resolution) -> Result<()> {
    let g = |idx: usize| resolution.games[idx];
    conn.execute(
        "UPDATE matches SET game1_p1 = ?1, game1_p2 = ?2, game2_p1 = ?3, game2_p2 = ?4, \
         game3_p1 = ?5, game3_p2 = ?6, score1 = ?7, score2 = ?8, reported = 1, \
         double_forfeit = ?9 WHERE id = ?10",
        params![
            g(0).map(|s| s.player1),
            g(0).map(|s| s.player2),
            g(1).map(|s| s.player1),
            g(1).map(|s| s.player2),
            g(2).map(|s| s.player1),
            g(2).map(|s| s.player2),
            resolution.score1,
            resolution.score2,
            bool_to_i64(resolution.double_forfeit),
            match_id,
        ],
    )?;
    Ok(())
}

/// Record the listed matches as double forfeits: reported, no scores, no winner.
pub fn mark_double_forfeits(conn: &Connection, match_ids: &[MatchId]) -> Result<usize> {
    let mut stmt = conn.prepare(
        "UPDATE matches SET reported = 1, double_forfeit = 1, score1 = NULL, score2 = NULL, \
         game1_p1 = NULL, game1_p2 = NULL, game2_p1 = NULL, game2_p2 = NULL, \
         game3_p1 = NULL, game3_p2 = NULL WHERE id = ?1",
    )?;
    let mut changed = 0;
    for id in match_ids {
        changed += stmt.execute(params![id])?;
    }
    Ok(changed)
}

pub fn delete_match(conn: &Connection, match_id: MatchId) -> Result<usize> {
    Ok(conn.execute("DELETE FROM matches WHERE id = ?1", params![match_id])?)
}

pub fn delete_matches_for_player(conn: &Connection, player_id: PlayerId) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM matches WHERE player1_id = ?1 OR player2_id = ?1",
        params![player_id],
    )?)
}

pub fn delete_regular_matches(conn: &Connection) -> Result<usize> {
    Ok(conn.execute("DELETE FROM matches WHERE playoff = 0", [])?)
}

pub fn delete_playoff_matches(conn: &Connection) -> Result<usize> {
    Ok(conn.execute("DELETE FROM matches WHERE playoff = 1", [])?)
}

pub fn delete_all(conn: &Connection) -> Result<(usize, usize)> {
    let matches = conn.execute("DELETE FROM matches", [])?;
    let players = conn.execute("DELETE FROM players", [])?;
    Ok((matches, players))
}

/// Defaults to week 1 when the clock has never been set.
pub fn current_week(conn: &Connection) -> Result<u32> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![CURRENT_WEEK_KEY],
            |row| row.get(0),
        )
        .optional()?;
    Ok(raw.and_then(|v| v.trim().parse().ok()).unwrap_or(1))
}

pub fn set_current_week(conn: &Connection, week: u32) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![CURRENT_WEEK_KEY, week.to_string()],
    )?;
    Ok(())
}
