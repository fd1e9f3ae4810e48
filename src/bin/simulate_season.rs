use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pingpong_league::config::LeagueConfig;
use pingpong_league::league::League;
use pingpong_league::model::MAX_WEEKS;
use pingpong_league::rankings::RankingScope;
use pingpong_league::report::ScoreReport;
use pingpong_league::week::SEASON_CLOSED_WEEK;

const DEFAULT_PLAYERS: usize = 10;
const FIRST_NAMES: &[&str] = &[
    "Ada", "Ben", "Chen", "Dana", "Eli", "Fay", "Gus", "Hana", "Ivo", "Jun", "Kai", "Lena",
];
const LAST_NAMES: &[&str] = &[
    "Ito", "Novak", "Okafor", "Park", "Quinn", "Rossi", "Silva", "Tanaka", "Varga", "Weber",
];

fn main() -> Result<()> {
    let config = LeagueConfig::load();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .init();

    let players = parse_usize_arg("--players").unwrap_or(DEFAULT_PLAYERS);
    if players < 2 {
        return Err(anyhow!("a season needs at least 2 players"));
    }
    let seed = parse_usize_arg("--seed").map(|s| s as u64).unwrap_or(7);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut league = match parse_db_path_arg() {
        Some(path) => League::open(&path)
            .with_context(|| format!("open league db {}", path.display()))?,
        None => League::in_memory().context("open in-memory league")?,
    };

    league.reset_league(true)?;
    for idx in 0..players {
        let first = FIRST_NAMES[idx % FIRST_NAMES.len()];
        let last = LAST_NAMES[(idx / FIRST_NAMES.len() + idx) % LAST_NAMES.len()];
        league.sign_up(&format!("SIM{idx:03}"), first, last)?;
    }
    let schedule = league.generate_schedule(true)?;
    println!(
        "Simulating {players} players, {} week(s), seed {seed}",
        schedule.weeks
    );

    for week in 1..=MAX_WEEKS {
        let open: Vec<i64> = league
            .matches()?
            .iter()
            .filter(|m| m.is_open() && m.week() == Some(week))
            .map(|m| m.id)
            .collect();
        for match_id in open {
            league.report_match(match_id, &random_report(&mut rng))?;
        }
        league.advance_week(week + 1, true)?;
    }
    if league.current_week()? != SEASON_CLOSED_WEEK {
        return Err(anyhow!("league clock did not reach the end of the season"));
    }

    println!("Regular season standings");
    for row in league.standings(RankingScope::RegularSeason)?.iter().take(8) {
        println!(
            "  {:>2}. {} {}  {}-{}  ({:+})",
            row.rank, row.first_name, row.last_name, row.wins, row.losses, row.point_diff
        );
    }

    let mut progress = league.build_playoff_bracket(true)?;
    let mut passes = 0;
    while progress.champion.is_none() {
        passes += 1;
        if passes > 64 {
            return Err(anyhow!("playoffs did not finish; bracket may be blocked"));
        }
        let open: Vec<i64> = league
            .matches()?
            .iter()
            .filter(|m| m.is_playoff() && m.is_open())
            .map(|m| m.id)
            .collect();
        for match_id in open {
            league.report_match(match_id, &random_report(&mut rng))?;
        }
        progress = league.advance_playoffs()?;
    }

    if let Some(champion) = progress.champion {
        println!("Champion: {}", league.player(champion)?.full_name());
    }
    Ok(())
}

/// A decided best-of-three; never a forfeit so every branch of the bracket completes.
fn random_report(rng: &mut StdRng) -> ScoreReport {
    let player1_wins = rng.gen_bool(0.5);
    let sweep = rng.gen_bool(0.5);
    let mut games = Vec::with_capacity(3);
    let mut push = |winner_is_p1: bool, rng: &mut StdRng| {
        let loser = rng.gen_range(0..=9);
        games.push(if winner_is_p1 { (11, loser) } else { (loser, 11) });
    };
    if sweep {
        push(player1_wins, &mut *rng);
        push(player1_wins, &mut *rng);
    } else {
        push(player1_wins, &mut *rng);
        push(!player1_wins, &mut *rng);
        push(player1_wins, &mut *rng);
    }
    ScoreReport::Games { games }
}

fn parse_db_path_arg() -> Option<PathBuf> {
    parse_arg("--db").map(PathBuf::from)
}

fn parse_usize_arg(flag: &str) -> Option<usize> {
    parse_arg(flag).and_then(|raw| raw.parse().ok())
}

fn parse_arg(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
