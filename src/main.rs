use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};

use pingpong_league::LeagueError;
use pingpong_league::bracket::SlotState;
use pingpong_league::config::LeagueConfig;
use pingpong_league::league::League;
use pingpong_league::model::{Player, PlayerId, Side};
use pingpong_league::profile::MatchResult;
use pingpong_league::rankings::{RankingScope, Standing};
use pingpong_league::report::ScoreReport;

#[derive(clap::Parser)]
#[clap(version, about = "Ping-pong league administration")]
struct Args {
    /// SQLite database file; overrides LEAGUE_DB_PATH.
    #[clap(long, global = true)]
    db: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Register a player.
    Signup {
        external_id: String,
        first_name: String,
        last_name: String,
    },
    /// List players in signup order.
    Players,
    /// Regenerate the regular-season round robin and reset to week 1.
    Schedule {
        #[clap(long)]
        yes: bool,
    },
    /// Move the league clock; skipped open matches become double forfeits.
    Week {
        target: u32,
        #[clap(long)]
        yes: bool,
    },
    /// Report the result of a match in the open week or the playoffs.
    Report {
        match_id: i64,
        #[clap(flatten)]
        result: ResultArgs,
    },
    /// Admin correction that ignores reporting windows.
    Correct {
        match_id: i64,
        #[clap(flatten)]
        result: ResultArgs,
    },
    Standings {
        /// Include playoff matches.
        #[clap(long)]
        all: bool,
        #[clap(long)]
        json: bool,
    },
    Profile {
        player_id: PlayerId,
        #[clap(long)]
        json: bool,
    },
    Status {
        #[clap(long)]
        json: bool,
    },
    #[clap(subcommand)]
    Playoffs(PlayoffsCommand),
    /// Show every bracket round, including slots not created yet.
    Bracket {
        #[clap(long)]
        json: bool,
    },
    DeletePlayer {
        player_id: PlayerId,
    },
    DeleteMatch {
        match_id: i64,
    },
    /// Remove every player and match.
    Reset {
        #[clap(long)]
        yes: bool,
    },
}

#[derive(clap::Subcommand)]
enum PlayoffsCommand {
    /// Seed the bracket from regular-season standings.
    Build {
        #[clap(long)]
        force: bool,
    },
    /// Create next-round matches for decided pairs.
    Advance,
}

#[derive(clap::Args)]
struct ResultArgs {
    /// Game score as A-B, player 1 first; repeat for each game played.
    #[clap(long = "game", value_parser = parse_game)]
    games: Vec<(i32, i32)>,
    #[clap(long, value_enum, conflicts_with_all = ["games", "double_forfeit"])]
    forfeit: Option<ForfeitingSide>,
    #[clap(long, conflicts_with = "games")]
    double_forfeit: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ForfeitingSide {
    P1,
    P2,
}

impl ResultArgs {
    fn into_report(self) -> Result<ScoreReport> {
        if self.double_forfeit {
            return Ok(ScoreReport::DoubleForfeit);
        }
        if let Some(side) = self.forfeit {
            let forfeiting = match side {
                ForfeitingSide::P1 => Side::Player1,
                ForfeitingSide::P2 => Side::Player2,
            };
            return Ok(ScoreReport::Forfeit { forfeiting });
        }
        if self.games.is_empty() {
            return Err(anyhow!(
                "pass --game A-B for each game, --forfeit p1|p2, or --double-forfeit"
            ));
        }
        Ok(ScoreReport::Games { games: self.games })
    }
}

fn parse_game(raw: &str) -> Result<(i32, i32), String> {
    let (a, b) = raw
        .split_once(['-', ':'])
        .ok_or_else(|| format!("expected A-B, got {raw:?}"))?;
    let a = a.trim().parse::<i32>().map_err(|e| format!("{a:?}: {e}"))?;
    let b = b.trim().parse::<i32>().map_err(|e| format!("{b:?}: {e}"))?;
    Ok((a, b))
}

fn main() -> ExitCode {
    let args = <Args as clap::Parser>::parse();
    let config = LeagueConfig::load().with_db_path(args.db);
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .init();

    match run(&config, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<LeagueError>() {
                Some(league_err) => {
                    eprintln!("error [{:?}]: {league_err}", league_err.kind());
                    if let Some(impact) = league_err.impact() {
                        eprintln!("rerun with --yes to apply ({impact} match(es) affected)");
                    }
                }
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(config: &LeagueConfig, command: Command) -> Result<()> {
    let mut league = League::open(&config.db_path)
        .with_context(|| format!("open league db {}", config.db_path.display()))?;

    match command {
        Command::Signup {
            external_id,
            first_name,
            last_name,
        } => {
            let player = league.sign_up(&external_id, &first_name, &last_name)?;
            println!(
                "Signed up #{} {} ({})",
                player.id,
                player.full_name(),
                player.external_id
            );
        }
        Command::Players => {
            for p in league.players()? {
                println!("{:>4}  {:<10} {}", p.id, p.external_id, p.full_name());
            }
        }
        Command::Schedule { yes } => {
            let summary = league.generate_schedule(yes)?;
            println!(
                "Scheduled {} match(es) and {} bye(s) over {} week(s); now week 1",
                summary.matches, summary.byes, summary.weeks
            );
        }
        Command::Week { target, yes } => {
            let change = league.advance_week(target, yes)?;
            if change.is_noop() {
                println!("Already in week {}", change.to);
            } else {
                println!(
                    "Week {} -> {} ({} match(es) forfeited)",
                    change.from,
                    change.to,
                    change.forfeited.len()
                );
            }
            if change.season_complete {
                println!("Regular season complete; run `playoffs build` to seed the bracket");
            }
        }
        Command::Report { match_id, result } => {
            let m = league.report_match(match_id, &result.into_report()?)?;
            println!(
                "Match {} reported: {}",
                m.id,
                m.summary().unwrap_or_default()
            );
        }
        Command::Correct { match_id, result } => {
            let m = league.correct_match(match_id, &result.into_report()?)?;
            println!(
                "Match {} corrected: {}",
                m.id,
                m.summary().unwrap_or_default()
            );
        }
        Command::Standings { all, json } => {
            let scope = if all {
                RankingScope::AllMatches
            } else {
                RankingScope::RegularSeason
            };
            let rows = league.standings(scope)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_standings(&rows);
            }
        }
        Command::Profile { player_id, json } => {
            let profile = league.player_profile(player_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
                return Ok(());
            }
            let s = &profile.stats;
            println!(
                "{} ({}) rank {}",
                profile.player.full_name(),
                profile.player.external_id,
                profile
                    .rank
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
            println!(
                "W-L {}-{} ({:.1}%)  points {}/{} ({:+})  playoffs {}-{}",
                s.wins,
                s.losses,
                s.win_pct,
                s.points_scored,
                s.points_allowed,
                s.point_diff,
                s.playoff_wins,
                s.playoff_losses
            );
            for h in &profile.history {
                let when = match (h.week, h.playoff_round) {
                    (Some(w), _) => format!("week {w}"),
                    (None, Some(r)) => format!("playoff round {r}"),
                    (None, None) => "-".to_string(),
                };
                let result = match h.result {
                    MatchResult::Win => "Win",
                    MatchResult::Loss => "Loss",
                    MatchResult::DoubleForfeit => "Double Forfeit",
                };
                println!(
                    "  {when:<16} vs {:<24} {result:<14} {}",
                    h.opponent_name, h.summary
                );
            }
        }
        Command::Status { json } => {
            let status = league.status()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
                return Ok(());
            }
            println!("Week: {}", status.current_week);
            println!("Players: {}", status.players);
            println!("Scheduled weeks: {}", status.scheduled_weeks);
            println!("Unreported regular matches: {}", status.unreported_regular);
            println!("Season complete: {}", status.season_complete);
            println!("Playoffs started: {}", status.playoffs_started);
            println!("Can start playoffs: {}", status.can_start_playoffs);
            if let Some(champion) = status.champion {
                let player = league.player(champion)?;
                println!("Champion: {}", player.full_name());
            }
        }
        Command::Playoffs(PlayoffsCommand::Build { force }) => {
            let progress = league.build_playoff_bracket(force)?;
            println!("Bracket built: {} match(es) created", progress.created.len());
        }
        Command::Playoffs(PlayoffsCommand::Advance) => {
            let progress = league.advance_playoffs()?;
            println!("{} playoff match(es) created", progress.created.len());
            for at in &progress.halted {
                println!(
                    "round {} slot {} is blocked by a double forfeit; correct or delete the feeder match",
                    at.round, at.slot
                );
            }
            if let Some(champion) = progress.champion {
                println!("Champion: {}", league.player(champion)?.full_name());
            }
        }
        Command::Bracket { json } => {
            let rounds = league.bracket_view()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rounds)?);
                return Ok(());
            }
            if rounds.is_empty() {
                println!("No playoff bracket yet");
                return Ok(());
            }
            let players = league.players()?;
            for round in &rounds {
                println!("{}", round.label);
                for slot in &round.slots {
                    let line = match slot.state {
                        SlotState::Future => "TBD vs TBD".to_string(),
                        SlotState::Bye => {
                            format!("{} (bye)", name_of(&players, slot.player1_id))
                        }
                        _ => format!(
                            "{} vs {}  {}",
                            name_of(&players, slot.player1_id),
                            name_of(&players, slot.player2_id),
                            slot.summary.as_deref().unwrap_or("pending")
                        ),
                    };
                    let id = slot
                        .match_id
                        .map(|id| format!("#{id}"))
                        .unwrap_or_default();
                    println!("  {id:>5} {line}");
                }
            }
        }
        Command::DeletePlayer { player_id } => {
            let removed = league.delete_player(player_id)?;
            println!("Player {player_id} deleted with {removed} scheduled match(es)");
        }
        Command::DeleteMatch { match_id } => {
            league.delete_match(match_id)?;
            println!("Match {match_id} deleted; standings and bracket advancement may change");
        }
        Command::Reset { yes } => {
            let (matches, players) = league.reset_league(yes)?;
            println!("Removed {matches} match(es) and {players} player(s)");
        }
    }
    Ok(())
}

fn print_standings(rows: &[Standing]) {
    println!(
        "{:>4}  {:<28} {:>3} {:>3} {:>6} {:>6} {:>6}",
        "#", "Player", "W", "L", "PF", "PA", "Diff"
    );
    for row in rows {
        println!(
            "{:>4}  {:<28} {:>3} {:>3} {:>6} {:>6} {:>+6}",
            row.rank,
            format!("{} {}", row.first_name, row.last_name),
            row.wins,
            row.losses,
            row.points_scored,
            row.points_allowed,
            row.point_diff
        );
    }
}

fn name_of(players: &[Player], id: Option<PlayerId>) -> String {
    id.and_then(|id| players.iter().find(|p| p.id == id))
        .map(Player::full_name)
        .unwrap_or_else(|| "TBD".to_string())
}
