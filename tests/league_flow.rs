use pingpong_league::ErrorKind;
use pingpong_league::league::League;
use pingpong_league::model::{Match, PlayerId};
use pingpong_league::rankings::RankingScope;
use pingpong_league::report::ScoreReport;

fn league_with(players: usize) -> (League, Vec<PlayerId>) {
    let mut league = League::in_memory().expect("in-memory league");
    let ids = (0..players)
        .map(|idx| {
            league
                .sign_up(&format!("p{idx:02}"), &format!("First{idx:02}"), &format!("Last{idx:02}"))
                .expect("signup")
                .id
        })
        .collect();
    (league, ids)
}

fn open_in_week(league: &League, week: u32) -> Vec<Match> {
    league
        .matches()
        .unwrap()
        .into_iter()
        .filter(|m| m.is_open() && m.week() == Some(week))
        .collect()
}

fn sweep() -> ScoreReport {
    ScoreReport::games(&[(11, 5), (11, 7)])
}

#[test]
fn two_players_play_one_week() {
    let (mut league, _) = league_with(2);
    let summary = league.generate_schedule(false).unwrap();
    assert_eq!(summary.weeks, 1);
    assert_eq!(summary.matches, 1);
    assert_eq!(summary.byes, 0);
    assert_eq!(league.current_week().unwrap(), 1);
}

#[test]
fn eight_players_fill_seven_weeks() {
    let (mut league, _) = league_with(8);
    league.generate_schedule(false).unwrap();
    let matches = league.matches().unwrap();
    for week in 1..=7 {
        let count = matches.iter().filter(|m| m.week() == Some(week)).count();
        assert_eq!(count, 4, "week {week}");
    }
    assert!(matches.iter().all(|m| m.week() != Some(8)));
    assert_eq!(matches.len(), 28);
}

#[test]
fn reporting_sets_aggregates_and_winner() {
    let (mut league, _) = league_with(4);
    league.generate_schedule(false).unwrap();
    let m = open_in_week(&league, 1).remove(0);

    let reported = league
        .report_match(m.id, &ScoreReport::games(&[(11, 9), (11, 7)]))
        .unwrap();
    assert!(reported.reported);
    assert_eq!((reported.score1, reported.score2), (Some(22), Some(16)));
    assert_eq!(reported.winner(), Some(m.player1_id));

    let again = league.report_match(m.id, &sweep()).unwrap_err();
    assert_eq!(again.kind(), ErrorKind::StateConflict);

    let stored = league.get_match(m.id).unwrap();
    assert_eq!(stored, reported);
}

#[test]
fn future_weeks_are_not_open() {
    let (mut league, _) = league_with(4);
    league.generate_schedule(false).unwrap();
    let later = open_in_week(&league, 2).remove(0);
    let err = league.report_match(later.id, &sweep()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);
    assert!(!league.get_match(later.id).unwrap().reported);
}

#[test]
fn invalid_scores_leave_the_match_untouched() {
    let (mut league, _) = league_with(2);
    league.generate_schedule(false).unwrap();
    let m = open_in_week(&league, 1).remove(0);
    let err = league
        .report_match(m.id, &ScoreReport::games(&[(11, 9), (10, 10)]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("game 2"));
    assert!(league.get_match(m.id).unwrap().is_open());
}

#[test]
fn single_forfeit_awards_the_opponent() {
    let (mut league, _) = league_with(2);
    league.generate_schedule(false).unwrap();
    let m = open_in_week(&league, 1).remove(0);
    let reported = league
        .report_match(
            m.id,
            &ScoreReport::Forfeit {
                forfeiting: pingpong_league::model::Side::Player1,
            },
        )
        .unwrap();
    assert_eq!(reported.winner(), m.player2_id);
    assert_eq!(reported.score1, Some(0));
    assert_eq!(reported.summary().as_deref(), Some("0 - 22"));
}

#[test]
fn same_week_is_a_noop() {
    let (mut league, _) = league_with(4);
    league.generate_schedule(false).unwrap();
    let before = league.matches().unwrap();
    let change = league.advance_week(1, false).unwrap();
    assert!(change.is_noop());
    assert!(change.forfeited.is_empty());
    assert_eq!(league.matches().unwrap(), before);
}

#[test]
fn forward_jump_needs_confirmation_then_forfeits() {
    let (mut league, ids) = league_with(4);
    league.generate_schedule(false).unwrap();
    let before = league.matches().unwrap();

    let err = league.advance_week(3, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfirmationRequired);
    assert_eq!(err.impact(), Some(4));
    assert_eq!(league.current_week().unwrap(), 1);
    assert_eq!(league.matches().unwrap(), before);

    let change = league.advance_week(3, true).unwrap();
    assert_eq!(change.forfeited.len(), 4);
    assert_eq!(league.current_week().unwrap(), 3);

    let standings = league.standings(RankingScope::RegularSeason).unwrap();
    for id in ids {
        let row = standings.iter().find(|r| r.player_id == id).unwrap();
        assert_eq!((row.wins, row.losses), (0, 2));
        assert_eq!(row.points_scored, 0);
    }

    // Going back reopens nothing that was forfeited.
    let back = league.advance_week(1, false).unwrap();
    assert!(back.forfeited.is_empty());
    assert!(open_in_week(&league, 1).is_empty());
}

#[test]
fn season_completes_after_week_eight() {
    let (mut league, _) = league_with(4);
    league.generate_schedule(false).unwrap();
    for week in 1..=3 {
        for m in open_in_week(&league, week) {
            league.report_match(m.id, &sweep()).unwrap();
        }
        if week < 3 {
            league.advance_week(week + 1, false).unwrap();
        }
    }
    assert!(!league.status().unwrap().season_complete);

    let change = league.advance_week(9, false).unwrap();
    assert!(change.season_complete);
    let status = league.status().unwrap();
    assert!(status.season_complete);
    assert!(status.can_start_playoffs);
    assert_eq!(status.unreported_regular, 0);
}

#[test]
fn week_out_of_range_is_rejected() {
    let (mut league, _) = league_with(2);
    assert_eq!(
        league.advance_week(0, true).unwrap_err().kind(),
        ErrorKind::Validation
    );
    assert_eq!(
        league.advance_week(10, true).unwrap_err().kind(),
        ErrorKind::Validation
    );
}

#[test]
fn regenerating_over_results_requires_confirmation() {
    let (mut league, _) = league_with(4);
    league.generate_schedule(false).unwrap();
    let m = open_in_week(&league, 1).remove(0);
    league.report_match(m.id, &sweep()).unwrap();
    league.advance_week(2, true).unwrap();

    let err = league.generate_schedule(false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfirmationRequired);
    assert_eq!(err.impact(), Some(6));
    assert_eq!(league.current_week().unwrap(), 2);

    let summary = league.generate_schedule(true).unwrap();
    assert_eq!(summary.replaced, 6);
    assert_eq!(league.current_week().unwrap(), 1);
    assert!(league.matches().unwrap().iter().all(|m| !m.reported));
}

#[test]
fn regenerating_an_untouched_schedule_still_asks() {
    let (mut league, _) = league_with(3);
    league.generate_schedule(false).unwrap();
    let before = league.matches().unwrap();

    let err = league.generate_schedule(false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfirmationRequired);
    assert_eq!(err.impact(), Some(before.len()));
    assert_eq!(league.matches().unwrap(), before);
}

#[test]
fn too_few_players_cannot_schedule() {
    let (mut league, _) = league_with(1);
    let err = league.generate_schedule(false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
}

#[test]
fn signup_normalises_and_rejects_duplicates() {
    let mut league = League::in_memory().unwrap();
    let player = league.sign_up("  ab123 ", "Ann", "Lee").unwrap();
    assert_eq!(player.external_id, "AB123");

    let err = league.sign_up("Ab123", "Other", "Person").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);
    let err = league.sign_up("cd456", " ", "Person").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(league.players().unwrap().len(), 1);
}

#[test]
fn players_with_results_are_protected() {
    let (mut league, ids) = league_with(4);
    league.generate_schedule(false).unwrap();
    let m = open_in_week(&league, 1).remove(0);
    league.report_match(m.id, &sweep()).unwrap();

    let err = league.delete_player(m.player1_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);

    let untouched = ids
        .iter()
        .copied()
        .find(|id| !m.involves(*id))
        .unwrap();
    let removed = league.delete_player(untouched).unwrap();
    assert_eq!(removed, 3);
    assert!(league.matches().unwrap().iter().all(|m| !m.involves(untouched)));
    assert_eq!(
        league.player(untouched).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn delete_match_is_unconditional() {
    let (mut league, _) = league_with(2);
    league.generate_schedule(false).unwrap();
    let m = open_in_week(&league, 1).remove(0);
    league.report_match(m.id, &sweep()).unwrap();
    league.delete_match(m.id).unwrap();
    assert!(league.matches().unwrap().is_empty());
    assert_eq!(
        league.delete_match(m.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    let standings = league.standings(RankingScope::RegularSeason).unwrap();
    assert!(standings.iter().all(|r| r.wins == 0 && r.losses == 0));
}

#[test]
fn reset_requires_confirmation() {
    let (mut league, _) = league_with(3);
    league.generate_schedule(false).unwrap();
    let total = league.matches().unwrap().len();

    let err = league.reset_league(false).unwrap_err();
    assert_eq!(err.impact(), Some(total));

    let (matches, players) = league.reset_league(true).unwrap();
    assert_eq!((matches, players), (total, 3));
    assert!(league.players().unwrap().is_empty());
    assert_eq!(league.current_week().unwrap(), 1);
}

#[test]
fn profile_tracks_results_and_history() {
    let (mut league, _) = league_with(2);
    league.generate_schedule(false).unwrap();
    let m = open_in_week(&league, 1).remove(0);
    league
        .report_match(m.id, &ScoreReport::games(&[(11, 9), (7, 11), (11, 4)]))
        .unwrap();

    let profile = league.player_profile(m.player1_id).unwrap();
    assert_eq!(profile.stats.wins, 1);
    assert_eq!(profile.stats.losses, 0);
    assert_eq!(profile.stats.win_pct, 100.0);
    assert_eq!(profile.stats.points_scored, 29);
    assert_eq!(profile.stats.points_allowed, 24);
    assert_eq!(profile.rank, Some(1));
    assert_eq!(profile.history.len(), 1);
    assert_eq!(profile.history[0].summary, "2-1 (11-9, 7-11, 11-4)");

    let other = league.player_profile(m.player2_id.unwrap()).unwrap();
    assert_eq!(other.stats.point_diff, -5);
    assert_eq!(other.stats.win_pct, 0.0);
}
