use chrono::Utc;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use pingpong_league::bracket::{Bracket, build_bracket};
use pingpong_league::model::{GameScore, Match, NewMatch, Player};
use pingpong_league::playoffs::advance_bracket;
use pingpong_league::rankings::{RankingScope, compute_rankings};
use pingpong_league::schedule::generate_schedule;

fn sample_players(count: usize) -> Vec<Player> {
    (0..count as i64)
        .map(|id| Player {
            id,
            external_id: format!("P{id:04}"),
            first_name: format!("First{}", id % 17),
            last_name: format!("Last{}", id % 23),
            created_at: Utc::now(),
        })
        .collect()
}

fn stored(planned: &[NewMatch], decide: bool) -> Vec<Match> {
    planned
        .iter()
        .enumerate()
        .map(|(idx, nm)| {
            let played = decide && !nm.is_bye();
            let swing = (idx % 9) as u32;
            Match {
                id: idx as i64 + 1,
                stage: nm.stage,
                player1_id: nm.player1_id,
                player2_id: nm.player2_id,
                games: if played {
                    [
                        Some(GameScore::new(11, swing)),
                        Some(GameScore::new(swing, 11)),
                        Some(GameScore::new(11, 9 - swing.min(9))),
                    ]
                } else {
                    [None; 3]
                },
                score1: played.then_some(22 + swing),
                score2: played.then_some(20 + swing),
                reported: played || nm.is_bye(),
                double_forfeit: false,
                created_at: Utc::now(),
            }
        })
        .collect()
}

fn bench_schedule_generate(c: &mut Criterion) {
    let ids: Vec<i64> = (0..128).collect();
    c.bench_function("schedule_generate_128", |b| {
        b.iter(|| {
            let planned = generate_schedule(black_box(&ids)).unwrap();
            black_box(planned.len());
        })
    });
}

fn bench_rankings_compute(c: &mut Criterion) {
    let players = sample_players(128);
    let ids: Vec<i64> = players.iter().map(|p| p.id).collect();
    let matches = stored(&generate_schedule(&ids).unwrap(), true);
    c.bench_function("rankings_compute_128", |b| {
        b.iter(|| {
            let rows = compute_rankings(
                black_box(&players),
                black_box(&matches),
                RankingScope::RegularSeason,
            );
            black_box(rows.len());
        })
    });
}

fn bench_bracket_advance(c: &mut Criterion) {
    let seeds: Vec<i64> = (0..600).collect();
    let first_round = stored(&build_bracket(&seeds).unwrap(), true);
    c.bench_function("bracket_advance_600", |b| {
        b.iter(|| {
            let Some(mut bracket) = Bracket::from_matches(black_box(&first_round)).unwrap() else {
                return;
            };
            let advancement = advance_bracket(&mut bracket);
            black_box(advancement.new_matches.len());
        })
    });
}

criterion_group!(
    perf,
    bench_schedule_generate,
    bench_rankings_compute,
    bench_bracket_advance
);
criterion_main!(perf);
