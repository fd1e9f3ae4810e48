use crate::error::{LeagueError, Result};
use crate::model::{MAX_WEEKS, NewMatch, PlayerId};

pub type Pairing = (PlayerId, Option<PlayerId>);

/// Round-robin schedule for the regular season, one `NewMatch` per pairing per week.
/// Players are expected in signup order; weeks past the last distinct round stay empty.
pub fn generate_schedule(player_ids: &[PlayerId]) -> Result<Vec<NewMatch>> {
    let rounds = build_round_robin(player_ids, MAX_WEEKS)?;
    let mut out = Vec::new();
    for (week, pairings) in (1..).zip(rounds) {
        for (player1, player2) in pairings {
            out.push(NewMatch::regular(week, player1, player2));
        }
    }
    Ok(out)
}

/// Circle method: the first participant stays fixed while the rest rotate one step per round.
/// An odd roster gets a placeholder, and whoever draws it has a bye that week.
pub fn build_round_robin(player_ids: &[PlayerId], max_rounds: u32) -> Result<Vec<Vec<Pairing>>> {
    if player_ids.len() < 2 {
        return Err(LeagueError::Precondition(format!(
            "at least 2 players are required to generate a schedule, found {}",
            player_ids.len()
        )));
    }

    let mut rotation: Vec<Option<PlayerId>> = player_ids.iter().copied().map(Some).collect();
    if rotation.len() % 2 != 0 {
        rotation.push(None);
    }

    let total_rounds = (rotation.len() - 1).min(max_rounds as usize);
    let mut rounds = Vec::with_capacity(total_rounds);
    for _ in 0..total_rounds {
        rounds.push(capture_pairs(&rotation));
        rotate(&mut rotation);
    }
    Ok(rounds)
}

fn capture_pairs(rotation: &[Option<PlayerId>]) -> Vec<Pairing> {
    let n = rotation.len();
    (0..n / 2)
        .filter_map(|i| match (rotation[i], rotation[n - 1 - i]) {
            (Some(a), b) => Some((a, b)),
            (None, Some(b)) => Some((b, None)),
            (None, None) => None,
        })
        .collect()
}

fn rotate(rotation: &mut [Option<PlayerId>]) {
    if rotation.len() > 2 {
        rotation[1..].rotate_right(1);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::build_round_robin;

    fn pair_key(a: i64, b: i64) -> (i64, i64) {
        if a < b { (a, b) } else { (b, a) }
    }

    #[test]
    fn every_pair_meets_exactly_once() {
        let ids: Vec<i64> = (1..=6).collect();
        let rounds = build_round_robin(&ids, 8).unwrap();
        assert_eq!(rounds.len(), 5);

        let mut seen = HashSet::new();
        for round in &rounds {
            let mut this_week = HashSet::new();
            for (a, b) in round {
                let b = b.expect("even roster has no byes");
                assert!(this_week.insert(*a));
                assert!(this_week.insert(b));
                assert!(seen.insert(pair_key(*a, b)), "repeat pairing {a} vs {b}");
            }
        }
        assert_eq!(seen.len(), 15);
    }

    #[test]
    fn odd_roster_gives_one_bye_per_week() {
        let ids: Vec<i64> = (1..=5).collect();
        let rounds = build_round_robin(&ids, 8).unwrap();
        assert_eq!(rounds.len(), 5);

        let mut bye_holders = HashSet::new();
        for round in &rounds {
            let byes: Vec<_> = round.iter().filter(|(_, b)| b.is_none()).collect();
            assert_eq!(byes.len(), 1);
            bye_holders.insert(byes[0].0);
        }
        assert_eq!(bye_holders.len(), 5);
    }

    #[test]
    fn rounds_capped_at_limit() {
        let ids: Vec<i64> = (1..=12).collect();
        let rounds = build_round_robin(&ids, 8).unwrap();
        assert_eq!(rounds.len(), 8);
        assert!(rounds.iter().all(|r| r.len() == 6));
    }
}
