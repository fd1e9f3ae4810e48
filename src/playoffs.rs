use std::collections::VecDeque;

use log::{debug, warn};
use serde::Serialize;

use crate::bracket::{Bracket, BracketNode};
use crate::error::{LeagueError, Result};
use crate::model::{Match, NewMatch, Outcome, PlayerId, SlotRef};

/// Cascade depth allowed per invocation; a 1024-player bracket has 10 rounds.
pub const MAX_CASCADE_ROUNDS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Advancement {
    pub new_matches: Vec<NewMatch>,
    /// Successor slots that cannot be filled because a feeder ended in a double forfeit.
    pub halted: Vec<SlotRef>,
    pub champion: Option<PlayerId>,
}

/// Advance a stored bracket. Fails when no playoff matches exist.
pub fn advance_playoffs(matches: &[Match]) -> Result<Advancement> {
    let Some(mut bracket) = Bracket::from_matches(matches)? else {
        return Err(LeagueError::Precondition(
            "no playoff bracket has been built".to_string(),
        ));
    };
    Ok(advance_bracket(&mut bracket))
}

/// Create every next-round match whose two feeders have a winner, working round by round.
/// New matches are added to `bracket` unreported, so a single call can only cascade through
/// rounds whose results (or byes) already exist.
pub fn advance_bracket(bracket: &mut Bracket) -> Advancement {
    let mut out = Advancement::default();

    if let Some(champion) = bracket.champion() {
        out.champion = Some(champion);
        return out;
    }

    let mut ready: VecDeque<u32> = next_ready_round(bracket, 0).into_iter().collect();
    let mut processed = 0;
    while let Some(round) = ready.pop_front() {
        if processed == MAX_CASCADE_ROUNDS {
            warn!(
                "playoff cascade stopped after {MAX_CASCADE_ROUNDS} rounds at round {round}; \
                 advance again to continue"
            );
            break;
        }
        processed += 1;

        let created = advance_round(bracket, round, &mut out);
        debug!("playoff round {round}: created {created} successor match(es)");

        ready.extend(next_ready_round(bracket, round));
    }

    out.champion = bracket.champion();
    out
}

/// First round after `after` with a decided pair whose successor does not exist yet.
fn next_ready_round(bracket: &Bracket, after: u32) -> Option<u32> {
    (after + 1..bracket.total_rounds()).find(|&round| {
        (0..bracket.slots_in_round(round) as u32 / 2).any(|k| {
            let decided = |slot| {
                bracket
                    .node(SlotRef::new(round, slot))
                    .is_some_and(|node| node.outcome != Outcome::Pending)
            };
            bracket.node(SlotRef::new(round + 1, k)).is_none() && decided(2 * k) && decided(2 * k + 1)
        })
    })
}

fn advance_round(bracket: &mut Bracket, round: u32, out: &mut Advancement) -> usize {
    let pairs = bracket.slots_in_round(round) / 2;
    let mut created = 0;
    for k in 0..pairs as u32 {
        let next = SlotRef::new(round + 1, k);
        if bracket.node(next).is_some() {
            continue;
        }
        let left = bracket.node(SlotRef::new(round, 2 * k));
        let right = bracket.node(SlotRef::new(round, 2 * k + 1));
        let (Some(left), Some(right)) = (left, right) else {
            continue;
        };

        if left.outcome == Outcome::DoubleForfeit || right.outcome == Outcome::DoubleForfeit {
            warn!(
                "double forfeit in round {round} halts the bracket branch feeding round {} slot {}",
                next.round, next.slot
            );
            out.halted.push(next);
            continue;
        }

        let (Some(player1), Some(player2)) = (left.winner(), right.winner()) else {
            continue;
        };

        let new_match = NewMatch::playoff(next, bracket.successor_of(next), player1, Some(player2));
        bracket.insert(BracketNode {
            at: next,
            next: bracket.successor_of(next),
            match_id: None,
            player1_id: player1,
            player2_id: Some(player2),
            outcome: Outcome::Pending,
            summary: None,
        });
        out.new_matches.push(new_match);
        created += 1;
    }
    created
}
