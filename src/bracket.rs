use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{LeagueError, Result};
use crate::model::{Match, MatchId, NewMatch, Outcome, PlayerId, SlotRef};

pub fn bracket_size(players: usize) -> usize {
    players.next_power_of_two()
}

/// Seeds (1-based) in slot order for a bracket of `size`, so that seed 1 meets the lowest
/// seed and the top two seeds can only meet in the final. For 8: 1,8,4,5,2,7,3,6.
pub fn seeding_order(size: usize) -> Vec<usize> {
    let mut order = vec![1];
    while order.len() < size {
        let next_size = order.len() * 2;
        order = order
            .iter()
            .flat_map(|&seed| [seed, next_size + 1 - seed])
            .collect();
    }
    order
}

/// Slot fed by `at` in the following round; the final has none.
pub fn successor(at: SlotRef, total_rounds: u32) -> Option<SlotRef> {
    (at.round < total_rounds).then(|| SlotRef::new(at.round + 1, at.slot / 2))
}

/// First-round matches for the ranked players (best first). Seeds without an opponent get a
/// bye match that is resolved on creation and advances them into round 2.
pub fn build_bracket(seeds: &[PlayerId]) -> Result<Vec<NewMatch>> {
    if seeds.len() < 2 {
        return Err(LeagueError::Precondition(format!(
            "at least 2 ranked players are required for a playoff bracket, found {}",
            seeds.len()
        )));
    }

    let size = bracket_size(seeds.len());
    let total_rounds = size.trailing_zeros();
    let order = seeding_order(size);

    let matches = order
        .chunks(2)
        .enumerate()
        .map(|(slot, pair)| {
            let at = SlotRef::new(1, slot as u32);
            let player1 = seeds[pair[0] - 1];
            let player2 = seeds.get(pair[1] - 1).copied();
            NewMatch::playoff(at, successor(at, total_rounds), player1, player2)
        })
        .collect();
    Ok(matches)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketNode {
    pub at: SlotRef,
    pub next: Option<SlotRef>,
    pub match_id: Option<MatchId>,
    pub player1_id: PlayerId,
    pub player2_id: Option<PlayerId>,
    pub outcome: Outcome,
    pub summary: Option<String>,
}

impl BracketNode {
    pub fn from_match(m: &Match) -> Option<Self> {
        let at = m.playoff_slot()?;
        Some(Self {
            at,
            next: m.next_slot(),
            match_id: Some(m.id),
            player1_id: m.player1_id,
            player2_id: m.player2_id,
            outcome: m.outcome(),
            summary: m.summary(),
        })
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.outcome {
            Outcome::Bye { player } => Some(player),
            Outcome::Won { winner, .. } => Some(winner),
            Outcome::Pending | Outcome::DoubleForfeit => None,
        }
    }
}

/// Playoff matches keyed by (round, slot). The depth comes from the successor links each
/// match carries, so deleting matches leaves empty slots rather than a shallower tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bracket {
    total_rounds: u32,
    nodes: BTreeMap<SlotRef, BracketNode>,
}

impl Bracket {
    /// `None` when no playoff matches exist.
    pub fn from_matches(matches: &[Match]) -> Result<Option<Self>> {
        let mut nodes = BTreeMap::new();
        for node in matches.iter().filter_map(BracketNode::from_match) {
            if nodes.insert(node.at, node.clone()).is_some() {
                return Err(LeagueError::StateConflict(format!(
                    "malformed bracket: two matches in round {} slot {}",
                    node.at.round, node.at.slot
                )));
            }
        }

        // Every match but the final links to the round after it.
        let Some(total_rounds) = nodes
            .values()
            .map(|node| node.next.map_or(node.at.round, |next| next.round))
            .max()
        else {
            return Ok(None);
        };
        if total_rounds == 0 || total_rounds >= usize::BITS {
            return Err(LeagueError::StateConflict(format!(
                "malformed bracket: {total_rounds} rounds"
            )));
        }

        let size = 1usize << total_rounds;
        for node in nodes.values() {
            let at = node.at;
            let in_range =
                at.round >= 1 && at.round <= total_rounds && (at.slot as usize) < size >> at.round;
            if !in_range || node.next != successor(at, total_rounds) {
                return Err(LeagueError::StateConflict(format!(
                    "malformed bracket: round {} slot {} does not fit a {}-round bracket",
                    at.round, at.slot, total_rounds
                )));
            }
        }

        Ok(Some(Self {
            total_rounds,
            nodes,
        }))
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    pub fn size(&self) -> usize {
        1 << self.total_rounds
    }

    /// Number of slots the given round holds once fully populated.
    pub fn slots_in_round(&self, round: u32) -> usize {
        if round == 0 || round > self.total_rounds {
            return 0;
        }
        self.size() >> round
    }

    pub fn node(&self, at: SlotRef) -> Option<&BracketNode> {
        self.nodes.get(&at)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &BracketNode> {
        self.nodes.values()
    }

    pub fn round(&self, round: u32) -> impl Iterator<Item = &BracketNode> {
        self.nodes.values().filter(move |node| node.at.round == round)
    }

    pub fn successor_of(&self, at: SlotRef) -> Option<SlotRef> {
        successor(at, self.total_rounds)
    }

    pub fn final_slot(&self) -> SlotRef {
        SlotRef::new(self.total_rounds, 0)
    }

    pub fn champion(&self) -> Option<PlayerId> {
        self.node(self.final_slot()).and_then(BracketNode::winner)
    }

    pub fn contains_player(&self, player_id: PlayerId) -> bool {
        self.nodes
            .values()
            .any(|n| n.player1_id == player_id || n.player2_id == Some(player_id))
    }

    pub(crate) fn insert(&mut self, node: BracketNode) {
        self.nodes.insert(node.at, node);
    }
}

pub fn round_label(round: u32, matches_in_round: usize) -> String {
    match matches_in_round {
        1 => "Finals".to_string(),
        2 => "Semifinals".to_string(),
        4 => "Quarterfinals".to_string(),
        8 => "Round of 16".to_string(),
        16 => "Round of 32".to_string(),
        32 => "Round of 64".to_string(),
        _ if round == 1 => "First Round".to_string(),
        _ => format!("Round {round}"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Bye,
    Pending,
    Complete,
    Forfeit,
    /// Not created yet; waits on earlier rounds.
    Future,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    pub slot: u32,
    pub match_id: Option<MatchId>,
    pub player1_id: Option<PlayerId>,
    pub player2_id: Option<PlayerId>,
    pub summary: Option<String>,
    pub state: SlotState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundView {
    pub round: u32,
    pub label: String,
    pub slots: Vec<SlotView>,
}

/// Every round of the bracket, with placeholders for matches that do not exist yet.
pub fn bracket_view(bracket: &Bracket) -> Vec<RoundView> {
    (1..=bracket.total_rounds())
        .map(|round| {
            let count = bracket.slots_in_round(round);
            let slots = (0..count as u32)
                .map(|slot| match bracket.node(SlotRef::new(round, slot)) {
                    Some(node) => SlotView {
                        slot,
                        match_id: node.match_id,
                        player1_id: Some(node.player1_id),
                        player2_id: node.player2_id,
                        summary: node.summary.clone(),
                        state: match node.outcome {
                            Outcome::Bye { .. } => SlotState::Bye,
                            Outcome::Won { .. } => SlotState::Complete,
                            Outcome::DoubleForfeit => SlotState::Forfeit,
                            Outcome::Pending => SlotState::Pending,
                        },
                    },
                    None => SlotView {
                        slot,
                        match_id: None,
                        player1_id: None,
                        player2_id: None,
                        summary: None,
                        state: SlotState::Future,
                    },
                })
                .collect();
            RoundView {
                round,
                label: round_label(round, count),
                slots,
            }
        })
        .collect()
}
