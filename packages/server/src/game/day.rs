use std::collections::HashMap;

use crate::models::game::{DayResult, Vote};
use crate::models::player::{Player, PlayerId};

/// 昼の投票。投票者ごとに最新の1票だけを保持する。
#[derive(Debug, Clone, Default)]
pub struct Ballots {
    votes: HashMap<PlayerId, Option<PlayerId>>,
}

impl Ballots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, vote: Vote) {
        self.votes.insert(vote.voter_id, vote.target_id);
    }

    pub fn get(&self, voter_id: PlayerId) -> Option<Option<PlayerId>> {
        self.votes.get(&voter_id).copied()
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    pub fn clear(&mut self) {
        self.votes.clear();
    }

    /// 生存者の票だけを数え、単独最多得票のプレイヤーを処刑対象にする。
    /// 最多得票が同数なら誰も処刑しない。棄権は数えない。
    pub fn tally(&self, players: &[Player]) -> DayResult {
        let alive = |id: &PlayerId| players.iter().any(|p| p.id == *id && p.is_alive);

        let mut counts: HashMap<PlayerId, usize> = HashMap::new();
        for (voter_id, target) in &self.votes {
            if !alive(voter_id) {
                continue;
            }
            if let Some(target_id) = target {
                if alive(target_id) {
                    *counts.entry(*target_id).or_insert(0) += 1;
                }
            }
        }

        let mut tally: Vec<(PlayerId, usize)> = counts.into_iter().collect();
        tally.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let eliminated = match tally.as_slice() {
            [(first, top), rest @ ..] if rest.first().map_or(true, |(_, n)| n < top) => {
                Some(*first)
            }
            _ => None,
        };

        DayResult { eliminated, tally }
    }
}
