use std::collections::HashSet;

use crate::error::GameError;
use crate::models::game::{Investigation, NightAction, NightActionKind, NightResult};
use crate::models::player::{Player, PlayerId};

/// 一晩分の夜アクション。
///
/// プレイヤーごとに最新の1件だけを保持する。再提出すると古いものは消え、
/// 新しいものが提出順の末尾に入る。
#[derive(Debug, Clone, Default)]
pub struct NightActions {
    submissions: Vec<NightAction>,
}

impl NightActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, action: NightAction) {
        self.submissions.retain(|a| a.actor_id != action.actor_id);
        self.submissions.push(action);
    }

    pub fn get(&self, actor_id: PlayerId) -> Option<&NightAction> {
        self.submissions.iter().find(|a| a.actor_id == actor_id)
    }

    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }

    pub fn clear(&mut self) {
        self.submissions.clear();
    }

    /// 夜の結果を計算する。プレイヤーの状態は変更しない。
    ///
    /// 襲撃先は提出順で最初の Kill が採用され、他のマフィアの別の襲撃先は無視される。
    /// 襲撃先が護衛されていれば誰も死なない。
    pub fn resolve(&self, players: &[Player]) -> Result<NightResult, GameError> {
        let find = |id: PlayerId| {
            players.iter().find(|p| p.id == id).ok_or_else(|| {
                GameError::StateFault(format!("unknown player {} in night actions", id))
            })
        };

        let protected: HashSet<PlayerId> = self
            .submissions
            .iter()
            .filter(|a| a.kind == NightActionKind::Protect)
            .map(|a| a.target_id)
            .collect();

        let kill_target = self
            .submissions
            .iter()
            .find(|a| a.kind == NightActionKind::Kill)
            .map(|a| a.target_id);

        let died = match kill_target {
            Some(target_id) if !protected.contains(&target_id) => {
                if find(target_id)?.is_alive {
                    Some(target_id)
                } else {
                    None
                }
            }
            _ => None,
        };

        let investigated = match self
            .submissions
            .iter()
            .find(|a| a.kind == NightActionKind::Investigate)
        {
            Some(action) => {
                let target = find(action.target_id)?;
                let revealed_role = target.role.ok_or_else(|| {
                    GameError::StateFault(format!("player {} has no role", target.id))
                })?;
                Some(Investigation {
                    detective_id: action.actor_id,
                    target_id: target.id,
                    revealed_role,
                })
            }
            None => None,
        };

        Ok(NightResult { died, investigated })
    }
}
