use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;

use super::day::Ballots;
use super::night::NightActions;
use super::roles::{self, MIN_PLAYERS};
use super::roster::Roster;
use super::win;
use crate::error::{Action, GameError};
use crate::models::config::GameConfig;
use crate::models::game::{
    ChatId, Elimination, EliminationReason, GameOutcome, GameView, NightAction, NightActionKind,
    Phase, PhaseToken, PlayerView, Vote,
};
use crate::models::player::{Player, PlayerId};
use crate::models::role::{Faction, Role};
use crate::services::notifier::Notifier;
use crate::services::stats_service::{ResultSink, StatsUpdate};
use crate::services::timer::{TimerCallback, TimerHandle, TimerService};
use crate::state::SessionRegistry;

pub type SessionHandle = Arc<Mutex<GameSession>>;

/// セッションが使う外部の協調者
#[derive(Clone)]
pub struct SessionContext {
    pub notifier: Arc<dyn Notifier>,
    pub timer: Arc<dyn TimerService>,
    pub results: Arc<dyn ResultSink>,
    pub config: Arc<GameConfig>,
    pub registry: SessionRegistry,
}

/// 1つのチャットで行われる1ゲーム分の状態。
///
/// すべての操作は `SessionHandle` のロックを取って直列に実行される。
/// フェーズ終了はタイマーで駆動され、フェーズが変わるたびに古いタイマーはキャンセルされる。
pub struct GameSession {
    chat_id: ChatId,
    phase: Phase,
    phase_number: u32,
    roster: Roster,
    night_actions: NightActions,
    ballots: Ballots,
    started_at: Option<DateTime<Utc>>,
    timer: Option<TimerHandle>,
    eliminations: Vec<Elimination>,
    outcome: Option<GameOutcome>,
    rng: StdRng,
    ctx: SessionContext,
    this: Weak<Mutex<GameSession>>,
}

impl GameSession {
    pub fn open(chat_id: ChatId, ctx: SessionContext) -> SessionHandle {
        let rng = match ctx.config.role_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Arc::new_cyclic(|this| {
            Mutex::new(GameSession {
                chat_id,
                phase: Phase::Lobby,
                phase_number: 0,
                roster: Roster::new(),
                night_actions: NightActions::new(),
                ballots: Ballots::new(),
                started_at: None,
                timer: None,
                eliminations: Vec::new(),
                outcome: None,
                rng,
                ctx,
                this: this.clone(),
            })
        })
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn phase_number(&self) -> u32 {
        self.phase_number
    }

    pub fn token(&self) -> PhaseToken {
        PhaseToken {
            phase: self.phase,
            number: self.phase_number,
        }
    }

    pub fn players(&self) -> &[Player] {
        self.roster.players()
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.roster.get(player_id)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    pub fn has_pending_timer(&self) -> bool {
        self.timer.is_some()
    }

    pub fn pending_night_action(&self, actor_id: PlayerId) -> Option<&NightAction> {
        self.night_actions.get(actor_id)
    }

    pub fn pending_vote(&self, voter_id: PlayerId) -> Option<Option<PlayerId>> {
        self.ballots.get(voter_id)
    }

    pub fn view(&self) -> GameView {
        let reveal = self.ctx.config.show_player_roles || self.is_ended();
        GameView {
            chat_id: self.chat_id,
            phase: self.phase,
            phase_number: self.phase_number,
            players: self
                .roster
                .players()
                .iter()
                .map(|p| PlayerView::from_player(p, reveal))
                .collect(),
            started_at: self.started_at,
            outcome: self.outcome.clone(),
        }
    }

    pub fn join(&mut self, player_id: PlayerId, name: String) -> Result<usize, GameError> {
        self.ensure_active()?;
        let count = self.roster.join(self.phase, player_id, name.clone())?;

        info!("Player {} joined game in chat {} ({} players)", player_id, self.chat_id, count);
        self.ctx.notifier.notify(
            self.chat_id,
            format!("{} joined the game ({} players).", name, count),
        );
        Ok(count)
    }

    /// ロビーから最初の夜へ移る。役職を割り当て、夜のタイマーを予約する。
    pub fn start(&mut self) -> Result<(), GameError> {
        self.ensure_active()?;
        if self.phase != Phase::Lobby {
            return Err(GameError::WrongPhase(self.phase));
        }
        let actual = self.roster.size();
        if actual < MIN_PLAYERS {
            return Err(GameError::InsufficientPlayers {
                required: MIN_PLAYERS,
                actual,
            });
        }

        let assignment = roles::assign_roles(&self.roster.ids(), &mut self.rng)?;
        for player in self.roster.players_mut() {
            player.role = assignment.get(&player.id).copied();
        }
        self.started_at = Some(Utc::now());

        info!("Game in chat {} started with {} players", self.chat_id, actual);
        for player in self.roster.players() {
            if let Some(role) = player.role {
                self.ctx
                    .notifier
                    .notify_private(player.id, role_briefing(role));
            }
        }
        self.ctx.notifier.notify(
            self.chat_id,
            format!(
                "The game has started with {} players. Roles have been sent privately.",
                actual
            ),
        );

        self.enter_night();
        Ok(())
    }

    pub fn submit_night_action(
        &mut self,
        actor_id: PlayerId,
        kind: NightActionKind,
        target_id: PlayerId,
    ) -> Result<(), GameError> {
        self.ensure_active()?;
        if self.phase != Phase::Night {
            return Err(GameError::WrongPhase(self.phase));
        }

        let unauthorized = GameError::UnauthorizedAction {
            player_id: actor_id,
            action: Action::Night(kind),
        };
        let actor = self.roster.get(actor_id).ok_or_else(|| unauthorized.clone())?;
        if !actor.is_alive {
            return Err(GameError::ActorDead(actor_id));
        }
        if actor.role.and_then(|r| r.night_action()) != Some(kind) {
            return Err(unauthorized);
        }
        if !self.roster.is_alive(target_id) {
            return Err(GameError::InvalidTarget(target_id));
        }
        // 医者だけは自分を護衛できる
        if target_id == actor_id && kind != NightActionKind::Protect {
            return Err(GameError::InvalidTarget(target_id));
        }

        self.night_actions.submit(NightAction {
            actor_id,
            kind,
            target_id,
        });
        debug!(
            "Chat {}: player {} submitted {} on {}",
            self.chat_id, actor_id, kind, target_id
        );
        Ok(())
    }

    pub fn submit_vote(
        &mut self,
        voter_id: PlayerId,
        target_id: Option<PlayerId>,
    ) -> Result<(), GameError> {
        self.ensure_active()?;
        if self.phase != Phase::Day {
            return Err(GameError::WrongPhase(self.phase));
        }

        let voter = self
            .roster
            .get(voter_id)
            .ok_or(GameError::UnauthorizedAction {
                player_id: voter_id,
                action: Action::Vote,
            })?;
        if !voter.is_alive {
            return Err(GameError::VoterDead(voter_id));
        }
        if let Some(target_id) = target_id {
            if !self.roster.is_alive(target_id) {
                return Err(GameError::InvalidTarget(target_id));
            }
        }

        self.ballots.submit(Vote {
            voter_id,
            target_id,
        });
        debug!(
            "Chat {}: player {} voted for {:?}",
            self.chat_id, voter_id, target_id
        );
        Ok(())
    }

    /// 現在のフェーズをすぐに終了させる。予約済みのタイマーはキャンセルされる。
    pub fn advance(&mut self) -> Result<Phase, GameError> {
        self.ensure_active()?;
        if self.phase == Phase::Lobby {
            return Err(GameError::WrongPhase(self.phase));
        }
        self.cancel_timer();
        self.resolve_phase();
        Ok(self.phase)
    }

    /// タイマーから呼ばれる。予約時のフェーズと一致しない場合は何もしない。
    pub fn on_phase_timer(&mut self, token: PhaseToken) {
        if token != self.token() || !matches!(self.phase, Phase::Night | Phase::Day) {
            warn!(
                "Chat {}: ignoring stale timer for {} #{} (now {} #{})",
                self.chat_id, token.phase, token.number, self.phase, self.phase_number
            );
            return;
        }
        self.timer = None;
        self.resolve_phase();
    }

    pub fn abort(&mut self) -> Result<(), GameError> {
        self.ensure_active()?;
        info!("Game in chat {} aborted during {}", self.chat_id, self.phase);
        self.finish(None);
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), GameError> {
        if self.is_ended() {
            return Err(GameError::SessionEnded);
        }
        Ok(())
    }

    fn resolve_phase(&mut self) {
        match self.phase {
            Phase::Night => self.end_night(),
            Phase::Day => self.end_day(),
            Phase::Lobby | Phase::Ended => {}
        }
    }

    fn enter_night(&mut self) {
        self.phase = Phase::Night;
        self.phase_number += 1;
        self.night_actions.clear();

        info!("Chat {}: night {} begins", self.chat_id, self.round());
        self.ctx.notifier.notify(
            self.chat_id,
            format!(
                "Night {} falls. Mafia, Doctor and Detective, send your actions ({}s left).",
                self.round(),
                self.ctx.config.night_duration.as_secs()
            ),
        );
        self.schedule_phase_end();
    }

    fn enter_day(&mut self) {
        self.phase = Phase::Day;
        self.phase_number += 1;
        self.ballots.clear();

        info!("Chat {}: day {} begins", self.chat_id, self.round());
        self.ctx.notifier.notify(
            self.chat_id,
            format!(
                "Day {} begins. Discuss and vote ({}s left).",
                self.round(),
                self.ctx.config.day_duration.as_secs()
            ),
        );
        self.schedule_phase_end();
    }

    fn end_night(&mut self) {
        if self.night_actions.is_empty() {
            debug!("Chat {}: no night actions were submitted", self.chat_id);
        } else {
            debug!(
                "Chat {}: resolving {} night actions",
                self.chat_id,
                self.night_actions.len()
            );
        }
        let result = match self.night_actions.resolve(self.roster.players()) {
            Ok(result) => result,
            Err(e) => return self.fault(e),
        };
        self.night_actions.clear();
        info!("Chat {}: night {} resolved: {:?}", self.chat_id, self.round(), result);

        match result.died {
            Some(victim) => {
                if let Err(e) = self.eliminate(victim, EliminationReason::Killed) {
                    return self.fault(e);
                }
                self.ctx.notifier.notify(
                    self.chat_id,
                    format!("{} was killed during the night.", self.roster.name_of(victim)),
                );
            }
            None => self
                .ctx
                .notifier
                .notify(self.chat_id, "Nobody died during the night.".to_string()),
        }

        if let Some(investigation) = result.investigated {
            self.ctx.notifier.notify_private(
                investigation.detective_id,
                format!(
                    "Your investigation shows that {} is a {}.",
                    self.roster.name_of(investigation.target_id),
                    investigation.revealed_role
                ),
            );
        }

        // 夜の襲撃だけで決着することもある
        if let Some(winner) = win::evaluate(self.roster.players()) {
            return self.finish(Some(winner));
        }
        self.enter_day();
    }

    fn end_day(&mut self) {
        if self.ballots.is_empty() {
            debug!("Chat {}: nobody voted", self.chat_id);
        } else {
            debug!("Chat {}: counting {} ballots", self.chat_id, self.ballots.len());
        }
        let result = self.ballots.tally(self.roster.players());
        self.ballots.clear();
        info!("Chat {}: day {} resolved: {:?}", self.chat_id, self.round(), result);

        match result.eliminated {
            Some(victim) => {
                if let Err(e) = self.eliminate(victim, EliminationReason::Voted) {
                    return self.fault(e);
                }
                self.ctx.notifier.notify(
                    self.chat_id,
                    format!("{} was eliminated by vote.", self.roster.name_of(victim)),
                );
            }
            None if result.tally.is_empty() => self
                .ctx
                .notifier
                .notify(self.chat_id, "No votes were cast. Nobody was eliminated.".to_string()),
            None => self
                .ctx
                .notifier
                .notify(self.chat_id, "The vote was tied. Nobody was eliminated.".to_string()),
        }

        if let Some(winner) = win::evaluate(self.roster.players()) {
            return self.finish(Some(winner));
        }
        self.enter_night();
    }

    fn eliminate(
        &mut self,
        player_id: PlayerId,
        reason: EliminationReason,
    ) -> Result<(), GameError> {
        let phase_number = self.phase_number;
        let player = self.roster.get_mut(player_id).ok_or_else(|| {
            GameError::StateFault(format!("cannot eliminate unknown player {}", player_id))
        })?;
        if !player.is_alive {
            return Err(GameError::StateFault(format!(
                "player {} is already dead",
                player_id
            )));
        }
        player.is_alive = false;
        self.eliminations.push(Elimination {
            player_id,
            reason,
            phase_number,
        });
        Ok(())
    }

    fn fault(&mut self, e: GameError) {
        error!(
            "Chat {}: {} during {} #{}, ending game without a winner",
            self.chat_id, e, self.phase, self.phase_number
        );
        self.finish(None);
    }

    /// Ended へ遷移する。二度目以降の呼び出しは無視される。
    fn finish(&mut self, winner: Option<Faction>) {
        if self.is_ended() {
            return;
        }
        self.cancel_timer();
        self.phase = Phase::Ended;
        self.night_actions.clear();
        self.ballots.clear();

        let outcome = GameOutcome {
            winning_faction: winner,
            final_roles: self
                .roster
                .players()
                .iter()
                .filter_map(|p| p.role.map(|role| (p.id, role)))
                .collect(),
            eliminated_this_game: self.eliminations.clone(),
        };

        match winner {
            Some(faction) => {
                info!("Game in chat {} ended, {} win", self.chat_id, faction);
                let reveal: Vec<String> = self
                    .roster
                    .players()
                    .iter()
                    .filter_map(|p| p.role.map(|role| format!("{}: {}", p.name, role)))
                    .collect();
                self.ctx.notifier.notify(
                    self.chat_id,
                    format!("Game over! The {} win.\n{}", faction, reveal.join("\n")),
                );
            }
            None => self
                .ctx
                .notifier
                .notify(self.chat_id, "The game was stopped without a winner.".to_string()),
        }

        if let Some(started_at) = self.started_at {
            self.ctx.results.record_game(self.chat_id, started_at, &outcome);
            if winner.is_some() {
                for (player_id, role) in &outcome.final_roles {
                    self.ctx.results.update_player_stats(
                        *player_id,
                        StatsUpdate {
                            played: true,
                            won: outcome.is_winner(*role),
                            was_mafia: *role == Role::Mafia,
                        },
                    );
                }
            }
        }
        self.outcome = Some(outcome);
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            self.ctx.timer.cancel(handle);
        }
    }

    fn schedule_phase_end(&mut self) {
        self.cancel_timer();
        let delay = match self.phase {
            Phase::Night => self.ctx.config.night_duration,
            Phase::Day => self.ctx.config.day_duration,
            Phase::Lobby | Phase::Ended => return,
        };

        let token = self.token();
        let chat_id = self.chat_id;
        let this = self.this.clone();
        let registry = self.ctx.registry.clone();
        let callback: TimerCallback = Box::new(move || {
            Box::pin(async move {
                let Some(session) = this.upgrade() else {
                    return;
                };
                let ended = {
                    let mut guard = session.lock().await;
                    guard.on_phase_timer(token);
                    guard.is_ended()
                };
                if ended {
                    registry.release(chat_id, &session).await;
                }
            })
        });

        self.timer = Some(self.ctx.timer.schedule_once(delay, callback));
    }

    fn round(&self) -> u32 {
        (self.phase_number + 1) / 2
    }
}

fn role_briefing(role: Role) -> String {
    let task = match role {
        Role::Mafia => "Each night, choose a player to kill.",
        Role::Doctor => "Each night, choose a player to protect.",
        Role::Detective => "Each night, choose a player to investigate.",
        Role::Citizen => "Find the Mafia and vote them out during the day.",
    };
    format!("Your role: {}. {}", role, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_setup::TestHarness;

    const CHAT: ChatId = -42;

    #[tokio::test]
    async fn test_corrupt_night_ends_game_without_winner() {
        let harness = TestHarness::new();
        let session = harness.registry.create(CHAT, harness.context()).await.unwrap();
        {
            let mut game = session.lock().await;
            for id in 1..=5 {
                game.join(id, format!("Player {}", id)).unwrap();
            }
            game.start().unwrap();

            let mafia = game
                .players()
                .iter()
                .find(|p| p.is_mafia())
                .map(|p| p.id)
                .unwrap();
            // 検証を通らない対象を直接積む
            game.night_actions.submit(NightAction {
                actor_id: mafia,
                kind: NightActionKind::Kill,
                target_id: 99,
            });
        }

        assert!(harness.timer.fire_next().await);

        let game = session.lock().await;
        assert_eq!(game.phase(), Phase::Ended);
        assert_eq!(game.outcome().map(|o| o.winning_faction), Some(None));
        assert!(!game.has_pending_timer());
        assert_eq!(harness.results.games().len(), 1);
        assert!(!harness.registry.contains(CHAT).await);
        assert_eq!(harness.timer.pending_count(), 0);
        assert!(harness
            .notifier
            .public_in(CHAT)
            .iter()
            .any(|m| m == "The game was stopped without a winner."));
    }
}
