use crate::{
    error::GameError,
    models::game::{
        ChatId, GameView, JoinRequest, NightActionRequest, Phase, PlayerView, VoteRequest,
    },
    state::AppState,
};

pub async fn new_game(state: AppState, chat_id: ChatId) -> Result<String, GameError> {
    state.games.create(chat_id, state.session_context()).await?;
    Ok("A new game was created. Use join to take part.".to_string())
}

pub async fn join_game(
    state: AppState,
    chat_id: ChatId,
    request: JoinRequest,
) -> Result<String, GameError> {
    let session = state.games.get(chat_id).await?;
    let mut game = session.lock().await;
    let name = request.name.clone();
    let count = game.join(request.player_id, request.name)?;
    Ok(format!("{} joined the game ({} players)", name, count))
}

pub async fn start_game(state: AppState, chat_id: ChatId) -> Result<String, GameError> {
    let session = state.games.get(chat_id).await?;
    let mut game = session.lock().await;
    game.start()?;
    Ok("Game started successfully".to_string())
}

pub async fn submit_night_action(
    state: AppState,
    chat_id: ChatId,
    request: NightActionRequest,
) -> Result<String, GameError> {
    let session = state.games.get(chat_id).await?;
    let mut game = session.lock().await;
    game.submit_night_action(request.player_id, request.kind, request.target_id)?;
    Ok("Night action accepted".to_string())
}

pub async fn submit_vote(
    state: AppState,
    chat_id: ChatId,
    request: VoteRequest,
) -> Result<String, GameError> {
    let session = state.games.get(chat_id).await?;
    let mut game = session.lock().await;
    game.submit_vote(request.voter_id, request.target_id)?;
    Ok("Vote cast successfully".to_string())
}

// デバッグ用：現在のフェーズを即座に終了させる
pub async fn advance_game_phase(state: AppState, chat_id: ChatId) -> Result<Phase, GameError> {
    if !state.config.debug_enabled {
        return Err(GameError::DebugDisabled);
    }
    let session = state.games.get(chat_id).await?;
    let phase = session.lock().await.advance()?;
    if phase == Phase::Ended {
        state.games.release(chat_id, &session).await;
    }
    Ok(phase)
}

pub async fn abort_game(state: AppState, chat_id: ChatId) -> Result<String, GameError> {
    let session = state.games.get(chat_id).await?;
    session.lock().await.abort()?;
    state.games.release(chat_id, &session).await;
    Ok("Game aborted".to_string())
}

pub async fn get_game_state(state: AppState, chat_id: ChatId) -> Result<GameView, GameError> {
    let session = state.games.get(chat_id).await?;
    let game = session.lock().await;
    Ok(game.view())
}

pub async fn list_players(state: AppState, chat_id: ChatId) -> Result<Vec<PlayerView>, GameError> {
    Ok(get_game_state(state, chat_id).await?.players)
}
