use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::games::side_stacker::{Difficulty, MoveSelectors, Side, Token};
use common::{ClientId, PlayerId, RoomId};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::broadcaster::Broadcaster;
use crate::error::GameError;
use crate::matchmaker::{GameMode, MatchResult, Matchmaker};
use crate::protocol::ServerEvent;
use crate::replay::{ReplayEngine, rebuild_room};
use crate::room::{GameState, Player, Room, RoomStatus};
use crate::server_config::ServerConfig;
use crate::store::{GameStore, MoveRecord, RoomRecord};

/// A live room plus the bookkeeping needed to schedule work against it.
pub struct RoomEntry {
    pub room: Room,
    /// Bumped whenever pending AI or replay steps must stop.
    pub generation: u64,
    pub last_activity: Instant,
}

impl RoomEntry {
    fn new(room: Room) -> Self {
        Self {
            room,
            generation: 0,
            last_activity: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}

type SharedEntry = Arc<Mutex<RoomEntry>>;

/// Everything that has to happen after a move was applied and recorded under the room lock.
struct AppliedMove {
    state: GameState,
    /// Generation and delay of the next computer turn, if one is due.
    next_ai_turn: Option<(u64, Duration)>,
}

struct Inner {
    rooms: Mutex<HashMap<RoomId, SharedEntry>>,
    matchmaker: Mutex<Matchmaker>,
    store: Arc<dyn GameStore>,
    broadcaster: Broadcaster,
    selectors: MoveSelectors,
    config: ServerConfig,
}

#[derive(Clone)]
pub struct RoomManager {
    inner: Arc<Inner>,
}

impl RoomManager {
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn GameStore>,
        broadcaster: Broadcaster,
        selectors: MoveSelectors,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                rooms: Mutex::new(HashMap::new()),
                matchmaker: Mutex::new(Matchmaker::new()),
                store,
                broadcaster,
                selectors,
                config,
            }),
        }
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.inner.broadcaster
    }

    pub async fn room_count(&self) -> usize {
        self.inner.rooms.lock().await.len()
    }

    pub async fn game_state(&self, room_id: &RoomId) -> Option<GameState> {
        let entry = self.entry(room_id).await?;
        let guard = entry.lock().await;
        Some(guard.room.game_state())
    }

    pub async fn request_game(
        &self,
        client_id: &ClientId,
        mode: GameMode,
        difficulty: Option<Difficulty>,
    ) -> Result<(), GameError> {
        let room_id = RoomId::new(Uuid::new_v4().to_string());
        let result = self.inner.matchmaker.lock().await.request_game(
            client_id,
            mode,
            difficulty.unwrap_or_default(),
            room_id,
        );

        match result {
            MatchResult::Waiting => {
                info!(client_id = %client_id, "waiting for opponent");
                self.inner
                    .broadcaster
                    .send_to_client(client_id, ServerEvent::WaitingForOpponent)
                    .await;
            }
            MatchResult::Created(room) => self.open_room(client_id, room).await,
        }
        Ok(())
    }

    async fn open_room(&self, requester: &ClientId, room: Room) {
        let room_id = room.id().clone();
        info!(
            room_id = %room_id,
            room_type = ?room.room_type(),
            difficulty = %room.difficulty(),
            "room created"
        );

        self.persist_room(&room).await;

        let humans: Vec<ClientId> = room
            .players()
            .iter()
            .filter(|p| !p.is_computer_agent())
            .map(|p| ClientId::new(p.id.as_str()))
            .collect();
        for client_id in humans.iter().chain(std::iter::once(requester)) {
            self.inner.broadcaster.subscribe(&room_id, client_id).await;
        }

        let state = room.game_state();
        let next_ai_turn = room
            .is_computer_turn()
            .then(|| self.inner.config.ai_delay(room.room_type(), room.difficulty()));

        self.inner
            .rooms
            .lock()
            .await
            .insert(room_id.clone(), Arc::new(Mutex::new(RoomEntry::new(room))));

        self.send_game_start(&state).await;

        if let Some(delay) = next_ai_turn {
            self.schedule_ai_turn(room_id, 0, delay);
        }
    }

    pub async fn join_room(&self, client_id: &ClientId, room_id: &RoomId) -> Result<(), GameError> {
        let entry = match self.entry(room_id).await {
            Some(entry) => entry,
            None => self.restore(room_id).await?,
        };

        let (state, seated) = {
            let mut guard = entry.lock().await;
            guard.touch();
            let player_id = client_id.to_player_id();
            let mut seated = false;
            if guard.room.player(&player_id).is_none()
                && let Some(token) = guard.room.next_free_token()
            {
                seated = guard
                    .room
                    .add_player(Player::new(room_id.clone(), player_id, token));
            }
            (guard.room.game_state(), seated.then(|| guard.room.clone()))
        };

        if let Some(room) = seated {
            info!(room_id = %room_id, client_id = %client_id, "player seated");
            self.persist_room(&room).await;
        }

        self.inner.broadcaster.subscribe(room_id, client_id).await;
        self.send_game_start(&state).await;
        Ok(())
    }

    pub async fn leave_room(&self, client_id: &ClientId, room_id: &RoomId) {
        debug!(room_id = %room_id, client_id = %client_id, "leaving room");
        self.inner.broadcaster.unsubscribe(room_id, client_id).await;
        if let Some(entry) = self.entry(room_id).await {
            entry.lock().await.touch();
        }
    }

    /// Unknown rooms, spectators and illegal moves are ignored.
    pub async fn make_move(&self, client_id: &ClientId, room_id: &RoomId, row: usize, side: Side) {
        let Some(entry) = self.entry(room_id).await else {
            debug!(room_id = %room_id, "move for unknown room");
            return;
        };

        let applied = {
            let mut guard = entry.lock().await;
            let Some(player) = guard.room.player(&client_id.to_player_id()).cloned() else {
                debug!(room_id = %room_id, client_id = %client_id, "move from spectator ignored");
                return;
            };
            match guard.room.handle_move(player.token, row, side) {
                Ok(_) => {
                    self.commit_move(&mut guard, player.id, player.token, row, side)
                        .await
                }
                Err(e) => {
                    debug!(
                        room_id = %room_id,
                        client_id = %client_id,
                        row,
                        side = %side,
                        error = %e,
                        "invalid move"
                    );
                    return;
                }
            }
        };

        self.publish_move(room_id, applied).await;
    }

    pub async fn leave_waiting(&self, client_id: &ClientId) {
        if self.inner.matchmaker.lock().await.leave(client_id) {
            info!(client_id = %client_id, "left waiting queue");
        }
    }

    pub async fn disconnect(&self, client_id: &ClientId) {
        self.leave_waiting(client_id).await;
        self.inner.broadcaster.unregister(client_id).await;
    }

    pub async fn replay_game(
        &self,
        client_id: &ClientId,
        room_id: &RoomId,
    ) -> Result<(), GameError> {
        let entry = match self.entry(room_id).await {
            Some(entry) => entry,
            None => self.restore(room_id).await?,
        };

        if entry.lock().await.room.status() != RoomStatus::Finished {
            return Err(GameError::NotFinished);
        }
        let history = self.inner.store.move_history(room_id).await?;

        let (state, generation, step_delay) = {
            let mut guard = entry.lock().await;
            ReplayEngine::start(&mut guard.room)?;
            guard.generation += 1;
            guard.touch();
            let delay = self
                .inner
                .config
                .replay_step_delay(guard.room.room_type(), guard.room.difficulty());
            (guard.room.game_state(), guard.generation, delay)
        };

        info!(room_id = %room_id, moves = history.len(), generation, "replay started");
        self.inner.broadcaster.subscribe(room_id, client_id).await;
        self.update_status(room_id, RoomStatus::Replaying).await;
        self.inner
            .broadcaster
            .broadcast_to_room(room_id, ServerEvent::GameUpdate(state))
            .await;

        let manager = self.clone();
        let room_id = room_id.clone();
        tokio::spawn(async move {
            manager
                .run_replay(room_id, generation, ReplayEngine::new(history), step_delay)
                .await;
        });
        Ok(())
    }

    /// Sends a failure back to the client that caused it.
    pub async fn report_error(&self, client_id: &ClientId, error: &GameError) {
        self.inner
            .broadcaster
            .send_to_client(
                client_id,
                ServerEvent::GameError {
                    message: error.to_string(),
                },
            )
            .await;
    }

    /// Drops rooms nobody watches that have been quiet for `idle_timeout`.
    pub async fn evict_idle(&self, idle_timeout: Duration) -> Vec<RoomId> {
        let candidates: Vec<(RoomId, SharedEntry)> = self
            .inner
            .rooms
            .lock()
            .await
            .iter()
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect();

        let mut evicted = Vec::new();
        for (room_id, entry) in candidates {
            if self.inner.broadcaster.subscriber_count(&room_id).await > 0 {
                continue;
            }
            let mut guard = entry.lock().await;
            if guard.last_activity.elapsed() < idle_timeout {
                continue;
            }
            guard.generation += 1;
            self.inner.rooms.lock().await.remove(&room_id);
            evicted.push(room_id);
        }
        evicted
    }

    async fn entry(&self, room_id: &RoomId) -> Option<SharedEntry> {
        self.inner.rooms.lock().await.get(room_id).cloned()
    }

    async fn restore(&self, room_id: &RoomId) -> Result<SharedEntry, GameError> {
        let stored = self
            .inner
            .store
            .load_room(room_id)
            .await?
            .ok_or_else(|| GameError::RoomNotFound(room_id.clone()))?;
        let room = rebuild_room(&stored)?;
        info!(room_id = %room_id, moves = stored.moves.len(), "room restored from store");

        let next_ai_turn = room
            .is_computer_turn()
            .then(|| self.inner.config.ai_delay(room.room_type(), room.difficulty()));

        let (entry, inserted) = {
            let mut rooms = self.inner.rooms.lock().await;
            match rooms.get(room_id) {
                Some(existing) => (existing.clone(), false),
                None => {
                    let entry = Arc::new(Mutex::new(RoomEntry::new(room)));
                    rooms.insert(room_id.clone(), entry.clone());
                    (entry, true)
                }
            }
        };

        if inserted && let Some(delay) = next_ai_turn {
            self.schedule_ai_turn(room_id.clone(), 0, delay);
        }
        Ok(entry)
    }

    /// Appends the move record while the caller still holds the room lock, so a room
    /// seen as finished always has its full history in the store.
    async fn commit_move(
        &self,
        entry: &mut RoomEntry,
        player_id: PlayerId,
        token: Token,
        row: usize,
        side: Side,
    ) -> AppliedMove {
        entry.touch();
        let room = &entry.room;
        let record = MoveRecord {
            room_id: room.id().clone(),
            sequence: room.board().filled_cells().saturating_sub(1),
            player_id,
            token,
            row,
            side,
            played_at: Utc::now(),
        };
        debug!(
            room_id = %record.room_id,
            sequence = record.sequence,
            token = %token,
            row,
            side = %side,
            "move applied"
        );
        if let Err(e) = self.inner.store.append_move(record).await {
            warn!(room_id = %room.id(), error = %e, "failed to persist move");
        }

        let next_ai_turn = room.is_computer_turn().then(|| {
            (
                entry.generation,
                self.inner.config.ai_delay(room.room_type(), room.difficulty()),
            )
        });
        AppliedMove {
            state: room.game_state(),
            next_ai_turn,
        }
    }

    async fn publish_move(&self, room_id: &RoomId, applied: AppliedMove) {
        let AppliedMove {
            state,
            next_ai_turn,
        } = applied;

        if let Err(e) = self.inner.store.save_board(room_id, state.board.clone()).await {
            warn!(room_id = %room_id, error = %e, "failed to persist board");
        }
        if state.status == RoomStatus::Finished {
            info!(room_id = %room_id, winner = ?state.board.winner, "game finished");
            self.update_status(room_id, RoomStatus::Finished).await;
        }

        self.inner
            .broadcaster
            .broadcast_to_room(room_id, ServerEvent::GameUpdate(state))
            .await;

        if let Some((generation, delay)) = next_ai_turn {
            self.schedule_ai_turn(room_id.clone(), generation, delay);
        }
    }

    /// Queues one computer move. Each link re-checks the room and queues the next one.
    pub fn schedule_ai_turn(&self, room_id: RoomId, generation: u64, delay: Duration) {
        tokio::spawn(self.clone().run_ai_turn(room_id, generation, delay));
    }

    fn run_ai_turn(
        self,
        room_id: RoomId,
        generation: u64,
        delay: Duration,
    ) -> BoxFuture<'static, ()> {
        async move {
            tokio::time::sleep(delay).await;

            let Some(entry) = self.entry(&room_id).await else {
                return;
            };

            let (board, token, difficulty) = {
                let guard = entry.lock().await;
                if guard.generation != generation || !guard.room.is_computer_turn() {
                    debug!(room_id = %room_id, generation, "stale computer turn dropped");
                    return;
                }
                let board = *guard.room.board();
                (board, board.current_player(), guard.room.difficulty())
            };

            let Some(mv) = self
                .inner
                .selectors
                .for_difficulty(difficulty)
                .select_move(&board)
                .await
            else {
                return;
            };

            let applied = {
                let mut guard = entry.lock().await;
                if guard.generation != generation
                    || !guard.room.is_computer_turn()
                    || guard.room.board().current_player() != token
                {
                    debug!(room_id = %room_id, generation, "room changed while choosing a move");
                    return;
                }
                let Some(player_id) = guard.room.player_to_move().map(|p| p.id.clone()) else {
                    return;
                };
                if let Err(e) = guard.room.handle_move(token, mv.row, mv.side) {
                    warn!(room_id = %room_id, error = %e, "computer move rejected");
                    return;
                }
                self.commit_move(&mut guard, player_id, token, mv.row, mv.side)
                    .await
            };

            self.publish_move(&room_id, applied).await;
        }
        .boxed()
    }

    async fn run_replay(
        &self,
        room_id: RoomId,
        generation: u64,
        mut engine: ReplayEngine,
        step_delay: Duration,
    ) {
        let Some(entry) = self.entry(&room_id).await else {
            return;
        };

        loop {
            if !engine.is_exhausted() {
                tokio::time::sleep(step_delay).await;
            }

            let step = {
                let mut guard = entry.lock().await;
                if guard.generation != generation {
                    debug!(room_id = %room_id, generation, "replay superseded");
                    return;
                }
                guard.touch();
                match engine.step(&mut guard.room) {
                    Some(result) => result.map(|_| guard.room.game_state()),
                    None => {
                        let outcome = engine.finish(&guard.room);
                        drop(guard);
                        self.finish_replay(&room_id, outcome).await;
                        return;
                    }
                }
            };

            match step {
                Ok(state) => {
                    self.inner
                        .broadcaster
                        .broadcast_to_room(&room_id, ServerEvent::GameUpdate(state))
                        .await;
                }
                Err(e) => {
                    error!(room_id = %room_id, error = %e, "replay halted");
                    self.broadcast_error(&room_id, &e).await;
                    return;
                }
            }
        }
    }

    async fn finish_replay(&self, room_id: &RoomId, outcome: Result<(), GameError>) {
        match outcome {
            Ok(()) => {
                info!(room_id = %room_id, "replay finished");
                self.update_status(room_id, RoomStatus::Finished).await;
            }
            Err(e) => {
                error!(room_id = %room_id, error = %e, "replay ended early");
                self.broadcast_error(room_id, &e).await;
            }
        }
    }

    async fn broadcast_error(&self, room_id: &RoomId, error: &GameError) {
        self.inner
            .broadcaster
            .broadcast_to_room(
                room_id,
                ServerEvent::GameError {
                    message: error.to_string(),
                },
            )
            .await;
    }

    async fn send_game_start(&self, state: &GameState) {
        self.inner
            .broadcaster
            .broadcast_to_room_with(&state.room_id, |client_id| ServerEvent::GameStart {
                state: state.clone(),
                token: state
                    .players
                    .iter()
                    .find(|p| p.id == *client_id)
                    .map(|p| p.token),
            })
            .await;
    }

    async fn persist_room(&self, room: &Room) {
        if let Err(e) = self.inner.store.save_room(RoomRecord::from_room(room)).await {
            warn!(room_id = %room.id(), error = %e, "failed to persist room");
        }
    }

    async fn update_status(&self, room_id: &RoomId, status: RoomStatus) {
        if let Err(e) = self.inner.store.update_status(room_id, status).await {
            warn!(room_id = %room_id, error = %e, "failed to persist room status");
        }
    }
}
