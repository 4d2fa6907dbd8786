//! Chat engine — single-queue actor over rooms.
//!
//! DESIGN
//! ======
//! All mutations flow through one mpsc command queue owned by the engine
//! task, so apply-order is arrival order and appends are atomic without
//! locks. Simulation work (scripted arrivals, responder replies) runs in
//! spawned timer tasks that sleep and then feed an internal command back
//! into the same queue, which serializes their effects with live input.
//!
//! LIFECYCLE
//! =========
//! A room is created by its first join, seeded with the welcome pair, and
//! given the presence script matching that joiner's role. It lives while
//! it has watchers; the last part aborts its pending timers and evicts
//! it. Shutdown stops the loop and aborts every remaining timer before
//! the task exits, so no simulation outlives the engine.

use std::sync::Arc;

use futures::future;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::event::RoomEvent;
use crate::identity::{Participant, Role, SYSTEM};
use crate::message::Message;
use crate::responder::{PresenceScript, Responder, ScriptedResponder};
use crate::services::dashboard::{self, Dashboard};
use crate::services::room::{self, RoomError};
use crate::services::visibility::{self, ViewMode};
use crate::settings::{ChatSettings, SettingsPatch};
use crate::state::{EngineState, RoomState};

/// Command queue depth. Senders back-pressure when the loop lags.
const COMMAND_QUEUE_CAPACITY: usize = 256;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("room not found: {0}")]
    RoomNotFound(String),
    #[error("watcher {watcher} is not joined to {room}")]
    NotJoined { room: String, watcher: Uuid },
    #[error("invalid room name")]
    InvalidRoomName,
    #[error("invalid participant name: {0:?}")]
    InvalidParticipantName(String),
    #[error("room error: {0}")]
    Room(#[from] RoomError),
    #[error("engine closed")]
    Closed,
}

impl crate::event::ErrorCode for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::RoomNotFound(_) => "E_ROOM_NOT_FOUND",
            Self::NotJoined { .. } => "E_NOT_JOINED",
            Self::InvalidRoomName => "E_INVALID_ROOM_NAME",
            Self::InvalidParticipantName(_) => "E_INVALID_PARTICIPANT_NAME",
            Self::Room(e) => e.error_code(),
            Self::Closed => "E_ENGINE_CLOSED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Room(e) if e.retryable())
    }
}

/// Everything simulation-related is injected here; the engine itself is
/// deterministic.
pub struct EngineConfig {
    pub settings: ChatSettings,
    /// Counterpart simulation consulted after every human post. `None`
    /// disables replies entirely.
    pub responder: Option<Arc<dyn Responder>>,
    /// Scripted arrivals for rooms opened by a user.
    pub user_presence: PresenceScript,
    /// Scripted arrivals for rooms opened by an admin.
    pub admin_presence: PresenceScript,
}

impl EngineConfig {
    /// No simulation: no responder, no scripted arrivals.
    #[must_use]
    pub fn bare(settings: ChatSettings) -> Self {
        Self {
            settings,
            responder: None,
            user_presence: PresenceScript::empty(),
            admin_presence: PresenceScript::empty(),
        }
    }

    /// Demo preset: scripted responder plus role-dependent presence.
    #[must_use]
    pub fn simulated(settings: ChatSettings) -> Self {
        Self {
            settings,
            responder: Some(Arc::new(ScriptedResponder)),
            user_presence: PresenceScript::for_role(Role::User),
            admin_presence: PresenceScript::for_role(Role::Admin),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::bare(ChatSettings::default())
    }
}

/// A successful join: the subscription id used for posting and parting,
/// plus the receiving end of the watcher's event channel.
#[derive(Debug)]
pub struct JoinedRoom {
    pub room: String,
    pub watcher: Uuid,
    pub events: mpsc::Receiver<RoomEvent>,
}

enum Command {
    Join {
        room: String,
        participant: Participant,
        reply: oneshot::Sender<Result<JoinedRoom, EngineError>>,
    },
    Post {
        room: String,
        watcher: Uuid,
        body: String,
        recipient: Option<String>,
        reply: oneshot::Sender<Result<Message, EngineError>>,
    },
    MarkDelivered { room: String, id: Uuid, reply: oneshot::Sender<Result<bool, EngineError>> },
    MarkRead { room: String, id: Uuid, reply: oneshot::Sender<Result<bool, EngineError>> },
    ReadConversation {
        room: String,
        viewer: String,
        counterpart: String,
        reply: oneshot::Sender<Result<usize, EngineError>>,
    },
    Visible {
        room: String,
        viewer: String,
        mode: ViewMode,
        reply: oneshot::Sender<Result<Vec<Message>, EngineError>>,
    },
    Dashboard {
        room: String,
        viewer: String,
        reply: oneshot::Sender<Result<Dashboard, EngineError>>,
    },
    Connected { room: String, reply: oneshot::Sender<usize> },
    UpdateSettings { patch: SettingsPatch, reply: oneshot::Sender<ChatSettings> },
    Settings { reply: oneshot::Sender<ChatSettings> },
    Part { room: String, watcher: Uuid, reply: oneshot::Sender<()> },
    /// Internal: a scripted participant's timer fired.
    Arrive { room: String, participant: Participant },
    /// Internal: a scheduled simulated message is due.
    Deliver { room: String, sender: String, recipient: Option<String>, body: String },
    Shutdown,
}

// =============================================================================
// PUBLIC SURFACE
// =============================================================================

/// Owning side of the engine: spawns the task, hands out handles, and
/// tears the task down.
pub struct ChatEngine {
    handle: EngineHandle,
    task: JoinHandle<()>,
}

impl ChatEngine {
    /// Spawn the engine task.
    #[must_use]
    pub fn spawn(config: EngineConfig) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let task = EngineTask {
            state: EngineState::new(config.settings),
            responder: config.responder,
            user_presence: config.user_presence,
            admin_presence: config.admin_presence,
            commands: tx.clone(),
        };
        info!("engine started");
        let handle = EngineHandle { tx };
        let task = tokio::spawn(task.run(rx));
        Self { handle, task }
    }

    /// A clonable handle for issuing commands.
    #[must_use]
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Stop the engine: pending timers are aborted, the task exits.
    pub async fn shutdown(self) {
        let _ = self.handle.tx.send(Command::Shutdown).await;
        let _ = self.task.await;
    }
}

/// Cheap clonable front for the command queue. All operations are applied
/// in arrival order by the engine task.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
}

impl EngineHandle {
    async fn request<T>(&self, cmd: Command, rx: oneshot::Receiver<T>) -> Result<T, EngineError> {
        self.tx.send(cmd).await.map_err(|_| EngineError::Closed)?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// Join a room as `participant`, creating the room if needed.
    ///
    /// # Errors
    ///
    /// Returns an error for blank room or participant names, a reserved
    /// participant name, or a closed engine.
    pub async fn join(
        &self,
        room: &str,
        participant: Participant,
    ) -> Result<JoinedRoom, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Join { room: room.to_string(), participant, reply }, rx).await?
    }

    /// Post a message as the participant behind `watcher`. `recipient`
    /// `None` posts a broadcast.
    ///
    /// # Errors
    ///
    /// Returns an error if the room or subscription is unknown or the
    /// body fails validation.
    pub async fn post(
        &self,
        room: &str,
        watcher: Uuid,
        body: &str,
        recipient: Option<String>,
    ) -> Result<Message, EngineError> {
        let (reply, rx) = oneshot::channel();
        let cmd = Command::Post {
            room: room.to_string(),
            watcher,
            body: body.to_string(),
            recipient,
            reply,
        };
        self.request(cmd, rx).await?
    }

    /// Mark a message delivered. Returns whether the flag changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the room or message is unknown.
    pub async fn mark_delivered(&self, room: &str, id: Uuid) -> Result<bool, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::MarkDelivered { room: room.to_string(), id, reply }, rx).await?
    }

    /// Mark a message read. Returns whether the flag changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the room or message is unknown.
    pub async fn mark_read(&self, room: &str, id: Uuid) -> Result<bool, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::MarkRead { room: room.to_string(), id, reply }, rx).await?
    }

    /// Mark every unread message from `counterpart` that reaches `viewer`
    /// as read. Returns the number of messages that changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the room is unknown.
    pub async fn read_conversation(
        &self,
        room: &str,
        viewer: &str,
        counterpart: &str,
    ) -> Result<usize, EngineError> {
        let (reply, rx) = oneshot::channel();
        let cmd = Command::ReadConversation {
            room: room.to_string(),
            viewer: viewer.to_string(),
            counterpart: counterpart.to_string(),
            reply,
        };
        self.request(cmd, rx).await?
    }

    /// The messages `viewer` may see right now, in log order. The role is
    /// taken from the roster; unknown viewers are treated as users.
    ///
    /// # Errors
    ///
    /// Returns an error if the room is unknown.
    pub async fn visible(
        &self,
        room: &str,
        viewer: &str,
        mode: ViewMode,
    ) -> Result<Vec<Message>, EngineError> {
        let (reply, rx) = oneshot::channel();
        let cmd = Command::Visible {
            room: room.to_string(),
            viewer: viewer.to_string(),
            mode,
            reply,
        };
        self.request(cmd, rx).await?
    }

    /// Per-sender aggregates for `viewer`'s dashboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the room is unknown.
    pub async fn dashboard(&self, room: &str, viewer: &str) -> Result<Dashboard, EngineError> {
        let (reply, rx) = oneshot::channel();
        let cmd = Command::Dashboard {
            room: room.to_string(),
            viewer: viewer.to_string(),
            reply,
        };
        self.request(cmd, rx).await?
    }

    /// Connected watcher count; zero for rooms that do not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only when the engine is closed.
    pub async fn connected(&self, room: &str) -> Result<usize, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Connected { room: room.to_string(), reply }, rx).await
    }

    /// Apply a last-write-wins settings patch and notify every watcher.
    /// Returns the updated settings.
    ///
    /// # Errors
    ///
    /// Returns an error only when the engine is closed.
    pub async fn update_settings(&self, patch: SettingsPatch) -> Result<ChatSettings, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::UpdateSettings { patch, reply }, rx).await
    }

    /// Current engine-wide settings.
    ///
    /// # Errors
    ///
    /// Returns an error only when the engine is closed.
    pub async fn settings(&self) -> Result<ChatSettings, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Settings { reply }, rx).await
    }

    /// Drop a subscription. Parting the last watcher evicts the room and
    /// aborts its pending simulation timers.
    ///
    /// # Errors
    ///
    /// Returns an error only when the engine is closed.
    pub async fn part(&self, room: &str, watcher: Uuid) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Part { room: room.to_string(), watcher, reply }, rx).await
    }
}

// =============================================================================
// ENGINE TASK
// =============================================================================

struct EngineTask {
    state: EngineState,
    responder: Option<Arc<dyn Responder>>,
    user_presence: PresenceScript,
    admin_presence: PresenceScript,
    /// Clone of the command sender, handed to timer tasks.
    commands: mpsc::Sender<Command>,
}

impl EngineTask {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        while let Some(cmd) = rx.recv().await {
            if matches!(cmd, Command::Shutdown) {
                break;
            }
            self.apply(cmd).await;
        }
        self.teardown().await;
    }

    async fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Join { room, participant, reply } => {
                let _ = reply.send(self.handle_join(room, participant));
            }
            Command::Post { room, watcher, body, recipient, reply } => {
                let _ = reply.send(self.handle_post(&room, watcher, &body, recipient));
            }
            Command::MarkDelivered { room, id, reply } => {
                let result = self
                    .room_mut(&room)
                    .and_then(|rs| room::mark_delivered(rs, id).map_err(EngineError::from));
                let _ = reply.send(result);
            }
            Command::MarkRead { room, id, reply } => {
                let result = self
                    .room_mut(&room)
                    .and_then(|rs| room::mark_read(rs, id).map_err(EngineError::from));
                let _ = reply.send(result);
            }
            Command::ReadConversation { room, viewer, counterpart, reply } => {
                let result = self
                    .room_mut(&room)
                    .map(|rs| room::mark_conversation_read(rs, &viewer, &counterpart));
                let _ = reply.send(result);
            }
            Command::Visible { room, viewer, mode, reply } => {
                let result = self.room_ref(&room).map(|rs| {
                    let role = rs.roster.role_of(&viewer).unwrap_or(Role::User);
                    visibility::visible(&rs.log, &rs.roster, &viewer, role, &mode)
                        .into_iter()
                        .cloned()
                        .collect()
                });
                let _ = reply.send(result);
            }
            Command::Dashboard { room, viewer, reply } => {
                let result = self
                    .room_ref(&room)
                    .map(|rs| dashboard::dashboard(&rs.log, &rs.roster, &viewer));
                let _ = reply.send(result);
            }
            Command::Connected { room, reply } => {
                let count = self.state.rooms.get(&room).map_or(0, room::connected);
                let _ = reply.send(count);
            }
            Command::UpdateSettings { patch, reply } => {
                self.state.settings.apply(&patch);
                info!(patch = ?patch, "settings updated");
                let event = RoomEvent::SettingsUpdated { settings: self.state.settings };
                for room_state in self.state.rooms.values() {
                    room::broadcast(room_state, &event, None);
                }
                let _ = reply.send(self.state.settings);
            }
            Command::Settings { reply } => {
                let _ = reply.send(self.state.settings);
            }
            Command::Part { room, watcher, reply } => {
                self.handle_part(&room, watcher).await;
                let _ = reply.send(());
            }
            Command::Arrive { room, participant } => {
                match self.state.rooms.get_mut(&room) {
                    Some(rs) => room::arrive(rs, participant),
                    None => debug!(%room, "scripted arrival dropped, room gone"),
                }
            }
            Command::Deliver { room, sender, recipient, body } => {
                let Some(rs) = self.state.rooms.get_mut(&room) else {
                    debug!(%room, %sender, "scheduled message dropped, room gone");
                    return;
                };
                if let Err(e) = room::post(rs, &sender, &body, recipient, None) {
                    debug!(error = %e, %room, %sender, "scheduled message dropped");
                }
            }
            Command::Shutdown => {}
        }
    }

    fn room_ref(&self, room: &str) -> Result<&RoomState, EngineError> {
        self.state.rooms.get(room).ok_or_else(|| EngineError::RoomNotFound(room.to_string()))
    }

    fn room_mut(&mut self, room: &str) -> Result<&mut RoomState, EngineError> {
        self.state
            .rooms
            .get_mut(room)
            .ok_or_else(|| EngineError::RoomNotFound(room.to_string()))
    }

    fn handle_join(
        &mut self,
        room: String,
        participant: Participant,
    ) -> Result<JoinedRoom, EngineError> {
        if room.trim().is_empty() {
            return Err(EngineError::InvalidRoomName);
        }
        let name = participant.name.trim();
        if name.is_empty() || name == SYSTEM {
            return Err(EngineError::InvalidParticipantName(participant.name.clone()));
        }

        let fresh = !self.state.rooms.contains_key(&room);
        let room_state =
            self.state.rooms.entry(room.clone()).or_insert_with(|| RoomState::new(room.clone()));
        if fresh {
            info!(%room, first = %participant.name, "room created");
            room::seed_welcome(room_state, &participant);
            let script = match participant.role {
                Role::Admin => self.admin_presence.clone(),
                Role::User => self.user_presence.clone(),
            };
            schedule_presence(script, &self.commands, room_state, &participant);
        }
        let (watcher, events) = room::join(room_state, participant);
        Ok(JoinedRoom { room, watcher, events })
    }

    fn handle_post(
        &mut self,
        room: &str,
        watcher: Uuid,
        body: &str,
        recipient: Option<String>,
    ) -> Result<Message, EngineError> {
        let room_state = self
            .state
            .rooms
            .get_mut(room)
            .ok_or_else(|| EngineError::RoomNotFound(room.to_string()))?;
        let author = room_state
            .watchers
            .get(&watcher)
            .map(|w| w.participant.clone())
            .ok_or(EngineError::NotJoined { room: room.to_string(), watcher })?;

        let message = room::post(room_state, &author.name, body, recipient, None)?;
        // Only live human posts consult the responder; scheduled messages
        // never cascade.
        if let Some(responder) = &self.responder {
            schedule_reply(
                Arc::clone(responder),
                &self.commands,
                room_state,
                message.clone(),
                author.role,
            );
        }
        Ok(message)
    }

    async fn handle_part(&mut self, room: &str, watcher: Uuid) {
        let Some(room_state) = self.state.rooms.get_mut(room) else {
            return;
        };
        if room::part(room_state, watcher) {
            let timers: Vec<JoinHandle<()>> = room_state.timers.drain(..).collect();
            abort_all(timers).await;
            self.state.rooms.remove(room);
            info!(%room, "room evicted");
        }
    }

    async fn teardown(mut self) {
        let timers: Vec<JoinHandle<()>> =
            self.state.rooms.values_mut().flat_map(|rs| rs.timers.drain(..)).collect();
        let aborted = timers.len();
        abort_all(timers).await;
        info!(aborted, rooms = self.state.rooms.len(), "engine stopped");
    }
}

// =============================================================================
// TIMERS
// =============================================================================

/// Spawn one timer per scripted arrival. Each sleeps, then queues the
/// arrival and any greeting addressed to the first human joiner.
fn schedule_presence(
    script: PresenceScript,
    commands: &mpsc::Sender<Command>,
    room: &mut RoomState,
    first: &Participant,
) {
    room.timers.retain(|t| !t.is_finished());
    for join in script.joins {
        let commands = commands.clone();
        let room_name = room.name.clone();
        let greet_target = first.name.clone();
        debug!(
            room = %room_name,
            name = %join.participant.name,
            delay = ?join.delay,
            "scheduled simulated arrival"
        );
        let handle = tokio::spawn(async move {
            sleep(join.delay).await;
            let sender = join.participant.name.clone();
            let _ = commands
                .send(Command::Arrive { room: room_name.clone(), participant: join.participant })
                .await;
            if let Some(body) = join.greeting {
                let cmd = Command::Deliver {
                    room: room_name,
                    sender,
                    recipient: Some(greet_target),
                    body,
                };
                let _ = commands.send(cmd).await;
            }
        });
        room.timers.push(handle);
    }
}

/// Consult the responder off-loop; if it wants a reply, sleep out the
/// delay and queue the delivery.
fn schedule_reply(
    responder: Arc<dyn Responder>,
    commands: &mpsc::Sender<Command>,
    room: &mut RoomState,
    message: Message,
    sender_role: Role,
) {
    let commands = commands.clone();
    let room_name = room.name.clone();
    room.timers.retain(|t| !t.is_finished());
    let handle = tokio::spawn(async move {
        match responder.reply_to(&message, sender_role).await {
            Ok(Some(reply)) => {
                debug!(
                    room = %room_name,
                    sender = %reply.sender,
                    delay = ?reply.delay,
                    "scheduled simulated reply"
                );
                sleep(reply.delay).await;
                let cmd = Command::Deliver {
                    room: room_name,
                    sender: reply.sender,
                    recipient: reply.recipient,
                    body: reply.body,
                };
                let _ = commands.send(cmd).await;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, room = %room_name, "responder failed, reply dropped"),
        }
    });
    room.timers.push(handle);
}

/// Abort and reap a batch of timer tasks.
async fn abort_all(timers: Vec<JoinHandle<()>>) {
    for timer in &timers {
        timer.abort();
    }
    let _ = future::join_all(timers).await;
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
