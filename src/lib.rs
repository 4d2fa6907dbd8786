//! In-memory support-chat room engine with role-scoped visibility.
//!
//! Participants carrying an explicit role join named rooms and exchange
//! broadcast or private messages; simulated presence and counterpart
//! replies come from injectable scripts and responders. The core is the
//! visibility filter: given the append-only log, a viewer, and a view
//! mode, compute exactly the messages that viewer may see, plus the
//! per-sender aggregates behind the admin dashboard.

pub mod engine;
pub mod event;
pub mod identity;
pub mod message;
pub mod responder;
pub mod services;
pub mod settings;
pub mod state;

pub use engine::{ChatEngine, EngineConfig, EngineError, EngineHandle, JoinedRoom};
pub use event::{ErrorCode, RoomEvent};
pub use identity::{DEFAULT_BOT, Participant, Role, SYSTEM, display_code};
pub use message::{MAX_BODY_LEN, Message};
pub use responder::{
    PresenceScript, Responder, ResponderError, ScheduledReply, ScriptedJoin, ScriptedResponder,
};
pub use services::dashboard::{Dashboard, SenderStats};
pub use services::room::RoomError;
pub use services::visibility::ViewMode;
pub use settings::{ChatSettings, SettingsPatch, Theme};
