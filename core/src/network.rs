//! The network transport boundary.
//!
//! Chat and invites travel over the host's transport; incoming messages are
//! delivered through an explicit handler registry keyed by channel and
//! recipient. Handlers may be invoked from the transport's own thread, so
//! implementations hold no overlay locks while dispatching.

use std::sync::Arc;

use crate::ids::{LobbyId, UserId};

/// A transport channel id. The overlay owns a single chat channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Channel(pub u32);

impl Channel {
    /// Friend chat traffic.
    pub const CHAT: Channel = Channel(0x10);
}

/// A friend chat message, inbound or outbound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub from: UserId,
    pub to: UserId,
    pub text: String,
}

/// An invitation to join the local user's game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameInvite {
    /// Join via a rich-presence connect string.
    Rich(String),
    /// Join via a lobby.
    Lobby(LobbyId),
}

/// Receiver side of the handler registry.
pub trait MessageHandler: Send + Sync {
    fn on_chat_message(&self, message: &ChatMessage);
}

pub trait Network: Send + Sync {
    /// Send a chat message. Returns false when the transport rejected it.
    fn send_chat(&self, message: &ChatMessage, reliable: bool) -> bool;

    /// Send a game invite to a friend.
    fn send_invite(&self, to: UserId, invite: &GameInvite, reliable: bool) -> bool;

    /// Register `handler` for messages on `channel` addressed to
    /// `recipient`. A later registration for the same key replaces the
    /// earlier one.
    fn register_handler(&self, channel: Channel, recipient: UserId, handler: Arc<dyn MessageHandler>);

    /// Drop the registration for `channel`/`recipient`, if any.
    fn unregister_handler(&self, channel: Channel, recipient: UserId);
}
