//! Host callback sink.
//!
//! Events the overlay raises back into the host process. The sink may
//! dispatch synchronously into host code, so the runtime never holds its
//! state lock while calling these.

use crate::ids::{LobbyId, UserId};

pub trait CallbackSink: Send + Sync {
    /// The overlay was shown or hidden.
    fn overlay_activated(&self, active: bool, app_id: u32);

    /// The user accepted a lobby invite or a friend's ambient lobby.
    fn lobby_join_requested(&self, lobby: LobbyId, friend: UserId);

    /// The user accepted a rich-presence invite.
    fn rich_presence_join_requested(&self, friend: UserId, connect: &str);
}
