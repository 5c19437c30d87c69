//! Rich-presence and lobby lookups.

use crate::ids::{LobbyId, UserId};

/// The rich-presence key whose value is a join-connect string.
pub const RICH_PRESENCE_CONNECT: &str = "connect";

/// Read access to rich presence and lobby membership, for the local user
/// and for friends. Queries are passive; the source never calls back into
/// the overlay.
pub trait Presence: Send + Sync {
    /// A user's rich-presence value for `key`, if set and non-empty.
    fn rich_presence(&self, user: UserId, key: &str) -> Option<String>;

    /// The lobby a user currently sits in, if any.
    fn lobby_of(&self, user: UserId) -> Option<LobbyId>;

    /// The local user's own lobby, if any.
    fn local_lobby(&self) -> Option<LobbyId>;
}
