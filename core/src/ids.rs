//! Identity newtypes shared across the overlay runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A platform account id (local user or friend).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A multiplayer lobby id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LobbyId(pub u64);

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the network layer knows about a connected friend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendInfo {
    pub id: UserId,
    pub name: String,
    /// The game the friend is currently playing.
    pub app_id: u32,
}

impl FriendInfo {
    pub fn new(id: UserId, name: impl Into<String>, app_id: u32) -> Self {
        Self {
            id,
            name: name.into(),
            app_id,
        }
    }
}
