//! Per-friend chat/invite window state.
//!
//! Window flags are edge-triggered: the paint pass sets them from UI
//! actions, the next tick drains them. A pending invitation is a tagged
//! value rather than two flags, which makes the lobby/rich mutual
//! exclusion structural.

use std::collections::BTreeMap;

use scrim_core::ids::{FriendInfo, LobbyId, UserId};

use crate::window_id::{find_free_id, FRIEND_WINDOW_ID_BASE};

/// Upper bound on a chat input line, in bytes.
pub const MAX_CHAT_LEN: usize = 768;

/// Upper bound on a rich-presence connect string, in bytes.
pub const MAX_CONNECT_LEN: usize = 256;

/// Edge-triggered per-window state bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowFlags(u8);

impl WindowFlags {
    /// The chat window is open.
    pub const SHOW: WindowFlags = WindowFlags(1 << 0);
    /// The user asked to invite this friend.
    pub const INVITE: WindowFlags = WindowFlags(1 << 1);
    /// The user accepted an invitation from this friend.
    pub const JOIN: WindowFlags = WindowFlags(1 << 2);
    /// The user submitted a chat line.
    pub const SEND_MESSAGE: WindowFlags = WindowFlags(1 << 3);
    /// An event arrived while the window was hidden.
    pub const NEED_ATTENTION: WindowFlags = WindowFlags(1 << 4);

    pub fn set(&mut self, flag: WindowFlags) {
        self.0 |= flag.0;
    }

    pub fn clear(&mut self, flag: WindowFlags) {
        self.0 &= !flag.0;
    }

    pub fn contains(self, flag: WindowFlags) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// The invitation (if any) a friend has extended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PendingInvite {
    #[default]
    None,
    Lobby(LobbyId),
    Rich(String),
}

/// UI state for one friend's chat/invite window.
pub struct FriendWindow {
    pub info: FriendInfo,
    pub window_id: u32,
    pub title: String,
    pub flags: WindowFlags,
    pub invite: PendingInvite,
    pub chat_history: String,
    pub chat_input: String,
    pub joinable: bool,
}

impl FriendWindow {
    fn new(info: FriendInfo, window_id: u32) -> Self {
        let title = format!("{} playing {}", info.name, info.app_id);
        Self {
            info,
            window_id,
            title,
            flags: WindowFlags::default(),
            invite: PendingInvite::None,
            chat_history: String::new(),
            chat_input: String::new(),
            joinable: false,
        }
    }

    pub fn has_lobby_invite(&self) -> bool {
        matches!(self.invite, PendingInvite::Lobby(_))
    }

    pub fn has_any_invite(&self) -> bool {
        !matches!(self.invite, PendingInvite::None)
    }

    /// Append one line of chat.
    pub fn append_chat(&mut self, speaker: &str, text: &str) {
        self.chat_history.push_str(speaker);
        self.chat_history.push_str(": ");
        self.chat_history.push_str(text);
        self.chat_history.push('\n');
    }
}

/// All connected friends, ordered by user id for stable UI iteration.
#[derive(Default)]
pub struct FriendRegistry {
    windows: BTreeMap<UserId, FriendWindow>,
}

impl FriendRegistry {
    /// Register a connecting friend. Returns the allocated window id, or
    /// `None` (dropping the friend) when the id range is exhausted.
    pub fn connect(&mut self, info: FriendInfo) -> Option<u32> {
        let mut ids: Vec<u32> = self.windows.values().map(|w| w.window_id).collect();
        let Some(id) = find_free_id(&mut ids, FRIEND_WINDOW_ID_BASE) else {
            tracing::warn!(user = %info.id, "no free id for a friend window");
            return None;
        };
        self.windows.insert(info.id, FriendWindow::new(info, id));
        Some(id)
    }

    /// Drop a disconnecting friend's window.
    pub fn disconnect(&mut self, user: UserId) -> bool {
        self.windows.remove(&user).is_some()
    }

    pub fn get(&self, user: UserId) -> Option<&FriendWindow> {
        self.windows.get(&user)
    }

    pub fn get_mut(&mut self, user: UserId) -> Option<&mut FriendWindow> {
        self.windows.get_mut(&user)
    }

    /// Record a lobby invitation. Replaces any rich invite (the two are
    /// mutually exclusive). Returns false for unknown friends.
    pub fn set_lobby_invite(&mut self, user: UserId, lobby: LobbyId) -> bool {
        match self.windows.get_mut(&user) {
            Some(window) => {
                window.invite = PendingInvite::Lobby(lobby);
                true
            }
            None => false,
        }
    }

    /// Record a rich-presence invitation, truncated to
    /// [`MAX_CONNECT_LEN`]. Replaces any lobby invite.
    pub fn set_rich_invite(&mut self, user: UserId, connect: &str) -> bool {
        match self.windows.get_mut(&user) {
            Some(window) => {
                let mut connect = connect.to_string();
                if connect.len() > MAX_CONNECT_LEN {
                    let mut cut = MAX_CONNECT_LEN;
                    while !connect.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    connect.truncate(cut);
                }
                window.invite = PendingInvite::Rich(connect);
                true
            }
            None => false,
        }
    }

    /// Flag a hidden window as needing attention. No-op when the window
    /// is currently shown and the overlay itself is visible.
    pub fn mark_attention(&mut self, user: UserId, overlay_shown: bool) {
        if let Some(window) = self.windows.get_mut(&user)
            && (!window.flags.contains(WindowFlags::SHOW) || !overlay_shown)
        {
            window.flags.set(WindowFlags::NEED_ATTENTION);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserId, &FriendWindow)> {
        self.windows.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&UserId, &mut FriendWindow)> {
        self.windows.iter_mut()
    }

    pub fn user_ids(&self) -> Vec<UserId> {
        self.windows.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
