//! The overlay coordinator.
//!
//! `OverlayManager` owns every stateful piece of the overlay and exposes
//! the two entry points the host drives it through: `run_callbacks` once
//! per frame/update cycle on the host's thread, and `overlay_proc` from
//! the render thread once the present hook is live. A third call source,
//! the network transport, delivers chat through the handler registered at
//! construction.
//!
//! Locking: one mutex guards the bulk of the state, a second guards the
//! notification queue so notification timing is never stalled by friend
//! work. Calls into the network and the host callback sink are made with
//! the state lock released; renderer texture calls are entry-state
//! mutation and stay under it (the renderer contract keeps them
//! non-blocking and callback-free). A poisoned lock (a panicking paint)
//! degrades to "nothing drawn this frame" rather than taking the host
//! down.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Instant;

use scrim_core::callbacks::CallbackSink;
use scrim_core::config::{language_index, OverlayPrefs, OverlayPrefsExt, VALID_LANGUAGES};
use scrim_core::ids::{FriendInfo, LobbyId, UserId};
use scrim_core::image::{ImageData, SizeClass};
use scrim_core::network::{Channel, ChatMessage, GameInvite, MessageHandler, Network};
use scrim_core::presence::{Presence, RICH_PRESENCE_CONNECT};
use scrim_core::provider::ImageProvider;
use scrim_core::renderer::{Renderer, RendererCandidate};
use scrim_core::settings::{SessionSettings, SettingsUpdate};
use scrim_core::ui::OverlayUi;

use crate::achievements::AchievementRoster;
use crate::cache::{ImageKey, ProfileImageCache, TemporaryImageCache};
use crate::detector::{detect_renderer, DetectionPoll, RendererDetection, DETECTION_GRACE};
use crate::friends::{FriendRegistry, PendingInvite, WindowFlags};
use crate::lazy::{AttemptOutcome, LazyLoadTracker, SizeSet};
use crate::notifications::{NotificationKind, NotificationQueue};
use crate::paint;

/// Everything guarded by the manager's state mutex.
pub(crate) struct OverlayState {
    pub(crate) friends: FriendRegistry,
    /// Friends with flags to drain on the next tick, in arrival order.
    pub(crate) pending_actions: VecDeque<UserId>,
    pub(crate) profile_images: ProfileImageCache,
    pub(crate) temp_images: TemporaryImageCache,
    pub(crate) lazy_loads: LazyLoadTracker,
    pub(crate) achievements: AchievementRoster,
    pub(crate) renderer: Option<Arc<dyn Renderer>>,
    pub(crate) show_overlay: bool,
    pub(crate) overlay_state_changed: bool,
    pub(crate) i_have_lobby: bool,
    pub(crate) show_url: String,
    pub(crate) show_achievements: bool,
    pub(crate) show_settings: bool,
    pub(crate) save_requested: bool,
    pub(crate) username_input: String,
    pub(crate) language_index: usize,
    pub(crate) prefs: OverlayPrefs,
    pub(crate) forced_settings: bool,
    pub(crate) warn_local_save: bool,
    pub(crate) warn_forced: bool,
}

/// Side effects collected under the state lock, performed after it is
/// released.
enum DrainEffect {
    Chat(ChatMessage),
    Invite { to: UserId, invite: GameInvite },
    JoinLobby { lobby: LobbyId, friend: UserId },
    JoinRich { friend: UserId, connect: String },
}

pub struct OverlayManager {
    settings: Arc<dyn SessionSettings>,
    presence: Arc<dyn Presence>,
    provider: Arc<dyn ImageProvider>,
    network: Arc<dyn Network>,
    callbacks: Arc<dyn CallbackSink>,
    state: Mutex<OverlayState>,
    notifications: Mutex<NotificationQueue>,
    have_notifications: AtomicBool,
    is_ready: AtomicBool,
    setup_called: AtomicBool,
    detection: Mutex<Option<RendererDetection>>,
}

/// Forwards transport chat into the manager without keeping it alive.
struct ChatRelay {
    manager: Weak<OverlayManager>,
}

impl MessageHandler for ChatRelay {
    fn on_chat_message(&self, message: &ChatMessage) {
        if let Some(manager) = self.manager.upgrade() {
            manager.handle_chat(message);
        }
    }
}

impl OverlayManager {
    pub fn new(
        settings: Arc<dyn SessionSettings>,
        presence: Arc<dyn Presence>,
        provider: Arc<dyn ImageProvider>,
        network: Arc<dyn Network>,
        callbacks: Arc<dyn CallbackSink>,
        mut prefs: OverlayPrefs,
    ) -> Arc<Self> {
        // The settings loader is authoritative for these at startup; the
        // prefs copy is what the settings window edits.
        prefs.show_achievement_desc_on_unlock = settings.show_achievement_desc_on_unlock();
        prefs.show_achievement_hidden_unearned = settings.show_achievement_hidden_unearned();

        let mut profile_images = ProfileImageCache::default();
        profile_images.ensure_entry(settings.local_user());

        let state = OverlayState {
            friends: FriendRegistry::default(),
            pending_actions: VecDeque::new(),
            profile_images,
            temp_images: TemporaryImageCache::default(),
            lazy_loads: LazyLoadTracker::default(),
            achievements: AchievementRoster::default(),
            renderer: None,
            show_overlay: false,
            overlay_state_changed: false,
            i_have_lobby: false,
            show_url: String::new(),
            show_achievements: false,
            show_settings: false,
            save_requested: false,
            username_input: settings.local_name(),
            language_index: language_index(&settings.language()),
            prefs,
            forced_settings: settings.forced_settings(),
            warn_local_save: settings.warn_local_save(),
            warn_forced: settings.forced_settings(),
        };

        let manager = Arc::new(Self {
            settings,
            presence,
            provider,
            network,
            callbacks,
            state: Mutex::new(state),
            notifications: Mutex::new(NotificationQueue::default()),
            have_notifications: AtomicBool::new(false),
            is_ready: AtomicBool::new(false),
            setup_called: AtomicBool::new(false),
            detection: Mutex::new(None),
        });

        let relay = Arc::new(ChatRelay {
            manager: Arc::downgrade(&manager),
        });
        manager
            .network
            .register_handler(Channel::CHAT, manager.settings.local_user(), relay);

        manager
    }

    // ── lifecycle ───────────────────────────────────────────────────────

    /// Begin renderer detection. Idempotent: only the first call does
    /// anything.
    pub fn setup(&self, candidates: Vec<Box<dyn RendererCandidate>>) {
        if self.setup_called.swap(true, Ordering::AcqRel) {
            return;
        }
        match detect_renderer(candidates, None) {
            Ok(detection) => {
                if let Ok(mut slot) = self.detection.lock() {
                    *slot = Some(detection);
                }
            }
            Err(err) => tracing::warn!(%err, "renderer detection failed to start"),
        }
    }

    /// Cancel detection and wait a bounded grace period for it to
    /// quiesce, then drop the transport registration.
    pub fn teardown(&self) {
        let detection = match self.detection.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(detection) = detection {
            detection.shutdown(DETECTION_GRACE);
        }
        self.network
            .unregister_handler(Channel::CHAT, self.settings.local_user());
    }

    /// Whether the present hook is installed and painting.
    pub fn ready(&self) -> bool {
        self.is_ready.load(Ordering::Acquire)
    }

    pub fn need_present(&self) -> bool {
        true
    }

    fn hook_ready(&self, ready: bool) {
        tracing::debug!(ready, "present hook readiness changed");
        self.is_ready.store(ready, Ordering::Release);
    }

    // ── visibility ──────────────────────────────────────────────────────

    pub fn is_shown(&self) -> bool {
        self.state.lock().map(|st| st.show_overlay).unwrap_or(false)
    }

    pub fn show(&self, visible: bool) {
        if !self.ready() {
            return;
        }
        if let Ok(mut st) = self.state.lock()
            && st.show_overlay != visible
        {
            st.show_overlay = visible;
            st.overlay_state_changed = true;
        }
    }

    /// The hotkey hook: optionally toggle, and report visibility.
    pub fn toggle_hook(&self, toggle: bool) -> bool {
        if toggle {
            self.show(!self.is_shown());
        }
        self.is_shown()
    }

    pub fn open(&self) {
        self.show(true);
    }

    pub fn open_invite(&self, _lobby: LobbyId) {
        self.show(true);
    }

    pub fn open_webpage(&self, url: &str) {
        if let Ok(mut st) = self.state.lock() {
            st.show_url = url.to_string();
        }
        self.show(true);
    }

    // ── notification preferences ────────────────────────────────────────

    pub fn set_notification_position(&self, corner: scrim_core::config::NotificationCorner) {
        if let Ok(mut st) = self.state.lock() {
            st.prefs.notification_corner = corner;
        }
    }

    pub fn set_notification_inset(&self, horizontal: i32, vertical: i32) {
        if let Ok(mut st) = self.state.lock() {
            st.prefs.h_inset = horizontal;
            st.prefs.v_inset = vertical;
        }
    }

    // ── friend lifecycle and invitations ────────────────────────────────

    pub fn friend_connect(&self, info: FriendInfo) {
        if let Ok(mut st) = self.state.lock() {
            let user = info.id;
            if st.friends.connect(info).is_some() {
                st.profile_images.ensure_entry(user);
            }
        }
    }

    pub fn friend_disconnect(&self, user: UserId) {
        if let Ok(mut st) = self.state.lock() {
            st.friends.disconnect(user);
            // Pending loads are abandoned; in-flight results are ignored.
            st.lazy_loads.abandon(user);
        }
    }

    pub fn set_lobby_invite(&self, friend: UserId, lobby: LobbyId) {
        if !self.ready() {
            return;
        }
        let invited = {
            let Ok(mut st) = self.state.lock() else { return };
            let shown = st.show_overlay;
            if !st.friends.set_lobby_invite(friend, lobby) {
                return;
            }
            st.friends.mark_attention(friend, shown);
            st.friends.get(friend).map(|w| w.info.name.clone())
        };
        if let Some(name) = invited {
            self.post_notification(
                NotificationKind::Invite,
                format!("{name} invited you to join a game"),
                Some(friend),
                None,
            );
        }
    }

    pub fn set_rich_invite(&self, friend: UserId, connect: &str) {
        if !self.ready() {
            return;
        }
        let invited = {
            let Ok(mut st) = self.state.lock() else { return };
            let shown = st.show_overlay;
            if !st.friends.set_rich_invite(friend, connect) {
                return;
            }
            st.friends.mark_attention(friend, shown);
            st.friends.get(friend).map(|w| w.info.name.clone())
        };
        if let Some(name) = invited {
            self.post_notification(
                NotificationKind::Invite,
                format!("{name} invited you to join a game"),
                Some(friend),
                None,
            );
        }
    }

    // ── events from the host ────────────────────────────────────────────

    /// An achievement just unlocked: refresh the roster entry and pop a
    /// notification.
    pub fn achievement_unlocked(&self, name: &str) {
        let message = {
            let Ok(mut st) = self.state.lock() else { return };
            let renderer = st.renderer.clone();
            st.achievements
                .record_unlock(name, self.provider.as_ref(), renderer.as_ref());
            let Some(ach) = st.achievements.get(name) else {
                return;
            };
            if st.prefs.show_achievement_desc_on_unlock {
                format!("Achievement Unlocked!\n{}\n{}", ach.title, ach.description)
            } else {
                format!("Achievement Unlocked!\n\n{}", ach.title)
            }
        };
        self.post_notification(
            NotificationKind::Achievement,
            message,
            None,
            Some(name.to_string()),
        );
    }

    /// The provider reports a user's avatar content changed: invalidate
    /// so the next paint re-requests it.
    pub fn on_avatar_changed(&self, user: UserId) {
        if let Ok(mut st) = self.state.lock() {
            let renderer = st.renderer.clone();
            st.profile_images.invalidate(user, renderer.as_ref());
        }
    }

    /// Replace the local user's profile image for one size class.
    pub fn set_local_profile_image(&self, size: SizeClass, image: &ImageData) -> bool {
        if !self.settings.set_profile_image(size, image) {
            return false;
        }
        if let Ok(mut st) = self.state.lock() {
            let renderer = st.renderer.clone();
            st.profile_images
                .invalidate_size(self.settings.local_user(), size, renderer.as_ref());
        }
        true
    }

    fn handle_chat(&self, message: &ChatMessage) {
        let notification = {
            let Ok(mut st) = self.state.lock() else { return };
            let shown = st.show_overlay;
            let appended = match st.friends.get_mut(message.from) {
                Some(window) => {
                    let name = window.info.name.clone();
                    window.append_chat(&name, &message.text);
                    Some(name)
                }
                None => None,
            };
            match appended {
                Some(name) => {
                    st.friends.mark_attention(message.from, shown);
                    Some(format!("{name} says: {}", message.text))
                }
                None => None,
            }
        };
        if let Some(text) = notification {
            self.post_notification(NotificationKind::Message, text, Some(message.from), None);
        }
    }

    fn post_notification(
        &self,
        kind: NotificationKind,
        message: String,
        friend: Option<UserId>,
        achievement: Option<String>,
    ) -> Option<u32> {
        let Ok(mut queue) = self.notifications.lock() else {
            return None;
        };
        let id = queue.post(kind, message, friend, achievement, Instant::now());
        if id.is_some() {
            self.have_notifications.store(true, Ordering::Release);
        }
        id
    }

    // ── queries ─────────────────────────────────────────────────────────

    pub fn friend_flags(&self, user: UserId) -> Option<WindowFlags> {
        let st = self.state.lock().ok()?;
        st.friends.get(user).map(|w| w.flags)
    }

    pub fn friend_invite(&self, user: UserId) -> Option<PendingInvite> {
        let st = self.state.lock().ok()?;
        st.friends.get(user).map(|w| w.invite.clone())
    }

    pub fn friend_chat_history(&self, user: UserId) -> Option<String> {
        let st = self.state.lock().ok()?;
        st.friends.get(user).map(|w| w.chat_history.clone())
    }

    pub fn notification_count(&self) -> usize {
        self.notifications.lock().map(|q| q.len()).unwrap_or(0)
    }

    // ── custom images ───────────────────────────────────────────────────

    /// Draw a caller-supplied RGBA buffer, caching it by `key` identity.
    /// The buffer content is only consulted on first display; reuse the
    /// same key to mean "the same logical image".
    pub fn draw_custom_image(
        &self,
        ui: &mut dyn OverlayUi,
        key: ImageKey,
        pixels: &[u8],
        width: u32,
        height: u32,
        draw_width: f32,
        draw_height: f32,
        alpha: f32,
    ) {
        let Ok(mut st) = self.state.lock() else { return };
        let renderer = st.renderer.clone();
        let now = Instant::now();
        if let Some(image) = st
            .temp_images
            .touch(key, pixels, width, height, now, renderer.as_ref())
        {
            image.create_texture(renderer.as_ref());
            if let Some(texture) = image.texture_id() {
                ui.image(texture, draw_width, draw_height, alpha);
            }
        }
    }

    // ── tick ────────────────────────────────────────────────────────────

    /// The per-frame/update tick, driven by the host.
    pub fn run_callbacks(self: &Arc<Self>) {
        self.populate_achievements();
        self.poll_detection();
        self.emit_visibility_change();
        self.persist_settings_if_requested();

        let mut effects = Vec::new();
        if let Ok(mut st) = self.state.lock() {
            self.refresh_presence(&mut st);
            self.tick_lazy_loads(&mut st);
            let renderer = st.renderer.clone();
            st.temp_images.prune(Instant::now(), renderer.as_ref());
            self.drain_friend_actions(&mut st, &mut effects);
        }
        self.perform_effects(effects);
    }

    fn populate_achievements(&self) {
        let populated = self
            .state
            .lock()
            .map(|st| !st.achievements.is_empty())
            .unwrap_or(true);
        if populated {
            return;
        }
        let infos = self.provider.achievements();
        if infos.is_empty() {
            return;
        }
        if let Ok(mut st) = self.state.lock() {
            let renderer = st.renderer.clone();
            st.achievements
                .populate(infos, self.provider.as_ref(), renderer.as_ref());
        }
    }

    fn poll_detection(self: &Arc<Self>) {
        if self.ready() {
            return;
        }
        let polled = match self.detection.lock() {
            Ok(mut slot) => slot.as_mut().map(RendererDetection::poll),
            Err(_) => None,
        };
        let Some(DetectionPoll::Detected(renderer)) = polled else {
            return;
        };

        if let Ok(mut st) = self.state.lock() {
            st.renderer = Some(renderer.clone());
        }

        let weak = Arc::downgrade(self);
        renderer.set_hook_ready_callback(Box::new(move |ready| {
            if let Some(manager) = weak.upgrade() {
                manager.hook_ready(ready);
            }
        }));
        let weak = Arc::downgrade(self);
        renderer.set_paint_callback(Box::new(move |ui| {
            if let Some(manager) = weak.upgrade() {
                manager.overlay_proc(ui);
            }
        }));
        let started = renderer.start_hook();
        tracing::debug!(
            started,
            library = %renderer.library_name(),
            "renderer detected, present hook start attempted"
        );
    }

    fn emit_visibility_change(&self) {
        let activated = {
            let Ok(mut st) = self.state.lock() else { return };
            if !st.overlay_state_changed {
                return;
            }
            st.overlay_state_changed = false;
            let renderer = st.renderer.clone();
            // Textures are recreated on the next paint; creating them here
            // leaves some GL contexts with blank images.
            st.achievements.destroy_textures(renderer.as_ref());
            st.show_overlay
        };
        self.callbacks
            .overlay_activated(activated, self.settings.app_id());
    }

    fn persist_settings_if_requested(&self) {
        let update = {
            let Ok(mut st) = self.state.lock() else { return };
            if !st.save_requested {
                return;
            }
            st.save_requested = false;
            st.prefs.language = VALID_LANGUAGES[st.language_index.min(VALID_LANGUAGES.len() - 1)]
                .to_string();
            if let Err(err) = st.prefs.save() {
                tracing::warn!(%err, "failed to persist overlay preferences");
            }
            SettingsUpdate {
                local_name: st.username_input.clone(),
                language: st.prefs.language.clone(),
                show_achievement_desc_on_unlock: st.prefs.show_achievement_desc_on_unlock,
                show_achievement_hidden_unearned: st.prefs.show_achievement_hidden_unearned,
            }
        };
        if !self.settings.persist(&update) {
            tracing::warn!("settings loader rejected the overlay settings update");
        }
    }

    fn refresh_presence(&self, st: &mut OverlayState) {
        let local = self.settings.local_user();
        st.i_have_lobby = self
            .presence
            .rich_presence(local, RICH_PRESENCE_CONNECT)
            .is_some_and(|c| !c.is_empty())
            || self.presence.local_lobby().is_some();

        for user in st.friends.user_ids() {
            let joinable = self
                .presence
                .rich_presence(user, RICH_PRESENCE_CONNECT)
                .is_some_and(|c| !c.is_empty())
                || (self.presence.lobby_of(user).is_some()
                    && st.friends.get(user).is_some_and(|w| w.has_lobby_invite()));
            if let Some(window) = st.friends.get_mut(user) {
                window.joinable = joinable;
            }
        }
    }

    fn tick_lazy_loads(&self, st: &mut OverlayState) {
        let renderer = st.renderer.clone();
        for (user, sizes) in st.lazy_loads.snapshot() {
            let mut succeeded = SizeSet::default();
            for size in sizes.iter() {
                if st
                    .profile_images
                    .load(user, size, self.provider.as_ref(), renderer.as_ref())
                {
                    succeeded.insert(size);
                }
            }
            if let AttemptOutcome::Exhausted = st.lazy_loads.apply_attempt(user, sizes, succeeded)
            {
                tracing::debug!(%user, "avatar load attempts exhausted, giving up");
            }
        }
    }

    fn drain_friend_actions(&self, st: &mut OverlayState, effects: &mut Vec<DrainEffect>) {
        let local = self.settings.local_user();
        let local_name = self.settings.local_name();

        while let Some(user) = st.pending_actions.pop_front() {
            let Some(window) = st.friends.get_mut(user) else {
                continue;
            };

            if window.flags.contains(WindowFlags::SEND_MESSAGE) {
                // Reject lines with nothing printable in them.
                if window.chat_input.chars().any(|c| c.is_ascii_graphic()) {
                    let text = window.chat_input.clone();
                    effects.push(DrainEffect::Chat(ChatMessage {
                        from: local,
                        to: user,
                        text: text.clone(),
                    }));
                    window.append_chat(&local_name, &text);
                }
                window.chat_input.clear();
                window.flags.clear(WindowFlags::SEND_MESSAGE);
            }

            if window.flags.contains(WindowFlags::INVITE) {
                if let Some(connect) = self
                    .presence
                    .rich_presence(local, RICH_PRESENCE_CONNECT)
                    .filter(|c| !c.is_empty())
                {
                    effects.push(DrainEffect::Invite {
                        to: user,
                        invite: GameInvite::Rich(connect),
                    });
                } else if let Some(lobby) = self.presence.local_lobby() {
                    effects.push(DrainEffect::Invite {
                        to: user,
                        invite: GameInvite::Lobby(lobby),
                    });
                }
                window.flags.clear(WindowFlags::INVITE);
            }

            if window.flags.contains(WindowFlags::JOIN) {
                // Exactly one join event: explicit lobby invite, then rich
                // invite, then the friend's connect string, then their
                // ambient lobby.
                match std::mem::take(&mut window.invite) {
                    PendingInvite::Lobby(lobby) => {
                        effects.push(DrainEffect::JoinLobby {
                            lobby,
                            friend: user,
                        });
                    }
                    PendingInvite::Rich(connect) => {
                        effects.push(DrainEffect::JoinRich {
                            friend: user,
                            connect,
                        });
                    }
                    PendingInvite::None => {
                        if let Some(connect) = self
                            .presence
                            .rich_presence(user, RICH_PRESENCE_CONNECT)
                            .filter(|c| !c.is_empty())
                        {
                            effects.push(DrainEffect::JoinRich {
                                friend: user,
                                connect,
                            });
                        } else if let Some(lobby) = self.presence.lobby_of(user) {
                            effects.push(DrainEffect::JoinLobby {
                                lobby,
                                friend: user,
                            });
                        }
                    }
                }
                window.flags.clear(WindowFlags::JOIN);
            }
        }
    }

    fn perform_effects(&self, effects: Vec<DrainEffect>) {
        for effect in effects {
            match effect {
                DrainEffect::Chat(message) => {
                    if !self.network.send_chat(&message, true) {
                        tracing::debug!(to = %message.to, "chat send rejected by transport");
                    }
                }
                DrainEffect::Invite { to, invite } => {
                    if !self.network.send_invite(to, &invite, true) {
                        tracing::debug!(%to, "invite send rejected by transport");
                    }
                }
                DrainEffect::JoinLobby { lobby, friend } => {
                    self.callbacks.lobby_join_requested(lobby, friend);
                }
                DrainEffect::JoinRich { friend, connect } => {
                    self.callbacks.rich_presence_join_requested(friend, &connect);
                }
            }
        }
    }

    // ── paint ───────────────────────────────────────────────────────────

    /// The per-frame paint pass, invoked from the render thread. Keep
    /// this short; it runs inside the host's present call.
    pub fn overlay_proc(&self, ui: &mut dyn OverlayUi) {
        if !self.ready() {
            return;
        }
        let now = Instant::now();

        if self.have_notifications.load(Ordering::Acquire) {
            let Ok(mut st) = self.state.lock() else { return };
            let Ok(mut queue) = self.notifications.lock() else {
                return;
            };
            let joins = paint::draw_notifications(&mut st, &mut queue, ui, now);
            queue.prune(now);
            self.have_notifications
                .store(!queue.is_empty(), Ordering::Release);
            drop(queue);

            for user in joins {
                if let Some(window) = st.friends.get_mut(user) {
                    window.flags.set(WindowFlags::JOIN);
                }
                st.pending_actions.push_back(user);
            }
        }

        let shown = self
            .state
            .lock()
            .map(|st| st.show_overlay)
            .unwrap_or(false);
        if shown
            && let Ok(mut st) = self.state.lock()
        {
            paint::draw_main_window(
                &mut st,
                self.settings.as_ref(),
                self.provider.as_ref(),
                ui,
            );
        }
    }
}
