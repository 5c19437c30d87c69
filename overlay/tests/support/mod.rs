//! In-memory collaborators for driving the overlay runtime end to end.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use scrim_core::callbacks::CallbackSink;
use scrim_core::ids::{LobbyId, UserId};
use scrim_core::image::{ImageData, SizeClass, BYTES_PER_PIXEL};
use scrim_core::network::{Channel, ChatMessage, GameInvite, MessageHandler, Network};
use scrim_core::presence::Presence;
use scrim_core::provider::{AchievementInfo, ImageHandle, ImageProvider};
use scrim_core::renderer::{
    HookReadyCallback, PaintCallback, Renderer, RendererCandidate, Texture, TextureRef,
};
use scrim_core::settings::{SessionSettings, SettingsUpdate};
use scrim_core::ui::{ListItemResponse, OverlayUi, WindowOptions};

pub const LOCAL_USER: UserId = UserId(1);
pub const APP_ID: u32 = 480;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

// ─────────────────────────────────────────────────────────────────────────────
// Renderer + candidate
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockRenderer {
    textures: Mutex<Vec<Arc<Texture>>>,
    next_id: AtomicU64,
    paint: Mutex<Option<PaintCallback>>,
    ready: Mutex<Option<HookReadyCallback>>,
}

impl Renderer for MockRenderer {
    fn library_name(&self) -> String {
        "MockGL".to_string()
    }

    fn create_image_resource(&self, _rgba: &[u8], _w: u32, _h: u32) -> TextureRef {
        let texture = Arc::new(Texture(self.next_id.fetch_add(1, Ordering::SeqCst) + 1));
        let weak = Arc::downgrade(&texture);
        self.textures.lock().unwrap().push(texture);
        weak
    }

    fn release_image_resource(&self, texture: TextureRef) {
        if let Some(strong) = texture.upgrade() {
            self.textures
                .lock()
                .unwrap()
                .retain(|t| !Arc::ptr_eq(t, &strong));
        }
    }

    fn set_paint_callback(&self, callback: PaintCallback) {
        *self.paint.lock().unwrap() = Some(callback);
    }

    fn set_hook_ready_callback(&self, callback: HookReadyCallback) {
        *self.ready.lock().unwrap() = Some(callback);
    }

    fn start_hook(&self) -> bool {
        if let Some(callback) = self.ready.lock().unwrap().as_mut() {
            callback(true);
        }
        true
    }
}

/// A candidate whose API is "loaded" and presenting from the start.
pub struct MockCandidate {
    presents: Arc<AtomicU64>,
}

impl MockCandidate {
    pub fn presenting() -> Self {
        Self {
            presents: Arc::new(AtomicU64::new(60)),
        }
    }
}

impl RendererCandidate for MockCandidate {
    fn name(&self) -> &str {
        "mockgl"
    }

    fn install_probe(&self) -> bool {
        true
    }

    fn present_count(&self) -> u64 {
        // Keeps climbing, as a real present hook would observe.
        self.presents.fetch_add(1, Ordering::SeqCst)
    }

    fn uninstall_probe(&self) {}

    fn into_renderer(self: Box<Self>) -> Arc<dyn Renderer> {
        Arc::new(MockRenderer::default())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Network
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNetwork {
    handlers: Mutex<HashMap<(Channel, UserId), Arc<dyn MessageHandler>>>,
    pub sent_chats: Mutex<Vec<ChatMessage>>,
    pub sent_invites: Mutex<Vec<(UserId, GameInvite)>>,
}

impl MockNetwork {
    /// Deliver an inbound chat to whoever registered for it.
    pub fn deliver_chat(&self, message: &ChatMessage) {
        let handler = self
            .handlers
            .lock()
            .unwrap()
            .get(&(Channel::CHAT, message.to))
            .cloned();
        if let Some(handler) = handler {
            handler.on_chat_message(message);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.lock().unwrap().len()
    }
}

impl Network for MockNetwork {
    fn send_chat(&self, message: &ChatMessage, _reliable: bool) -> bool {
        self.sent_chats.lock().unwrap().push(message.clone());
        true
    }

    fn send_invite(&self, to: UserId, invite: &GameInvite, _reliable: bool) -> bool {
        self.sent_invites.lock().unwrap().push((to, invite.clone()));
        true
    }

    fn register_handler(
        &self,
        channel: Channel,
        recipient: UserId,
        handler: Arc<dyn MessageHandler>,
    ) {
        self.handlers
            .lock()
            .unwrap()
            .insert((channel, recipient), handler);
    }

    fn unregister_handler(&self, channel: Channel, recipient: UserId) {
        self.handlers.lock().unwrap().remove(&(channel, recipient));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Presence
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockPresence {
    pub rich: Mutex<HashMap<(UserId, String), String>>,
    pub lobbies: Mutex<HashMap<UserId, LobbyId>>,
    pub local_lobby: Mutex<Option<LobbyId>>,
}

impl Presence for MockPresence {
    fn rich_presence(&self, user: UserId, key: &str) -> Option<String> {
        self.rich
            .lock()
            .unwrap()
            .get(&(user, key.to_string()))
            .cloned()
    }

    fn lobby_of(&self, user: UserId) -> Option<LobbyId> {
        self.lobbies.lock().unwrap().get(&user).copied()
    }

    fn local_lobby(&self) -> Option<LobbyId> {
        *self.local_lobby.lock().unwrap()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockSettings {
    pub persisted: Mutex<Vec<SettingsUpdate>>,
    pub profile_images: Mutex<Vec<(SizeClass, u32, u32)>>,
}

impl SessionSettings for MockSettings {
    fn local_user(&self) -> UserId {
        LOCAL_USER
    }

    fn local_name(&self) -> String {
        "Local".to_string()
    }

    fn app_id(&self) -> u32 {
        APP_ID
    }

    fn language(&self) -> String {
        "english".to_string()
    }

    fn forced_settings(&self) -> bool {
        false
    }

    fn warn_local_save(&self) -> bool {
        false
    }

    fn show_achievement_desc_on_unlock(&self) -> bool {
        true
    }

    fn show_achievement_hidden_unearned(&self) -> bool {
        false
    }

    fn set_profile_image(&self, size: SizeClass, image: &ImageData) -> bool {
        self.profile_images
            .lock()
            .unwrap()
            .push((size, image.width(), image.height()));
        true
    }

    fn persist(&self, update: &SettingsUpdate) -> bool {
        self.persisted.lock().unwrap().push(update.clone());
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockProvider {
    pub avatars: Mutex<HashMap<(UserId, SizeClass), (u32, u32)>>,
    pub achievements: Mutex<Vec<AchievementInfo>>,
}

impl MockProvider {
    pub fn set_avatar(&self, user: UserId, size: SizeClass, w: u32, h: u32) {
        self.avatars.lock().unwrap().insert((user, size), (w, h));
    }

    fn handle_for(user: UserId, size: SizeClass) -> ImageHandle {
        ImageHandle(user.0 << 2 | size as u64)
    }
}

impl ImageProvider for MockProvider {
    fn avatar_handle(&self, user: UserId, size: SizeClass) -> Option<ImageHandle> {
        self.avatars
            .lock()
            .unwrap()
            .contains_key(&(user, size))
            .then(|| Self::handle_for(user, size))
    }

    fn achievement_handle(&self, _name: &str) -> Option<ImageHandle> {
        None
    }

    fn image_size(&self, handle: ImageHandle) -> Option<(u32, u32)> {
        let avatars = self.avatars.lock().unwrap();
        avatars
            .iter()
            .find(|(k, _)| Self::handle_for(k.0, k.1) == handle)
            .map(|(_, dims)| *dims)
    }

    fn image_rgba(&self, handle: ImageHandle, buf: &mut [u8]) -> bool {
        match self.image_size(handle) {
            Some((w, h)) if buf.len() == (w * h) as usize * BYTES_PER_PIXEL => {
                buf.fill(0x55);
                true
            }
            _ => false,
        }
    }

    fn achievements(&self) -> Vec<AchievementInfo> {
        self.achievements.lock().unwrap().clone()
    }

    fn achievement_status(&self, name: &str) -> Option<(bool, u32)> {
        self.achievements
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.name == name)
            .map(|a| (a.achieved, a.unlock_time))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Callback sink
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockSink {
    pub activated: Mutex<Vec<bool>>,
    pub lobby_joins: Mutex<Vec<(LobbyId, UserId)>>,
    pub rich_joins: Mutex<Vec<(UserId, String)>>,
}

impl CallbackSink for MockSink {
    fn overlay_activated(&self, active: bool, _app_id: u32) {
        self.activated.lock().unwrap().push(active);
    }

    fn lobby_join_requested(&self, lobby: LobbyId, friend: UserId) {
        self.lobby_joins.lock().unwrap().push((lobby, friend));
    }

    fn rich_presence_join_requested(&self, friend: UserId, connect: &str) {
        self.rich_joins
            .lock()
            .unwrap()
            .push((friend, connect.to_string()));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scriptable immediate-mode UI
// ─────────────────────────────────────────────────────────────────────────────

/// UI double: windows always draw, buttons and list items fire when their
/// label was scripted, the next editable text input consumes
/// `pending_input`.
#[derive(Default)]
pub struct MockUi {
    pub click_labels: HashSet<String>,
    pub double_click_labels: HashSet<String>,
    pub pending_input: Option<String>,
    pub focused: bool,
    pub open_context_menus: bool,
    pub texts: Vec<String>,
    pub images: Vec<u64>,
    pub windows: Vec<String>,
}

impl MockUi {
    pub fn click(&mut self, label: &str) {
        self.click_labels.insert(label.to_string());
    }

    pub fn double_click(&mut self, label: &str) {
        self.double_click_labels.insert(label.to_string());
    }

    pub fn saw_text_containing(&self, needle: &str) -> bool {
        self.texts.iter().any(|t| t.contains(needle))
    }
}

impl OverlayUi for MockUi {
    fn display_size(&self) -> (f32, f32) {
        (1920.0, 1080.0)
    }

    fn font_size(&self) -> f32 {
        16.0
    }

    fn set_next_window_pos(&mut self, _x: f32, _y: f32) {}
    fn set_next_window_size(&mut self, _w: f32, _h: f32) {}
    fn set_next_window_bg(&mut self, _rgba: [f32; 4]) {}
    fn set_next_window_focus(&mut self) {}

    fn begin_window(
        &mut self,
        title: &str,
        _id: u32,
        _open: Option<&mut bool>,
        _options: WindowOptions,
    ) -> bool {
        self.windows.push(title.to_string());
        true
    }

    fn end_window(&mut self) {}

    fn window_focused(&self) -> bool {
        self.focused
    }

    fn text(&mut self, text: &str) {
        self.texts.push(text.to_string());
    }

    fn text_wrapped(&mut self, text: &str) {
        self.texts.push(text.to_string());
    }

    fn text_colored(&mut self, _rgba: [f32; 4], text: &str) {
        self.texts.push(text.to_string());
    }

    fn text_wrapped_colored(&mut self, _rgba: [f32; 4], text: &str) {
        self.texts.push(text.to_string());
    }

    fn separator(&mut self) {}
    fn spacing(&mut self) {}
    fn same_line(&mut self) {}

    fn button(&mut self, label: &str, _id: u32) -> bool {
        self.click_labels.remove(label)
    }

    fn checkbox(&mut self, _label: &str, _value: &mut bool) -> bool {
        false
    }

    fn progress_bar(&mut self, _fraction: f32, _width: f32) {}

    fn image(&mut self, texture: u64, _width: f32, _height: f32, _alpha: f32) {
        self.images.push(texture);
    }

    fn input_text(&mut self, _id: u32, buf: &mut String, _max_len: usize, readonly: bool) -> bool {
        if readonly {
            return false;
        }
        match self.pending_input.take() {
            Some(text) => {
                *buf = text;
                true
            }
            None => false,
        }
    }

    fn text_box(&mut self, _id: u32, text: &str) {
        self.texts.push(text.to_string());
    }

    fn list_picker(&mut self, _id: u32, _items: &[&str], _selected: &mut usize) -> bool {
        false
    }

    fn begin_list(&mut self, _id: u32, _items: usize) -> bool {
        true
    }

    fn end_list(&mut self) {}

    fn list_item(&mut self, label: &str, _id: u32) -> ListItemResponse {
        ListItemResponse {
            clicked: false,
            double_clicked: self.double_click_labels.remove(label),
        }
    }

    fn begin_context_menu(&mut self, _id: u32) -> bool {
        self.open_context_menus
    }

    fn end_context_menu(&mut self) {}
    fn close_context_menu(&mut self) {}
}
