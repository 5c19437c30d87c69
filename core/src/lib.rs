//! Scrim Core Library
//!
//! Domain types and collaborator interfaces for the scrim overlay runtime.
//!
//! The overlay runtime itself lives in `scrim-overlay`; this crate defines
//! everything it talks to: the image/avatar provider, the detected renderer,
//! the network transport, session settings, presence data, the host callback
//! sink and the immediate-mode UI toolkit. All of these are consumed through
//! narrow trait boundaries so the runtime can be driven by real platform
//! integrations or by in-memory fakes in tests.

pub mod callbacks;
pub mod config;
pub mod error;
pub mod ids;
pub mod image;
pub mod network;
pub mod presence;
pub mod provider;
pub mod renderer;
pub mod settings;
pub mod ui;

// Re-exports for convenience
pub use callbacks::CallbackSink;
pub use config::{language_index, NotificationCorner, OverlayPrefs, OverlayPrefsExt, VALID_LANGUAGES};
pub use error::ConfigError;
pub use ids::{FriendInfo, LobbyId, UserId};
pub use image::{ImageData, SizeClass};
pub use network::{Channel, ChatMessage, GameInvite, MessageHandler, Network};
pub use presence::{Presence, RICH_PRESENCE_CONNECT};
pub use provider::{AchievementInfo, ImageHandle, ImageProvider};
pub use renderer::{HookReadyCallback, PaintCallback, Renderer, RendererCandidate, Texture, TextureRef};
pub use settings::{SessionSettings, SettingsUpdate};
pub use ui::{ListItemResponse, OverlayUi, WindowOptions};
