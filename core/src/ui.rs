//! Immediate-mode UI toolkit boundary.
//!
//! The overlay decides *what* to draw each frame; the toolkit owns layout,
//! styling and input routing. The trait is deliberately small: windows,
//! text, buttons, list items, text inputs, images and a progress bar —
//! everything the overlay's windows are built from. Widget ids keep
//! same-labelled widgets distinct across windows, exactly like the id
//! ranges used for window slots.

/// Behavior flags for the next window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowOptions {
    pub movable: bool,
    pub resizable: bool,
    pub collapsible: bool,
    pub focus_on_appearing: bool,
    pub bring_to_front_on_focus: bool,
    pub decorations: bool,
}

impl WindowOptions {
    /// The full-screen main overlay window.
    pub fn main() -> Self {
        Self {
            movable: false,
            resizable: false,
            collapsible: false,
            focus_on_appearing: true,
            bring_to_front_on_focus: false,
            decorations: true,
        }
    }

    /// A fixed, undecorated notification popup.
    pub fn notification() -> Self {
        Self {
            movable: false,
            resizable: false,
            collapsible: false,
            focus_on_appearing: false,
            bring_to_front_on_focus: false,
            decorations: false,
        }
    }

    /// A regular floating window (friend chat, achievements, settings).
    pub fn floating() -> Self {
        Self {
            movable: true,
            resizable: true,
            collapsible: true,
            focus_on_appearing: true,
            bring_to_front_on_focus: true,
            decorations: true,
        }
    }
}

/// What happened to a list item this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListItemResponse {
    pub clicked: bool,
    pub double_clicked: bool,
}

pub trait OverlayUi {
    /// Size of the host's swap chain in pixels.
    fn display_size(&self) -> (f32, f32);

    /// Current font height in pixels, for notification sizing.
    fn font_size(&self) -> f32;

    // ── next-window placement ───────────────────────────────────────────

    fn set_next_window_pos(&mut self, x: f32, y: f32);
    fn set_next_window_size(&mut self, w: f32, h: f32);
    /// Background color (RGB) and alpha for the next window.
    fn set_next_window_bg(&mut self, rgba: [f32; 4]);
    fn set_next_window_focus(&mut self);

    // ── windows ─────────────────────────────────────────────────────────

    /// Begin a window. `open`, when given, renders a close box and is
    /// cleared when the user closes the window. Returns whether the window
    /// body should be drawn; `end_window` must be called either way.
    fn begin_window(
        &mut self,
        title: &str,
        id: u32,
        open: Option<&mut bool>,
        options: WindowOptions,
    ) -> bool;

    fn end_window(&mut self);

    /// Whether the current window has keyboard focus.
    fn window_focused(&self) -> bool;

    // ── widgets ─────────────────────────────────────────────────────────

    fn text(&mut self, text: &str);
    fn text_wrapped(&mut self, text: &str);
    fn text_colored(&mut self, rgba: [f32; 4], text: &str);
    fn text_wrapped_colored(&mut self, rgba: [f32; 4], text: &str);
    fn separator(&mut self);
    fn spacing(&mut self);
    fn same_line(&mut self);

    fn button(&mut self, label: &str, id: u32) -> bool;
    fn checkbox(&mut self, label: &str, value: &mut bool) -> bool;
    fn progress_bar(&mut self, fraction: f32, width: f32);

    /// Draw a renderer texture at the given size with an alpha multiplier.
    fn image(&mut self, texture: u64, width: f32, height: f32, alpha: f32);

    /// Single-line text input. Returns true when the user submits the
    /// line (presses Enter).
    fn input_text(&mut self, id: u32, buf: &mut String, max_len: usize, readonly: bool) -> bool;

    /// Read-only multi-line text region (chat history, URL display).
    fn text_box(&mut self, id: u32, text: &str);

    /// Exclusive-choice list. Returns true when `selected` changed.
    fn list_picker(&mut self, id: u32, items: &[&str], selected: &mut usize) -> bool;

    // ── lists and context menus ─────────────────────────────────────────

    /// Begin a scrolling list region. Returns whether items should be
    /// drawn; `end_list` must be called when it returns true.
    fn begin_list(&mut self, id: u32, items: usize) -> bool;
    fn end_list(&mut self);

    fn list_item(&mut self, label: &str, id: u32) -> ListItemResponse;

    /// Begin a context menu attached to the previous list item. Returns
    /// whether the menu is open; `end_context_menu` must be called when it
    /// returns true.
    fn begin_context_menu(&mut self, id: u32) -> bool;
    fn end_context_menu(&mut self);
    /// Close the open context menu after an action was taken.
    fn close_context_menu(&mut self);
}
