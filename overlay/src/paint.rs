//! The per-frame paint pass.
//!
//! Everything here decides *what* to draw; layout is the UI toolkit's
//! problem. UI actions never call collaborators directly: they flip window
//! flags and push onto the action queue, which the next tick drains.
//! Image helpers tolerate missing data (a lazy load is requested and
//! nothing is drawn this frame) and dead textures (recreated in place).

use std::time::Instant;

use scrim_core::config::{NotificationCorner, VALID_LANGUAGES};
use scrim_core::ids::UserId;
use scrim_core::image::SizeClass;
use scrim_core::provider::ImageProvider;
use scrim_core::settings::SessionSettings;
use scrim_core::ui::{OverlayUi, WindowOptions};

use crate::achievements::load_achievement_image;
use crate::friends::{PendingInvite, WindowFlags, MAX_CHAT_LEN};
use crate::manager::OverlayState;
use crate::notifications::{
    NotificationKind, NotificationQueue, BG_COLOR, HEIGHT_FONT_FACTOR, WIDTH_FRACTION,
};
use crate::window_id::{friend_item_id, WINDOW_ID_RANGE};

// Fixed windows live above the allocated id ranges.
const MAIN_WINDOW_ID: u32 = 3 * WINDOW_ID_RANGE;
const ACHIEVEMENTS_WINDOW_ID: u32 = MAIN_WINDOW_ID + 1;
const SETTINGS_WINDOW_ID: u32 = MAIN_WINDOW_ID + 2;
const URL_WINDOW_ID: u32 = MAIN_WINDOW_ID + 3;
const WARNING_WINDOW_ID: u32 = MAIN_WINDOW_ID + 4;
const FRIEND_LIST_ID: u32 = MAIN_WINDOW_ID + 5;

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const GREEN: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

/// Scale factor applied to achievement icons in the browser window.
const ACHIEVEMENT_ICON_SCALE: f32 = 0.4;

// ─────────────────────────────────────────────────────────────────────────────
// Notifications
// ─────────────────────────────────────────────────────────────────────────────

/// Draw every live notification. Returns the friends whose invite "Join"
/// was clicked this frame; the caller flags them and queues the action.
pub(crate) fn draw_notifications(
    st: &mut OverlayState,
    queue: &mut NotificationQueue,
    ui: &mut dyn OverlayUi,
    now: Instant,
) -> Vec<UserId> {
    let (display_w, display_h) = ui.display_size();
    let width = display_w * WIDTH_FRACTION;
    let height = HEIGHT_FONT_FACTOR * ui.font_size();
    let corner = st.prefs.notification_corner;
    let insets = (st.prefs.h_inset as f32, st.prefs.v_inset as f32);
    let icon = height * 0.4;

    let mut joins = Vec::new();
    let renderer = st.renderer.clone();

    for (index, notif) in queue.iter_mut().enumerate() {
        let alpha = notif.alpha(now);
        let text_alpha = (alpha * 2.0).min(1.0);
        let message = notif.message.clone();
        let (x, y) = notification_pos(corner, index, width, height, display_w, display_h, insets);

        ui.set_next_window_pos(x, y);
        ui.set_next_window_size(width, height);
        ui.set_next_window_bg([BG_COLOR[0], BG_COLOR[1], BG_COLOR[2], alpha]);
        if ui.begin_window(
            &notif.id.to_string(),
            notif.id,
            None,
            WindowOptions::notification(),
        ) {
            match notif.kind {
                NotificationKind::Achievement => {
                    if let Some(name) = notif.achievement.clone()
                        && let Some(ach) = st.achievements.get_mut(&name)
                    {
                        ach.image.create_texture(renderer.as_ref());
                        if let Some(texture) = ach.image.texture_id() {
                            ui.image(texture, icon, icon, text_alpha);
                            ui.same_line();
                        }
                    }
                    ui.text_wrapped_colored([1.0, 1.0, 1.0, text_alpha], &message);
                }
                NotificationKind::Invite => {
                    ui.text_wrapped_colored([1.0, 1.0, 1.0, text_alpha], &message);
                    if ui.button("Join", notif.id) {
                        if let Some(friend) = notif.friend {
                            joins.push(friend);
                        }
                        notif.expire();
                    }
                }
                NotificationKind::Message => {
                    if let Some(friend) = notif.friend {
                        draw_avatar(st, ui, friend, SizeClass::Small, icon, text_alpha);
                        ui.same_line();
                    }
                    ui.text_wrapped_colored([1.0, 1.0, 1.0, text_alpha], &message);
                }
            }
        }
        ui.end_window();
    }

    joins
}

fn notification_pos(
    corner: NotificationCorner,
    index: usize,
    width: f32,
    height: f32,
    display_w: f32,
    display_h: f32,
    (h_inset, v_inset): (f32, f32),
) -> (f32, f32) {
    let stack = index as f32 * height;
    match corner {
        NotificationCorner::TopLeft => (h_inset, v_inset + stack),
        NotificationCorner::TopRight => (display_w - width - h_inset, v_inset + stack),
        NotificationCorner::BottomLeft => (h_inset, display_h - v_inset - height - stack),
        NotificationCorner::BottomRight => (
            display_w - width - h_inset,
            display_h - v_inset - height - stack,
        ),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Main window
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) fn draw_main_window(
    st: &mut OverlayState,
    settings: &dyn SessionSettings,
    provider: &dyn ImageProvider,
    ui: &mut dyn OverlayUi,
) {
    let (display_w, display_h) = ui.display_size();
    ui.set_next_window_pos(0.0, 0.0);
    ui.set_next_window_size(display_w, display_h);
    ui.set_next_window_bg([0.0, 0.0, 0.0, 0.5]);

    let mut open = true;
    if ui.begin_window("Overlay", MAIN_WINDOW_ID, Some(&mut open), WindowOptions::main()) {
        draw_avatar(st, ui, settings.local_user(), SizeClass::Small, 32.0, 1.0);
        ui.same_line();
        ui.text(&format!(
            "Username: {}({}) playing {}",
            settings.local_name(),
            settings.local_user(),
            settings.app_id()
        ));
        ui.same_line();
        let library = st
            .renderer
            .as_ref()
            .map(|r| r.library_name())
            .unwrap_or_else(|| "Unknown".to_string());
        ui.text(&format!("Renderer: {library}"));

        let (earned, total) = (st.achievements.earned(), st.achievements.total());
        ui.text(&format!("Achievements earned: {earned} / {total}"));
        ui.same_line();
        let fraction = if total > 0 {
            earned as f32 / total as f32
        } else {
            0.0
        };
        ui.progress_bar(fraction, display_w * 0.20);

        ui.spacing();
        if ui.button("Show Achievements", 1) {
            st.show_achievements = true;
        }
        ui.same_line();
        if ui.button("Settings", 2) {
            st.show_settings = true;
        }

        ui.spacing();
        ui.spacing();
        ui.text("Friends");
        draw_friend_list(st, settings, ui);
        draw_friend_windows(st, ui);

        if st.show_achievements {
            draw_achievements_window(st, provider, ui);
        }
        if st.show_settings {
            draw_settings_window(st, ui);
        }
        if !st.show_url.is_empty() {
            draw_url_window(st, ui);
        }
        draw_warning_window(st, settings, ui);
    }
    ui.end_window();

    // The user closed the overlay itself.
    if !open {
        st.show_overlay = false;
        st.overlay_state_changed = true;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Friends
// ─────────────────────────────────────────────────────────────────────────────

fn draw_friend_list(st: &mut OverlayState, settings: &dyn SessionSettings, ui: &mut dyn OverlayUi) {
    if st.friends.is_empty() {
        return;
    }
    let local_app = settings.app_id();
    let i_have_lobby = st.i_have_lobby;

    let mut show: Vec<UserId> = Vec::new();
    let mut actions: Vec<(UserId, WindowFlags)> = Vec::new();

    if ui.begin_list(FRIEND_LIST_ID, st.friends.len()) {
        for (user, window) in st.friends.iter() {
            let item_id = friend_item_id(window.window_id);
            let response = ui.list_item(&window.title, item_id);
            if response.double_clicked {
                show.push(*user);
            }

            // Right click on a friend.
            if ui.begin_context_menu(item_id) {
                let mut close = false;
                if ui.button("Chat", 1) {
                    show.push(*user);
                    close = true;
                }
                // Invite/join only make sense within the same game.
                if local_app == window.info.app_id {
                    if i_have_lobby && ui.button("Invite", 2) {
                        actions.push((*user, WindowFlags::INVITE));
                        close = true;
                    }
                    if window.joinable && ui.button("Join", 3) {
                        actions.push((*user, WindowFlags::JOIN));
                        close = true;
                    }
                }
                if close {
                    ui.close_context_menu();
                }
                ui.end_context_menu();
            }
        }
        ui.end_list();
    }

    for user in show {
        if let Some(window) = st.friends.get_mut(user) {
            window.flags.set(WindowFlags::SHOW);
        }
    }
    for (user, flag) in actions {
        if let Some(window) = st.friends.get_mut(user) {
            window.flags.set(flag);
            st.pending_actions.push_back(user);
        }
    }
}

fn draw_friend_windows(st: &mut OverlayState, ui: &mut dyn OverlayUi) {
    for user in st.friends.user_ids() {
        draw_friend_window(st, user, ui);
    }
}

fn draw_friend_window(st: &mut OverlayState, user: UserId, ui: &mut dyn OverlayUi) {
    let Some(window) = st.friends.get(user) else {
        return;
    };
    if !window.flags.contains(WindowFlags::SHOW) {
        return;
    }
    let title = window.title.clone();
    let window_id = window.window_id;
    let friend_name = window.info.name.clone();
    let has_invite = window.has_any_invite();

    let mut open = true;
    let mut accept = false;
    let mut refuse = false;
    let mut submitted = false;

    if ui.begin_window(&title, window_id, Some(&mut open), WindowOptions::floating()) {
        if ui.window_focused()
            && let Some(window) = st.friends.get_mut(user)
        {
            window.flags.clear(WindowFlags::NEED_ATTENTION);
        }

        draw_avatar(st, ui, user, SizeClass::Small, 32.0, 1.0);
        ui.same_line();

        if has_invite {
            ui.text(&format!("{friend_name} invited you to join the game."));
            ui.same_line();
            accept = ui.button("Accept", 1);
            ui.same_line();
            refuse = ui.button("Refuse", 2);
        } else {
            ui.text(&friend_name);
        }

        if let Some(window) = st.friends.get_mut(user) {
            ui.text_box(3, &window.chat_history);
            submitted = ui.input_text(4, &mut window.chat_input, MAX_CHAT_LEN, false);
            ui.same_line();
            if ui.button("Send", 5) {
                submitted = true;
            }
        }
    }
    ui.end_window();

    let mut queue_action = false;
    if let Some(window) = st.friends.get_mut(user) {
        if accept {
            window.flags.set(WindowFlags::JOIN);
            queue_action = true;
        }
        if refuse {
            window.invite = PendingInvite::None;
        }
        if submitted && !window.flags.contains(WindowFlags::SEND_MESSAGE) {
            window.flags.set(WindowFlags::SEND_MESSAGE);
            queue_action = true;
        }
        if !open {
            window.flags.clear(WindowFlags::SHOW);
        }
    }
    if queue_action {
        st.pending_actions.push_back(user);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Achievements window
// ─────────────────────────────────────────────────────────────────────────────

fn draw_achievements_window(
    st: &mut OverlayState,
    provider: &dyn ImageProvider,
    ui: &mut dyn OverlayUi,
) {
    let renderer = st.renderer.clone();
    let show_hidden = st.prefs.show_achievement_hidden_unearned;

    let mut open = true;
    if ui.begin_window(
        "Achievements",
        ACHIEVEMENTS_WINDOW_ID,
        Some(&mut open),
        WindowOptions::floating(),
    ) {
        ui.text("List of achievements");
        for ach in st.achievements.iter_mut() {
            let hidden = ach.hidden && !ach.achieved;
            if hidden && !show_hidden {
                continue;
            }

            if ach.image.data().is_none() {
                load_achievement_image(ach, provider, renderer.as_ref());
            }
            ach.image.create_texture(renderer.as_ref());

            ui.separator();
            ui.text_colored(WHITE, &ach.title);
            if hidden {
                ui.text("Hidden Achievement");
            } else {
                ui.text_wrapped(&ach.description);
            }
            if ach.achieved {
                ui.text_colored(
                    GREEN,
                    &format!("achieved on {}", format_unlock_time(ach.unlock_time)),
                );
            } else {
                ui.text_colored(RED, "not achieved");
            }
            if let (Some(texture), Some(data)) = (ach.image.texture_id(), ach.image.data()) {
                ui.image(
                    texture,
                    data.width() as f32 * ACHIEVEMENT_ICON_SCALE,
                    data.height() as f32 * ACHIEVEMENT_ICON_SCALE,
                    1.0,
                );
            }
            ui.separator();
        }
    }
    ui.end_window();
    st.show_achievements = open;
}

fn format_unlock_time(unlock_time: u32) -> String {
    match chrono::DateTime::from_timestamp(i64::from(unlock_time), 0) {
        Some(when) => when.format("%Y-%m-%d at %H:%M:%S").to_string(),
        None => unlock_time.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings, URL and warning windows
// ─────────────────────────────────────────────────────────────────────────────

fn draw_settings_window(st: &mut OverlayState, ui: &mut dyn OverlayUi) {
    let mut open = true;
    if ui.begin_window(
        "Settings",
        SETTINGS_WINDOW_ID,
        Some(&mut open),
        WindowOptions::floating(),
    ) {
        ui.text("These are global settings and apply to every game.");
        ui.separator();

        ui.text("Username:");
        ui.same_line();
        ui.input_text(1, &mut st.username_input, 256, st.forced_settings);
        ui.separator();

        ui.text("Language:");
        ui.list_picker(2, VALID_LANGUAGES, &mut st.language_index);
        let language = VALID_LANGUAGES
            .get(st.language_index)
            .copied()
            .unwrap_or("english");
        ui.text(&format!("Selected Language: {language}"));
        ui.separator();

        ui.checkbox(
            "Show achievement descriptions on unlock",
            &mut st.prefs.show_achievement_desc_on_unlock,
        );
        ui.checkbox(
            "Show unearned hidden achievements",
            &mut st.prefs.show_achievement_hidden_unearned,
        );
        ui.separator();

        if !st.forced_settings {
            ui.text("You may have to restart the game for these to apply.");
            if ui.button("Save", 3) {
                st.save_requested = true;
                open = false;
            }
        } else {
            ui.text_colored(RED, "WARNING WARNING WARNING");
            ui.text_wrapped("Forced settings files were detected. Delete them if you want this menu to work.");
            ui.text_colored(RED, "WARNING WARNING WARNING");
        }
    }
    ui.end_window();
    st.show_settings = open;
}

fn draw_url_window(st: &mut OverlayState, ui: &mut dyn OverlayUi) {
    let url = st.show_url.clone();
    let mut open = true;
    if ui.begin_window(
        "URL Window",
        URL_WINDOW_ID,
        Some(&mut open),
        WindowOptions::floating(),
    ) {
        ui.text("The game tried to get the overlay to open this url:");
        ui.spacing();
        ui.text_box(1, &url);
        ui.spacing();
        if ui.button("Close", 2) {
            open = false;
        }
    }
    ui.end_window();
    if !open {
        st.show_url.clear();
    }
}

fn draw_warning_window(st: &mut OverlayState, settings: &dyn SessionSettings, ui: &mut dyn OverlayUi) {
    let app_id = settings.app_id();
    if !(st.warn_local_save || st.warn_forced || app_id == 0) {
        return;
    }

    ui.set_next_window_focus();
    let mut open = true;
    if ui.begin_window(
        "WARNING",
        WARNING_WINDOW_ID,
        Some(&mut open),
        WindowOptions::floating(),
    ) {
        if app_id == 0 {
            ui.text_colored(RED, "WARNING WARNING WARNING");
            ui.text_wrapped("App id is 0, fix the host configuration and restart the game.");
            ui.text_colored(RED, "WARNING WARNING WARNING");
        }
        if st.warn_local_save {
            ui.text_colored(RED, "WARNING WARNING WARNING");
            ui.text_wrapped("Saves are being written to the game folder. Disable local saving if you don't want this.");
            ui.text_colored(RED, "WARNING WARNING WARNING");
        }
        if st.warn_forced {
            ui.text_colored(RED, "WARNING WARNING WARNING");
            ui.text_wrapped("Forced settings files were detected. Some settings cannot be saved.");
            ui.text_colored(RED, "WARNING WARNING WARNING");
        }
    }
    ui.end_window();
    if !open {
        st.warn_local_save = false;
        st.warn_forced = false;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Image helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Draw a user's avatar at `px` square. When the pixel data is missing a
/// lazy load is requested and nothing is drawn this frame; a dead texture
/// is recreated in place.
pub(crate) fn draw_avatar(
    st: &mut OverlayState,
    ui: &mut dyn OverlayUi,
    user: UserId,
    size: SizeClass,
    px: f32,
    alpha: f32,
) {
    let renderer = st.renderer.clone();
    let missing = st
        .profile_images
        .resource(user, size)
        .is_none_or(|r| r.data().is_none());
    if missing {
        st.lazy_loads.request(user, size);
        return;
    }
    if let Some(resource) = st.profile_images.resource_mut(user, size) {
        resource.create_texture(renderer.as_ref());
        if let Some(texture) = resource.texture_id() {
            ui.image(texture, px, px, alpha);
        }
    }
}
