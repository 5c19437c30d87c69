//! Time-windowed, auto-expiring notification popups.
//!
//! Each notification lives for a fixed window: fade in, hold, fade out.
//! Alpha is a pure function of elapsed time so the paint pass never
//! mutates an entry just to draw it; expired entries are removed as a
//! batch after the paint pass.

use std::time::{Duration, Instant};

use scrim_core::ids::UserId;

use crate::window_id::{find_free_id, NOTIFICATION_ID_BASE};

pub const FADE_IN: Duration = Duration::from_millis(2000);
pub const FADE_OUT: Duration = Duration::from_millis(2000);
/// Total on-screen time: fade-in + hold + fade-out.
pub const SHOW_TIME: Duration = Duration::from_millis(10_000);

/// Peak window alpha.
pub const MAX_ALPHA: f32 = 0.5;
/// Notification window background (RGB).
pub const BG_COLOR: [f32; 3] = [0.16, 0.29, 0.48];
/// Fraction of the display width a notification occupies.
pub const WIDTH_FRACTION: f32 = 0.25;
/// Notification height in font-size units.
pub const HEIGHT_FONT_FACTOR: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Message,
    Invite,
    Achievement,
}

pub struct Notification {
    pub id: u32,
    pub kind: NotificationKind,
    pub message: String,
    /// Backing friend, for invite Join actions and message avatars.
    pub friend: Option<UserId>,
    /// Backing achievement, for icon display.
    pub achievement: Option<String>,
    started: Instant,
    expired: bool,
}

impl Notification {
    /// Window alpha at `now`: 0 at the start, [`MAX_ALPHA`] through the
    /// hold interval, 0 again once [`SHOW_TIME`] has elapsed.
    pub fn alpha(&self, now: Instant) -> f32 {
        if self.expired {
            return 0.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= SHOW_TIME {
            0.0
        } else if elapsed < FADE_IN {
            MAX_ALPHA * elapsed.as_secs_f32() / FADE_IN.as_secs_f32()
        } else if elapsed > SHOW_TIME - FADE_OUT {
            MAX_ALPHA * (SHOW_TIME - elapsed).as_secs_f32() / FADE_OUT.as_secs_f32()
        } else {
            MAX_ALPHA
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expired || now.saturating_duration_since(self.started) > SHOW_TIME
    }

    /// Force immediate expiry (the invite Join action).
    pub fn expire(&mut self) {
        self.expired = true;
    }
}

/// The live notification set, guarded by its own mutex in the manager so
/// notification timing is never stalled by friend-state work.
#[derive(Default)]
pub struct NotificationQueue {
    items: Vec<Notification>,
}

impl NotificationQueue {
    /// Post a notification. Best-effort: returns `None` and drops the
    /// event when the id range is exhausted.
    pub fn post(
        &mut self,
        kind: NotificationKind,
        message: String,
        friend: Option<UserId>,
        achievement: Option<String>,
        now: Instant,
    ) -> Option<u32> {
        let mut ids: Vec<u32> = self.items.iter().map(|n| n.id).collect();
        let Some(id) = find_free_id(&mut ids, NOTIFICATION_ID_BASE) else {
            tracing::warn!(?kind, "no free id for a notification, dropping it");
            return None;
        };
        self.items.push(Notification {
            id,
            kind,
            message,
            friend,
            achievement,
            started: now,
            expired: false,
        });
        Some(id)
    }

    /// Batch-remove entries whose window has elapsed. Returns how many
    /// were removed.
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.items.len();
        self.items.retain(|n| !n.is_expired(now));
        before - self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Notification> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_one(queue: &mut NotificationQueue, now: Instant) -> u32 {
        queue
            .post(NotificationKind::Message, "hi".into(), None, None, now)
            .unwrap()
    }

    #[test]
    fn alpha_follows_the_fade_curve() {
        let mut queue = NotificationQueue::default();
        let start = Instant::now();
        post_one(&mut queue, start);
        let notif = queue.iter().next().unwrap();

        assert_eq!(notif.alpha(start), 0.0);

        // Monotone rise through fade-in.
        let mut prev = 0.0;
        for ms in [1, 500, 1000, 1500, 1999] {
            let a = notif.alpha(start + Duration::from_millis(ms));
            assert!(a >= prev, "alpha must not fall during fade-in");
            prev = a;
        }

        // Flat at max through the hold interval.
        for ms in [2000, 4000, 7999] {
            assert_eq!(notif.alpha(start + Duration::from_millis(ms)), MAX_ALPHA);
        }

        // Monotone fall through fade-out, 0 by show time.
        let mut prev = MAX_ALPHA;
        for ms in [8001, 9000, 9500, 9999] {
            let a = notif.alpha(start + Duration::from_millis(ms));
            assert!(a <= prev, "alpha must not rise during fade-out");
            prev = a;
        }
        assert_eq!(notif.alpha(start + SHOW_TIME), 0.0);
    }

    #[test]
    fn pruned_after_show_time() {
        let mut queue = NotificationQueue::default();
        let start = Instant::now();
        post_one(&mut queue, start);

        assert_eq!(queue.prune(start + SHOW_TIME), 0);
        assert_eq!(queue.prune(start + SHOW_TIME + Duration::from_millis(1)), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn forced_expiry_is_immediate() {
        let mut queue = NotificationQueue::default();
        let start = Instant::now();
        post_one(&mut queue, start);

        queue.iter_mut().next().unwrap().expire();
        let notif = queue.iter().next().unwrap();
        assert_eq!(notif.alpha(start + Duration::from_secs(3)), 0.0);
        assert_eq!(queue.prune(start + Duration::from_secs(3)), 1);
    }

    #[test]
    fn ids_are_reused_after_pruning() {
        let mut queue = NotificationQueue::default();
        let start = Instant::now();
        let first = post_one(&mut queue, start);
        let second = post_one(&mut queue, start);
        assert_ne!(first, second);

        queue.iter_mut().next().unwrap().expire();
        queue.prune(start);
        assert_eq!(post_one(&mut queue, start), first);
    }
}
