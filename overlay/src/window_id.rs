//! Window-slot id allocation.
//!
//! Every UI surface that needs a stable widget id draws from a shared id
//! space, partitioned into disjoint ranges per consumer so friend windows,
//! notifications and per-friend list items can never collide.

/// Ids per consumer range.
pub const WINDOW_ID_RANGE: u32 = 10_000;

pub const NOTIFICATION_ID_BASE: u32 = 0;
pub const FRIEND_WINDOW_ID_BASE: u32 = WINDOW_ID_RANGE;
pub const FRIEND_ITEM_ID_BASE: u32 = 2 * WINDOW_ID_RANGE;

/// The list-item id paired with a friend window id.
pub fn friend_item_id(window_id: u32) -> u32 {
    window_id - FRIEND_WINDOW_ID_BASE + FRIEND_ITEM_ID_BASE
}

/// Smallest free id at or above `base`, given the ids currently in use
/// within that range. Returns `None` when the range is exhausted.
pub fn find_free_id(ids: &mut Vec<u32>, base: u32) -> Option<u32> {
    ids.sort_unstable();

    let mut id = base;
    for &used in ids.iter() {
        if id < used {
            break;
        }
        id = used + 1;
    }

    (id < base + WINDOW_ID_RANGE).then_some(id)
}
