//! Retry/backoff state machine for background avatar loading.
//!
//! The UI requests an avatar before the provider has the data; an entry
//! tracks which size classes are still outstanding and how many attempts
//! have been burned. A fresh request always gets a fresh retry budget, and
//! the attempt cap guarantees progress under persistent failure: the entry
//! is dropped silently and the UI simply draws nothing.

use hashbrown::HashMap;
use scrim_core::ids::UserId;
use scrim_core::image::SizeClass;

/// Attempts per entry lifetime before giving up.
pub const MAX_LOAD_ATTEMPTS: u8 = 4;

/// A small set of size classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeSet(u8);

impl SizeSet {
    fn bit(size: SizeClass) -> u8 {
        1 << size as u8
    }

    pub fn insert(&mut self, size: SizeClass) -> bool {
        let had = self.contains(size);
        self.0 |= Self::bit(size);
        !had
    }

    pub fn remove(&mut self, size: SizeClass) {
        self.0 &= !Self::bit(size);
    }

    pub fn contains(self, size: SizeClass) -> bool {
        self.0 & Self::bit(size) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Sizes in `self` but not in `other`.
    pub fn difference(self, other: SizeSet) -> SizeSet {
        SizeSet(self.0 & !other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = SizeClass> {
        SizeClass::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}

impl FromIterator<SizeClass> for SizeSet {
    fn from_iter<I: IntoIterator<Item = SizeClass>>(iter: I) -> Self {
        let mut set = SizeSet::default();
        for size in iter {
            set.insert(size);
        }
        set
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingLoad {
    sizes: SizeSet,
    attempts: u8,
}

/// How an attempt left an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Sizes remain and budget is left; retry next tick.
    InProgress,
    /// Every requested size loaded; entry removed.
    Completed,
    /// Budget exhausted with sizes still outstanding; entry removed.
    Exhausted,
}

/// Outstanding avatar load requests, keyed by user.
#[derive(Default)]
pub struct LazyLoadTracker {
    pending: HashMap<UserId, PendingLoad>,
}

impl LazyLoadTracker {
    /// Request `size` for `user`. A size not already outstanding resets
    /// the entry's attempt budget.
    pub fn request(&mut self, user: UserId, size: SizeClass) {
        let entry = self.pending.entry(user).or_insert(PendingLoad {
            sizes: SizeSet::default(),
            attempts: 0,
        });
        if entry.sizes.insert(size) {
            entry.attempts = 0;
        }
    }

    /// The outstanding `(user, sizes)` pairs at the start of a tick.
    pub fn snapshot(&self) -> Vec<(UserId, SizeSet)> {
        self.pending.iter().map(|(u, p)| (*u, p.sizes)).collect()
    }

    /// Record the result of one attempt.
    ///
    /// `attempted` is the set captured by [`snapshot`](Self::snapshot);
    /// `succeeded` the subset that loaded. Sizes requested concurrently
    /// during the attempt merge in and reset the budget; a partial success
    /// on an already-requested size does not.
    pub fn apply_attempt(
        &mut self,
        user: UserId,
        attempted: SizeSet,
        succeeded: SizeSet,
    ) -> AttemptOutcome {
        let Some(entry) = self.pending.get_mut(&user) else {
            // Entry vanished mid-attempt (friend disconnect); results are
            // safely ignored.
            return AttemptOutcome::Completed;
        };

        for size in succeeded.iter() {
            entry.sizes.remove(size);
        }

        if entry.sizes.is_empty() {
            self.pending.remove(&user);
            return AttemptOutcome::Completed;
        }

        let merged_in = entry.sizes.difference(attempted);
        if merged_in.is_empty() {
            entry.attempts += 1;
        } else {
            entry.attempts = 0;
        }

        if entry.attempts >= MAX_LOAD_ATTEMPTS {
            self.pending.remove(&user);
            AttemptOutcome::Exhausted
        } else {
            AttemptOutcome::InProgress
        }
    }

    /// Abandon all requests for `user` (friend disconnect).
    pub fn abandon(&mut self, user: UserId) {
        self.pending.remove(&user);
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.pending.contains_key(&user)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
