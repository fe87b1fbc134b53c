use debugtoggle_plugin::PlayerId;
use rustc_hash::FxHashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Per-player debugging flags for one enable cycle.
///
/// A player without an entry is not debugging, so there is no difference between a
/// player that was never seen and one whose flag was explicitly cleared.
#[derive(Debug, Default)]
pub struct SessionFlagRegistry {
    flags: Mutex<FxHashMap<PlayerId, bool>>,
}

impl SessionFlagRegistry {
    pub fn new() -> SessionFlagRegistry {
        Default::default()
    }

    // Every operation leaves the map consistent, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, FxHashMap<PlayerId, bool>> {
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_debugging(&self, player: PlayerId) -> bool {
        self.lock().get(&player).copied().unwrap_or(false)
    }

    pub fn set_debugging(&self, player: PlayerId, value: bool) {
        self.lock().insert(player, value);
    }

    /// Flips the flag and returns the new value.
    pub fn toggle_debugging(&self, player: PlayerId) -> bool {
        let mut flags = self.lock();
        let flag = flags.entry(player).or_insert(false);
        *flag = !*flag;
        *flag
    }

    /// Drops the entry for `player`. Returns whether there was one.
    pub fn forget(&self, player: PlayerId) -> bool {
        self.lock().remove(&player).is_some()
    }

    /// The number of players with an entry, set or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
