//! Last-fired timestamps per key.

use std::collections::HashMap;
use std::hash::Hash;

/// Tracks when each key last fired.
///
/// Smart mode keys entries by virtual-key code, so two actions sharing a code
/// share a cooldown. Classic mode keys them by action slot.
#[derive(Debug, Clone)]
pub struct CooldownTracker<K = u32> {
    last_fired: HashMap<K, u64>,
}

impl<K> Default for CooldownTracker<K> {
    fn default() -> Self {
        Self {
            last_fired: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Copy> CooldownTracker<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `key` never fired or `min_interval` ms have passed since.
    pub fn is_eligible(&self, key: K, now: u64, min_interval: u32) -> bool {
        match self.last_fired.get(&key) {
            None => true,
            Some(&last) => now >= last && now - last >= u64::from(min_interval),
        }
    }

    /// Overwrites any previous entry for `key`.
    pub fn record_fire(&mut self, key: K, now: u64) {
        self.last_fired.insert(key, now);
    }

    pub fn last_fired(&self, key: K) -> Option<u64> {
        self.last_fired.get(&key).copied()
    }

    pub fn reset(&mut self) {
        self.last_fired.clear();
    }

    pub fn len(&self) -> usize {
        self.last_fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_fired.is_empty()
    }
}
