//! Per-address brightness state shared between control input and the transmitter.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mlight_frame::CHANNEL_COUNT;
use tracing::debug;

use crate::error::{BusError, Result};

/// Highest level a slave output accepts.
pub const MAX_BRIGHTNESS: u8 = 64;

/// Level used to switch a channel on when it has never been on before.
pub const DEFAULT_BRIGHTNESS: u8 = 32;

/// Brightness of every channel of one slave.
pub type Channels = [u8; CHANNEL_COUNT];

/// Saturate an arbitrary level into `0..=MAX_BRIGHTNESS`.
pub fn clamp_brightness(value: i64) -> u8 {
    value.clamp(0, i64::from(MAX_BRIGHTNESS)) as u8
}

/// Values accepted by [`BrightnessTable::set_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelValues {
    /// The same level on every channel.
    Broadcast(u8),
    /// One level per channel.
    Each(Channels),
}

impl ChannelValues {
    fn into_channels(self) -> Channels {
        match self {
            ChannelValues::Broadcast(level) => [level; CHANNEL_COUNT],
            ChannelValues::Each(levels) => levels,
        }
    }
}

impl From<u8> for ChannelValues {
    fn from(level: u8) -> Self {
        ChannelValues::Broadcast(level)
    }
}

impl From<Channels> for ChannelValues {
    fn from(levels: Channels) -> Self {
        ChannelValues::Each(levels)
    }
}

/// Where an address is in its lifecycle, as seen by one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// At least one channel is on; keep broadcasting.
    Active,
    /// Every channel is off; broadcast once more, then drop the address.
    PendingRemoval,
}

/// One address as captured by [`BrightnessTable::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub address: u8,
    pub channels: Channels,
    pub phase: Phase,
}

#[derive(Debug, Default)]
struct TableState {
    levels: BTreeMap<u8, Channels>,
    /// Last level each channel had before it was switched off.
    restore: HashMap<u8, HashMap<usize, u8>>,
}

/// Shared brightness table. Clones refer to the same state.
///
/// The lock is held only while copying a snapshot or applying a single
/// write, never while talking to the serial port.
#[derive(Debug, Clone)]
pub struct BrightnessTable {
    state: Arc<Mutex<TableState>>,
    default_brightness: u8,
}

impl BrightnessTable {
    /// Create an empty table.
    pub fn new(default_brightness: u8) -> Self {
        Self {
            state: Arc::new(Mutex::new(TableState::default())),
            default_brightness,
        }
    }

    /// Set one channel and return the level actually stored.
    ///
    /// - `None` switches the channel on at the level it had before it was
    ///   last switched off, or at the default level if there is none.
    /// - `Some(0)` switches it off and remembers the current level.
    /// - Anything else is clamped into `0..=MAX_BRIGHTNESS`.
    pub fn set(&self, address: u8, channel: usize, value: Option<i64>) -> Result<u8> {
        if channel >= CHANNEL_COUNT {
            return Err(BusError::ChannelOutOfRange { channel });
        }

        let mut state = self.lock();
        let TableState { levels, restore } = &mut *state;

        let channels = levels.entry(address).or_insert_with(|| {
            restore.entry(address).or_default();
            [0; CHANNEL_COUNT]
        });
        let slot = &mut channels[channel];

        let requested = match value {
            None => {
                let level = restore
                    .get(&address)
                    .and_then(|saved| saved.get(&channel))
                    .copied()
                    .unwrap_or(self.default_brightness);
                debug!(address, channel, level, "restoring previous brightness");
                i64::from(level)
            }
            Some(0) => {
                if let Some(saved) = restore.get_mut(&address) {
                    if *slot > 0 {
                        debug!(address, channel, level = *slot, "saving brightness before off");
                        saved.insert(channel, *slot);
                    }
                }
                0
            }
            Some(level) => level,
        };

        let stored = clamp_brightness(requested);
        *slot = stored;
        debug!(address, channel, brightness = stored, "set bus state");
        Ok(stored)
    }

    /// Replace every channel of `address` verbatim.
    ///
    /// No clamping and no restore bookkeeping.
    pub fn set_all(&self, address: u8, values: impl Into<ChannelValues>) {
        let channels = values.into().into_channels();
        self.lock().levels.insert(address, channels);
        debug!(address, ?channels, "set all channels");
    }

    /// Current levels of `address`, if it is active.
    pub fn get(&self, address: u8) -> Option<Channels> {
        self.lock().levels.get(&address).copied()
    }

    /// Level a value-less "on" would resume `channel` at, if any was saved.
    pub fn restore_level(&self, address: u8, channel: usize) -> Option<u8> {
        self.lock()
            .restore
            .get(&address)
            .and_then(|saved| saved.get(&channel))
            .copied()
    }

    /// Copy of all active addresses and their levels.
    pub fn levels(&self) -> BTreeMap<u8, Channels> {
        self.lock().levels.clone()
    }

    /// Active addresses.
    pub fn addresses(&self) -> Vec<u8> {
        self.lock().levels.keys().copied().collect()
    }

    /// Number of active addresses.
    pub fn len(&self) -> usize {
        self.lock().levels.len()
    }

    /// True when no address is active.
    pub fn is_empty(&self) -> bool {
        self.lock().levels.is_empty()
    }

    /// Point-in-time copy of every active address, for one transmit cycle.
    pub fn snapshot(&self) -> Vec<Entry> {
        self.lock()
            .levels
            .iter()
            .map(|(&address, &channels)| Entry {
                address,
                channels,
                phase: if channels.iter().all(|&level| level == 0) {
                    Phase::PendingRemoval
                } else {
                    Phase::Active
                },
            })
            .collect()
    }

    /// Drop `address` after its all-off state went out on the bus.
    ///
    /// Only removes the address if it still holds exactly `sent` and `sent`
    /// is all off; a write that landed after the snapshot keeps it alive.
    /// Restore levels are kept. Returns whether the address was removed.
    pub fn retire(&self, address: u8, sent: &Channels) -> bool {
        if sent.iter().any(|&level| level != 0) {
            return false;
        }
        let mut state = self.lock();
        if state.levels.get(&address) == Some(sent) {
            state.levels.remove(&address);
            true
        } else {
            false
        }
    }

    fn lock(&self) -> MutexGuard<'_, TableState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BrightnessTable {
    fn default() -> Self {
        Self::new(DEFAULT_BRIGHTNESS)
    }
}
