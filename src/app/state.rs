//! Instrument settings replayed to newly connected clients.
//!
//! A client joining the instrument-control port has no idea what the
//! pilot last dialled in. The bootstrap sequence pushes each of the
//! [`StateEntry`] values once, in [`StateEntry::ORDER`].

use core::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::queue::RECORD_CAPACITY;

/// One replayable setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateEntry {
    /// Altimeter reference pressure.
    Qnh,
    /// Water ballast fill fraction.
    Ballast,
    /// Polar degradation from bugs on the wing.
    Bugs,
    /// MacCready reference setting.
    MacCready,
    /// Outside air temperature.
    Temperature,
    /// Cruise / climb switch position.
    CruiseMode,
}

impl StateEntry {
    /// Replay order. Index `i` of a client's bootstrap cursor maps to `ORDER[i]`.
    pub const ORDER: [StateEntry; 6] = [
        Self::Qnh,
        Self::Ballast,
        Self::Bugs,
        Self::MacCready,
        Self::Temperature,
        Self::CruiseMode,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ORDER.get(index).copied()
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Bit used in synchronisation masks.
    pub const fn mask(self) -> u8 {
        1 << (self as u8)
    }

    /// Frame key.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Qnh => "QNH",
            Self::Ballast => "BAL",
            Self::Bugs => "BUG",
            Self::MacCready => "MC",
            Self::Temperature => "OAT",
            Self::CruiseMode => "CRS",
        }
    }
}

/// Current values of all replayable settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstrumentState {
    /// QNH in hPa
    pub qnh_hpa: f32,
    /// Ballast fill (0.0–1.0)
    pub ballast_fraction: f32,
    /// `true` when this unit owns the ballast value, `false` when it
    /// mirrors a master unit (WLAN/CAN client mode).
    pub ballast_local: bool,
    /// Bug degradation in percent
    pub bugs_percent: f32,
    /// MacCready setting in m/s
    pub maccready_ms: f32,
    /// Outside air temperature in °C
    pub temperature_c: f32,
    /// Cruise switch engaged
    pub cruise: bool,
}

impl Default for InstrumentState {
    fn default() -> Self {
        Self {
            qnh_hpa: 1013.25,
            ballast_fraction: 0.0,
            ballast_local: true,
            bugs_percent: 0.0,
            maccready_ms: 0.5,
            temperature_c: 15.0,
            cruise: false,
        }
    }
}

/// Text frame for one entry: `$SYNC,<KEY>,<value>[,<flag>]\r\n`.
pub type SyncFrame = heapless::String<RECORD_CAPACITY>;

/// Render `entry` from `state` as a sync frame.
pub fn encode_entry(entry: StateEntry, state: &InstrumentState) -> SyncFrame {
    let mut s = SyncFrame::new();
    // A sync frame is < 40 bytes; the record buffer cannot overflow.
    let written = match entry {
        StateEntry::Qnh => write!(s, "$SYNC,{},{:.2}\r\n", entry.key(), state.qnh_hpa),
        StateEntry::Ballast => write!(
            s,
            "$SYNC,{},{:.3},{}\r\n",
            entry.key(),
            state.ballast_fraction,
            if state.ballast_local { "L" } else { "X" }
        ),
        StateEntry::Bugs => write!(s, "$SYNC,{},{:.0}\r\n", entry.key(), state.bugs_percent),
        StateEntry::MacCready => write!(s, "$SYNC,{},{:.1}\r\n", entry.key(), state.maccready_ms),
        StateEntry::Temperature => {
            write!(s, "$SYNC,{},{:.1}\r\n", entry.key(), state.temperature_c)
        }
        StateEntry::CruiseMode => {
            write!(s, "$SYNC,{},{}\r\n", entry.key(), u8::from(state.cruise))
        }
    };
    debug_assert!(written.is_ok());
    s
}
