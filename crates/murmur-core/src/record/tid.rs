//! Timestamp identifiers (TIDs) used as record keys.
//!
//! A TID is a 64-bit integer (top bit zero, 53 bits of microseconds since
//! the Unix epoch, 10 bits of clock id) rendered as 13 characters of
//! sortable base32, so lexical order matches creation order.

use std::fmt;
use std::sync::Mutex;

use chrono::Utc;

const ALPHABET: &[u8; 32] = b"234567abcdefghijklmnopqrstuvwxyz";
const CLOCK_ID_MASK: u64 = 0x3FF;
const TIMESTAMP_MASK: u64 = (1 << 53) - 1;

/// A record key derived from a timestamp and clock id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tid(u64);

impl Tid {
    pub fn from_parts(micros: u64, clock_id: u16) -> Self {
        Self(((micros & TIMESTAMP_MASK) << 10) | (u64::from(clock_id) & CLOCK_ID_MASK))
    }

    pub fn micros(&self) -> u64 {
        self.0 >> 10
    }
}

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0u8; 13];
        let mut value = self.0;
        for slot in buf.iter_mut().rev() {
            *slot = ALPHABET[(value & 0x1F) as usize];
            value >>= 5;
        }
        // ALPHABET is ASCII, so every byte is a valid char.
        for b in buf {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

/// Process-wide monotonic TID source.
///
/// Successive calls never return the same or an older TID, even when the
/// wall clock stalls or steps backwards.
#[derive(Debug)]
pub struct TidClock {
    clock_id: u16,
    last: Mutex<u64>,
}

impl TidClock {
    pub fn new(clock_id: u16) -> Self {
        Self {
            clock_id: clock_id & CLOCK_ID_MASK as u16,
            last: Mutex::new(0),
        }
    }

    /// A clock with a random clock id, so restarts within the same
    /// microsecond still produce distinct keys.
    pub fn random() -> Self {
        Self::new(rand::random::<u16>())
    }

    pub fn next(&self) -> Tid {
        let now = Utc::now().timestamp_micros().max(0) as u64;
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let micros = now.max(*last + 1);
        *last = micros;
        Tid::from_parts(micros, self.clock_id)
    }
}

impl Default for TidClock {
    fn default() -> Self {
        Self::random()
    }
}
