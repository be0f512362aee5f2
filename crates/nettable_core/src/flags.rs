//! Entry flags.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bitmask of per-entry flags, synchronized with every peer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EntryFlags(u8);

impl EntryFlags {
    /// No flags set.
    pub const NONE: EntryFlags = EntryFlags(0);
    /// The entry survives `delete_all` and clear-all messages.
    pub const PERSISTENT: EntryFlags = EntryFlags(0x01);

    /// Creates flags from their wire representation.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the wire representation.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every bit of `other` is set.
    pub const fn contains(self, other: EntryFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if the persistent bit is set.
    pub const fn is_persistent(self) -> bool {
        self.contains(Self::PERSISTENT)
    }

    /// Returns true if no bit is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for EntryFlags {
    type Output = EntryFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        EntryFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for EntryFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for EntryFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_persistent() {
            write!(f, "EntryFlags(PERSISTENT")?;
            if self.0 & !Self::PERSISTENT.0 != 0 {
                write!(f, " | {:#04x}", self.0 & !Self::PERSISTENT.0)?;
            }
            write!(f, ")")
        } else {
            write!(f, "EntryFlags({:#04x})", self.0)
        }
    }
}
