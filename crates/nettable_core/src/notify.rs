//! Notification kinds.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Bitmask describing a change, or the changes a listener wants.
///
/// As a listener mask, `LOCAL` opts in to changes made through the local
/// API and `IMMEDIATE` requests a replay of current entries at
/// registration. As a change kind, `LOCAL` marks a change made through the
/// local API.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NotifyKind(u8);

impl NotifyKind {
    /// Nothing.
    pub const NONE: NotifyKind = NotifyKind(0x00);
    /// Replay of existing entries at registration.
    pub const IMMEDIATE: NotifyKind = NotifyKind(0x01);
    /// Change made through the local API.
    pub const LOCAL: NotifyKind = NotifyKind(0x02);
    /// Entry created.
    pub const NEW: NotifyKind = NotifyKind(0x04);
    /// Entry removed.
    pub const DELETE: NotifyKind = NotifyKind(0x08);
    /// Entry value changed.
    pub const UPDATE: NotifyKind = NotifyKind(0x10);
    /// Entry flags changed.
    pub const FLAGS: NotifyKind = NotifyKind(0x20);

    /// The bits that describe what changed.
    pub const CHANGES: NotifyKind = NotifyKind(0x04 | 0x08 | 0x10 | 0x20);

    /// Every change kind, local changes included, with replay.
    pub const ALL: NotifyKind = NotifyKind(0x3f);

    /// Creates a kind from its raw bits.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every bit of `other` is set.
    pub const fn contains(self, other: NotifyKind) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if any bit of `other` is set.
    pub const fn intersects(self, other: NotifyKind) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns true if a change of this kind reaches a listener with `mask`.
    pub const fn is_delivered_to(self, mask: NotifyKind) -> bool {
        let wanted = self.0 & mask.0 & Self::CHANGES.0 != 0;
        let local_ok = !self.contains(Self::LOCAL) || mask.contains(Self::LOCAL);
        wanted && local_ok
    }
}

impl BitOr for NotifyKind {
    type Output = NotifyKind;

    fn bitor(self, rhs: Self) -> Self::Output {
        NotifyKind(self.0 | rhs.0)
    }
}

impl BitOrAssign for NotifyKind {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for NotifyKind {
    type Output = NotifyKind;

    fn bitand(self, rhs: Self) -> Self::Output {
        NotifyKind(self.0 & rhs.0)
    }
}

impl fmt::Debug for NotifyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(NotifyKind, &str); 6] = [
            (NotifyKind::IMMEDIATE, "IMMEDIATE"),
            (NotifyKind::LOCAL, "LOCAL"),
            (NotifyKind::NEW, "NEW"),
            (NotifyKind::DELETE, "DELETE"),
            (NotifyKind::UPDATE, "UPDATE"),
            (NotifyKind::FLAGS, "FLAGS"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", names.join(" | "))
        }
    }
}
