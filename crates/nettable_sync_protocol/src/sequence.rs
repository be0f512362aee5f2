//! Per-entry sequence numbers.

use std::cmp::Ordering;

/// A 16-bit wrapping sequence number.
///
/// Every write to an existing entry increments its sequence number. Two
/// numbers are compared with serial-number arithmetic (RFC 1982), so the
/// order survives wrap-around as long as the two values are less than
/// half the space apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SequenceNumber(u16);

impl SequenceNumber {
    /// Creates a sequence number from its raw value.
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Returns the next sequence number, wrapping at `u16::MAX`.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Returns true if `self` is strictly newer than `other`.
    pub fn is_newer_than(self, other: Self) -> bool {
        self.cmp_serial(other) == Ordering::Greater
    }

    /// Returns true if `self` is strictly older than `other`.
    pub fn is_older_than(self, other: Self) -> bool {
        self.cmp_serial(other) == Ordering::Less
    }

    /// Serial-number comparison.
    ///
    /// Values exactly half the space apart are undefined by RFC 1982; they
    /// are ordered by raw value here so the comparison stays total.
    pub fn cmp_serial(self, other: Self) -> Ordering {
        if self.0 == other.0 {
            return Ordering::Equal;
        }
        let forward = other.0.wrapping_sub(self.0);
        match forward.cmp(&0x8000) {
            Ordering::Less => Ordering::Less,
            Ordering::Greater => Ordering::Greater,
            Ordering::Equal => self.0.cmp(&other.0),
        }
    }
}

impl From<u16> for SequenceNumber {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_ordering() {
        let a = SequenceNumber::new(1);
        let b = SequenceNumber::new(2);
        assert!(b.is_newer_than(a));
        assert!(a.is_older_than(b));
        assert!(!a.is_newer_than(a));
        assert!(!a.is_older_than(a));
    }

    #[test]
    fn wraparound() {
        let last = SequenceNumber::new(u16::MAX);
        let first = last.next();
        assert_eq!(first.value(), 0);
        assert!(first.is_newer_than(last));
        assert!(last.is_older_than(first));
    }

    #[test]
    fn far_apart_values_order_backwards() {
        // 10 is "newer" than 40000 because the forward distance is < half
        let a = SequenceNumber::new(40000);
        let b = SequenceNumber::new(10);
        assert!(b.is_newer_than(a));
    }

    #[test]
    fn half_space_is_total() {
        let a = SequenceNumber::new(0);
        let b = SequenceNumber::new(0x8000);
        assert_ne!(a.cmp_serial(b), b.cmp_serial(a));
    }
}
