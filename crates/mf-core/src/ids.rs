use core::fmt;
use core::num::NonZeroU64;

use crate::MfError;

/// Compact, stable identifier for flowsheet nodes.
///
/// - `u64` leaves room for the raw identifiers streams carry before a graph is built
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u64", into = "u64"))]
pub struct Id(NonZeroU64);

impl Id {
    /// Largest index an Id can hold.
    pub const MAX_INDEX: u64 = u64::MAX - 1;

    /// Create an Id from a 0-based index by storing index+1.
    ///
    /// Indexes above [`Id::MAX_INDEX`] saturate to it; use [`Id::try_from_index`] where
    /// the index comes from outside and must not alias another one.
    pub fn from_index(index: u64) -> Self {
        let stored = index.min(Self::MAX_INDEX) + 1;
        Self(NonZeroU64::MIN.saturating_add(stored - 1))
    }

    /// Checked form of [`Id::from_index`]; `None` past [`Id::MAX_INDEX`].
    pub fn try_from_index(index: u64) -> Option<Self> {
        index.checked_add(1).and_then(NonZeroU64::new).map(Self)
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u64 {
        self.0.get() - 1
    }
}

impl TryFrom<u64> for Id {
    type Error = MfError;

    fn try_from(index: u64) -> Result<Self, Self::Error> {
        Id::try_from_index(index).ok_or(MfError::InvalidArg {
            what: "node index exceeds the largest id",
        })
    }
}

impl From<Id> for u64 {
    fn from(id: Id) -> Self {
        id.index()
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Domain-specific ID alias.
pub type NodeId = Id;

/// Source of fresh node identifiers.
///
/// Identifiers are handed out from a monotonically increasing counter, so a single
/// source never repeats itself. Callers that mix identifiers from several sources are
/// responsible for checking membership before use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSource {
    next: u64,
}

impl Default for IdSource {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource {
    /// A source starting at index 0.
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// A source whose first identifier is `index`.
    pub fn starting_at(index: u64) -> Self {
        Self { next: index }
    }

    /// A source that starts strictly after every identifier in `existing`.
    pub fn after<I>(existing: I) -> Self
    where
        I: IntoIterator<Item = Id>,
    {
        let next = existing
            .into_iter()
            .map(|id| id.index().saturating_add(1))
            .max()
            .unwrap_or(0);
        Self { next }
    }

    /// Return the next identifier and advance the counter.
    pub fn next_id(&mut self) -> Id {
        let id = Id::from_index(self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// Index of the identifier the next call to `next_id` will return.
    pub fn peek(&self) -> u64 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trip_index() {
        for i in [0_u64, 1, 2, 42, 10_000, u32::MAX as u64 + 7] {
            let id = Id::from_index(i);
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn checked_conversion_rejects_the_top_index() {
        let top = Id::try_from_index(Id::MAX_INDEX).unwrap();
        assert_eq!(top.index(), Id::MAX_INDEX);
        assert_eq!(Id::try_from_index(u64::MAX), None);
        assert!(Id::try_from(u64::MAX).is_err());
        assert_eq!(Id::try_from(7_u64).unwrap(), Id::from_index(7));
        assert_ne!(
            Id::try_from_index(Id::MAX_INDEX - 1),
            Id::try_from_index(Id::MAX_INDEX)
        );
    }

    #[test]
    fn option_id_is_small() {
        assert_eq!(
            core::mem::size_of::<Id>(),
            core::mem::size_of::<Option<Id>>()
        );
    }

    #[test]
    fn id_source_is_monotonic() {
        let mut ids = IdSource::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(ids.peek(), 2);
    }

    #[test]
    fn id_source_after_existing() {
        let existing = [Id::from_index(3), Id::from_index(9), Id::from_index(1)];
        let mut ids = IdSource::after(existing);
        assert_eq!(ids.next_id().index(), 10);

        let mut empty = IdSource::after(std::iter::empty());
        assert_eq!(empty.next_id().index(), 0);
    }
}
