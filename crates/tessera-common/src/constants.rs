//! System-wide constants for the tuple engine.

// =============================================================================
// Layout Constants
// =============================================================================

/// Default maximum number of fields a layout may have and still be
/// specialized directly.
///
/// Wider layouts are specialized as a head of exactly this width plus a
/// recursively specialized tail.
pub const DEFAULT_MAX_SPECIALIZED_WIDTH: usize = 32;

/// Smallest accepted value for `max_specialized_width`.
///
/// A split needs at least two fields to make progress on every step.
pub const MIN_SPECIALIZED_WIDTH: usize = 2;

/// Default maximum number of 64-bit value words a packed layout may use.
///
/// Layouts needing more words stay on the generic storage path.
pub const DEFAULT_MAX_PACKED_WORDS: usize = 64;

/// Default maximum nesting depth of views produced in automatic mode.
pub const DEFAULT_MAX_VIEW_DEPTH: usize = 4;

// =============================================================================
// Packing Constants
// =============================================================================

/// Number of bits in one storage word.
pub const WORD_BITS: usize = 64;

/// Number of state bits kept per field (`Available` and `Null`).
pub const STATE_BITS_PER_FIELD: usize = 2;

/// Number of field states packed into one storage word.
pub const FIELDS_PER_STATE_WORD: usize = WORD_BITS / STATE_BITS_PER_FIELD;

/// Returns the number of words needed to hold the state bits of `count` fields.
#[inline]
#[must_use]
pub const fn state_words_for(count: usize) -> usize {
    (count + FIELDS_PER_STATE_WORD - 1) / FIELDS_PER_STATE_WORD
}

/// Returns the number of words needed to hold one bit per field.
#[inline]
#[must_use]
pub const fn bitset_words_for(count: usize) -> usize {
    (count + WORD_BITS - 1) / WORD_BITS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_words() {
        assert_eq!(state_words_for(0), 0);
        assert_eq!(state_words_for(1), 1);
        assert_eq!(state_words_for(32), 1);
        assert_eq!(state_words_for(33), 2);
    }

    #[test]
    fn test_bitset_words() {
        assert_eq!(bitset_words_for(0), 0);
        assert_eq!(bitset_words_for(64), 1);
        assert_eq!(bitset_words_for(65), 2);
    }
}
