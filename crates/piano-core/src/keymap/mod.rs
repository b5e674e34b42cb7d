//! Input-to-key translation tables.
//!
//! Two input sources reach the piano: typed characters (keyboard `key-down`)
//! and pointer clicks on a rendered key.  The UI renders the keys as two rows,
//! so a click is reported as "the n-th white key" or "the n-th black key".
//! Both are normalized here to a [`KeyId`].

pub mod key;

pub use key::{KeyCategory, KeyId};

/// White keys in on-screen order (left to right).
pub const WHITE_KEYS: [KeyId; 15] = {
    use KeyId::*;
    [A, S, D, F, G, H, J, K, L, Z, X, C, V, B, N]
};

/// Black keys in on-screen order (left to right).
pub const BLACK_KEYS: [KeyId; 11] = {
    use KeyId::*;
    [Q, W, E, R, T, Y, U, I, O, P, BracketLeft]
};

/// Unified key mapper providing all translation directions.
pub struct KeyMapper;

impl KeyMapper {
    /// Translates a keyboard key name (the `KeyboardEvent.key` value, e.g.
    /// `"a"`, `"A"`, `"["`, `"Shift"`) to a [`KeyId`].
    ///
    /// Only single-character names can be piano keys; named keys such as
    /// `"Shift"` or `"Enter"` return `None`.
    pub fn from_key_name(name: &str) -> Option<KeyId> {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => KeyId::from_char(c),
            _ => None,
        }
    }

    /// Returns the key rendered at `index` within `category`'s row.
    ///
    /// Returns `None` when `index` is past the end of the row.
    pub fn key_at(category: KeyCategory, index: usize) -> Option<KeyId> {
        Self::row(category).get(index).copied()
    }

    /// Returns all keys of one category in on-screen order.
    pub fn row(category: KeyCategory) -> &'static [KeyId] {
        match category {
            KeyCategory::White => &WHITE_KEYS,
            KeyCategory::Black => &BLACK_KEYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_disjoint_and_match_categories() {
        for key in WHITE_KEYS {
            assert_eq!(key.category(), KeyCategory::White);
            assert!(!BLACK_KEYS.contains(&key));
        }
        for key in BLACK_KEYS {
            assert_eq!(key.category(), KeyCategory::Black);
        }
    }

    #[test]
    fn test_from_key_name_single_characters() {
        assert_eq!(KeyMapper::from_key_name("a"), Some(KeyId::A));
        assert_eq!(KeyMapper::from_key_name("S"), Some(KeyId::S));
        assert_eq!(KeyMapper::from_key_name("["), Some(KeyId::BracketLeft));
    }

    #[test]
    fn test_from_key_name_rejects_named_and_empty_keys() {
        assert_eq!(KeyMapper::from_key_name("Shift"), None);
        assert_eq!(KeyMapper::from_key_name("Enter"), None);
        assert_eq!(KeyMapper::from_key_name(""), None);
        assert_eq!(KeyMapper::from_key_name("m"), None);
    }

    #[test]
    fn test_key_at_follows_on_screen_order() {
        assert_eq!(KeyMapper::key_at(KeyCategory::White, 0), Some(KeyId::A));
        assert_eq!(KeyMapper::key_at(KeyCategory::White, 14), Some(KeyId::N));
        assert_eq!(KeyMapper::key_at(KeyCategory::Black, 10), Some(KeyId::BracketLeft));
    }

    #[test]
    fn test_key_at_out_of_range_is_none() {
        assert_eq!(KeyMapper::key_at(KeyCategory::White, 15), None);
        assert_eq!(KeyMapper::key_at(KeyCategory::Black, 11), None);
    }

    #[test]
    fn test_key_at_walks_each_row_in_order() {
        for category in [KeyCategory::White, KeyCategory::Black] {
            for (idx, &key) in KeyMapper::row(category).iter().enumerate() {
                assert_eq!(KeyMapper::key_at(category, idx), Some(key));
                assert_eq!(key.category(), category);
            }
        }
    }
}
