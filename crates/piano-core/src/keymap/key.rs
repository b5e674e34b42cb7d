//! Playable piano keys.
//!
//! [`KeyId`] is the canonical identifier for one of the 26 playable keys.  It is
//! what gets stored in a recording and what selects the audio sample to play.
//!
//! # Why an enum and not a `char`? (for beginners)
//!
//! The piano only responds to a fixed set of 26 characters.  Storing a bare
//! `char` would let any character (`'!'`, `'7'`, …) leak into a recording and
//! force every consumer to re-check it.  An enum makes "is this a playable key?"
//! a question that is answered exactly once, at the input boundary, and every
//! later stage can rely on the answer.
//!
//! On the wire (JSON recording files) each key is written as its one-character
//! string, e.g. `"a"` or `"["`, which is what the serde renames below produce.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two visual/acoustic categories of piano key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyCategory {
    /// Natural notes; played at the default volume.
    White,
    /// Sharps/flats; played with a fixed attenuation.
    Black,
}

/// Identifier of one playable piano key.
///
/// The variant name is the keyboard character bound to the key; the serde name
/// is the character itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyId {
    // White keys, left to right
    #[serde(rename = "a")]
    A,
    #[serde(rename = "s")]
    S,
    #[serde(rename = "d")]
    D,
    #[serde(rename = "f")]
    F,
    #[serde(rename = "g")]
    G,
    #[serde(rename = "h")]
    H,
    #[serde(rename = "j")]
    J,
    #[serde(rename = "k")]
    K,
    #[serde(rename = "l")]
    L,
    #[serde(rename = "z")]
    Z,
    #[serde(rename = "x")]
    X,
    #[serde(rename = "c")]
    C,
    #[serde(rename = "v")]
    V,
    #[serde(rename = "b")]
    B,
    #[serde(rename = "n")]
    N,

    // Black keys, left to right
    #[serde(rename = "q")]
    Q,
    #[serde(rename = "w")]
    W,
    #[serde(rename = "e")]
    E,
    #[serde(rename = "r")]
    R,
    #[serde(rename = "t")]
    T,
    #[serde(rename = "y")]
    Y,
    #[serde(rename = "u")]
    U,
    #[serde(rename = "i")]
    I,
    #[serde(rename = "o")]
    O,
    #[serde(rename = "p")]
    P,
    #[serde(rename = "[")]
    BracketLeft,
}

impl KeyId {
    /// Every playable key: white keys first, then black keys, each left to right.
    pub const ALL: [KeyId; 26] = {
        use KeyId::*;
        [
            A, S, D, F, G, H, J, K, L, Z, X, C, V, B, N, Q, W, E, R, T, Y, U, I, O, P,
            BracketLeft,
        ]
    };

    /// Converts a typed character to a [`KeyId`].
    ///
    /// Letters are matched case-insensitively.  Returns `None` for any character
    /// that is not bound to a piano key.
    pub fn from_char(c: char) -> Option<Self> {
        use KeyId::*;
        let key = match c.to_ascii_lowercase() {
            'a' => A,
            's' => S,
            'd' => D,
            'f' => F,
            'g' => G,
            'h' => H,
            'j' => J,
            'k' => K,
            'l' => L,
            'z' => Z,
            'x' => X,
            'c' => C,
            'v' => V,
            'b' => B,
            'n' => N,
            'q' => Q,
            'w' => W,
            'e' => E,
            'r' => R,
            't' => T,
            'y' => Y,
            'u' => U,
            'i' => I,
            'o' => O,
            'p' => P,
            '[' => BracketLeft,
            _ => return None,
        };
        Some(key)
    }

    /// Returns the keyboard character bound to this key (always lowercase).
    pub fn as_char(self) -> char {
        use KeyId::*;
        match self {
            A => 'a',
            S => 's',
            D => 'd',
            F => 'f',
            G => 'g',
            H => 'h',
            J => 'j',
            K => 'k',
            L => 'l',
            Z => 'z',
            X => 'x',
            C => 'c',
            V => 'v',
            B => 'b',
            N => 'n',
            Q => 'q',
            W => 'w',
            E => 'e',
            R => 'r',
            T => 't',
            Y => 'y',
            U => 'u',
            I => 'i',
            O => 'o',
            P => 'p',
            BracketLeft => '[',
        }
    }

    /// Returns the wire/sample name of this key, e.g. `"a"` or `"["`.
    pub fn as_str(self) -> &'static str {
        use KeyId::*;
        match self {
            A => "a",
            S => "s",
            D => "d",
            F => "f",
            G => "g",
            H => "h",
            J => "j",
            K => "k",
            L => "l",
            Z => "z",
            X => "x",
            C => "c",
            V => "v",
            B => "b",
            N => "n",
            Q => "q",
            W => "w",
            E => "e",
            R => "r",
            T => "t",
            Y => "y",
            U => "u",
            I => "i",
            O => "o",
            P => "p",
            BracketLeft => "[",
        }
    }

    /// Returns whether this is a white or a black key.
    pub fn category(self) -> KeyCategory {
        use KeyId::*;
        match self {
            Q | W | E | R | T | Y | U | I | O | P | BracketLeft => KeyCategory::Black,
            _ => KeyCategory::White,
        }
    }

    /// Returns `true` for black keys.
    pub fn is_black(self) -> bool {
        self.category() == KeyCategory::Black
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_contains_26_distinct_keys() {
        let set: HashSet<KeyId> = KeyId::ALL.iter().copied().collect();
        assert_eq!(set.len(), 26);
    }

    #[test]
    fn test_category_counts_are_15_white_and_11_black() {
        let white = KeyId::ALL.iter().filter(|k| k.category() == KeyCategory::White).count();
        let black = KeyId::ALL.iter().filter(|k| k.is_black()).count();
        assert_eq!(white, 15);
        assert_eq!(black, 11);
    }

    #[test]
    fn test_from_char_and_as_char_agree_for_every_key() {
        for key in KeyId::ALL {
            assert_eq!(KeyId::from_char(key.as_char()), Some(key), "{key:?}");
            assert_eq!(key.as_str().chars().next(), Some(key.as_char()));
        }
    }

    #[test]
    fn test_from_char_is_case_insensitive() {
        assert_eq!(KeyId::from_char('A'), Some(KeyId::A));
        assert_eq!(KeyId::from_char('J'), Some(KeyId::J));
    }

    #[test]
    fn test_from_char_rejects_unbound_characters() {
        for c in ['m', '1', ']', ' ', ';', 'é'] {
            assert_eq!(KeyId::from_char(c), None, "{c:?} must not be playable");
        }
    }

    #[test]
    fn test_bracket_is_black() {
        assert_eq!(KeyId::BracketLeft.category(), KeyCategory::Black);
        assert_eq!(KeyId::BracketLeft.to_string(), "[");
    }

    #[test]
    fn test_key_serializes_as_single_character_string() {
        assert_eq!(serde_json::to_string(&KeyId::A).unwrap(), "\"a\"");
        assert_eq!(serde_json::to_string(&KeyId::BracketLeft).unwrap(), "\"[\"");
        let k: KeyId = serde_json::from_str("\"q\"").unwrap();
        assert_eq!(k, KeyId::Q);
    }

    #[test]
    fn test_unknown_key_string_fails_to_deserialize() {
        let result: Result<KeyId, _> = serde_json::from_str("\"m\"");
        assert!(result.is_err());
    }
}
