//! Attribute mask parsing and formatting.
//!
//! A mask selects which permission bits and which metadata attributes
//! participate in directory digests. Its string form is four octal digits
//! (setuid/setgid/sticky plus the rwx triples) followed by attribute
//! letters, e.g. `7777ugx`. Directory digests depend on the mask, so sum
//! output echoes it after the digest to keep lines self-describing.

use crate::error::{Error, Result};
use std::fmt;
use std::ops::BitOr;

/// Set of metadata attributes folded into directory digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attrs(u8);

impl Attrs {
    /// Owner user id.
    pub const UID: Attrs = Attrs(1);
    /// Owner group id.
    pub const GID: Attrs = Attrs(1 << 1);
    /// Device id of device and character-device nodes.
    pub const SPECIAL: Attrs = Attrs(1 << 2);
    /// Modification time (seconds and nanoseconds).
    pub const MTIME: Attrs = Attrs(1 << 3);
    /// Change time (seconds and nanoseconds).
    pub const CTIME: Attrs = Attrs(1 << 4);
    /// Extended attributes.
    pub const XATTR: Attrs = Attrs(1 << 5);

    /// The empty attribute set.
    pub const fn empty() -> Attrs {
        Attrs(0)
    }

    /// Whether every attribute in `other` is selected.
    pub fn contains(self, other: Attrs) -> bool {
        self.0 & other.0 == other.0
    }

    /// Add the attributes in `other` to the set.
    pub fn insert(&mut self, other: Attrs) {
        self.0 |= other.0;
    }
}

impl BitOr for Attrs {
    type Output = Attrs;

    fn bitor(self, rhs: Attrs) -> Attrs {
        Attrs(self.0 | rhs.0)
    }
}

// Attribute letters in canonical display order.
const LETTERS: [(char, Attrs); 6] = [
    ('u', Attrs::UID),
    ('g', Attrs::GID),
    ('s', Attrs::SPECIAL),
    ('m', Attrs::MTIME),
    ('c', Attrs::CTIME),
    ('x', Attrs::XATTR),
];

/// Selector for the mode bits and attributes that enter directory digests.
///
/// Immutable after parse; shared read-only by all walkers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mask {
    /// Selected mode bits (setuid/setgid/sticky + permissions, 12 bits).
    pub mode: u32,
    /// Selected metadata attributes.
    pub attrs: Attrs,
}

impl Mask {
    /// Parse a mask string: four octal digits, then attribute letters.
    pub fn parse(s: &str) -> Result<Mask> {
        let mut chars = s.chars();
        let mut mode = 0u32;
        for _ in 0..4 {
            let c = chars
                .next()
                .ok_or_else(|| Error::invalid_mask(s, "expected four octal mode digits"))?;
            let digit = c
                .to_digit(8)
                .ok_or_else(|| Error::invalid_mask(s, format!("`{c}' is not an octal digit")))?;
            mode = mode * 8 + digit;
        }

        let mut attrs = Attrs::empty();
        for c in chars {
            let (_, attr) = LETTERS
                .iter()
                .find(|(letter, _)| *letter == c)
                .ok_or_else(|| Error::invalid_mask(s, format!("unknown attribute `{c}'")))?;
            attrs.insert(*attr);
        }

        Ok(Mask { mode, attrs })
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.mode)?;
        for (letter, attr) in LETTERS {
            if self.attrs.contains(attr) {
                write!(f, "{letter}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mask_is_all_zero() {
        let mask = Mask::default();
        assert_eq!(mask.mode, 0);
        assert_eq!(mask.attrs, Attrs::empty());
        assert_eq!(mask.to_string(), "0000");
    }

    #[test]
    fn parse_mode_and_attrs() {
        let mask = Mask::parse("7754ugx").unwrap();
        assert_eq!(mask.mode, 0o7754);
        assert!(mask.attrs.contains(Attrs::UID));
        assert!(mask.attrs.contains(Attrs::GID));
        assert!(mask.attrs.contains(Attrs::XATTR));
        assert!(!mask.attrs.contains(Attrs::MTIME));
    }

    #[test]
    fn display_is_canonical() {
        // Letters come out in fixed order regardless of parse order.
        let mask = Mask::parse("0640xgu").unwrap();
        assert_eq!(mask.to_string(), "0640ugx");
    }

    #[test]
    fn parse_rejects_short_strings() {
        assert!(Mask::parse("").is_err());
        assert!(Mask::parse("07").is_err());
    }

    #[test]
    fn parse_rejects_bad_digits() {
        assert!(Mask::parse("0980").is_err());
        assert!(Mask::parse("u000").is_err());
    }

    #[test]
    fn parse_rejects_unknown_letters() {
        assert!(Mask::parse("0000z").is_err());
    }

    #[test]
    fn contains_checks_all_bits() {
        let attrs = Attrs::UID | Attrs::GID;
        assert!(attrs.contains(Attrs::UID));
        assert!(!attrs.contains(Attrs::UID | Attrs::XATTR));
    }

    // Property-based tests
    use proptest::prelude::*;

    proptest! {
        /// Display/parse round-trips for every representable mask.
        #[test]
        fn prop_display_parse_roundtrip(mode in 0u32..0o10000, bits in 0u8..0x40) {
            let mask = Mask { mode, attrs: Attrs(bits) };
            let parsed = Mask::parse(&mask.to_string())?;
            prop_assert_eq!(parsed, mask);
        }

        /// Parsing never panics on arbitrary input.
        #[test]
        fn prop_parse_total(s in "\\PC{0,12}") {
            let _ = Mask::parse(&s);
        }
    }
}
