//! Member modifier bitset
//!
//! Bit values follow the class-file access flag layout, so the three
//! visibility bits occupy the low `0b111` range.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Modifiers attached to a field, method, or constructor.
    ///
    /// At most one of `PUBLIC`, `PRIVATE`, `PROTECTED` may be set; a member
    /// with none of them has package-default visibility.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        /// Visible everywhere
        const PUBLIC = 0x0001;
        /// Visible inside the declaring type only
        const PRIVATE = 0x0002;
        /// Visible to subtypes and the package
        const PROTECTED = 0x0004;
        /// Belongs to the type rather than an instance
        const STATIC = 0x0008;
        /// Cannot be reassigned or overridden
        const FINAL = 0x0010;
        /// Holds the receiver's monitor while running
        const SYNCHRONIZED = 0x0020;
        /// Not cached by threads
        const VOLATILE = 0x0040;
        /// Skipped by serialization
        const TRANSIENT = 0x0080;
        /// Implemented outside the runtime
        const NATIVE = 0x0100;
        /// Declared without an implementation
        const ABSTRACT = 0x0400;
        /// Strict floating point
        const STRICT = 0x0800;
    }
}

impl Modifiers {
    /// Mask of the three visibility bits
    pub const VISIBILITY: Self = Self::PUBLIC.union(Self::PRIVATE).union(Self::PROTECTED);

    /// Visibility bits only
    pub const fn visibility(self) -> Self {
        self.intersection(Self::VISIBILITY)
    }

    /// True when none of public/protected/private is set
    pub const fn is_package_default(self) -> bool {
        self.visibility().is_empty()
    }

    /// True when at most one visibility bit is set
    pub const fn has_valid_visibility(self) -> bool {
        self.visibility().bits().count_ones() <= 1
    }

    /// Shorthand for `contains(STATIC)`
    pub const fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    /// Shorthand for `contains(FINAL)`
    pub const fn is_final(self) -> bool {
        self.contains(Self::FINAL)
    }

    /// Shorthand for `contains(PUBLIC)`
    pub const fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const WORDS: [(Modifiers, &str); 11] = [
            (Modifiers::PUBLIC, "public"),
            (Modifiers::PROTECTED, "protected"),
            (Modifiers::PRIVATE, "private"),
            (Modifiers::ABSTRACT, "abstract"),
            (Modifiers::STATIC, "static"),
            (Modifiers::FINAL, "final"),
            (Modifiers::TRANSIENT, "transient"),
            (Modifiers::VOLATILE, "volatile"),
            (Modifiers::SYNCHRONIZED, "synchronized"),
            (Modifiers::NATIVE, "native"),
            (Modifiers::STRICT, "strictfp"),
        ];

        let mut first = true;
        for (flag, word) in WORDS {
            if self.contains(flag) {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(word)?;
                first = false;
            }
        }
        Ok(())
    }
}

bitflags! {
    /// Visibility classes a filter accepts.
    ///
    /// `PACKAGE` sits outside the three-bit modifier range and matches
    /// members with none of the visibility modifiers set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VisibilityMask: u32 {
        /// Public members
        const PUBLIC = 0x1;
        /// Private members
        const PRIVATE = 0x2;
        /// Protected members
        const PROTECTED = 0x4;
        /// Package-default members
        const PACKAGE = 0x8;
    }
}

impl VisibilityMask {
    /// Every visibility class
    pub const ALL: Self = Self::all();

    /// True when a member with `mods` is admitted by this mask
    pub fn admits(self, mods: Modifiers) -> bool {
        if self.bits() & mods.visibility().bits() != 0 {
            return true;
        }
        self.contains(Self::PACKAGE) && mods.is_package_default()
    }
}

impl Default for VisibilityMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Display for VisibilityMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const WORDS: [(VisibilityMask, &str); 4] = [
            (VisibilityMask::PUBLIC, "public"),
            (VisibilityMask::PROTECTED, "protected"),
            (VisibilityMask::PACKAGE, "default"),
            (VisibilityMask::PRIVATE, "private"),
        ];

        if self.is_empty() {
            return f.write_str("none");
        }
        let words: Vec<&str> = WORDS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, word)| *word)
            .collect();
        f.write_str(&words.join("/"))
    }
}

/// Requirement a filter places on one boolean trait of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TraitState {
    /// The trait must be present
    Must = 0,
    /// The trait must be absent
    MustNot = 1,
    /// Don't care
    #[default]
    Either = 2,
}

impl TraitState {
    /// True when a member whose trait is `has` satisfies this requirement
    pub fn admits(self, has: bool) -> bool {
        match self {
            TraitState::Either => true,
            state => ((has as u8) ^ (state as u8)) != 0,
        }
    }

    /// Description word for the trait, `None` for `Either`
    pub fn describe(self, word: &str) -> Option<String> {
        match self {
            TraitState::Must => Some(word.to_string()),
            TraitState::MustNot => Some(format!("not-{}", word)),
            TraitState::Either => None,
        }
    }
}

impl From<Option<bool>> for TraitState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => TraitState::Must,
            Some(false) => TraitState::MustNot,
            None => TraitState::Either,
        }
    }
}

impl From<bool> for TraitState {
    fn from(value: bool) -> Self {
        Some(value).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_default() {
        assert!(Modifiers::STATIC.is_package_default());
        assert!(Modifiers::empty().is_package_default());
        assert!(!Modifiers::PRIVATE.is_package_default());
        assert!(!(Modifiers::PROTECTED | Modifiers::FINAL).is_package_default());
    }

    #[test]
    fn test_visibility_exclusivity() {
        assert!(Modifiers::PUBLIC.has_valid_visibility());
        assert!((Modifiers::PRIVATE | Modifiers::STATIC).has_valid_visibility());
        assert!(!(Modifiers::PUBLIC | Modifiers::PRIVATE).has_valid_visibility());
    }

    #[test]
    fn test_display_order() {
        let mods = Modifiers::FINAL | Modifiers::PRIVATE | Modifiers::STATIC;
        assert_eq!(mods.to_string(), "private static final");
        assert_eq!(Modifiers::empty().to_string(), "");
    }

    #[test]
    fn test_visibility_mask_admits() {
        let mask = VisibilityMask::PUBLIC | VisibilityMask::PACKAGE;
        assert!(mask.admits(Modifiers::PUBLIC | Modifiers::STATIC));
        assert!(mask.admits(Modifiers::FINAL));
        assert!(!mask.admits(Modifiers::PRIVATE));
        assert!(!VisibilityMask::PRIVATE.admits(Modifiers::empty()));
        assert!(VisibilityMask::ALL.admits(Modifiers::PROTECTED));
    }

    #[test]
    fn test_visibility_mask_display() {
        assert_eq!(VisibilityMask::ALL.to_string(), "public/protected/default/private");
        assert_eq!(
            (VisibilityMask::PRIVATE | VisibilityMask::PUBLIC).to_string(),
            "public/private"
        );
        assert_eq!(VisibilityMask::empty().to_string(), "none");
    }

    #[test]
    fn test_trait_state() {
        assert!(TraitState::Must.admits(true));
        assert!(!TraitState::Must.admits(false));
        assert!(TraitState::MustNot.admits(false));
        assert!(!TraitState::MustNot.admits(true));
        assert!(TraitState::Either.admits(true) && TraitState::Either.admits(false));
        assert_eq!(TraitState::from(None), TraitState::Either);
        assert_eq!(TraitState::from(false), TraitState::MustNot);
        assert_eq!(TraitState::MustNot.describe("static").as_deref(), Some("not-static"));
    }
}
