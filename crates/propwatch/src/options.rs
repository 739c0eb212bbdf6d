//! Observer behavior flags.

/// Options that alter the behavior of a [`PropertyObserver`](crate::PropertyObserver).
///
/// Each flag is a named boolean. The `const` builder methods make option
/// sets readable at the call site:
///
/// ```rust
/// use propwatch::ObserverOptions;
///
/// let options = ObserverOptions::new().skip_initial().prior_change();
/// assert!(options.skip_initial);
/// assert!(!options.include_equal_changes);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[allow(clippy::struct_excessive_bools)]
pub struct ObserverOptions {
    /// Do not report the current value when a reaction is registered.
    pub skip_initial: bool,

    /// Also report each change before it happens (`is_prior` records).
    pub prior_change: bool,

    /// Report settings that leave the value equal to what it was.
    pub include_equal_changes: bool,

    /// For relationship properties, report only wholesale replacement of the
    /// collection, never insertion, removal or replacement of elements.
    pub relationship_settings_only: bool,
}

impl ObserverOptions {
    /// No special options, default behavior.
    pub const NONE: Self = Self {
        skip_initial: false,
        prior_change: false,
        include_equal_changes: false,
        relationship_settings_only: false,
    };

    const SKIP_INITIAL_BIT: u32 = 1 << 0;
    const PRIOR_CHANGE_BIT: u32 = 1 << 1;
    const INCLUDE_EQUAL_CHANGES_BIT: u32 = 1 << 2;
    const RELATIONSHIP_SETTINGS_ONLY_BIT: u32 = 1 << 4;

    /// Default options.
    #[must_use]
    pub const fn new() -> Self {
        Self::NONE
    }

    /// Sets [`skip_initial`](Self::skip_initial).
    #[must_use]
    pub const fn skip_initial(mut self) -> Self {
        self.skip_initial = true;
        self
    }

    /// Sets [`prior_change`](Self::prior_change).
    #[must_use]
    pub const fn prior_change(mut self) -> Self {
        self.prior_change = true;
        self
    }

    /// Sets [`include_equal_changes`](Self::include_equal_changes).
    #[must_use]
    pub const fn include_equal_changes(mut self) -> Self {
        self.include_equal_changes = true;
        self
    }

    /// Sets [`relationship_settings_only`](Self::relationship_settings_only).
    #[must_use]
    pub const fn relationship_settings_only(mut self) -> Self {
        self.relationship_settings_only = true;
        self
    }

    /// Builds options from the legacy bit layout. Unknown bits are ignored.
    ///
    /// | Bit | Flag |
    /// |-----|------|
    /// | `1 << 0` | `skip_initial` |
    /// | `1 << 1` | `prior_change` |
    /// | `1 << 2` | `include_equal_changes` |
    /// | `1 << 4` | `relationship_settings_only` |
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self {
            skip_initial: bits & Self::SKIP_INITIAL_BIT != 0,
            prior_change: bits & Self::PRIOR_CHANGE_BIT != 0,
            include_equal_changes: bits & Self::INCLUDE_EQUAL_CHANGES_BIT != 0,
            relationship_settings_only: bits & Self::RELATIONSHIP_SETTINGS_ONLY_BIT != 0,
        }
    }

    /// Encodes the options in the legacy bit layout.
    #[must_use]
    pub const fn bits(self) -> u32 {
        let mut bits = 0;
        if self.skip_initial {
            bits |= Self::SKIP_INITIAL_BIT;
        }
        if self.prior_change {
            bits |= Self::PRIOR_CHANGE_BIT;
        }
        if self.include_equal_changes {
            bits |= Self::INCLUDE_EQUAL_CHANGES_BIT;
        }
        if self.relationship_settings_only {
            bits |= Self::RELATIONSHIP_SETTINGS_ONLY_BIT;
        }
        bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(ObserverOptions::default(), ObserverOptions::NONE);
        assert_eq!(ObserverOptions::new().bits(), 0);
    }

    #[test]
    fn test_builder() {
        let options = ObserverOptions::new()
            .prior_change()
            .relationship_settings_only();

        assert!(!options.skip_initial);
        assert!(options.prior_change);
        assert!(!options.include_equal_changes);
        assert!(options.relationship_settings_only);
    }

    #[test]
    fn test_legacy_bits() {
        let options = ObserverOptions::from_bits(0b1_0101);
        assert!(options.skip_initial);
        assert!(!options.prior_change);
        assert!(options.include_equal_changes);
        assert!(options.relationship_settings_only);
        assert_eq!(options.bits(), 0b1_0101);

        // bit 3 is unassigned
        assert_eq!(ObserverOptions::from_bits(1 << 3), ObserverOptions::NONE);
    }
}
