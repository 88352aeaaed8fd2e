//! Object mode bitmask.
//!
//! [`ObjectMode`] records what kind of entry an object is and which stage of
//! its data lifecycle it is in. `READ`, `PART` and `APPEND` are mutually
//! exclusive lifecycle stages; `DIR` and `LINK` are orthogonal
//! namespace-kind flags.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Bitmask describing the kind and lifecycle stage of an [`Object`].
///
/// At most one of [`READ`](Self::READ), [`PART`](Self::PART) and
/// [`APPEND`](Self::APPEND) may be set at a time; see
/// [`is_lifecycle_consistent`](Self::is_lifecycle_consistent).
///
/// [`Object`]: crate::Object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectMode(u32);

impl ObjectMode {
    /// The object holds readable, fully-persisted data.
    pub const READ: Self = Self(1);
    /// The object is a directory.
    pub const DIR: Self = Self(1 << 1);
    /// The object is a link to another path.
    pub const LINK: Self = Self(1 << 2);
    /// The object is an in-flight multipart upload.
    pub const PART: Self = Self(1 << 3);
    /// The object is an uncommitted append session.
    pub const APPEND: Self = Self(1 << 4);

    /// An empty mode with no flags set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns `true` if no flags are set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every flag in `other` is also set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if the READ flag is set.
    #[must_use]
    pub const fn is_read(self) -> bool {
        self.contains(Self::READ)
    }

    /// Returns `true` if the DIR flag is set.
    #[must_use]
    pub const fn is_dir(self) -> bool {
        self.contains(Self::DIR)
    }

    /// Returns `true` if the LINK flag is set.
    #[must_use]
    pub const fn is_link(self) -> bool {
        self.contains(Self::LINK)
    }

    /// Returns `true` if the PART flag is set.
    #[must_use]
    pub const fn is_part(self) -> bool {
        self.contains(Self::PART)
    }

    /// Returns `true` if the APPEND flag is set.
    #[must_use]
    pub const fn is_append(self) -> bool {
        self.contains(Self::APPEND)
    }

    /// Returns `true` if at most one of the lifecycle flags (READ, PART,
    /// APPEND) is set.
    #[must_use]
    pub const fn is_lifecycle_consistent(self) -> bool {
        let lifecycle = self.0 & (Self::READ.0 | Self::PART.0 | Self::APPEND.0);
        lifecycle.count_ones() <= 1
    }
}

impl BitOr for ObjectMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ObjectMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ObjectMode {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for ObjectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: [(Self, &str); 5] = [
            (Self::READ, "read"),
            (Self::DIR, "dir"),
            (Self::LINK, "link"),
            (Self::PART, "part"),
            (Self::APPEND, "append"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("unknown")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_report_individual_flags() {
        assert!(ObjectMode::READ.is_read());
        assert!(ObjectMode::DIR.is_dir());
        assert!(ObjectMode::LINK.is_link());
        assert!(ObjectMode::PART.is_part());
        assert!(ObjectMode::APPEND.is_append());
        assert!(!ObjectMode::READ.is_part());
    }

    #[test]
    fn test_should_combine_flags_with_bitor() {
        let mode = ObjectMode::DIR | ObjectMode::LINK;
        assert!(mode.is_dir());
        assert!(mode.is_link());
        assert!(!mode.is_read());
    }

    #[test]
    fn test_should_check_lifecycle_consistency() {
        assert!(ObjectMode::READ.is_lifecycle_consistent());
        assert!((ObjectMode::READ | ObjectMode::LINK).is_lifecycle_consistent());
        assert!(ObjectMode::empty().is_lifecycle_consistent());
        assert!(!(ObjectMode::READ | ObjectMode::PART).is_lifecycle_consistent());
        assert!(!(ObjectMode::PART | ObjectMode::APPEND).is_lifecycle_consistent());
    }

    #[test]
    fn test_should_display_flag_names() {
        assert_eq!(format!("{}", ObjectMode::READ), "read");
        assert_eq!(format!("{}", ObjectMode::DIR | ObjectMode::LINK), "dir|link");
        assert_eq!(format!("{}", ObjectMode::empty()), "unknown");
    }

    #[test]
    fn test_should_default_to_empty() {
        assert!(ObjectMode::default().is_empty());
    }
}
