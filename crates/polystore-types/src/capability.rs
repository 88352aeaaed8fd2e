//! Capability descriptor.
//!
//! A [`Capabilities`] value summarizes which optional contracts a backend
//! implements. It mirrors the `as_*` probes on
//! [`Storager`](crate::Storager) in descriptor form, for callers that want
//! to inspect support without holding trait objects.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Bitset of optional capability contracts a backend implements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(u16);

impl Capabilities {
    /// The backend implements `Appender`.
    pub const APPEND: Self = Self(1);
    /// The backend implements `Direr`.
    pub const DIR: Self = Self(1 << 1);
    /// The backend implements `Linker`.
    pub const LINK: Self = Self(1 << 2);
    /// The backend implements `Mover`.
    pub const MOVE: Self = Self(1 << 3);
    /// The backend implements `Multiparter`.
    pub const MULTIPART: Self = Self(1 << 4);
    /// The backend implements `DirLister`.
    pub const DIR_LIST: Self = Self(1 << 5);
    /// The backend implements `StorageHttpSigner`.
    pub const SIGN: Self = Self(1 << 6);
    /// The backend implements `MultipartHttpSigner`.
    pub const SIGN_MULTIPART: Self = Self(1 << 7);

    /// No optional capabilities.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns `true` if no capability bits are set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit in `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Capabilities {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: [(Self, &str); 8] = [
            (Self::APPEND, "append"),
            (Self::DIR, "dir"),
            (Self::LINK, "link"),
            (Self::MOVE, "move"),
            (Self::MULTIPART, "multipart"),
            (Self::DIR_LIST, "dir_list"),
            (Self::SIGN, "sign"),
            (Self::SIGN_MULTIPART, "sign_multipart"),
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
            f.write_str("none")?;
        }
        Ok(())
    }
}
