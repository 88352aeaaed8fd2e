//! Per-call configuration.
//!
//! [`Pairs`] replaces the variadic option-pair pattern of other storage
//! SDKs with an explicit configuration value: every recognized option is an
//! enumerated, optional field, and an unset field selects the documented
//! backend default.

use serde::{Deserialize, Serialize};

use crate::mode::ObjectMode;

/// Traversal mode for `list` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMode {
    /// Enumerate immediate children only.
    Dir,
    /// Enumerate all descendants under the path prefix.
    Prefix,
    /// Enumerate in-flight multipart sessions under the path prefix.
    Part,
}

/// Optional per-call settings recognized by the core and capability
/// contracts.
///
/// # Examples
///
/// ```
/// use polystore_types::{ListMode, Pairs};
///
/// let pairs = Pairs::new().with_size(1024).with_list_mode(ListMode::Dir);
/// assert_eq!(pairs.size, Some(1024));
/// assert!(pairs.multipart_id.is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pairs {
    /// Byte-count cap (read) or hint (backend-specific elsewhere).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Expected object mode, used to disambiguate same-path namespaces
    /// (for example a dir and a file of the same name on flat backends).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_mode: Option<ObjectMode>,
    /// Multipart session id; addresses the in-flight session rather than
    /// the committed object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multipart_id: Option<String>,
    /// List traversal mode; unset means the backend default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_mode: Option<ListMode>,
}

impl Pairs {
    /// An empty pair set: every option takes its backend default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the size option.
    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the expected object mode.
    #[must_use]
    pub fn with_object_mode(mut self, mode: ObjectMode) -> Self {
        self.object_mode = Some(mode);
        self
    }

    /// Set the multipart session id.
    #[must_use]
    pub fn with_multipart_id(mut self, id: impl Into<String>) -> Self {
        self.multipart_id = Some(id.into());
        self
    }

    /// Set the list traversal mode.
    #[must_use]
    pub fn with_list_mode(mut self, mode: ListMode) -> Self {
        self.list_mode = Some(mode);
        self
    }
}
