//! Object identity and typed metadata.
//!
//! An [`Object`] is created and returned only by core or capability calls
//! (`create_*`, `write`, `stat`, `list`) — callers treat it as an opaque
//! handle plus typed, optionally-present metadata. The `Object::new` /
//! `with_*` constructors exist for backend implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mode::ObjectMode;

/// A storage object: identity, mode, and optionally-present metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Object {
    path: String,
    mode: ObjectMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    multipart_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    append_offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_modified: Option<DateTime<Utc>>,
}

impl Object {
    /// Create a new object handle.
    ///
    /// Intended for backend implementations; callers obtain objects from
    /// storage calls.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `mode` sets more than one lifecycle flag
    /// (READ, PART, APPEND).
    #[must_use]
    pub fn new(path: impl Into<String>, mode: ObjectMode) -> Self {
        debug_assert!(
            mode.is_lifecycle_consistent(),
            "object mode {mode} sets more than one lifecycle flag"
        );
        Self {
            path: path.into(),
            mode,
            content_length: None,
            link_target: None,
            multipart_id: None,
            append_offset: None,
            last_modified: None,
        }
    }

    /// Set the content length.
    #[must_use]
    pub fn with_content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    /// Set the link target.
    #[must_use]
    pub fn with_link_target(mut self, target: impl Into<String>) -> Self {
        self.link_target = Some(target.into());
        self
    }

    /// Set the multipart id.
    #[must_use]
    pub fn with_multipart_id(mut self, id: impl Into<String>) -> Self {
        self.multipart_id = Some(id.into());
        self
    }

    /// Set the append offset.
    #[must_use]
    pub fn with_append_offset(mut self, offset: u64) -> Self {
        self.append_offset = Some(offset);
        self
    }

    /// Set the last-modified timestamp.
    #[must_use]
    pub fn with_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }

    /// The object's path within its backend namespace.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The object's mode bitmask.
    #[must_use]
    pub fn mode(&self) -> ObjectMode {
        self.mode
    }

    /// The content length in bytes, if known.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// The link target, present for link objects.
    #[must_use]
    pub fn link_target(&self) -> Option<&str> {
        self.link_target.as_deref()
    }

    /// The multipart id, present for in-flight multipart objects.
    #[must_use]
    pub fn multipart_id(&self) -> Option<&str> {
        self.multipart_id.as_deref()
    }

    /// The current append offset, present for append objects.
    #[must_use]
    pub fn append_offset(&self) -> Option<u64> {
        self.append_offset
    }

    /// The last-modified timestamp, if the backend tracks one.
    #[must_use]
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    /// The multipart id, panicking if absent.
    ///
    /// # Panics
    ///
    /// Panics if the object carries no multipart id. Use in contexts (test
    /// teardown, a freshly created multipart object) where presence is
    /// guaranteed by the contract.
    #[must_use]
    pub fn must_multipart_id(&self) -> &str {
        self.multipart_id
            .as_deref()
            .unwrap_or_else(|| panic!("object {} has no multipart id", self.path))
    }

    /// The append offset, panicking if absent.
    ///
    /// # Panics
    ///
    /// Panics if the object carries no append offset.
    #[must_use]
    pub fn must_append_offset(&self) -> u64 {
        self.append_offset
            .unwrap_or_else(|| panic!("object {} has no append offset", self.path))
    }
}

/// A single part of a multipart upload.
///
/// Produced by `write_multipart`, consumed by `complete_multipart` and
/// `list_multipart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// The part index. Indices must be unique within a session; they need
    /// not be contiguous.
    pub index: usize,
    /// The part size in bytes.
    pub size: u64,
}
