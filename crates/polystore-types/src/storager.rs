//! The core `Storager` contract and the optional capability traits.
//!
//! Every backend implements [`Storager`]; everything else layers on it.
//! Capability traits are structurally independent: a backend advertises
//! support through the `as_*` probes (and the [`Capabilities`] descriptor),
//! and a probe returning `None` is a structural fact, never an error.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::capability::Capabilities;
use crate::error::StorageResult;
use crate::iter::{ObjectIterator, PartIterator};
use crate::object::{Object, Part};
use crate::pairs::{ListMode, Pairs};
use crate::presign::PresignedRequest;

/// Descriptive metadata for a backend instance.
///
/// Returned by [`Storager::metadata`]; never empty — the service name is
/// always present.
#[derive(Debug, Clone)]
pub struct StorageMeta {
    /// The backend service name (for example `"memory"`).
    pub service: String,
    /// The capability set the backend implements.
    pub capabilities: Capabilities,
    /// The traversal mode `list` uses when the list-mode pair is unset.
    pub default_list_mode: ListMode,
}

impl StorageMeta {
    /// Create metadata for a backend service.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            capabilities: Capabilities::empty(),
            default_list_mode: ListMode::Dir,
        }
    }

    /// Set the capability descriptor.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set the default list traversal mode.
    #[must_use]
    pub fn with_default_list_mode(mut self, mode: ListMode) -> Self {
        self.default_list_mode = mode;
        self
    }
}

/// The mandatory core contract: read, write, stat, delete, list.
///
/// All data-path operations are synchronous request/response against the
/// backend; no operation blocks pending another in-process call. Calls on
/// distinct paths are safely concurrent; calls on the same path carry no
/// ordering guarantee beyond last-successful-write-wins.
#[async_trait]
pub trait Storager: Send + Sync {
    /// A non-empty descriptive identifier for this backend instance.
    fn id(&self) -> String;

    /// Descriptive metadata for this backend instance; never empty.
    fn metadata(&self) -> StorageMeta;

    /// Read the persisted bytes at `path`.
    ///
    /// Honors the `size` pair as a length cap. Follows links to the
    /// target's current content. Fails with the object-not-exist sentinel
    /// for absent paths (including links whose target is absent).
    async fn read(&self, path: &str, pairs: Pairs) -> StorageResult<Bytes>;

    /// Store exactly `size` bytes at `path`, returning the byte count
    /// written.
    ///
    /// - `source = None, size = 0`: creates a zero-length object.
    /// - `source = None, size > 0`: fails atomically; no partial object
    ///   becomes observable.
    /// - `size < source.len()`: persists exactly the first `size` bytes
    ///   (truncation, not an error).
    /// - `size > source.len()`: fails atomically.
    async fn write(
        &self,
        path: &str,
        source: Option<Bytes>,
        size: u64,
        pairs: Pairs,
    ) -> StorageResult<u64>;

    /// Return the [`Object`] at `path`, or fail with the object-not-exist
    /// sentinel.
    ///
    /// With a `multipart_id` pair, reports the in-flight multipart session
    /// (Mode=PART) instead of any committed object.
    async fn stat(&self, path: &str, pairs: Pairs) -> StorageResult<Object>;

    /// Delete the object at `path`. Idempotent: deleting an absent or
    /// already-deleted path succeeds.
    ///
    /// With a `multipart_id` pair, aborts the in-flight session (also
    /// idempotent).
    async fn delete(&self, path: &str, pairs: Pairs) -> StorageResult<()>;

    /// Enumerate objects under `path` per the `list_mode` pair; unset
    /// list-mode uses the backend default traversal.
    async fn list(&self, path: &str, pairs: Pairs) -> StorageResult<ObjectIterator>;

    /// The capability set this backend implements.
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    /// Probe for [`Appender`] support.
    fn as_appender(&self) -> Option<&dyn Appender> {
        None
    }

    /// Probe for [`Direr`] support.
    fn as_direr(&self) -> Option<&dyn Direr> {
        None
    }

    /// Probe for [`DirLister`] support.
    fn as_dir_lister(&self) -> Option<&dyn DirLister> {
        None
    }

    /// Probe for [`Linker`] support.
    fn as_linker(&self) -> Option<&dyn Linker> {
        None
    }

    /// Probe for [`Mover`] support.
    fn as_mover(&self) -> Option<&dyn Mover> {
        None
    }

    /// Probe for [`Multiparter`] support.
    fn as_multiparter(&self) -> Option<&dyn Multiparter> {
        None
    }

    /// Probe for [`StorageHttpSigner`] support.
    fn as_storage_signer(&self) -> Option<&dyn StorageHttpSigner> {
        None
    }

    /// Probe for [`MultipartHttpSigner`] support.
    fn as_multipart_signer(&self) -> Option<&dyn MultipartHttpSigner> {
        None
    }
}

/// Append capability: accumulate writes in call order, then commit.
#[async_trait]
pub trait Appender: Send + Sync {
    /// Open (or resume) an append session at `path`.
    ///
    /// With no prior session the object has Mode=APPEND and offset 0; with
    /// an uncommitted session it resumes at the session's current byte
    /// count, observable via [`Object::must_append_offset`].
    async fn create_append(&self, path: &str) -> StorageResult<Object>;

    /// Append `size` bytes from `source` at the session's current offset,
    /// advancing it by `size`. Returns bytes written.
    async fn write_append(&self, obj: &Object, source: Bytes, size: u64) -> StorageResult<u64>;

    /// Commit the session: Mode flips APPEND→READ and the committed content
    /// equals the concatenation of every write payload in call order.
    async fn commit_append(&self, obj: &Object) -> StorageResult<()>;
}

/// Directory capability.
#[async_trait]
pub trait Direr: Send + Sync {
    /// Create the directory at `path`. Idempotent: returns a Mode=DIR
    /// object on every call. Directory objects carry no content.
    async fn create_dir(&self, path: &str) -> StorageResult<Object>;
}

/// Immediate-children listing capability.
#[async_trait]
pub trait DirLister: Send + Sync {
    /// Enumerate the immediate children of `path` as object summaries.
    /// An empty directory's iterator yields the done sentinel on the first
    /// pull.
    async fn list_dir(&self, path: &str) -> StorageResult<ObjectIterator>;
}

/// Link capability.
///
/// Target existence is not validated at creation time: dangling links are
/// permitted, and reads through a dangling link fail with the
/// object-not-exist sentinel until the target is written.
#[async_trait]
pub trait Linker: Send + Sync {
    /// Create, or atomically replace, a link at `path` referencing
    /// `target`. The returned object has Mode=LINK (never READ) and carries
    /// the target via [`Object::link_target`].
    async fn create_link(&self, path: &str, target: &str) -> StorageResult<Object>;
}

/// Rename capability.
#[async_trait]
pub trait Mover: Send + Sync {
    /// Atomically rename `src` to `dst`.
    ///
    /// Post-success, `stat(src)` fails not-exist and `dst` holds src's
    /// former content; a pre-existing `dst` is silently overwritten. A
    /// non-existent `src` fails not-exist and leaves the namespace
    /// unchanged.
    async fn move_object(&self, src: &str, dst: &str) -> StorageResult<()>;
}

/// Multipart upload capability.
///
/// A session is created in the PART lifecycle stage, accumulates indexed
/// parts, and completes into a readable object whose content is the
/// concatenation of the listed parts sorted ascending by index, regardless
/// of write order. Completion invalidates the multipart id. Sessions are
/// independent per id; parts at distinct indices may be written
/// concurrently, but completion must not race an in-flight part write on
/// the same session.
#[async_trait]
pub trait Multiparter: Send + Sync {
    /// Start a multipart session at `path`. The returned object has
    /// Mode=PART (not READ) and a multipart id.
    async fn create_multipart(&self, path: &str) -> StorageResult<Object>;

    /// Write `size` bytes from `source` as the part at `index`. Indices
    /// must be unique; re-writing an index replaces the prior payload.
    /// Returns bytes written and the recorded [`Part`].
    async fn write_multipart(
        &self,
        obj: &Object,
        source: Bytes,
        size: u64,
        index: usize,
    ) -> StorageResult<(u64, Part)>;

    /// Enumerate the parts written so far. Valid pre-completion only.
    async fn list_multipart(&self, obj: &Object) -> StorageResult<PartIterator>;

    /// Complete the session from the listed parts. The object's mode flips
    /// PART→READ and the multipart id becomes invalid for further calls.
    async fn complete_multipart(&self, obj: &Object, parts: &[Part]) -> StorageResult<()>;
}

/// Pre-signing capability for whole-object read and write.
///
/// Signers perform no I/O and are therefore synchronous. Executing a
/// returned request unmodified within the expiry window must have the same
/// observable effect as the corresponding direct call.
pub trait StorageHttpSigner: Send + Sync {
    /// Pre-sign a whole-object read of `path`, valid for `expires_in`.
    fn presign_read(&self, path: &str, expires_in: Duration) -> StorageResult<PresignedRequest>;

    /// Pre-sign a whole-object write of `size` bytes to `path`. The caller
    /// must attach the body and content length before sending.
    fn presign_write(
        &self,
        path: &str,
        size: u64,
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest>;
}

/// Pre-signing capability for the multipart protocol.
pub trait MultipartHttpSigner: Send + Sync {
    /// Pre-sign a create-multipart call for `path`.
    fn presign_create_multipart(
        &self,
        path: &str,
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest>;

    /// Pre-sign a write of `size` bytes as the part at `index`.
    fn presign_write_multipart(
        &self,
        obj: &Object,
        size: u64,
        index: usize,
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest>;

    /// Pre-sign a list of the parts written so far.
    fn presign_list_multipart(
        &self,
        obj: &Object,
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest>;

    /// Pre-sign the completion of the session from the listed parts.
    fn presign_complete_multipart(
        &self,
        obj: &Object,
        parts: &[Part],
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest>;
}
