//! The in-memory backend: namespace, append sessions, multipart sessions.
//!
//! All state lives in [`DashMap`]s, so a [`MemoryStorage`] is thread-safe
//! and cheap to share behind an `Arc`. Committed entries, uncommitted
//! append sessions, and in-flight multipart sessions live in separate maps:
//! an uncommitted session never shadows a committed object, and aborting a
//! session never disturbs the namespace.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::RngCore;
use tracing::{debug, trace};
use uuid::Uuid;

use polystore_types::{
    Appender, Capabilities, DirLister, Direr, Linker, ListMode, Mover, MultipartHttpSigner,
    Multiparter, Object, ObjectIterator, ObjectMode, Pairs, Part, PartIterator, StorageError,
    StorageHttpSigner, StorageMeta, StorageResult, Storager,
};

/// Maximum link-chain depth followed by `read`. A chain longer than this
/// (including a cycle) behaves as a dangling link.
const MAX_LINK_DEPTH: usize = 8;

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// A committed entry in the namespace.
#[derive(Debug, Clone)]
pub(crate) enum Entry {
    /// A readable object with fully-persisted content.
    File {
        /// The object bytes.
        data: Bytes,
        /// When the content was last written.
        last_modified: DateTime<Utc>,
    },
    /// A directory marker. Directories carry no content.
    Dir,
    /// A link to another path. The target is not validated at creation
    /// time; resolution happens on read.
    Link {
        /// The path the link references.
        target: String,
    },
}

/// An uncommitted append session, keyed by path.
#[derive(Debug, Default)]
struct AppendSession {
    buffer: BytesMut,
}

/// An in-flight multipart session, keyed by multipart id.
#[derive(Debug)]
struct MultipartSession {
    /// The path the completed object will occupy.
    path: String,
    /// Part payloads by index. Indices are unique but need not be
    /// contiguous; completion assembles in ascending index order.
    parts: BTreeMap<usize, Bytes>,
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// Thread-safe in-memory backend implementing the full PolyStore contract.
///
/// # Examples
///
/// ```
/// use polystore_memory::MemoryStorage;
/// use polystore_types::{Pairs, Storager};
///
/// # tokio_test::block_on(async {
/// let store = MemoryStorage::new();
/// store
///     .write("hello.txt", Some("hello".into()), 5, Pairs::new())
///     .await
///     .unwrap();
/// let data = store.read("hello.txt", Pairs::new()).await.unwrap();
/// assert_eq!(data.as_ref(), b"hello");
/// # });
/// ```
pub struct MemoryStorage {
    /// Instance name, part of [`Storager::id`] and of pre-signed URLs.
    pub(crate) name: String,
    /// Per-instance HMAC key for pre-signed requests.
    pub(crate) secret: [u8; 32],
    /// Committed namespace entries by path.
    entries: DashMap<String, Entry>,
    /// Uncommitted append sessions by path.
    appends: DashMap<String, AppendSession>,
    /// In-flight multipart sessions by multipart id.
    uploads: DashMap<String, MultipartSession>,
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .field("appends", &self.appends.len())
            .field("uploads", &self.uploads.len())
            .finish()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Create a backend with a random instance name.
    #[must_use]
    pub fn new() -> Self {
        Self::named(Uuid::new_v4().to_string())
    }

    /// Create a backend with the given instance name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut secret = [0_u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        debug!(name, "creating MemoryStorage");
        Self {
            name,
            secret,
            entries: DashMap::new(),
            appends: DashMap::new(),
            uploads: DashMap::new(),
        }
    }

    /// Resolve `path` through any link chain to readable content.
    ///
    /// Chains deeper than [`MAX_LINK_DEPTH`] (cycles included) behave as
    /// dangling links and report not-exist.
    fn resolve_data(&self, path: &str) -> StorageResult<Bytes> {
        let mut current = path.to_owned();
        for _ in 0..=MAX_LINK_DEPTH {
            let next = match self.entries.get(&current) {
                None => return Err(StorageError::not_exist(&current)),
                Some(entry) => match entry.value() {
                    Entry::File { data, .. } => return Ok(data.clone()),
                    Entry::Dir => {
                        return Err(StorageError::invalid_argument(format!(
                            "path is a directory: {current}"
                        )));
                    }
                    Entry::Link { target } => target.clone(),
                },
            };
            current = next;
        }
        Err(StorageError::not_exist(path))
    }

    /// Describe the committed entry at `path` as an [`Object`].
    fn entry_object(path: &str, entry: &Entry) -> Object {
        match entry {
            Entry::File {
                data,
                last_modified,
            } => Object::new(path, ObjectMode::READ)
                .with_content_length(data.len() as u64)
                .with_last_modified(*last_modified),
            Entry::Dir => Object::new(path, ObjectMode::DIR),
            Entry::Link { target } => Object::new(path, ObjectMode::LINK).with_link_target(target),
        }
    }

    /// Describe the in-flight multipart session for `id`, or fail
    /// not-exist.
    fn stat_multipart(&self, path: &str, id: &str) -> StorageResult<Object> {
        let session = self
            .uploads
            .get(id)
            .ok_or_else(|| StorageError::not_exist(id))?;
        if session.path != path {
            return Err(StorageError::not_exist(path));
        }
        let total: u64 = session.parts.values().map(|d| d.len() as u64).sum();
        Ok(Object::new(path, ObjectMode::PART)
            .with_multipart_id(id)
            .with_content_length(total))
    }

    /// List the immediate children of `path`, subdirectories summarized
    /// once each.
    fn list_dir_entries(&self, prefix: &str) -> Vec<Object> {
        let mut files = Vec::new();
        let mut dirs = BTreeSet::new();
        for entry in &self.entries {
            let Some(rest) = entry.key().strip_prefix(prefix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            if let Some((child, _)) = rest.split_once('/') {
                dirs.insert(format!("{prefix}{child}"));
            } else {
                files.push(Self::entry_object(entry.key(), entry.value()));
            }
        }
        // A subdirectory that also has an explicit Dir entry would appear
        // twice; the explicit entry wins.
        files.retain(|obj| !dirs.contains(obj.path()));
        let mut out: Vec<Object> = dirs
            .into_iter()
            .map(|path| Object::new(path, ObjectMode::DIR))
            .collect();
        out.extend(files);
        out.sort_by(|a, b| a.path().cmp(b.path()));
        out
    }

    /// List every committed entry under `path`, nested entries included.
    fn list_prefix_entries(&self, prefix: &str) -> Vec<Object> {
        let mut out: Vec<Object> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| Self::entry_object(entry.key(), entry.value()))
            .collect();
        out.sort_by(|a, b| a.path().cmp(b.path()));
        out
    }

    /// List every in-flight multipart session under `path`.
    fn list_part_entries(&self, prefix: &str) -> Vec<Object> {
        let mut out: Vec<Object> = self
            .uploads
            .iter()
            .filter(|session| session.path.starts_with(prefix))
            .map(|session| {
                Object::new(session.path.clone(), ObjectMode::PART)
                    .with_multipart_id(session.key().clone())
            })
            .collect();
        out.sort_by(|a, b| a.path().cmp(b.path()));
        out
    }
}

/// The listing prefix for `path`: the path with a trailing separator, or
/// empty for the root.
fn child_prefix(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

/// Validate a `(source, size)` pair and return exactly `size` payload
/// bytes.
///
/// An absent source is only valid for a zero size; a size exceeding the
/// source length is invalid; a size below it truncates.
fn take_payload(source: Option<Bytes>, size: u64) -> StorageResult<Bytes> {
    let wanted = usize::try_from(size)
        .map_err(|_| StorageError::invalid_argument(format!("size {size} exceeds address space")))?;
    match source {
        None if wanted == 0 => Ok(Bytes::new()),
        None => Err(StorageError::invalid_argument(format!(
            "no source provided for a write of {size} bytes"
        ))),
        Some(data) if wanted > data.len() => Err(StorageError::invalid_argument(format!(
            "size {size} exceeds source length {}",
            data.len()
        ))),
        Some(data) => Ok(data.slice(..wanted)),
    }
}

// ---------------------------------------------------------------------------
// Storager
// ---------------------------------------------------------------------------

#[async_trait]
impl Storager for MemoryStorage {
    fn id(&self) -> String {
        format!("memory://{}", self.name)
    }

    fn metadata(&self) -> StorageMeta {
        StorageMeta::new("memory")
            .with_capabilities(self.capabilities())
            .with_default_list_mode(ListMode::Dir)
    }

    async fn read(&self, path: &str, pairs: Pairs) -> StorageResult<Bytes> {
        let data = self.resolve_data(path)?;
        let data = match pairs.size {
            Some(cap) => {
                let cap = usize::try_from(cap).unwrap_or(usize::MAX);
                data.slice(..cap.min(data.len()))
            }
            None => data,
        };
        trace!(path, size = data.len(), "read object");
        Ok(data)
    }

    async fn write(
        &self,
        path: &str,
        source: Option<Bytes>,
        size: u64,
        _pairs: Pairs,
    ) -> StorageResult<u64> {
        let data = take_payload(source, size)?;
        let written = data.len() as u64;
        trace!(path, size = written, "write object");
        self.entries.insert(
            path.to_owned(),
            Entry::File {
                data,
                last_modified: Utc::now(),
            },
        );
        Ok(written)
    }

    async fn stat(&self, path: &str, pairs: Pairs) -> StorageResult<Object> {
        if let Some(id) = &pairs.multipart_id {
            return self.stat_multipart(path, id);
        }
        if let Some(entry) = self.entries.get(path) {
            return Ok(Self::entry_object(path, entry.value()));
        }
        if let Some(session) = self.appends.get(path) {
            return Ok(Object::new(path, ObjectMode::APPEND)
                .with_append_offset(session.buffer.len() as u64));
        }
        Err(StorageError::not_exist(path))
    }

    async fn delete(&self, path: &str, pairs: Pairs) -> StorageResult<()> {
        if let Some(id) = &pairs.multipart_id {
            if self.uploads.remove(id).is_some() {
                debug!(path, id, "aborted multipart session");
            }
            return Ok(());
        }
        let removed_entry = self.entries.remove(path).is_some();
        let removed_append = self.appends.remove(path).is_some();
        if removed_entry || removed_append {
            trace!(path, "deleted object");
        }
        Ok(())
    }

    async fn list(&self, path: &str, pairs: Pairs) -> StorageResult<ObjectIterator> {
        let mode = pairs.list_mode.unwrap_or(ListMode::Dir);
        let prefix = child_prefix(path);
        let objects = match mode {
            ListMode::Dir => self.list_dir_entries(&prefix),
            ListMode::Prefix => self.list_prefix_entries(&prefix),
            ListMode::Part => self.list_part_entries(&prefix),
        };
        trace!(path, ?mode, count = objects.len(), "list objects");
        Ok(ObjectIterator::from_vec(objects))
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::APPEND
            | Capabilities::DIR
            | Capabilities::LINK
            | Capabilities::MOVE
            | Capabilities::MULTIPART
            | Capabilities::DIR_LIST
            | Capabilities::SIGN
            | Capabilities::SIGN_MULTIPART
    }

    fn as_appender(&self) -> Option<&dyn Appender> {
        Some(self)
    }

    fn as_direr(&self) -> Option<&dyn Direr> {
        Some(self)
    }

    fn as_dir_lister(&self) -> Option<&dyn DirLister> {
        Some(self)
    }

    fn as_linker(&self) -> Option<&dyn Linker> {
        Some(self)
    }

    fn as_mover(&self) -> Option<&dyn Mover> {
        Some(self)
    }

    fn as_multiparter(&self) -> Option<&dyn Multiparter> {
        Some(self)
    }

    fn as_storage_signer(&self) -> Option<&dyn StorageHttpSigner> {
        Some(self)
    }

    fn as_multipart_signer(&self) -> Option<&dyn MultipartHttpSigner> {
        Some(self)
    }
}

// ---------------------------------------------------------------------------
// Appender
// ---------------------------------------------------------------------------

#[async_trait]
impl Appender for MemoryStorage {
    async fn create_append(&self, path: &str) -> StorageResult<Object> {
        let offset = match self.appends.get(path) {
            Some(session) => session.buffer.len() as u64,
            None => {
                self.appends
                    .insert(path.to_owned(), AppendSession::default());
                debug!(path, "created append session");
                0
            }
        };
        Ok(Object::new(path, ObjectMode::APPEND).with_append_offset(offset))
    }

    async fn write_append(&self, obj: &Object, source: Bytes, size: u64) -> StorageResult<u64> {
        let data = take_payload(Some(source), size)?;
        let mut session = self
            .appends
            .get_mut(obj.path())
            .ok_or_else(|| StorageError::not_exist(obj.path()))?;
        session.buffer.extend_from_slice(&data);
        trace!(
            path = obj.path(),
            size = data.len(),
            offset = session.buffer.len(),
            "appended data"
        );
        Ok(data.len() as u64)
    }

    async fn commit_append(&self, obj: &Object) -> StorageResult<()> {
        let (path, session) = self
            .appends
            .remove(obj.path())
            .ok_or_else(|| StorageError::not_exist(obj.path()))?;
        let size = session.buffer.len();
        self.entries.insert(
            path.clone(),
            Entry::File {
                data: session.buffer.freeze(),
                last_modified: Utc::now(),
            },
        );
        debug!(path, size, "committed append session");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Direr / DirLister
// ---------------------------------------------------------------------------

#[async_trait]
impl Direr for MemoryStorage {
    async fn create_dir(&self, path: &str) -> StorageResult<Object> {
        self.entries.insert(path.to_owned(), Entry::Dir);
        debug!(path, "created directory");
        Ok(Object::new(path, ObjectMode::DIR))
    }
}

#[async_trait]
impl DirLister for MemoryStorage {
    async fn list_dir(&self, path: &str) -> StorageResult<ObjectIterator> {
        let objects = self.list_dir_entries(&child_prefix(path));
        trace!(path, count = objects.len(), "list directory");
        Ok(ObjectIterator::from_vec(objects))
    }
}

// ---------------------------------------------------------------------------
// Linker / Mover
// ---------------------------------------------------------------------------

#[async_trait]
impl Linker for MemoryStorage {
    async fn create_link(&self, path: &str, target: &str) -> StorageResult<Object> {
        self.entries.insert(
            path.to_owned(),
            Entry::Link {
                target: target.to_owned(),
            },
        );
        debug!(path, target, "created link");
        Ok(Object::new(path, ObjectMode::LINK).with_link_target(target))
    }
}

#[async_trait]
impl Mover for MemoryStorage {
    async fn move_object(&self, src: &str, dst: &str) -> StorageResult<()> {
        let (_, entry) = self
            .entries
            .remove(src)
            .ok_or_else(|| StorageError::not_exist(src))?;
        self.entries.insert(dst.to_owned(), entry);
        debug!(src, dst, "moved object");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Multiparter
// ---------------------------------------------------------------------------

/// The multipart id carried by `obj`, or an invalid-argument error.
pub(crate) fn multipart_id(obj: &Object) -> StorageResult<&str> {
    obj.multipart_id().ok_or_else(|| {
        StorageError::invalid_argument(format!("object {} carries no multipart id", obj.path()))
    })
}

#[async_trait]
impl Multiparter for MemoryStorage {
    async fn create_multipart(&self, path: &str) -> StorageResult<Object> {
        let id = Uuid::new_v4().to_string();
        self.uploads.insert(
            id.clone(),
            MultipartSession {
                path: path.to_owned(),
                parts: BTreeMap::new(),
            },
        );
        debug!(path, id, "created multipart session");
        Ok(Object::new(path, ObjectMode::PART).with_multipart_id(id))
    }

    async fn write_multipart(
        &self,
        obj: &Object,
        source: Bytes,
        size: u64,
        index: usize,
    ) -> StorageResult<(u64, Part)> {
        let id = multipart_id(obj)?;
        let data = take_payload(Some(source), size)?;
        let mut session = self
            .uploads
            .get_mut(id)
            .ok_or_else(|| StorageError::not_exist(id))?;
        let written = data.len() as u64;
        session.parts.insert(index, data);
        trace!(id, index, size = written, "wrote multipart part");
        Ok((
            written,
            Part {
                index,
                size: written,
            },
        ))
    }

    async fn list_multipart(&self, obj: &Object) -> StorageResult<PartIterator> {
        let id = multipart_id(obj)?;
        let session = self
            .uploads
            .get(id)
            .ok_or_else(|| StorageError::not_exist(id))?;
        let parts: Vec<Part> = session
            .parts
            .iter()
            .map(|(&index, data)| Part {
                index,
                size: data.len() as u64,
            })
            .collect();
        Ok(PartIterator::from_vec(parts))
    }

    async fn complete_multipart(&self, obj: &Object, parts: &[Part]) -> StorageResult<()> {
        let id = multipart_id(obj)?;
        {
            let session = self
                .uploads
                .get(id)
                .ok_or_else(|| StorageError::not_exist(id))?;
            for part in parts {
                if !session.parts.contains_key(&part.index) {
                    return Err(StorageError::invalid_argument(format!(
                        "part index {} was never written",
                        part.index
                    )));
                }
            }
        }
        let Some((_, session)) = self.uploads.remove(id) else {
            return Err(StorageError::not_exist(id));
        };

        // Assemble the listed parts in ascending index order, regardless of
        // the order they were written or listed in.
        let mut indices: Vec<usize> = parts.iter().map(|p| p.index).collect();
        indices.sort_unstable();
        indices.dedup();
        let mut combined = BytesMut::new();
        for index in &indices {
            if let Some(data) = session.parts.get(index) {
                combined.extend_from_slice(data);
            }
        }

        let size = combined.len();
        self.entries.insert(
            session.path.clone(),
            Entry::File {
                data: combined.freeze(),
                last_modified: Utc::now(),
            },
        );
        debug!(
            path = session.path,
            id,
            size,
            parts = indices.len(),
            "completed multipart session"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStorage {
        MemoryStorage::named("test")
    }

    // -----------------------------------------------------------------------
    // Core write / read / stat
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_should_write_and_read_object() {
        let store = store();
        let written = store
            .write("a/b.txt", Some(Bytes::from("hello world")), 11, Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("write failed: {e}"));
        assert_eq!(written, 11);

        let data = store
            .read("a/b.txt", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("read failed: {e}"));
        assert_eq!(data.as_ref(), b"hello world");
    }

    #[tokio::test]
    async fn test_should_truncate_write_when_size_below_source() {
        let store = store();
        let written = store
            .write("t.bin", Some(Bytes::from("hello world")), 5, Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("write failed: {e}"));
        assert_eq!(written, 5);

        let data = store
            .read("t.bin", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("read failed: {e}"));
        assert_eq!(data.as_ref(), b"hello");
    }

    #[tokio::test]
    async fn test_should_write_zero_length_object_without_source() {
        let store = store();
        let written = store
            .write("empty", None, 0, Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("write failed: {e}"));
        assert_eq!(written, 0);

        let obj = store
            .stat("empty", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("stat failed: {e}"));
        assert_eq!(obj.content_length(), Some(0));
    }

    #[tokio::test]
    async fn test_should_fail_atomically_without_source_for_positive_size() {
        let store = store();
        let err = store
            .write("ghost", None, 10, Pairs::new())
            .await
            .expect_err("write must fail");
        assert_eq!(err.kind(), polystore_types::ErrorKind::InvalidArgument);

        // No partial object became observable.
        let stat = store.stat("ghost", Pairs::new()).await;
        assert!(stat.is_err_and(|e| e.is_object_not_exist()));
    }

    #[tokio::test]
    async fn test_should_fail_when_size_exceeds_source() {
        let store = store();
        let err = store
            .write("short", Some(Bytes::from("abc")), 10, Pairs::new())
            .await
            .expect_err("write must fail");
        assert_eq!(err.kind(), polystore_types::ErrorKind::InvalidArgument);
        assert!(
            store
                .stat("short", Pairs::new())
                .await
                .is_err_and(|e| e.is_object_not_exist())
        );
    }

    #[tokio::test]
    async fn test_should_cap_read_with_size_pair() {
        let store = store();
        store
            .write("cap", Some(Bytes::from("hello world")), 11, Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("write failed: {e}"));

        let data = store
            .read("cap", Pairs::new().with_size(5))
            .await
            .unwrap_or_else(|e| panic!("read failed: {e}"));
        assert_eq!(data.as_ref(), b"hello");

        // A cap above the length returns everything.
        let data = store
            .read("cap", Pairs::new().with_size(100))
            .await
            .unwrap_or_else(|e| panic!("read failed: {e}"));
        assert_eq!(data.as_ref(), b"hello world");
    }

    #[tokio::test]
    async fn test_should_return_not_exist_for_absent_path() {
        let store = store();
        assert!(
            store
                .read("missing", Pairs::new())
                .await
                .is_err_and(|e| e.is_object_not_exist())
        );
        assert!(
            store
                .stat("missing", Pairs::new())
                .await
                .is_err_and(|e| e.is_object_not_exist())
        );
    }

    #[tokio::test]
    async fn test_should_overwrite_on_repeat_write() {
        let store = store();
        store
            .write("o", Some(Bytes::from("first")), 5, Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("write1 failed: {e}"));
        store
            .write("o", Some(Bytes::from("second")), 6, Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("write2 failed: {e}"));

        let data = store
            .read("o", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("read failed: {e}"));
        assert_eq!(data.as_ref(), b"second");
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_should_delete_idempotently() {
        let store = store();
        store
            .write("d", Some(Bytes::from("x")), 1, Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("write failed: {e}"));

        store
            .delete("d", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("delete failed: {e}"));
        // Double delete succeeds.
        store
            .delete("d", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("second delete failed: {e}"));

        assert!(
            store
                .stat("d", Pairs::new())
                .await
                .is_err_and(|e| e.is_object_not_exist())
        );
    }

    // -----------------------------------------------------------------------
    // List
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_should_list_immediate_children_in_dir_mode() {
        let store = store();
        for path in ["dir/a", "dir/b", "dir/sub/c", "other/x"] {
            store
                .write(path, Some(Bytes::from("data")), 4, Pairs::new())
                .await
                .unwrap_or_else(|e| panic!("write {path} failed: {e}"));
        }

        let mut it = store
            .list("dir", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("list failed: {e}"));
        let children = it
            .collect_remaining()
            .unwrap_or_else(|e| panic!("collect failed: {e}"));

        let paths: Vec<&str> = children.iter().map(Object::path).collect();
        assert_eq!(paths, vec!["dir/a", "dir/b", "dir/sub"]);
        assert!(children[2].mode().is_dir());
    }

    #[tokio::test]
    async fn test_should_list_all_descendants_in_prefix_mode() {
        let store = store();
        for path in ["p/a", "p/sub/b", "p/sub/deep/c"] {
            store
                .write(path, Some(Bytes::from("x")), 1, Pairs::new())
                .await
                .unwrap_or_else(|e| panic!("write {path} failed: {e}"));
        }

        let mut it = store
            .list("p", Pairs::new().with_list_mode(ListMode::Prefix))
            .await
            .unwrap_or_else(|e| panic!("list failed: {e}"));
        let all = it
            .collect_remaining()
            .unwrap_or_else(|e| panic!("collect failed: {e}"));
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_should_list_inflight_sessions_in_part_mode() {
        let store = store();
        let obj = store
            .create_multipart("m/upload.bin")
            .await
            .unwrap_or_else(|e| panic!("create_multipart failed: {e}"));

        let mut it = store
            .list("m", Pairs::new().with_list_mode(ListMode::Part))
            .await
            .unwrap_or_else(|e| panic!("list failed: {e}"));
        let sessions = it
            .collect_remaining()
            .unwrap_or_else(|e| panic!("collect failed: {e}"));
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].multipart_id(), obj.multipart_id());
        assert!(sessions[0].mode().is_part());
    }

    #[tokio::test]
    async fn test_should_yield_done_sentinel_for_empty_dir() {
        let store = store();
        store
            .create_dir("empty")
            .await
            .unwrap_or_else(|e| panic!("create_dir failed: {e}"));

        let mut it = store
            .list("empty", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("list failed: {e}"));
        assert!(it.next().is_err_and(|e| e.is_iteration_done()));
    }

    // -----------------------------------------------------------------------
    // Append
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_should_append_in_call_order_and_commit() {
        let store = store();
        let obj = store
            .create_append("log")
            .await
            .unwrap_or_else(|e| panic!("create_append failed: {e}"));
        assert!(obj.mode().is_append());
        assert_eq!(obj.must_append_offset(), 0);

        store
            .write_append(&obj, Bytes::from("hello "), 6)
            .await
            .unwrap_or_else(|e| panic!("append1 failed: {e}"));
        store
            .write_append(&obj, Bytes::from("world"), 5)
            .await
            .unwrap_or_else(|e| panic!("append2 failed: {e}"));

        // Re-creating resumes at the accumulated offset.
        let resumed = store
            .create_append("log")
            .await
            .unwrap_or_else(|e| panic!("resume failed: {e}"));
        assert_eq!(resumed.must_append_offset(), 11);

        store
            .commit_append(&obj)
            .await
            .unwrap_or_else(|e| panic!("commit failed: {e}"));

        let committed = store
            .stat("log", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("stat failed: {e}"));
        assert!(committed.mode().is_read());
        assert!(!committed.mode().is_append());

        let data = store
            .read("log", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("read failed: {e}"));
        assert_eq!(data.as_ref(), b"hello world");
    }

    #[tokio::test]
    async fn test_should_fail_append_write_without_session() {
        let store = store();
        let obj = Object::new("nosession", ObjectMode::APPEND).with_append_offset(0);
        let err = store
            .write_append(&obj, Bytes::from("x"), 1)
            .await
            .expect_err("write_append must fail");
        assert!(err.is_object_not_exist());
    }

    #[tokio::test]
    async fn test_should_delete_uncommitted_append_session() {
        let store = store();
        let obj = store
            .create_append("tmp")
            .await
            .unwrap_or_else(|e| panic!("create_append failed: {e}"));
        store
            .write_append(&obj, Bytes::from("data"), 4)
            .await
            .unwrap_or_else(|e| panic!("append failed: {e}"));

        store
            .delete("tmp", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("delete failed: {e}"));

        // Session is gone; a fresh create starts at offset zero.
        let fresh = store
            .create_append("tmp")
            .await
            .unwrap_or_else(|e| panic!("re-create failed: {e}"));
        assert_eq!(fresh.must_append_offset(), 0);
    }

    // -----------------------------------------------------------------------
    // Dir / Link / Move
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_should_create_dir_idempotently() {
        let store = store();
        let first = store
            .create_dir("d")
            .await
            .unwrap_or_else(|e| panic!("create_dir failed: {e}"));
        let second = store
            .create_dir("d")
            .await
            .unwrap_or_else(|e| panic!("repeat create_dir failed: {e}"));
        assert!(first.mode().is_dir());
        assert!(second.mode().is_dir());
        assert!(first.content_length().is_none());
    }

    #[tokio::test]
    async fn test_should_follow_link_to_current_target_content() {
        let store = store();
        store
            .write("target", Some(Bytes::from("v1")), 2, Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("write failed: {e}"));
        let link = store
            .create_link("alias", "target")
            .await
            .unwrap_or_else(|e| panic!("create_link failed: {e}"));
        assert!(link.mode().is_link());
        assert!(!link.mode().is_read());
        assert_eq!(link.link_target(), Some("target"));

        let data = store
            .read("alias", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("read failed: {e}"));
        assert_eq!(data.as_ref(), b"v1");

        // The link is a live reference.
        store
            .write("target", Some(Bytes::from("v2")), 2, Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("rewrite failed: {e}"));
        let data = store
            .read("alias", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("re-read failed: {e}"));
        assert_eq!(data.as_ref(), b"v2");
    }

    #[tokio::test]
    async fn test_should_permit_dangling_link_until_target_written() {
        let store = store();
        store
            .create_link("dangling", "nowhere")
            .await
            .unwrap_or_else(|e| panic!("create_link failed: {e}"));

        // The link itself exists.
        let obj = store
            .stat("dangling", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("stat failed: {e}"));
        assert!(obj.mode().is_link());

        // Reading through it fails until the target is written.
        assert!(
            store
                .read("dangling", Pairs::new())
                .await
                .is_err_and(|e| e.is_object_not_exist())
        );

        store
            .write("nowhere", Some(Bytes::from("now here")), 8, Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("write failed: {e}"));
        let data = store
            .read("dangling", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("read failed: {e}"));
        assert_eq!(data.as_ref(), b"now here");
    }

    #[tokio::test]
    async fn test_should_treat_link_cycle_as_dangling() {
        let store = store();
        store
            .create_link("a", "b")
            .await
            .unwrap_or_else(|e| panic!("link a failed: {e}"));
        store
            .create_link("b", "a")
            .await
            .unwrap_or_else(|e| panic!("link b failed: {e}"));

        assert!(
            store
                .read("a", Pairs::new())
                .await
                .is_err_and(|e| e.is_object_not_exist())
        );
    }

    #[tokio::test]
    async fn test_should_move_object_and_overwrite_destination() {
        let store = store();
        store
            .write("src", Some(Bytes::from("payload")), 7, Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("write src failed: {e}"));
        store
            .write("dst", Some(Bytes::from("old")), 3, Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("write dst failed: {e}"));

        store
            .move_object("src", "dst")
            .await
            .unwrap_or_else(|e| panic!("move failed: {e}"));

        assert!(
            store
                .stat("src", Pairs::new())
                .await
                .is_err_and(|e| e.is_object_not_exist())
        );
        let data = store
            .read("dst", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("read dst failed: {e}"));
        assert_eq!(data.as_ref(), b"payload");
    }

    #[tokio::test]
    async fn test_should_fail_move_of_missing_source() {
        let store = store();
        let err = store
            .move_object("ghost", "dst")
            .await
            .expect_err("move must fail");
        assert!(err.is_object_not_exist());
        assert!(
            store
                .stat("dst", Pairs::new())
                .await
                .is_err_and(|e| e.is_object_not_exist())
        );
    }

    // -----------------------------------------------------------------------
    // Multipart
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_should_assemble_parts_by_index_regardless_of_write_order() {
        let store = store();
        let obj = store
            .create_multipart("big.bin")
            .await
            .unwrap_or_else(|e| panic!("create failed: {e}"));
        assert!(obj.mode().is_part());
        assert!(!obj.mode().is_read());

        // Write the second part first; indices need not be contiguous.
        let (_, p5) = store
            .write_multipart(&obj, Bytes::from("world"), 5, 5)
            .await
            .unwrap_or_else(|e| panic!("write part 5 failed: {e}"));
        let (_, p1) = store
            .write_multipart(&obj, Bytes::from("hello "), 6, 1)
            .await
            .unwrap_or_else(|e| panic!("write part 1 failed: {e}"));

        store
            .complete_multipart(&obj, &[p5, p1])
            .await
            .unwrap_or_else(|e| panic!("complete failed: {e}"));

        let data = store
            .read("big.bin", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("read failed: {e}"));
        assert_eq!(data.as_ref(), b"hello world");

        let committed = store
            .stat("big.bin", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("stat failed: {e}"));
        assert!(committed.mode().is_read());
        assert!(!committed.mode().is_part());
    }

    #[tokio::test]
    async fn test_should_stat_inflight_session_with_multipart_id_pair() {
        let store = store();
        let obj = store
            .create_multipart("up.bin")
            .await
            .unwrap_or_else(|e| panic!("create failed: {e}"));
        store
            .write_multipart(&obj, Bytes::from("data"), 4, 0)
            .await
            .unwrap_or_else(|e| panic!("write part failed: {e}"));

        let stat = store
            .stat(
                "up.bin",
                Pairs::new().with_multipart_id(obj.must_multipart_id()),
            )
            .await
            .unwrap_or_else(|e| panic!("stat failed: {e}"));
        assert!(stat.mode().is_part());
        assert_eq!(stat.content_length(), Some(4));
    }

    #[tokio::test]
    async fn test_should_replace_part_on_index_rewrite() {
        let store = store();
        let obj = store
            .create_multipart("r.bin")
            .await
            .unwrap_or_else(|e| panic!("create failed: {e}"));

        store
            .write_multipart(&obj, Bytes::from("old-old-old"), 11, 0)
            .await
            .unwrap_or_else(|e| panic!("write failed: {e}"));
        let (_, part) = store
            .write_multipart(&obj, Bytes::from("new"), 3, 0)
            .await
            .unwrap_or_else(|e| panic!("rewrite failed: {e}"));

        let mut it = store
            .list_multipart(&obj)
            .await
            .unwrap_or_else(|e| panic!("list failed: {e}"));
        let parts = it
            .collect_remaining()
            .unwrap_or_else(|e| panic!("collect failed: {e}"));
        assert_eq!(parts, vec![Part { index: 0, size: 3 }]);

        store
            .complete_multipart(&obj, &[part])
            .await
            .unwrap_or_else(|e| panic!("complete failed: {e}"));
        let data = store
            .read("r.bin", Pairs::new())
            .await
            .unwrap_or_else(|e| panic!("read failed: {e}"));
        assert_eq!(data.as_ref(), b"new");
    }

    #[tokio::test]
    async fn test_should_invalidate_multipart_id_after_complete() {
        let store = store();
        let obj = store
            .create_multipart("once.bin")
            .await
            .unwrap_or_else(|e| panic!("create failed: {e}"));
        let (_, part) = store
            .write_multipart(&obj, Bytes::from("x"), 1, 0)
            .await
            .unwrap_or_else(|e| panic!("write failed: {e}"));
        store
            .complete_multipart(&obj, &[part])
            .await
            .unwrap_or_else(|e| panic!("complete failed: {e}"));

        let err = store
            .complete_multipart(&obj, &[part])
            .await
            .expect_err("repeat complete must fail");
        assert!(err.is_object_not_exist());

        let err = store
            .write_multipart(&obj, Bytes::from("y"), 1, 1)
            .await
            .expect_err("post-complete write must fail");
        assert!(err.is_object_not_exist());
    }

    #[tokio::test]
    async fn test_should_abort_multipart_via_delete_with_id_pair() {
        let store = store();
        let obj = store
            .create_multipart("abort.bin")
            .await
            .unwrap_or_else(|e| panic!("create failed: {e}"));
        store
            .write_multipart(&obj, Bytes::from("data"), 4, 0)
            .await
            .unwrap_or_else(|e| panic!("write failed: {e}"));

        let pairs = Pairs::new().with_multipart_id(obj.must_multipart_id());
        store
            .delete("abort.bin", pairs.clone())
            .await
            .unwrap_or_else(|e| panic!("abort failed: {e}"));
        // Abort is idempotent.
        store
            .delete("abort.bin", pairs)
            .await
            .unwrap_or_else(|e| panic!("repeat abort failed: {e}"));

        // The session is gone and no object was committed.
        assert!(
            store
                .stat("abort.bin", Pairs::new())
                .await
                .is_err_and(|e| e.is_object_not_exist())
        );
    }

    #[tokio::test]
    async fn test_should_fail_complete_with_unwritten_index() {
        let store = store();
        let obj = store
            .create_multipart("gap.bin")
            .await
            .unwrap_or_else(|e| panic!("create failed: {e}"));
        let (_, part) = store
            .write_multipart(&obj, Bytes::from("x"), 1, 0)
            .await
            .unwrap_or_else(|e| panic!("write failed: {e}"));

        let err = store
            .complete_multipart(&obj, &[part, Part { index: 7, size: 1 }])
            .await
            .expect_err("complete must fail");
        assert_eq!(err.kind(), polystore_types::ErrorKind::InvalidArgument);

        // The session survives a failed complete.
        let mut it = store
            .list_multipart(&obj)
            .await
            .unwrap_or_else(|e| panic!("list failed: {e}"));
        assert_eq!(
            it.collect_remaining()
                .unwrap_or_else(|e| panic!("collect failed: {e}"))
                .len(),
            1
        );
    }

    // -----------------------------------------------------------------------
    // Metadata & capabilities
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_should_expose_every_capability() {
        let store = store();
        assert_eq!(store.id(), "memory://test");
        let meta = store.metadata();
        assert_eq!(meta.service, "memory");
        assert_eq!(meta.default_list_mode, ListMode::Dir);
        assert!(meta.capabilities.contains(Capabilities::MULTIPART));

        assert!(store.as_appender().is_some());
        assert!(store.as_direr().is_some());
        assert!(store.as_dir_lister().is_some());
        assert!(store.as_linker().is_some());
        assert!(store.as_mover().is_some());
        assert!(store.as_multiparter().is_some());
        assert!(store.as_storage_signer().is_some());
        assert!(store.as_multipart_signer().is_some());
    }
}
