//! Core contract checks: id, metadata, write/read/stat/delete/list.

use polystore_types::{ErrorKind, Pairs, StorageResult, Storager};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::fixtures::Fixtures;

/// Hex SHA-256 of `data`, for content-equality assertions with readable
/// failure messages.
pub(crate) fn digest(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Check the mandatory [`Storager`] contract.
///
/// # Panics
///
/// Panics on any contract violation.
pub async fn check_storager(store: &dyn Storager, fx: &Fixtures) -> StorageResult<()> {
    debug!(id = store.id(), "checking core contract");

    // Identity and metadata are non-empty structural facts.
    assert!(!store.id().is_empty(), "id must be non-empty");
    let meta = store.metadata();
    assert!(!meta.service.is_empty(), "metadata service must be non-empty");

    // Write, then read back byte-identically.
    let path = fx.path();
    let content = fx.content(4096);
    let written = store
        .write(&path, Some(content.clone()), 4096, Pairs::new())
        .await?;
    assert_eq!(written, 4096, "write must report the bytes written");

    let read = store.read(&path, Pairs::new()).await?;
    assert_eq!(
        digest(&read),
        digest(&content),
        "read must return the written content"
    );

    let obj = store.stat(&path, Pairs::new()).await?;
    assert_eq!(obj.path(), path, "stat must report the requested path");
    assert!(obj.mode().is_read(), "a committed object must be readable");
    assert_eq!(
        obj.content_length(),
        Some(4096),
        "stat must report the written length"
    );

    // A repeat write replaces the content.
    let replacement = fx.content(1024);
    store
        .write(&path, Some(replacement.clone()), 1024, Pairs::new())
        .await?;
    let read = store.read(&path, Pairs::new()).await?;
    assert_eq!(
        digest(&read),
        digest(&replacement),
        "overwrite must replace the content"
    );

    // The size argument caps the persisted bytes; a smaller size truncates.
    let truncated_path = fx.path();
    let long = fx.content(1024);
    let written = store
        .write(&truncated_path, Some(long.clone()), 512, Pairs::new())
        .await?;
    assert_eq!(written, 512, "truncating write must report the capped size");
    let read = store.read(&truncated_path, Pairs::new()).await?;
    assert_eq!(
        digest(&read),
        digest(&long[..512]),
        "truncating write must persist exactly the first size bytes"
    );

    // The size pair caps a read.
    let capped = store
        .read(&truncated_path, Pairs::new().with_size(128))
        .await?;
    assert_eq!(
        digest(&capped),
        digest(&long[..128]),
        "the size pair must cap a read"
    );

    // A zero-length object needs no source.
    let empty_path = fx.path();
    let written = store.write(&empty_path, None, 0, Pairs::new()).await?;
    assert_eq!(written, 0, "a zero-length write reports zero bytes");
    let obj = store.stat(&empty_path, Pairs::new()).await?;
    assert_eq!(
        obj.content_length(),
        Some(0),
        "a zero-length object must stat as empty"
    );

    // An absent source with a positive size fails atomically.
    let ghost_path = fx.path();
    let err = store
        .write(&ghost_path, None, 16, Pairs::new())
        .await
        .expect_err("a sourceless write of a positive size must fail");
    assert_eq!(
        err.kind(),
        ErrorKind::InvalidArgument,
        "a sourceless positive write fails invalid-argument"
    );
    let stat = store.stat(&ghost_path, Pairs::new()).await;
    assert!(
        stat.is_err_and(|e| e.is_object_not_exist()),
        "a failed write must leave no partial object"
    );

    // Absent paths report the not-exist sentinel.
    let missing = fx.path();
    assert!(
        store
            .read(&missing, Pairs::new())
            .await
            .is_err_and(|e| e.is_object_not_exist()),
        "reading an absent path fails not-exist"
    );
    assert!(
        store
            .stat(&missing, Pairs::new())
            .await
            .is_err_and(|e| e.is_object_not_exist()),
        "statting an absent path fails not-exist"
    );

    // Delete is idempotent; deleting the absent path is also fine.
    store.delete(&path, Pairs::new()).await?;
    store.delete(&path, Pairs::new()).await?;
    assert!(
        store
            .stat(&path, Pairs::new())
            .await
            .is_err_and(|e| e.is_object_not_exist()),
        "a deleted object must stat not-exist"
    );
    store.delete(&missing, Pairs::new()).await?;

    // Listing a path with no entries yields the done sentinel immediately.
    let mut it = store.list(&fx.path(), Pairs::new()).await?;
    assert!(
        it.next().is_err_and(|e| e.is_iteration_done()),
        "an empty listing must yield the done sentinel on the first pull"
    );
    // The sentinel is persistent.
    assert!(
        it.next().is_err_and(|e| e.is_iteration_done()),
        "the done sentinel must keep being returned"
    );

    // Listing with the default mode set explicitly behaves the same.
    let mut it = store
        .list(
            &fx.path(),
            Pairs::new().with_list_mode(meta.default_list_mode),
        )
        .await?;
    assert!(it.next().is_err_and(|e| e.is_iteration_done()));

    store.delete(&truncated_path, Pairs::new()).await?;
    store.delete(&empty_path, Pairs::new()).await?;
    Ok(())
}
