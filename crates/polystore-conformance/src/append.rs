//! Append capability checks.

use polystore_types::{Appender, Pairs, StorageResult, Storager};
use tracing::debug;

use crate::fixtures::Fixtures;
use crate::storager::digest;

/// Check the [`Appender`] contract.
///
/// # Panics
///
/// Panics on any contract violation.
pub async fn check_appender(
    store: &dyn Storager,
    appender: &dyn Appender,
    fx: &Fixtures,
) -> StorageResult<()> {
    debug!(id = store.id(), "checking append capability");

    let path = fx.path();
    let obj = appender.create_append(&path).await?;
    assert!(obj.mode().is_append(), "a fresh append session is APPEND");
    assert!(!obj.mode().is_read(), "an uncommitted session is not READ");
    assert_eq!(
        obj.append_offset(),
        Some(0),
        "a fresh session starts at offset zero"
    );

    // Writes accumulate in call order.
    let first = fx.content(256);
    let second = fx.content(128);
    let written = appender.write_append(&obj, first.clone(), 256).await?;
    assert_eq!(written, 256, "write_append must report the bytes written");
    appender.write_append(&obj, second.clone(), 128).await?;

    // Re-creating resumes the uncommitted session at its byte count.
    let resumed = appender.create_append(&path).await?;
    assert_eq!(
        resumed.append_offset(),
        Some(384),
        "create_append must resume an uncommitted session at its offset"
    );

    appender.commit_append(&obj).await?;

    let committed = store.stat(&path, Pairs::new()).await?;
    assert!(committed.mode().is_read(), "commit flips APPEND to READ");
    assert!(
        !committed.mode().is_append(),
        "a committed object is no longer APPEND"
    );

    let mut expected = Vec::with_capacity(384);
    expected.extend_from_slice(&first);
    expected.extend_from_slice(&second);
    let read = store.read(&path, Pairs::new()).await?;
    assert_eq!(
        digest(&read),
        digest(&expected),
        "committed content is the concatenation of every write in call order"
    );

    // Delete is idempotent on committed append output, as everywhere.
    store.delete(&path, Pairs::new()).await?;
    store.delete(&path, Pairs::new()).await?;

    // An uncommitted session is discarded by delete; nothing is committed.
    let discarded = fx.path();
    let obj = appender.create_append(&discarded).await?;
    appender.write_append(&obj, fx.content(64), 64).await?;
    store.delete(&discarded, Pairs::new()).await?;
    assert!(
        store
            .read(&discarded, Pairs::new())
            .await
            .is_err_and(|e| e.is_object_not_exist()),
        "a deleted session must leave no object"
    );

    Ok(())
}
