//! Multipart capability checks: the full session state machine.

use polystore_types::{Multiparter, Pairs, StorageResult, Storager};
use tracing::debug;

use crate::fixtures::Fixtures;
use crate::storager::digest;

/// Check the [`Multiparter`] contract.
///
/// # Panics
///
/// Panics on any contract violation.
pub async fn check_multiparter(
    store: &dyn Storager,
    multiparter: &dyn Multiparter,
    fx: &Fixtures,
) -> StorageResult<()> {
    debug!(id = store.id(), "checking multipart capability");

    let path = fx.path();
    let obj = multiparter.create_multipart(&path).await?;
    assert!(obj.mode().is_part(), "a fresh session must be PART");
    assert!(!obj.mode().is_read(), "an in-flight session is not READ");
    let id = obj
        .multipart_id()
        .expect("a fresh session must carry a multipart id");
    assert!(!id.is_empty(), "the multipart id must be non-empty");

    // The session is addressable through stat with the multipart-id pair.
    let stat = store
        .stat(&path, Pairs::new().with_multipart_id(id))
        .await?;
    assert!(
        stat.mode().is_part(),
        "stat with the id pair reports the in-flight session"
    );

    // Parts may be written out of index order, at non-contiguous indices.
    let tail = fx.content(512);
    let head = fx.content(256);
    let (written, tail_part) = multiparter
        .write_multipart(&obj, tail.clone(), 512, 9)
        .await?;
    assert_eq!(written, 512, "write_multipart must report the bytes written");
    assert_eq!(tail_part.index, 9, "the part must carry its index");
    assert_eq!(tail_part.size, 512, "the part must carry its size");
    let (_, head_part) = multiparter
        .write_multipart(&obj, head.clone(), 256, 2)
        .await?;

    // Re-writing an index replaces the prior payload.
    let (_, head_part) = multiparter
        .write_multipart(&obj, head.clone(), head_part.size, 2)
        .await?;

    let mut it = multiparter.list_multipart(&obj).await?;
    let listed = it.collect_remaining()?;
    assert_eq!(listed.len(), 2, "both written indices must be listed");

    // Completion assembles ascending by index, not by list or write order.
    multiparter
        .complete_multipart(&obj, &[tail_part, head_part])
        .await?;

    let committed = store.stat(&path, Pairs::new()).await?;
    assert!(committed.mode().is_read(), "complete flips PART to READ");
    assert!(
        !committed.mode().is_part(),
        "a completed object is no longer PART"
    );

    let mut expected = Vec::with_capacity(768);
    expected.extend_from_slice(&head);
    expected.extend_from_slice(&tail);
    let read = store.read(&path, Pairs::new()).await?;
    assert_eq!(
        digest(&read),
        digest(&expected),
        "completed content is the parts concatenated ascending by index"
    );

    // The multipart id is invalid after completion.
    assert!(
        multiparter
            .complete_multipart(&obj, &[head_part])
            .await
            .is_err_and(|e| e.is_object_not_exist()),
        "a repeat complete must fail not-exist"
    );
    assert!(
        multiparter
            .write_multipart(&obj, fx.content(16), 16, 0)
            .await
            .is_err_and(|e| e.is_object_not_exist()),
        "a part write after completion must fail not-exist"
    );
    assert!(
        store
            .stat(&path, Pairs::new().with_multipart_id(id))
            .await
            .is_err_and(|e| e.is_object_not_exist()),
        "stat with the completed id must fail not-exist"
    );

    store.delete(&path, Pairs::new()).await?;

    // Abort: delete with the multipart-id pair, idempotent, commits nothing.
    let abort_path = fx.path();
    let obj = multiparter.create_multipart(&abort_path).await?;
    multiparter
        .write_multipart(&obj, fx.content(64), 64, 0)
        .await?;
    let pairs = Pairs::new().with_multipart_id(
        obj.multipart_id()
            .expect("a fresh session must carry a multipart id"),
    );
    store.delete(&abort_path, pairs.clone()).await?;
    store.delete(&abort_path, pairs).await?;
    assert!(
        store
            .stat(&abort_path, Pairs::new())
            .await
            .is_err_and(|e| e.is_object_not_exist()),
        "an aborted session must leave no object"
    );

    Ok(())
}
