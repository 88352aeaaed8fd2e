//! Rename capability checks.

use polystore_types::{Mover, Pairs, StorageResult, Storager};
use tracing::debug;

use crate::fixtures::Fixtures;
use crate::storager::digest;

/// Check the [`Mover`] contract.
///
/// # Panics
///
/// Panics on any contract violation.
pub async fn check_mover(
    store: &dyn Storager,
    mover: &dyn Mover,
    fx: &Fixtures,
) -> StorageResult<()> {
    debug!(id = store.id(), "checking move capability");

    let src = fx.path();
    let dst = fx.path();
    let content = fx.content(512);
    store
        .write(&src, Some(content.clone()), 512, Pairs::new())
        .await?;

    mover.move_object(&src, &dst).await?;
    assert!(
        store
            .stat(&src, Pairs::new())
            .await
            .is_err_and(|e| e.is_object_not_exist()),
        "the source must not exist after a move"
    );
    let obj = store.stat(&dst, Pairs::new()).await?;
    assert_eq!(
        obj.content_length(),
        Some(512),
        "the destination must report the source's former size"
    );
    let read = store.read(&dst, Pairs::new()).await?;
    assert_eq!(
        digest(&read),
        digest(&content),
        "the destination must hold the source's former content"
    );

    // A pre-existing destination is silently overwritten.
    let src2 = fx.path();
    let winner = fx.content(128);
    store
        .write(&src2, Some(winner.clone()), 128, Pairs::new())
        .await?;
    mover.move_object(&src2, &dst).await?;
    let read = store.read(&dst, Pairs::new()).await?;
    assert_eq!(
        digest(&read),
        digest(&winner),
        "a move must overwrite a pre-existing destination"
    );

    // Moving a missing source fails not-exist and changes nothing.
    let missing = fx.path();
    let untouched = fx.path();
    let err = mover
        .move_object(&missing, &untouched)
        .await
        .expect_err("moving a missing source must fail");
    assert!(
        err.is_object_not_exist(),
        "moving a missing source fails not-exist"
    );
    assert!(
        store
            .stat(&untouched, Pairs::new())
            .await
            .is_err_and(|e| e.is_object_not_exist()),
        "a failed move must not create the destination"
    );

    store.delete(&dst, Pairs::new()).await?;
    Ok(())
}
