//! Link capability checks, dangling links included.

use polystore_types::{Linker, Pairs, StorageResult, Storager};
use tracing::debug;

use crate::fixtures::Fixtures;
use crate::storager::digest;

/// Check the [`Linker`] contract.
///
/// # Panics
///
/// Panics on any contract violation.
pub async fn check_linker(
    store: &dyn Storager,
    linker: &dyn Linker,
    fx: &Fixtures,
) -> StorageResult<()> {
    debug!(id = store.id(), "checking link capability");

    let target = fx.path();
    let content = fx.content(512);
    store
        .write(&target, Some(content.clone()), 512, Pairs::new())
        .await?;

    let link_path = fx.path();
    let link = linker.create_link(&link_path, &target).await?;
    assert!(link.mode().is_link(), "create_link must return LINK");
    assert!(!link.mode().is_read(), "a link object is not READ");
    assert_eq!(
        link.link_target(),
        Some(target.as_str()),
        "the link must carry its target"
    );

    let stat = store.stat(&link_path, Pairs::new()).await?;
    assert!(stat.mode().is_link(), "stat of a link reports LINK");

    // A read follows the link to the target's current content.
    let read = store.read(&link_path, Pairs::new()).await?;
    assert_eq!(
        digest(&read),
        digest(&content),
        "a read through a link returns the target content"
    );
    let replacement = fx.content(256);
    store
        .write(&target, Some(replacement.clone()), 256, Pairs::new())
        .await?;
    let read = store.read(&link_path, Pairs::new()).await?;
    assert_eq!(
        digest(&read),
        digest(&replacement),
        "a link is a live reference to the target's current content"
    );

    // A dangling link may be created; it exists, but reads through it fail
    // until the target is written.
    let dangling = fx.path();
    let nowhere = fx.path();
    linker.create_link(&dangling, &nowhere).await?;
    let stat = store.stat(&dangling, Pairs::new()).await?;
    assert!(stat.mode().is_link(), "a dangling link itself exists");
    assert!(
        store
            .read(&dangling, Pairs::new())
            .await
            .is_err_and(|e| e.is_object_not_exist()),
        "reading through a dangling link fails not-exist"
    );
    let late = fx.content(64);
    store
        .write(&nowhere, Some(late.clone()), 64, Pairs::new())
        .await?;
    let read = store.read(&dangling, Pairs::new()).await?;
    assert_eq!(
        digest(&read),
        digest(&late),
        "a dangling link resolves once the target is written"
    );

    // Re-creating a link replaces its target atomically.
    linker.create_link(&link_path, &nowhere).await?;
    let read = store.read(&link_path, Pairs::new()).await?;
    assert_eq!(
        digest(&read),
        digest(&late),
        "re-creating a link must replace its target"
    );

    for path in [&target, &link_path, &dangling, &nowhere] {
        store.delete(path, Pairs::new()).await?;
    }
    Ok(())
}
