//! Directory and directory-listing capability checks.

use std::collections::BTreeSet;

use polystore_types::{DirLister, Direr, Pairs, StorageResult, Storager};
use tracing::debug;

use crate::fixtures::Fixtures;

/// Check the [`Direr`] contract.
///
/// # Panics
///
/// Panics on any contract violation.
pub async fn check_direr(
    store: &dyn Storager,
    direr: &dyn Direr,
    fx: &Fixtures,
) -> StorageResult<()> {
    debug!(id = store.id(), "checking dir capability");

    let path = fx.path();
    let obj = direr.create_dir(&path).await?;
    assert!(obj.mode().is_dir(), "create_dir must return a DIR object");
    assert!(
        obj.content_length().is_none() || obj.content_length() == Some(0),
        "a directory carries no content"
    );

    // Idempotent: every repeat call reports DIR.
    let again = direr.create_dir(&path).await?;
    assert!(again.mode().is_dir(), "repeat create_dir must return DIR");

    let stat = store.stat(&path, Pairs::new()).await?;
    assert!(stat.mode().is_dir(), "stat of a directory reports DIR");

    store.delete(&path, Pairs::new()).await?;
    store.delete(&path, Pairs::new()).await?;
    Ok(())
}

/// Check the [`DirLister`] contract.
///
/// # Panics
///
/// Panics on any contract violation.
pub async fn check_dir_lister(
    store: &dyn Storager,
    lister: &dyn DirLister,
    fx: &Fixtures,
) -> StorageResult<()> {
    debug!(id = store.id(), "checking dir-list capability");

    // An empty listing yields the done sentinel on the first pull.
    let mut it = lister.list_dir(&fx.path()).await?;
    assert!(
        it.next().is_err_and(|e| e.is_iteration_done()),
        "an empty directory must yield the done sentinel immediately"
    );

    // Immediate children only: a nested entry must not surface as a file.
    let dir = fx.path();
    let child_a = format!("{dir}/a");
    let child_b = format!("{dir}/b");
    let nested = format!("{dir}/sub/deep");
    for path in [&child_a, &child_b, &nested] {
        store
            .write(path, Some(fx.content(32)), 32, Pairs::new())
            .await?;
    }

    let mut it = lister.list_dir(&dir).await?;
    let children = it.collect_remaining()?;
    let paths: BTreeSet<&str> = children.iter().map(|o| o.path()).collect();

    assert!(paths.contains(child_a.as_str()), "child a must be listed");
    assert!(paths.contains(child_b.as_str()), "child b must be listed");
    assert!(
        !paths.contains(nested.as_str()),
        "a nested entry must not surface as an immediate child"
    );
    for child in &children {
        if child.path() == child_a {
            assert_eq!(
                child.content_length(),
                Some(32),
                "file summaries carry the content length when determinable"
            );
        }
    }

    for path in [&child_a, &child_b, &nested] {
        store.delete(path, Pairs::new()).await?;
    }
    Ok(())
}
