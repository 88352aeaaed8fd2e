//! The capability-detected suite driver.

use polystore_types::{StorageResult, Storager};
use tracing::{debug, info};

use crate::fixtures::Fixtures;
use crate::{
    check_appender, check_dir_lister, check_direr, check_linker, check_mover, check_multiparter,
    check_multipart_signer, check_storage_signer, check_storager,
};

/// Run the core check plus every capability check the backend supports.
///
/// Capability support is detected through the `as_*` probes; a probe
/// returning `None` skips that check silently — absence of a capability is
/// a structural fact, never a failure.
///
/// # Panics
///
/// Panics on any contract violation.
pub async fn run_all(store: &dyn Storager, fx: &Fixtures) -> StorageResult<()> {
    info!(id = store.id(), "running conformance suite");

    check_storager(store, fx).await?;

    if let Some(appender) = store.as_appender() {
        check_appender(store, appender, fx).await?;
    }
    if let Some(direr) = store.as_direr() {
        check_direr(store, direr, fx).await?;
    }
    if let Some(lister) = store.as_dir_lister() {
        check_dir_lister(store, lister, fx).await?;
    }
    if let Some(linker) = store.as_linker() {
        check_linker(store, linker, fx).await?;
    }
    if let Some(mover) = store.as_mover() {
        check_mover(store, mover, fx).await?;
    }
    if let Some(multiparter) = store.as_multiparter() {
        check_multiparter(store, multiparter, fx).await?;
    }
    if let Some(signer) = store.as_storage_signer() {
        check_storage_signer(store, signer, fx).await?;
    }
    if let (Some(multiparter), Some(signer)) =
        (store.as_multiparter(), store.as_multipart_signer())
    {
        check_multipart_signer(store, multiparter, signer, fx).await?;
    }

    debug!(
        id = store.id(),
        capabilities = %store.capabilities(),
        "conformance suite passed"
    );
    Ok(())
}
