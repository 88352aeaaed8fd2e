//! Pre-signing capability checks.
//!
//! Signing schemes are backend-specific, so these checks validate the
//! request shape, not the wire format: the signer must succeed without
//! I/O, produce a parsable URL, and produce path-dependent output.
//! Same-effect-as-direct-call execution is a transport concern and is
//! exercised by each backend's own tests.

use std::time::Duration;

use polystore_types::{
    Multiparter, MultipartHttpSigner, PresignedRequest, StorageHttpSigner, StorageResult, Storager,
};
use tracing::debug;

use crate::fixtures::Fixtures;

const EXPIRY: Duration = Duration::from_secs(3600);

fn assert_well_formed(req: &PresignedRequest, what: &str) {
    assert!(!req.url().is_empty(), "{what} must carry a URL");
    let uri = req
        .uri()
        .unwrap_or_else(|e| panic!("{what} must carry a parsable URL: {e}"));
    assert!(uri.query().is_some(), "{what} must carry query parameters");
}

/// Check the [`StorageHttpSigner`] contract.
///
/// # Panics
///
/// Panics on any contract violation.
pub async fn check_storage_signer(
    store: &dyn Storager,
    signer: &dyn StorageHttpSigner,
    fx: &Fixtures,
) -> StorageResult<()> {
    debug!(id = store.id(), "checking sign capability");

    let path = fx.path();
    let read_req = signer.presign_read(&path, EXPIRY)?;
    assert_well_formed(&read_req, "a pre-signed read");
    assert_eq!(
        read_req.method(),
        &http::Method::GET,
        "a pre-signed read must use GET"
    );

    let write_req = signer.presign_write(&path, 1024, EXPIRY)?;
    assert_well_formed(&write_req, "a pre-signed write");
    assert_eq!(
        write_req.method(),
        &http::Method::PUT,
        "a pre-signed write must use PUT"
    );

    // Signatures depend on what is being authorized.
    let other = signer.presign_read(&fx.path(), EXPIRY)?;
    assert_ne!(
        read_req.url(),
        other.url(),
        "pre-signed URLs for distinct paths must differ"
    );
    assert_ne!(
        read_req.url(),
        write_req.url(),
        "pre-signed URLs for distinct operations must differ"
    );
    Ok(())
}

/// Check the [`MultipartHttpSigner`] contract.
///
/// # Panics
///
/// Panics on any contract violation.
pub async fn check_multipart_signer(
    store: &dyn Storager,
    multiparter: &dyn Multiparter,
    signer: &dyn MultipartHttpSigner,
    fx: &Fixtures,
) -> StorageResult<()> {
    debug!(id = store.id(), "checking multipart-sign capability");

    let path = fx.path();
    let create_req = signer.presign_create_multipart(&path, EXPIRY)?;
    assert_well_formed(&create_req, "a pre-signed create-multipart");

    // The remaining operations are signed against a live session object.
    let obj = multiparter.create_multipart(&path).await?;

    let write_req = signer.presign_write_multipart(&obj, 256, 1, EXPIRY)?;
    assert_well_formed(&write_req, "a pre-signed part write");

    let list_req = signer.presign_list_multipart(&obj, EXPIRY)?;
    assert_well_formed(&list_req, "a pre-signed part list");

    let (_, part) = multiparter
        .write_multipart(&obj, fx.content(256), 256, 1)
        .await?;
    let complete_req = signer.presign_complete_multipart(&obj, &[part], EXPIRY)?;
    assert_well_formed(&complete_req, "a pre-signed complete");

    assert_ne!(
        write_req.url(),
        list_req.url(),
        "pre-signed URLs for distinct operations must differ"
    );

    // Abort the working session.
    let pairs = polystore_types::Pairs::new().with_multipart_id(
        obj.multipart_id()
            .expect("a fresh session must carry a multipart id"),
    );
    store.delete(&path, pairs).await?;
    Ok(())
}
