//! Query-string pre-signing for the memory backend.
//!
//! Pre-signed URLs carry the operation and its parameters in query
//! parameters and authenticate them with an HMAC-SHA256 over
//! `method \n path \n canonical-query`:
//!
//! - `X-Ps-Op` - the operation (`read`, `write`, `create_multipart`, ...)
//! - `X-Ps-Date` - issue timestamp, ISO 8601 basic format (`YYYYMMDDTHHMMSSZ`)
//! - `X-Ps-Expires` - validity duration in seconds
//! - `X-Ps-Signature` - the hex-encoded signature
//!
//! plus per-operation parameters (`X-Ps-Size`, `X-Ps-Index`, `X-Ps-Upload`,
//! `X-Ps-Parts`). The canonical query is the sorted, percent-encoded
//! parameter list with the signature excluded.
//!
//! [`MemoryStorage::execute_presigned`] is the transport-free equivalent of
//! sending the request: it verifies the signature in constant time, checks
//! expiry at execution time, and dispatches to the corresponding direct
//! call.

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};
use hmac::{Hmac, Mac};
use http::{HeaderMap, Method};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use polystore_types::{
    MultipartHttpSigner, Multiparter, Object, ObjectMode, Pairs, Part, PresignedRequest,
    StorageError, StorageHttpSigner, StorageResult, Storager,
};

use crate::storage::{MemoryStorage, multipart_id};

type HmacSha256 = Hmac<Sha256>;

/// ISO 8601 basic format used by `X-Ps-Date`.
const DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

const PARAM_OP: &str = "X-Ps-Op";
const PARAM_DATE: &str = "X-Ps-Date";
const PARAM_EXPIRES: &str = "X-Ps-Expires";
const PARAM_SIZE: &str = "X-Ps-Size";
const PARAM_INDEX: &str = "X-Ps-Index";
const PARAM_UPLOAD: &str = "X-Ps-Upload";
const PARAM_PARTS: &str = "X-Ps-Parts";
const PARAM_SIGNATURE: &str = "X-Ps-Signature";

/// Everything except unreserved characters is encoded in query values.
const QUERY_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Path encoding additionally keeps the segment separator.
const PATH_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

// ---------------------------------------------------------------------------
// PresignedOutcome
// ---------------------------------------------------------------------------

/// The result of executing a pre-signed request, mirroring the return value
/// of the corresponding direct call.
#[derive(Debug)]
pub enum PresignedOutcome {
    /// A pre-signed read returned the object bytes.
    Data(Bytes),
    /// A pre-signed write (whole-object or part) returned the bytes written.
    Written(u64),
    /// A pre-signed create-multipart returned the session object.
    Created(Object),
    /// A pre-signed list-multipart returned the parts written so far.
    Parts(Vec<Part>),
    /// A pre-signed complete-multipart succeeded.
    Completed,
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// Sort and percent-encode signing-side parameters into the canonical
/// query string.
fn canonical_query(params: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
        .into_iter()
        .map(|(name, value)| format!("{name}={}", utf8_percent_encode(value, QUERY_ENCODE)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Rebuild the canonical query from parsed (decoded) parameters, with the
/// signature excluded.
fn canonical_query_of(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(name, _)| name.as_str() != PARAM_SIGNATURE)
        .map(|(name, value)| format!("{name}={}", utf8_percent_encode(value, QUERY_ENCODE)))
        .collect::<Vec<_>>()
        .join("&")
}

fn string_to_sign(method: &str, path: &str, canonical: &str) -> String {
    format!("{method}\n{path}\n{canonical}")
}

/// Parse and percent-decode query parameters.
fn parse_params(query: &str) -> BTreeMap<String, String> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .filter_map(|param| {
            let (name, value) = param.split_once('=')?;
            Some((
                name.to_owned(),
                percent_decode_str(value).decode_utf8_lossy().into_owned(),
            ))
        })
        .collect()
}

fn required<'a>(params: &'a BTreeMap<String, String>, name: &str) -> StorageResult<&'a str> {
    params.get(name).map(String::as_str).ok_or_else(|| {
        StorageError::invalid_argument(format!("missing pre-sign parameter: {name}"))
    })
}

fn required_u64(params: &BTreeMap<String, String>, name: &str) -> StorageResult<u64> {
    required(params, name)?.parse().map_err(|_| {
        StorageError::invalid_argument(format!("malformed pre-sign parameter: {name}"))
    })
}

/// Check whether a pre-signed request has expired as of now.
pub(crate) fn check_expiration(timestamp: &str, expires: u64) -> StorageResult<()> {
    let issued = NaiveDateTime::parse_from_str(timestamp, DATE_FORMAT).map_err(|_| {
        StorageError::invalid_argument(format!("malformed pre-sign parameter: {PARAM_DATE}"))
    })?;
    let window =
        chrono::Duration::seconds(i64::try_from(expires).map_err(|_| StorageError::RequestExpired)?);
    if Utc::now().naive_utc() > issued + window {
        return Err(StorageError::RequestExpired);
    }
    Ok(())
}

impl MemoryStorage {
    fn compute_signature(&self, message: &str) -> StorageResult<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| StorageError::Backend(anyhow::anyhow!("hmac key setup failed: {e}")))?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Assemble and sign a pre-signed request issued at `issued_at`.
    pub(crate) fn presign_at(
        &self,
        method: Method,
        path: &str,
        mut params: Vec<(&'static str, String)>,
        expires_in: Duration,
        issued_at: DateTime<Utc>,
    ) -> StorageResult<PresignedRequest> {
        params.push((PARAM_DATE, issued_at.format(DATE_FORMAT).to_string()));
        params.push((PARAM_EXPIRES, expires_in.as_secs().to_string()));
        let canonical = canonical_query(&params);
        let signature =
            self.compute_signature(&string_to_sign(method.as_str(), path, &canonical))?;
        let url = format!(
            "memory://{}/{}?{canonical}&{PARAM_SIGNATURE}={signature}",
            self.name,
            utf8_percent_encode(path, PATH_ENCODE),
        );
        Ok(PresignedRequest::new(method, url, HeaderMap::new()))
    }

    fn presign(
        &self,
        method: Method,
        path: &str,
        params: Vec<(&'static str, String)>,
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest> {
        self.presign_at(method, path, params, expires_in, Utc::now())
    }

    /// Verify and execute a pre-signed request, dispatching to the
    /// corresponding direct call.
    ///
    /// Write-shaped operations take the body that would accompany the HTTP
    /// request as `body`.
    ///
    /// # Errors
    ///
    /// [`StorageError::SignatureMismatch`] if the signature does not
    /// verify, [`StorageError::RequestExpired`] if executed past the expiry
    /// window, plus whatever the dispatched operation reports.
    pub async fn execute_presigned(
        &self,
        req: &PresignedRequest,
        body: Option<Bytes>,
    ) -> StorageResult<PresignedOutcome> {
        let uri = req.uri()?;
        let path = percent_decode_str(uri.path().trim_start_matches('/'))
            .decode_utf8_lossy()
            .into_owned();
        let params = parse_params(uri.query().unwrap_or(""));

        // Verify the signature in constant time before anything else.
        let provided = required(&params, PARAM_SIGNATURE)?;
        let canonical = canonical_query_of(&params);
        let expected =
            self.compute_signature(&string_to_sign(req.method().as_str(), &path, &canonical))?;
        if !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
            debug!(path, "pre-signed request signature mismatch");
            return Err(StorageError::SignatureMismatch);
        }

        check_expiration(
            required(&params, PARAM_DATE)?,
            required_u64(&params, PARAM_EXPIRES)?,
        )?;

        let op = required(&params, PARAM_OP)?;
        debug!(path, op, "executing pre-signed request");
        match op {
            "read" => Ok(PresignedOutcome::Data(self.read(&path, Pairs::new()).await?)),
            "write" => {
                let size = required_u64(&params, PARAM_SIZE)?;
                let written = self.write(&path, body, size, Pairs::new()).await?;
                Ok(PresignedOutcome::Written(written))
            }
            "create_multipart" => Ok(PresignedOutcome::Created(
                self.create_multipart(&path).await?,
            )),
            "write_multipart" => {
                let size = required_u64(&params, PARAM_SIZE)?;
                let index = usize::try_from(required_u64(&params, PARAM_INDEX)?)
                    .map_err(|_| StorageError::invalid_argument("part index out of range"))?;
                let obj = Object::new(&*path, ObjectMode::PART)
                    .with_multipart_id(required(&params, PARAM_UPLOAD)?);
                let source = body.ok_or_else(|| {
                    StorageError::invalid_argument("pre-signed part write requires a body")
                })?;
                let (written, _) = self.write_multipart(&obj, source, size, index).await?;
                Ok(PresignedOutcome::Written(written))
            }
            "list_multipart" => {
                let obj = Object::new(&*path, ObjectMode::PART)
                    .with_multipart_id(required(&params, PARAM_UPLOAD)?);
                let mut it = self.list_multipart(&obj).await?;
                Ok(PresignedOutcome::Parts(it.collect_remaining()?))
            }
            "complete_multipart" => {
                let obj = Object::new(&*path, ObjectMode::PART)
                    .with_multipart_id(required(&params, PARAM_UPLOAD)?);
                let parts: Vec<Part> = serde_json::from_str(required(&params, PARAM_PARTS)?)
                    .map_err(|e| {
                        StorageError::invalid_argument(format!("malformed part list: {e}"))
                    })?;
                self.complete_multipart(&obj, &parts).await?;
                Ok(PresignedOutcome::Completed)
            }
            other => Err(StorageError::invalid_argument(format!(
                "unknown pre-signed operation: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Signer traits
// ---------------------------------------------------------------------------

impl StorageHttpSigner for MemoryStorage {
    fn presign_read(&self, path: &str, expires_in: Duration) -> StorageResult<PresignedRequest> {
        self.presign(
            Method::GET,
            path,
            vec![(PARAM_OP, "read".to_owned())],
            expires_in,
        )
    }

    fn presign_write(
        &self,
        path: &str,
        size: u64,
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest> {
        self.presign(
            Method::PUT,
            path,
            vec![
                (PARAM_OP, "write".to_owned()),
                (PARAM_SIZE, size.to_string()),
            ],
            expires_in,
        )
    }
}

impl MultipartHttpSigner for MemoryStorage {
    fn presign_create_multipart(
        &self,
        path: &str,
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest> {
        self.presign(
            Method::POST,
            path,
            vec![(PARAM_OP, "create_multipart".to_owned())],
            expires_in,
        )
    }

    fn presign_write_multipart(
        &self,
        obj: &Object,
        size: u64,
        index: usize,
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest> {
        let id = multipart_id(obj)?;
        self.presign(
            Method::PUT,
            obj.path(),
            vec![
                (PARAM_OP, "write_multipart".to_owned()),
                (PARAM_SIZE, size.to_string()),
                (PARAM_INDEX, index.to_string()),
                (PARAM_UPLOAD, id.to_owned()),
            ],
            expires_in,
        )
    }

    fn presign_list_multipart(
        &self,
        obj: &Object,
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest> {
        let id = multipart_id(obj)?;
        self.presign(
            Method::GET,
            obj.path(),
            vec![
                (PARAM_OP, "list_multipart".to_owned()),
                (PARAM_UPLOAD, id.to_owned()),
            ],
            expires_in,
        )
    }

    fn presign_complete_multipart(
        &self,
        obj: &Object,
        parts: &[Part],
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest> {
        let id = multipart_id(obj)?;
        let encoded = serde_json::to_string(parts)
            .map_err(|e| StorageError::Backend(anyhow::anyhow!("part list encoding failed: {e}")))?;
        self.presign(
            Method::POST,
            obj.path(),
            vec![
                (PARAM_OP, "complete_multipart".to_owned()),
                (PARAM_UPLOAD, id.to_owned()),
                (PARAM_PARTS, encoded),
            ],
            expires_in,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
