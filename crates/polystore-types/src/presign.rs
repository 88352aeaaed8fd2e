//! The pre-signed request model.
//!
//! A [`PresignedRequest`] is a fully-authorized, ready-to-send request
//! prepared without performing the operation. The signer does no I/O:
//! executing the request unmodified within its expiry window must have the
//! same observable effect as the corresponding direct call, and past the
//! window execution fails — enforced by the backend at execution time, not
//! by the signer.

use http::{HeaderMap, Method, Uri};

use crate::error::{StorageError, StorageResult};

/// A ready-to-send pre-signed request: method, signed URL, and headers.
///
/// For write-shaped operations the caller must still attach a body and
/// content length before sending.
#[derive(Debug, Clone)]
pub struct PresignedRequest {
    method: Method,
    url: String,
    headers: HeaderMap,
}

impl PresignedRequest {
    /// Assemble a pre-signed request. Intended for signer implementations.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method,
            url: url.into(),
            headers,
        }
    }

    /// The HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The signed URL, including the signature query parameters.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Headers that must accompany the request unmodified.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Parse the signed URL into an [`http::Uri`].
    pub fn uri(&self) -> StorageResult<Uri> {
        self.url
            .parse::<Uri>()
            .map_err(|e| StorageError::invalid_argument(format!("malformed pre-signed URL: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_expose_request_components() {
        let req = PresignedRequest::new(
            Method::GET,
            "memory://local/data/blob?X-Ps-Signature=abc",
            HeaderMap::new(),
        );
        assert_eq!(req.method(), &Method::GET);
        assert!(req.url().contains("X-Ps-Signature"));
        assert!(req.headers().is_empty());
    }

    #[test]
    fn test_should_parse_signed_url() {
        let req = PresignedRequest::new(
            Method::PUT,
            "memory://local/a%20b?X-Ps-Expires=60",
            HeaderMap::new(),
        );
        let uri = req.uri().unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(uri.path(), "/a%20b");
        assert_eq!(uri.query(), Some("X-Ps-Expires=60"));
    }

    #[test]
    fn test_should_reject_malformed_url() {
        let req = PresignedRequest::new(Method::GET, "not a url", HeaderMap::new());
        assert!(req.uri().is_err());
    }
}
