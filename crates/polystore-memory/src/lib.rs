//! In-memory reference backend for PolyStore.
//!
//! [`MemoryStorage`] implements the full PolyStore contract — the core
//! [`Storager`](polystore_types::Storager) operations plus every capability
//! extension — against a thread-safe in-process namespace. It exists as the
//! reference implementation that the conformance suite runs against, and as
//! a drop-in backend for tests of code written over `dyn Storager`.
//!
//! Pre-signing uses a query-string HMAC-SHA256 scheme, and
//! [`MemoryStorage::execute_presigned`] verifies and dispatches a signed
//! request locally, so pre-signed-request semantics are exercisable without
//! a network.

mod presign;
mod storage;

pub use presign::PresignedOutcome;
pub use storage::MemoryStorage;
