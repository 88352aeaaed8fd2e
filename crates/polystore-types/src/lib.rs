//! Core contract types and capability traits for PolyStore.
//!
//! PolyStore presents a uniform interface over heterogeneous storage
//! backends (object stores, filesystems, cloud providers). The contract is
//! split into a mandatory core — [`Storager`] — and optional capability
//! extensions ([`Appender`], [`Direr`], [`Linker`], [`Mover`],
//! [`Multiparter`], [`DirLister`], [`StorageHttpSigner`],
//! [`MultipartHttpSigner`]) that a backend may implement independently.
//!
//! # Architecture
//!
//! ```text
//! Caller
//!   |
//!   v
//! dyn Storager  --- as_appender() / as_multiparter() / ... ---> capability traits
//!   |
//!   v
//! concrete backend (memory, filesystem, S3-like, ...)
//! ```
//!
//! Capability support is a structural fact about a backend, discovered via
//! the `as_*` probes on [`Storager`] (or the [`Capabilities`] descriptor),
//! never through a runtime error path.

mod capability;
mod error;
mod iter;
mod mode;
mod object;
mod pairs;
mod presign;
mod storager;

pub use capability::Capabilities;
pub use error::{ErrorKind, StorageError, StorageResult};
pub use iter::{ObjectIterator, PartIterator, StorageIter};
pub use mode::ObjectMode;
pub use object::{Object, Part};
pub use pairs::{ListMode, Pairs};
pub use presign::PresignedRequest;
pub use storager::{
    Appender, DirLister, Direr, Linker, Mover, Multiparter, MultipartHttpSigner, StorageHttpSigner,
    StorageMeta, Storager,
};
