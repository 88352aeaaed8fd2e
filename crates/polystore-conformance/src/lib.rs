//! Black-box conformance suite for PolyStore backends.
//!
//! Every check takes a backend as `&dyn Storager` (plus the relevant
//! capability trait object) and asserts the contract from the outside,
//! with no knowledge of the implementation. Checks create their working
//! objects under fixture-generated unique paths and clean up after
//! themselves, so they are safe to run against a shared backend.
//!
//! Error discipline: backend failures propagate as `Err` through `?`;
//! contract violations panic with a descriptive assertion message. Run the
//! suite from a test, where both surface as failures.
//!
//! [`run_all`] drives the whole suite, detecting capabilities through the
//! `as_*` probes and running every check the backend supports.

mod append;
mod dir;
mod fixtures;
mod link;
mod mover;
mod multipart;
mod signer;
mod storager;
mod suite;

pub use append::check_appender;
pub use dir::{check_dir_lister, check_direr};
pub use fixtures::{Fixtures, PathSource, RandomSource, StdRandom, UuidPaths};
pub use link::check_linker;
pub use mover::check_mover;
pub use multipart::check_multiparter;
pub use signer::{check_multipart_signer, check_storage_signer};
pub use storager::check_storager;
pub use suite::run_all;
